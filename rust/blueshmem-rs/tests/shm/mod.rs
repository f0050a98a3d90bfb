pub mod consumer;
pub mod producer;

/// The message sent in a given round
pub fn payload(round: usize, size: usize) -> Vec<u32> {
    (1..=size).map(|i| (round * 1000 + i * 10) as u32).collect()
}
