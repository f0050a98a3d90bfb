use blueshmem_rs::Channel;

/// Receives every round, returning the rounds whose contents were wrong
pub fn start(channel: &mut Channel, size: usize, iterations: usize) -> Vec<usize> {
    let mut data = vec![0; size];
    (0..iterations)
        .filter(|&round| {
            channel.recv(&mut data);
            data != super::payload(round, size)
        })
        .collect()
}
