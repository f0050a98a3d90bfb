use blueshmem_rs::Channel;

pub fn start(channel: &mut Channel, size: usize, iterations: usize) {
    for round in 0..iterations {
        channel.send(&super::payload(round, size));
    }
}
