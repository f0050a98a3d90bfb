use blueshmem_rs::{duplicate, join_any, Channel, Flag, Role, SharedBuffer};
use clap::{Parser, ValueEnum};
use libblueshmem_sys::logging;

use std::process::ExitCode;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    /// One round over a single flag and a buffer
    Flag,
    /// Any number of rounds over a two flag channel
    Channel,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct DemoCli {
    /// Integers carried per round
    #[arg(short, long, default_value_t = 4)]
    count: usize,
    /// Rounds to carry from parent to child
    #[arg(short, long, default_value_t = 1)]
    rounds: usize,
    #[arg(short, long, value_enum, default_value_t = Mode::Channel)]
    mode: Mode,
}

impl DemoCli {
    fn effective_rounds(&self) -> usize {
        match self.mode {
            Mode::Flag if self.rounds != 1 => {
                log::warn!(
                    "flag mode carries a single round, ignoring --rounds {}",
                    self.rounds
                );
                1
            }
            _ => self.rounds,
        }
    }
}

/// The integers sent in `round`; round 0 of 4 is [10, 20, 30, 40]
fn payload(round: usize, count: usize) -> Vec<u32> {
    (1..=count)
        .map(|i| (round * 1000 + i * 10) as u32)
        .collect()
}

/// Parent writes, then raises the flag; child waits on the flag, then reads.
///
/// Returns the number of rounds the child received intact.
fn run_flag(count: usize) -> usize {
    let flag = Flag::new();
    let mut buffer = SharedBuffer::new(count);
    let mut verdict = SharedBuffer::new(1);

    // the parent holds the only token until the data is in place
    flag.decrement_blocking();

    match duplicate() {
        Role::Child => {
            flag.decrement_blocking();
            let intact = buffer.to_vec() == payload(0, count);
            verdict.write(&[intact as u32]);
            std::process::exit(0);
        }
        Role::Parent(child) => {
            log::info!("child {} is waiting on the flag", child);
            buffer.write(&payload(0, count));
            flag.increment();
            join_any();
            verdict.to_vec()[0] as usize
        }
    }
}

/// Parent sends `rounds` messages through a channel, child checks each one.
///
/// Returns the number of rounds the child received intact.
fn run_channel(count: usize, rounds: usize) -> usize {
    let mut channel = Channel::new(count);
    let mut verdict = SharedBuffer::new(1);

    match duplicate() {
        Role::Child => {
            let mut data = vec![0; count];
            let intact = (0..rounds)
                .filter(|&round| {
                    channel.recv(&mut data);
                    data == payload(round, count)
                })
                .count();
            verdict.write(&[intact as u32]);
            std::process::exit(0);
        }
        Role::Parent(child) => {
            log::info!("sending {} rounds to child {}", rounds, child);
            for round in 0..rounds {
                channel.send(&payload(round, count));
                log::debug!("round {} sent", round);
            }
            join_any();
            verdict.to_vec()[0] as usize
        }
    }
}

fn main() -> ExitCode {
    let cli = DemoCli::parse();
    logging::init_from_env();

    let rounds = cli.effective_rounds();
    let intact = match cli.mode {
        Mode::Flag => run_flag(cli.count),
        Mode::Channel => run_channel(cli.count, rounds),
    };

    if intact == rounds {
        println!(
            "{:?}: {} of {} rounds of {} integers arrived intact",
            cli.mode, intact, rounds, cli.count
        );
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "{:?}: only {} of {} rounds arrived intact",
            cli.mode, intact, rounds
        );
        ExitCode::FAILURE
    }
}
