#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Passenger demand system that emits one passenger per station per interval.

use std::{collections::BTreeMap, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use transit_rush_core::{Command, Event, StationId};

/// Configuration parameters required to construct the demand system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    passenger_interval: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided per-station cadence and seed.
    #[must_use]
    pub const fn new(passenger_interval: Duration, rng_seed: u64) -> Self {
        Self {
            passenger_interval,
            rng_seed,
        }
    }
}

/// Pure system tracking a demand accumulator for every station.
#[derive(Debug)]
pub struct Demand {
    passenger_interval: Duration,
    accumulators: BTreeMap<StationId, Duration>,
    rng_seed: u64,
    rng: ChaCha8Rng,
}

impl Demand {
    /// Creates a new demand system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            passenger_interval: config.passenger_interval,
            accumulators: BTreeMap::new(),
            rng_seed: config.rng_seed,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and the current station list to emit passenger commands.
    ///
    /// Destinations are drawn uniformly from the other stations. Nothing
    /// accrues while fewer than two stations exist, and a station spawned
    /// during the same batch of events starts accruing on the next one.
    pub fn handle(&mut self, events: &[Event], stations: &[StationId], out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        let mut spawned = Vec::new();
        for event in events {
            match event {
                Event::TimeAdvanced { dt, .. } => accumulated = accumulated.saturating_add(*dt),
                Event::StationSpawned { station, .. } => spawned.push(*station),
                Event::WorldReset => self.restart(),
                _ => {}
            }
        }

        self.accumulators
            .retain(|station, _| stations.contains(station));

        if accumulated.is_zero() || self.passenger_interval.is_zero() || stations.len() < 2 {
            return;
        }

        for (index, &origin) in stations.iter().enumerate() {
            if spawned.contains(&origin) {
                let _ = self.accumulators.insert(origin, Duration::ZERO);
                continue;
            }
            let accumulator = self.accumulators.entry(origin).or_insert(Duration::ZERO);
            *accumulator = accumulator.saturating_add(accumulated);

            while *accumulator >= self.passenger_interval {
                *accumulator -= self.passenger_interval;
                let mut pick = self.rng.gen_range(0..stations.len() - 1);
                if pick >= index {
                    pick += 1;
                }
                out.push(Command::GeneratePassenger {
                    origin,
                    destination: stations[pick],
                });
            }
        }
    }

    fn restart(&mut self) {
        self.accumulators.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.rng_seed);
    }
}
