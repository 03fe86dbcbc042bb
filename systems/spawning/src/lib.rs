#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting station spawn commands.

pub mod cities;

use std::time::Duration;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use transit_rush_core::{CitySite, Command, Event, GeoPoint};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
    sites: Vec<CitySite>,
}

impl Config {
    /// Creates a new configuration using the provided cadence, seed and city pool.
    ///
    /// An empty `sites` pool falls back to [`cities::builtin`].
    #[must_use]
    pub fn new(spawn_interval: Duration, rng_seed: u64, sites: Vec<CitySite>) -> Self {
        let sites = if sites.is_empty() {
            cities::builtin()
        } else {
            sites
        };
        Self {
            spawn_interval,
            rng_seed,
            sites,
        }
    }

    /// Number of candidate sites in the pool.
    #[must_use]
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }
}

/// Pure system that places stations on free city sites at a fixed cadence.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    accumulator: Duration,
    rng_seed: u64,
    rng: ChaCha8Rng,
    sites: Vec<CitySite>,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            accumulator: Duration::ZERO,
            rng_seed: config.rng_seed,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            sites: config.sites,
        }
    }

    /// Emits spawn commands for the stations placed when a session begins.
    ///
    /// `occupied` lists the positions of stations already on the map.
    pub fn seed_initial(&mut self, count: u32, occupied: &[GeoPoint], out: &mut Vec<Command>) {
        let mut taken = occupied.to_vec();
        for _ in 0..count {
            if !self.push_spawn(&mut taken, out) {
                break;
            }
        }
    }

    /// Consumes events and immutable views to emit spawn commands.
    ///
    /// `occupied` lists the positions of stations already on the map and is
    /// used both for the cap check and to keep sites unique.
    pub fn handle(
        &mut self,
        events: &[Event],
        max_stations: u32,
        occupied: &[GeoPoint],
        out: &mut Vec<Command>,
    ) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt, .. } => {
                    accumulated = accumulated.saturating_add(*dt);
                }
                Event::WorldReset => self.restart(),
                _ => {}
            }
        }

        if accumulated.is_zero() || self.spawn_interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let cap = usize::try_from(max_stations).unwrap_or(usize::MAX);
        let mut taken = occupied.to_vec();

        while self.accumulator >= self.spawn_interval {
            if taken.len() >= cap {
                self.accumulator = Duration::ZERO;
                return;
            }
            self.accumulator -= self.spawn_interval;
            if !self.push_spawn(&mut taken, out) {
                self.accumulator = Duration::ZERO;
                return;
            }
        }
    }

    fn restart(&mut self) {
        self.accumulator = Duration::ZERO;
        self.rng = ChaCha8Rng::seed_from_u64(self.rng_seed);
    }

    fn push_spawn(&mut self, taken: &mut Vec<GeoPoint>, out: &mut Vec<Command>) -> bool {
        let free: Vec<&CitySite> = self
            .sites
            .iter()
            .filter(|site| !taken.contains(&site.position))
            .collect();

        let Some(site) = free.choose(&mut self.rng) else {
            tracing::debug!("city pool exhausted; no station spawned");
            return false;
        };

        taken.push(site.position);
        out.push(Command::SpawnStation {
            position: site.position,
            city: Some(site.name.clone()),
        });
        true
    }
}
