//! Tunable constants supplied to the simulation at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{geo::GeoError, GeoPoint, SnapPolicy, VisualizationMode};

const DEFAULT_SEED: u64 = 0x6d65_7472_6f5f_7275;

/// Complete configuration surface of a simulation session.
///
/// Durations are expressed in seconds so the structure maps directly onto a
/// TOML file. Call [`SimulationConfig::validate`] before handing the values to
/// the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Seconds between consecutive station spawns.
    pub spawn_interval_secs: f64,
    /// Hard upper bound on the number of stations.
    pub max_stations: u32,
    /// Stations placed immediately when a session starts or resets.
    pub initial_stations: u32,
    /// Seconds between passengers generated at a single station.
    pub passenger_interval_secs: f64,
    /// Queue length at which a station counts as overloaded.
    pub overload_threshold: u32,
    /// Continuous overload, in seconds, that ends the game.
    pub overload_grace_secs: f64,
    /// Train speed in kilometres per hour of simulated time.
    pub train_speed_kmh: f64,
    /// Simulated seconds that elapse per second of game time.
    pub time_scale: f64,
    /// Passengers a single train can carry.
    pub train_capacity: u32,
    /// Maximum trains that may run on one route.
    pub trains_per_route: u32,
    /// Radius, in kilometres, within which a gesture point snaps to a station.
    pub snap_radius_km: f64,
    /// Rule choosing which route a gesture extends at a junction.
    pub snap_policy: SnapPolicy,
    /// Rendering hint active when a session starts.
    pub visualization: VisualizationMode,
    /// Seed for station placement and passenger destinations.
    pub seed: u64,
    /// Custom city pool; the built-in pool is used when empty.
    pub cities: Vec<CitySite>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            spawn_interval_secs: 5.0,
            max_stations: 12,
            initial_stations: 2,
            passenger_interval_secs: 4.0,
            overload_threshold: 20,
            overload_grace_secs: 5.0,
            train_speed_kmh: 200.0,
            time_scale: 600.0,
            train_capacity: 6,
            trains_per_route: 1,
            snap_radius_km: 40.0,
            snap_policy: SnapPolicy::OldestRoute,
            visualization: VisualizationMode::Simple,
            seed: DEFAULT_SEED,
            cities: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Checks that every value can drive a well-formed simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        interval("spawn_interval_secs", self.spawn_interval_secs)?;
        interval("passenger_interval_secs", self.passenger_interval_secs)?;
        interval("overload_grace_secs", self.overload_grace_secs)?;
        positive("train_speed_kmh", self.train_speed_kmh)?;
        positive("time_scale", self.time_scale)?;
        positive("snap_radius_km", self.snap_radius_km)?;

        if self.max_stations == 0 {
            return Err(ConfigError::Zero("max_stations"));
        }
        if self.overload_threshold == 0 {
            return Err(ConfigError::Zero("overload_threshold"));
        }
        if self.train_capacity == 0 {
            return Err(ConfigError::Zero("train_capacity"));
        }
        if self.trains_per_route == 0 {
            return Err(ConfigError::Zero("trains_per_route"));
        }
        if self.initial_stations > self.max_stations {
            return Err(ConfigError::InitialStationsExceedCap {
                initial: self.initial_stations,
                max: self.max_stations,
            });
        }

        for city in &self.cities {
            if let Err(source) = GeoPoint::new(city.position.latitude(), city.position.longitude())
            {
                return Err(ConfigError::InvalidCity {
                    name: city.name.clone(),
                    source,
                });
            }
        }

        Ok(())
    }

    /// Station spawn interval as a [`Duration`].
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        seconds(self.spawn_interval_secs)
    }

    /// Per-station passenger interval as a [`Duration`].
    #[must_use]
    pub fn passenger_interval(&self) -> Duration {
        seconds(self.passenger_interval_secs)
    }

    /// Sustained overload duration that ends the game.
    #[must_use]
    pub fn overload_grace(&self) -> Duration {
        seconds(self.overload_grace_secs)
    }
}

/// Named site in the geocoded city pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CitySite {
    /// Display name of the city.
    pub name: String,
    /// Geographic location of the city.
    pub position: GeoPoint,
}

impl CitySite {
    /// Creates a new city site.
    #[must_use]
    pub fn new(name: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Reasons a configuration may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A quantity that must be strictly positive and finite was not.
    #[error("`{field}` must be a positive finite number, got {value}")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied for the field.
        value: f64,
    },
    /// A positive number of seconds rounds to zero or overflows a [`Duration`].
    #[error("`{field}` must be between one nanosecond and the largest duration, got {value}")]
    UnrepresentableDuration {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied for the field.
        value: f64,
    },
    /// A count that must be non-zero was zero.
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
    /// More initial stations were requested than the cap allows.
    #[error("initial_stations ({initial}) exceeds max_stations ({max})")]
    InitialStationsExceedCap {
        /// Requested initial station count.
        initial: u32,
        /// Configured station cap.
        max: u32,
    },
    /// A custom city carried a malformed coordinate.
    #[error("city `{name}` has an invalid position: {source}")]
    InvalidCity {
        /// Name of the offending city.
        name: String,
        /// Underlying coordinate error.
        source: GeoError,
    },
    /// The city pool cannot host the initial stations.
    #[error("city pool holds {available} sites but {required} initial stations were requested")]
    InsufficientCities {
        /// Sites available in the pool.
        available: usize,
        /// Initial stations requested.
        required: u32,
    },
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    positive(field, value)?;
    match Duration::try_from_secs_f64(value) {
        Ok(duration) if !duration.is_zero() => Ok(()),
        _ => Err(ConfigError::UnrepresentableDuration { field, value }),
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
