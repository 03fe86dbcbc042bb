#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Transit Rush engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

pub mod config;
pub mod geo;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{CitySite, ConfigError, SimulationConfig};
pub use geo::{GeoError, GeoPoint};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Transit Rush.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of game time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a new station be placed on the map.
    SpawnStation {
        /// Geographic location of the new station.
        position: GeoPoint,
        /// Name of the city the site was drawn from, if any.
        city: Option<String>,
    },
    /// Requests that a passenger start waiting at `origin`.
    GeneratePassenger {
        /// Station where the passenger appears.
        origin: StationId,
        /// Station the passenger wants to reach.
        destination: StationId,
    },
    /// Requests a track segment between two stations.
    ConnectStations {
        /// Station the player started the connection from.
        from: StationId,
        /// Station the player finished the connection on.
        to: StationId,
        /// Route the player intends to extend, if the gesture resolved one.
        extend: Option<RouteId>,
    },
    /// Requests an additional train on an existing route.
    DispatchTrain {
        /// Route that should receive the train.
        route: RouteId,
    },
    /// Moves every train and runs the passenger protocol at stations reached.
    AdvanceTrains {
        /// Duration of game time the trains travel for.
        dt: Duration,
    },
    /// Re-evaluates every station's overload timer.
    RefreshOverload {
        /// Duration of game time elapsed since the previous refresh.
        dt: Duration,
    },
    /// Ends the session because a station stayed overloaded for too long.
    EndGame {
        /// Station that caused the failure.
        station: StationId,
        /// Human readable failure reason.
        reason: String,
    },
    /// Selects how adapters should draw overlapping route lines.
    SetVisualizationMode {
        /// Mode that should become active.
        mode: VisualizationMode,
    },
    /// Discards every station, route, train and counter.
    Reset,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of game time that elapsed in the tick.
        dt: Duration,
        /// Total game time elapsed after the tick.
        elapsed: Duration,
    },
    /// Confirms that a station was placed on the map.
    StationSpawned {
        /// Identifier assigned to the station.
        station: StationId,
        /// Location of the station.
        position: GeoPoint,
    },
    /// Reports that a spawn request was refused.
    StationSpawnRejected {
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that a passenger started waiting at a station.
    PassengerGenerated {
        /// Identifier assigned to the passenger.
        passenger: PassengerId,
        /// Station holding the passenger.
        origin: StationId,
        /// Station the passenger wants to reach.
        destination: StationId,
    },
    /// Reports that a passenger request referenced an invalid station pair.
    PassengerRejected {
        /// Requested origin.
        origin: StationId,
        /// Requested destination.
        destination: StationId,
    },
    /// Confirms that a connection request changed the route graph.
    StationsConnected {
        /// Station the connection started from.
        from: StationId,
        /// Station the connection finished on.
        to: StationId,
        /// How the route graph changed.
        outcome: ConnectOutcome,
    },
    /// Reports that a connection request left the route graph untouched.
    ConnectionRejected {
        /// Station the connection started from.
        from: StationId,
        /// Station the connection finished on.
        to: StationId,
        /// Specific reason the connection was refused.
        reason: ConnectError,
    },
    /// Confirms that a train started running on a route.
    TrainDispatched {
        /// Identifier assigned to the train.
        train: TrainId,
        /// Route the train runs on.
        route: RouteId,
    },
    /// Reports that a dispatch request was refused.
    TrainDispatchRejected {
        /// Route named in the request.
        route: RouteId,
        /// Specific reason the dispatch failed.
        reason: DispatchError,
    },
    /// Confirms that a train reached a station.
    TrainArrived {
        /// Train that arrived.
        train: TrainId,
        /// Station the train stopped at.
        station: StationId,
    },
    /// Confirms that a train turned around at a terminal station.
    TrainReversed {
        /// Train that reversed.
        train: TrainId,
        /// Direction the train travels after reversing.
        direction: TravelDirection,
    },
    /// Confirms that passengers left a station queue for a train.
    PassengersBoarded {
        /// Train the passengers boarded.
        train: TrainId,
        /// Station the passengers left.
        station: StationId,
        /// Number of passengers that boarded.
        count: u32,
    },
    /// Confirms that passengers reached their destination.
    PassengersDelivered {
        /// Train that carried the passengers.
        train: TrainId,
        /// Destination station.
        station: StationId,
        /// Number of passengers delivered.
        count: u32,
    },
    /// Warns that a station queue reached the overload threshold.
    StationOverloaded {
        /// Station that became overloaded.
        station: StationId,
        /// Passengers waiting when the overload began.
        waiting: u32,
    },
    /// Reports that an overloaded station dropped back below the threshold.
    StationRecovered {
        /// Station that recovered.
        station: StationId,
    },
    /// Announces that the session reached its terminal state.
    GameOver {
        /// Diagnostic report describing the failure.
        report: GameOverReport,
    },
    /// Announces that adapters should switch line rendering style.
    VisualizationModeChanged {
        /// Mode that became active.
        mode: VisualizationMode,
    },
    /// Confirms that all session state was discarded.
    WorldReset,
}

/// Rendering hint controlling how overlapping route lines are drawn.
///
/// The simulation never reads this value; it only travels to adapters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    /// Routes sharing a segment are drawn on top of each other.
    #[default]
    Simple,
    /// Routes sharing a segment are drawn side by side with an offset.
    Parallel,
}

impl VisualizationMode {
    /// Returns the other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Simple => Self::Parallel,
            Self::Parallel => Self::Simple,
        }
    }
}

/// Rule choosing which route a gesture extends when its start station is an
/// open endpoint of several routes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapPolicy {
    /// Extend the route created first.
    #[default]
    OldestRoute,
    /// Extend the route created most recently.
    NewestRoute,
    /// Extend the route serving the most stations.
    LongestRoute,
}

/// Direction a train travels along its route's station sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TravelDirection {
    /// Towards higher station indices.
    Forward,
    /// Towards lower station indices.
    Backward,
}

impl TravelDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Unique identifier assigned to a station.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId(u32);

impl StationId {
    /// Creates a new station identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Sequential display label such as `Stn 3`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Stn {}", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier assigned to a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(u32);

impl RouteId {
    /// Creates a new route identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier assigned to a train.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrainId(u32);

impl TrainId {
    /// Creates a new train identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a passenger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PassengerId(u64);

impl PassengerId {
    /// Creates a new passenger identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Stable color assigned to a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RouteColor {
    /// Creates a new route color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Ways a successful connection changes the route graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectOutcome {
    /// A new two-station route was created.
    Created {
        /// Identifier of the new route.
        route: RouteId,
    },
    /// A station was added to an open end of an existing route.
    Extended {
        /// Route that grew.
        route: RouteId,
        /// Station that joined the route.
        station: StationId,
        /// Whether the station was inserted before the first station.
        prepended: bool,
    },
    /// The two open ends of a route were joined into a loop.
    Closed {
        /// Route that became circular.
        route: RouteId,
    },
}

impl ConnectOutcome {
    /// Route touched by the connection.
    #[must_use]
    pub const fn route(&self) -> RouteId {
        match self {
            Self::Created { route } | Self::Extended { route, .. } | Self::Closed { route } => {
                *route
            }
        }
    }
}

/// Reasons a connection request may leave the route graph untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ConnectError {
    /// The edge already exists on a route; the request is a benign no-op.
    #[error("stations are already connected by route {route}")]
    Duplicate {
        /// Route already carrying the edge.
        route: RouteId,
    },
    /// Both ends of the request named the same station.
    #[error("cannot connect station {0} to itself")]
    SameStation(StationId),
    /// The request referenced a station that does not exist.
    #[error("station {0} does not exist")]
    UnknownStation(StationId),
}

impl ConnectError {
    /// Reports whether the rejection is an invalid command rather than a
    /// benign duplicate.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        !matches!(self, Self::Duplicate { .. })
    }
}

/// Reasons a station spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SpawnError {
    /// The station cap has been reached.
    #[error("station cap of {max} reached")]
    AtCapacity {
        /// Configured station cap.
        max: u32,
    },
    /// Another station already occupies the requested site.
    #[error("site is occupied by station {0}")]
    SiteOccupied(StationId),
}

/// Reasons a train dispatch request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum DispatchError {
    /// No route with the provided identifier exists.
    #[error("route does not exist")]
    MissingRoute,
    /// The route already runs the configured maximum number of trains.
    #[error("route already runs {max} trains")]
    RouteFull {
        /// Configured per-route train limit.
        max: u32,
    },
}

/// Diagnostic context captured when the session ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverReport {
    /// Station whose overload ended the session.
    pub station: StationId,
    /// Human readable failure reason.
    pub reason: String,
    /// Game time elapsed when the session ended.
    pub elapsed: Duration,
}

/// Immutable representation of a single station used for queries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StationSnapshot {
    /// Identifier assigned to the station.
    pub id: StationId,
    /// Sequential display label.
    pub label: String,
    /// City the station was placed in, if known.
    pub city: Option<String>,
    /// Location of the station.
    pub position: GeoPoint,
    /// Passengers currently waiting.
    pub queue_length: u32,
    /// Continuous time the queue has stayed at or above the overload threshold.
    pub overload: Duration,
    /// Time the oldest waiting passenger has spent in the queue.
    pub longest_wait: Duration,
    /// Routes that serve the station, ascending.
    pub routes: Vec<RouteId>,
}

/// Immutable representation of a single route used for queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteSnapshot {
    /// Identifier assigned to the route.
    pub id: RouteId,
    /// Ordered stations served by the route.
    pub stations: Vec<StationId>,
    /// Whether the last station connects back to the first.
    pub circular: bool,
    /// Stable color assigned to the route.
    pub color: RouteColor,
}

impl RouteSnapshot {
    /// Stations at the open ends of a linear route; `None` for loops.
    #[must_use]
    pub fn open_endpoints(&self) -> Option<(StationId, StationId)> {
        if self.circular {
            return None;
        }
        match (self.stations.first(), self.stations.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        }
    }
}

/// Immutable representation of a single train used for queries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainSnapshot {
    /// Identifier assigned to the train.
    pub id: TrainId,
    /// Route the train runs on.
    pub route: RouteId,
    /// Interpolated geographic position.
    pub position: GeoPoint,
    /// Index of the edge the train is on.
    pub edge_index: usize,
    /// Fraction of the edge covered, measured from the edge's first station.
    pub progress: f64,
    /// Direction of travel.
    pub direction: TravelDirection,
    /// Passengers on board.
    pub manifest: u32,
    /// Maximum passengers the train can hold.
    pub capacity: u32,
}

/// Read-only snapshot of an entire session for adapters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameSnapshot {
    /// Stations ordered by identifier.
    pub stations: Vec<StationSnapshot>,
    /// Routes ordered by identifier.
    pub routes: Vec<RouteSnapshot>,
    /// Trains ordered by identifier.
    pub trains: Vec<TrainSnapshot>,
    /// Passengers delivered so far.
    pub score: u64,
    /// Game time elapsed.
    pub elapsed: Duration,
    /// Passengers generated since the session started.
    pub passengers_generated: u64,
    /// Station cap in effect.
    pub max_stations: u32,
    /// Failure report once the session has ended.
    pub game_over: Option<GameOverReport>,
    /// Active line rendering hint.
    pub visualization: VisualizationMode,
}

impl GameSnapshot {
    /// Passengers waiting at stations or riding trains.
    #[must_use]
    pub fn passengers_in_transit(&self) -> u64 {
        let waiting: u64 = self
            .stations
            .iter()
            .map(|station| u64::from(station.queue_length))
            .sum();
        let riding: u64 = self
            .trains
            .iter()
            .map(|train| u64::from(train.manifest))
            .sum();
        waiting + riding
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConnectError, ConnectOutcome, RouteColor, RouteId, RouteSnapshot, StationId,
        TravelDirection, VisualizationMode,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn connect_outcome_round_trips_through_bincode() {
        assert_round_trip(&ConnectOutcome::Extended {
            route: RouteId::new(3),
            station: StationId::new(9),
            prepended: true,
        });
    }

    #[test]
    fn connect_error_round_trips_through_bincode() {
        assert_round_trip(&ConnectError::Duplicate {
            route: RouteId::new(1),
        });
    }

    #[test]
    fn station_label_is_sequential_name() {
        assert_eq!(StationId::new(4).label(), "Stn 4");
        assert_eq!(StationId::new(4).to_string(), "4");
    }

    #[test]
    fn duplicate_is_not_an_invalid_command() {
        assert!(!ConnectError::Duplicate {
            route: RouteId::new(1)
        }
        .is_invalid());
        assert!(ConnectError::SameStation(StationId::new(1)).is_invalid());
        assert!(ConnectError::UnknownStation(StationId::new(7)).is_invalid());
    }

    #[test]
    fn toggling_twice_restores_mode() {
        let mode = VisualizationMode::Simple;
        assert_eq!(mode.toggled(), VisualizationMode::Parallel);
        assert_eq!(mode.toggled().toggled(), mode);
        assert_eq!(
            TravelDirection::Forward.reversed(),
            TravelDirection::Backward
        );
    }

    #[test]
    fn open_endpoints_absent_for_loops() {
        let mut route = RouteSnapshot {
            id: RouteId::new(1),
            stations: vec![StationId::new(1), StationId::new(2), StationId::new(3)],
            circular: false,
            color: RouteColor::from_rgb(0, 0, 0),
        };
        assert_eq!(
            route.open_endpoints(),
            Some((StationId::new(1), StationId::new(3)))
        );
        route.circular = true;
        assert_eq!(route.open_endpoints(), None);
    }
}
