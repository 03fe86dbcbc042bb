#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Transit Rush.
//!
//! The world owns stations, routes and trains in arena-style collections
//! keyed by identifier. All mutation flows through [`apply`]; everything else
//! reads through the [`query`] module.

mod routes;
mod stations;
mod trains;

use std::time::Duration;

use transit_rush_core::{
    Command, ConnectOutcome, DispatchError, Event, GameOverReport, PassengerId, RouteId,
    SimulationConfig, VisualizationMode, WELCOME_BANNER,
};

use crate::{
    routes::RouteGraph,
    stations::{OverloadTransition, Passenger, StationRegistry},
    trains::{TrainFleet, TrainSettings},
};

/// Represents the authoritative Transit Rush world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    stations: StationRegistry,
    routes: RouteGraph,
    trains: TrainFleet,
    train_settings: TrainSettings,
    elapsed: Duration,
    score: u64,
    passengers_generated: u64,
    game_over: Option<GameOverReport>,
    visualization: VisualizationMode,
}

impl World {
    /// Creates an empty world governed by the provided configuration.
    ///
    /// The configuration is expected to have passed
    /// [`SimulationConfig::validate`].
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            stations: StationRegistry::new(config.max_stations),
            routes: RouteGraph::new(),
            trains: TrainFleet::new(),
            train_settings: TrainSettings {
                speed_kmh: config.train_speed_kmh,
                time_scale: config.time_scale,
                capacity: config.train_capacity,
                per_route: config.trains_per_route,
                overload_threshold: config.overload_threshold,
            },
            elapsed: Duration::ZERO,
            score: 0,
            passengers_generated: 0,
            game_over: None,
            visualization: config.visualization,
        }
    }

    fn reset(&mut self) {
        self.stations = StationRegistry::new(self.stations.max_stations());
        self.routes = RouteGraph::new();
        self.trains = TrainFleet::new();
        self.elapsed = Duration::ZERO;
        self.score = 0;
        self.passengers_generated = 0;
        self.game_over = None;
    }

    fn dispatch_train(&mut self, route: RouteId, out_events: &mut Vec<Event>) {
        if self.routes.get(route).is_none() {
            out_events.push(Event::TrainDispatchRejected {
                route,
                reason: DispatchError::MissingRoute,
            });
            return;
        }

        let limit = usize::try_from(self.train_settings.per_route).unwrap_or(usize::MAX);
        if self.trains.count_on(route) >= limit {
            out_events.push(Event::TrainDispatchRejected {
                route,
                reason: DispatchError::RouteFull {
                    max: self.train_settings.per_route,
                },
            });
            return;
        }

        let train = self.trains.dispatch(route);
        tracing::info!(train = train.get(), route = route.get(), "train dispatched");
        out_events.push(Event::TrainDispatched { train, route });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session has ended only [`Command::Reset`] and
/// [`Command::SetVisualizationMode`] have any effect.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.game_over.is_some()
        && !matches!(
            command,
            Command::Reset | Command::SetVisualizationMode { .. }
        )
    {
        tracing::trace!(?command, "ignoring command after game over");
        return;
    }

    match command {
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced {
                dt,
                elapsed: world.elapsed,
            });
        }
        Command::SpawnStation { position, city } => {
            match world.stations.spawn(position, city) {
                Ok(station) => {
                    tracing::info!(station = station.get(), "station spawned");
                    out_events.push(Event::StationSpawned { station, position });
                }
                Err(reason) => {
                    tracing::debug!(%reason, "station spawn rejected");
                    out_events.push(Event::StationSpawnRejected { reason });
                }
            }
        }
        Command::GeneratePassenger {
            origin,
            destination,
        } => {
            if origin == destination || !world.stations.contains(destination) {
                out_events.push(Event::PassengerRejected {
                    origin,
                    destination,
                });
                return;
            }
            let passenger = PassengerId::new(world.passengers_generated);
            let created_at = world.elapsed;
            let Some(station) = world.stations.get_mut(origin) else {
                out_events.push(Event::PassengerRejected {
                    origin,
                    destination,
                });
                return;
            };
            station.queue.push_back(Passenger {
                id: passenger,
                destination,
                created_at,
            });
            world.passengers_generated += 1;
            out_events.push(Event::PassengerGenerated {
                passenger,
                origin,
                destination,
            });
        }
        Command::ConnectStations { from, to, extend } => {
            let stations = &world.stations;
            match world
                .routes
                .connect(from, to, extend, |station| stations.contains(station))
            {
                Ok(outcome) => {
                    tracing::info!(
                        from = from.get(),
                        to = to.get(),
                        ?outcome,
                        "stations connected"
                    );
                    out_events.push(Event::StationsConnected { from, to, outcome });
                    match outcome {
                        ConnectOutcome::Created { route } => {
                            world.dispatch_train(route, out_events);
                        }
                        ConnectOutcome::Extended {
                            route,
                            prepended: true,
                            ..
                        } => world.trains.shift_for_prepend(route),
                        ConnectOutcome::Extended { .. } | ConnectOutcome::Closed { .. } => {}
                    }
                }
                Err(reason) => {
                    tracing::debug!(
                        from = from.get(),
                        to = to.get(),
                        %reason,
                        "connection rejected"
                    );
                    out_events.push(Event::ConnectionRejected { from, to, reason });
                }
            }
        }
        Command::DispatchTrain { route } => world.dispatch_train(route, out_events),
        Command::AdvanceTrains { dt } => {
            let delivered = world.trains.advance(
                dt,
                &world.train_settings,
                &world.routes,
                &mut world.stations,
                out_events,
            );
            world.score += delivered;
        }
        Command::RefreshOverload { dt } => {
            let mut transitions = Vec::new();
            world.stations.refresh_overload(
                dt,
                world.train_settings.overload_threshold,
                &mut transitions,
            );
            for transition in transitions {
                match transition {
                    OverloadTransition::Entered { station, waiting } => {
                        tracing::warn!(station = station.get(), waiting, "station overloaded");
                        out_events.push(Event::StationOverloaded { station, waiting });
                    }
                    OverloadTransition::Cleared { station } => {
                        out_events.push(Event::StationRecovered { station });
                    }
                }
            }
        }
        Command::EndGame { station, reason } => {
            tracing::info!(station = station.get(), %reason, score = world.score, "game over");
            let report = GameOverReport {
                station,
                reason,
                elapsed: world.elapsed,
            };
            world.game_over = Some(report.clone());
            out_events.push(Event::GameOver { report });
        }
        Command::SetVisualizationMode { mode } => {
            if world.visualization != mode {
                world.visualization = mode;
                out_events.push(Event::VisualizationModeChanged { mode });
            }
        }
        Command::Reset => {
            world.reset();
            out_events.push(Event::WorldReset);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use transit_rush_core::{
        GameOverReport, GameSnapshot, GeoPoint, RouteId, RouteSnapshot, StationId,
        StationSnapshot, TrainSnapshot, VisualizationMode,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Game time elapsed since the session started.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Passengers delivered so far.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.score
    }

    /// Number of stations currently on the map.
    #[must_use]
    pub fn station_count(world: &World) -> usize {
        world.stations.len()
    }

    /// Hard station cap in effect.
    #[must_use]
    pub fn max_stations(world: &World) -> u32 {
        world.stations.max_stations()
    }

    /// Identifiers of every station in spawn order.
    #[must_use]
    pub fn station_ids(world: &World) -> Vec<StationId> {
        world.stations.iter().map(|station| station.id).collect()
    }

    /// Positions of every station in spawn order.
    #[must_use]
    pub fn station_positions(world: &World) -> Vec<GeoPoint> {
        world
            .stations
            .iter()
            .map(|station| station.position)
            .collect()
    }

    /// Continuous time `station` has spent at or above the overload threshold.
    #[must_use]
    pub fn overload_status(world: &World, station: StationId) -> Option<Duration> {
        world.stations.get(station).map(|station| station.overload())
    }

    /// Routes serving `station`, ascending by identifier.
    #[must_use]
    pub fn routes_for(world: &World, station: StationId) -> Vec<RouteId> {
        world.routes.routes_for(station)
    }

    /// Failure report once the session has ended.
    #[must_use]
    pub fn game_over(world: &World) -> Option<&GameOverReport> {
        world.game_over.as_ref()
    }

    /// Reports whether the session has ended.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over.is_some()
    }

    /// Active line rendering hint.
    #[must_use]
    pub fn visualization_mode(world: &World) -> VisualizationMode {
        world.visualization
    }

    /// Captures every station in identifier order.
    #[must_use]
    pub fn station_view(world: &World) -> Vec<StationSnapshot> {
        world
            .stations
            .iter()
            .map(|station| StationSnapshot {
                id: station.id,
                label: station.id.label(),
                city: station.city.clone(),
                position: station.position,
                queue_length: station.queue_length(),
                overload: station.overload(),
                longest_wait: station
                    .queue
                    .front()
                    .map_or(Duration::ZERO, |passenger| {
                        world.elapsed.saturating_sub(passenger.created_at)
                    }),
                routes: world.routes.routes_for(station.id),
            })
            .collect()
    }

    /// Captures every route in identifier order.
    #[must_use]
    pub fn route_view(world: &World) -> Vec<RouteSnapshot> {
        world
            .routes
            .iter()
            .map(|route| RouteSnapshot {
                id: route.id,
                stations: route.stations.clone(),
                circular: route.circular,
                color: route.color,
            })
            .collect()
    }

    /// Captures every train in creation order.
    #[must_use]
    pub fn train_view(world: &World) -> Vec<TrainSnapshot> {
        world
            .trains
            .iter()
            .filter_map(|train| {
                let route = world.routes.get(train.route)?;
                let position = train.position(route, &world.stations)?;
                Some(TrainSnapshot {
                    id: train.id,
                    route: train.route,
                    position,
                    edge_index: train.edge_index,
                    progress: train.progress,
                    direction: train.direction,
                    manifest: u32::try_from(train.manifest.len()).unwrap_or(u32::MAX),
                    capacity: world.train_settings.capacity,
                })
            })
            .collect()
    }

    /// Captures the complete session state for adapters.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            stations: station_view(world),
            routes: route_view(world),
            trains: train_view(world),
            score: world.score,
            elapsed: world.elapsed,
            passengers_generated: world.passengers_generated,
            max_stations: world.stations.max_stations(),
            game_over: world.game_over.clone(),
            visualization: world.visualization,
        }
    }
}
