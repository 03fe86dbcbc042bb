#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game loop that drives the Transit Rush world and its systems tick by tick.
//!
//! Every tick runs the same ordered pipeline: advance the clock, spawn
//! stations, generate demand, apply queued player input, move trains, refresh
//! overload timers and finally evaluate the game-over condition. Player input
//! submitted between ticks is buffered so that train movement always observes
//! a settled route topology.

use std::{collections::VecDeque, time::Duration};

use transit_rush_core::{
    Command, ConfigError, Event, GameSnapshot, RouteId, SimulationConfig, StationId,
    VisualizationMode,
};
use transit_rush_system_demand::{self as demand, Demand};
use transit_rush_system_overload::GameOverEvaluator;
use transit_rush_system_planner::RoutePlanner;
use transit_rush_system_spawning::{self as spawning, Spawning};
use transit_rush_world::{self as world, query, World};

pub use transit_rush_system_planner::RouteGesture;

/// Mixed into the configured seed so demand draws from its own stream.
const DEMAND_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Player input waiting for the next tick.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PendingInput {
    Connect { from: StationId, to: StationId },
    Gesture(RouteGesture),
    Dispatch(RouteId),
}

/// A running simulation session.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    spawning: Spawning,
    demand: Demand,
    planner: RoutePlanner,
    evaluator: GameOverEvaluator,
    pending: VecDeque<PendingInput>,
}

impl Simulation {
    /// Validates `config`, builds the world and places the initial stations.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let spawning_config =
            spawning::Config::new(config.spawn_interval(), config.seed, config.cities.clone());
        let available = spawning_config.site_count();
        if available < usize::try_from(config.initial_stations).unwrap_or(usize::MAX) {
            return Err(ConfigError::InsufficientCities {
                available,
                required: config.initial_stations,
            });
        }

        let mut simulation = Self {
            world: World::new(&config),
            spawning: Spawning::new(spawning_config),
            demand: Demand::new(demand::Config::new(
                config.passenger_interval(),
                config.seed ^ DEMAND_STREAM,
            )),
            planner: RoutePlanner::new(config.snap_radius_km, config.snap_policy),
            evaluator: GameOverEvaluator::new(config.overload_grace()),
            pending: VecDeque::new(),
            config,
        };

        let mut events = Vec::new();
        simulation.seed_initial_stations(&mut events);
        tracing::info!(
            stations = query::station_count(&simulation.world),
            seed = simulation.config.seed,
            "simulation started"
        );
        Ok(simulation)
    }

    /// Configuration the session was built from.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Complete session state for adapters.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        query::snapshot(&self.world)
    }

    /// Reports whether the session has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        query::is_game_over(&self.world)
    }

    /// Queues a connection between two stations for the next tick.
    pub fn connect(&mut self, from: StationId, to: StationId) {
        self.pending.push_back(PendingInput::Connect { from, to });
    }

    /// Queues a drag gesture; it is snapped onto stations during the next tick.
    pub fn submit_gesture(&mut self, gesture: RouteGesture) {
        self.pending.push_back(PendingInput::Gesture(gesture));
    }

    /// Queues an additional train for `route`.
    pub fn dispatch_train(&mut self, route: RouteId) {
        self.pending.push_back(PendingInput::Dispatch(route));
    }

    /// Switches the rendering hint immediately.
    pub fn set_visualization_mode(&mut self, mode: VisualizationMode) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SetVisualizationMode { mode },
            &mut events,
        );
        events
    }

    /// Flips between the simple and parallel rendering hints.
    pub fn toggle_visualization_mode(&mut self) -> Vec<Event> {
        let mode = query::visualization_mode(&self.world).toggled();
        self.set_visualization_mode(mode)
    }

    /// Discards all session state and places fresh initial stations.
    pub fn reset(&mut self) -> Vec<Event> {
        self.pending.clear();

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Reset, &mut events);
        // Systems observe the reset so their accumulators and streams restart.
        self.run_systems_after_reset(&events);
        self.seed_initial_stations(&mut events);
        tracing::info!("simulation reset");
        events
    }

    /// Advances the session by `dt` and returns every event produced.
    ///
    /// Once the session has ended this is a no-op.
    pub fn tick(&mut self, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        if self.is_game_over() {
            return events;
        }

        self.apply(Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        self.spawning.handle(
            &events,
            query::max_stations(&self.world),
            &query::station_positions(&self.world),
            &mut commands,
        );
        self.apply_all(&mut commands, &mut events);

        self.demand
            .handle(&events, &query::station_ids(&self.world), &mut commands);
        self.apply_all(&mut commands, &mut events);

        self.drain_pending(&mut events);

        self.apply(Command::AdvanceTrains { dt }, &mut events);
        self.apply(Command::RefreshOverload { dt }, &mut events);

        self.evaluator
            .handle(&events, &query::station_view(&self.world), &mut commands);
        self.apply_all(&mut commands, &mut events);

        tracing::debug!(
            elapsed = ?query::elapsed(&self.world),
            score = query::score(&self.world),
            events = events.len(),
            "tick complete"
        );
        events
    }

    fn apply(&mut self, command: Command, events: &mut Vec<Event>) {
        world::apply(&mut self.world, command, events);
    }

    fn apply_all(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }

    fn drain_pending(&mut self, events: &mut Vec<Event>) {
        let mut commands = Vec::new();
        while let Some(input) = self.pending.pop_front() {
            match input {
                PendingInput::Connect { from, to } => commands.push(Command::ConnectStations {
                    from,
                    to,
                    extend: None,
                }),
                PendingInput::Gesture(gesture) => self.planner.handle(
                    gesture,
                    &query::station_view(&self.world),
                    &query::route_view(&self.world),
                    &mut commands,
                ),
                PendingInput::Dispatch(route) => {
                    commands.push(Command::DispatchTrain { route });
                }
            }
            // Each input sees the topology left by the previous one.
            self.apply_all(&mut commands, events);
        }
    }

    fn run_systems_after_reset(&mut self, events: &[Event]) {
        let mut commands = Vec::new();
        self.spawning.handle(
            events,
            query::max_stations(&self.world),
            &query::station_positions(&self.world),
            &mut commands,
        );
        self.demand
            .handle(events, &query::station_ids(&self.world), &mut commands);
        debug_assert!(commands.is_empty(), "reset must not emit commands");
    }

    fn seed_initial_stations(&mut self, events: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.spawning.seed_initial(
            self.config.initial_stations,
            &query::station_positions(&self.world),
            &mut commands,
        );
        self.apply_all(&mut commands, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            spawn_interval_secs: 1_000.0,
            passenger_interval_secs: 1_000.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn new_places_initial_stations() {
        let simulation = Simulation::new(quiet_config()).expect("valid config");
        assert_eq!(simulation.snapshot().stations.len(), 2);
        assert!(simulation
            .snapshot()
            .stations
            .iter()
            .all(|station| station.city.is_some()));
    }

    #[test]
    fn rejects_pool_smaller_than_initial_stations() {
        let config = SimulationConfig {
            initial_stations: 2,
            cities: vec![transit_rush_core::CitySite::new(
                "Solo",
                transit_rush_core::GeoPoint::new_unchecked(10.0, 10.0),
            )],
            ..quiet_config()
        };
        assert_eq!(
            Simulation::new(config).err(),
            Some(ConfigError::InsufficientCities {
                available: 1,
                required: 2,
            })
        );
    }

    #[test]
    fn queued_input_waits_for_tick() {
        let mut simulation = Simulation::new(quiet_config()).expect("valid config");
        simulation.connect(StationId::new(1), StationId::new(2));
        assert!(simulation.snapshot().routes.is_empty());

        let _ = simulation.tick(Duration::from_millis(10));
        assert_eq!(simulation.snapshot().routes.len(), 1);
        assert!(simulation.pending.is_empty());
    }
}
