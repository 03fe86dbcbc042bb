use std::time::Duration;

use transit_rush_core::{Command, Event, GeoPoint, SimulationConfig, StationId};
use transit_rush_system_demand::{Config, Demand};
use transit_rush_world::{self as world, query, World};

fn advanced(seconds: u64) -> Event {
    Event::TimeAdvanced {
        dt: Duration::from_secs(seconds),
        elapsed: Duration::from_secs(seconds),
    }
}

fn ids(values: &[u32]) -> Vec<StationId> {
    values.iter().copied().map(StationId::new).collect()
}

#[test]
fn lone_station_accrues_nothing() {
    let mut demand = Demand::new(Config::new(Duration::from_secs(4), 11));
    let mut commands = Vec::new();

    demand.handle(&[advanced(60)], &ids(&[1]), &mut commands);
    assert!(commands.is_empty());

    // Time spent alone is not banked once a second station appears.
    demand.handle(&[advanced(1)], &ids(&[1, 2]), &mut commands);
    assert!(commands.is_empty());
}

#[test]
fn each_station_generates_once_per_interval() {
    let mut demand = Demand::new(Config::new(Duration::from_secs(4), 11));
    let stations = ids(&[1, 2, 3]);
    let mut commands = Vec::new();

    demand.handle(&[advanced(9)], &stations, &mut commands);

    assert_eq!(commands.len(), 6, "two passengers per station");
    for command in &commands {
        match command {
            Command::GeneratePassenger {
                origin,
                destination,
            } => {
                assert_ne!(origin, destination);
                assert!(stations.contains(destination));
            }
            other => panic!("unexpected command emitted: {other:?}"),
        }
    }
}

#[test]
fn destinations_cover_every_other_station() {
    let mut demand = Demand::new(Config::new(Duration::from_secs(1), 23));
    let stations = ids(&[1, 2, 3, 4]);
    let mut commands = Vec::new();

    demand.handle(&[advanced(200)], &stations, &mut commands);

    let mut seen = Vec::new();
    for command in &commands {
        if let Command::GeneratePassenger {
            origin,
            destination,
        } = command
        {
            if origin.get() == 1 && !seen.contains(destination) {
                seen.push(*destination);
            }
        }
    }
    seen.sort();
    assert_eq!(seen, ids(&[2, 3, 4]));
}

#[test]
fn world_accepts_generated_passengers() {
    let config = SimulationConfig::default();
    let mut world = World::new(&config);
    let mut events = Vec::new();
    for latitude in [48.0, 49.0] {
        world::apply(
            &mut world,
            Command::SpawnStation {
                position: GeoPoint::new_unchecked(latitude, 11.0),
                city: None,
            },
            &mut events,
        );
    }

    let mut demand = Demand::new(Config::new(config.passenger_interval(), config.seed));
    let mut commands = Vec::new();
    demand.handle(&[advanced(8)], &query::station_ids(&world), &mut commands);

    events.clear();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    assert_eq!(events.len(), 4);
    assert!(events
        .iter()
        .all(|event| matches!(event, Event::PassengerGenerated { .. })));
    let snapshot = query::snapshot(&world);
    assert_eq!(snapshot.passengers_generated, 4);
    assert!(snapshot
        .stations
        .iter()
        .all(|station| station.queue_length == 2));
}

#[test]
fn world_reset_clears_partial_accumulators() {
    let mut demand = Demand::new(Config::new(Duration::from_secs(4), 11));
    let stations = ids(&[1, 2]);
    let mut commands = Vec::new();

    demand.handle(&[advanced(3)], &stations, &mut commands);
    demand.handle(&[Event::WorldReset, advanced(3)], &stations, &mut commands);

    assert!(commands.is_empty());
}

#[test]
fn station_spawned_mid_tick_starts_accruing_next_tick() {
    let mut demand = Demand::new(Config::new(Duration::from_secs(4), 11));
    let mut commands = Vec::new();
    let spawned = Event::StationSpawned {
        station: StationId::new(3),
        position: GeoPoint::new_unchecked(50.0, 10.0),
    };

    demand.handle(&[advanced(4), spawned], &ids(&[1, 2, 3]), &mut commands);
    let origins: Vec<StationId> = commands
        .iter()
        .filter_map(|command| match command {
            Command::GeneratePassenger { origin, .. } => Some(*origin),
            _ => None,
        })
        .collect();
    assert_eq!(origins, ids(&[1, 2]));

    commands.clear();
    demand.handle(&[advanced(4)], &ids(&[1, 2, 3]), &mut commands);
    assert_eq!(commands.len(), 3);
}
