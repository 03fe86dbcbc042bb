//! Scripted player that links every station to its nearest neighbour.

use transit_rush_core::{Event, StationId, StationSnapshot};
use transit_rush_engine::Simulation;

/// Connects each station to the closest station that was already on the map.
#[derive(Debug, Default)]
pub(crate) struct Autoplay {
    connections: u32,
}

impl Autoplay {
    /// Links the initial stations in spawn order.
    pub(crate) fn start(&mut self, simulation: &mut Simulation) {
        let stations = simulation.snapshot().stations;
        for (index, station) in stations.iter().enumerate().skip(1) {
            if let Some(target) = nearest(station, &stations[..index]) {
                simulation.connect(target, station.id);
                self.connections += 1;
            }
        }
    }

    /// Reacts to the events of a tick by linking freshly spawned stations.
    pub(crate) fn handle(&mut self, events: &[Event], simulation: &mut Simulation) {
        let spawned: Vec<StationId> = events
            .iter()
            .filter_map(|event| match event {
                Event::StationSpawned { station, .. } => Some(*station),
                _ => None,
            })
            .collect();
        if spawned.is_empty() {
            return;
        }

        let stations = simulation.snapshot().stations;
        for id in spawned {
            let Some(station) = stations.iter().find(|station| station.id == id) else {
                continue;
            };
            let others: Vec<StationSnapshot> = stations
                .iter()
                .filter(|other| other.id != id)
                .cloned()
                .collect();
            if let Some(target) = nearest(station, &others) {
                tracing::debug!(from = target.get(), to = id.get(), "autoplay connecting");
                simulation.connect(target, id);
                self.connections += 1;
            }
        }
    }

    /// Connections requested so far.
    pub(crate) fn connections(&self) -> u32 {
        self.connections
    }
}

fn nearest(station: &StationSnapshot, candidates: &[StationSnapshot]) -> Option<StationId> {
    candidates
        .iter()
        .map(|other| (other.id, station.position.distance_km(other.position)))
        .min_by(|(_, left), (_, right)| left.total_cmp(right))
        .map(|(id, _)| id)
}
