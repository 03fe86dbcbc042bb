//! Authoritative station state: positions, passenger queues and overload timers.

use std::{collections::VecDeque, time::Duration};

use transit_rush_core::{GeoPoint, PassengerId, SpawnError, StationId};

/// Coordinates closer than this many kilometres count as the same site.
const SITE_TOLERANCE_KM: f64 = 0.05;

/// Passenger waiting at a station or riding a train.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Passenger {
    pub(crate) id: PassengerId,
    pub(crate) destination: StationId,
    pub(crate) created_at: Duration,
}

/// Single station stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Station {
    pub(crate) id: StationId,
    pub(crate) city: Option<String>,
    pub(crate) position: GeoPoint,
    pub(crate) queue: VecDeque<Passenger>,
    overload: Duration,
    overloaded: bool,
}

impl Station {
    fn new(id: StationId, position: GeoPoint, city: Option<String>) -> Self {
        Self {
            id,
            city,
            position,
            queue: VecDeque::new(),
            overload: Duration::ZERO,
            overloaded: false,
        }
    }

    /// Continuous time spent at or above the overload threshold.
    pub(crate) fn overload(&self) -> Duration {
        self.overload
    }

    pub(crate) fn queue_length(&self) -> u32 {
        u32::try_from(self.queue.len()).unwrap_or(u32::MAX)
    }

    /// Clears the overload timer if the queue dropped below `threshold`.
    ///
    /// Returns `true` when the station left the overloaded state.
    pub(crate) fn settle_below(&mut self, threshold: u32) -> bool {
        if self.queue_length() >= threshold {
            return false;
        }
        self.overload = Duration::ZERO;
        std::mem::replace(&mut self.overloaded, false)
    }
}

/// Transition reported while refreshing overload timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OverloadTransition {
    Entered { station: StationId, waiting: u32 },
    Cleared { station: StationId },
}

/// Registry that stores stations in spawn order and allocates identifiers.
#[derive(Debug)]
pub(crate) struct StationRegistry {
    stations: Vec<Station>,
    next_station_id: u32,
    max_stations: u32,
}

impl StationRegistry {
    pub(crate) fn new(max_stations: u32) -> Self {
        Self {
            stations: Vec::new(),
            next_station_id: 1,
            max_stations,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.stations.len()
    }

    pub(crate) fn max_stations(&self) -> u32 {
        self.max_stations
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub(crate) fn contains(&self, id: StationId) -> bool {
        self.index(id).is_some()
    }

    pub(crate) fn get(&self, id: StationId) -> Option<&Station> {
        self.index(id).map(|index| &self.stations[index])
    }

    pub(crate) fn get_mut(&mut self, id: StationId) -> Option<&mut Station> {
        self.index(id).map(move |index| &mut self.stations[index])
    }

    pub(crate) fn position(&self, id: StationId) -> Option<GeoPoint> {
        self.get(id).map(|station| station.position)
    }

    /// Places a new station, enforcing the cap as a hard upper bound.
    pub(crate) fn spawn(
        &mut self,
        position: GeoPoint,
        city: Option<String>,
    ) -> Result<StationId, SpawnError> {
        let count = u32::try_from(self.stations.len()).unwrap_or(u32::MAX);
        if count >= self.max_stations {
            return Err(SpawnError::AtCapacity {
                max: self.max_stations,
            });
        }

        if let Some(occupant) = self
            .stations
            .iter()
            .find(|station| station.position.distance_km(position) < SITE_TOLERANCE_KM)
        {
            return Err(SpawnError::SiteOccupied(occupant.id));
        }

        let id = StationId::new(self.next_station_id);
        self.next_station_id = self.next_station_id.saturating_add(1);
        self.stations.push(Station::new(id, position, city));
        Ok(id)
    }

    /// Advances every station's overload timer by `dt`.
    ///
    /// A station that reaches `threshold` on this refresh starts its timer at
    /// zero and accumulates from the next refresh on. Stations below the
    /// threshold reset to zero.
    pub(crate) fn refresh_overload(
        &mut self,
        dt: Duration,
        threshold: u32,
        out: &mut Vec<OverloadTransition>,
    ) {
        for station in &mut self.stations {
            let waiting = station.queue_length();
            if waiting >= threshold {
                if station.overloaded {
                    station.overload = station.overload.saturating_add(dt);
                } else {
                    station.overloaded = true;
                    out.push(OverloadTransition::Entered {
                        station: station.id,
                        waiting,
                    });
                }
            } else if station.settle_below(threshold) {
                out.push(OverloadTransition::Cleared {
                    station: station.id,
                });
            }
        }
    }

    fn index(&self, id: StationId) -> Option<usize> {
        self.stations
            .binary_search_by_key(&id, |station| station.id)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(offset: f64) -> GeoPoint {
        GeoPoint::new_unchecked(50.0 + offset, 8.0 + offset)
    }

    fn passenger(id: u64, destination: StationId) -> Passenger {
        Passenger {
            id: PassengerId::new(id),
            destination,
            created_at: Duration::ZERO,
        }
    }

    #[test]
    fn spawn_allocates_sequential_identifiers() {
        let mut registry = StationRegistry::new(4);
        let first = registry.spawn(site(0.0), None).expect("first spawn");
        let second = registry.spawn(site(1.0), None).expect("second spawn");

        assert_eq!(first, StationId::new(1));
        assert_eq!(second, StationId::new(2));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn spawn_respects_cap() {
        let mut registry = StationRegistry::new(1);
        let _ = registry.spawn(site(0.0), None).expect("first spawn");

        assert_eq!(
            registry.spawn(site(1.0), None),
            Err(SpawnError::AtCapacity { max: 1 })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn spawn_rejects_occupied_site() {
        let mut registry = StationRegistry::new(4);
        let first = registry.spawn(site(0.0), None).expect("first spawn");

        assert_eq!(
            registry.spawn(site(0.0), Some("Again".to_owned())),
            Err(SpawnError::SiteOccupied(first))
        );
    }

    #[test]
    fn overload_accumulates_and_resets_below_threshold() {
        let mut registry = StationRegistry::new(2);
        let origin = registry.spawn(site(0.0), None).expect("spawn");
        let destination = registry.spawn(site(1.0), None).expect("spawn");
        let mut transitions = Vec::new();

        for index in 0..3 {
            registry
                .get_mut(origin)
                .expect("origin")
                .queue
                .push_back(passenger(index, destination));
        }

        registry.refresh_overload(Duration::from_secs(1), 3, &mut transitions);
        registry.refresh_overload(Duration::from_secs(1), 3, &mut transitions);
        registry.refresh_overload(Duration::from_secs(1), 3, &mut transitions);
        assert_eq!(
            registry.get(origin).expect("origin").overload(),
            Duration::from_secs(2)
        );
        assert_eq!(
            transitions,
            vec![OverloadTransition::Entered {
                station: origin,
                waiting: 3,
            }]
        );

        let _ = registry.get_mut(origin).expect("origin").queue.pop_front();
        registry.refresh_overload(Duration::from_secs(1), 3, &mut transitions);

        assert_eq!(
            registry.get(origin).expect("origin").overload(),
            Duration::ZERO
        );
        assert_eq!(
            transitions.last(),
            Some(&OverloadTransition::Cleared { station: origin })
        );
        assert_eq!(
            registry.get(destination).expect("destination").overload(),
            Duration::ZERO
        );
    }

    #[test]
    fn overload_counts_from_the_refresh_that_reached_threshold() {
        let mut registry = StationRegistry::new(2);
        let origin = registry.spawn(site(0.0), None).expect("spawn");
        let destination = registry.spawn(site(1.0), None).expect("spawn");
        let mut transitions = Vec::new();
        registry
            .get_mut(origin)
            .expect("origin")
            .queue
            .push_back(passenger(0, destination));

        registry.refresh_overload(Duration::from_secs(1), 1, &mut transitions);
        assert_eq!(transitions.len(), 1);
        assert_eq!(
            registry.get(origin).expect("origin").overload(),
            Duration::ZERO
        );

        registry.refresh_overload(Duration::from_millis(500), 1, &mut transitions);
        assert_eq!(
            registry.get(origin).expect("origin").overload(),
            Duration::from_millis(500)
        );
    }
}
