//! Train movement along routes and the station pickup/delivery protocol.
//!
//! Progress is always measured from an edge's first station towards its
//! second, independent of travel direction. A train that reaches a station
//! snaps onto it exactly (`0.0` or `1.0`), which is how the protocol detects
//! that a train is stopped at a station.

use std::time::Duration;

use transit_rush_core::{
    geo, Event, GeoPoint, RouteId, StationId, TrainId, TravelDirection,
};

use crate::{
    routes::{Route, RouteGraph},
    stations::{Passenger, StationRegistry},
};

const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Physical parameters shared by every train.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TrainSettings {
    pub(crate) speed_kmh: f64,
    pub(crate) time_scale: f64,
    pub(crate) capacity: u32,
    pub(crate) per_route: u32,
    pub(crate) overload_threshold: u32,
}

impl TrainSettings {
    /// Kilometres a train covers during `dt` of game time.
    pub(crate) fn travel_budget_km(&self, dt: Duration) -> f64 {
        self.speed_kmh * dt.as_secs_f64() * self.time_scale / SECONDS_PER_HOUR
    }
}

/// Single train bound to one route.
#[derive(Clone, Debug)]
pub(crate) struct Train {
    pub(crate) id: TrainId,
    pub(crate) route: RouteId,
    pub(crate) edge_index: usize,
    pub(crate) progress: f64,
    pub(crate) direction: TravelDirection,
    pub(crate) manifest: Vec<Passenger>,
}

impl Train {
    fn new(id: TrainId, route: RouteId) -> Self {
        Self {
            id,
            route,
            edge_index: 0,
            progress: 0.0,
            direction: TravelDirection::Forward,
            manifest: Vec::new(),
        }
    }

    /// Index into the route's station list when the train is stopped at a station.
    fn docked_index(&self, route: &Route) -> Option<usize> {
        if self.edge_index >= route.edge_count() || route.stations.is_empty() {
            return None;
        }
        if self.progress <= 0.0 {
            Some(self.edge_index)
        } else if self.progress >= 1.0 {
            Some((self.edge_index + 1) % route.stations.len())
        } else {
            None
        }
    }

    /// Interpolated position between the current edge's stations.
    pub(crate) fn position(&self, route: &Route, stations: &StationRegistry) -> Option<GeoPoint> {
        let (start, end) = route.edge(self.edge_index)?;
        let from = stations.position(start)?;
        let to = stations.position(end)?;
        Some(geo::interpolate(from, to, self.progress))
    }

    /// Moves the train by up to `budget_km` and reports the station reached.
    ///
    /// A train stops at the first station it reaches; distance left over in
    /// the budget is discarded so no station is ever passed without service.
    fn travel(
        &mut self,
        route: &Route,
        stations: &StationRegistry,
        budget_km: f64,
    ) -> Option<Arrival> {
        if budget_km <= 0.0 {
            return None;
        }
        let (start, end) = route.edge(self.edge_index)?;
        let length = geo::haversine_km(stations.position(start)?, stations.position(end)?);

        let remaining = match self.direction {
            TravelDirection::Forward => (1.0 - self.progress) * length,
            TravelDirection::Backward => self.progress * length,
        };

        if length > f64::EPSILON && budget_km < remaining {
            let delta = budget_km / length;
            self.progress = match self.direction {
                TravelDirection::Forward => (self.progress + delta).min(1.0),
                TravelDirection::Backward => (self.progress - delta).max(0.0),
            };
            return None;
        }

        let station = match self.direction {
            TravelDirection::Forward => {
                self.progress = 1.0;
                end
            }
            TravelDirection::Backward => {
                self.progress = 0.0;
                start
            }
        };
        let reversed = self.turn_at_station(route);
        Some(Arrival { station, reversed })
    }

    /// Moves onto the next edge, wrapping on loops and reversing at terminals.
    fn turn_at_station(&mut self, route: &Route) -> bool {
        let edge_count = route.edge_count();
        match self.direction {
            TravelDirection::Forward => {
                if self.edge_index + 1 < edge_count {
                    self.edge_index += 1;
                    self.progress = 0.0;
                } else if route.circular {
                    self.edge_index = 0;
                    self.progress = 0.0;
                } else {
                    self.direction = TravelDirection::Backward;
                    return true;
                }
            }
            TravelDirection::Backward => {
                if self.edge_index > 0 {
                    self.edge_index -= 1;
                    self.progress = 1.0;
                } else if route.circular {
                    self.edge_index = edge_count.saturating_sub(1);
                    self.progress = 1.0;
                } else {
                    self.direction = TravelDirection::Forward;
                    return true;
                }
            }
        }
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Arrival {
    station: StationId,
    reversed: bool,
}

/// Registry of trains kept in creation order.
#[derive(Debug)]
pub(crate) struct TrainFleet {
    trains: Vec<Train>,
    next_train_id: u32,
}

impl TrainFleet {
    pub(crate) fn new() -> Self {
        Self {
            trains: Vec::new(),
            next_train_id: 1,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Train> {
        self.trains.iter()
    }

    pub(crate) fn count_on(&self, route: RouteId) -> usize {
        self.trains
            .iter()
            .filter(|train| train.route == route)
            .count()
    }

    /// Places a train on the first edge of `route`, heading forward.
    pub(crate) fn dispatch(&mut self, route: RouteId) -> TrainId {
        let id = TrainId::new(self.next_train_id);
        self.next_train_id = self.next_train_id.saturating_add(1);
        self.trains.push(Train::new(id, route));
        id
    }

    /// Keeps trains on the same edge after a station was inserted at the
    /// head of `route`.
    pub(crate) fn shift_for_prepend(&mut self, route: RouteId) {
        for train in self.trains.iter_mut().filter(|train| train.route == route) {
            train.edge_index += 1;
        }
    }

    /// Moves every train in creation order and services the stations they
    /// stop at. Returns the number of passengers delivered.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        settings: &TrainSettings,
        routes: &RouteGraph,
        stations: &mut StationRegistry,
        out_events: &mut Vec<Event>,
    ) -> u64 {
        let budget_km = settings.travel_budget_km(dt);
        let mut delivered = 0;

        for train in &mut self.trains {
            let Some(route) = routes.get(train.route) else {
                continue;
            };

            delivered += service_station(train, route, stations, settings, out_events);

            let Some(arrival) = train.travel(route, stations, budget_km) else {
                continue;
            };

            out_events.push(Event::TrainArrived {
                train: train.id,
                station: arrival.station,
            });
            if arrival.reversed {
                out_events.push(Event::TrainReversed {
                    train: train.id,
                    direction: train.direction,
                });
            }

            delivered += service_station(train, route, stations, settings, out_events);
        }

        delivered
    }
}

/// Stations still ahead of the station at `index` in the travel direction.
fn stations_ahead(route: &Route, index: usize, direction: TravelDirection) -> Vec<StationId> {
    if route.circular {
        return route
            .stations
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, station)| *station)
            .collect();
    }

    match direction {
        TravelDirection::Forward => route
            .stations
            .get(index + 1..)
            .unwrap_or_default()
            .to_vec(),
        TravelDirection::Backward => route
            .stations
            .get(..index)
            .unwrap_or_default()
            .to_vec(),
    }
}

/// Runs the passenger protocol for a train stopped at a station.
///
/// Passengers bound for the station leave first, then waiting passengers
/// whose destination lies ahead board in queue order until the train is full.
fn service_station(
    train: &mut Train,
    route: &Route,
    stations: &mut StationRegistry,
    settings: &TrainSettings,
    out_events: &mut Vec<Event>,
) -> u64 {
    let Some(index) = train.docked_index(route) else {
        return 0;
    };
    let station_id = route.stations[index];
    let Some(station) = stations.get_mut(station_id) else {
        return 0;
    };

    let (arriving, riding): (Vec<Passenger>, Vec<Passenger>) = train
        .manifest
        .drain(..)
        .partition(|passenger| passenger.destination == station_id);
    train.manifest = riding;

    for passenger in &arriving {
        tracing::trace!(
            passenger = passenger.id.get(),
            station = station_id.get(),
            "passenger delivered"
        );
    }
    let delivered = u32::try_from(arriving.len()).unwrap_or(u32::MAX);
    if delivered > 0 {
        out_events.push(Event::PassengersDelivered {
            train: train.id,
            station: station_id,
            count: delivered,
        });
    }

    let capacity = usize::try_from(settings.capacity).unwrap_or(usize::MAX);
    let ahead = stations_ahead(route, index, train.direction);
    let mut boarded = 0_u32;
    if train.manifest.len() < capacity && !station.queue.is_empty() {
        let mut waiting = std::mem::take(&mut station.queue);
        station.queue.reserve(waiting.len());
        while let Some(passenger) = waiting.pop_front() {
            if train.manifest.len() < capacity && ahead.contains(&passenger.destination) {
                train.manifest.push(passenger);
                boarded += 1;
            } else {
                station.queue.push_back(passenger);
            }
        }
    }

    if boarded > 0 {
        out_events.push(Event::PassengersBoarded {
            train: train.id,
            station: station_id,
            count: boarded,
        });
        if station.settle_below(settings.overload_threshold) {
            out_events.push(Event::StationRecovered {
                station: station_id,
            });
        }
    }

    u64::from(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_rush_core::PassengerId;

    const SETTINGS: TrainSettings = TrainSettings {
        speed_kmh: 100.0,
        time_scale: 1.0,
        capacity: 6,
        per_route: 1,
        overload_threshold: 20,
    };

    fn route(stations: &[u32], circular: bool) -> Route {
        Route {
            id: RouteId::new(1),
            stations: stations.iter().copied().map(StationId::new).collect(),
            circular,
            color: transit_rush_core::RouteColor::from_rgb(0, 0, 0),
        }
    }

    fn train() -> Train {
        Train::new(TrainId::new(1), RouteId::new(1))
    }

    fn ids(values: &[u32]) -> Vec<StationId> {
        values.iter().copied().map(StationId::new).collect()
    }

    #[test]
    fn travel_budget_scales_with_time_scale() {
        let settings = TrainSettings {
            time_scale: 60.0,
            ..SETTINGS
        };
        let budget = settings.travel_budget_km(Duration::from_secs(6));
        assert!((budget - 10.0).abs() < 1e-9);
    }

    #[test]
    fn forward_turn_advances_then_reverses_at_terminal() {
        let route = route(&[1, 2, 3], false);
        let mut train = train();
        train.progress = 1.0;

        assert!(!train.turn_at_station(&route));
        assert_eq!((train.edge_index, train.progress), (1, 0.0));

        train.progress = 1.0;
        assert!(train.turn_at_station(&route));
        assert_eq!(train.direction, TravelDirection::Backward);
        assert_eq!((train.edge_index, train.progress), (1, 1.0));
        assert_eq!(train.docked_index(&route), Some(2));
    }

    #[test]
    fn backward_turn_reverses_at_origin() {
        let route = route(&[1, 2], false);
        let mut train = train();
        train.direction = TravelDirection::Backward;
        train.progress = 0.0;

        assert!(train.turn_at_station(&route));
        assert_eq!(train.direction, TravelDirection::Forward);
        assert_eq!(train.docked_index(&route), Some(0));
    }

    #[test]
    fn loops_wrap_in_both_directions() {
        let route = route(&[1, 2, 3], true);
        let mut train = train();
        train.edge_index = 2;
        train.progress = 1.0;

        assert!(!train.turn_at_station(&route));
        assert_eq!((train.edge_index, train.progress), (0, 0.0));

        train.direction = TravelDirection::Backward;
        assert!(!train.turn_at_station(&route));
        assert_eq!((train.edge_index, train.progress), (2, 1.0));
        assert_eq!(train.docked_index(&route), Some(0));
    }

    #[test]
    fn stations_ahead_follow_direction() {
        let line = route(&[1, 2, 3, 4], false);
        assert_eq!(
            stations_ahead(&line, 1, TravelDirection::Forward),
            ids(&[3, 4])
        );
        assert_eq!(
            stations_ahead(&line, 1, TravelDirection::Backward),
            ids(&[1])
        );
        assert!(stations_ahead(&line, 3, TravelDirection::Forward).is_empty());

        let ring = route(&[1, 2, 3], true);
        assert_eq!(
            stations_ahead(&ring, 1, TravelDirection::Backward),
            ids(&[1, 3])
        );
    }

    #[test]
    fn mid_edge_train_is_not_docked() {
        let route = route(&[1, 2], false);
        let mut train = train();
        train.progress = 0.4;
        assert_eq!(train.docked_index(&route), None);
    }

    #[test]
    fn boarding_respects_capacity_and_queue_order() {
        let mut stations = StationRegistry::new(4);
        let first = stations
            .spawn(GeoPoint::new_unchecked(50.0, 8.0), None)
            .expect("spawn");
        let second = stations
            .spawn(GeoPoint::new_unchecked(50.5, 8.0), None)
            .expect("spawn");
        let unreachable = StationId::new(99);

        let station = stations.get_mut(first).expect("station");
        for index in 0..10 {
            let destination = if index == 1 { unreachable } else { second };
            station.queue.push_back(Passenger {
                id: PassengerId::new(index),
                destination,
                created_at: Duration::ZERO,
            });
        }

        let route = Route {
            stations: vec![first, second],
            ..route(&[], false)
        };
        let mut train = train();
        let mut events = Vec::new();
        let delivered = service_station(&mut train, &route, &mut stations, &SETTINGS, &mut events);

        assert_eq!(delivered, 0);
        let boarded: Vec<u64> = train.manifest.iter().map(|p| p.id.get()).collect();
        assert_eq!(boarded, vec![0, 2, 3, 4, 5, 6]);

        let waiting: Vec<u64> = stations
            .get(first)
            .expect("station")
            .queue
            .iter()
            .map(|p| p.id.get())
            .collect();
        assert_eq!(waiting, vec![1, 7, 8, 9]);
        assert_eq!(
            events,
            vec![Event::PassengersBoarded {
                train: TrainId::new(1),
                station: first,
                count: 6,
            }]
        );
    }
}
