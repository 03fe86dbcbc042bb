//! Authoritative route graph built from player connection requests.

use transit_rush_core::{ConnectError, ConnectOutcome, RouteColor, RouteId, StationId};

const ROUTE_COLORS: [RouteColor; 8] = [
    RouteColor::from_rgb(0xe5, 0x39, 0x35),
    RouteColor::from_rgb(0x1e, 0x88, 0xe5),
    RouteColor::from_rgb(0x43, 0xa0, 0x47),
    RouteColor::from_rgb(0xfb, 0x8c, 0x00),
    RouteColor::from_rgb(0x8e, 0x24, 0xaa),
    RouteColor::from_rgb(0x00, 0xac, 0xc1),
    RouteColor::from_rgb(0xfd, 0xd8, 0x35),
    RouteColor::from_rgb(0x6d, 0x4c, 0x41),
];

/// Ordered sequence of distinct stations traversed by trains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Route {
    pub(crate) id: RouteId,
    pub(crate) stations: Vec<StationId>,
    pub(crate) circular: bool,
    pub(crate) color: RouteColor,
}

impl Route {
    fn new(id: RouteId, from: StationId, to: StationId) -> Self {
        let palette_index = (id.get().saturating_sub(1) as usize) % ROUTE_COLORS.len();
        Self {
            id,
            stations: vec![from, to],
            circular: false,
            color: ROUTE_COLORS[palette_index],
        }
    }

    /// Number of edges; loops carry the closing edge from last back to first.
    pub(crate) fn edge_count(&self) -> usize {
        let count = self.stations.len();
        match count {
            0 | 1 => 0,
            _ if self.circular => count,
            _ => count - 1,
        }
    }

    /// Stations at both ends of the edge at `index`.
    pub(crate) fn edge(&self, index: usize) -> Option<(StationId, StationId)> {
        if index >= self.edge_count() {
            return None;
        }
        let start = self.stations[index];
        let end = self.stations[(index + 1) % self.stations.len()];
        Some((start, end))
    }

    pub(crate) fn has_edge(&self, a: StationId, b: StationId) -> bool {
        (0..self.edge_count()).any(|index| {
            self.edge(index)
                .is_some_and(|(start, end)| (start == a && end == b) || (start == b && end == a))
        })
    }

    pub(crate) fn contains(&self, station: StationId) -> bool {
        self.stations.contains(&station)
    }

    fn open_endpoints(&self) -> Option<(StationId, StationId)> {
        if self.circular {
            return None;
        }
        Some((*self.stations.first()?, *self.stations.last()?))
    }

    fn has_open_endpoint(&self, station: StationId) -> bool {
        self.open_endpoints()
            .is_some_and(|(first, last)| first == station || last == station)
    }

    fn plan_extension(&self, anchor: StationId, other: StationId) -> Option<Extension> {
        let (first, last) = self.open_endpoints()?;
        if anchor != first && anchor != last {
            return None;
        }

        let opposite = if anchor == last { first } else { last };
        if other == opposite {
            return (self.stations.len() >= 3).then_some(Extension::Close);
        }

        if self.contains(other) {
            return None;
        }

        if anchor == last {
            Some(Extension::Append)
        } else {
            Some(Extension::Prepend)
        }
    }

    fn extend(&mut self, extension: Extension, station: StationId) -> ConnectOutcome {
        match extension {
            Extension::Append => {
                self.stations.push(station);
                ConnectOutcome::Extended {
                    route: self.id,
                    station,
                    prepended: false,
                }
            }
            Extension::Prepend => {
                self.stations.insert(0, station);
                ConnectOutcome::Extended {
                    route: self.id,
                    station,
                    prepended: true,
                }
            }
            Extension::Close => {
                self.circular = true;
                ConnectOutcome::Closed { route: self.id }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Extension {
    Append,
    Prepend,
    Close,
}

/// Registry of routes ordered by creation.
#[derive(Debug)]
pub(crate) struct RouteGraph {
    routes: Vec<Route>,
    next_route_id: u32,
}

impl RouteGraph {
    pub(crate) fn new() -> Self {
        Self {
            routes: Vec::new(),
            next_route_id: 1,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub(crate) fn get(&self, id: RouteId) -> Option<&Route> {
        self.routes
            .binary_search_by_key(&id, |route| route.id)
            .ok()
            .map(|index| &self.routes[index])
    }

    /// Routes serving `station`, ascending by identifier.
    pub(crate) fn routes_for(&self, station: StationId) -> Vec<RouteId> {
        self.routes
            .iter()
            .filter(|route| route.contains(station))
            .map(|route| route.id)
            .collect()
    }

    /// Adds the edge `from`–`to`, extending an existing route where possible.
    ///
    /// The `extend` hint is honoured when `from` is one of that route's open
    /// endpoints. Otherwise the oldest route ending at `from` grows, then the
    /// oldest route ending at `to`, and only then is a new route created.
    pub(crate) fn connect<F>(
        &mut self,
        from: StationId,
        to: StationId,
        extend: Option<RouteId>,
        station_exists: F,
    ) -> Result<ConnectOutcome, ConnectError>
    where
        F: Fn(StationId) -> bool,
    {
        if from == to {
            return Err(ConnectError::SameStation(from));
        }
        for station in [from, to] {
            if !station_exists(station) {
                return Err(ConnectError::UnknownStation(station));
            }
        }
        if let Some(route) = self.routes.iter().find(|route| route.has_edge(from, to)) {
            return Err(ConnectError::Duplicate { route: route.id });
        }

        let hinted = extend.and_then(|hint| {
            let route = self.get(hint)?;
            if !route.has_open_endpoint(from) {
                return None;
            }
            let extension = route.plan_extension(from, to)?;
            Some((hint, extension, to))
        });

        let candidate = hinted
            .or_else(|| self.first_extension(from, to))
            .or_else(|| self.first_extension(to, from));

        if let Some((route_id, extension, station)) = candidate {
            if let Ok(index) = self
                .routes
                .binary_search_by_key(&route_id, |route| route.id)
            {
                return Ok(self.routes[index].extend(extension, station));
            }
        }

        let id = RouteId::new(self.next_route_id);
        self.next_route_id = self.next_route_id.saturating_add(1);
        self.routes.push(Route::new(id, from, to));
        Ok(ConnectOutcome::Created { route: id })
    }

    fn first_extension(
        &self,
        anchor: StationId,
        other: StationId,
    ) -> Option<(RouteId, Extension, StationId)> {
        self.routes.iter().find_map(|route| {
            route
                .plan_extension(anchor, other)
                .map(|extension| (route.id, extension, other))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(value: u32) -> StationId {
        StationId::new(value)
    }

    fn connect(graph: &mut RouteGraph, from: u32, to: u32) -> Result<ConnectOutcome, ConnectError> {
        graph.connect(station(from), station(to), None, |id| id.get() <= 10)
    }

    #[test]
    fn first_connection_creates_route() {
        let mut graph = RouteGraph::new();
        assert_eq!(
            connect(&mut graph, 1, 2),
            Ok(ConnectOutcome::Created {
                route: RouteId::new(1)
            })
        );
        let route = graph.get(RouteId::new(1)).expect("route");
        assert_eq!(route.stations, vec![station(1), station(2)]);
        assert_eq!(route.edge_count(), 1);
    }

    #[test]
    fn duplicate_in_either_direction_is_rejected() {
        let mut graph = RouteGraph::new();
        let _ = connect(&mut graph, 1, 2).expect("created");

        let duplicate = Err(ConnectError::Duplicate {
            route: RouteId::new(1),
        });
        assert_eq!(connect(&mut graph, 1, 2), duplicate);
        assert_eq!(connect(&mut graph, 2, 1), duplicate);
        assert_eq!(graph.iter().count(), 1);
    }

    #[test]
    fn invalid_requests_leave_graph_untouched() {
        let mut graph = RouteGraph::new();
        assert_eq!(
            connect(&mut graph, 3, 3),
            Err(ConnectError::SameStation(station(3)))
        );
        assert_eq!(
            connect(&mut graph, 3, 42),
            Err(ConnectError::UnknownStation(station(42)))
        );
        assert_eq!(graph.iter().count(), 0);
    }

    #[test]
    fn connecting_from_endpoint_extends_route() {
        let mut graph = RouteGraph::new();
        let _ = connect(&mut graph, 1, 2).expect("created");

        assert_eq!(
            connect(&mut graph, 2, 3),
            Ok(ConnectOutcome::Extended {
                route: RouteId::new(1),
                station: station(3),
                prepended: false,
            })
        );
        assert_eq!(
            connect(&mut graph, 1, 4),
            Ok(ConnectOutcome::Extended {
                route: RouteId::new(1),
                station: station(4),
                prepended: true,
            })
        );
        let route = graph.get(RouteId::new(1)).expect("route");
        assert_eq!(
            route.stations,
            vec![station(4), station(1), station(2), station(3)]
        );
    }

    #[test]
    fn connecting_towards_endpoint_extends_route() {
        let mut graph = RouteGraph::new();
        let _ = connect(&mut graph, 1, 2).expect("created");

        assert_eq!(
            connect(&mut graph, 5, 2),
            Ok(ConnectOutcome::Extended {
                route: RouteId::new(1),
                station: station(5),
                prepended: false,
            })
        );
    }

    #[test]
    fn joining_open_ends_closes_loop() {
        let mut graph = RouteGraph::new();
        let _ = connect(&mut graph, 1, 2).expect("created");
        let _ = connect(&mut graph, 2, 3).expect("extended");

        assert_eq!(
            connect(&mut graph, 3, 1),
            Ok(ConnectOutcome::Closed {
                route: RouteId::new(1)
            })
        );
        let route = graph.get(RouteId::new(1)).expect("route");
        assert!(route.circular);
        assert_eq!(route.edge_count(), 3);
        assert_eq!(route.edge(2), Some((station(3), station(1))));
        assert!(route.has_edge(station(1), station(3)));
    }

    #[test]
    fn mid_route_station_starts_new_route() {
        let mut graph = RouteGraph::new();
        let _ = connect(&mut graph, 1, 2).expect("created");
        let _ = connect(&mut graph, 2, 3).expect("extended");

        assert_eq!(
            connect(&mut graph, 2, 4),
            Ok(ConnectOutcome::Created {
                route: RouteId::new(2)
            })
        );
        assert_eq!(
            graph.routes_for(station(2)),
            vec![RouteId::new(1), RouteId::new(2)]
        );
        assert_eq!(graph.routes_for(station(4)), vec![RouteId::new(2)]);
        assert!(graph.routes_for(station(9)).is_empty());
    }

    #[test]
    fn hint_selects_junction_route() {
        let mut graph = RouteGraph::new();
        let _ = connect(&mut graph, 1, 2).expect("route 1");
        let _ = connect(&mut graph, 1, 3).expect("extends route 1 at its head");
        let _ = connect(&mut graph, 3, 4);
        let _ = connect(&mut graph, 5, 6).expect("route 2");
        let _ = connect(&mut graph, 6, 2);

        let junction = graph.routes_for(station(2));
        assert_eq!(junction, vec![RouteId::new(1), RouteId::new(2)]);

        let outcome = graph.connect(station(2), station(7), Some(RouteId::new(2)), |_| true);
        assert_eq!(
            outcome,
            Ok(ConnectOutcome::Extended {
                route: RouteId::new(2),
                station: station(7),
                prepended: false,
            })
        );
    }
}
