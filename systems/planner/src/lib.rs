#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure planning system that turns drag gestures into route connection commands.

use transit_rush_core::{
    Command, GeoPoint, RouteId, RouteSnapshot, SnapPolicy, StationId, StationSnapshot,
};

/// Drag gesture already translated into geographic coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteGesture {
    /// Point where the drag started.
    pub start: GeoPoint,
    /// Point where the drag was released.
    pub end: GeoPoint,
}

impl RouteGesture {
    /// Creates a new gesture descriptor.
    #[must_use]
    pub const fn new(start: GeoPoint, end: GeoPoint) -> Self {
        Self { start, end }
    }
}

/// Planner that snaps gestures onto stations and picks the route to extend.
#[derive(Clone, Copy, Debug)]
pub struct RoutePlanner {
    snap_radius_km: f64,
    policy: SnapPolicy,
}

impl RoutePlanner {
    /// Creates a new planner using the provided snap radius and junction policy.
    #[must_use]
    pub const fn new(snap_radius_km: f64, policy: SnapPolicy) -> Self {
        Self {
            snap_radius_km,
            policy,
        }
    }

    /// Closest station within the snap radius; ties favour the lowest identifier.
    #[must_use]
    pub fn snap(&self, point: GeoPoint, stations: &[StationSnapshot]) -> Option<StationId> {
        let mut best: Option<(StationId, f64)> = None;
        for station in stations {
            let distance = point.distance_km(station.position);
            if distance > self.snap_radius_km {
                continue;
            }
            if best.map_or(true, |(_, closest)| distance < closest) {
                best = Some((station.id, distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Translates `gesture` into a connection command.
    ///
    /// Gestures that miss a station at either end, or start and end on the
    /// same station, emit nothing.
    pub fn handle(
        &self,
        gesture: RouteGesture,
        stations: &[StationSnapshot],
        routes: &[RouteSnapshot],
        out: &mut Vec<Command>,
    ) {
        let (Some(from), Some(to)) = (
            self.snap(gesture.start, stations),
            self.snap(gesture.end, stations),
        ) else {
            tracing::debug!(?gesture, "gesture did not snap onto two stations");
            return;
        };
        if from == to {
            return;
        }

        out.push(Command::ConnectStations {
            from,
            to,
            extend: self.extension_hint(from, to, routes),
        });
    }

    fn extension_hint(
        &self,
        from: StationId,
        to: StationId,
        routes: &[RouteSnapshot],
    ) -> Option<RouteId> {
        let candidates = routes.iter().filter(|route| can_extend(route, from, to));

        match self.policy {
            SnapPolicy::OldestRoute => candidates.min_by_key(|route| route.id),
            SnapPolicy::NewestRoute => candidates.max_by_key(|route| route.id),
            SnapPolicy::LongestRoute => {
                candidates.fold(None, |best: Option<&RouteSnapshot>, route| match best {
                    Some(current) if current.stations.len() >= route.stations.len() => {
                        Some(current)
                    }
                    _ => Some(route),
                })
            }
        }
        .map(|route| route.id)
    }
}

/// Whether `route` can grow from its open endpoint `from` towards `to`.
fn can_extend(route: &RouteSnapshot, from: StationId, to: StationId) -> bool {
    let Some((first, last)) = route.open_endpoints() else {
        return false;
    };
    let opposite = if from == first {
        last
    } else if from == last {
        first
    } else {
        return false;
    };
    if to == opposite {
        return route.stations.len() >= 3;
    }
    !route.stations.contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_rush_core::RouteColor;

    fn route(id: u32, stations: &[u32]) -> RouteSnapshot {
        RouteSnapshot {
            id: RouteId::new(id),
            stations: stations.iter().copied().map(StationId::new).collect(),
            circular: false,
            color: RouteColor::from_rgb(0, 0, 0),
        }
    }

    #[test]
    fn extension_requires_open_endpoint() {
        let line = route(1, &[1, 2, 3]);
        assert!(can_extend(&line, StationId::new(3), StationId::new(4)));
        assert!(can_extend(&line, StationId::new(1), StationId::new(3)));
        assert!(!can_extend(&line, StationId::new(2), StationId::new(4)));
        assert!(!can_extend(&line, StationId::new(3), StationId::new(2)));

        let short = route(2, &[1, 2]);
        assert!(!can_extend(&short, StationId::new(1), StationId::new(2)));
    }
}
