#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game-over evaluator that ends the session once a station stays overloaded too long.

use std::time::Duration;

use transit_rush_core::{Command, Event, StationSnapshot};

/// Pure system comparing station overload timers against the grace period.
#[derive(Clone, Copy, Debug)]
pub struct GameOverEvaluator {
    grace: Duration,
}

impl GameOverEvaluator {
    /// Creates a new evaluator that tolerates `grace` of continuous overload.
    #[must_use]
    pub const fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Consumes the tick's events and station views to emit the terminal command.
    ///
    /// Runs only on ticks that advanced the clock. The longest-overloaded
    /// station is reported; ties resolve to the lowest identifier.
    pub fn handle(&self, events: &[Event], stations: &[StationSnapshot], out: &mut Vec<Command>) {
        let advanced = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        let already_over = events
            .iter()
            .any(|event| matches!(event, Event::GameOver { .. }));
        if !advanced || already_over {
            return;
        }

        let mut worst: Option<&StationSnapshot> = None;
        let overdue = stations
            .iter()
            .filter(|station| !station.overload.is_zero() && station.overload >= self.grace);
        for station in overdue {
            if worst.map_or(true, |current| station.overload > current.overload) {
                worst = Some(station);
            }
        }

        if let Some(station) = worst {
            out.push(Command::EndGame {
                station: station.id,
                reason: format!("Station {} overloaded", station.id.get()),
            });
        }
    }
}
