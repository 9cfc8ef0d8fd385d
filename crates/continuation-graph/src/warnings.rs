//! Recoverable conditions are routed through one sink instead of being
//! raised as errors mid-pipeline, so a single pass can both log every
//! warning and let the driver decide the process exit code at the end.

use std::fmt;

#[derive(Debug, Clone)]
pub enum Warning {
    CalendarExceptionRedundant {
        service_id: String,
        date: chrono::NaiveDate,
        adding: bool,
    },
    TripDropped {
        trip_id: String,
        reason: &'static str,
    },
    InvalidBlock {
        block_id: String,
        from_trip: String,
        to_trip: String,
        wait_seconds: i64,
    },
    DeadheadingTooFast {
        from_trip: String,
        to_trip: String,
        distance_m: f64,
        speed_kmh: f64,
    },
    PreDeclaredEmptyDaySet {
        from_trip: String,
        to_trip: String,
    },
    DisjointCasesViolation {
        trip_id: String,
        neighbour_a: String,
        neighbour_b: String,
    },
    SelfTransfer {
        trip_id: String,
    },
    CycleBroken {
        from_trip: String,
        to_trip: String,
    },
    CompositeSplitRefused {
        trip_id: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CalendarExceptionRedundant {
                service_id,
                date,
                adding,
            } => {
                let verb = if *adding { "adds" } else { "removes" };
                write!(
                    f,
                    "calendar exception for service {service_id} {verb} {date} \
                     which was already in that state"
                )
            }
            Self::TripDropped { trip_id, reason } => {
                write!(f, "dropped trip {trip_id}: {reason}")
            }
            Self::InvalidBlock {
                block_id,
                from_trip,
                to_trip,
                wait_seconds,
            } => write!(
                f,
                "block {block_id} is physically impossible: {from_trip} -> {to_trip} \
                 implies a wait of {wait_seconds}s"
            ),
            Self::DeadheadingTooFast {
                from_trip,
                to_trip,
                distance_m,
                speed_kmh,
            } => write!(
                f,
                "candidate {from_trip} -> {to_trip} dropped: deadheading \
                 {distance_m:.0}m would require {speed_kmh:.1}km/h"
            ),
            Self::PreDeclaredEmptyDaySet { from_trip, to_trip } => write!(
                f,
                "pre-declared continuation {from_trip} -> {to_trip} has an empty day-set"
            ),
            Self::DisjointCasesViolation {
                trip_id,
                neighbour_a,
                neighbour_b,
            } => write!(
                f,
                "trip {trip_id}: continuations to {neighbour_a} and {neighbour_b} \
                 partially overlap in applicable days"
            ),
            Self::SelfTransfer { trip_id } => {
                write!(f, "discarded self-transfer on trip {trip_id}")
            }
            Self::CycleBroken { from_trip, to_trip } => {
                write!(f, "broke cycle at edge {from_trip} -> {to_trip}")
            }
            Self::CompositeSplitRefused { trip_id } => write!(
                f,
                "composite node for trip {trip_id} cannot be split for linear output"
            ),
        }
    }
}

/// Accumulates warnings over the course of a conversion run and logs each
/// one as it is recorded.
#[derive(Debug, Default)]
pub struct Warnings {
    fired: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.fired.push(warning);
    }

    pub fn any_fired(&self) -> bool {
        !self.fired.is_empty()
    }

    pub fn all(&self) -> &[Warning] {
        &self.fired
    }
}
