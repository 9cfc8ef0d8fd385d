//! For each block, emits a set of candidate continuation edges with
//! per-day applicability (§4.3).

use crate::blocks::Block;
use crate::config::TripToTripTransfers;
use crate::dayset::DaySet;
use crate::model::TripView;
use crate::service_days::ServiceDayIndex;
use crate::warnings::{Warning, Warnings};

#[derive(Debug, Clone)]
pub struct Candidate {
    pub from_trip: gtfs::data_model::trips::TripId,
    pub to_trip: gtfs::data_model::trips::TripId,
    /// Shift from the frame of `from_trip` into the frame of `to_trip`: 0 for
    /// a same-day continuation, 1 for one that crosses midnight.
    pub shift: i64,
    pub rank: u32,
    /// Applicable days, expressed in `from_trip`'s frame.
    pub days: DaySet,
}

fn trip_days(index: &ServiceDayIndex, trip: &TripView) -> DaySet {
    index
        .get(&trip.service_id)
        .cloned()
        .unwrap_or_else(|| DaySet::empty(index.capacity))
}

fn average_speed_kmh(distance_m: f64, wait_seconds: i64) -> f64 {
    let hours = (wait_seconds.max(1) as f64) / 3600.0;
    (distance_m / 1000.0) / hours
}

/// Whether a trip already carries a pre-declared continuation edge, so the
/// inferrer can skip it per the "skip per-trip" decision (§4.3/§9).
pub trait HasPreDeclaredContinuation {
    fn has_pre_declared_continuation(&self, trip_id: &gtfs::data_model::trips::TripId) -> bool;
}

#[allow(clippy::too_many_arguments)]
fn scan_direction(
    from: &TripView,
    candidates: &mut Vec<Candidate>,
    days_to_match: &mut DaySet,
    rank: &mut u32,
    partners: impl Iterator<Item = (usize, i64)>,
    block: &Block,
    config: &TripToTripTransfers,
    index: &ServiceDayIndex,
    warnings: &mut Warnings,
) {
    for (partner_idx, shift) in partners {
        if days_to_match.is_empty() {
            return;
        }
        let to = &block.trips[partner_idx];
        let to_departure_abs = to.shift_days * 86_400 + to.first_departure + shift * 86_400;
        let from_arrival_abs = from.shift_days * 86_400 + from.last_arrival;
        let wait = to_departure_abs - from_arrival_abs;

        if wait > config.max_wait_time as i64 {
            return;
        }

        let to_days = trip_days(index, to).shifted(-shift as isize);
        let matched = to_days.intersection(days_to_match);
        if matched.is_empty() {
            continue;
        }

        if wait < 0 {
            if !config.force_allow_invalid_blocks {
                warnings.push(Warning::InvalidBlock {
                    block_id: block.id.clone(),
                    from_trip: from.id.to_string(),
                    to_trip: to.id.to_string(),
                    wait_seconds: wait,
                });
            }
            continue;
        }

        if let (Some(from_point), Some(to_point)) = (from.last_point, to.first_point) {
            let distance_m =
                utility::geo::haversine_distance(from_point.0, from_point.1, to_point.0, to_point.1)
                    * 1000.0;
            if distance_m > config.max_nearby_deadheading_distance {
                let speed = average_speed_kmh(distance_m, wait);
                if speed > config.max_deadheading_speed {
                    warnings.push(Warning::DeadheadingTooFast {
                        from_trip: from.id.to_string(),
                        to_trip: to.id.to_string(),
                        distance_m,
                        speed_kmh: speed,
                    });
                    continue;
                }
            }
        }

        *rank += 1;
        candidates.push(Candidate {
            from_trip: from.id.clone(),
            to_trip: to.id.clone(),
            shift,
            rank: *rank,
            days: matched.clone(),
        });
        *days_to_match = days_to_match.difference(&matched);
    }
}

/// Infers continuation candidates for every trip of `block`. `skip` reports
/// whether a trip already has a pre-declared continuation edge and should
/// not be scanned (its own pre-declared edges are authoritative); the other
/// trips of the block are still scanned normally.
pub fn infer_block_candidates(
    block: &Block,
    index: &ServiceDayIndex,
    config: &TripToTripTransfers,
    skip: &impl Fn(&gtfs::data_model::trips::TripId) -> bool,
    warnings: &mut Warnings,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let trips = &block.trips;

    for i in 0..trips.len() {
        let from = &trips[i];
        if !config.overwrite_existing && skip(&from.id) {
            continue;
        }
        let mut days_to_match = trip_days(index, from);
        let mut rank = 0;

        scan_direction(
            from,
            &mut candidates,
            &mut days_to_match,
            &mut rank,
            ((i + 1)..trips.len()).map(|j| (j, 0)),
            block,
            config,
            index,
            warnings,
        );
        scan_direction(
            from,
            &mut candidates,
            &mut days_to_match,
            &mut rank,
            (0..i).map(|j| (j, 1)),
            block,
            config,
            index,
            warnings,
        );
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_trip_views;
    use crate::service_days::build_service_day_index;
    use chrono::Duration;
    use gtfs::data_model::stop_times::StopTime;
    use gtfs::data_model::trips::Trip;
    use gtfs::database::PrimaryKeyTable;
    use gtfs::Feed;
    use utility::id::Id;

    fn stop_time(trip: &str, seq: u32, time_seconds: i64) -> StopTime {
        StopTime {
            trip_id: Id::new(trip.to_owned()),
            arrival_time: Some(Duration::seconds(time_seconds)),
            departure_time: Some(Duration::seconds(time_seconds)),
            stop_id: None,
            location_group_id: None,
            location_id: None,
            stop_sequence: seq,
            stop_headsign: None,
            start_pickup_drop_off_window: None,
            end_pickup_drop_off_window: None,
            pickup_type: Default::default(),
            drop_off_type: Default::default(),
            continuous_pickup: None,
            continuous_drop_off: None,
            shape_distance_traveled: None,
            pickup_booking_rule_id: None,
            drop_off_booking_rule_id: None,
        }
    }

    fn trip(id: &str, service: &str, block: &str) -> Trip {
        Trip {
            id: Id::new(id.to_owned()),
            route_id: Id::new("R".to_owned()),
            service_id: service.to_owned(),
            headsign: None,
            short_name: None,
            direction: None,
            block_id: Some(block.to_owned()),
            shape_id: None,
            wheelchair_accessible: Default::default(),
            bikes_allowed: Default::default(),
        }
    }

    fn empty_feed() -> Feed {
        Feed {
            agencies: vec![],
            stops: Default::default(),
            routes: Default::default(),
            trips: Default::default(),
            stop_times: vec![],
            calendar: vec![],
            calendar_dates: vec![],
            transfers: vec![],
            shapes: vec![],
        }
    }

    #[test]
    fn single_block_two_trips_same_days() {
        let mut trips = gtfs::database::InMemoryPrimaryKeyTable::new();
        trips.insert(trip("A", "WD", "B"));
        trips.insert(trip("C", "WD", "B"));

        let feed = Feed {
            trips,
            stop_times: vec![
                stop_time("A", 1, 8 * 3600),
                stop_time("A", 2, 9 * 3600),
                stop_time("C", 1, 9 * 3600 + 600),
                stop_time("C", 2, 10 * 3600),
            ],
            ..empty_feed()
        };
        let views = build_trip_views(&feed);
        let mut warnings = Warnings::new();
        let blocks = crate::blocks::group_blocks(views, &mut warnings);
        assert_eq!(blocks.len(), 1);

        let mut index = build_service_day_index(&empty_feed(), &mut warnings);
        index.insert_synthetic("WD".to_owned(), {
            let mut d = DaySet::empty(10);
            d.set(0);
            d
        });

        let config = TripToTripTransfers::default();
        let candidates = infer_block_candidates(&blocks[0], &index, &config, &|_| false, &mut warnings);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].from_trip.to_string(), "A");
        assert_eq!(candidates[0].to_trip.to_string(), "C");
    }
}
