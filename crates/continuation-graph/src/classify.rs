//! Assigns each continuation candidate either the in-seat or
//! vehicle-continuation type based on geometry, wait time and
//! configuration (§4.4).

use crate::config::{Config, HandoffContext};
use crate::continuation_type::ContinuationType;
use crate::infer::Candidate;
use crate::model::TripView;
use crate::shape_similarity::SimilarityCache;

fn distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    utility::geo::haversine_distance(a.0, a.1, b.0, b.1) * 1000.0
}

fn is_loop(from: &TripView, to: &TripView, threshold: f64) -> bool {
    match (from.first_point, to.first_point, from.last_point, to.last_point) {
        (Some(f1), Some(f2), Some(l1), Some(l2)) => {
            distance_m(f1, f2) <= threshold && distance_m(l1, l2) <= threshold
        }
        _ => false,
    }
}

/// Classifies one candidate into an in-seat or vehicle-continuation type.
/// `from`/`to` must be the trips named by `candidate.from_trip`/`to_trip`.
pub fn classify(
    candidate: &Candidate,
    from: &TripView,
    to: &TripView,
    config: &Config,
    similarity: &SimilarityCache,
) -> ContinuationType {
    let in_seat = &config.in_seat_transfers;

    let wait = to.shift_days * 86_400 + to.first_departure + candidate.shift * 86_400
        - (from.shift_days * 86_400 + from.last_arrival);
    if wait > in_seat.max_wait_time as i64 {
        return ContinuationType::VehicleContinuation;
    }

    if let (Some(from_stop), Some(to_stop)) = (from.last_stop_id(), to.first_stop_id()) {
        let ctx = HandoffContext {
            from_route: from.route_id.raw_ref(),
            from_stop: &from_stop,
            to_route: to.route_id.raw_ref(),
            to_stop: &to_stop,
        };
        if let Some(rule) = config
            .special_continuations
            .iter()
            .rev()
            .find(|rule| rule.match_selector.matches(&ctx))
        {
            return rule.transfer_type;
        }
    }

    if let (Some(from_point), Some(to_point)) = (from.last_point, to.first_point) {
        if distance_m(from_point, to_point) > in_seat.same_location_distance {
            return ContinuationType::VehicleContinuation;
        }
    }

    if is_loop(from, to, in_seat.same_location_distance) {
        return ContinuationType::InSeat;
    }

    if in_seat.ignore_return_via_same_route
        && from.route_id == to.route_id
        && from.direction.is_some()
        && to.direction.is_some()
        && from.direction != to.direction
    {
        return ContinuationType::VehicleContinuation;
    }

    if in_seat.ignore_return_via_similar_trip {
        let distance = similarity.get_or_compute(
            from.shape_id,
            &from.stop_shape,
            to.shape_id,
            &to.stop_shape,
            in_seat.similarity_percentile,
        );
        if distance < in_seat.similarity_distance {
            return ContinuationType::VehicleContinuation;
        }
    }

    ContinuationType::InSeat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use gtfs::data_model::stop_times::StopTime;
    use gtfs::data_model::trips::TravelDirection;
    use utility::id::Id;

    fn stop_time(seq: u32) -> StopTime {
        StopTime {
            trip_id: Id::new("T".to_owned()),
            arrival_time: None,
            departure_time: None,
            stop_id: Some(Id::new(String::new())),
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

    fn trip_view(
        id: &str,
        route: &str,
        direction: Option<TravelDirection>,
        first: (f64, f64),
        last: (f64, f64),
        shape_id: usize,
        first_departure: i64,
        last_arrival: i64,
    ) -> TripView {
        TripView {
            id: Id::new(id.to_owned()),
            service_id: "S".to_owned(),
            block_id: Some("B".to_owned()),
            route_id: Id::new(route.to_owned()),
            direction,
            stop_times: vec![stop_time(0), stop_time(1)],
            shift_days: 0,
            first_departure,
            last_arrival,
            first_point: Some(first),
            last_point: Some(last),
            stop_shape: vec![first, last],
            shape_id,
        }
    }

    fn candidate(from: &str, to: &str) -> Candidate {
        Candidate {
            from_trip: Id::new(from.to_owned()),
            to_trip: Id::new(to.to_owned()),
            shift: 0,
            rank: 1,
            days: crate::dayset::DaySet::empty(1),
        }
    }

    #[test]
    fn long_wait_forces_vehicle_continuation() {
        let config = Config::with_defaults();
        let similarity = SimilarityCache::new();
        let from = trip_view("A", "1", None, (0.0, 0.0), (1.0, 1.0), 0, 0, 3600);
        let to = trip_view("B", "1", None, (5.0, 5.0), (6.0, 6.0), 1, 3600 + 7200, 7200 * 2);
        let result = classify(&candidate("A", "B"), &from, &to, &config, &similarity);
        assert_eq!(result, ContinuationType::VehicleContinuation);
    }

    #[test]
    fn deadheading_past_same_location_distance_is_vehicle_continuation() {
        let config = Config::with_defaults();
        let similarity = SimilarityCache::new();
        let from = trip_view("A", "1", None, (0.0, 0.0), (0.0, 0.0), 0, 0, 3600);
        let to = trip_view("B", "1", None, (10.0, 10.0), (11.0, 11.0), 1, 3600, 7200);
        let result = classify(&candidate("A", "B"), &from, &to, &config, &similarity);
        assert_eq!(result, ContinuationType::VehicleContinuation);
    }

    #[test]
    fn nearby_handoff_on_different_route_is_in_seat_by_default() {
        let config = Config::with_defaults();
        let similarity = SimilarityCache::new();
        let from = trip_view("A", "1", None, (0.0, 0.0), (0.0001, 0.0001), 0, 0, 3600);
        let to = trip_view("B", "2", None, (0.0001, 0.0001), (1.0, 1.0), 1, 3700, 7200);
        let result = classify(&candidate("A", "B"), &from, &to, &config, &similarity);
        assert_eq!(result, ContinuationType::InSeat);
    }

    #[test]
    fn reverse_direction_on_same_route_is_vehicle_continuation() {
        let config = Config::with_defaults();
        let similarity = SimilarityCache::new();
        let from = trip_view(
            "A",
            "1",
            Some(TravelDirection::TravelInOneDirection),
            (0.0, 0.0),
            (0.0001, 0.0001),
            0,
            0,
            3600,
        );
        let to = trip_view(
            "B",
            "1",
            Some(TravelDirection::TravelInOppositeDirection),
            (0.0001, 0.0001),
            (1.0, 1.0),
            1,
            3700,
            7200,
        );
        let result = classify(&candidate("A", "B"), &from, &to, &config, &similarity);
        assert_eq!(result, ContinuationType::VehicleContinuation);
    }

    #[test]
    fn special_rule_overrides_default() {
        let json = r#"{"SpecialContinuations": [
            {"match": {"through": {"stop": ""}}, "transfer_type": "vehicle-continuation"}
        ]}"#;
        let config = Config::from_json_overrides(json).unwrap();
        let similarity = SimilarityCache::new();
        let from = trip_view("A", "1", None, (0.0, 0.0), (0.0001, 0.0001), 0, 0, 3600);
        let to = trip_view("B", "2", None, (0.0001, 0.0001), (1.0, 1.0), 1, 3700, 7200);
        let result = classify(&candidate("A", "B"), &from, &to, &config, &similarity);
        assert_eq!(result, ContinuationType::VehicleContinuation);
    }
}
