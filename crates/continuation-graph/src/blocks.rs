//! Partitions trips by block identifier, sorted by first-departure, dropping
//! trips with fewer than two stop-times (§4.2).

use std::collections::HashMap;

use crate::model::TripView;
use crate::warnings::{Warning, Warnings};

/// One physical vehicle's trips, in schedule order.
pub struct Block {
    pub id: String,
    pub trips: Vec<TripView>,
}

/// Groups `trips` by block identifier. Trips without a block identifier, or
/// with fewer than two stop-times, never form (or join) a block.
pub fn group_blocks(trips: Vec<TripView>, warnings: &mut Warnings) -> Vec<Block> {
    let mut by_block: HashMap<String, Vec<TripView>> = HashMap::new();

    for trip in trips {
        if trip.stop_times.len() < 2 {
            warnings.push(Warning::TripDropped {
                trip_id: trip.id.to_string(),
                reason: "fewer than two stop-times",
            });
            continue;
        }
        let Some(block_id) = trip.block_id.clone() else {
            continue;
        };
        by_block.entry(block_id).or_default().push(trip);
    }

    let mut blocks: Vec<Block> = by_block
        .into_iter()
        .map(|(id, mut trips)| {
            trips.sort_by_key(|t| t.shift_days * 86_400 + t.first_departure);
            Block { id, trips }
        })
        .collect();
    blocks.sort_by(|a, b| a.id.cmp(&b.id));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use utility::id::Id;

    fn trip(id: &str, block: Option<&str>, departure: i64, stop_count: usize) -> TripView {
        TripView {
            id: Id::new(id.to_owned()),
            service_id: "S".to_owned(),
            block_id: block.map(|b| b.to_owned()),
            route_id: Id::new("R".to_owned()),
            direction: None,
            stop_times: vec![
                gtfs::data_model::stop_times::StopTime {
                    trip_id: Id::new(id.to_owned()),
                    arrival_time: None,
                    departure_time: None,
                    stop_id: None,
                    location_group_id: None,
                    location_id: None,
                    stop_sequence: 0,
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
                };
                stop_count
            ],
            shift_days: 0,
            first_departure: departure,
            last_arrival: departure + 600,
            first_point: None,
            last_point: None,
            stop_shape: vec![],
            shape_id: 0,
        }
    }

    #[test]
    fn blockless_trips_are_dropped_from_output() {
        let trips = vec![trip("A", None, 0, 2)];
        let mut warnings = Warnings::new();
        let blocks = group_blocks(trips, &mut warnings);
        assert!(blocks.is_empty());
        assert!(!warnings.any_fired());
    }

    #[test]
    fn short_trips_are_dropped_with_warning() {
        let trips = vec![trip("A", Some("B"), 0, 1)];
        let mut warnings = Warnings::new();
        let blocks = group_blocks(trips, &mut warnings);
        assert!(blocks.is_empty());
        assert!(warnings.any_fired());
    }

    #[test]
    fn trips_within_a_block_are_sorted_by_departure() {
        let trips = vec![
            trip("late", Some("B"), 600, 2),
            trip("early", Some("B"), 0, 2),
        ];
        let mut warnings = Warnings::new();
        let blocks = group_blocks(trips, &mut warnings);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].trips[0].id.to_string(), "early");
        assert_eq!(blocks[0].trips[1].id.to_string(), "late");
    }
}
