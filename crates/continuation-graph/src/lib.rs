//! Converts block-implied vehicle continuations into explicit
//! trip-to-trip transfer records.

pub mod blocks;
pub mod classify;
pub mod config;
pub mod continuation_type;
pub mod dayset;
pub mod error;
pub mod export;
pub mod graph;
pub mod infer;
pub mod linear;
pub mod model;
pub mod service_days;
pub mod shape_similarity;
pub mod warnings;

use std::collections::{HashMap, HashSet};

use gtfs::data_model::trips::TripId;
use gtfs::Feed;

use config::Config;
use continuation_type::ContinuationType;
use dayset::DaySet;
use graph::{Edge, Graph, NodeId};
use model::TripView;
use service_days::ServiceDayIndex;
use shape_similarity::SimilarityCache;
use warnings::Warnings;

/// Runs the full pipeline described by §4 end to end: service-day index,
/// block grouping, inference, classification, graph repair, an optional
/// linear simplification pass, and export — mutating `feed` in place.
/// Returns the service-day index (useful for diagnostics) and the warning
/// sink accumulated over the run.
///
/// `itinerary_layout` selects the exporter's stop-time materialisation
/// strategy: when set, a split trip's stop_times are only cloned once the
/// pickup/drop-off rule actually needs to change them, instead of always
/// up front.
pub fn convert(
    feed: &mut Feed,
    config: &Config,
    linear_mode: bool,
    itinerary_layout: bool,
) -> (ServiceDayIndex, Warnings) {
    let mut warnings = Warnings::new();
    let mut index = service_days::build_service_day_index(feed, &mut warnings);

    let views = model::build_trip_views(feed);
    let trip_by_id: HashMap<TripId, TripView> =
        views.iter().cloned().map(|v| (v.id.clone(), v)).collect();
    let blocks = blocks::group_blocks(views, &mut warnings);

    let pre_declared: HashSet<TripId> = feed
        .transfers
        .iter()
        .filter(|row| ContinuationType::try_from(row.kind).is_ok())
        .filter_map(|row| row.from_trip_id.clone())
        .collect();

    let trip_days = |id: &TripId| -> DaySet {
        trip_by_id
            .get(id)
            .and_then(|view| index.get(&view.service_id))
            .cloned()
            .unwrap_or_else(|| DaySet::empty(index.capacity))
    };

    let similarity = SimilarityCache::new();
    let mut graph = Graph::new();

    for block in &blocks {
        let candidates = infer::infer_block_candidates(
            block,
            &index,
            &config.trip_to_trip_transfers,
            &|id| pre_declared.contains(id),
            &mut warnings,
        );
        let classified: Vec<_> = candidates
            .into_iter()
            .map(|candidate| {
                let from = &trip_by_id[&candidate.from_trip];
                let to = &trip_by_id[&candidate.to_trip];
                let kind = classify::classify(&candidate, from, to, config, &similarity);
                (candidate, kind)
            })
            .collect();
        graph.insert_candidates(&classified, &trip_days);
    }

    graph.import_pre_declared(&feed.transfers, &trip_days, &mut warnings);
    graph.prune_impossible(&mut warnings);
    graph.validate_disjoint_cases(&mut warnings);

    if linear_mode {
        linear::break_cycles(&mut graph, &mut warnings);
        graph = materialize_linear(&graph, &linear::enumerate_linear_paths(&graph));
    }

    export::export(&graph, feed, &mut index, itinerary_layout);

    (index, warnings)
}

/// Rebuilds a graph from enumerated linear paths: every non-composite node
/// is cloned fresh per path position; composite nodes are inserted once and
/// shared across every path that passes through them, per §4.6.
fn materialize_linear(graph: &Graph, paths: &[linear::LinearPath]) -> Graph {
    let mut out = Graph::new();
    let mut composite_map: HashMap<NodeId, NodeId> = HashMap::new();

    for path in paths {
        let mut prev: Option<NodeId> = None;
        for (i, &orig) in path.iter().enumerate() {
            let node = &graph.nodes[orig];
            let new_id = if node.composite_split || node.composite_join {
                *composite_map
                    .entry(orig)
                    .or_insert_with(|| push_node(&mut out, node.clone()))
            } else {
                push_node(&mut out, node.clone())
            };

            if let Some(prev_id) = prev {
                let prev_orig = path[i - 1];
                if let Some(edge) = graph
                    .edges
                    .iter()
                    .find(|e| e.from == prev_orig && e.to == orig)
                {
                    out.edges.push(Edge {
                        from: prev_id,
                        to: new_id,
                        ..edge.clone()
                    });
                }
            }
            prev = Some(new_id);
        }
    }
    out
}

fn push_node(graph: &mut Graph, node: graph::Node) -> NodeId {
    graph.nodes.push(node);
    graph.nodes.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gtfs::data_model::calendar::{CalendarRow, ServiceAvailability};
    use gtfs::data_model::routes::Route;
    use gtfs::data_model::stop_times::StopTime;
    use gtfs::data_model::stops::Stop;
    use gtfs::data_model::trips::Trip;
    use gtfs::database::PrimaryKeyTable;
    use utility::id::Id;

    fn stop(id: &str, lat: f64, lon: f64) -> Stop {
        Stop {
            id: Id::new(id.to_owned()),
            code: None,
            name: None,
            tts_name: None,
            description: None,
            latitude: Some(lat),
            longitude: Some(lon),
            zone_id: None,
            url: None,
            location_type: None,
            parent_station: None,
            timezone: None,
            wheelchair_boarding: Default::default(),
            level_id: None,
            platform_code: None,
        }
    }

    fn stop_time(trip_id: &str, seq: u32, stop_id: &str, seconds: i64) -> StopTime {
        StopTime {
            trip_id: Id::new(trip_id.to_owned()),
            arrival_time: Some(chrono::Duration::seconds(seconds)),
            departure_time: Some(chrono::Duration::seconds(seconds)),
            stop_id: Some(Id::new(stop_id.to_owned())),
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

    fn trip(id: &str, block: &str) -> Trip {
        Trip {
            id: Id::new(id.to_owned()),
            route_id: Id::new("R".to_owned()),
            service_id: "WD".to_owned(),
            headsign: None,
            short_name: None,
            direction: None,
            block_id: Some(block.to_owned()),
            shape_id: None,
            wheelchair_accessible: Default::default(),
            bikes_allowed: Default::default(),
        }
    }

    #[test]
    fn end_to_end_in_seat_continuation_splits_no_trips_when_days_match() {
        let mut stops = gtfs::database::InMemoryPrimaryKeyTable::new();
        stops.insert(stop("X", 0.0, 0.0));
        stops.insert(stop("Y", 0.0, 0.0001));
        let mut routes = gtfs::database::InMemoryPrimaryKeyTable::new();
        routes.insert(Route {
            id: Id::new("R".to_owned()),
            agency_id: None,
            short_name: None,
            long_name: None,
            description: None,
            kind: gtfs::data_model::routes::RouteType::Bus,
            url: None,
            color: None,
            text_color: None,
            sort_order: None,
            continuous_pickup: Default::default(),
            continuous_drop_off: Default::default(),
            network_id: None,
        });
        let mut trips = gtfs::database::InMemoryPrimaryKeyTable::new();
        trips.insert(trip("A", "B1"));
        trips.insert(trip("C", "B1"));

        let mut feed = Feed {
            agencies: vec![],
            stops,
            routes,
            trips,
            stop_times: vec![
                stop_time("A", 0, "X", 8 * 3600),
                stop_time("A", 1, "Y", 9 * 3600),
                stop_time("C", 0, "Y", 9 * 3600 + 300),
                stop_time("C", 1, "X", 10 * 3600),
            ],
            calendar: vec![CalendarRow {
                service_id: Id::new("WD".to_owned()),
                monday: ServiceAvailability::Available,
                tuesday: ServiceAvailability::Available,
                wednesday: ServiceAvailability::Available,
                thursday: ServiceAvailability::Available,
                friday: ServiceAvailability::Available,
                saturday: ServiceAvailability::Unavailable,
                sunday: ServiceAvailability::Unavailable,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            }],
            calendar_dates: vec![],
            transfers: vec![],
            shapes: vec![],
        };

        let config = Config::with_defaults();
        let (_, warnings) = convert(&mut feed, &config, false, false);
        assert!(!warnings.any_fired());

        let trips = feed.trips.get_all();
        assert_eq!(trips.len(), 2);
        assert!(feed
            .transfers
            .iter()
            .any(|t| t.from_trip_id.as_ref().unwrap().to_string() == "A"
                && t.to_trip_id.as_ref().unwrap().to_string() == "C"));
    }
}
