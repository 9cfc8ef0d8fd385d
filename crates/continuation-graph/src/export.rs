//! Walks the repaired graph and writes split trips, continuation transfers
//! and the pickup/drop-off rule back into the feed (§4.7).

use std::collections::{HashMap, HashSet};

use gtfs::data_model::calendar_dates::{CalendarDate, ExceptionType};
use gtfs::data_model::stop_times::{DropOffMethod, PickupMethod, StopTime};
use gtfs::data_model::transfers::{TransferType, TransfersRow};
use gtfs::data_model::trips::{Trip, TripId};
use gtfs::database::PrimaryKeyTable;
use gtfs::Feed;
use utility::id::Id;

use crate::continuation_type::ContinuationType;
use crate::dayset::DaySet;
use crate::graph::{Graph, NodeId};
use crate::service_days::ServiceDayIndex;

fn split_trip_id(original: &TripId, service_id: &str) -> TripId {
    Id::new(format!("{original}@{service_id}"))
}

/// For a node with incoming continuation edges, the union of their
/// match-days, shifted into the node's own frame. Undefined (callers must
/// guard) when the node has no incoming edges — a genuine source.
fn incoming_union(graph: &Graph, node: NodeId) -> DaySet {
    let mut union = DaySet::empty(graph.nodes[node].days.capacity());
    for idx in graph.in_edge_indices(node) {
        let edge = &graph.edges[idx];
        union.union_with(&edge.days.shifted(edge.shift as isize));
    }
    union
}

struct SourceFeed {
    trips: Vec<Trip>,
    stop_times_by_trip: HashMap<TripId, Vec<StopTime>>,
}

fn service_for(
    days: &DaySet,
    index: &mut ServiceDayIndex,
    synthetic_counter: &mut usize,
    new_calendar_dates: &mut Vec<CalendarDate>,
) -> String {
    match index.find_existing(days) {
        Some(id) => id.clone(),
        None => {
            let id = format!("synthetic:{synthetic_counter}");
            *synthetic_counter += 1;
            for day in days.iter_days() {
                new_calendar_dates.push(CalendarDate {
                    service_id: Id::new(id.clone()),
                    date: index.day_to_date(day),
                    exception_type: ExceptionType::ServiceAdded,
                });
            }
            index.insert_synthetic(id.clone(), days.clone());
            id
        }
    }
}

/// Clones `original_id`'s trip row under `new_id` with `service_id`, and
/// arranges for its stop_times to resolve to the original itinerary (lazily
/// under the itinerary layout, eagerly cloned otherwise).
#[allow(clippy::too_many_arguments)]
fn emit_trip(
    new_id: TripId,
    original_id: &TripId,
    service_id: String,
    source: &SourceFeed,
    new_trips: &mut Vec<Trip>,
    new_stop_times: &mut HashMap<TripId, Vec<StopTime>>,
    split_origin: &mut HashMap<TripId, TripId>,
    itinerary_layout: bool,
) {
    if let Some(mut trip) = source.trips.iter().find(|t| t.id == *original_id).cloned() {
        trip.id = new_id.clone();
        trip.service_id = service_id;
        new_trips.push(trip);
    }

    // The split trip follows the same itinerary (stop pattern) as the
    // original; under the itinerary layout, defer materialising its own
    // stop_times rows until assembly, unless something later needs to
    // mutate them (e.g. the pickup/drop-off rule).
    if new_id == *original_id {
        // Reusing the original id: its stop_times are already reachable
        // straight from the source feed, nothing to register.
    } else if itinerary_layout {
        split_origin.insert(new_id, original_id.clone());
    } else if let Some(stop_times) = source.stop_times_by_trip.get(original_id) {
        let cloned = stop_times
            .iter()
            .cloned()
            .map(|mut st| {
                st.trip_id = new_id.clone();
                st
            })
            .collect();
        new_stop_times.insert(new_id, cloned);
    }
}

/// Assigns the trip id a node's incoming continuation edges should target,
/// and returns it alongside any additional trip id this node's residual
/// (uncovered) days were emitted under, so both get carried to the final
/// feed. A node with no incoming edges, or whose incoming match-days cover
/// its full service, needs no residual and only the first id is produced.
#[allow(clippy::too_many_arguments)]
fn assign_trip_ids(
    node: NodeId,
    graph: &Graph,
    source: &SourceFeed,
    index: &mut ServiceDayIndex,
    synthetic_counter: &mut usize,
    new_trips: &mut Vec<Trip>,
    new_stop_times: &mut HashMap<TripId, Vec<StopTime>>,
    new_calendar_dates: &mut Vec<CalendarDate>,
    split_origin: &mut HashMap<TripId, TripId>,
    overridden_originals: &mut HashSet<TripId>,
    itinerary_layout: bool,
) -> (TripId, Option<TripId>) {
    let original_id = graph.nodes[node].trip_id.clone();
    let full_days = graph.nodes[node].days.clone();

    if graph.in_edge_indices(node).is_empty() {
        return (original_id, None);
    }

    let union = incoming_union(graph, node);

    if union == full_days {
        // The incoming edges already cover every day this trip runs; its
        // own identity unambiguously means "the continuation target", so
        // no new id (and no residual) is needed.
        return (original_id, None);
    }

    let covered_service = service_for(&union, index, synthetic_counter, new_calendar_dates);
    let covered_id = split_trip_id(&original_id, &covered_service);
    emit_trip(
        covered_id.clone(),
        &original_id,
        covered_service,
        source,
        new_trips,
        new_stop_times,
        split_origin,
        itinerary_layout,
    );

    // The incoming edges cover only part of this trip's service: the
    // residual days (no predecessor here) must still be exported, under
    // the original trip id, rather than silently dropped.
    let residual = full_days.difference(&union);
    let residual_service = service_for(&residual, index, synthetic_counter, new_calendar_dates);
    overridden_originals.insert(original_id.clone());
    emit_trip(
        original_id.clone(),
        &original_id,
        residual_service,
        source,
        new_trips,
        new_stop_times,
        split_origin,
        itinerary_layout,
    );

    (covered_id, Some(original_id))
}

/// Looks up the stop_times content a trip should start from: its own, if it
/// has any in the source feed, or its itinerary origin's under the
/// itinerary layout.
fn itinerary_source<'a>(
    id: &TripId,
    source: &'a SourceFeed,
    split_origin: &HashMap<TripId, TripId>,
) -> Option<&'a Vec<StopTime>> {
    source.stop_times_by_trip.get(id).or_else(|| {
        split_origin
            .get(id)
            .and_then(|origin| source.stop_times_by_trip.get(origin))
    })
}

/// Ensures boarding/alighting is not left marked unavailable at an in-seat
/// continuation point; never downgrades an existing non-default method.
fn apply_pickup_dropoff_rule(stop_times: &mut [StopTime], from_trip: &TripId, to_trip: &TripId) {
    if let Some(last) = stop_times.iter_mut().filter(|st| &st.trip_id == from_trip).last() {
        if last.pickup_type == PickupMethod::NotAvailable {
            last.pickup_type = PickupMethod::RegularlyScheduled;
        }
    }
    if let Some(first) = stop_times.iter_mut().find(|st| &st.trip_id == to_trip) {
        if first.drop_off_type == DropOffMethod::NotAvailable {
            first.drop_off_type = DropOffMethod::RegularlyScheduled;
        }
    }
}

/// Materialises the repaired graph back into `feed`: a split trip clone for
/// nodes whose reachable days differ from their original service days, a
/// further trip under the original id for any days left uncovered by an
/// incoming edge (rather than dropping them), one continuation transfer per
/// graph edge, and the pickup/drop-off rule at every in-seat continuation.
/// Unreferenced original trips are removed, and pre-existing
/// non-continuation transfers are carried through with their endpoints
/// remapped to any split variant.
///
/// When `itinerary_layout` is set, a split trip's stop_times are not cloned
/// up front — only once something actually needs to differ from the
/// original itinerary (the pickup/drop-off rule) is a copy made. This
/// mirrors the distilled feed's own "no need to clone the itinerary"
/// shortcut and avoids the intermediate allocation for every split that
/// never needs one.
pub fn export(graph: &Graph, feed: &mut Feed, index: &mut ServiceDayIndex, itinerary_layout: bool) {
    let source = SourceFeed {
        trips: feed.trips.get_all(),
        stop_times_by_trip: {
            let mut by_trip: HashMap<TripId, Vec<StopTime>> = HashMap::new();
            for st in &feed.stop_times {
                by_trip.entry(st.trip_id.clone()).or_default().push(st.clone());
            }
            by_trip
        },
    };

    let mut assigned: HashMap<NodeId, TripId> = HashMap::new();
    let mut extra_referenced: HashSet<TripId> = HashSet::new();
    let mut overridden_originals: HashSet<TripId> = HashSet::new();
    let mut synthetic_counter = 0usize;
    let mut new_trips = Vec::new();
    let mut new_stop_times: HashMap<TripId, Vec<StopTime>> = HashMap::new();
    let mut new_calendar_dates = Vec::new();
    let mut split_origin: HashMap<TripId, TripId> = HashMap::new();

    for node in 0..graph.nodes.len() {
        let (id, residual_id) = assign_trip_ids(
            node,
            graph,
            &source,
            index,
            &mut synthetic_counter,
            &mut new_trips,
            &mut new_stop_times,
            &mut new_calendar_dates,
            &mut split_origin,
            &mut overridden_originals,
            itinerary_layout,
        );
        assigned.insert(node, id);
        if let Some(residual_id) = residual_id {
            extra_referenced.insert(residual_id);
        }
    }

    let mut continuation_transfers = Vec::new();
    for edge in &graph.edges {
        let from = assigned[&edge.from].clone();
        let to = assigned[&edge.to].clone();

        if edge.kind == ContinuationType::InSeat {
            if let Some(sts) = new_stop_times.get_mut(&from) {
                apply_pickup_dropoff_rule(sts, &from, &to);
            } else if let Some(orig) = itinerary_source(&from, &source, &split_origin) {
                let mut sts = orig.iter().cloned().map(|mut st| { st.trip_id = from.clone(); st }).collect::<Vec<_>>();
                apply_pickup_dropoff_rule(&mut sts, &from, &to);
                new_stop_times.insert(from.clone(), sts);
            }
            if let Some(sts) = new_stop_times.get_mut(&to) {
                apply_pickup_dropoff_rule(sts, &from, &to);
            } else if from != to {
                if let Some(orig) = itinerary_source(&to, &source, &split_origin) {
                    let mut sts = orig.iter().cloned().map(|mut st| { st.trip_id = to.clone(); st }).collect::<Vec<_>>();
                    apply_pickup_dropoff_rule(&mut sts, &from, &to);
                    new_stop_times.insert(to.clone(), sts);
                }
            }
        }

        continuation_transfers.push(TransfersRow {
            from_stop_id: None,
            to_stop_id: None,
            from_route_id: None,
            to_route_id: None,
            from_trip_id: Some(from),
            to_trip_id: Some(to),
            kind: TransferType::from(edge.kind),
            minimum_transfer_time: None,
        });
    }

    let node_of: HashMap<TripId, NodeId> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, n)| (n.trip_id.clone(), idx))
        .collect();
    let remap = |id: &Option<TripId>| -> Option<TripId> {
        id.as_ref().map(|original| {
            node_of
                .get(original)
                .and_then(|node| assigned.get(node).cloned())
                .unwrap_or_else(|| original.clone())
        })
    };

    let mut carried_transfers: Vec<TransfersRow> = feed
        .transfers
        .iter()
        .filter(|row| ContinuationType::try_from(row.kind).is_err())
        .map(|row| TransfersRow {
            from_trip_id: remap(&row.from_trip_id),
            to_trip_id: remap(&row.to_trip_id),
            ..row.clone()
        })
        .collect();
    carried_transfers.extend(continuation_transfers);
    feed.transfers = carried_transfers;

    let referenced: HashSet<TripId> = assigned.values().cloned().chain(extra_referenced).collect();

    let mut stop_times = Vec::new();
    for id in &referenced {
        if let Some(sts) = new_stop_times.get(id) {
            stop_times.extend(sts.iter().cloned());
        } else if let Some(sts) = itinerary_source(id, &source, &split_origin) {
            stop_times.extend(sts.iter().cloned().map(|mut st| {
                st.trip_id = id.clone();
                st
            }));
        }
    }
    feed.stop_times = stop_times;
    feed.calendar_dates.extend(new_calendar_dates);

    // Trips re-emitted under their original id with a narrowed (residual)
    // service supersede their unmodified source row; drop the latter so the
    // feed doesn't end up with two rows sharing one trip id.
    let mut retained_trips: Vec<Trip> = source
        .trips
        .into_iter()
        .filter(|t| referenced.contains(&t.id) && !overridden_originals.contains(&t.id))
        .collect();
    retained_trips.extend(new_trips);
    feed.trips = gtfs::database::InMemoryPrimaryKeyTable::from_rows(retained_trips);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use crate::warnings::Warnings;

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

    fn trip(id: &str, service: &str) -> Trip {
        Trip {
            id: Id::new(id.to_owned()),
            route_id: Id::new("R".to_owned()),
            service_id: service.to_owned(),
            headsign: None,
            short_name: None,
            direction: None,
            block_id: Some("B".to_owned()),
            shape_id: None,
            wheelchair_accessible: Default::default(),
            bikes_allowed: Default::default(),
        }
    }

    fn stop_time(trip_id: &str, seq: u32) -> StopTime {
        StopTime {
            trip_id: Id::new(trip_id.to_owned()),
            arrival_time: None,
            departure_time: None,
            stop_id: None,
            location_group_id: None,
            location_id: None,
            stop_sequence: seq,
            stop_headsign: None,
            start_pickup_drop_off_window: None,
            end_pickup_drop_off_window: None,
            pickup_type: PickupMethod::NotAvailable,
            drop_off_type: DropOffMethod::NotAvailable,
            continuous_pickup: None,
            continuous_drop_off: None,
            shape_distance_traveled: None,
            pickup_booking_rule_id: None,
            drop_off_booking_rule_id: None,
        }
    }

    fn index_with_capacity(capacity: usize) -> ServiceDayIndex {
        let mut warnings = Warnings::new();
        let mut index = crate::service_days::build_service_day_index(&empty_feed(), &mut warnings);
        index.insert_synthetic("S".to_owned(), DaySet::empty(capacity));
        index
    }

    #[test]
    fn unsplit_node_reuses_original_trip_id() {
        let mut graph = Graph::new();
        let days = DaySet::empty(4);
        graph.node_for_trip(&Id::new("A".to_owned()), &days);

        let mut feed = empty_feed();
        feed.trips.insert(trip("A", "S"));
        feed.stop_times = vec![stop_time("A", 0), stop_time("A", 1)];

        let mut index = index_with_capacity(4);
        export(&graph, &mut feed, &mut index, false);

        let trips = feed.trips.get_all();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].id.to_string(), "A");
    }

    #[test]
    fn narrowed_incoming_edge_splits_the_trip() {
        let mut graph = Graph::new();
        let full = {
            let mut d = DaySet::empty(4);
            d.set(0);
            d.set(1);
            d
        };
        let a = graph.node_for_trip(&Id::new("A".to_owned()), &full);
        let b = graph.node_for_trip(&Id::new("B".to_owned()), &full);
        let mut narrow = DaySet::empty(4);
        narrow.set(0);
        graph.edges.push(Edge {
            from: a,
            to: b,
            shift: 0,
            days: narrow,
            kind: ContinuationType::InSeat,
            rank: 1,
            pre_declared: false,
        });

        let mut feed = empty_feed();
        feed.trips.insert(trip("A", "S"));
        feed.trips.insert(trip("B", "S"));
        feed.stop_times = vec![
            stop_time("A", 0),
            stop_time("A", 1),
            stop_time("B", 0),
            stop_time("B", 1),
        ];

        let mut index = index_with_capacity(4);
        export(&graph, &mut feed, &mut index, false);

        let trips = feed.trips.get_all();
        // A is reused (no incoming edges). B is split into two: a
        // continuation-target trip for day 0 (the only day A reaches it
        // through the graph) and a residual trip, still under id "B", for
        // day 1 — the day nothing in the graph feeds into it.
        assert!(trips.iter().any(|t| t.id.to_string() == "A"));
        assert!(trips.iter().any(|t| t.id.to_string() == "B"));
        let split = trips
            .iter()
            .find(|t| t.id.to_string() != "A" && t.id.to_string() != "B")
            .expect("a distinct id for the day-0 continuation target");
        assert_eq!(trips.len(), 3);

        let residual = trips.iter().find(|t| t.id.to_string() == "B").unwrap();
        assert_ne!(split.service_id, residual.service_id);

        let split_times: Vec<_> = feed
            .stop_times
            .iter()
            .filter(|st| st.trip_id == split.id)
            .collect();
        assert_eq!(split_times[0].pickup_type, PickupMethod::NotAvailable);

        let residual_times: Vec<_> = feed.stop_times.iter().filter(|st| st.trip_id.to_string() == "B").collect();
        assert_eq!(residual_times.len(), 2);

        let from_times: Vec<_> = feed.stop_times.iter().filter(|st| st.trip_id.to_string() == "A").collect();
        assert_eq!(from_times.last().unwrap().pickup_type, PickupMethod::RegularlyScheduled);
        assert_eq!(split_times.first().unwrap().drop_off_type, DropOffMethod::RegularlyScheduled);

        assert!(feed.transfers.iter().any(|t| t.from_trip_id.as_ref().unwrap().to_string() == "A"));
    }

    #[test]
    fn itinerary_layout_still_produces_correct_split_stop_times() {
        let mut graph = Graph::new();
        let full = {
            let mut d = DaySet::empty(4);
            d.set(0);
            d.set(1);
            d
        };
        let a = graph.node_for_trip(&Id::new("A".to_owned()), &full);
        let b = graph.node_for_trip(&Id::new("B".to_owned()), &full);
        let mut narrow = DaySet::empty(4);
        narrow.set(0);
        graph.edges.push(Edge {
            from: a,
            to: b,
            shift: 0,
            days: narrow,
            kind: ContinuationType::InSeat,
            rank: 1,
            pre_declared: false,
        });

        let mut feed = empty_feed();
        feed.trips.insert(trip("A", "S"));
        feed.trips.insert(trip("B", "S"));
        feed.stop_times = vec![
            stop_time("A", 0),
            stop_time("A", 1),
            stop_time("B", 0),
            stop_time("B", 1),
        ];

        let mut index = index_with_capacity(4);
        export(&graph, &mut feed, &mut index, true);

        let trips = feed.trips.get_all();
        let split = trips
            .iter()
            .find(|t| t.id.to_string() != "A" && t.id.to_string() != "B")
            .unwrap();
        let split_times: Vec<_> = feed
            .stop_times
            .iter()
            .filter(|st| st.trip_id == split.id)
            .collect();
        assert_eq!(split_times.len(), 2);
        assert_eq!(split_times.first().unwrap().drop_off_type, DropOffMethod::RegularlyScheduled);

        // B's residual day (day 1, uncovered by the incoming edge) is still
        // exported under its original id, not dropped.
        let residual_times: Vec<_> = feed.stop_times.iter().filter(|st| st.trip_id.to_string() == "B").collect();
        assert_eq!(residual_times.len(), 2);
    }

    #[test]
    fn incoming_edges_covering_full_days_produce_no_residual_trip() {
        let mut graph = Graph::new();
        let full = {
            let mut d = DaySet::empty(4);
            d.set(0);
            d.set(1);
            d
        };
        let a = graph.node_for_trip(&Id::new("A".to_owned()), &full);
        let b = graph.node_for_trip(&Id::new("B".to_owned()), &full);
        graph.edges.push(Edge {
            from: a,
            to: b,
            shift: 0,
            days: full,
            kind: ContinuationType::InSeat,
            rank: 1,
            pre_declared: false,
        });

        let mut feed = empty_feed();
        feed.trips.insert(trip("A", "S"));
        feed.trips.insert(trip("B", "S"));
        feed.stop_times = vec![
            stop_time("A", 0),
            stop_time("A", 1),
            stop_time("B", 0),
            stop_time("B", 1),
        ];

        let mut index = index_with_capacity(4);
        export(&graph, &mut feed, &mut index, false);

        let trips = feed.trips.get_all();
        assert_eq!(trips.len(), 2);
        assert!(trips.iter().any(|t| t.id.to_string() == "B"));
    }
}
