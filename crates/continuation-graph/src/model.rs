//! The pipeline's own view of a trip: derived fields (shift-days, normalised
//! departure/arrival, stop-shape) computed once from the feed's raw typed
//! rows, so every later stage works with plain numbers instead of re-walking
//! `stop_times` each time.

use std::collections::HashMap;

use gtfs::data_model::routes::RouteId;
use gtfs::data_model::stops::Stop;
use gtfs::data_model::stop_times::StopTime;
use gtfs::data_model::trips::{TravelDirection, Trip, TripId};
use gtfs::database::PrimaryKeyTable;
use gtfs::Feed;

use crate::dayset::DaySet;
use crate::shape_similarity::{Point, ShapeId};

pub type ServiceId = String;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct Service {
    pub id: ServiceId,
    pub days: DaySet,
}

/// The pipeline's normalised view of one trip. `stop_times` is sorted
/// ascending by `stop_sequence` and is never empty (trips with fewer than
/// two stop-times are dropped by the block grouper before `TripView`s are
/// consumed downstream).
#[derive(Debug, Clone)]
pub struct TripView {
    pub id: TripId,
    pub service_id: ServiceId,
    pub block_id: Option<String>,
    pub route_id: RouteId,
    pub direction: Option<TravelDirection>,
    pub stop_times: Vec<StopTime>,
    /// 0 or 1, depending on whether the first departure was notated past the
    /// 24h mark.
    pub shift_days: i64,
    /// First departure, normalised into `[0, 24h)`.
    pub first_departure: i64,
    /// Last arrival, normalised into the same frame as `first_departure`.
    pub last_arrival: i64,
    pub first_point: Option<Point>,
    pub last_point: Option<Point>,
    pub stop_shape: Vec<Point>,
    pub shape_id: ShapeId,
}

impl TripView {
    pub fn last_stop_id(&self) -> Option<String> {
        self.stop_times
            .last()
            .and_then(|st| st.stop_id.as_ref())
            .map(|id| id.raw())
    }

    pub fn first_stop_id(&self) -> Option<String> {
        self.stop_times
            .first()
            .and_then(|st| st.stop_id.as_ref())
            .map(|id| id.raw())
    }
}

/// Assigns shared shape identities to trips whose stop-shape (the ordered
/// tuple of stop locations) is identical, so the similarity cache can be
/// keyed by a cheap integer instead of comparing point vectors.
#[derive(Default)]
struct ShapeArena {
    by_shape: HashMap<Vec<(u64, u64)>, ShapeId>,
}

impl ShapeArena {
    fn intern(&mut self, shape: &[Point]) -> ShapeId {
        let key: Vec<(u64, u64)> = shape
            .iter()
            .map(|(lat, lon)| (lat.to_bits(), lon.to_bits()))
            .collect();
        let next_id = self.by_shape.len();
        *self.by_shape.entry(key).or_insert(next_id)
    }
}

fn stop_point<T>(stops: &T, stop_id: &gtfs::data_model::stops::StopId) -> Option<Point>
where
    T: PrimaryKeyTable<gtfs::data_model::stops::StopId, Stop>,
{
    let stop = stops.get(stop_id)?;
    Some((stop.latitude?, stop.longitude?))
}

/// Builds the pipeline's trip views from a loaded feed, normalising every
/// trip's stop-times by departure time and deriving shift-days, first/last
/// points and a deduplicated stop-shape identity.
pub fn build_trip_views(feed: &Feed) -> Vec<TripView> {
    let mut shapes = ShapeArena::default();
    let mut stop_times_by_trip: HashMap<TripId, Vec<StopTime>> = HashMap::new();
    for stop_time in &feed.stop_times {
        stop_times_by_trip
            .entry(stop_time.trip_id.clone())
            .or_default()
            .push(stop_time.clone());
    }

    let mut trips: Vec<Trip> = feed.trips.get_all();
    trips.sort_by(|a, b| a.id.cmp(&b.id));

    let mut views = Vec::with_capacity(trips.len());
    for trip in trips {
        let Some(mut stop_times) = stop_times_by_trip.remove(&trip.id) else {
            continue;
        };
        stop_times.sort_by_key(|st| st.stop_sequence);

        let first_departure_raw = stop_times
            .first()
            .and_then(|st| st.departure_time.or(st.arrival_time))
            .map(|d| d.num_seconds())
            .unwrap_or(0);
        let shift_days = if first_departure_raw >= SECONDS_PER_DAY {
            first_departure_raw / SECONDS_PER_DAY
        } else {
            0
        };
        let offset = shift_days * SECONDS_PER_DAY;

        let first_departure = first_departure_raw - offset;
        let last_arrival = stop_times
            .last()
            .and_then(|st| st.arrival_time.or(st.departure_time))
            .map(|d| d.num_seconds() - offset)
            .unwrap_or(first_departure);

        let stop_shape: Vec<Point> = stop_times
            .iter()
            .filter_map(|st| stop_point(&feed.stops, st.stop_id.as_ref()?))
            .collect();
        let shape_id = shapes.intern(&stop_shape);

        let first_point = stop_shape.first().copied();
        let last_point = stop_shape.last().copied();

        views.push(TripView {
            id: trip.id,
            service_id: trip.service_id,
            block_id: trip.block_id,
            route_id: trip.route_id,
            direction: trip.direction,
            stop_times,
            shift_days,
            first_departure,
            last_arrival,
            first_point,
            last_point,
            stop_shape,
            shape_id,
        });
    }
    views
}
