pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const EARTH_RADIUS_M: f64 = EARTH_RADIUS_KM * 1000.0;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

pub fn calculate_bounding_box(
    lat: f64,
    lon: f64,
    radius_km: f64,
) -> ((f64, f64), (f64, f64)) {
    // Convert latitude and longitude from degrees to radians
    let lat_rad = to_radians(lat);
    let lon_rad = to_radians(lon);

    // Latitude bounds
    let min_lat = lat_rad - radius_km / EARTH_RADIUS_KM;
    let max_lat = lat_rad + radius_km / EARTH_RADIUS_KM;

    // Longitude bounds (adjusted by latitude)
    let min_lon = lon_rad - radius_km / (EARTH_RADIUS_KM * lat_rad.cos());
    let max_lon = lon_rad + radius_km / (EARTH_RADIUS_KM * lat_rad.cos());

    // Convert bounds back to degrees
    let min_lat_deg = to_degrees(min_lat);
    let max_lat_deg = to_degrees(max_lat);
    let min_lon_deg = to_degrees(min_lon);
    let max_lon_deg = to_degrees(max_lon);

    ((min_lat_deg, min_lon_deg), (max_lat_deg, max_lon_deg))
}

pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = to_radians(latitude_1);
    let lon1_rad = to_radians(longitude_1);
    let lat2_rad = to_radians(latitude2);
    let lon2_rad = to_radians(longitude_2);

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Angular great-circle distance between two points, in radians.
fn angular_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = to_radians(lat1);
    let lat2_rad = to_radians(lat2);
    let dlat = lat2_rad - lat1_rad;
    let dlon = to_radians(lon2 - lon1);

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing, in radians, from (lat1, lon1) towards (lat2, lon2).
fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = to_radians(lat1);
    let lat2_rad = to_radians(lat2);
    let dlon = to_radians(lon2 - lon1);

    let y = dlon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * dlon.cos();
    y.atan2(x)
}

/// Great-circle distance in meters from `point` to the nearest point on the
/// segment `(seg_start, seg_end)`, via cross-track / along-track decomposition.
/// Falls back to the distance to the nearer endpoint when the perpendicular
/// foot lands outside the segment, or when the segment is degenerate.
pub fn distance_to_segment_m(
    point: (f64, f64),
    seg_start: (f64, f64),
    seg_end: (f64, f64),
) -> f64 {
    let (p_lat, p_lon) = point;
    let (a_lat, a_lon) = seg_start;
    let (b_lat, b_lon) = seg_end;

    let seg_len = angular_distance(a_lat, a_lon, b_lat, b_lon);
    if seg_len < 1e-12 {
        return EARTH_RADIUS_M * angular_distance(a_lat, a_lon, p_lat, p_lon);
    }

    let delta_ap = angular_distance(a_lat, a_lon, p_lat, p_lon);
    let theta_ap = bearing(a_lat, a_lon, p_lat, p_lon);
    let theta_ab = bearing(a_lat, a_lon, b_lat, b_lon);

    if (theta_ap - theta_ab).cos() < 0.0 {
        // The perpendicular foot falls behind the segment's start point.
        return EARTH_RADIUS_M * delta_ap;
    }

    let cross_track = ((delta_ap.sin() * (theta_ap - theta_ab).sin()).clamp(-1.0, 1.0)).asin();
    let along_track_cos = (delta_ap.cos() / cross_track.cos()).clamp(-1.0, 1.0);
    let along_track = along_track_cos.acos();

    if along_track > seg_len {
        return EARTH_RADIUS_M * angular_distance(b_lat, b_lon, p_lat, p_lon);
    }

    EARTH_RADIUS_M * cross_track.abs()
}
