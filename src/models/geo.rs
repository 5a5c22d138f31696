//! Morton (Z-order) interleave of longitude/latitude into the 52-bit score
//! a sorted set stores, and the haversine distance between two decoded
//! points. Mirrors the standard geohash-on-zset scheme: 26 bits per axis
//! over the valid coordinate range, bit-interleaved into one `u64`.

pub const LON_MIN: f64 = -180.0;
pub const LON_MAX: f64 = 180.0;
pub const LAT_MIN: f64 = -85.05112878;
pub const LAT_MAX: f64 = 85.05112878;

const BITS: u32 = 26;
const EARTH_RADIUS_METERS: f64 = 6_372_797.560856;

pub fn validate_coordinates(lon: f64, lat: f64) -> Result<(), String> {
    if !(LON_MIN..=LON_MAX).contains(&lon) || !(LAT_MIN..=LAT_MAX).contains(&lat) {
        return Err(format!(
            "ERR invalid longitude,latitude pair {lon:.6},{lat:.6}"
        ));
    }
    Ok(())
}

/// Maps `value` linearly from `[min, max]` onto `[0, 2^BITS - 1]`.
fn scale(value: f64, min: f64, max: f64) -> u32 {
    let ratio = (value - min) / (max - min);
    (ratio * ((1u64 << BITS) - 1) as f64) as u32
}

fn unscale(bits: u32, min: f64, max: f64) -> f64 {
    let ratio = bits as f64 / ((1u64 << BITS) - 1) as f64;
    min + ratio * (max - min)
}

fn interleave(lon_bits: u32, lat_bits: u32) -> u64 {
    let mut result: u64 = 0;
    for i in 0..BITS {
        result |= (((lon_bits >> i) & 1) as u64) << (2 * i);
        result |= (((lat_bits >> i) & 1) as u64) << (2 * i + 1);
    }
    result
}

fn deinterleave(code: u64) -> (u32, u32) {
    let mut lon_bits: u32 = 0;
    let mut lat_bits: u32 = 0;
    for i in 0..BITS {
        lon_bits |= (((code >> (2 * i)) & 1) as u32) << i;
        lat_bits |= (((code >> (2 * i + 1)) & 1) as u32) << i;
    }
    (lon_bits, lat_bits)
}

/// Encodes `(lon, lat)` into the score GEOADD stores, as an exact integer
/// representable in `f64` (the interleaved value never exceeds 2^52).
pub fn encode(lon: f64, lat: f64) -> f64 {
    let lon_bits = scale(lon, LON_MIN, LON_MAX);
    let lat_bits = scale(lat, LAT_MIN, LAT_MAX);
    interleave(lon_bits, lat_bits) as f64
}

pub fn decode(score: f64) -> (f64, f64) {
    let (lon_bits, lat_bits) = deinterleave(score as u64);
    (unscale(lon_bits, LON_MIN, LON_MAX), unscale(lat_bits, LAT_MIN, LAT_MAX))
}

/// Great-circle distance between two `(lon, lat)` points, in meters.
pub fn haversine_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    pub fn parse(s: &[u8]) -> Option<Self> {
        match s.to_ascii_lowercase().as_slice() {
            b"m" => Some(Self::Meters),
            b"km" => Some(Self::Kilometers),
            b"mi" => Some(Self::Miles),
            b"ft" => Some(Self::Feet),
            _ => None,
        }
    }

    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            Self::Meters => meters,
            Self::Kilometers => meters / 1000.0,
            Self::Miles => meters / 1609.34,
            Self::Feet => meters / 0.3048,
        }
    }
}
