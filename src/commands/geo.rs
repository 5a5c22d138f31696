use bytes::Bytes;

use crate::keyspace::{get_live, Map};
use crate::models::geo::{self, DistanceUnit};
use crate::models::{RedisData, RedisValue, SortedSet};
use crate::utils::encoder::*;

pub fn process_geoadd(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "GEOADD", parts[1] = key, then (lon, lat, member) triples
    if parts.len() < 5 || (parts.len() - 2) % 3 != 0 {
        return Err("ERR wrong number of arguments for 'geoadd' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let mut triples = Vec::new();
    for chunk in parts[2..].chunks_exact(3) {
        let lon = parse_coord(&chunk[0])?;
        let lat = parse_coord(&chunk[1])?;
        geo::validate_coordinates(lon, lat)?;
        triples.push((lon, lat, chunk[2].clone()));
    }

    let entry = map.entry(key).or_insert_with(|| RedisValue::new(RedisData::SortedSet(SortedSet::new()), None));
    match &mut entry.data {
        RedisData::SortedSet(set) => {
            let added = triples
                .into_iter()
                .filter(|(lon, lat, member)| set.add(member.clone(), geo::encode(*lon, *lat)))
                .count();
            Ok(encode_integer(added as i64))
        }
        _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
    }
}

pub fn process_geopos(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "GEOPOS", parts[1] = key, parts[2..] = members
    if parts.len() < 3 {
        return Err("ERR wrong number of arguments for 'geopos' command".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let set = match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::SortedSet(set) => Some(set),
            _ => return Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => None,
    };

    let mut positions = Vec::new();
    for member in &parts[2..] {
        match set.and_then(|s| s.score(member)) {
            Some(score) => {
                let (lon, lat) = geo::decode(score);
                positions.push(encode_array(&[Bytes::from(format!("{lon:.17}")), Bytes::from(format!("{lat:.17}"))]));
            }
            None => positions.push(encode_null_array()),
        }
    }
    Ok(encode_raw_array(positions))
}

pub fn process_geodist(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "GEODIST", parts[1] = key, parts[2] = member1, parts[3] = member2, [parts[4] = unit]
    if parts.len() < 4 {
        return Err("ERR wrong number of arguments for 'geodist' command".to_string());
    }
    let unit = match parts.get(4) {
        Some(raw) => DistanceUnit::parse(raw).ok_or_else(|| "ERR unsupported unit provided. please use m, km, ft, mi".to_string())?,
        None => DistanceUnit::Meters,
    };

    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::SortedSet(set) => {
                let (Some(a), Some(b)) = (set.score(&parts[2]), set.score(&parts[3])) else {
                    return Ok(encode_null_string());
                };
                let meters = geo::haversine_meters(geo::decode(a), geo::decode(b));
                Ok(encode_bulk_string(format!("{:.4}", unit.from_meters(meters))))
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_null_string()),
    }
}

pub fn process_geosearch(parts: &[Bytes], map: &mut Map) -> RespResult {
    // parts[0] = "GEOSEARCH", parts[1] = key, "FROMLONLAT", lon, lat, "BYRADIUS", r, unit
    if parts.len() < 8
        || !parts[2].eq_ignore_ascii_case(b"FROMLONLAT")
        || !parts[5].eq_ignore_ascii_case(b"BYRADIUS")
    {
        return Err("ERR syntax error".to_string());
    }
    let key = String::from_utf8_lossy(&parts[1]).into_owned();
    let center = (parse_coord(&parts[3])?, parse_coord(&parts[4])?);
    let radius: f64 = parse_coord(&parts[6])?;
    let unit = DistanceUnit::parse(&parts[7]).ok_or_else(|| "ERR unsupported unit provided. please use m, km, ft, mi".to_string())?;
    let radius_meters = match unit {
        DistanceUnit::Meters => radius,
        DistanceUnit::Kilometers => radius * 1000.0,
        DistanceUnit::Miles => radius * 1609.34,
        DistanceUnit::Feet => radius * 0.3048,
    };

    match get_live(map, &key) {
        Some(value) => match &value.data {
            RedisData::SortedSet(set) => {
                let mut hits: Vec<(f64, Bytes)> = set
                    .iter()
                    .filter_map(|(member, score)| {
                        let point = geo::decode(score);
                        let distance = geo::haversine_meters(center, point);
                        (distance <= radius_meters).then(|| (distance, member.clone()))
                    })
                    .collect();
                hits.sort_by(|a, b| a.0.total_cmp(&b.0));
                Ok(encode_array(&hits.into_iter().map(|(_, m)| m).collect::<Vec<_>>()))
            }
            _ => Err("WRONGTYPE Operation against a key holding the wrong kind of value".to_string()),
        },
        None => Ok(encode_array(&[])),
    }
}

fn parse_coord(bytes: &[u8]) -> Result<f64, String> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "ERR value is not a valid float".to_string())
}
