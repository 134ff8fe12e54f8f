//! Location helpers: S2 cell ranges, plus codes and distance limits.

use s2::cellid::CellID;
use s2::latlng::LatLng;

/// Search radius in km when none is given.
pub const DEFAULT_DIST: f64 = 2.0;
/// Largest radius in km for library wide searches.
pub const DIST_LIMIT: f64 = 5000.0;
/// Largest radius in km inside an album scope.
pub const SCOPE_DIST_LIMIT: f64 = 50.0;

/// Prefix of stored cell tokens.
pub const TOKEN_PREFIX: &str = "s2:";
/// Stored cell id of photos without a location.
pub const UNKNOWN_CELL: &str = "zz";

/// Level used for stored photo cells.
pub const CELL_LEVEL: u64 = 21;

const KM_PER_DEGREE: f64 = 111.0;

/// Geospatial lookups used by the predicate compiler.
pub trait GeoIndex: Send + Sync {
    /// Prefixed `[min, max]` token bounds of the cell containing `token` at `level`.
    fn cell_range(&self, token: &str, level: u64) -> Option<(String, String)>;
    /// Prefixed cell token of the center of an Open Location Code area.
    fn olc_token(&self, code: &str) -> Option<String>;
    /// Prefixed cell token of a point.
    fn cell_token(&self, lat: f64, lng: f64) -> String;
}

/// [`GeoIndex`] backed by the `s2` and `open-location-code` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct S2Index;

impl GeoIndex for S2Index {
    fn cell_range(&self, token: &str, level: u64) -> Option<(String, String)> {
        let raw = token.trim().strip_prefix(TOKEN_PREFIX).unwrap_or(token.trim());
        if raw.is_empty() || raw == UNKNOWN_CELL {
            return None;
        }
        let id = CellID::from_token(raw);
        if !id.is_valid() {
            return None;
        }
        let cell = if level < id.level() { id.parent(level) } else { id };
        Some((
            format!("{}{}", TOKEN_PREFIX, cell.range_min().to_token()),
            format!("{}{}", TOKEN_PREFIX, cell.range_max().to_token()),
        ))
    }

    fn olc_token(&self, code: &str) -> Option<String> {
        let area = open_location_code::decode(code.trim()).ok()?;
        let lat = (area.south + area.north) / 2.0;
        let lng = (area.west + area.east) / 2.0;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(self.cell_token(lat, lng))
    }

    fn cell_token(&self, lat: f64, lng: f64) -> String {
        let id = CellID::from(&LatLng::from_degrees(lat, lng)).parent(CELL_LEVEL);
        format!("{}{}", TOKEN_PREFIX, id.to_token())
    }
}

/// Cell level whose cells roughly span `km`.
pub fn level_for_km(km: f64) -> u64 {
    if km <= 0.0 || !km.is_finite() {
        return 30;
    }
    (7842.0 / km).log2().round().clamp(0.0, 30.0) as u64
}

/// Applies the default radius and the limit for scoped or unscoped searches.
pub fn clamp_dist(dist: f64, scoped: bool) -> f64 {
    let limit = if scoped { SCOPE_DIST_LIMIT } else { DIST_LIMIT };
    if dist <= 0.0 || !dist.is_finite() {
        DEFAULT_DIST
    } else {
        dist.min(limit)
    }
}

/// Parses a `latN,lngE,latS,lngW` bounding box.
pub fn parse_bounds(s: &str) -> Option<(f64, f64, f64, f64)> {
    let v: Vec<f64> = s.split(',').map(|p| p.trim().parse::<f64>()).collect::<Result<_, _>>().ok()?;
    if v.len() != 4 || v.iter().any(|f| !f.is_finite()) {
        return None;
    }
    let (mut lat_n, lng_e, mut lat_s, lng_w) = (v[0], v[1], v[2], v[3]);
    if lat_n < lat_s {
        std::mem::swap(&mut lat_n, &mut lat_s);
    }
    if !(-90.0..=90.0).contains(&lat_n) || !(-90.0..=90.0).contains(&lat_s) {
        return None;
    }
    if !(-180.0..=180.0).contains(&lng_e) || !(-180.0..=180.0).contains(&lng_w) {
        return None;
    }
    Some((lat_n, lng_e, lat_s, lng_w))
}

/// Latitude band `(south, north)` within `km` of `lat`.
pub fn lat_range(lat: f64, km: f64) -> Option<(f64, f64)> {
    if !(-90.0..=90.0).contains(&lat) {
        return None;
    }
    let d = km / KM_PER_DEGREE;
    Some(((lat - d).max(-90.0), (lat + d).min(90.0)))
}

/// Longitude band `(west, east)` within `km` of a point.
pub fn lng_range(lat: f64, lng: f64, km: f64) -> Option<(f64, f64)> {
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return None;
    }
    let cos = lat.to_radians().cos();
    if cos <= f64::EPSILON {
        return Some((-180.0, 180.0));
    }
    let d = km / (KM_PER_DEGREE * cos);
    Some(((lng - d).max(-180.0), (lng + d).min(180.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_km() {
        assert_eq!(level_for_km(2.0), 12);
        assert_eq!(level_for_km(5000.0), 1);
        assert_eq!(level_for_km(0.001), 23);
        assert_eq!(level_for_km(0.0), 30);
        assert_eq!(level_for_km(100_000.0), 0);
    }

    #[test]
    fn test_clamp_dist() {
        assert_eq!(clamp_dist(0.0, false), DEFAULT_DIST);
        assert_eq!(clamp_dist(-4.0, true), DEFAULT_DIST);
        assert_eq!(clamp_dist(10_000.0, false), DIST_LIMIT);
        assert_eq!(clamp_dist(100.0, true), SCOPE_DIST_LIMIT);
        assert_eq!(clamp_dist(30.0, true), 30.0);
    }

    #[test]
    fn test_cell_token_and_range() {
        let geo = S2Index;
        let token = geo.cell_token(52.5200, 13.4050);
        assert!(token.starts_with(TOKEN_PREFIX));
        let (min, max) = geo.cell_range(&token, level_for_km(2.0)).unwrap();
        assert!(min <= token && token <= max, "{} <= {} <= {}", min, token, max);
        assert!(geo.cell_range("zz", 12).is_none());
        assert!(geo.cell_range("", 12).is_none());
    }

    #[test]
    fn test_olc_token() {
        let geo = S2Index;
        let token = geo.olc_token("9F4MGC2R+5V").unwrap();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert!(geo.olc_token("not a code").is_none());
        // Well formed but north of the pole.
        assert!(geo.olc_token("X2222222+22").is_none());
    }

    #[test]
    fn test_bounds_and_ranges() {
        assert_eq!(parse_bounds("52.6,13.5,52.4,13.3"), Some((52.6, 13.5, 52.4, 13.3)));
        assert_eq!(parse_bounds("52.4,13.5,52.6,13.3"), Some((52.6, 13.5, 52.4, 13.3)));
        assert!(parse_bounds("1,2,3").is_none());
        assert!(parse_bounds("95,0,0,0").is_none());
        let (s, n) = lat_range(52.0, 111.0).unwrap();
        assert!((s - 51.0).abs() < 1e-9 && (n - 53.0).abs() < 1e-9);
        let (w, e) = lng_range(0.0, 10.0, 111.0).unwrap();
        assert!((w - 9.0).abs() < 1e-9 && (e - 11.0).abs() < 1e-9);
        assert!(lat_range(120.0, 1.0).is_none());
    }
}
