//! Coordinate extraction from map-service links and DMS strings.
//!
//! One sharing link routinely carries several disagreeing pairs: the viewport
//! center, the vendor's place marker, and the pin the user dropped. The
//! coarsest pair tends to appear first in the string, so position never
//! decides priority. Strategies run in a fixed order and the first in-range
//! hit wins.

use std::borrow::Cow;
use std::sync::LazyLock;

use floodline_common::{GeoPoint, LocationHint};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::datum::DatumNormalizer;

const NUM: &str = r"(-?\d+(?:\.\d+)?)";

static QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"[?&](?:q|query)=[\s+]*{NUM}[\s+]*,[\s+]*{NUM}")).unwrap()
});

static DMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(\d{1,3})\s*°\s*(\d{1,2})\s*['′]\s*(\d{1,2}(?:\.\d+)?)\s*(?:"|″|'')?\s*([NSns])?[\s+,]*(\d{1,3})\s*°\s*(\d{1,2})\s*['′]\s*(\d{1,2}(?:\.\d+)?)\s*(?:"|″|'')?\s*([EWew])?"#,
    )
    .unwrap()
});

static DATA_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"!3d{NUM}!4d{NUM}")).unwrap());

static PLACE_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"/place/[^/@]+/@{NUM},{NUM}(?:[/,?]|$)")).unwrap());

static VIEWPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"@{NUM},{NUM},\d+(?:\.\d+)?[a-z]?")).unwrap());

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Extraction strategies, highest confidence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `?q=<lat>,<lng>`: the pin the user dropped.
    QueryParam,
    /// DMS pair inside a place segment: vendor high-precision marker.
    DmsPlace,
    /// `!3d<lat>!4d<lng>` in the link's data block: vendor place coordinate.
    DataBlock,
    /// `/place/<name>/@<lat>,<lng>`: view center tied to a place.
    PlaceAnchor,
    /// Bare `@<lat>,<lng>,<zoom>`: generic viewport center.
    Viewport,
}

type TryParse = fn(&str) -> Option<GeoPoint>;

const CASCADE: [(Strategy, TryParse); 5] = [
    (Strategy::QueryParam, parse_query_param),
    (Strategy::DmsPlace, parse_dms),
    (Strategy::DataBlock, parse_data_block),
    (Strategy::PlaceAnchor, parse_place_anchor),
    (Strategy::Viewport, parse_viewport),
];

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::QueryParam,
        Strategy::DmsPlace,
        Strategy::DataBlock,
        Strategy::PlaceAnchor,
        Strategy::Viewport,
    ];

    /// Run this strategy alone, without decoding or normalization.
    pub fn try_parse(self, input: &str) -> Option<GeoPoint> {
        CASCADE
            .iter()
            .find(|(s, _)| *s == self)
            .and_then(|(_, parse)| parse(input))
    }
}

fn capture_f64(caps: &Captures, idx: usize) -> Option<f64> {
    caps.get(idx)?.as_str().parse().ok()
}

/// First match whose `(lat, lng)` captures are in range.
fn first_lat_lng(re: &Regex, input: &str) -> Option<GeoPoint> {
    re.captures_iter(input).find_map(|caps| {
        let lat = capture_f64(&caps, 1)?;
        let lng = capture_f64(&caps, 2)?;
        GeoPoint::new(lng, lat)
    })
}

fn parse_query_param(input: &str) -> Option<GeoPoint> {
    first_lat_lng(&QUERY_RE, input)
}

fn parse_data_block(input: &str) -> Option<GeoPoint> {
    first_lat_lng(&DATA_BLOCK_RE, input)
}

fn parse_place_anchor(input: &str) -> Option<GeoPoint> {
    first_lat_lng(&PLACE_ANCHOR_RE, input)
}

fn parse_viewport(input: &str) -> Option<GeoPoint> {
    first_lat_lng(&VIEWPORT_RE, input)
}

fn dms_component(caps: &Captures, deg: usize, min: usize, sec: usize) -> Option<f64> {
    let d = capture_f64(caps, deg)?;
    let m = capture_f64(caps, min)?;
    let s = capture_f64(caps, sec)?;
    if m >= 60.0 || s >= 60.0 {
        return None;
    }
    Some(d + m / 60.0 + s / 3600.0)
}

fn parse_dms(input: &str) -> Option<GeoPoint> {
    DMS_RE.captures_iter(input).find_map(|caps| {
        let mut lat = dms_component(&caps, 1, 2, 3)?;
        let mut lng = dms_component(&caps, 5, 6, 7)?;
        if caps.get(4).is_some_and(|h| h.as_str().eq_ignore_ascii_case("s")) {
            lat = -lat;
        }
        if caps.get(8).is_some_and(|h| h.as_str().eq_ignore_ascii_case("w")) {
            lng = -lng;
        }
        GeoPoint::new(lng, lat)
    })
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateShape {
    /// `[lng, lat]`
    #[default]
    Pair,
    /// `{"longitude": .., "latitude": ..}`
    Named,
}

/// Shaped extraction result. `NotFound` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedCoordinate {
    Pair([f64; 2]),
    Named { longitude: f64, latitude: f64 },
    NotFound,
}

impl ExtractedCoordinate {
    pub fn shape(point: Option<GeoPoint>, shape: CoordinateShape) -> Self {
        match (point, shape) {
            (None, _) => ExtractedCoordinate::NotFound,
            (Some(p), CoordinateShape::Pair) => ExtractedCoordinate::Pair(p.as_pair()),
            (Some(p), CoordinateShape::Named) => ExtractedCoordinate::Named {
                longitude: p.lng,
                latitude: p.lat,
            },
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, ExtractedCoordinate::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateExtractor {
    normalizer: DatumNormalizer,
}

impl CoordinateExtractor {
    pub fn new(normalizer: DatumNormalizer) -> Self {
        Self { normalizer }
    }

    /// One normalized `(lng, lat)` from a link or DMS string, or `None`.
    pub fn extract(&self, input: &str) -> Option<GeoPoint> {
        self.extract_with_strategy(input).map(|(_, p)| p)
    }

    /// Like [`extract`](Self::extract), also reporting which strategy matched.
    pub fn extract_with_strategy(&self, input: &str) -> Option<(Strategy, GeoPoint)> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        // Markers survive percent-decoding differently, so each strategy
        // sees both forms before the next strategy is tried.
        let decoded = match urlencoding::decode(input) {
            Ok(Cow::Owned(d)) if d != input => Some(d),
            _ => None,
        };

        for (strategy, parse) in CASCADE {
            let hit = parse(input).or_else(|| decoded.as_deref().and_then(parse));
            if let Some(point) = hit {
                debug!(strategy = ?strategy, lng = point.lng, lat = point.lat, "Coordinate extracted");
                return Some((strategy, self.normalizer.normalize(point)));
            }
        }

        debug!(input_len = input.len(), "No coordinate found in location hint");
        None
    }

    pub fn extract_shaped(&self, input: &str, shape: CoordinateShape) -> ExtractedCoordinate {
        ExtractedCoordinate::shape(self.extract(input), shape)
    }

    pub fn extract_hint(&self, hint: &LocationHint) -> Option<GeoPoint> {
        match hint {
            LocationHint::MapServiceUrl { url } => self.extract(url),
            LocationHint::DmsString { text } => self.extract(text),
            LocationHint::RawPair { lng, lat } => {
                GeoPoint::new(*lng, *lat).map(|p| self.normalizer.normalize(p))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> CoordinateExtractor {
        CoordinateExtractor::default()
    }

    #[test]
    fn query_param_with_encoded_comma() {
        let p = extractor()
            .extract("https://maps.google.com/?q=21.0285%2C105.8542")
            .unwrap();
        assert_eq!(p.as_pair(), [105.8542, 21.0285]);
    }

    #[test]
    fn query_param_tolerates_plus_spacing() {
        let p = extractor()
            .extract("https://www.google.com/maps?q=10.8231,+106.6297")
            .unwrap();
        assert_eq!(p.as_pair(), [106.6297, 10.8231]);
    }

    #[test]
    fn dms_southern_and_western_hemispheres() {
        let p = extractor().extract(r#"33°52'4.0"S 151°12'30.0"W"#).unwrap();
        assert!((p.lat - -(33.0 + 52.0 / 60.0 + 4.0 / 3600.0)).abs() < 1e-9);
        assert!((p.lng - -(151.0 + 12.0 / 60.0 + 30.0 / 3600.0)).abs() < 1e-9);
    }

    #[test]
    fn dms_without_hemisphere_defaults_north_east() {
        let p = extractor().extract(r#"21°30'0" 105°45'0""#).unwrap();
        assert_eq!(p.as_pair(), [105.75, 21.5]);
    }

    #[test]
    fn dms_percent_encoded_place_segment() {
        let url = "https://www.google.com/maps/place/21%C2%B030'00.0%22N+105%C2%B045'00.0%22E/@21.4,105.6,17z";
        let (strategy, p) = extractor().extract_with_strategy(url).unwrap();
        assert_eq!(strategy, Strategy::DmsPlace);
        assert_eq!(p.as_pair(), [105.75, 21.5]);
    }

    #[test]
    fn dms_minutes_out_of_range_is_rejected() {
        assert!(parse_dms(r#"21°75'0"N 105°45'0"E"#).is_none());
    }

    #[test]
    fn data_block_beats_view_center() {
        let url = "https://www.google.com/maps/place/Hoan+Kiem/@21.0287,105.8523,17z/data=!3m1!4b1!4m6!3m5!8m2!3d21.0285!4d105.8542";
        let (strategy, p) = extractor().extract_with_strategy(url).unwrap();
        assert_eq!(strategy, Strategy::DataBlock);
        assert_eq!(p.as_pair(), [105.8542, 21.0285]);
    }

    #[test]
    fn place_anchor_without_zoom() {
        let url = "https://www.google.com/maps/place/Cho+Ben+Thanh/@10.7725,106.698/";
        let (strategy, p) = extractor().extract_with_strategy(url).unwrap();
        assert_eq!(strategy, Strategy::PlaceAnchor);
        assert_eq!(p.as_pair(), [106.698, 10.7725]);
    }

    #[test]
    fn viewport_is_last_resort() {
        let url = "https://www.google.com/maps/@16.0544,108.2022,14z";
        let (strategy, p) = extractor().extract_with_strategy(url).unwrap();
        assert_eq!(strategy, Strategy::Viewport);
        assert_eq!(p.as_pair(), [108.2022, 16.0544]);
    }

    #[test]
    fn nothing_found() {
        assert!(extractor().extract("https://example.com/flood-report").is_none());
        assert!(extractor().extract("").is_none());
        assert!(extractor().extract("nước lên tới mái nhà").is_none());
    }

    #[test]
    fn shaped_output() {
        let e = extractor();
        let url = "https://maps.google.com/?q=21.0285,105.8542";
        assert_eq!(
            serde_json::to_value(e.extract_shaped(url, CoordinateShape::Pair)).unwrap(),
            serde_json::json!([105.8542, 21.0285])
        );
        assert_eq!(
            serde_json::to_value(e.extract_shaped(url, CoordinateShape::Named)).unwrap(),
            serde_json::json!({"longitude": 105.8542, "latitude": 21.0285})
        );
        let missing = e.extract_shaped("no coordinates here", CoordinateShape::Named);
        assert!(!missing.is_found());
        assert_eq!(serde_json::to_value(missing).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn raw_pair_hint_is_range_checked() {
        let e = extractor();
        assert_eq!(
            e.extract_hint(&LocationHint::RawPair { lng: 105.8542, lat: 21.0285 }),
            GeoPoint::new(105.8542, 21.0285)
        );
        assert!(e.extract_hint(&LocationHint::RawPair { lng: 105.0, lat: 95.0 }).is_none());
    }

    #[test]
    fn strategy_try_parse_runs_single_strategy() {
        let url = "https://www.google.com/maps/@16.0544,108.2022,14z";
        assert!(Strategy::QueryParam.try_parse(url).is_none());
        assert!(Strategy::Viewport.try_parse(url).is_some());
    }
}
