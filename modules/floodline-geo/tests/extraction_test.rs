//! Extraction cascade tests against synthetic map-service links.

use floodline_common::{DatumConfig, GeoPoint};
use floodline_geo::{CoordinateExtractor, DatumNormalizer, Strategy};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// (lng, lat) pairs spread across hemispheres and range edges.
const POINTS: &[(f64, f64)] = &[
    (105.8542, 21.0285),
    (106.6297, 10.8231),
    (151.2093, -33.8688),
    (-90.0715, 29.9511),
    (-43.1729, -22.9068),
    (0.0, 0.0),
    (179.9999, -89.9999),
];

fn dms(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let abs = value.abs();
    let deg = abs.trunc();
    let minutes_full = (abs - deg) * 60.0;
    let min = minutes_full.trunc();
    let sec = (minutes_full - min) * 60.0;
    format!("{}°{}'{:.6}\"{}", deg as u32, min as u32, sec, hemisphere)
}

fn url_for(strategy: Strategy, lng: f64, lat: f64) -> String {
    match strategy {
        Strategy::QueryParam => format!("https://maps.google.com/?q={lat},{lng}"),
        Strategy::DmsPlace => format!(
            "https://www.google.com/maps/place/{}+{}/",
            dms(lat, 'N', 'S'),
            dms(lng, 'E', 'W')
        ),
        Strategy::DataBlock => format!(
            "https://www.google.com/maps/place/Somewhere/data=!4m6!3m5!1s0x0:0x0!8m2!3d{lat}!4d{lng}"
        ),
        Strategy::PlaceAnchor => {
            format!("https://www.google.com/maps/place/Flooded+Street/@{lat},{lng}/")
        }
        Strategy::Viewport => format!("https://www.google.com/maps/@{lat},{lng},15z"),
    }
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn every_strategy_round_trips_every_point() {
    let extractor = CoordinateExtractor::default();

    for &strategy in &Strategy::ALL {
        for &(lng, lat) in POINTS {
            let url = url_for(strategy, lng, lat);
            let (hit, point) = extractor
                .extract_with_strategy(&url)
                .unwrap_or_else(|| panic!("{strategy:?} found nothing in {url}"));
            assert_eq!(hit, strategy, "wrong strategy for {url}");

            if strategy == Strategy::DmsPlace {
                assert!((point.lng - lng).abs() < 1e-9, "{url} → {point:?}");
                assert!((point.lat - lat).abs() < 1e-9, "{url} → {point:?}");
            } else {
                assert_eq!(point, GeoPoint { lng, lat }, "{url}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[test]
fn dms_place_beats_later_viewport() {
    let url = "https://www.google.com/maps/@10.0,106.0,12z/place/21°30'0.0\"N+105°45'0.0\"E/";
    let (strategy, point) = CoordinateExtractor::default()
        .extract_with_strategy(url)
        .unwrap();
    assert_eq!(strategy, Strategy::DmsPlace);
    assert_eq!(point.as_pair(), [105.75, 21.5]);
}

#[test]
fn query_param_beats_everything_regardless_of_position() {
    let url = "https://www.google.com/maps/place/X/@10.0,106.0,17z/data=!3d10.1!4d106.1?q=21.0285,105.8542";
    let (strategy, point) = CoordinateExtractor::default()
        .extract_with_strategy(url)
        .unwrap();
    assert_eq!(strategy, Strategy::QueryParam);
    assert_eq!(point.as_pair(), [105.8542, 21.0285]);
}

// ---------------------------------------------------------------------------
// Range validation
// ---------------------------------------------------------------------------

#[test]
fn out_of_range_query_falls_through_to_next_strategy() {
    let url = "https://www.google.com/maps/place/X/data=!3d21.0285!4d105.8542?q=200,105.8542";
    let (strategy, point) = CoordinateExtractor::default()
        .extract_with_strategy(url)
        .unwrap();
    assert_eq!(strategy, Strategy::DataBlock);
    assert_eq!(point.as_pair(), [105.8542, 21.0285]);
}

#[test]
fn out_of_range_everywhere_is_not_found() {
    let url = "https://www.google.com/maps/@200.5,105.8,15z";
    assert!(CoordinateExtractor::default().extract(url).is_none());
}

// ---------------------------------------------------------------------------
// Normalization hook
// ---------------------------------------------------------------------------

#[test]
fn enabled_datum_correction_is_applied_to_results() {
    let corrected = CoordinateExtractor::new(DatumNormalizer::new(DatumConfig {
        correction_enabled: true,
        ..DatumConfig::default()
    }));
    let url = "https://maps.google.com/?q=21.0285,105.8542";
    let point = corrected.extract(url).unwrap();
    assert_ne!(point.as_pair(), [105.8542, 21.0285]);
}
