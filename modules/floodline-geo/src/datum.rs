//! Vendor-datum correction.
//!
//! Some map vendors publish coordinates inside one territory in an obfuscated
//! datum that sits tens to hundreds of meters away from WGS84. The published
//! empirical correction is a trigonometric series over the offset from a
//! fixed reference point, scaled by the Krasovsky ellipsoid.
//!
//! `to_standard_datum` and `to_vendor_datum` each evaluate the series at
//! their *input* point, so applying one after the other does not return the
//! starting coordinate exactly. That drift is part of the published formula.

use std::f64::consts::PI;

use floodline_common::{DatumConfig, GeoPoint};
use tracing::debug;

/// Krasovsky 1940 semi-major axis, meters.
const SEMI_MAJOR_AXIS: f64 = 6_378_245.0;
/// Krasovsky 1940 squared eccentricity.
const ECCENTRICITY_SQ: f64 = 0.006_693_421_622_965_943_23;
/// Reference point the series is expanded around.
const REFERENCE_LNG: f64 = 105.0;
const REFERENCE_LAT: f64 = 35.0;

/// Decides whether a point lies where the vendor datum is in effect.
pub trait RegionTest: Send + Sync {
    fn contains(&self, point: &GeoPoint) -> bool;
}

impl<F> RegionTest for F
where
    F: Fn(&GeoPoint) -> bool + Send + Sync,
{
    fn contains(&self, point: &GeoPoint) -> bool {
        self(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// The vendor's published territory box.
    pub const VENDOR_TERRITORY: BoundingBox = BoundingBox {
        min_lng: 72.004,
        max_lng: 137.8347,
        min_lat: 0.8293,
        max_lat: 55.8271,
    };
}

impl RegionTest for BoundingBox {
    fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lng..=self.max_lng).contains(&point.lng)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }
}

fn series_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn series_lng(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// Offset (d_lng, d_lat) in degrees between the vendor datum and WGS84 at `point`.
fn datum_offset(point: &GeoPoint) -> (f64, f64) {
    let x = point.lng - REFERENCE_LNG;
    let y = point.lat - REFERENCE_LAT;
    let rad_lat = point.lat.to_radians();
    let magic = 1.0 - ECCENTRICITY_SQ * rad_lat.sin().powi(2);
    let sqrt_magic = magic.sqrt();

    let d_lat = (series_lat(x, y) * 180.0)
        / ((SEMI_MAJOR_AXIS * (1.0 - ECCENTRICITY_SQ)) / (magic * sqrt_magic) * PI);
    let d_lng = (series_lng(x, y) * 180.0) / (SEMI_MAJOR_AXIS / sqrt_magic * rad_lat.cos() * PI);
    (d_lng, d_lat)
}

/// Vendor datum → WGS84 for a point inside `region`; anything else passes through.
pub fn to_standard_datum(point: GeoPoint, region: &impl RegionTest) -> GeoPoint {
    if !region.contains(&point) {
        return point;
    }
    let (d_lng, d_lat) = datum_offset(&point);
    GeoPoint::new(point.lng - d_lng, point.lat - d_lat).unwrap_or(point)
}

/// WGS84 → vendor datum for a point inside `region`; anything else passes through.
pub fn to_vendor_datum(point: GeoPoint, region: &impl RegionTest) -> GeoPoint {
    if !region.contains(&point) {
        return point;
    }
    let (d_lng, d_lat) = datum_offset(&point);
    GeoPoint::new(point.lng + d_lng, point.lat + d_lat).unwrap_or(point)
}

/// Applies the configured correction to every extracted coordinate.
#[derive(Debug, Clone, Copy)]
pub struct DatumNormalizer {
    config: DatumConfig,
    region: BoundingBox,
}

impl Default for DatumNormalizer {
    fn default() -> Self {
        Self::new(DatumConfig::default())
    }
}

impl DatumNormalizer {
    pub fn new(config: DatumConfig) -> Self {
        Self {
            config,
            region: BoundingBox::VENDOR_TERRITORY,
        }
    }

    pub fn with_region(mut self, region: BoundingBox) -> Self {
        self.region = region;
        self
    }

    pub fn config(&self) -> &DatumConfig {
        &self.config
    }

    /// Manual micro-offset first, then the datum correction. With both
    /// toggles off this is the identity.
    pub fn normalize(&self, point: GeoPoint) -> GeoPoint {
        let mut out = point;

        if self.config.manual_offset_enabled {
            out = GeoPoint::new(
                out.lng + self.config.manual_offset_lng,
                out.lat + self.config.manual_offset_lat,
            )
            .unwrap_or(out);
        }

        if self.config.correction_enabled {
            out = to_standard_datum(out, &self.region);
        }

        if out != point {
            debug!(
                from_lng = point.lng,
                from_lat = point.lat,
                to_lng = out.lng,
                to_lat = out.lat,
                "Datum normalization moved point"
            );
        }
        out
    }
}
