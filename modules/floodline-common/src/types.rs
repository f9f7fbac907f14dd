use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

// --- Geo Types ---

/// A WGS84 coordinate. Construct through [`GeoPoint::new`] so the range
/// invariant holds; values that arrive through serde are re-checked with
/// [`GeoPoint::is_valid`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Longitude-first, returns `None` when either value is out of range or not finite.
    pub fn new(lng: f64, lat: f64) -> Option<Self> {
        let point = Self { lng, lat };
        point.is_valid().then_some(point)
    }

    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// `[lng, lat]`, the order every map renderer downstream expects.
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Mean Earth radius used for every distance in the pipeline.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine great-circle distance between two points in meters.
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1_r = a.lat.to_radians();
    let lat2_r = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_METERS * c
}

/// Unparsed location input handed to the coordinate extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationHint {
    MapServiceUrl { url: String },
    DmsString { text: String },
    RawPair { lng: f64, lat: f64 },
}

// --- Reports ---

/// A citizen submission as the HTTP layer hands it to the core.
///
/// `coords` may be filled in later by a deferred place-name lookup outside
/// the core; nothing here mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct IncomingReport {
    #[builder(default, setter(into))]
    #[serde(default)]
    pub raw_text: String,
    #[builder(default, setter(into))]
    #[serde(default)]
    pub description: String,
    /// Ordered; the first entry is the primary contact.
    #[builder(default)]
    #[serde(default, alias = "phoneNumbers")]
    pub contact_phones: Vec<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, rename = "sourceURL", alias = "sourceUrl")]
    pub source_url: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub coords: Option<GeoPoint>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub location_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IncomingReport {
    /// The structured description when present, otherwise the raw submission.
    pub fn text_body(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.raw_text
        } else {
            &self.description
        }
    }

    pub fn primary_phone(&self) -> Option<&str> {
        self.contact_phones.first().map(String::as_str)
    }
}

/// Read-only snapshot of a previously stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateReport {
    pub id: Uuid,
    #[serde(flatten)]
    pub report: IncomingReport,
}

impl CandidateReport {
    pub fn new(id: Uuid, report: IncomingReport) -> Self {
        Self { id, report }
    }
}

// --- Match signals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchChannel {
    SourceIdentity,
    ContactIdentity,
    TextContent,
    Spatiotemporal,
}

impl std::fmt::Display for MatchChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchChannel::SourceIdentity => write!(f, "source_identity"),
            MatchChannel::ContactIdentity => write!(f, "contact_identity"),
            MatchChannel::TextContent => write!(f, "text_content"),
            MatchChannel::Spatiotemporal => write!(f, "spatiotemporal"),
        }
    }
}

/// One piece of evidence that two reports describe the same emergency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSignal {
    pub channel: MatchChannel,
    /// Contribution to the additive aggregate, in [0, 1].
    pub weight: f64,
    /// Operator-facing explanation, e.g. "120 m apart".
    pub reason: String,
}

impl MatchSignal {
    pub fn new(channel: MatchChannel, weight: f64, reason: impl Into<String>) -> Self {
        Self {
            channel,
            weight: weight.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }
}

/// A surfaced candidate with its aggregate and the signals behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub candidate: CandidateReport,
    pub aggregate_score: f64,
    pub signals: Vec<MatchSignal>,
}

impl RankedMatch {
    pub fn reasons(&self) -> Vec<String> {
        self.signals.iter().map(|s| s.reason.clone()).collect()
    }
}

/// Maximum number of ranked matches carried in a verdict.
pub const MAX_RANKED_MATCHES: usize = 5;

/// Advisory outcome of a duplicate check. Computed per call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateVerdict {
    pub is_duplicate: bool,
    pub aggregate_score: f64,
    pub ranked_matches: Vec<RankedMatch>,
}

impl DuplicateVerdict {
    /// The fail-open verdict: nothing detected.
    pub fn empty() -> Self {
        Self {
            is_duplicate: false,
            aggregate_score: 0.0,
            ranked_matches: Vec::new(),
        }
    }

    pub fn best(&self) -> Option<&RankedMatch> {
        self.ranked_matches.first()
    }
}
