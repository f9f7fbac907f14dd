//! Per-channel similarity between a new report and one stored candidate.
//!
//! Each channel yields zero or more [`MatchSignal`]s with a weight on the
//! additive scale the classifier thresholds are tuned against. A channel
//! whose inputs are missing on either side stays silent.

use chrono::Duration;
use floodline_common::{
    haversine_meters, CandidateReport, FloodlineError, GeoPoint, IncomingReport, MatchChannel,
    MatchSignal,
};

use crate::phone::{self, PhoneMatch};
use crate::text;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

const SOURCE_MATCH_WEIGHT: f64 = 1.0;

const PHONE_EXACT_WEIGHT: f64 = 0.6;
const PHONE_PARTIAL_WEIGHT: f64 = 0.3;

/// Below this the text channel contributes nothing.
const TEXT_MIN_SIMILARITY: f64 = 0.6;
/// At or above this the text channel switches to the steep multiplier.
const TEXT_HIGH_SIMILARITY: f64 = 0.85;
const TEXT_HIGH_MULTIPLIER: f64 = 0.5;
const TEXT_LOW_MULTIPLIER: f64 = 0.2;

const TIGHT_RADIUS_METERS: f64 = 100.0;
const TIGHT_RADIUS_WEIGHT: f64 = 0.4;
const LOOSE_RADIUS_METERS: f64 = 500.0;
const LOOSE_RADIUS_WEIGHT: f64 = 0.2;
const LOCATION_TEXT_WEIGHT: f64 = 0.2;

const TIME_GAP_MINUTES: i64 = 30;
const TIME_GAP_WEIGHT: f64 = 0.1;

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    country_code: String,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new("84")
    }
}

impl SimilarityScorer {
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
        }
    }

    /// Every signal linking `report` to `candidate`.
    ///
    /// Fails only when the stored candidate itself is unusable, so the caller
    /// can skip it and keep scoring the rest.
    pub fn score(
        &self,
        report: &IncomingReport,
        candidate: &CandidateReport,
    ) -> Result<Vec<MatchSignal>, FloodlineError> {
        let stored = &candidate.report;
        if let Some(coords) = &stored.coords {
            if !coords.is_valid() {
                return Err(FloodlineError::MalformedCandidate {
                    id: candidate.id,
                    reason: format!("coordinate out of range: ({}, {})", coords.lng, coords.lat),
                });
            }
        }

        let mut signals = Vec::new();
        signals.extend(source_identity(report, stored));
        signals.extend(self.contact_identity(report, stored));
        signals.extend(text_content(report, stored));
        signals.extend(spatial_proximity(report, stored));
        signals.extend(temporal_proximity(report, stored));
        Ok(signals)
    }

    fn contact_identity(&self, a: &IncomingReport, b: &IncomingReport) -> Option<MatchSignal> {
        match phone::best_match(&a.contact_phones, &b.contact_phones, &self.country_code)? {
            PhoneMatch::Exact => Some(MatchSignal::new(
                MatchChannel::ContactIdentity,
                PHONE_EXACT_WEIGHT,
                "same contact phone",
            )),
            PhoneMatch::Partial => Some(MatchSignal::new(
                MatchChannel::ContactIdentity,
                PHONE_PARTIAL_WEIGHT,
                "similar contact phone",
            )),
        }
    }
}

/// Sum of signal weights. Deliberately unbounded above 1.0.
pub fn aggregate(signals: &[MatchSignal]) -> f64 {
    signals.iter().map(|s| s.weight).sum()
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn source_identity(a: &IncomingReport, b: &IncomingReport) -> Option<MatchSignal> {
    let left = non_empty(a.source_url.as_ref())?;
    let right = non_empty(b.source_url.as_ref())?;
    (left == right).then(|| {
        MatchSignal::new(MatchChannel::SourceIdentity, SOURCE_MATCH_WEIGHT, "same source link")
    })
}

/// Descriptions only when both sides have one; otherwise both raw texts.
fn compared_texts<'a>(a: &'a IncomingReport, b: &'a IncomingReport) -> (&'a str, &'a str) {
    let described = |r: &IncomingReport| !r.description.trim().is_empty();
    if described(a) && described(b) {
        (&a.description, &b.description)
    } else {
        (&a.raw_text, &b.raw_text)
    }
}

fn text_content(a: &IncomingReport, b: &IncomingReport) -> Option<MatchSignal> {
    let (left, right) = compared_texts(a, b);
    let similarity = text::comparable_similarity(left, right)?;
    let multiplier = if similarity >= TEXT_HIGH_SIMILARITY {
        TEXT_HIGH_MULTIPLIER
    } else if similarity >= TEXT_MIN_SIMILARITY {
        TEXT_LOW_MULTIPLIER
    } else {
        return None;
    };
    Some(MatchSignal::new(
        MatchChannel::TextContent,
        multiplier * similarity,
        format!("{:.0}% text overlap", similarity * 100.0),
    ))
}

fn spatial_proximity(a: &IncomingReport, b: &IncomingReport) -> Option<MatchSignal> {
    let left = a.coords.filter(GeoPoint::is_valid);
    let right = b.coords.filter(GeoPoint::is_valid);

    match (left, right) {
        (Some(l), Some(r)) => {
            let meters = haversine_meters(&l, &r);
            let weight = if meters <= TIGHT_RADIUS_METERS {
                TIGHT_RADIUS_WEIGHT
            } else if meters <= LOOSE_RADIUS_METERS {
                LOOSE_RADIUS_WEIGHT
            } else {
                return None;
            };
            Some(MatchSignal::new(
                MatchChannel::Spatiotemporal,
                weight,
                format!("{meters:.0} m apart"),
            ))
        }
        _ => {
            let left = non_empty(a.location_text.as_ref())?;
            let right = non_empty(b.location_text.as_ref())?;
            text::location_text_matches(left, right).then(|| {
                MatchSignal::new(
                    MatchChannel::Spatiotemporal,
                    LOCATION_TEXT_WEIGHT,
                    "same location description",
                )
            })
        }
    }
}

fn temporal_proximity(a: &IncomingReport, b: &IncomingReport) -> Option<MatchSignal> {
    let gap = (a.created_at - b.created_at).abs();
    (gap <= Duration::minutes(TIME_GAP_MINUTES)).then(|| {
        MatchSignal::new(
            MatchChannel::Spatiotemporal,
            TIME_GAP_WEIGHT,
            format!("reported {} min apart", gap.num_minutes()),
        )
    })
}
