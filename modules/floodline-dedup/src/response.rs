use chrono::{DateTime, Utc};
use floodline_common::{DuplicateVerdict, GeoPoint, RankedMatch};
use serde::Serialize;
use uuid::Uuid;

const DESCRIPTION_PREVIEW_CHARS: usize = 120;

/// Wire shape of a verdict as returned to the submission layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateResponse {
    pub is_duplicate: bool,
    pub aggregate_score: f64,
    pub duplicates: Vec<DuplicateSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSummary {
    pub candidate_id: Uuid,
    pub aggregate_score: f64,
    pub match_reasons: Vec<String>,
    pub snapshot: ReportSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    pub location_text: Option<String>,
    pub description_preview: String,
    pub contact_phone: Option<String>,
    pub coords: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

impl DuplicateResponse {
    pub fn from_verdict(verdict: &DuplicateVerdict) -> Self {
        Self {
            is_duplicate: verdict.is_duplicate,
            aggregate_score: verdict.aggregate_score,
            duplicates: verdict.ranked_matches.iter().map(DuplicateSummary::from).collect(),
        }
    }
}

impl From<&RankedMatch> for DuplicateSummary {
    fn from(m: &RankedMatch) -> Self {
        let stored = &m.candidate.report;
        Self {
            candidate_id: m.candidate.id,
            aggregate_score: m.aggregate_score,
            match_reasons: m.reasons(),
            snapshot: ReportSnapshot {
                location_text: stored.location_text.clone(),
                description_preview: preview(stored.text_body()),
                contact_phone: stored.primary_phone().map(str::to_string),
                coords: stored.coords,
                created_at: stored.created_at,
            },
        }
    }
}

fn preview(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
