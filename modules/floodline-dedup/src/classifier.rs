//! Two-tier duplicate verdicts.
//!
//! Per candidate: sum the signal weights. Anything above the surfacing
//! threshold is shown to operators as "possible duplicate"; the report is
//! flagged as a duplicate only when the best aggregate also clears the
//! stricter duplicate threshold. Neither tier blocks submission.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use floodline_common::{
    CandidateReport, DedupConfig, DuplicateVerdict, FloodlineError, IncomingReport, RankedMatch,
    MAX_RANKED_MATCHES,
};
use tracing::{debug, error, info, warn};

use crate::scorer::{aggregate, SimilarityScorer};
use crate::window::{CandidateWindow, WindowPolicy};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Aggregates strictly above this are surfaced for review.
    pub surfacing: f64,
    /// Best aggregate strictly above this marks the report as a duplicate.
    pub duplicate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            surfacing: 0.3,
            duplicate: 0.7,
        }
    }
}

impl Thresholds {
    pub fn new(surfacing: f64, duplicate: f64) -> Result<Self, FloodlineError> {
        if !(surfacing.is_finite() && duplicate.is_finite()) || surfacing < 0.0 {
            return Err(FloodlineError::Config(format!(
                "thresholds must be finite and non-negative, got surfacing={surfacing} duplicate={duplicate}"
            )));
        }
        if duplicate <= surfacing {
            return Err(FloodlineError::Config(format!(
                "duplicate threshold ({duplicate}) must be above surfacing threshold ({surfacing})"
            )));
        }
        Ok(Self { surfacing, duplicate })
    }
}

// ---------------------------------------------------------------------------
// DuplicateClassifier — pure ranking over a given candidate set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DuplicateClassifier {
    scorer: SimilarityScorer,
    thresholds: Thresholds,
}

impl DuplicateClassifier {
    pub fn new(scorer: SimilarityScorer, thresholds: Thresholds) -> Self {
        Self { scorer, thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Score every candidate, keep the surfaced ones, rank them.
    ///
    /// A candidate that cannot be scored is logged and skipped.
    pub fn classify(&self, report: &IncomingReport, candidates: &[CandidateReport]) -> DuplicateVerdict {
        let mut ranked: Vec<RankedMatch> = Vec::new();

        for candidate in candidates {
            let signals = match self.scorer.score(report, candidate) {
                Ok(signals) => signals,
                Err(e) => {
                    warn!(candidate_id = %candidate.id, error = %e, "Skipping malformed candidate");
                    continue;
                }
            };

            let score = aggregate(&signals);
            debug!(candidate_id = %candidate.id, score, signals = signals.len(), "Candidate scored");

            if score > self.thresholds.surfacing {
                ranked.push(RankedMatch {
                    candidate: candidate.clone(),
                    aggregate_score: score,
                    signals,
                });
            }
        }

        // Stable: equal scores keep the provider's newest-first order.
        ranked.sort_by(|a, b| b.aggregate_score.total_cmp(&a.aggregate_score));
        ranked.truncate(MAX_RANKED_MATCHES);

        let best = ranked.first().map(|m| m.aggregate_score).unwrap_or(0.0);
        DuplicateVerdict {
            is_duplicate: best > self.thresholds.duplicate,
            aggregate_score: best,
            ranked_matches: ranked,
        }
    }
}

// ---------------------------------------------------------------------------
// DuplicateDetector — window read + classification, fail-open
// ---------------------------------------------------------------------------

/// Composes one bounded window read with the classifier.
///
/// The read and the caller's later write are not isolated: two reports of
/// the same emergency checked before either is stored can both come back
/// `is_duplicate: false`.
pub struct DuplicateDetector {
    classifier: DuplicateClassifier,
    policy: WindowPolicy,
    window: Arc<dyn CandidateWindow>,
}

impl DuplicateDetector {
    pub fn new(
        classifier: DuplicateClassifier,
        policy: WindowPolicy,
        window: Arc<dyn CandidateWindow>,
    ) -> Self {
        Self {
            classifier,
            policy,
            window,
        }
    }

    pub fn from_config(
        config: &DedupConfig,
        window: Arc<dyn CandidateWindow>,
    ) -> Result<Self, FloodlineError> {
        let thresholds = Thresholds::new(config.surfacing_threshold, config.duplicate_threshold)?;
        Ok(Self::new(
            DuplicateClassifier::new(SimilarityScorer::new(config.country_code.clone()), thresholds),
            WindowPolicy::from_config(config)?,
            window,
        ))
    }

    pub fn classifier(&self) -> &DuplicateClassifier {
        &self.classifier
    }

    /// Advisory duplicate check. Never fails: if the window cannot be read
    /// the empty verdict is returned and the cause goes to the log only.
    pub async fn check(&self, report: &IncomingReport, now: DateTime<Utc>) -> DuplicateVerdict {
        let candidates = match self.fetch(now).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(error = %e, "Duplicate check skipped, candidate window unavailable");
                return DuplicateVerdict::empty();
            }
        };

        let verdict = self.classifier.classify(report, &candidates);
        info!(
            candidates = candidates.len(),
            surfaced = verdict.ranked_matches.len(),
            is_duplicate = verdict.is_duplicate,
            best_score = verdict.aggregate_score,
            "Duplicate check complete"
        );
        verdict
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<CandidateReport>, FloodlineError> {
        let since = self.policy.since(now);
        let raw = self
            .window
            .recent_reports(since, self.policy.max_candidates)
            .await
            .map_err(|e| FloodlineError::UpstreamUnavailable(format!("{e:#}")))?;
        Ok(self.policy.apply(now, raw))
    }
}
