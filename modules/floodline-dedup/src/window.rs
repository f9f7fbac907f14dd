//! Candidate window: the bounded set of recent stored reports a new
//! submission is compared against.
//!
//! Storage lives behind `CandidateWindow`; the time/count policy lives here in
//! `WindowPolicy` so every backend is bounded the same way.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use floodline_common::{CandidateReport, DedupConfig, FloodlineError};
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// CandidateWindow — storage seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CandidateWindow: Send + Sync {
    /// Reports created at or after `since`, newest first, at most `limit`.
    /// One non-transactional read; concurrent writes may or may not be visible.
    async fn recent_reports(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<CandidateReport>>;
}

// ---------------------------------------------------------------------------
// WindowPolicy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPolicy {
    pub window: Duration,
    pub max_candidates: usize,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            window: Duration::hours(2),
            max_candidates: 50,
        }
    }
}

impl WindowPolicy {
    pub fn from_config(config: &DedupConfig) -> Result<Self, FloodlineError> {
        let window = Duration::try_minutes(config.window_minutes)
            .filter(|w| *w > Duration::zero())
            .ok_or_else(|| {
                FloodlineError::Config(format!(
                    "window of {} minutes is not a usable duration",
                    config.window_minutes
                ))
            })?;
        Ok(Self {
            window,
            max_candidates: config.max_candidates,
        })
    }

    /// Start of the window. Saturates at the earliest representable instant.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Re-apply the bounds to whatever a provider returned: keep only reports
    /// created within `[since, now]`, then the newest `max_candidates`.
    pub fn apply(&self, now: DateTime<Utc>, mut candidates: Vec<CandidateReport>) -> Vec<CandidateReport> {
        let since = self.since(now);
        candidates.retain(|c| (since..=now).contains(&c.report.created_at));
        candidates.sort_by(|a, b| b.report.created_at.cmp(&a.report.created_at));
        candidates.truncate(self.max_candidates);
        candidates
    }
}

// ---------------------------------------------------------------------------
// MemoryCandidateWindow
// ---------------------------------------------------------------------------

/// In-memory report store. Backs the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryCandidateWindow {
    reports: RwLock<Vec<CandidateReport>>,
}

impl MemoryCandidateWindow {
    pub fn new(reports: Vec<CandidateReport>) -> Self {
        Self {
            reports: RwLock::new(reports),
        }
    }

    pub async fn insert(&self, report: CandidateReport) {
        self.reports.write().await.push(report);
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }
}

#[async_trait]
impl CandidateWindow for MemoryCandidateWindow {
    async fn recent_reports(&self, since: DateTime<Utc>, limit: usize) -> Result<Vec<CandidateReport>> {
        let reports = self.reports.read().await;
        let mut recent: Vec<CandidateReport> = reports
            .iter()
            .filter(|c| c.report.created_at >= since)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.report.created_at.cmp(&a.report.created_at));
        recent.truncate(limit);
        Ok(recent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use floodline_common::IncomingReport;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn aged(minutes: i64) -> CandidateReport {
        CandidateReport::new(
            Uuid::new_v4(),
            IncomingReport::builder()
                .raw_text(format!("{minutes} minutes old"))
                .created_at(now() - Duration::minutes(minutes))
                .build(),
        )
    }

    #[test]
    fn default_policy_is_two_hours_fifty_reports() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.window, Duration::hours(2));
        assert_eq!(policy.max_candidates, 50);
        assert_eq!(WindowPolicy::from_config(&DedupConfig::default()).unwrap(), policy);
    }

    #[test]
    fn apply_drops_old_and_keeps_newest() {
        let policy = WindowPolicy {
            window: Duration::minutes(60),
            max_candidates: 2,
        };
        let kept = policy.apply(now(), vec![aged(50), aged(90), aged(5), aged(20)]);
        let texts: Vec<&str> = kept.iter().map(|c| c.report.raw_text.as_str()).collect();
        assert_eq!(texts, vec!["5 minutes old", "20 minutes old"]);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let policy = WindowPolicy {
            window: Duration::minutes(60),
            max_candidates: 10,
        };
        assert_eq!(policy.apply(now(), vec![aged(60)]).len(), 1);
        assert!(policy.apply(now(), vec![aged(61)]).is_empty());
    }

    #[test]
    fn future_dated_reports_are_dropped() {
        let policy = WindowPolicy::default();
        let at_now = aged(0);
        let skewed = aged(-3 * 24 * 60);
        let just_ahead = aged(-1);

        let kept = policy.apply(now(), vec![skewed, at_now.clone(), just_ahead]);
        assert_eq!(kept, vec![at_now]);
    }

    #[test]
    fn unrepresentable_window_is_a_config_error() {
        let config = DedupConfig {
            window_minutes: i64::MAX,
            ..DedupConfig::default()
        };
        assert!(matches!(
            WindowPolicy::from_config(&config),
            Err(FloodlineError::Config(_))
        ));
    }

    #[test]
    fn since_saturates_instead_of_overflowing() {
        let policy = WindowPolicy {
            window: Duration::try_days(365 * 1_000_000).unwrap(),
            max_candidates: 10,
        };
        assert_eq!(policy.since(now()), DateTime::<Utc>::MIN_UTC);
        assert_eq!(policy.apply(now(), vec![aged(60 * 24 * 365 * 100)]).len(), 1);
    }

    #[tokio::test]
    async fn memory_window_filters_and_limits() {
        let store = MemoryCandidateWindow::new(vec![aged(150), aged(30), aged(10)]);
        store.insert(aged(1)).await;
        assert_eq!(store.len().await, 4);

        let recent = store
            .recent_reports(now() - Duration::minutes(120), 2)
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].report.raw_text, "1 minutes old");
        assert_eq!(recent[1].report.raw_text, "10 minutes old");
    }
}
