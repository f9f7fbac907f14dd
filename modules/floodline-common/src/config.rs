use std::env;
use std::str::FromStr;

use tracing::info;

use crate::error::FloodlineError;

/// Datum correction toggles. Both default to disabled and are switched on
/// per deployment after checking pins against local ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DatumConfig {
    pub correction_enabled: bool,
    pub manual_offset_enabled: bool,
    pub manual_offset_lng: f64,
    pub manual_offset_lat: f64,
}

/// Duplicate detection tunables, tuned against the additive score scale.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    pub window_minutes: i64,
    pub max_candidates: usize,
    pub surfacing_threshold: f64,
    pub duplicate_threshold: f64,
    /// International dialing code stripped to a national trunk `0`.
    pub country_code: String,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_minutes: 120,
            max_candidates: 50,
            surfacing_threshold: 0.3,
            duplicate_threshold: 0.7,
            country_code: "84".to_string(),
        }
    }
}

/// Longest accepted candidate window: seven days.
pub const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Application configuration loaded from environment variables.
/// Every variable is optional; unset ones fall back to the defaults above.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub datum: DatumConfig,
    pub dedup: DedupConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, FloodlineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` delegates here so tests
    /// never touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FloodlineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DedupConfig::default();

        let datum = DatumConfig {
            correction_enabled: parse_or(&lookup, "FLOODLINE_DATUM_CORRECTION", false)?,
            manual_offset_enabled: parse_or(&lookup, "FLOODLINE_MANUAL_OFFSET", false)?,
            manual_offset_lng: parse_or(&lookup, "FLOODLINE_MANUAL_OFFSET_LNG", 0.0)?,
            manual_offset_lat: parse_or(&lookup, "FLOODLINE_MANUAL_OFFSET_LAT", 0.0)?,
        };

        let dedup = DedupConfig {
            window_minutes: parse_or(&lookup, "FLOODLINE_WINDOW_MINUTES", defaults.window_minutes)?,
            max_candidates: parse_or(&lookup, "FLOODLINE_MAX_CANDIDATES", defaults.max_candidates)?,
            surfacing_threshold: parse_or(
                &lookup,
                "FLOODLINE_SURFACING_THRESHOLD",
                defaults.surfacing_threshold,
            )?,
            duplicate_threshold: parse_or(
                &lookup,
                "FLOODLINE_DUPLICATE_THRESHOLD",
                defaults.duplicate_threshold,
            )?,
            country_code: lookup("FLOODLINE_COUNTRY_CODE").unwrap_or(defaults.country_code),
        };

        if !(1..=MAX_WINDOW_MINUTES).contains(&dedup.window_minutes) {
            return Err(FloodlineError::Config(format!(
                "FLOODLINE_WINDOW_MINUTES must be between 1 and {MAX_WINDOW_MINUTES}, got {}",
                dedup.window_minutes
            )));
        }
        if !dedup.country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(FloodlineError::Config(format!(
                "FLOODLINE_COUNTRY_CODE must be digits, got {:?}",
                dedup.country_code
            )));
        }

        Ok(Self { datum, dedup })
    }

    pub fn log_summary(&self) {
        info!(
            datum_correction = self.datum.correction_enabled,
            manual_offset = self.datum.manual_offset_enabled,
            manual_offset_lng = self.datum.manual_offset_lng,
            manual_offset_lat = self.datum.manual_offset_lat,
            window_minutes = self.dedup.window_minutes,
            max_candidates = self.dedup.max_candidates,
            surfacing_threshold = self.dedup.surfacing_threshold,
            duplicate_threshold = self.dedup.duplicate_threshold,
            country_code = %self.dedup.country_code,
            "Floodline configuration loaded"
        );
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, FloodlineError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| FloodlineError::Config(format!("{key} has an invalid value: {raw:?}"))),
        _ => Ok(default),
    }
}
