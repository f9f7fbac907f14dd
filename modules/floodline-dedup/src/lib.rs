//! Duplicate detection for incoming flood reports.
//!
//! Pure scoring (`phone`, `text`, `scorer`) feeds the classifier, which ranks
//! candidates from one bounded window read. Every failure inside this crate
//! degrades to "no duplicate found"; detection never blocks a submission.

pub mod classifier;
pub mod phone;
pub mod response;
pub mod scorer;
pub mod text;
pub mod window;

pub use classifier::{DuplicateClassifier, DuplicateDetector, Thresholds};
pub use response::{DuplicateResponse, DuplicateSummary, ReportSnapshot};
pub use scorer::SimilarityScorer;
pub use window::{CandidateWindow, MemoryCandidateWindow, WindowPolicy};
