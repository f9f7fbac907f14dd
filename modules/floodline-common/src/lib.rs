pub mod types;
pub mod config;
pub mod error;

pub use types::*;
pub use config::{Config, DatumConfig, DedupConfig, MAX_WINDOW_MINUTES};
pub use error::FloodlineError;
