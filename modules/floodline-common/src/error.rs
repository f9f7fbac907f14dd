use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FloodlineError {
    #[error("Malformed candidate {id}: {reason}")]
    MalformedCandidate { id: Uuid, reason: String },

    #[error("Candidate window unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
