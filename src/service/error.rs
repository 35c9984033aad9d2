use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Validity must be a positive number of minutes, got {0}")]
    InvalidValidity(i64),
    #[error("Shortcode already exists: {0}")]
    ShortcodeTaken(String),
    #[error("Could not generate a free shortcode after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
    #[error("Storage failure: {0}")]
    Storage(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Shortcode not found")]
    NotFound,
    #[error("Short link has expired")]
    Expired,
    #[error("Failed to record click: {0}")]
    RecordingFailed(anyhow::Error),
    #[error("Storage failure: {0}")]
    Storage(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Shortcode not found")]
    NotFound,
    #[error("Storage failure: {0}")]
    Storage(anyhow::Error),
}
