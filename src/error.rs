use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a hex color: {0:?}")]
    InvalidColor(String),
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output available: {0}")]
    Unavailable(String),
    #[error("playback failed: {0}")]
    Playback(String),
}
