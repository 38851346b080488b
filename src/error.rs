use thiserror::Error;

/// Errors raised while building a chart timeline.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("measure index {measure} exceeds the supported maximum of {max}")]
    MeasureOutOfRange { measure: u32, max: usize },

    #[error("initial tempo must be finite and positive, got {bpm}")]
    InvalidInitialTempo { bpm: f64 },
}

/// Errors raised while constructing a play session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("judge difficulty is neither declared by the chart nor supplied by the caller")]
    UnresolvedJudgeConfig,

    #[error("playback rate modifier must be finite and positive, got {rate}")]
    InvalidPlaybackRate { rate: f64 },

    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// Errors raised while encoding or decoding a replay log.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("command stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("command stream base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}
