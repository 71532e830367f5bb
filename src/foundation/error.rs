/// Convenience result type used across the pipeline.
pub type ReframeResult<T> = Result<T, ReframeError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Every variant is terminal for the job that produced it: the pipeline is
/// single-attempt, and the caller re-submits the source file as a brand-new
/// job if it wants to try again.
#[derive(thiserror::Error, Debug)]
pub enum ReframeError {
    /// No usable video track could be resolved from the source file.
    #[error("tracks unavailable: {0}")]
    TracksUnavailable(String),

    /// Source dimensions produced a degenerate (zero-area) crop.
    #[error("invalid frame geometry: {0}")]
    InvalidFrameGeometry(String),

    /// Composition assembly rejected a track's time range.
    #[error("track insertion failed: {0}")]
    TrackInsertionFailed(String),

    /// The encoder session could not be constructed.
    #[error("export session unavailable: {0}")]
    ExportSessionUnavailable(String),

    /// The asynchronous encode operation reported failure.
    #[error("export failed: {0}")]
    ExportFailed(String),

    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReframeError {
    /// Build a [`ReframeError::TracksUnavailable`] value.
    pub fn tracks_unavailable(msg: impl Into<String>) -> Self {
        Self::TracksUnavailable(msg.into())
    }

    /// Build a [`ReframeError::InvalidFrameGeometry`] value.
    pub fn invalid_frame_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidFrameGeometry(msg.into())
    }

    /// Build a [`ReframeError::TrackInsertionFailed`] value.
    pub fn track_insertion_failed(msg: impl Into<String>) -> Self {
        Self::TrackInsertionFailed(msg.into())
    }

    /// Build a [`ReframeError::ExportSessionUnavailable`] value.
    pub fn export_session_unavailable(msg: impl Into<String>) -> Self {
        Self::ExportSessionUnavailable(msg.into())
    }

    /// Build a [`ReframeError::ExportFailed`] value.
    pub fn export_failed(msg: impl Into<String>) -> Self {
        Self::ExportFailed(msg.into())
    }

    /// Build a [`ReframeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
