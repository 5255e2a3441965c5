use thiserror::Error;

/// Failures surfaced to the editor. `Timeout` and `BackendCrashed` are
/// retriable; everything else passes through from the engine unchanged.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout took too long, try a smaller selection")]
    Timeout,
    #[error("layout backend crashed, please retry")]
    BackendCrashed,
    #[error("layout engine error: {0}")]
    Engine(String),
    #[error("failed to start layout backend: {0}")]
    Spawn(#[from] std::io::Error),
}

impl LayoutError {
    /// Whether the caller may retry the same request as-is.
    pub fn is_retriable(&self) -> bool {
        matches!(self, LayoutError::Timeout | LayoutError::BackendCrashed)
    }
}
