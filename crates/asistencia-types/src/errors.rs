use thiserror::Error;

pub type Result<T, E = AsistenciaError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum AsistenciaError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("camera error: {0}")]
    Camera(String),
    #[error("vision error: {0}")]
    Vision(String),
    #[error("reporter error: {0}")]
    Reporter(String),
    #[error("scanner error: {0}")]
    Scanner(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AsistenciaError {
    /// Camera failures are the only fatal class; they unwind the scan loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AsistenciaError::Camera(_))
    }
}
