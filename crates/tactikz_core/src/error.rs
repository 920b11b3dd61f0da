use thiserror::Error;

/// Errors produced by the timeline engine.
///
/// Only `MalformedData` is fatal, and only to the load attempt that raised
/// it: the engine keeps whatever match was loaded before. The other kinds
/// are recoverable and are expected to be handled by clamping or by showing
/// a no-op to the user.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("malformed match data: {0}")]
    MalformedData(String),

    #[error("time {t:.3}s outside loaded range [{start:.3}, {end:.3}]")]
    OutOfRange { t: f64, start: f64, end: f64 },

    #[error("no active timeline: {0}")]
    NoActiveTimeline(String),
}

impl EngineError {
    /// Whether the caller can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::MalformedData(_) => false,
            EngineError::OutOfRange { .. } => true,
            EngineError::NoActiveTimeline(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
