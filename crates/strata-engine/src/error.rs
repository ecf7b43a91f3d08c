//! Error types for control-plane operations.

use strata_effects::eq::EqError;
use thiserror::Error;

/// Errors returned by the [`Controller`](crate::Controller).
///
/// The audio thread never produces errors; everything that can fail is
/// checked before a command is queued.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Sample rate is not a positive finite number.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// Maximum block size is zero.
    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    /// The strip settings could not be designed.
    #[error("strip settings rejected: {0}")]
    Design(#[from] EqError),

    /// The command queue is full; the processor has not drained it yet.
    #[error("command queue full")]
    QueueFull,

    /// The processor has been dropped.
    #[error("processor disconnected")]
    Disconnected,
}
