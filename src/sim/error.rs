//! Failure kinds surfaced by a simulation run.

use thiserror::Error;

/// A single violated configuration constraint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"converter.Ton_us"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the same error with `prefix.` prepended to the field path.
    pub fn within(mut self, prefix: &str) -> Self {
        self.field = format!("{prefix}.{}", self.field);
        self
    }
}

/// Error returned by [`crate::sim::engine::run_simulation`].
///
/// Exactly one kind is reported per run. Neither kind carries a partial
/// result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Raised before the first step when an input invariant does not hold.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Raised mid-run when the bus state stops being finite or exceeds
    /// the sanity bound.
    #[error("numerical error at step {step} (t={time_s:.6e} s): {reason}")]
    Numerical {
        step: u64,
        time_s: f64,
        reason: String,
    },
}

impl SimError {
    /// Stable failure code for callers that map errors onto a status.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Numerical { .. } => "numerical",
        }
    }
}
