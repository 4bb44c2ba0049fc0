//! Client-facing rejection shared by every plugin operation.
//!
//! The contract deliberately exposes a single failure kind: whatever goes
//! wrong inside an operation — a missing upload, a filesystem fault, an
//! archive failure — reaches the host as a [`BadRequest`] carrying the
//! original failure's description as its reason. The host maps the
//! rejection onto an HTTP 400-equivalent response; no structured code
//! distinguishes causes.

use thiserror::Error;

/// Rejection returned to the host when a plugin operation cannot complete.
///
/// # Example
///
/// ```
/// use heron_plugin_api::BadRequest;
///
/// let rejection = BadRequest::new("input file missing");
/// assert_eq!(rejection.reason(), "input file missing");
/// assert_eq!(rejection.to_string(), "bad request: input file missing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad request: {reason}")]
pub struct BadRequest {
    reason: String,
}

impl BadRequest {
    /// Creates a rejection with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Translates an internal failure into a rejection, preserving its
    /// rendered description as the reason.
    #[must_use]
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self {
            reason: error.to_string(),
        }
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub const fn reason(&self) -> &str {
        self.reason.as_str()
    }
}

/// Runs an operation and translates any failure into a [`BadRequest`].
///
/// This is the explicit error boundary wrapped around each fallible plugin
/// entry point: inside the closure, errors keep their structured form; past
/// it, only the single client-facing kind remains.
///
/// # Errors
///
/// Returns [`BadRequest`] when the operation fails, with the failure's
/// rendered description as the reason.
///
/// # Example
///
/// ```
/// use heron_plugin_api::error::guard;
///
/// let parsed = guard(|| "7".parse::<u32>());
/// assert_eq!(parsed, Ok(7));
///
/// let rejected = guard(|| "seven".parse::<u32>());
/// assert!(rejected.is_err());
/// ```
pub fn guard<T, E>(operation: impl FnOnce() -> Result<T, E>) -> Result<T, BadRequest>
where
    E: std::error::Error,
{
    operation().map_err(|error| BadRequest::from_error(&error))
}
