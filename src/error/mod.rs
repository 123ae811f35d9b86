//! Error types for transitions and the host screen.
//!
//! Two of the transition errors are programmer errors (a second request for
//! an overlay that is still moving, or an index with nothing behind it) and are
//! always returned to the caller. `OrphanedInteraction` is recovered inside the
//! coordinator; it exists so the recovery can be logged with a typed reason.

use thiserror::Error;

use crate::transition::{Direction, OverlayId};

/// Errors raised by the transition coordinator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    /// A `begin_*` call arrived while the overlay still has a running transition.
    #[error("{requested} requested for {overlay} while a {active} transition is still running")]
    InvalidTransitionRequest {
        overlay: OverlayId,
        requested: Direction,
        active: Direction,
    },

    /// The interaction source vanished or stopped reporting mid-gesture.
    #[error("interaction source for {overlay} went away at progress {last_progress:.3}")]
    OrphanedInteraction { overlay: OverlayId, last_progress: f64 },

    /// An overlay was requested for an index that has no item behind it.
    #[error("no story at index {index} (strip has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl TransitionError {
    /// Returns true for errors that indicate a caller bug rather than a
    /// condition the coordinator recovers from on its own.
    pub fn is_programmer_error(&self) -> bool {
        !matches!(self, Self::OrphanedInteraction { .. })
    }
}

/// Errors raised by [`crate::story::StoryScreen`] operations.
#[derive(Debug, Error, PartialEq)]
pub enum ScreenError {
    /// The coordinator refused or could not resolve the request.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Dismissal was requested but nothing is on screen.
    #[error("no overlay is currently presented")]
    NothingPresented,
}

/// Result type for host screen operations.
pub type ScreenResult<T> = Result<T, ScreenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_message_names_both_directions() {
        let err = TransitionError::InvalidTransitionRequest {
            overlay: OverlayId::new(3),
            requested: Direction::Present,
            active: Direction::Dismiss,
        };
        let msg = err.to_string();
        assert!(msg.contains("present"));
        assert!(msg.contains("dismiss"));
        assert!(msg.contains("overlay#3"));
    }

    #[test]
    fn test_index_out_of_range_message() {
        let err = TransitionError::IndexOutOfRange { index: 7, len: 4 };
        assert_eq!(err.to_string(), "no story at index 7 (strip has 4 items)");
    }

    #[test]
    fn test_programmer_error_classification() {
        assert!(TransitionError::IndexOutOfRange { index: 0, len: 0 }.is_programmer_error());
        assert!(!TransitionError::OrphanedInteraction {
            overlay: OverlayId::new(1),
            last_progress: 0.4,
        }
        .is_programmer_error());
    }

    #[test]
    fn test_screen_error_wraps_transition_error() {
        let inner = TransitionError::IndexOutOfRange { index: 2, len: 1 };
        let err: ScreenError = inner.clone().into();
        assert_eq!(err, ScreenError::Transition(inner));
        assert_eq!(err.to_string(), "no story at index 2 (strip has 1 items)");
    }
}
