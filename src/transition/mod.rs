//! Overlay transitions: presenting and dismissing a full-screen overlay over
//! a host screen.
//!
//! A transition is either a timed animation or, for dismissals, a
//! gesture-driven run that follows an [`InteractionSource`] until the gesture
//! is released. The [`TransitionCoordinator`] owns every running transition
//! and guarantees one completion callback per accepted request.

pub mod coordinator;
pub mod interaction;
pub mod surface;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use coordinator::{
    CompletionCallback, TransitionCoordinator, TransitionHooks, WeakCoordinator,
};
pub use interaction::{GestureTracker, InteractionHandle, InteractionSource};
pub use surface::{Backdrop, BackdropConfig, RenderSurface, SharedSurface, VisualState};

/// Identifies one overlay instance for the lifetime of its presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(u64);

impl OverlayId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// Which way a transition moves the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bring the overlay on screen.
    Present,
    /// Take the overlay off screen.
    Dismiss,
}

impl Direction {
    /// Lowercase label used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Dismiss => "dismiss",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A request to show or hide an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRequest {
    pub direction: Direction,
    /// Full-length duration; interactive runs scale their settle segment by it.
    pub duration: Duration,
    pub is_interactive: bool,
}

impl TransitionRequest {
    /// A timed presentation.
    pub fn present(duration: Duration) -> Self {
        Self {
            direction: Direction::Present,
            duration,
            is_interactive: false,
        }
    }

    /// A dismissal, optionally driven by a gesture.
    pub fn dismiss(duration: Duration, is_interactive: bool) -> Self {
        Self {
            direction: Direction::Dismiss,
            duration,
            is_interactive,
        }
    }
}

/// Observable state of the transition for one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransitionState {
    /// No transition has run, or its result was already consumed.
    #[default]
    Idle,
    /// A timed run, including the settle segment after a gesture release.
    Animating { progress: f64 },
    /// Following a live gesture; progress may move in either direction.
    InteractivelyTracking { progress: f64, velocity: f64 },
    /// The last transition finished and its callback has fired.
    Completed { success: bool },
}

impl TransitionState {
    /// Current progress for running states.
    pub fn progress(&self) -> Option<f64> {
        match self {
            Self::Animating { progress } | Self::InteractivelyTracking { progress, .. } => {
                Some(*progress)
            }
            Self::Idle | Self::Completed { .. } => None,
        }
    }

    /// True while the transition is animating or tracking a gesture.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Animating { .. } | Self::InteractivelyTracking { .. }
        )
    }

    /// The success flag of a completed transition.
    pub fn completed(&self) -> Option<bool> {
        match self {
            Self::Completed { success } => Some(*success),
            _ => None,
        }
    }
}

/// Result handed to the completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub overlay: OverlayId,
    pub direction: Direction,
    /// False when the transition was cancelled, by release or by teardown.
    pub success: bool,
}

/// Timing and release thresholds for overlay transitions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Duration of a presentation.
    /// Default: 350 ms
    pub present_duration_ms: u64,

    /// Full-length duration of a dismissal.
    /// Default: 300 ms
    pub dismiss_duration_ms: u64,

    /// Shortest settle animation after a gesture release, so the overlay
    /// never snaps into place.
    /// Default: 120 ms
    pub min_settle_ms: u64,

    /// Drag fraction at or above which a release completes the dismissal.
    /// Default: 0.35
    pub completion_threshold: f64,

    /// Downward velocity (points per second) at or above which a release
    /// completes the dismissal regardless of distance.
    /// Default: 800.0
    pub velocity_threshold: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            present_duration_ms: 350,
            dismiss_duration_ms: 300,
            min_settle_ms: 120,
            completion_threshold: 0.35,
            velocity_threshold: 800.0,
        }
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl TransitionConfig {
    /// Creates a TransitionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn present_duration(&self) -> Duration {
        Duration::from_millis(self.present_duration_ms)
    }

    pub fn dismiss_duration(&self) -> Duration {
        Duration::from_millis(self.dismiss_duration_ms)
    }

    pub fn min_settle(&self) -> Duration {
        Duration::from_millis(self.min_settle_ms)
    }

    /// Sets the presentation duration.
    pub fn with_present_duration(mut self, duration: Duration) -> Self {
        self.present_duration_ms = saturating_millis(duration);
        self
    }

    /// Sets the dismissal duration.
    pub fn with_dismiss_duration(mut self, duration: Duration) -> Self {
        self.dismiss_duration_ms = saturating_millis(duration);
        self
    }

    /// Sets the settle floor.
    pub fn with_min_settle(mut self, duration: Duration) -> Self {
        self.min_settle_ms = saturating_millis(duration);
        self
    }

    /// Sets the release thresholds.
    pub fn with_release_thresholds(mut self, fraction: f64, velocity: f64) -> Self {
        self.completion_threshold = fraction;
        self.velocity_threshold = velocity;
        self
    }

    /// Check value ranges; returns a description of the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        if self.present_duration_ms == 0 {
            return Err("transition.present_duration_ms must be greater than zero".into());
        }
        if self.dismiss_duration_ms == 0 {
            return Err("transition.dismiss_duration_ms must be greater than zero".into());
        }
        if !(self.completion_threshold > 0.0 && self.completion_threshold <= 1.0) {
            return Err(format!(
                "transition.completion_threshold must be in (0, 1], got {}",
                self.completion_threshold
            ));
        }
        if !self.velocity_threshold.is_finite() || self.velocity_threshold <= 0.0 {
            return Err(format!(
                "transition.velocity_threshold must be positive, got {}",
                self.velocity_threshold
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_id_display() {
        assert_eq!(OverlayId::new(42).to_string(), "overlay#42");
        assert_eq!(OverlayId::new(42).get(), 42);
    }

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::Present.to_string(), "present");
        assert_eq!(Direction::Dismiss.to_string(), "dismiss");
    }

    #[test]
    fn test_request_constructors() {
        let present = TransitionRequest::present(Duration::from_millis(800));
        assert_eq!(present.direction, Direction::Present);
        assert!(!present.is_interactive);

        let dismiss = TransitionRequest::dismiss(Duration::from_millis(300), true);
        assert_eq!(dismiss.direction, Direction::Dismiss);
        assert!(dismiss.is_interactive);
    }

    #[test]
    fn test_state_accessors() {
        assert_eq!(TransitionState::default(), TransitionState::Idle);
        assert_eq!(TransitionState::Animating { progress: 0.25 }.progress(), Some(0.25));
        assert!(TransitionState::InteractivelyTracking {
            progress: 0.5,
            velocity: 10.0
        }
        .is_active());
        assert!(!TransitionState::Completed { success: true }.is_active());
        assert_eq!(
            TransitionState::Completed { success: false }.completed(),
            Some(false)
        );
        assert_eq!(TransitionState::Idle.progress(), None);
    }

    #[test]
    fn test_default_config() {
        let config = TransitionConfig::default();
        assert_eq!(config.present_duration(), Duration::from_millis(350));
        assert_eq!(config.dismiss_duration(), Duration::from_millis(300));
        assert_eq!(config.min_settle(), Duration::from_millis(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = TransitionConfig::new()
            .with_present_duration(Duration::from_millis(800))
            .with_dismiss_duration(Duration::from_millis(500))
            .with_min_settle(Duration::from_millis(50))
            .with_release_thresholds(0.5, 1200.0);

        assert_eq!(config.present_duration_ms, 800);
        assert_eq!(config.dismiss_duration_ms, 500);
        assert_eq!(config.min_settle_ms, 50);
        assert_eq!(config.completion_threshold, 0.5);
        assert_eq!(config.velocity_threshold, 1200.0);
    }

    #[test]
    fn test_builder_saturates_huge_durations() {
        let config = TransitionConfig::new()
            .with_present_duration(Duration::MAX)
            .with_dismiss_duration(Duration::MAX)
            .with_min_settle(Duration::from_secs(u64::MAX));

        assert_eq!(config.present_duration_ms, u64::MAX);
        assert_eq!(config.dismiss_duration_ms, u64::MAX);
        assert_eq!(config.min_settle_ms, u64::MAX);
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let zero = TransitionConfig::new().with_present_duration(Duration::ZERO);
        assert!(zero.validate().unwrap_err().contains("present_duration_ms"));

        let threshold = TransitionConfig::new().with_release_thresholds(1.5, 800.0);
        assert!(threshold
            .validate()
            .unwrap_err()
            .contains("completion_threshold"));

        let velocity = TransitionConfig::new().with_release_thresholds(0.5, -1.0);
        assert!(velocity.validate().unwrap_err().contains("velocity_threshold"));
    }
}
