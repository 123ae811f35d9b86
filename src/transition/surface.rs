//! Render surfaces driven by transition progress.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::Direction;
use crate::animation::{Easing, Lerp};

/// A view or layer the coordinator may update, and only through progress.
///
/// `progress` is the linear progress of the running transition in `[0, 1]`.
/// Implementations decide what the start and end visuals are.
pub trait RenderSurface {
    fn set_visual_progress(&mut self, direction: Direction, progress: f64);
}

/// Shared, single-threaded handle to a surface.
pub type SharedSurface = Rc<RefCell<dyn RenderSurface>>;

/// Visual parameters of the backdrop behind an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    /// Overlay opacity, 0 (invisible) to 1.
    pub opacity: f64,
    /// How dark the host screen behind the overlay is, 0 (clear) to 1 (black).
    pub dimming: f64,
}

impl VisualState {
    pub const CLEAR: Self = Self {
        opacity: 0.0,
        dimming: 0.0,
    };
}

impl Lerp for VisualState {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            opacity: self.opacity.lerp(&other.opacity, t),
            dimming: self.dimming.lerp(&other.dimming, t),
        }
    }
}

/// Backdrop appearance settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackdropConfig {
    /// Curve applied to transition progress.
    pub easing: Easing,
    /// Dimming of the host screen once the overlay is fully shown.
    /// Default: 1.0 (solid black)
    pub max_dimming: f64,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            easing: Easing::default(),
            max_dimming: 1.0,
        }
    }
}

impl BackdropConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.max_dimming) {
            return Err(format!(
                "backdrop.max_dimming must be in [0, 1], got {}",
                self.max_dimming
            ));
        }
        Ok(())
    }
}

/// The dimming layer between the host screen and the overlay.
///
/// Hidden until the first presentation frame; the host hides it again once a
/// dismissal (or a cancelled presentation) has settled.
#[derive(Debug, Clone)]
pub struct Backdrop {
    easing: Easing,
    shown: VisualState,
    current: VisualState,
    hidden: bool,
}

impl Default for Backdrop {
    fn default() -> Self {
        Self::new(&BackdropConfig::default())
    }
}

impl Backdrop {
    pub fn new(config: &BackdropConfig) -> Self {
        Self {
            easing: config.easing,
            shown: VisualState {
                opacity: 1.0,
                dimming: config.max_dimming,
            },
            current: VisualState::CLEAR,
            hidden: true,
        }
    }

    /// Current interpolated visuals.
    pub fn state(&self) -> VisualState {
        self.current
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Snap to the clear state and take the layer out of the hierarchy.
    pub fn hide(&mut self) {
        self.current = VisualState::CLEAR;
        self.hidden = true;
    }

    /// Snap to the fully shown state.
    pub fn reveal(&mut self) {
        self.current = self.shown;
        self.hidden = false;
    }
}

impl RenderSurface for Backdrop {
    fn set_visual_progress(&mut self, direction: Direction, progress: f64) {
        let progress = progress.clamp(0.0, 1.0);
        let shown_fraction = match direction {
            Direction::Present => progress,
            Direction::Dismiss => 1.0 - progress,
        };
        self.hidden = false;
        self.current = VisualState::CLEAR.lerp(&self.shown, self.easing.apply(shown_fraction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> Backdrop {
        Backdrop::new(&BackdropConfig {
            easing: Easing::Linear,
            max_dimming: 0.8,
        })
    }

    #[test]
    fn test_backdrop_starts_hidden() {
        let backdrop = Backdrop::default();
        assert!(backdrop.is_hidden());
        assert_eq!(backdrop.state(), VisualState::CLEAR);
    }

    #[test]
    fn test_present_progress_darkens() {
        let mut backdrop = linear();
        backdrop.set_visual_progress(Direction::Present, 0.5);
        assert!(!backdrop.is_hidden());
        assert!((backdrop.state().opacity - 0.5).abs() < 1e-9);
        assert!((backdrop.state().dimming - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_dismiss_progress_clears() {
        let mut backdrop = linear();
        backdrop.set_visual_progress(Direction::Dismiss, 0.0);
        assert!((backdrop.state().dimming - 0.8).abs() < 1e-9);

        backdrop.set_visual_progress(Direction::Dismiss, 1.0);
        assert_eq!(backdrop.state(), VisualState::CLEAR);
        // Stays in the hierarchy until the host hides it.
        assert!(!backdrop.is_hidden());
    }

    #[test]
    fn test_hide_and_reveal() {
        let mut backdrop = linear();
        backdrop.reveal();
        assert!(!backdrop.is_hidden());
        assert_eq!(backdrop.state().opacity, 1.0);

        backdrop.hide();
        assert!(backdrop.is_hidden());
        assert_eq!(backdrop.state(), VisualState::CLEAR);
    }

    #[test]
    fn test_easing_shapes_progress() {
        let mut backdrop = Backdrop::new(&BackdropConfig {
            easing: Easing::EaseOut,
            max_dimming: 1.0,
        });
        backdrop.set_visual_progress(Direction::Present, 0.5);
        assert!(backdrop.state().opacity > 0.5);
    }

    #[test]
    fn test_config_validation() {
        assert!(BackdropConfig::default().validate().is_ok());
        let bad = BackdropConfig {
            max_dimming: 1.2,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
