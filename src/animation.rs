//! Easing curves and interpolation for transition visuals.
//!
//! The coordinator only ever reports linear progress. Surfaces run that
//! progress through an [`Easing`] and interpolate their own visual state.

use serde::{Deserialize, Serialize};

/// Easing functions applied to linear transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Linear interpolation (no easing)
    Linear,
    /// Quadratic ease-in (slow start)
    EaseIn,
    /// Quadratic ease-out (slow end)
    #[default]
    EaseOut,
    /// Quadratic ease-in-out (slow start and end)
    EaseInOut,
    /// Cubic ease-out, the usual curve for sheets sliding into place
    CubicOut,
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0).
    ///
    /// Every curve maps 0 to 0 and 1 to 1 and is monotonic in between, so a
    /// monotonic progress sequence stays monotonic after easing.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => t * (2.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Self::CubicOut => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
        }
    }
}

/// Values that can be interpolated between a start and an end state.
pub trait Lerp: Clone {
    /// Interpolate from `self` toward `other`; `t` is already eased.
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t as f32
    }
}

impl Lerp for u8 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let from = *self as f64;
        let to = *other as f64;
        (from + (to - from) * t).round() as u8
    }
}

impl Lerp for (u8, u8, u8) {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        (
            self.0.lerp(&other.0, t),
            self.1.lerp(&other.1, t),
            self.2.lerp(&other.2, t),
        )
    }
}
