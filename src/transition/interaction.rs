//! Gesture progress sources for interactive dismissals.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::TransitionConfig;

/// Something that tracks a drag gesture and reports how far it has gone.
///
/// The coordinator only reads from a source; it never starts or ends a
/// gesture itself.
pub trait InteractionSource {
    /// Fraction of the full dismissal travelled, in `[0, 1]`.
    fn fraction(&self) -> f64;

    /// Current gesture velocity along the dismissal axis.
    fn velocity(&self) -> f64;

    /// False once the gesture has ended or was never started.
    fn in_progress(&self) -> bool;
}

/// Non-owning handle to an [`InteractionSource`].
///
/// The gesture recogniser owns the source; the coordinator upgrades this
/// handle on every poll and treats a failed upgrade as an orphaned gesture.
#[derive(Clone)]
pub struct InteractionHandle(Weak<dyn InteractionSource>);

impl InteractionHandle {
    /// Create a handle without taking ownership of `source`.
    pub fn new<S: InteractionSource + 'static>(source: &Rc<S>) -> Self {
        let weak: Weak<dyn InteractionSource> = Rc::downgrade(source) as Weak<dyn InteractionSource>;
        Self(weak)
    }

    /// Borrow the source if it is still alive.
    pub fn upgrade(&self) -> Option<Rc<dyn InteractionSource>> {
        self.0.upgrade()
    }

    /// Liveness check without upgrading.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for InteractionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Vertical pan tracker that turns a drag translation into dismissal progress.
///
/// Uses interior mutability so the owner can keep feeding it through an
/// `Rc` while the coordinator holds a weak handle.
#[derive(Debug)]
pub struct GestureTracker {
    /// Distance the pan must travel for a full dismissal.
    extent: f64,
    translation: Cell<f64>,
    velocity: Cell<f64>,
    active: Cell<bool>,
}

impl GestureTracker {
    /// Create a tracker for a dismissal that travels `extent` points.
    pub fn new(extent: f64) -> Self {
        let extent = if extent.is_finite() && extent > 0.0 {
            extent
        } else {
            1.0
        };
        Self {
            extent,
            translation: Cell::new(0.0),
            velocity: Cell::new(0.0),
            active: Cell::new(false),
        }
    }

    /// The full travel distance.
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Start a gesture from rest.
    pub fn begin(&self) {
        self.translation.set(0.0);
        self.velocity.set(0.0);
        self.active.set(true);
    }

    /// Record the latest translation and velocity; ignored when not active.
    pub fn update(&self, translation: f64, velocity: f64) {
        if !self.active.get() {
            return;
        }
        if translation.is_finite() {
            self.translation.set(translation);
        }
        if velocity.is_finite() {
            self.velocity.set(velocity);
        }
    }

    /// End the gesture. The last translation and velocity are kept.
    pub fn end(&self) {
        self.active.set(false);
    }

    /// Release decision: far enough, or flicked fast enough downward.
    pub fn should_complete(&self, config: &TransitionConfig) -> bool {
        self.fraction() >= config.completion_threshold
            || self.velocity.get() >= config.velocity_threshold
    }
}

impl InteractionSource for GestureTracker {
    fn fraction(&self) -> f64 {
        (self.translation.get() / self.extent).clamp(0.0, 1.0)
    }

    fn velocity(&self) -> f64 {
        self.velocity.get()
    }

    fn in_progress(&self) -> bool {
        self.active.get()
    }
}
