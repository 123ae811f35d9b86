//! The transition coordinator.
//!
//! Owns every running overlay transition and advances them when the host's
//! frame loop calls [`TransitionCoordinator::tick`]. All work happens on one
//! thread; the coordinator is a cheap `Rc` handle.
//!
//! Surface updates and completion callbacks are collected while the internal
//! state is borrowed and run only after the borrow is released, so a callback
//! may call back into the coordinator (cancel another overlay, begin the next
//! transition for the same one) without tripping the `RefCell`. Callbacks
//! should capture a [`WeakCoordinator`] from
//! [`downgrade`](TransitionCoordinator::downgrade) for this: the coordinator
//! owns its pending callbacks, so a strong clone inside one keeps the
//! coordinator alive and its teardown cancellation never runs.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use storyreel::transition::{OverlayId, TransitionCoordinator, TransitionHooks, TransitionState};
//!
//! let coordinator = TransitionCoordinator::new(Duration::from_millis(120));
//! let overlay = OverlayId::new(1);
//! coordinator
//!     .begin_presentation(overlay, Duration::from_millis(300), TransitionHooks::new())
//!     .unwrap();
//! coordinator.tick(Duration::from_millis(300));
//! assert_eq!(coordinator.state(overlay), TransitionState::Completed { success: true });
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, error, trace, warn};

use super::interaction::InteractionHandle;
use super::surface::SharedSurface;
use super::{Direction, OverlayId, TransitionOutcome, TransitionRequest, TransitionState};
use crate::error::TransitionError;

/// Called exactly once when an accepted transition ends.
pub type CompletionCallback = Box<dyn FnOnce(TransitionOutcome)>;

/// Per-request collaborators: where to draw and whom to tell when done.
#[derive(Default)]
pub struct TransitionHooks {
    surface: Option<SharedSurface>,
    on_completion: Option<CompletionCallback>,
}

impl TransitionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface that receives every progress update of the transition.
    pub fn with_surface(mut self, surface: SharedSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Register the completion callback.
    pub fn on_completion<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(TransitionOutcome) + 'static,
    {
        self.on_completion = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for TransitionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionHooks")
            .field("surface", &self.surface.is_some())
            .field("on_completion", &self.on_completion.is_some())
            .finish()
    }
}

enum Motion {
    Timed {
        from: f64,
        to: f64,
        elapsed: Duration,
        duration: Duration,
        success: bool,
    },
    Tracking {
        progress: f64,
        velocity: f64,
        source: InteractionHandle,
    },
}

impl Motion {
    fn timed(from: f64, to: f64, duration: Duration, success: bool) -> Self {
        Self::Timed {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
            success,
        }
    }

    fn progress(&self) -> f64 {
        match self {
            Self::Timed {
                from,
                to,
                elapsed,
                duration,
                ..
            } => {
                let t = if elapsed >= duration {
                    1.0
                } else {
                    elapsed.as_secs_f64() / duration.as_secs_f64()
                };
                from + (to - from) * t
            }
            Self::Tracking { progress, .. } => *progress,
        }
    }

    fn state(&self) -> TransitionState {
        match self {
            Self::Timed { .. } => TransitionState::Animating {
                progress: self.progress(),
            },
            Self::Tracking {
                progress, velocity, ..
            } => TransitionState::InteractivelyTracking {
                progress: *progress,
                velocity: *velocity,
            },
        }
    }
}

struct ActiveTransition {
    overlay: OverlayId,
    request: TransitionRequest,
    motion: Motion,
    surface: Option<SharedSurface>,
    on_completion: Option<CompletionCallback>,
}

impl ActiveTransition {
    fn render(&self, effects: &mut Vec<Effect>) {
        if let Some(surface) = &self.surface {
            effects.push(Effect::Render {
                surface: Rc::clone(surface),
                direction: self.request.direction,
                progress: self.motion.progress(),
            });
        }
    }

    /// Switch to a timed run toward 1.0 or back to 0.0 from wherever the
    /// gesture left off.
    fn settle(&mut self, should_complete: bool, min_settle: Duration) -> Duration {
        let from = self.motion.progress();
        let to = if should_complete { 1.0 } else { 0.0 };
        let distance = (to - from).abs();
        let duration =
            Duration::try_from_secs_f64(self.request.duration.as_secs_f64() * distance)
                .unwrap_or(self.request.duration)
                .max(min_settle);
        self.motion = Motion::timed(from, to, duration, should_complete);
        duration
    }

    fn complete(&mut self, success: bool, effects: &mut Vec<Effect>) {
        if let Some(callback) = self.on_completion.take() {
            effects.push(Effect::Complete {
                callback,
                outcome: TransitionOutcome {
                    overlay: self.overlay,
                    direction: self.request.direction,
                    success,
                },
            });
        }
    }
}

enum Slot {
    Active(ActiveTransition),
    Completed { success: bool },
}

enum Effect {
    Render {
        surface: SharedSurface,
        direction: Direction,
        progress: f64,
    },
    Complete {
        callback: CompletionCallback,
        outcome: TransitionOutcome,
    },
}

fn run_effects(effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Render {
                surface,
                direction,
                progress,
            } => match surface.try_borrow_mut() {
                Ok(mut surface) => surface.set_visual_progress(direction, progress),
                Err(_) => warn!(%direction, progress, "render surface busy, frame dropped"),
            },
            Effect::Complete { callback, outcome } => callback(outcome),
        }
    }
}

struct Registry {
    min_settle: Duration,
    slots: BTreeMap<OverlayId, Slot>,
}

impl Registry {
    fn active(&mut self, overlay: OverlayId) -> Option<&mut ActiveTransition> {
        match self.slots.get_mut(&overlay) {
            Some(Slot::Active(active)) => Some(active),
            _ => None,
        }
    }

    fn finish(&mut self, overlay: OverlayId, success: bool, effects: &mut Vec<Effect>) {
        if let Some(Slot::Active(mut active)) = self.slots.remove(&overlay) {
            debug!(%overlay, direction = %active.request.direction, success, "transition completed");
            active.complete(success, effects);
        }
        self.slots.insert(overlay, Slot::Completed { success });
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        for (overlay, slot) in std::mem::take(&mut self.slots) {
            if let Slot::Active(mut active) = slot {
                warn!(%overlay, "coordinator dropped mid-transition, reporting cancellation");
                let mut effects = Vec::new();
                active.complete(false, &mut effects);
                // Surfaces are not touched during teardown.
                for effect in effects {
                    if let Effect::Complete { callback, outcome } = effect {
                        callback(outcome);
                    }
                }
            }
        }
    }
}

/// Drives present/dismiss transitions for any number of overlays, one
/// transition per overlay at a time.
#[derive(Clone)]
pub struct TransitionCoordinator {
    inner: Rc<RefCell<Registry>>,
}

impl fmt::Debug for TransitionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.borrow();
        f.debug_struct("TransitionCoordinator")
            .field("min_settle", &registry.min_settle)
            .field("tracked_overlays", &registry.slots.len())
            .finish()
    }
}

/// Non-owning handle to a [`TransitionCoordinator`], for completion
/// callbacks that need to call back into it.
#[derive(Clone)]
pub struct WeakCoordinator {
    inner: Weak<RefCell<Registry>>,
}

impl WeakCoordinator {
    /// The coordinator, unless it has already been dropped.
    pub fn upgrade(&self) -> Option<TransitionCoordinator> {
        self.inner
            .upgrade()
            .map(|inner| TransitionCoordinator { inner })
    }
}

impl fmt::Debug for WeakCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCoordinator")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl TransitionCoordinator {
    /// Create a coordinator. `min_settle` is the shortest animation used to
    /// finish a released gesture.
    pub fn new(min_settle: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                min_settle,
                slots: BTreeMap::new(),
            })),
        }
    }

    /// A handle that does not keep the coordinator alive.
    pub fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Start presenting `overlay`, animating progress from 0.0 to 1.0 over
    /// `duration`.
    ///
    /// # Errors
    ///
    /// `InvalidTransitionRequest` when `overlay` already has a running
    /// transition. The hooks are dropped without their callback firing.
    pub fn begin_presentation(
        &self,
        overlay: OverlayId,
        duration: Duration,
        hooks: TransitionHooks,
    ) -> Result<(), TransitionError> {
        self.begin(
            overlay,
            TransitionRequest::present(duration),
            Motion::timed(0.0, 1.0, duration, true),
            hooks,
        )
    }

    /// Start dismissing `overlay`.
    ///
    /// With a live interaction source that reports a gesture in progress, the
    /// transition tracks the gesture until [`finish_interaction`] is called
    /// or the gesture goes away. Otherwise it is a timed run over `duration`.
    ///
    /// [`finish_interaction`]: Self::finish_interaction
    pub fn begin_dismissal(
        &self,
        overlay: OverlayId,
        duration: Duration,
        interaction: Option<InteractionHandle>,
        hooks: TransitionHooks,
    ) -> Result<(), TransitionError> {
        let tracking = interaction.and_then(|handle| {
            let source = handle.upgrade()?;
            if !source.in_progress() {
                return None;
            }
            let fraction = source.fraction();
            let progress = if fraction.is_finite() {
                fraction.clamp(0.0, 1.0)
            } else {
                0.0
            };
            Some(Motion::Tracking {
                progress,
                velocity: source.velocity(),
                source: handle,
            })
        });

        match tracking {
            Some(motion) => self.begin(
                overlay,
                TransitionRequest::dismiss(duration, true),
                motion,
                hooks,
            ),
            None => self.begin(
                overlay,
                TransitionRequest::dismiss(duration, false),
                Motion::timed(0.0, 1.0, duration, true),
                hooks,
            ),
        }
    }

    fn begin(
        &self,
        overlay: OverlayId,
        request: TransitionRequest,
        motion: Motion,
        hooks: TransitionHooks,
    ) -> Result<(), TransitionError> {
        let mut effects = Vec::new();
        {
            let mut registry = self.inner.borrow_mut();
            if let Some(active) = registry.active(overlay) {
                let err = TransitionError::InvalidTransitionRequest {
                    overlay,
                    requested: request.direction,
                    active: active.request.direction,
                };
                error!(error = %err, "refusing overlapping transition");
                return Err(err);
            }

            let active = ActiveTransition {
                overlay,
                request,
                motion,
                surface: hooks.surface,
                on_completion: hooks.on_completion,
            };
            debug!(
                %overlay,
                direction = %request.direction,
                duration_ms = request.duration.as_millis() as u64,
                interactive = request.is_interactive,
                "transition started"
            );
            active.render(&mut effects);
            registry.slots.insert(overlay, Slot::Active(active));
        }
        run_effects(effects);
        Ok(())
    }

    /// Push gesture progress while the overlay is tracking a gesture.
    ///
    /// Returns false, and does nothing else, in any other state.
    pub fn report_interaction_progress(
        &self,
        overlay: OverlayId,
        fraction: f64,
        velocity: f64,
    ) -> bool {
        let mut effects = Vec::new();
        {
            let mut registry = self.inner.borrow_mut();
            let Some(active) = registry.active(overlay) else {
                trace!(%overlay, "progress report ignored, no transition");
                return false;
            };
            let Motion::Tracking {
                progress,
                velocity: current_velocity,
                ..
            } = &mut active.motion
            else {
                trace!(%overlay, "progress report ignored, not tracking");
                return false;
            };
            if !fraction.is_finite() {
                return false;
            }
            *progress = fraction.clamp(0.0, 1.0);
            if velocity.is_finite() {
                *current_velocity = velocity;
            }
            active.render(&mut effects);
        }
        run_effects(effects);
        true
    }

    /// Lock in the direction of a released gesture.
    ///
    /// Animates the rest of the way to 1.0 (`should_complete`) or back to 0.0,
    /// over `max(distance * duration, min_settle)`, then completes with
    /// `success == should_complete`. Returns false outside of tracking.
    pub fn finish_interaction(&self, overlay: OverlayId, should_complete: bool) -> bool {
        let mut registry = self.inner.borrow_mut();
        let min_settle = registry.min_settle;
        let Some(active) = registry.active(overlay) else {
            return false;
        };
        if !matches!(active.motion, Motion::Tracking { .. }) {
            trace!(%overlay, "finish ignored, not tracking");
            return false;
        }
        let settle = active.settle(should_complete, min_settle);
        debug!(
            %overlay,
            should_complete,
            settle_ms = settle.as_millis() as u64,
            "gesture released"
        );
        true
    }

    /// Stop the overlay's transition immediately with `success == false`.
    ///
    /// The callback runs before this returns. Nothing is animated and the
    /// surface keeps its last frame. Returns false when nothing was running.
    pub fn cancel(&self, overlay: OverlayId) -> bool {
        let mut effects = Vec::new();
        {
            let mut registry = self.inner.borrow_mut();
            if registry.active(overlay).is_none() {
                return false;
            }
            debug!(%overlay, "transition cancelled");
            registry.finish(overlay, false, &mut effects);
        }
        run_effects(effects);
        true
    }

    /// Cancel every running transition; returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut effects = Vec::new();
        let cancelled = {
            let mut registry = self.inner.borrow_mut();
            let running: Vec<OverlayId> = registry
                .slots
                .iter()
                .filter(|(_, slot)| matches!(slot, Slot::Active(_)))
                .map(|(overlay, _)| *overlay)
                .collect();
            for overlay in &running {
                registry.finish(*overlay, false, &mut effects);
            }
            running.len()
        };
        if cancelled > 0 {
            debug!(cancelled, "cancelled all transitions");
        }
        run_effects(effects);
        cancelled
    }

    /// Advance every running transition by `dt`.
    ///
    /// Timed runs move toward their target; tracking runs poll their
    /// interaction source. A source that is gone or no longer in progress is
    /// treated as a completing release from the last known progress.
    pub fn tick(&self, dt: Duration) {
        let mut effects = Vec::new();
        {
            let mut registry = self.inner.borrow_mut();
            let min_settle = registry.min_settle;
            let mut finished = Vec::new();

            for (overlay, slot) in registry.slots.iter_mut() {
                let Slot::Active(active) = slot else {
                    continue;
                };
                if let Some(success) = step(active, dt, min_settle, &mut effects) {
                    finished.push((*overlay, success));
                }
            }

            for (overlay, success) in finished {
                registry.finish(overlay, success, &mut effects);
            }
        }
        run_effects(effects);
    }

    /// State of the overlay's transition.
    pub fn state(&self, overlay: OverlayId) -> TransitionState {
        match self.inner.borrow().slots.get(&overlay) {
            None => TransitionState::Idle,
            Some(Slot::Active(active)) => active.motion.state(),
            Some(Slot::Completed { success }) => TransitionState::Completed { success: *success },
        }
    }

    /// True while the overlay is animating or tracking.
    pub fn is_active(&self, overlay: OverlayId) -> bool {
        matches!(
            self.inner.borrow().slots.get(&overlay),
            Some(Slot::Active(_))
        )
    }

    /// Direction of the overlay's running transition.
    pub fn active_direction(&self, overlay: OverlayId) -> Option<Direction> {
        match self.inner.borrow().slots.get(&overlay) {
            Some(Slot::Active(active)) => Some(active.request.direction),
            _ => None,
        }
    }

    /// Time left in a timed run; None while tracking or when not running.
    pub fn remaining(&self, overlay: OverlayId) -> Option<Duration> {
        match self.inner.borrow().slots.get(&overlay) {
            Some(Slot::Active(ActiveTransition {
                motion:
                    Motion::Timed {
                        elapsed, duration, ..
                    },
                ..
            })) => Some(duration.saturating_sub(*elapsed)),
            _ => None,
        }
    }

    /// Number of running transitions.
    pub fn active_count(&self) -> usize {
        self.inner
            .borrow()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Active(_)))
            .count()
    }

    /// Drop the completed state of `overlay`, returning it to Idle.
    ///
    /// Running transitions are left alone; returns whether anything was removed.
    pub fn forget(&self, overlay: OverlayId) -> bool {
        let mut registry = self.inner.borrow_mut();
        if matches!(registry.slots.get(&overlay), Some(Slot::Completed { .. })) {
            registry.slots.remove(&overlay);
            true
        } else {
            false
        }
    }
}

/// Advance one transition; returns the success flag once it is done.
fn step(
    active: &mut ActiveTransition,
    dt: Duration,
    min_settle: Duration,
    effects: &mut Vec<Effect>,
) -> Option<bool> {
    let overlay = active.overlay;
    match &mut active.motion {
        Motion::Timed {
            elapsed,
            duration,
            success,
            ..
        } => {
            *elapsed = elapsed.saturating_add(dt);
            let done = *elapsed >= *duration;
            let success = *success;
            active.render(effects);
            done.then_some(success)
        }
        Motion::Tracking {
            progress,
            velocity,
            source,
        } => {
            let polled = source
                .upgrade()
                .filter(|source| source.in_progress())
                .map(|source| (source.fraction(), source.velocity()));
            match polled {
                Some((fraction, polled_velocity)) => {
                    if fraction.is_finite() {
                        *progress = fraction.clamp(0.0, 1.0);
                    }
                    if polled_velocity.is_finite() {
                        *velocity = polled_velocity;
                    }
                    active.render(effects);
                }
                None => {
                    let orphaned = TransitionError::OrphanedInteraction {
                        overlay,
                        last_progress: *progress,
                    };
                    warn!(error = %orphaned, "gesture lost, finishing dismissal");
                    active.settle(true, min_settle);
                }
            }
            None
        }
    }
}
