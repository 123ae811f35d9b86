//! The host screen: a highlight strip that presents the selected story as a
//! full-screen overlay and lets the viewer drag it away.
//!
//! The screen is the single owner of the presented overlay. Completion
//! callbacks never touch the overlay directly; they queue the outcome, and
//! the screen applies it on its next [`tick`](StoryScreen::tick) or
//! [`disappear`](StoryScreen::disappear), which is where the overlay is
//! handed back and dropped.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::provider::OverlayProvider;
use super::strip::StripAppearance;
use super::Story;
use crate::error::{ScreenError, ScreenResult, TransitionError};
use crate::settings::ReelConfig;
use crate::transition::{
    Backdrop, Direction, GestureTracker, InteractionHandle, InteractionSource, OverlayId,
    SharedSurface, TransitionConfig, TransitionCoordinator, TransitionHooks, TransitionOutcome,
    TransitionState,
};

/// A story on screen (or on its way on or off).
#[derive(Debug, Clone, PartialEq)]
pub struct StoryOverlay {
    pub id: OverlayId,
    /// Strip index the story was opened from.
    pub row: usize,
    pub story: Story,
}

type OutcomeQueue = Rc<RefCell<VecDeque<TransitionOutcome>>>;

/// Strip + overlay host, built from explicit collaborators.
pub struct StoryScreen {
    provider: Box<dyn OverlayProvider>,
    coordinator: TransitionCoordinator,
    backdrop: Rc<RefCell<Backdrop>>,
    appearance: StripAppearance,
    timings: TransitionConfig,
    presented: Option<StoryOverlay>,
    outcomes: OutcomeQueue,
    next_overlay: u64,
}

impl std::fmt::Debug for StoryScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryScreen")
            .field("highlights", &self.provider.len())
            .field("presented", &self.presented.as_ref().map(|o| o.id))
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl StoryScreen {
    pub fn new(
        provider: Box<dyn OverlayProvider>,
        coordinator: TransitionCoordinator,
        backdrop: Rc<RefCell<Backdrop>>,
        appearance: StripAppearance,
        timings: TransitionConfig,
    ) -> Self {
        Self {
            provider,
            coordinator,
            backdrop,
            appearance,
            timings,
            presented: None,
            outcomes: Rc::new(RefCell::new(VecDeque::new())),
            next_overlay: 1,
        }
    }

    /// Wire up a screen from loaded configuration.
    pub fn from_config(provider: Box<dyn OverlayProvider>, config: &ReelConfig) -> Self {
        Self::new(
            provider,
            TransitionCoordinator::new(config.transition.min_settle()),
            Rc::new(RefCell::new(Backdrop::new(&config.backdrop))),
            config.strip.clone(),
            config.transition.clone(),
        )
    }

    pub fn appearance(&self) -> &StripAppearance {
        &self.appearance
    }

    pub fn timings(&self) -> &TransitionConfig {
        &self.timings
    }

    pub fn coordinator(&self) -> &TransitionCoordinator {
        &self.coordinator
    }

    pub fn provider(&self) -> &dyn OverlayProvider {
        self.provider.as_ref()
    }

    pub fn backdrop(&self) -> Ref<'_, Backdrop> {
        self.backdrop.borrow()
    }

    /// The overlay this screen currently owns.
    pub fn presented(&self) -> Option<&StoryOverlay> {
        self.presented.as_ref()
    }

    /// Transition state of the owned overlay, Idle when there is none.
    pub fn transition_state(&self) -> TransitionState {
        self.presented
            .as_ref()
            .map(|overlay| self.coordinator.state(overlay.id))
            .unwrap_or_default()
    }

    /// True while the owned overlay is animating or tracking a gesture.
    pub fn is_transitioning(&self) -> bool {
        self.presented
            .as_ref()
            .is_some_and(|overlay| self.coordinator.is_active(overlay.id))
    }

    fn hooks(&self) -> TransitionHooks {
        let queue = Rc::clone(&self.outcomes);
        let surface: SharedSurface = self.backdrop.clone();
        TransitionHooks::new()
            .with_surface(surface)
            .on_completion(move |outcome| queue.borrow_mut().push_back(outcome))
    }

    /// Strip selection: present the story at `row`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` when the provider has nothing at `row`;
    /// `InvalidTransitionRequest` while another story is on screen.
    pub fn select(&mut self, row: usize) -> ScreenResult<OverlayId> {
        if let Some(current) = &self.presented {
            let err = TransitionError::InvalidTransitionRequest {
                overlay: current.id,
                requested: Direction::Present,
                active: self
                    .coordinator
                    .active_direction(current.id)
                    .unwrap_or(Direction::Present),
            };
            error!(error = %err, row, "selection while a story is presented");
            return Err(err.into());
        }

        let Some(story) = self.provider.story(row) else {
            let err = TransitionError::IndexOutOfRange {
                index: row,
                len: self.provider.len(),
            };
            error!(error = %err, "selection outside the strip");
            return Err(err.into());
        };

        let id = OverlayId::new(self.next_overlay);
        self.next_overlay += 1;

        self.coordinator
            .begin_presentation(id, self.timings.present_duration(), self.hooks())?;
        self.provider.mark_seen(row);
        info!(overlay = %id, row, story = %story.id, "presenting story");
        self.presented = Some(StoryOverlay { id, row, story });
        Ok(id)
    }

    /// Dismiss the presented story, following `interaction` when a gesture
    /// is in progress.
    pub fn dismiss(&mut self, interaction: Option<InteractionHandle>) -> ScreenResult<()> {
        let overlay = self
            .presented
            .as_ref()
            .ok_or(ScreenError::NothingPresented)?;
        self.coordinator.begin_dismissal(
            overlay.id,
            self.timings.dismiss_duration(),
            interaction,
            self.hooks(),
        )?;
        debug!(overlay = %overlay.id, "dismissing story");
        Ok(())
    }

    /// Start an interactive dismissal driven by `tracker`.
    pub fn begin_drag(&mut self, tracker: &Rc<GestureTracker>) -> ScreenResult<()> {
        if !tracker.in_progress() {
            tracker.begin();
        }
        self.dismiss(Some(InteractionHandle::new(tracker)))
    }

    /// Release an interactive dismissal, completing it or springing back.
    /// Returns false when the overlay was not tracking a gesture.
    pub fn finish_drag(&mut self, should_complete: bool) -> bool {
        self.presented
            .as_ref()
            .is_some_and(|overlay| self.coordinator.finish_interaction(overlay.id, should_complete))
    }

    /// Release using the tracker's own decision, then end its gesture.
    pub fn release(&mut self, tracker: &GestureTracker) -> bool {
        let should_complete = tracker.should_complete(&self.timings);
        let accepted = self.finish_drag(should_complete);
        tracker.end();
        accepted && should_complete
    }

    /// Advance transitions by one frame and apply any outcomes.
    pub fn tick(&mut self, dt: Duration) -> Vec<TransitionOutcome> {
        self.coordinator.tick(dt);
        self.apply_outcomes()
    }

    /// Host teardown: cancel everything in flight and release the overlay.
    pub fn disappear(&mut self) -> Vec<TransitionOutcome> {
        let cancelled = self.coordinator.cancel_all();
        let applied = self.apply_outcomes();
        if let Some(overlay) = self.presented.take() {
            debug!(overlay = %overlay.id, cancelled, "screen disappeared, releasing story");
            self.coordinator.forget(overlay.id);
        }
        self.backdrop.borrow_mut().hide();
        applied
    }

    fn apply_outcomes(&mut self) -> Vec<TransitionOutcome> {
        let drained: Vec<TransitionOutcome> = self.outcomes.borrow_mut().drain(..).collect();
        for outcome in &drained {
            let owned = self
                .presented
                .as_ref()
                .is_some_and(|overlay| overlay.id == outcome.overlay);
            match (outcome.direction, outcome.success) {
                (Direction::Present, true) => {
                    self.backdrop.borrow_mut().reveal();
                }
                (Direction::Dismiss, false) => {
                    // Un-presenting was cancelled; the story stays up.
                    self.backdrop.borrow_mut().reveal();
                }
                (Direction::Present, false) | (Direction::Dismiss, true) => {
                    if owned {
                        if let Some(overlay) = self.presented.take() {
                            info!(overlay = %overlay.id, story = %overlay.story.id, "story released");
                        }
                    }
                    self.backdrop.borrow_mut().hide();
                }
            }
            self.coordinator.forget(outcome.overlay);
        }
        drained
    }
}
