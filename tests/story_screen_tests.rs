//! Host screen tests: selection, drag-to-dismiss, and teardown, with a
//! provider that is not the bundled catalog.

use std::rc::Rc;
use std::time::Duration;

use storyreel::error::{ScreenError, TransitionError};
use storyreel::settings::ReelConfig;
use storyreel::story::{OverlayProvider, Story, StoryScreen};
use storyreel::transition::{Direction, GestureTracker, TransitionOutcome, TransitionState};

const FRAME: Duration = Duration::from_millis(16);

/// Generates stories on demand and never records seen state.
struct NumberedProvider {
    count: usize,
}

impl OverlayProvider for NumberedProvider {
    fn len(&self) -> usize {
        self.count
    }

    fn story(&self, index: usize) -> Option<Story> {
        (index < self.count).then(|| Story::new(format!("s{index}"), format!("Story {index}")))
    }
}

fn screen() -> StoryScreen {
    let mut config = ReelConfig::default();
    config.transition.present_duration_ms = 200;
    config.transition.dismiss_duration_ms = 200;
    config.transition.min_settle_ms = 50;
    StoryScreen::from_config(Box::new(NumberedProvider { count: 3 }), &config)
}

fn settle(screen: &mut StoryScreen) -> Vec<TransitionOutcome> {
    let mut outcomes = Vec::new();
    for _ in 0..500 {
        outcomes.extend(screen.tick(FRAME));
        if !screen.is_transitioning() {
            break;
        }
    }
    outcomes
}

fn presented(row: usize) -> StoryScreen {
    let mut screen = screen();
    screen.select(row).unwrap();
    let outcomes = settle(&mut screen);
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    screen
}

#[test]
fn test_presentation_fades_backdrop_in() {
    let mut screen = screen();
    assert!(screen.backdrop().is_hidden());

    screen.select(2).unwrap();
    screen.tick(FRAME);
    let partway = screen.backdrop().state();
    assert!(partway.opacity > 0.0 && partway.opacity < 1.0);

    settle(&mut screen);
    assert_eq!(screen.backdrop().state().opacity, 1.0);
    assert_eq!(screen.presented().unwrap().story.display_name, "Story 2");
    assert_eq!(screen.presented().unwrap().row, 2);
}

#[test]
fn test_out_of_range_selection_reports_strip_length() {
    let mut screen = screen();
    let err = screen.select(3).unwrap_err();
    assert_eq!(
        err,
        ScreenError::Transition(TransitionError::IndexOutOfRange { index: 3, len: 3 })
    );
    assert_eq!(
        err.to_string(),
        "no story at index 3 (strip has 3 items)"
    );
    assert!(screen.presented().is_none());
    assert!(screen.backdrop().is_hidden());
}

#[test]
fn test_dragging_follows_the_gesture() {
    let mut screen = presented(0);
    let tracker = Rc::new(GestureTracker::new(400.0));
    screen.begin_drag(&tracker).unwrap();

    tracker.update(100.0, 0.0);
    screen.tick(FRAME);
    let quarter = screen.backdrop().state().opacity;
    assert_eq!(
        screen.transition_state(),
        TransitionState::InteractivelyTracking {
            progress: 0.25,
            velocity: 0.0,
        }
    );

    tracker.update(300.0, 0.0);
    screen.tick(FRAME);
    let three_quarters = screen.backdrop().state().opacity;
    assert!(three_quarters < quarter);

    // Dragging back up restores the backdrop.
    tracker.update(100.0, 0.0);
    screen.tick(FRAME);
    assert!((screen.backdrop().state().opacity - quarter).abs() < 1e-9);
}

#[test]
fn test_flick_completes_a_short_drag() {
    let mut screen = presented(1);
    let tracker = Rc::new(GestureTracker::new(400.0));
    screen.begin_drag(&tracker).unwrap();
    tracker.update(40.0, 2_000.0);
    screen.tick(FRAME);

    assert!(screen.release(&tracker));
    let outcomes = settle(&mut screen);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].direction, Direction::Dismiss);
    assert!(outcomes[0].success);
    assert!(screen.presented().is_none());
    assert!(screen.backdrop().is_hidden());
}

#[test]
fn test_short_slow_drag_springs_back() {
    let mut screen = presented(1);
    let tracker = Rc::new(GestureTracker::new(400.0));
    screen.begin_drag(&tracker).unwrap();
    tracker.update(40.0, 10.0);
    screen.tick(FRAME);

    assert!(!screen.release(&tracker));
    let outcomes = settle(&mut screen);
    assert!(!outcomes[0].success);
    assert_eq!(screen.presented().unwrap().row, 1);
    assert_eq!(screen.backdrop().state().opacity, 1.0);

    // Still presented, so a new selection is refused but a new drag is fine.
    assert!(screen.select(0).is_err());
    assert!(screen.begin_drag(&tracker).is_ok());
}

#[test]
fn test_dropped_gesture_finishes_the_dismissal() {
    let mut screen = presented(0);
    let tracker = Rc::new(GestureTracker::new(400.0));
    screen.begin_drag(&tracker).unwrap();
    tracker.update(120.0, 0.0);
    screen.tick(FRAME);
    drop(tracker);

    let outcomes = settle(&mut screen);
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    assert!(screen.presented().is_none());
}

#[test]
fn test_disappear_mid_drag_cancels_and_releases() {
    let mut screen = presented(0);
    let tracker = Rc::new(GestureTracker::new(400.0));
    screen.begin_drag(&tracker).unwrap();
    tracker.update(200.0, 0.0);
    screen.tick(FRAME);

    let outcomes = screen.disappear();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].direction, Direction::Dismiss);
    assert!(!outcomes[0].success);
    assert!(screen.presented().is_none());
    assert!(screen.backdrop().is_hidden());
    assert!(!screen.is_transitioning());

    // The tracker no longer drives anything.
    tracker.update(400.0, 0.0);
    assert!(screen.tick(FRAME).is_empty());
}

#[test]
fn test_finish_drag_without_gesture_is_ignored() {
    let mut screen = presented(0);
    assert!(!screen.finish_drag(true));
    screen.dismiss(None).unwrap();
    assert!(!screen.finish_drag(true));
    let outcomes = settle(&mut screen);
    assert!(outcomes[0].success);
}
