//! storyreel - a story highlight strip that presents stories as full-screen
//! overlays with interactive, cancellable transitions.
//!
//! The interesting part is [`transition::TransitionCoordinator`], a
//! single-threaded state machine that animates overlays on and off screen,
//! follows drag gestures, and reports exactly one outcome per transition.
//! [`story::StoryScreen`] wires it to a strip of highlights.

pub mod animation;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod settings;
pub mod story;
pub mod transition;
