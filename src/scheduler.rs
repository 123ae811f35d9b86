//! Frame clock that turns elapsed time into fixed-length frame ticks.
//!
//! Everything runs on the caller's thread: the scheduler only decides how
//! many frames have elapsed and hands each frame's duration to a callback,
//! which normally forwards it to [`crate::transition::TransitionCoordinator::tick`].

use std::ops::ControlFlow;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval, MissedTickBehavior};
use tracing::trace;

/// Frame loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Target frames per second.
    /// Default: 60
    pub frame_rate: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { frame_rate: 60 }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate == 0 || self.frame_rate > 1000 {
            return Err(format!(
                "scheduler.frame_rate must be between 1 and 1000, got {}",
                self.frame_rate
            ));
        }
        Ok(())
    }
}

/// Fixed-step frame clock.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    frame_duration: Duration,
    frame: u64,
    elapsed: Duration,
    /// Time advanced but not yet long enough for a whole frame.
    pending: Duration,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default().frame_rate)
    }
}

impl FrameScheduler {
    /// Create a scheduler with the given target FPS (at least 1).
    pub fn new(frame_rate: u32) -> Self {
        let frame_rate = frame_rate.max(1);
        Self {
            frame_duration: Duration::from_secs(1) / frame_rate,
            frame: 0,
            elapsed: Duration::ZERO,
            pending: Duration::ZERO,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.frame_rate)
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Frames delivered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated time delivered so far, in whole frames.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Deliver exactly one frame and return its duration.
    pub fn step(&mut self) -> Duration {
        self.frame = self.frame.wrapping_add(1);
        self.elapsed += self.frame_duration;
        self.frame_duration
    }

    /// Advance the clock by `by`, calling `on_frame` once per whole frame.
    /// Leftover time carries into the next call. Returns the frames delivered.
    pub fn advance<F>(&mut self, by: Duration, mut on_frame: F) -> u64
    where
        F: FnMut(Duration),
    {
        self.pending += by;
        let mut delivered = 0;
        while self.pending >= self.frame_duration {
            self.pending -= self.frame_duration;
            on_frame(self.step());
            delivered += 1;
        }
        delivered
    }

    /// Run frames back to back in simulated time until `on_frame` breaks or
    /// `limit` worth of frames has been delivered.
    pub fn run_simulated<F>(&mut self, limit: Duration, mut on_frame: F) -> u64
    where
        F: FnMut(Duration) -> ControlFlow<()>,
    {
        let start = self.elapsed;
        let mut delivered = 0;
        while self.elapsed - start < limit {
            delivered += 1;
            if on_frame(self.step()).is_break() {
                break;
            }
        }
        delivered
    }

    /// Like [`run_simulated`](Self::run_simulated), but paced by a tokio
    /// interval so frames arrive in wall-clock time. Must run inside a tokio
    /// runtime; a current-thread runtime keeps everything on one thread.
    pub async fn run_realtime<F>(&mut self, limit: Duration, mut on_frame: F) -> u64
    where
        F: FnMut(Duration) -> ControlFlow<()>,
    {
        let mut ticker = interval(self.frame_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;

        let start = self.elapsed;
        let mut delivered = 0;
        while self.elapsed - start < limit {
            ticker.tick().await;
            delivered += 1;
            let dt = self.step();
            trace!(frame = self.frame, "realtime frame");
            if on_frame(dt).is_break() {
                break;
            }
        }
        delivered
    }
}
