//! Frame pacing and cancellable frame scheduling
//!
//! The host calls back once per redraw. The governor turns wall-clock
//! timestamps into simulation time steps; the scheduler hands out tokens so a
//! callback queued before a pause or reset can never mutate state after it.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_GAP, MIN_FRAME_INTERVAL};

/// Converts host timestamps (seconds) into scaled time steps
#[derive(Debug, Clone, Default)]
pub struct FrameGovernor {
    last_time: Option<f64>,
}

impl FrameGovernor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time step for a frame at `now`, or `None` if the frame is dropped
    ///
    /// The first frame only primes the clock. Frames closer together than
    /// `MIN_FRAME_INTERVAL` are dropped and keep accumulating. Gaps above
    /// `MAX_FRAME_GAP` are dropped and re-prime the clock.
    pub fn advance(&mut self, now: f64, time_scale: f32) -> Option<f32> {
        let Some(last) = self.last_time else {
            self.last_time = Some(now);
            return None;
        };

        let elapsed = now - last;
        if elapsed < MIN_FRAME_INTERVAL {
            return None;
        }

        self.last_time = Some(now);
        if elapsed > MAX_FRAME_GAP {
            log::debug!("Dropping {:.3}s frame gap", elapsed);
            return None;
        }

        Some(elapsed as f32 * time_scale)
    }

    /// Forget the last timestamp (after pause or reset)
    pub fn clear(&mut self) {
        self.last_time = None;
    }
}

/// Proof that a frame callback was requested while the stepper was running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameToken {
    generation: u64,
}

/// Hands out frame tokens and invalidates them on cancel
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    generation: u64,
    armed: bool,
}

impl FrameScheduler {
    /// Start a new generation; earlier tokens become stale
    pub fn arm(&mut self) {
        self.generation += 1;
        self.armed = true;
    }

    /// Invalidate every outstanding token. Cancelling twice is a no-op.
    pub fn cancel(&mut self) {
        if self.armed {
            self.armed = false;
            self.generation += 1;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Token for the next callback, if armed
    pub fn request(&self) -> Option<FrameToken> {
        self.armed.then_some(FrameToken {
            generation: self.generation,
        })
    }

    /// Whether `token` belongs to the current generation
    pub fn accepts(&self, token: FrameToken) -> bool {
        self.armed && token.generation == self.generation
    }
}
