//! Continuous frame scheduling for one session.
//!
//! The loop is a self-rescheduling task driven by the host's per-frame
//! callback. Its handle lives on the session and is consulted before each
//! reschedule, so cancelling it guarantees no frame is presented later.

use crate::viewport::{FrameScheduler, FrameToken};

/// Cancellable, non-duplicating repeating frame task.
#[derive(Debug, Default)]
pub struct RenderLoop {
    running: bool,
    pending: Option<FrameToken>,
    frames: u64,
}

impl RenderLoop {
    /// A stopped loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the loop is scheduling frames.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The scheduled callback that has not fired yet, if any.
    #[must_use]
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Number of ticks accepted so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start scheduling frames. Returns `false` (and schedules nothing)
    /// if the loop is already running.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.running {
            log::debug!("render loop already running");
            return false;
        }
        self.running = true;
        self.pending = Some(scheduler.request_frame());
        true
    }

    /// Stop the loop and cancel the scheduled callback, if any.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(token) = self.pending.take() {
            scheduler.cancel_frame(token);
        }
        if self.running {
            log::debug!("render loop stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    /// Consume a delivered callback. Returns `true` if `token` is the
    /// pending callback of a running loop, i.e. a frame should be drawn.
    pub fn accept(&mut self, token: FrameToken) -> bool {
        if !self.running || self.pending != Some(token) {
            return false;
        }
        self.pending = None;
        self.frames += 1;
        true
    }

    /// Schedule the next callback after an accepted tick. No-op when the
    /// loop is stopped or a callback is already pending.
    pub fn reschedule(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.running && self.pending.is_none() {
            self.pending = Some(scheduler.request_frame());
        }
    }
}
