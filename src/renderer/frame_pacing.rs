//! Frame pacing driven by host frame callbacks
//!
//! The panel renders with a non-vsync present mode, so the host's
//! `wl_surface.frame` callback is the only throttle. A frame may start only
//! when no callback is outstanding; the callback's `done` event releases the
//! next one.
//!
//! ```
//! use ledge::renderer::frame_pacing::FramePacer;
//!
//! let mut pacer = FramePacer::new();
//! assert!(pacer.try_begin_frame());
//! assert!(!pacer.try_begin_frame());
//! pacer.frame_done();
//! assert!(pacer.try_begin_frame());
//! ```

use log::{debug, trace};
use std::time::{Duration, Instant};

/// Counters about frames started and callbacks received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames started (one per render)
    pub frames_started: u64,
    /// `done` events received from the host
    pub frames_done: u64,
    /// Render requests refused because a callback was outstanding
    pub deferred: u64,
}

#[derive(Debug, Default)]
pub struct FramePacer {
    frame_pending: bool,
    last_frame_start: Option<Instant>,
    last_frame_time: Option<Duration>,
    stats: FrameStats,
}

impl FramePacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the next frame. Returns false while a host callback is outstanding.
    pub fn try_begin_frame(&mut self) -> bool {
        if self.frame_pending {
            self.stats.deferred += 1;
            trace!("Frame deferred, waiting for host frame callback");
            return false;
        }

        let now = Instant::now();
        if let Some(previous) = self.last_frame_start {
            self.last_frame_time = Some(now.duration_since(previous));
        }
        self.last_frame_start = Some(now);
        self.frame_pending = true;
        self.stats.frames_started += 1;
        true
    }

    /// Host signalled `done` for the outstanding frame.
    pub fn frame_done(&mut self) {
        if !self.frame_pending {
            debug!("Frame done without an outstanding frame");
        }
        self.frame_pending = false;
        self.stats.frames_done += 1;
    }

    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Time between the last two frame starts
    pub fn last_frame_time(&self) -> Option<Duration> {
        self.last_frame_time
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}
