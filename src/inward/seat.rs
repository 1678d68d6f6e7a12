//! Inner seat: pointer focus and the events owed to inner clients
//!
//! The seat does not talk to clients itself. Every notification appends a
//! [`PointerEvent`] to an outbox which the protocol layer drains and sends to
//! the `wl_pointer` objects of the focused client.

use log::debug;

use crate::relay::ButtonState;
use crate::scene::SurfaceId;

pub const SEAT_NAME: &str = "seat0";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter {
        surface: SurfaceId,
        serial: u32,
        x: f64,
        y: f64,
    },
    Leave {
        surface: SurfaceId,
        serial: u32,
    },
    Motion {
        surface: SurfaceId,
        time_msec: u32,
        x: f64,
        y: f64,
    },
    Button {
        surface: SurfaceId,
        serial: u32,
        time_msec: u32,
        button: u32,
        state: ButtonState,
    },
    Frame {
        surface: SurfaceId,
    },
}

impl PointerEvent {
    pub fn surface(&self) -> SurfaceId {
        match self {
            PointerEvent::Enter { surface, .. }
            | PointerEvent::Leave { surface, .. }
            | PointerEvent::Motion { surface, .. }
            | PointerEvent::Button { surface, .. }
            | PointerEvent::Frame { surface } => *surface,
        }
    }
}

/// Per-seat counters, handy in logs and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerStats {
    pub enters: u64,
    pub leaves: u64,
    pub motions: u64,
    pub buttons: u64,
    pub frames: u64,
}

#[derive(Debug)]
pub struct InwardSeat {
    name: String,
    focus: Option<SurfaceId>,
    serial: u32,
    outbox: Vec<PointerEvent>,
    stats: PointerStats,
}

impl Default for InwardSeat {
    fn default() -> Self {
        Self::new(SEAT_NAME)
    }
}

impl InwardSeat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            focus: None,
            serial: 0,
            outbox: Vec::new(),
            stats: PointerStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Surface holding pointer focus.
    pub fn focus(&self) -> Option<SurfaceId> {
        self.focus
    }

    pub fn stats(&self) -> PointerStats {
        self.stats
    }

    pub fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);
        self.serial
    }

    /// Gives pointer focus to `surface`.
    ///
    /// No-op when the surface already has focus; otherwise the previous
    /// surface gets a leave and the new one an enter.
    pub fn pointer_notify_enter(&mut self, surface: SurfaceId, x: f64, y: f64) {
        if self.focus == Some(surface) {
            return;
        }
        self.leave_focused();

        let serial = self.next_serial();
        debug!("Pointer enter {:?} at ({:.1}, {:.1})", surface, x, y);
        self.focus = Some(surface);
        self.stats.enters += 1;
        self.outbox.push(PointerEvent::Enter {
            surface,
            serial,
            x,
            y,
        });
    }

    pub fn pointer_notify_motion(&mut self, time_msec: u32, x: f64, y: f64) {
        let Some(surface) = self.focus else {
            return;
        };
        self.stats.motions += 1;
        self.outbox.push(PointerEvent::Motion {
            surface,
            time_msec,
            x,
            y,
        });
    }

    pub fn pointer_notify_button(&mut self, time_msec: u32, button: u32, state: ButtonState) {
        let Some(surface) = self.focus else {
            return;
        };
        let serial = self.next_serial();
        self.stats.buttons += 1;
        self.outbox.push(PointerEvent::Button {
            surface,
            serial,
            time_msec,
            button,
            state,
        });
    }

    pub fn pointer_notify_frame(&mut self) {
        let Some(surface) = self.focus else {
            return;
        };
        self.stats.frames += 1;
        self.outbox.push(PointerEvent::Frame { surface });
    }

    pub fn pointer_clear_focus(&mut self) {
        self.leave_focused();
    }

    /// Forgets focus on a destroyed surface without sending leave.
    pub fn surface_destroyed(&mut self, surface: SurfaceId) {
        if self.focus == Some(surface) {
            self.focus = None;
        }
        self.outbox.retain(|event| event.surface() != surface);
    }

    /// Drains the events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn leave_focused(&mut self) {
        if let Some(previous) = self.focus.take() {
            let serial = self.next_serial();
            self.stats.leaves += 1;
            self.outbox.push(PointerEvent::Leave {
                surface: previous,
                serial,
            });
        }
    }
}
