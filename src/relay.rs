//! Input relay between the host seat and the embedded seat
//!
//! Host pointer events arrive in panel-surface pixels. The relay turns them
//! into events of a synthetic absolute pointer: positions become fractions of
//! the panel size, buttons and frame boundaries pass through untouched.

use log::{debug, trace};

/// Pointer button state, shared by both sides of the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
}

/// Raw pointer event as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostPointerEvent {
    Enter { serial: u32, x: f64, y: f64 },
    Leave { serial: u32 },
    Motion { time_msec: u32, x: f64, y: f64 },
    Button {
        serial: u32,
        time_msec: u32,
        button: u32,
        state: ButtonState,
    },
    /// Any of the scroll events (axis, source, stop, discrete, value120)
    Axis,
    Frame,
}

/// Normalised event of the synthetic pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticEvent {
    /// Absolute position as a fraction of the panel size, `0.0..=1.0`
    MotionAbsolute { time_msec: u32, x: f64, y: f64 },
    Button {
        time_msec: u32,
        button: u32,
        state: ButtonState,
    },
    Frame,
}

/// What the caller should do with a relayed host event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelayAction {
    /// Nothing reaches the embedded seat
    None,
    /// Show the panel cursor on the host for the enter `serial`
    SetHostCursor { serial: u32 },
    /// Feed the event to the embedded seat
    Forward(SyntheticEvent),
}

/// The inward pointer device, alive once the host seat has a pointer
#[derive(Debug, Clone, Default)]
pub struct SyntheticPointer {
    pub motions: u64,
    pub buttons: u64,
    pub frames: u64,
}

#[derive(Debug, Default)]
pub struct InputRelay {
    pointer: Option<SyntheticPointer>,
}

impl InputRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called on every host seat capability update.
    ///
    /// The synthetic pointer is created the first time a pointer shows up and
    /// lives for the rest of the process. Returns `true` when it was created.
    pub fn on_capabilities(&mut self, has_pointer: bool) -> bool {
        if has_pointer && self.pointer.is_none() {
            debug!("Creating synthetic pointer");
            self.pointer = Some(SyntheticPointer::default());
            return true;
        }
        false
    }

    pub fn pointer(&self) -> Option<&SyntheticPointer> {
        self.pointer.as_ref()
    }

    /// Translates one host event. `size` is the panel surface size in pixels.
    pub fn relay(&mut self, event: HostPointerEvent, size: (u32, u32)) -> RelayAction {
        let Some(pointer) = self.pointer.as_mut() else {
            trace!("Pointer event before pointer capability: {:?}", event);
            return RelayAction::None;
        };

        match event {
            HostPointerEvent::Enter { serial, .. } => RelayAction::SetHostCursor { serial },
            HostPointerEvent::Leave { .. } | HostPointerEvent::Axis => RelayAction::None,
            HostPointerEvent::Motion { time_msec, x, y } => {
                let (width, height) = size;
                if width == 0 || height == 0 {
                    debug!("Dropping motion on zero-sized panel");
                    return RelayAction::None;
                }
                pointer.motions += 1;
                RelayAction::Forward(SyntheticEvent::MotionAbsolute {
                    time_msec,
                    x: x / f64::from(width),
                    y: y / f64::from(height),
                })
            }
            HostPointerEvent::Button {
                time_msec,
                button,
                state,
                ..
            } => {
                pointer.buttons += 1;
                RelayAction::Forward(SyntheticEvent::Button {
                    time_msec,
                    button,
                    state,
                })
            }
            HostPointerEvent::Frame => {
                pointer.frames += 1;
                RelayAction::Forward(SyntheticEvent::Frame)
            }
        }
    }
}
