//! Embedded display server
//!
//! [`InwardSession`] holds the protocol-independent half of the embedded
//! server: the scene, the window registry, the inner seat, the synthetic
//! cursor and the single output. The Wayland objects of inner clients live
//! in [`protocol::InwardState`], which wraps a session.

pub mod cursor;
pub mod protocol;
pub mod seat;
pub mod server;
pub mod shm;

use log::debug;

use crate::relay::{ButtonState, SyntheticEvent};
use crate::scene::{Hit, RenderItem, SceneGraph, SurfaceId};
use crate::toplevel::{CommitOutcome, LayoutParams, Rectangle, ToplevelId, ToplevelRegistry};
pub use cursor::{InwardCursor, OutputLayout};
pub use protocol::{InwardState, TextureUpdate};
pub use seat::{InwardSeat, PointerEvent, PointerStats};
pub use server::EmbeddedServer;

#[derive(Debug)]
pub struct InwardSession {
    pub scene: SceneGraph,
    pub toplevels: ToplevelRegistry,
    pub seat: InwardSeat,
    pub cursor: InwardCursor,
    pub output: OutputLayout,
    /// Image shown while the cursor is over no window
    default_cursor_image: String,
}

impl InwardSession {
    pub fn new(layout: LayoutParams, width: u32, height: u32, default_cursor_image: &str) -> Self {
        Self {
            scene: SceneGraph::new(),
            toplevels: ToplevelRegistry::new(layout),
            seat: InwardSeat::default(),
            cursor: InwardCursor::default(),
            output: OutputLayout::new(width, height),
            default_cursor_image: default_cursor_image.to_string(),
        }
    }

    pub fn resize_output(&mut self, width: u32, height: u32) {
        debug!("Inner output resized to {}x{}", width, height);
        self.output = OutputLayout::new(width, height);
    }

    pub fn hit_test(&self, x: f64, y: f64) -> Hit {
        self.scene.hit_test(x, y)
    }

    /// Feeds one event of the synthetic pointer into the seat.
    pub fn handle_synthetic(&mut self, event: SyntheticEvent) {
        match event {
            SyntheticEvent::MotionAbsolute { time_msec, x, y } => {
                self.cursor.warp_absolute(&self.output, x, y);
                self.process_pointer_motion(time_msec);
            }
            SyntheticEvent::Button {
                time_msec,
                button,
                state,
            } => self.process_pointer_button(time_msec, button, state),
            SyntheticEvent::Frame => self.process_pointer_frame(),
        }
    }

    /// Routes the cursor's current position to the surface under it.
    pub fn process_pointer_motion(&mut self, time_msec: u32) {
        let (x, y) = self.cursor.position();
        let hit = self.hit_test(x, y);

        if hit.toplevel.is_none() {
            self.cursor.set_image(&self.default_cursor_image);
        }

        match hit.surface {
            Some(surface) => {
                self.seat
                    .pointer_notify_enter(surface, hit.local_x, hit.local_y);
                self.seat
                    .pointer_notify_motion(time_msec, hit.local_x, hit.local_y);
            }
            None => self.seat.pointer_clear_focus(),
        }
    }

    pub fn process_pointer_button(&mut self, time_msec: u32, button: u32, state: ButtonState) {
        self.seat.pointer_notify_button(time_msec, button, state);
    }

    pub fn process_pointer_frame(&mut self) {
        self.seat.pointer_notify_frame();
    }

    pub fn create_toplevel(&mut self, surface: SurfaceId) -> Option<ToplevelId> {
        self.toplevels.create(&mut self.scene, surface)
    }

    pub fn map_toplevel(&mut self, id: ToplevelId) -> bool {
        self.toplevels.map(&mut self.scene, id)
    }

    pub fn unmap_toplevel(&mut self, id: ToplevelId) -> bool {
        self.toplevels.unmap(&mut self.scene, id)
    }

    pub fn commit_toplevel(&mut self, id: ToplevelId, geometry: Rectangle) -> CommitOutcome {
        self.toplevels.on_commit(&mut self.scene, id, geometry)
    }

    pub fn destroy_toplevel(&mut self, id: ToplevelId) -> bool {
        self.toplevels.destroy(&mut self.scene, id)
    }

    /// Updates the displayed buffer size of a window.
    pub fn set_buffer_size(&mut self, id: ToplevelId, width: i32, height: i32) {
        if let Some(toplevel) = self.toplevels.get(id) {
            self.scene
                .set_buffer_size(toplevel.buffer_node, width, height);
        }
    }

    pub fn surface_destroyed(&mut self, surface: SurfaceId) {
        self.seat.surface_destroyed(surface);
    }

    pub fn render_list(&self) -> Vec<RenderItem> {
        self.scene.render_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> InwardSession {
        InwardSession::new(LayoutParams::default(), 400, 40, "default")
    }

    /// Creates, configures, sizes and maps a window.
    fn mapped_window(session: &mut InwardSession, surface: u64, w: i32, h: i32) -> ToplevelId {
        let id = session.create_toplevel(SurfaceId(surface)).unwrap();
        session.commit_toplevel(id, Rectangle::default());
        session.set_buffer_size(id, w, h);
        session.commit_toplevel(id, Rectangle::new(0, 0, w, h));
        session.map_toplevel(id);
        id
    }

    #[test]
    fn motion_over_empty_space_selects_default_image_and_clears_focus() {
        let mut s = session();
        s.handle_synthetic(SyntheticEvent::MotionAbsolute {
            time_msec: 1,
            x: 0.5,
            y: 0.5,
        });
        assert_eq!(s.cursor.take_image_change().as_deref(), Some("default"));
        assert_eq!(s.seat.focus(), None);
        assert!(s.seat.take_events().is_empty());
    }

    #[test]
    fn motion_over_window_enters_then_moves() {
        let mut s = session();
        mapped_window(&mut s, 1, 80, 34);

        s.handle_synthetic(SyntheticEvent::MotionAbsolute {
            time_msec: 10,
            x: 0.1,
            y: 0.5,
        });
        let events = s.seat.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            PointerEvent::Enter {
                surface: SurfaceId(1),
                serial: 1,
                x: 37.0,
                y: 17.0
            }
        );
        assert_eq!(
            events[1],
            PointerEvent::Motion {
                surface: SurfaceId(1),
                time_msec: 10,
                x: 37.0,
                y: 17.0
            }
        );
        // Over a window, the cursor image is left alone
        assert_eq!(s.cursor.take_image_change(), None);
    }

    #[test]
    fn leaving_windows_clears_focus() {
        let mut s = session();
        mapped_window(&mut s, 1, 80, 34);
        s.handle_synthetic(SyntheticEvent::MotionAbsolute {
            time_msec: 1,
            x: 0.1,
            y: 0.5,
        });
        s.seat.take_events();

        s.handle_synthetic(SyntheticEvent::MotionAbsolute {
            time_msec: 2,
            x: 0.9,
            y: 0.5,
        });
        let events = s.seat.take_events();
        assert!(matches!(events.as_slice(), [PointerEvent::Leave { surface: SurfaceId(1), .. }]));
    }

    #[test]
    fn buttons_and_frames_go_to_focused_surface() {
        let mut s = session();
        mapped_window(&mut s, 1, 80, 34);
        s.handle_synthetic(SyntheticEvent::MotionAbsolute {
            time_msec: 1,
            x: 0.1,
            y: 0.5,
        });
        s.seat.take_events();

        s.handle_synthetic(SyntheticEvent::Button {
            time_msec: 2,
            button: 0x110,
            state: ButtonState::Pressed,
        });
        s.handle_synthetic(SyntheticEvent::Frame);

        let events = s.seat.take_events();
        assert!(matches!(
            events[0],
            PointerEvent::Button {
                surface: SurfaceId(1),
                button: 0x110,
                state: ButtonState::Pressed,
                ..
            }
        ));
        assert_eq!(events[1], PointerEvent::Frame { surface: SurfaceId(1) });
    }

    #[test]
    fn destroyed_window_is_no_longer_hit() {
        let mut s = session();
        let id = mapped_window(&mut s, 1, 80, 34);
        assert!(s.hit_test(10.0, 10.0).toplevel.is_some());

        s.destroy_toplevel(id);
        assert_eq!(s.hit_test(10.0, 10.0), Hit::default());
        assert!(s.render_list().is_empty());
    }

    #[test]
    fn resize_output_rescales_cursor() {
        let mut s = session();
        s.resize_output(800, 40);
        s.handle_synthetic(SyntheticEvent::MotionAbsolute {
            time_msec: 1,
            x: 0.5,
            y: 0.5,
        });
        assert_eq!(s.cursor.position(), (400.0, 20.0));
    }
}
