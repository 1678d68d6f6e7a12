//! Wayland protocol objects of the embedded display
//!
//! Plugins get wl_compositor, wl_shm, wl_seat (pointer only), xdg_wm_base
//! and one wl_output. Surface commits drive the toplevel registry, committed
//! shm buffers become texture updates for the renderer, and frame callbacks
//! are held until the panel has presented a frame.

use std::collections::HashMap;
use std::fs::File;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, trace, warn};
use wayland_protocols::xdg::shell::server::{
    xdg_popup, xdg_positioner, xdg_surface, xdg_toplevel, xdg_wm_base,
};
use wayland_server::backend::ClientId;
use wayland_server::protocol::{
    wl_buffer, wl_callback, wl_compositor, wl_keyboard, wl_output, wl_pointer, wl_region,
    wl_seat, wl_shm, wl_shm_pool, wl_surface, wl_touch,
};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource, WEnum,
};

use super::seat::PointerEvent;
use super::shm::{is_supported_format, ShmBuffer, ShmPool};
use super::InwardSession;
use crate::relay::ButtonState;
use crate::scene::SurfaceId;
use crate::toplevel::{CommitOutcome, Rectangle, ToplevelEvent};

/// Pixel update for the renderer, keyed by inner surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureUpdate {
    Upload {
        surface: SurfaceId,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },
    Remove {
        surface: SurfaceId,
    },
}

#[derive(Debug)]
struct XdgRecord {
    xdg_surface: xdg_surface::XdgSurface,
    toplevel: Option<xdg_toplevel::XdgToplevel>,
    pending_geometry: Option<Rectangle>,
    geometry: Option<Rectangle>,
    last_configure: Option<u32>,
    acked: bool,
}

#[derive(Debug)]
struct SurfaceRecord {
    resource: wl_surface::WlSurface,
    /// `Some(None)` is an attached null buffer
    pending_buffer: Option<Option<wl_buffer::WlBuffer>>,
    pending_frames: Vec<wl_callback::WlCallback>,
    buffer_size: (i32, i32),
    has_content: bool,
    xdg: Option<XdgRecord>,
}

/// State type of the embedded `Display`
pub struct InwardState {
    pub session: InwardSession,
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    next_surface: u64,
    pointers: Vec<wl_pointer::WlPointer>,
    outputs: Vec<wl_output::WlOutput>,
    frame_callbacks: Vec<wl_callback::WlCallback>,
    texture_updates: Vec<TextureUpdate>,
    started: Instant,
}

impl InwardState {
    pub fn new(session: InwardSession) -> Self {
        Self {
            session,
            surfaces: HashMap::new(),
            next_surface: 1,
            pointers: Vec::new(),
            outputs: Vec::new(),
            frame_callbacks: Vec::new(),
            texture_updates: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Number of live inner surfaces.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Frame callbacks waiting for the next presented frame.
    pub fn pending_frame_callbacks(&self) -> usize {
        self.frame_callbacks.len()
    }

    /// Milliseconds since the embedded display started.
    pub fn now_msec(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    /// Completes every queued frame callback.
    pub fn send_frame_done(&mut self, time_msec: u32) {
        for callback in self.frame_callbacks.drain(..) {
            callback.done(time_msec);
        }
    }

    pub fn take_texture_updates(&mut self) -> Vec<TextureUpdate> {
        std::mem::take(&mut self.texture_updates)
    }

    /// Resizes the inner output and tells bound `wl_output`s.
    pub fn resize_output(&mut self, width: u32, height: u32) {
        self.session.resize_output(width, height);
        for output in &self.outputs {
            send_output_mode(output, width, height);
        }
    }

    /// Sends the seat's queued pointer events to the clients owning their surfaces.
    pub fn flush_pointer_events(&mut self) {
        for event in self.session.seat.take_events() {
            let Some(record) = self.surfaces.get(&event.surface()) else {
                continue;
            };
            let surface = &record.resource;
            let surface_id = surface.id();

            for pointer in self
                .pointers
                .iter()
                .filter(|p| p.id().same_client_as(&surface_id))
            {
                match event {
                    PointerEvent::Enter { serial, x, y, .. } => {
                        pointer.enter(serial, surface, x, y)
                    }
                    PointerEvent::Leave { serial, .. } => pointer.leave(serial, surface),
                    PointerEvent::Motion { time_msec, x, y, .. } => pointer.motion(time_msec, x, y),
                    PointerEvent::Button {
                        serial,
                        time_msec,
                        button,
                        state,
                        ..
                    } => {
                        let state = match state {
                            ButtonState::Pressed => wl_pointer::ButtonState::Pressed,
                            ButtonState::Released => wl_pointer::ButtonState::Released,
                        };
                        pointer.button(serial, time_msec, button, state);
                    }
                    PointerEvent::Frame { .. } => {
                        if pointer.version() >= 5 {
                            pointer.frame();
                        }
                    }
                }
            }
        }
    }

    fn create_surface(
        &mut self,
        id: New<wl_surface::WlSurface>,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let sid = SurfaceId(self.next_surface);
        self.next_surface += 1;
        let resource = data_init.init(id, sid);
        trace!("New inner surface {:?}", sid);
        self.surfaces.insert(
            sid,
            SurfaceRecord {
                resource,
                pending_buffer: None,
                pending_frames: Vec::new(),
                buffer_size: (0, 0),
                has_content: false,
                xdg: None,
            },
        );
    }

    fn commit_surface(&mut self, sid: SurfaceId) {
        let Some(record) = self.surfaces.get_mut(&sid) else {
            return;
        };

        if let Some(attached) = record.pending_buffer.take() {
            match attached {
                Some(buffer) => {
                    match buffer.data::<ShmBuffer>().and_then(|shm| {
                        shm.to_rgba().map(|rgba| (shm.width, shm.height, rgba))
                    }) {
                        Some((width, height, rgba)) => {
                            record.buffer_size = (width, height);
                            record.has_content = true;
                            self.texture_updates.push(TextureUpdate::Upload {
                                surface: sid,
                                width: width as u32,
                                height: height as u32,
                                rgba,
                            });
                        }
                        None => warn!("Unreadable buffer committed on {:?}", sid),
                    }
                    buffer.release();
                }
                None => {
                    record.buffer_size = (0, 0);
                    record.has_content = false;
                    self.texture_updates
                        .push(TextureUpdate::Remove { surface: sid });
                }
            }
        }

        self.frame_callbacks.append(&mut record.pending_frames);

        let Some(xdg) = record.xdg.as_mut() else {
            return;
        };
        if let Some(geometry) = xdg.pending_geometry.take() {
            xdg.geometry = Some(geometry);
        }
        let Some(tid) = self.session.toplevels.route(sid, ToplevelEvent::Commit) else {
            return;
        };

        let (width, height) = record.buffer_size;
        let geometry = xdg
            .geometry
            .map(|g| g.clip_to(width, height))
            .unwrap_or(Rectangle::new(0, 0, width, height));
        self.session.set_buffer_size(tid, width, height);

        let was_mapped = self.session.toplevels.is_mapped(tid);
        if was_mapped && !record.has_content {
            // Null buffer: the role is reset and waits for a new initial commit
            if let Some(tid) = self.session.toplevels.route(sid, ToplevelEvent::Unmap) {
                self.session.unmap_toplevel(tid);
            }
            xdg.acked = false;
            xdg.last_configure = None;
            return;
        }

        match self.session.commit_toplevel(tid, geometry) {
            CommitOutcome::ScheduleConfigure => self.send_configure(sid),
            CommitOutcome::Arranged => {
                if !was_mapped && record.has_content && xdg.acked {
                    if let Some(tid) = self.session.toplevels.route(sid, ToplevelEvent::Map) {
                        self.session.map_toplevel(tid);
                        self.send_configure(sid);
                    }
                }
            }
            CommitOutcome::Ignored => {}
        }
    }

    /// Sends `configure(0, 0, states)` followed by the xdg_surface serial.
    fn send_configure(&mut self, sid: SurfaceId) {
        let serial = self.session.seat.next_serial();
        let Some(xdg) = self.surfaces.get_mut(&sid).and_then(|r| r.xdg.as_mut()) else {
            return;
        };
        let Some(toplevel) = xdg.toplevel.as_ref() else {
            return;
        };

        let toplevels = &self.session.toplevels;
        let activated = toplevels
            .route(sid, ToplevelEvent::Commit)
            .and_then(|tid| toplevels.get(tid))
            .is_some_and(|t| t.activated);
        let mut states = Vec::new();
        if activated {
            states.extend_from_slice(&(xdg_toplevel::State::Activated as u32).to_ne_bytes());
        }

        toplevel.configure(0, 0, states);
        xdg.xdg_surface.configure(serial);
        xdg.last_configure = Some(serial);
        debug!("Configure {:?} serial={} activated={}", sid, serial, activated);
    }

    /// Tears down the window subscribed to `sid`; later calls find no route.
    fn toplevel_role_destroyed(&mut self, sid: SurfaceId) {
        if let Some(xdg) = self.surfaces.get_mut(&sid).and_then(|r| r.xdg.as_mut()) {
            xdg.toplevel = None;
        }
        if let Some(tid) = self.session.toplevels.route(sid, ToplevelEvent::Destroy) {
            self.session.destroy_toplevel(tid);
        }
    }

    fn surface_destroyed(&mut self, sid: SurfaceId) {
        self.toplevel_role_destroyed(sid);
        self.session.surface_destroyed(sid);
        if self.surfaces.remove(&sid).is_some() {
            self.texture_updates
                .push(TextureUpdate::Remove { surface: sid });
            trace!("Inner surface {:?} destroyed", sid);
        }
    }
}

fn send_output_mode(output: &wl_output::WlOutput, width: u32, height: u32) {
    output.mode(
        wl_output::Mode::Current | wl_output::Mode::Preferred,
        width as i32,
        height as i32,
        60_000,
    );
    if output.version() >= 2 {
        output.done();
    }
}

// wl_compositor global
impl GlobalDispatch<wl_compositor::WlCompositor, ()> for InwardState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<wl_compositor::WlCompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}
impl Dispatch<wl_compositor::WlCompositor, ()> for InwardState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &wl_compositor::WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_compositor::Request::CreateSurface { id } => state.create_surface(id, data_init),
            wl_compositor::Request::CreateRegion { id } => {
                data_init.init(id, ());
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_region::WlRegion, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_region::WlRegion,
        _request: wl_region::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<wl_surface::WlSurface, SurfaceId> for InwardState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &wl_surface::WlSurface,
        request: wl_surface::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_surface::Request::Attach { buffer, .. } => {
                if let Some(record) = state.surfaces.get_mut(sid) {
                    record.pending_buffer = Some(buffer);
                }
            }
            wl_surface::Request::Frame { callback } => {
                let callback = data_init.init(callback, ());
                if let Some(record) = state.surfaces.get_mut(sid) {
                    record.pending_frames.push(callback);
                }
            }
            wl_surface::Request::Commit => state.commit_surface(*sid),
            // Damage tracking is not used, every frame redraws the strip
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: ClientId,
        _resource: &wl_surface::WlSurface,
        sid: &SurfaceId,
    ) {
        state.surface_destroyed(*sid);
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_callback::WlCallback,
        _request: wl_callback::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }

    fn destroyed(
        state: &mut Self,
        _client: ClientId,
        resource: &wl_callback::WlCallback,
        _data: &(),
    ) {
        state.frame_callbacks.retain(|cb| cb.id() != resource.id());
    }
}

// wl_shm global
impl GlobalDispatch<wl_shm::WlShm, ()> for InwardState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<wl_shm::WlShm>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shm = data_init.init(resource, ());
        shm.format(wl_shm::Format::Argb8888);
        shm.format(wl_shm::Format::Xrgb8888);
    }
}
impl Dispatch<wl_shm::WlShm, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_shm::WlShm,
        request: wl_shm::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_shm::Request::CreatePool { id, fd, size } = request {
            let pool = ShmPool::new(File::from(fd), size);
            data_init.init(id, pool);
        }
    }
}

impl Dispatch<wl_shm_pool::WlShmPool, Arc<ShmPool>> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &wl_shm_pool::WlShmPool,
        request: wl_shm_pool::Request,
        pool: &Arc<ShmPool>,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_shm_pool::Request::CreateBuffer {
                id,
                offset,
                width,
                height,
                stride,
                format,
            } => {
                let format = match format {
                    WEnum::Value(f) if is_supported_format(f) => f,
                    _ => {
                        resource.post_error(wl_shm::Error::InvalidFormat, "unsupported shm format");
                        wl_shm::Format::Argb8888
                    }
                };
                let end = i64::from(offset) + i64::from(stride) * i64::from(height);
                if offset < 0
                    || width <= 0
                    || height <= 0
                    || i64::from(stride) < i64::from(width) * 4
                    || end > pool.len() as i64
                {
                    resource.post_error(wl_shm::Error::InvalidStride, "buffer outside of pool");
                }
                data_init.init(
                    id,
                    ShmBuffer {
                        pool: pool.clone(),
                        offset,
                        width,
                        height,
                        stride,
                        format,
                    },
                );
            }
            wl_shm_pool::Request::Resize { size } => pool.resize(size),
            _ => {}
        }
    }
}

impl Dispatch<wl_buffer::WlBuffer, ShmBuffer> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_buffer::WlBuffer,
        _request: wl_buffer::Request,
        _data: &ShmBuffer,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

// wl_seat global, pointer only
impl GlobalDispatch<wl_seat::WlSeat, ()> for InwardState {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<wl_seat::WlSeat>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let seat = data_init.init(resource, ());
        seat.capabilities(wl_seat::Capability::Pointer);
        if seat.version() >= 2 {
            seat.name(state.session.seat.name().to_string());
        }
    }
}
impl Dispatch<wl_seat::WlSeat, ()> for InwardState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &wl_seat::WlSeat,
        request: wl_seat::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_seat::Request::GetPointer { id } => {
                let pointer = data_init.init(id, ());
                state.pointers.push(pointer);
            }
            // Never fed: the panel does not route keyboard input
            wl_seat::Request::GetKeyboard { id } => {
                data_init.init(id, ());
            }
            wl_seat::Request::GetTouch { id } => {
                data_init.init(id, ());
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_pointer::WlPointer, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_pointer::WlPointer,
        request: wl_pointer::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_pointer::Request::SetCursor { surface, .. } = request {
            trace!("Ignoring client cursor surface (present: {})", surface.is_some());
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: ClientId,
        resource: &wl_pointer::WlPointer,
        _data: &(),
    ) {
        state.pointers.retain(|p| p.id() != resource.id());
    }
}

impl Dispatch<wl_keyboard::WlKeyboard, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_keyboard::WlKeyboard,
        _request: wl_keyboard::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<wl_touch::WlTouch, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_touch::WlTouch,
        _request: wl_touch::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

// wl_output global: the panel strip
impl GlobalDispatch<wl_output::WlOutput, ()> for InwardState {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<wl_output::WlOutput>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let output = data_init.init(resource, ());
        output.geometry(
            0,
            0,
            0,
            0,
            wl_output::Subpixel::Unknown,
            "ledge".to_string(),
            "panel".to_string(),
            wl_output::Transform::Normal,
        );
        if output.version() >= 2 {
            output.scale(1);
        }
        send_output_mode(&output, state.session.output.width, state.session.output.height);
        state.outputs.push(output);
    }
}
impl Dispatch<wl_output::WlOutput, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_output::WlOutput,
        _request: wl_output::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }

    fn destroyed(state: &mut Self, _client: ClientId, resource: &wl_output::WlOutput, _data: &()) {
        state.outputs.retain(|o| o.id() != resource.id());
    }
}

// xdg_wm_base global
impl GlobalDispatch<xdg_wm_base::XdgWmBase, ()> for InwardState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<xdg_wm_base::XdgWmBase>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}
impl Dispatch<xdg_wm_base::XdgWmBase, ()> for InwardState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &xdg_wm_base::XdgWmBase,
        request: xdg_wm_base::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_wm_base::Request::GetXdgSurface { id, surface } => {
                let Some(sid) = surface.data::<SurfaceId>().copied() else {
                    return;
                };
                let xdg_surface = data_init.init(id, sid);
                if let Some(record) = state.surfaces.get_mut(&sid) {
                    record.xdg = Some(XdgRecord {
                        xdg_surface,
                        toplevel: None,
                        pending_geometry: None,
                        geometry: None,
                        last_configure: None,
                        acked: false,
                    });
                }
            }
            xdg_wm_base::Request::CreatePositioner { id } => {
                data_init.init(id, ());
            }
            xdg_wm_base::Request::Pong { serial } => trace!("pong {}", serial),
            _ => {}
        }
    }
}

impl Dispatch<xdg_positioner::XdgPositioner, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &xdg_positioner::XdgPositioner,
        _request: xdg_positioner::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<xdg_surface::XdgSurface, SurfaceId> for InwardState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &xdg_surface::XdgSurface,
        request: xdg_surface::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_surface::Request::GetToplevel { id } => {
                let toplevel = data_init.init(id, *sid);
                match state.session.create_toplevel(*sid) {
                    Some(tid) => {
                        let xdg = state.surfaces.get_mut(sid).and_then(|r| r.xdg.as_mut());
                        if let Some(xdg) = xdg {
                            xdg.toplevel = Some(toplevel);
                        }
                        info!("New inner toplevel {:?} on {:?}", tid, sid);
                    }
                    None => warn!("Could not create toplevel for {:?}", sid),
                }
            }
            xdg_surface::Request::GetPopup { id, .. } => {
                // Popups are not supported, dismiss right away
                let popup = data_init.init(id, ());
                popup.popup_done();
            }
            xdg_surface::Request::SetWindowGeometry {
                x,
                y,
                width,
                height,
            } => {
                if let Some(xdg) = state.surfaces.get_mut(sid).and_then(|r| r.xdg.as_mut()) {
                    xdg.pending_geometry = Some(Rectangle::new(x, y, width, height));
                }
            }
            xdg_surface::Request::AckConfigure { serial } => {
                if let Some(xdg) = state.surfaces.get_mut(sid).and_then(|r| r.xdg.as_mut()) {
                    if xdg.last_configure.is_some() {
                        xdg.acked = true;
                    }
                    trace!("ack_configure {} on {:?}", serial, sid);
                }
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: ClientId,
        _resource: &xdg_surface::XdgSurface,
        sid: &SurfaceId,
    ) {
        state.toplevel_role_destroyed(*sid);
        if let Some(record) = state.surfaces.get_mut(sid) {
            record.xdg = None;
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, SurfaceId> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &xdg_toplevel::XdgToplevel,
        request: xdg_toplevel::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_toplevel::Request::SetTitle { title } => debug!("{:?} title={}", sid, title),
            xdg_toplevel::Request::SetAppId { app_id } => debug!("{:?} app_id={}", sid, app_id),
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: ClientId,
        _resource: &xdg_toplevel::XdgToplevel,
        sid: &SurfaceId,
    ) {
        state.toplevel_role_destroyed(*sid);
    }
}

impl Dispatch<xdg_popup::XdgPopup, ()> for InwardState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &xdg_popup::XdgPopup,
        _request: xdg_popup::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}
