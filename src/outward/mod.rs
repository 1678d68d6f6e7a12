//! Host-facing client session
//!
//! The panel is an ordinary client of the host compositor: it binds a handful
//! of globals, creates one surface placed through wlr-layer-shell and renders
//! into it with wgpu. Protocol callbacks never act on the rest of the panel
//! directly; they queue [`OutwardEvent`]s which the panel drains after each
//! dispatch.

pub mod cursor;
mod dispatch;

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use wayland_client::protocol::{
    wl_compositor, wl_output, wl_pointer, wl_seat, wl_shm, wl_subcompositor, wl_surface,
};
use wayland_client::{Connection, EventQueue, Proxy, QueueHandle};
use wayland_protocols_wlr::layer_shell::v1::client::{zwlr_layer_shell_v1, zwlr_layer_surface_v1};

use crate::config::CursorConfig;
use crate::error::FatalError;
use crate::relay::HostPointerEvent;
use crate::renderer::frame_pacing::FramePacer;
use crate::renderer::PanelRenderer;
use crate::scene::RenderItem;
pub use cursor::HostCursor;

/// Host globals the panel binds, with the highest version it speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Compositor,
    Subcompositor,
    Shm,
    LayerShell,
    Output,
    Seat,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Compositor,
        Capability::Subcompositor,
        Capability::Shm,
        Capability::LayerShell,
        Capability::Output,
        Capability::Seat,
    ];

    pub fn from_interface(interface: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.interface() == interface)
    }

    pub fn interface(self) -> &'static str {
        match self {
            Capability::Compositor => "wl_compositor",
            Capability::Subcompositor => "wl_subcompositor",
            Capability::Shm => "wl_shm",
            Capability::LayerShell => "zwlr_layer_shell_v1",
            Capability::Output => "wl_output",
            Capability::Seat => "wl_seat",
        }
    }

    pub fn max_version(self) -> u32 {
        match self {
            Capability::Compositor => 4,
            Capability::Subcompositor => 1,
            Capability::Shm => 1,
            Capability::LayerShell => 4,
            Capability::Output => 4,
            Capability::Seat => 7,
        }
    }

    /// Version to bind when the host advertises `advertised`.
    pub fn bind_version(self, advertised: u32) -> u32 {
        advertised.min(self.max_version())
    }
}

/// What happened on the host connection since the last drain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutwardEvent {
    /// Layer surface configured (and acked) with this size
    Configured { width: u32, height: u32 },
    /// The host closed the layer surface
    Closed,
    /// The host finished displaying the last frame
    FrameDone { time_msec: u32 },
    /// The host seat gained a pointer
    PointerCapability,
    Pointer(HostPointerEvent),
}

#[derive(Debug, Default)]
pub struct HostGlobals {
    pub compositor: Option<wl_compositor::WlCompositor>,
    pub subcompositor: Option<wl_subcompositor::WlSubcompositor>,
    pub shm: Option<wl_shm::WlShm>,
    pub layer_shell: Option<zwlr_layer_shell_v1::ZwlrLayerShellV1>,
    pub output: Option<wl_output::WlOutput>,
    pub seat: Option<wl_seat::WlSeat>,
}

impl HostGlobals {
    pub fn is_bound(&self, capability: Capability) -> bool {
        match capability {
            Capability::Compositor => self.compositor.is_some(),
            Capability::Subcompositor => self.subcompositor.is_some(),
            Capability::Shm => self.shm.is_some(),
            Capability::LayerShell => self.layer_shell.is_some(),
            Capability::Output => self.output.is_some(),
            Capability::Seat => self.seat.is_some(),
        }
    }
}

/// Geometry and role of the panel's layer surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPlacement {
    pub width: u32,
    pub height: u32,
    pub namespace: String,
}

impl LayerPlacement {
    /// Full-width strip of `height` pixels.
    pub fn strip(height: u32, namespace: &str) -> Self {
        Self {
            width: 0,
            height,
            namespace: namespace.to_string(),
        }
    }

    pub fn anchor() -> zwlr_layer_surface_v1::Anchor {
        zwlr_layer_surface_v1::Anchor::Bottom
            | zwlr_layer_surface_v1::Anchor::Left
            | zwlr_layer_surface_v1::Anchor::Right
    }

    /// Space reserved at the screen edge
    pub fn exclusive_zone(&self) -> i32 {
        i32::try_from(self.height).unwrap_or(i32::MAX)
    }
}

pub struct OutwardSession {
    // Dropped before anything that owns the connection
    renderer: Option<PanelRenderer>,
    conn: Connection,
    qh: QueueHandle<OutwardSession>,
    globals: HostGlobals,
    surface: Option<wl_surface::WlSurface>,
    layer_surface: Option<zwlr_layer_surface_v1::ZwlrLayerSurfaceV1>,
    pointer: Option<wl_pointer::WlPointer>,
    cursor: Option<HostCursor>,
    /// Serial of the last pointer enter, needed to change the cursor image
    enter_serial: Option<u32>,
    pacer: FramePacer,
    size: (u32, u32),
    configured: bool,
    closed: bool,
    events: Vec<OutwardEvent>,
}

impl OutwardSession {
    /// Opens the host connection named by `WAYLAND_DISPLAY`.
    pub fn connect() -> Result<(Self, EventQueue<Self>)> {
        let conn = Connection::connect_to_env()
            .map_err(|e| FatalError::HostUnreachable(e.to_string()))
            .context("connect to host display")?;
        info!("🔗 Connected to host display");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an existing connection and requests its registry.
    pub fn from_connection(conn: Connection) -> (Self, EventQueue<Self>) {
        let queue = conn.new_event_queue();
        let qh = queue.handle();
        let _registry = conn.display().get_registry(&qh, ());

        let session = Self {
            renderer: None,
            conn,
            qh,
            globals: HostGlobals::default(),
            surface: None,
            layer_surface: None,
            pointer: None,
            cursor: None,
            enter_serial: None,
            pacer: FramePacer::new(),
            size: (0, 0),
            configured: false,
            closed: false,
            events: Vec::new(),
        };
        (session, queue)
    }

    /// Binds the advertised globals in one round-trip.
    pub fn bind_capabilities(&mut self, queue: &mut EventQueue<Self>) -> Result<()> {
        queue
            .roundtrip(self)
            .map_err(|e| FatalError::HostUnreachable(e.to_string()))
            .context("registry round-trip")?;

        for capability in Capability::ALL {
            if !self.globals.is_bound(capability) {
                debug!("Host does not advertise {}", capability.interface());
            }
        }
        if !self.globals.is_bound(Capability::Compositor) {
            return Err(FatalError::MissingCapability("wl_compositor").into());
        }
        if !self.globals.is_bound(Capability::LayerShell) {
            return Err(FatalError::MissingCapability("zwlr_layer_shell_v1").into());
        }
        info!("✅ Host capabilities bound");
        Ok(())
    }

    pub fn globals(&self) -> &HostGlobals {
        &self.globals
    }

    /// Loads the cursor theme shown over the panel. Fatal when unavailable.
    pub fn load_cursor(&mut self, config: &CursorConfig) -> Result<()> {
        let shm = self
            .globals
            .shm
            .clone()
            .ok_or(FatalError::MissingCapability("wl_shm"))?;
        let compositor = self
            .globals
            .compositor
            .clone()
            .ok_or(FatalError::MissingCapability("wl_compositor"))?;
        let cursor = HostCursor::load(&self.conn, shm, &compositor, &self.qh, config)?;
        self.cursor = Some(cursor);
        Ok(())
    }

    /// Creates the panel surface as a layer surface and waits for its configure.
    pub fn create_panel_surface(
        &mut self,
        queue: &mut EventQueue<Self>,
        placement: &LayerPlacement,
    ) -> Result<()> {
        let compositor = self
            .globals
            .compositor
            .as_ref()
            .ok_or(FatalError::MissingCapability("wl_compositor"))?;
        let layer_shell = self
            .globals
            .layer_shell
            .as_ref()
            .ok_or(FatalError::MissingCapability("zwlr_layer_shell_v1"))?;

        let surface = compositor.create_surface(&self.qh, ());
        let layer_surface = layer_shell.get_layer_surface(
            &surface,
            self.globals.output.as_ref(),
            zwlr_layer_shell_v1::Layer::Top,
            placement.namespace.clone(),
            &self.qh,
            (),
        );
        layer_surface.set_size(placement.width, placement.height);
        layer_surface.set_anchor(LayerPlacement::anchor());
        layer_surface.set_exclusive_zone(placement.exclusive_zone());
        layer_surface
            .set_keyboard_interactivity(zwlr_layer_surface_v1::KeyboardInteractivity::None);
        surface.commit();

        self.surface = Some(surface);
        self.layer_surface = Some(layer_surface);

        queue
            .roundtrip(self)
            .map_err(|e| FatalError::surface(e.to_string()))
            .context("layer surface round-trip")?;
        if !self.configured {
            return Err(FatalError::surface("host sent no layer surface configure").into());
        }
        info!(
            "🪟 Panel surface configured at {}x{}",
            self.size.0, self.size.1
        );
        Ok(())
    }

    /// Builds the wgpu context over the panel surface.
    pub fn create_rendering_context(&mut self) -> Result<()> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| FatalError::rendering("panel surface does not exist"))?;
        let display = self.conn.backend().display_ptr().cast();
        let surface_ptr = surface.id().as_ptr().cast();
        let (width, height) = self.size;

        // SAFETY: both pointers belong to `self.conn`, which outlives the
        // renderer since the renderer is the first field dropped
        let renderer = unsafe { PanelRenderer::from_wayland(display, surface_ptr, width, height)? };
        self.renderer = Some(renderer);
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Protocol error reported by the host, if the connection died of one.
    pub fn protocol_error(&self) -> Option<String> {
        self.conn.protocol_error().map(|e| e.to_string())
    }

    pub fn renderer_mut(&mut self) -> Option<&mut PanelRenderer> {
        self.renderer.as_mut()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn take_events(&mut self) -> Vec<OutwardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resizes the rendering surface after a configure.
    pub fn apply_size(&mut self) {
        let (width, height) = self.size;
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(width, height);
        }
    }

    /// Renders one frame if the host is ready for it.
    ///
    /// The frame callback is requested before presenting, so the host's
    /// `done` releases exactly one further frame. Returns whether a frame was
    /// started.
    pub fn render(&mut self, items: &[RenderItem], background: [f32; 4]) -> bool {
        if !self.configured || self.closed {
            return false;
        }
        let Some(surface) = self.surface.as_ref() else {
            return false;
        };
        if !self.pacer.try_begin_frame() {
            return false;
        }
        if let Some(interval) = self.pacer.last_frame_time() {
            trace!("Frame interval {:?}", interval);
        }

        surface.frame(&self.qh, ());
        match self.renderer.as_mut() {
            Some(renderer) => {
                if let Err(e) = renderer.render(items, background) {
                    warn!("Frame not presented: {:#}", e);
                    // Commit anyway so the frame callback fires
                    surface.commit();
                }
            }
            // No rendering context yet, the commit alone keeps the pacing going
            None => surface.commit(),
        }
        self.flush();
        true
    }

    /// Shows the cursor image selected by the embedded seat over the panel.
    pub fn set_cursor_image(&mut self, name: &str) {
        let (Some(cursor), Some(pointer)) = (self.cursor.as_mut(), self.pointer.as_ref()) else {
            return;
        };
        if cursor.select(name) {
            if let Some(serial) = self.enter_serial {
                cursor.apply(pointer, serial);
            }
        }
    }

    /// Shows the current cursor image for a pointer enter.
    pub fn show_cursor(&mut self, serial: u32) {
        self.enter_serial = Some(serial);
        if let (Some(cursor), Some(pointer)) = (self.cursor.as_mut(), self.pointer.as_ref()) {
            cursor.apply(pointer, serial);
        }
        self.flush();
    }

    pub fn flush(&self) {
        if let Err(e) = self.conn.flush() {
            debug!("Host flush: {}", e);
        }
    }

    fn push(&mut self, event: OutwardEvent) {
        self.events.push(event);
    }
}
