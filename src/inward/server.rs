//! Embedded display and its listening socket

use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use wayland_protocols::xdg::shell::server::xdg_wm_base;
use wayland_server::backend::{ClientData, ClientId, DisconnectReason};
use wayland_server::protocol::{wl_compositor, wl_output, wl_seat, wl_shm};
use wayland_server::{Client, Display, DisplayHandle, ListeningSocket};

use super::protocol::InwardState;
use crate::error::FatalError;

/// Global versions advertised to plugins
pub const COMPOSITOR_VERSION: u32 = 4;
pub const SHM_VERSION: u32 = 1;
pub const SEAT_VERSION: u32 = 7;
pub const XDG_WM_BASE_VERSION: u32 = 3;
pub const OUTPUT_VERSION: u32 = 3;

struct PluginClientData;
impl ClientData for PluginClientData {
    fn initialized(&self, client_id: ClientId) {
        debug!("Plugin client connected: {:?}", client_id);
    }

    fn disconnected(&self, client_id: ClientId, reason: DisconnectReason) {
        debug!("Plugin client {:?} disconnected: {:?}", client_id, reason);
    }
}

pub struct EmbeddedServer {
    display: Display<InwardState>,
    listening: Option<ListeningSocket>,
    socket_name: Option<String>,
}

impl EmbeddedServer {
    /// Creates the display with all globals, without a socket.
    pub fn new() -> Result<Self> {
        let display: Display<InwardState> = Display::new()
            .map_err(|e| FatalError::embedded(e.to_string()))
            .context("create embedded display")?;
        let dh = display.handle();

        dh.create_global::<InwardState, wl_compositor::WlCompositor, _>(COMPOSITOR_VERSION, ());
        dh.create_global::<InwardState, wl_shm::WlShm, _>(SHM_VERSION, ());
        dh.create_global::<InwardState, wl_seat::WlSeat, _>(SEAT_VERSION, ());
        dh.create_global::<InwardState, xdg_wm_base::XdgWmBase, _>(XDG_WM_BASE_VERSION, ());
        dh.create_global::<InwardState, wl_output::WlOutput, _>(OUTPUT_VERSION, ());
        debug!(
            "Inner globals: wl_compositor v4, wl_shm v1, wl_seat v7, xdg_wm_base v3, wl_output v3"
        );

        Ok(Self {
            display,
            listening: None,
            socket_name: None,
        })
    }

    /// Creates the display and binds the first free `wayland-N` socket.
    pub fn new_listening() -> Result<Self> {
        let mut server = Self::new()?;
        server.bind_auto()?;
        Ok(server)
    }

    pub fn bind_auto(&mut self) -> Result<&str> {
        let listening = ListeningSocket::bind_auto("wayland", 1..32)
            .map_err(|e| FatalError::embedded(e.to_string()))
            .context("bind embedded socket")?;
        let socket_name = listening
            .socket_name()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| FatalError::embedded("missing socket name"))?;

        info!("🔌 Embedded display listening on {}", socket_name);
        self.listening = Some(listening);
        Ok(self.socket_name.insert(socket_name).as_str())
    }

    pub fn socket_name(&self) -> Option<&str> {
        self.socket_name.as_deref()
    }

    pub fn handle(&self) -> DisplayHandle {
        self.display.handle()
    }

    /// Duplicate of the display's poll fd for the event loop.
    pub fn poll_fd(&mut self) -> Result<OwnedFd> {
        self.display
            .backend()
            .poll_fd()
            .try_clone_to_owned()
            .context("duplicate embedded display fd")
    }

    /// Duplicate of the listening socket's fd for the event loop.
    pub fn listening_fd(&self) -> Result<Option<OwnedFd>> {
        self.listening
            .as_ref()
            .map(|l| l.as_fd().try_clone_to_owned())
            .transpose()
            .context("duplicate listening socket fd")
    }

    /// Accepts every pending connection on the listening socket.
    pub fn accept_clients(&mut self) -> usize {
        let Some(listening) = self.listening.as_ref() else {
            return 0;
        };
        let mut handle = self.display.handle();
        let mut accepted = 0;
        loop {
            match listening.accept() {
                Ok(Some(stream)) => match handle.insert_client(stream, Arc::new(PluginClientData)) {
                    Ok(_) => accepted += 1,
                    Err(e) => warn!("Failed to insert plugin client: {}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("accept on embedded socket failed: {}", e);
                    break;
                }
            }
        }
        accepted
    }

    pub fn insert_client(&mut self, stream: UnixStream) -> Result<Client> {
        self.display
            .handle()
            .insert_client(stream, Arc::new(PluginClientData))
            .context("insert client")
    }

    /// Reads and dispatches client requests, then sends pending pointer events.
    pub fn dispatch(&mut self, state: &mut InwardState) -> Result<usize> {
        let dispatched = self
            .display
            .dispatch_clients(state)
            .context("dispatch plugin clients")?;
        state.flush_pointer_events();
        self.flush();
        Ok(dispatched)
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.display.flush_clients() {
            debug!("flush_clients: {}", e);
        }
    }
}
