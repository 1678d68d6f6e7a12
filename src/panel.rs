//! The panel process: host client and embedded display on one event loop
//!
//! Bootstrap order is fixed: host connection, host globals, cursor theme,
//! layer surface (blocking until configured), rendering context, embedded
//! display, then plugins. Everything afterwards runs in calloop callbacks
//! that each finish before the next one starts.

use anyhow::{anyhow, Context, Result};
use calloop::generic::Generic;
use calloop::{EventLoop, Interest, LoopSignal, Mode, PostAction};
use calloop_wayland_source::WaylandSource;
use log::{debug, info, warn};
use wayland_client::EventQueue;

use crate::config::PanelConfig;
use crate::inward::{EmbeddedServer, InwardSession, InwardState};
use crate::launcher::PluginLauncher;
use crate::outward::{LayerPlacement, OutwardEvent, OutwardSession};
use crate::relay::{InputRelay, RelayAction};
use crate::toplevel::LayoutParams;

pub struct Panel {
    // Host side goes first, taking the renderer with it
    pub outward: OutwardSession,
    pub relay: InputRelay,
    pub inward: InwardState,
    pub server: EmbeddedServer,
    launcher: PluginLauncher,
    background: [f32; 4],
    signal: Option<LoopSignal>,
    exit: bool,
}

impl Panel {
    /// Joins an initialised host session and embedded display.
    pub fn new(
        outward: OutwardSession,
        server: EmbeddedServer,
        session: InwardSession,
        socket_name: &str,
        background: [f32; 4],
    ) -> Self {
        Self {
            outward,
            relay: InputRelay::new(),
            inward: InwardState::new(session),
            server,
            launcher: PluginLauncher::new(socket_name),
            background,
            signal: None,
            exit: false,
        }
    }

    /// Brings up both sides of the panel. Every error is fatal.
    pub fn bootstrap(config: &PanelConfig) -> Result<(Self, EventQueue<OutwardSession>)> {
        let (mut outward, mut queue) = OutwardSession::connect()?;
        outward.bind_capabilities(&mut queue)?;
        outward.load_cursor(&config.cursor)?;

        let placement = LayerPlacement::strip(config.panel.height, &config.panel.namespace);
        outward.create_panel_surface(&mut queue, &placement)?;
        outward.create_rendering_context()?;

        let server = EmbeddedServer::new_listening()?;
        let socket_name = server
            .socket_name()
            .ok_or_else(|| anyhow!("embedded display has no socket"))?
            .to_string();
        std::env::set_var("WAYLAND_DISPLAY", &socket_name);
        info!("🚀 ledge running on WAYLAND_DISPLAY={}", socket_name);

        let (width, height) = outward.size();
        let session = InwardSession::new(
            LayoutParams::from(config.layout),
            width,
            height,
            &config.cursor.image,
        );

        let mut panel = Self::new(outward, server, session, &socket_name, config.panel.background);

        // Seat capabilities and the configure arrived during the round-trips
        panel.handle_outward_events();
        panel.launcher.spawn_all(&config.plugins.commands);
        Ok((panel, queue))
    }

    /// Runs the panel until the host closes it or a shutdown signal arrives.
    pub fn run(config: &PanelConfig) -> Result<()> {
        let mut event_loop: EventLoop<Panel> =
            EventLoop::try_new().context("Failed to create event loop")?;
        let handle = event_loop.handle();

        let (mut panel, queue) = Panel::bootstrap(config)?;
        panel.signal = Some(event_loop.get_signal());

        let source = WaylandSource::new(panel.outward.connection().clone(), queue);
        handle
            .insert_source(source, |_, queue, panel: &mut Panel| {
                let dispatched = queue.dispatch_pending(&mut panel.outward)?;
                panel.handle_outward_events();
                Ok(dispatched)
            })
            .map_err(|e| anyhow!("Failed to insert host connection source: {}", e.error))?;

        let display_fd = panel.server.poll_fd()?;
        handle
            .insert_source(
                Generic::new(display_fd, Interest::READ, Mode::Level),
                |_, _, panel: &mut Panel| {
                    panel.dispatch_inward();
                    Ok(PostAction::Continue)
                },
            )
            .map_err(|e| anyhow!("Failed to insert embedded display source: {}", e.error))?;

        if let Some(listening_fd) = panel.server.listening_fd()? {
            handle
                .insert_source(
                    Generic::new(listening_fd, Interest::READ, Mode::Level),
                    |_, _, panel: &mut Panel| {
                        let accepted = panel.server.accept_clients();
                        debug!("Accepted {} plugin connection(s)", accepted);
                        Ok(PostAction::Continue)
                    },
                )
                .map_err(|e| anyhow!("Failed to insert listening socket source: {}", e.error))?;
        }

        let (ping, ping_source) =
            calloop::ping::make_ping().context("Failed to create shutdown ping")?;
        handle
            .insert_source(ping_source, |_, _, panel: &mut Panel| {
                info!("🛑 Shutdown requested");
                panel.stop();
            })
            .map_err(|e| anyhow!("Failed to insert shutdown source: {}", e.error))?;
        ctrlc::set_handler(move || ping.ping()).context("Failed to install signal handler")?;

        let result = event_loop.run(None, &mut panel, |panel| {
            if panel.exit {
                panel.stop();
            }
        });
        panel.log_stats();

        match result {
            Ok(()) => {
                info!("👋 ledge exiting");
                Ok(())
            }
            Err(e) => match panel.outward.protocol_error() {
                Some(protocol) => Err(anyhow!("host protocol error: {}", protocol)),
                None => {
                    info!("Host connection closed: {}", e);
                    Ok(())
                }
            },
        }
    }

    /// Reacts to everything the host sent in the last dispatch.
    pub fn handle_outward_events(&mut self) {
        for event in self.outward.take_events() {
            match event {
                OutwardEvent::Configured { width, height } => {
                    self.inward.resize_output(width, height);
                    self.render();
                }
                OutwardEvent::Closed => self.stop(),
                OutwardEvent::FrameDone { .. } => self.render(),
                OutwardEvent::PointerCapability => {
                    self.relay.on_capabilities(true);
                }
                OutwardEvent::Pointer(host_event) => {
                    match self.relay.relay(host_event, self.outward.size()) {
                        RelayAction::None => {}
                        RelayAction::SetHostCursor { serial } => self.outward.show_cursor(serial),
                        RelayAction::Forward(synthetic) => {
                            self.inward.session.handle_synthetic(synthetic)
                        }
                    }
                }
            }
        }

        if let Some(image) = self.inward.session.cursor.take_image_change() {
            self.outward.set_cursor_image(&image);
        }
        self.inward.flush_pointer_events();
        self.server.flush();
    }

    /// Handles plugin requests, then redraws if the host is ready.
    pub fn dispatch_inward(&mut self) {
        if let Err(e) = self.server.dispatch(&mut self.inward) {
            warn!("Embedded display dispatch failed: {:#}", e);
        }
        self.launcher.reap();
        self.render();
    }

    /// Uploads pending inner buffers and draws a frame when the host allows.
    pub fn render(&mut self) {
        let updates = self.inward.take_texture_updates();
        if let Some(renderer) = self.outward.renderer_mut() {
            renderer.apply_texture_updates(updates);
        }

        let items = self.inward.session.render_list();
        if self.outward.render(&items, self.background) {
            let now = self.inward.now_msec();
            self.inward.send_frame_done(now);
            self.server.flush();
        }
    }

    /// Summary of frame pacing and pointer traffic, logged on exit.
    pub fn log_stats(&self) {
        let frames = self.outward.pacer().stats();
        debug!(
            "Frames: {} started, {} done, {} deferred",
            frames.frames_started, frames.frames_done, frames.deferred
        );
        if let Some(pointer) = self.relay.pointer() {
            debug!(
                "Host pointer relayed: {} motions, {} buttons, {} frames",
                pointer.motions, pointer.buttons, pointer.frames
            );
        }
        let seat = self.inward.session.seat.stats();
        debug!(
            "Inner seat: {} enters, {} leaves, {} motions, {} buttons, {} frames",
            seat.enters, seat.leaves, seat.motions, seat.buttons, seat.frames
        );
    }

    pub fn stop(&mut self) {
        self.exit = true;
        if let Some(signal) = self.signal.as_ref() {
            signal.stop();
            signal.wakeup();
        }
    }
}
