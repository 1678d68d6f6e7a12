//! Panel frame pacing against an in-process host compositor
//!
//! The host side is a minimal wayland-server with wl_compositor and
//! zwlr_layer_shell_v1. It answers committed frame callbacks with `done`
//! until its budget runs out, which lets the test count renders per `done`.

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use wayland_client::Connection;
use wayland_protocols_wlr::layer_shell::v1::server::{zwlr_layer_shell_v1, zwlr_layer_surface_v1};
use wayland_server::backend::{ClientData, ClientId, DisconnectReason};
use wayland_server::protocol::{wl_callback, wl_compositor, wl_surface};
use wayland_server::{Client, DataInit, Dispatch, Display, DisplayHandle, GlobalDispatch, New};

use ledge::inward::{EmbeddedServer, InwardSession};
use ledge::outward::{LayerPlacement, OutwardSession};
use ledge::toplevel::LayoutParams;
use ledge::Panel;

/// Counters shared between the host thread and the test
#[derive(Default)]
struct HostCounters {
    frame_requests: AtomicUsize,
    done_sent: AtomicUsize,
    stop: AtomicBool,
}

struct FakeHost {
    counters: Arc<HostCounters>,
    requested: Vec<wl_callback::WlCallback>,
    committed: Vec<wl_callback::WlCallback>,
    layer_surface: Option<zwlr_layer_surface_v1::ZwlrLayerSurfaceV1>,
    configured: bool,
    serial: u32,
}

struct HostClientData;
impl ClientData for HostClientData {
    fn initialized(&self, _client_id: ClientId) {}
    fn disconnected(&self, _client_id: ClientId, _reason: DisconnectReason) {}
}

impl GlobalDispatch<wl_compositor::WlCompositor, ()> for FakeHost {
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

impl Dispatch<wl_compositor::WlCompositor, ()> for FakeHost {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_compositor::WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_compositor::Request::CreateSurface { id } = request {
            data_init.init(id, ());
        }
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for FakeHost {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &wl_surface::WlSurface,
        request: wl_surface::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_surface::Request::Frame { callback } => {
                state.requested.push(data_init.init(callback, ()));
                state.counters.frame_requests.fetch_add(1, Ordering::SeqCst);
            }
            wl_surface::Request::Commit => {
                state.committed.append(&mut state.requested);
                if !state.configured {
                    if let Some(layer_surface) = state.layer_surface.as_ref() {
                        state.serial += 1;
                        layer_surface.configure(state.serial, 400, 40);
                        state.configured = true;
                    }
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for FakeHost {
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
}

impl GlobalDispatch<zwlr_layer_shell_v1::ZwlrLayerShellV1, ()> for FakeHost {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<zwlr_layer_shell_v1::ZwlrLayerShellV1>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<zwlr_layer_shell_v1::ZwlrLayerShellV1, ()> for FakeHost {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &zwlr_layer_shell_v1::ZwlrLayerShellV1,
        request: zwlr_layer_shell_v1::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let zwlr_layer_shell_v1::Request::GetLayerSurface { id, .. } = request {
            state.layer_surface = Some(data_init.init(id, ()));
        }
    }
}

impl Dispatch<zwlr_layer_surface_v1::ZwlrLayerSurfaceV1, ()> for FakeHost {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &zwlr_layer_surface_v1::ZwlrLayerSurfaceV1,
        _request: zwlr_layer_surface_v1::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

/// Serves one panel connection, sending at most `budget` frame `done` events.
fn spawn_host(
    stream: UnixStream,
    budget: usize,
    counters: Arc<HostCounters>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut display: Display<FakeHost> = Display::new().unwrap();
        let mut dh = display.handle();
        dh.create_global::<FakeHost, wl_compositor::WlCompositor, _>(4, ());
        dh.create_global::<FakeHost, zwlr_layer_shell_v1::ZwlrLayerShellV1, _>(4, ());
        dh.insert_client(stream, Arc::new(HostClientData)).unwrap();

        let mut host = FakeHost {
            counters: counters.clone(),
            requested: Vec::new(),
            committed: Vec::new(),
            layer_surface: None,
            configured: false,
            serial: 0,
        };

        let deadline = Instant::now() + Duration::from_secs(10);
        while !counters.stop.load(Ordering::SeqCst) && Instant::now() < deadline {
            let _ = display.dispatch_clients(&mut host);

            let sent = counters.done_sent.load(Ordering::SeqCst);
            let allowed = budget.saturating_sub(sent).min(host.committed.len());
            for callback in host.committed.drain(..allowed) {
                callback.done(16);
                counters.done_sent.fetch_add(1, Ordering::SeqCst);
            }

            let _ = display.flush_clients();
            thread::sleep(Duration::from_millis(1));
        }
    })
}

fn connect_panel(stream: UnixStream) -> (Panel, wayland_client::EventQueue<OutwardSession>) {
    let conn = Connection::from_socket(stream).unwrap();
    let (mut outward, mut queue) = OutwardSession::from_connection(conn);
    outward.bind_capabilities(&mut queue).unwrap();
    outward
        .create_panel_surface(&mut queue, &LayerPlacement::strip(40, "ledge"))
        .unwrap();

    let server = EmbeddedServer::new().unwrap();
    let session = InwardSession::new(LayoutParams::default(), 400, 40, "default");
    let panel = Panel::new(outward, server, session, "wayland-test", [0.0, 0.0, 0.0, 1.0]);
    (panel, queue)
}

#[test]
fn every_frame_done_releases_exactly_one_render() {
    const BUDGET: usize = 5;
    let (host_sock, panel_sock) = UnixStream::pair().unwrap();
    let counters = Arc::new(HostCounters::default());
    let host = spawn_host(host_sock, BUDGET, counters.clone());

    let (mut panel, mut queue) = connect_panel(panel_sock);
    assert_eq!(panel.outward.size(), (400, 40));

    // The configure queued during bootstrap draws the first frame
    panel.handle_outward_events();
    assert_eq!(panel.outward.pacer().stats().frames_started, 1);
    assert!(panel.outward.pacer().is_frame_pending());

    while panel.outward.pacer().stats().frames_done < BUDGET as u64 {
        queue.blocking_dispatch(&mut panel.outward).unwrap();
        panel.handle_outward_events();

        let stats = panel.outward.pacer().stats();
        assert_eq!(stats.frames_started, stats.frames_done + 1);
    }

    // Renders in between are held back while the last callback is outstanding
    panel.render();
    panel.render();
    let stats = panel.outward.pacer().stats();
    assert_eq!(stats.frames_started, BUDGET as u64 + 1);
    assert_eq!(stats.deferred, 2);
    panel.log_stats();

    counters.stop.store(true, Ordering::SeqCst);
    host.join().unwrap();
    assert_eq!(counters.done_sent.load(Ordering::SeqCst), BUDGET);
    assert_eq!(counters.frame_requests.load(Ordering::SeqCst), BUDGET + 1);
}

#[test]
fn render_without_frame_done_is_deferred() {
    let (host_sock, panel_sock) = UnixStream::pair().unwrap();
    let counters = Arc::new(HostCounters::default());
    let host = spawn_host(host_sock, 0, counters.clone());

    let (mut panel, _queue) = connect_panel(panel_sock);
    panel.handle_outward_events();
    assert_eq!(panel.outward.pacer().stats().frames_started, 1);

    counters.stop.store(true, Ordering::SeqCst);
    host.join().unwrap();

    // No done arrived, so nothing else may start
    panel.render();
    assert_eq!(panel.outward.pacer().stats().frames_started, 1);
    assert_eq!(panel.outward.pacer().stats().deferred, 1);
    assert_eq!(counters.done_sent.load(Ordering::SeqCst), 0);
}
