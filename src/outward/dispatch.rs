//! Host protocol event handlers

use log::{debug, info, trace, warn};
use wayland_client::protocol::{
    wl_callback, wl_compositor, wl_output, wl_pointer, wl_registry, wl_seat, wl_shm,
    wl_subcompositor, wl_surface,
};
use wayland_client::{Connection, Dispatch, QueueHandle, WEnum};
use wayland_protocols_wlr::layer_shell::v1::client::{zwlr_layer_shell_v1, zwlr_layer_surface_v1};

use super::{Capability, OutwardEvent, OutwardSession};
use crate::relay::{ButtonState, HostPointerEvent};

impl Dispatch<wl_registry::WlRegistry, ()> for OutwardSession {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        else {
            // global_remove is ignored
            return;
        };
        let Some(capability) = Capability::from_interface(&interface) else {
            return;
        };
        if state.globals.is_bound(capability) {
            debug!("Ignoring re-advertised {} (name {})", interface, name);
            return;
        }

        let version = capability.bind_version(version);
        debug!("Binding {} v{}", interface, version);
        let globals = &mut state.globals;
        match capability {
            Capability::Compositor => {
                globals.compositor = Some(registry.bind(name, version, qh, ()));
            }
            Capability::Subcompositor => {
                globals.subcompositor = Some(registry.bind(name, version, qh, ()));
            }
            Capability::Shm => globals.shm = Some(registry.bind(name, version, qh, ())),
            Capability::LayerShell => {
                globals.layer_shell = Some(registry.bind(name, version, qh, ()));
            }
            Capability::Output => globals.output = Some(registry.bind(name, version, qh, ())),
            Capability::Seat => globals.seat = Some(registry.bind(name, version, qh, ())),
        }
    }
}

impl Dispatch<wl_seat::WlSeat, ()> for OutwardSession {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_seat::Event::Capabilities {
                capabilities: WEnum::Value(capabilities),
            } => {
                // Losing the pointer later is not handled
                if capabilities.contains(wl_seat::Capability::Pointer) && state.pointer.is_none() {
                    info!("🖱️ Host seat has a pointer");
                    state.pointer = Some(seat.get_pointer(qh, ()));
                    state.push(OutwardEvent::PointerCapability);
                }
            }
            wl_seat::Event::Name { name } => debug!("Host seat name: {}", name),
            _ => {}
        }
    }
}

impl Dispatch<wl_pointer::WlPointer, ()> for OutwardSession {
    fn event(
        state: &mut Self,
        _: &wl_pointer::WlPointer,
        event: wl_pointer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        let relayed = match event {
            wl_pointer::Event::Enter {
                serial,
                surface_x,
                surface_y,
                ..
            } => HostPointerEvent::Enter {
                serial,
                x: surface_x,
                y: surface_y,
            },
            wl_pointer::Event::Leave { serial, .. } => HostPointerEvent::Leave { serial },
            wl_pointer::Event::Motion {
                time,
                surface_x,
                surface_y,
            } => HostPointerEvent::Motion {
                time_msec: time,
                x: surface_x,
                y: surface_y,
            },
            wl_pointer::Event::Button {
                serial,
                time,
                button,
                state: button_state,
            } => {
                let button_state = match button_state {
                    WEnum::Value(wl_pointer::ButtonState::Pressed) => ButtonState::Pressed,
                    WEnum::Value(wl_pointer::ButtonState::Released) => ButtonState::Released,
                    other => {
                        warn!("Unknown host button state {:?}", other);
                        return;
                    }
                };
                HostPointerEvent::Button {
                    serial,
                    time_msec: time,
                    button,
                    state: button_state,
                }
            }
            wl_pointer::Event::Frame => HostPointerEvent::Frame,
            wl_pointer::Event::Axis { .. }
            | wl_pointer::Event::AxisSource { .. }
            | wl_pointer::Event::AxisStop { .. }
            | wl_pointer::Event::AxisDiscrete { .. }
            | wl_pointer::Event::AxisValue120 { .. } => HostPointerEvent::Axis,
            _ => return,
        };
        trace!("Host pointer: {:?}", relayed);
        state.push(OutwardEvent::Pointer(relayed));
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for OutwardSession {
    fn event(
        state: &mut Self,
        _: &wl_callback::WlCallback,
        event: wl_callback::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { callback_data } = event {
            state.pacer.frame_done();
            state.push(OutwardEvent::FrameDone {
                time_msec: callback_data,
            });
        }
    }
}

impl Dispatch<zwlr_layer_surface_v1::ZwlrLayerSurfaceV1, ()> for OutwardSession {
    fn event(
        state: &mut Self,
        layer_surface: &zwlr_layer_surface_v1::ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => {
                debug!("Layer surface configure {}x{} serial={}", width, height, serial);
                state.size = (width, height);
                state.configured = true;
                state.apply_size();
                layer_surface.ack_configure(serial);
                state.push(OutwardEvent::Configured { width, height });
            }
            zwlr_layer_surface_v1::Event::Closed => {
                info!("Host closed the panel surface");
                state.closed = true;
                layer_surface.destroy();
                state.layer_surface = None;
                state.push(OutwardEvent::Closed);
            }
            _ => {}
        }
    }
}

// Globals and objects whose events the panel does not need
impl Dispatch<wl_compositor::WlCompositor, ()> for OutwardSession {
    fn event(
        _: &mut Self,
        _: &wl_compositor::WlCompositor,
        _: wl_compositor::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_subcompositor::WlSubcompositor, ()> for OutwardSession {
    fn event(
        _: &mut Self,
        _: &wl_subcompositor::WlSubcompositor,
        _: wl_subcompositor::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_shm::WlShm, ()> for OutwardSession {
    fn event(
        _: &mut Self,
        _: &wl_shm::WlShm,
        _: wl_shm::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_output::WlOutput, ()> for OutwardSession {
    fn event(
        _: &mut Self,
        _: &wl_output::WlOutput,
        event: wl_output::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_output::Event::Mode { width, height, .. } = event {
            debug!("Host output mode {}x{}", width, height);
        }
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for OutwardSession {
    fn event(
        _: &mut Self,
        _: &wl_surface::WlSurface,
        _: wl_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<zwlr_layer_shell_v1::ZwlrLayerShellV1, ()> for OutwardSession {
    fn event(
        _: &mut Self,
        _: &zwlr_layer_shell_v1::ZwlrLayerShellV1,
        _: zwlr_layer_shell_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}
