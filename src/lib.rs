//! # ledge
//!
//! A panel that is two things at once: a wlr-layer-shell client of the host
//! compositor, drawing a strip along the bottom of the screen, and a small
//! Wayland display of its own whose clients ("plugins") are laid out in a
//! single row inside that strip.
//!
//! ## Architecture
//!
//! - `outward`: connection to the host, layer surface, host cursor
//! - `relay`: host pointer events to a synthetic absolute pointer
//! - `inward`: the embedded display, its seat, cursor and protocol objects
//! - `toplevel`: registry of plugin windows and the row layout
//! - `scene`: node tree used for hit-testing and drawing
//! - `renderer`: wgpu drawing of the strip and frame pacing
//! - `panel`: bootstrap and the event loop tying it together
//! - `config`: TOML configuration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledge::{Panel, PanelConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PanelConfig::default();
//!     Panel::run(&config)
//! }
//! ```

pub mod config;
pub mod error;
pub mod inward;
pub mod launcher;
pub mod outward;
pub mod panel;
pub mod relay;
pub mod renderer;
pub mod scene;
pub mod toplevel;

pub use config::PanelConfig;
pub use error::FatalError;
pub use inward::{EmbeddedServer, InwardSession, InwardState};
pub use outward::OutwardSession;
pub use panel::Panel;
pub use relay::InputRelay;
pub use scene::SceneGraph;
pub use toplevel::ToplevelRegistry;

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for ledge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const BUILD_DATE: &str = env!("BUILD_DATE");
