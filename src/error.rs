//! Fatal error tier
//!
//! Anything that stops the panel from coming up is one of these variants,
//! wrapped with `anyhow` context on the way out of the bootstrap. Everything
//! else is logged and ignored at the dispatch site.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FatalError {
    #[error("unable to connect to the host display: {0}")]
    HostUnreachable(String),

    #[error("host does not advertise required global `{0}`")]
    MissingCapability(&'static str),

    #[error("failed to create the panel surface: {0}")]
    SurfaceCreation(String),

    #[error("rendering context unavailable: {0}")]
    RenderingContext(String),

    #[error("cursor theme unavailable: {0}")]
    CursorTheme(String),

    #[error("embedded display server failed: {0}")]
    EmbeddedServer(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FatalError {
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::SurfaceCreation(msg.into())
    }

    pub fn rendering(msg: impl Into<String>) -> Self {
        Self::RenderingContext(msg.into())
    }

    pub fn embedded(msg: impl Into<String>) -> Self {
        Self::EmbeddedServer(msg.into())
    }
}
