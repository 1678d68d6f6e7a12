//! Cursor shown by the host while the pointer is over the panel

use anyhow::Result;
use log::{debug, info, warn};
use wayland_client::protocol::{wl_compositor, wl_pointer, wl_shm, wl_surface};
use wayland_client::{Connection, QueueHandle};
use wayland_cursor::CursorTheme;

use super::OutwardSession;
use crate::config::CursorConfig;
use crate::error::FatalError;

pub struct HostCursor {
    theme: CursorTheme,
    surface: wl_surface::WlSurface,
    image: String,
}

impl HostCursor {
    /// Loads the configured theme, or `XCURSOR_THEME`/the default theme when
    /// none is configured, and checks that the initial image exists.
    pub fn load(
        conn: &Connection,
        shm: wl_shm::WlShm,
        compositor: &wl_compositor::WlCompositor,
        qh: &QueueHandle<OutwardSession>,
        config: &CursorConfig,
    ) -> Result<Self> {
        let theme = match config.theme.as_deref() {
            Some(name) => CursorTheme::load_from_name(conn, shm, name, config.size),
            None => CursorTheme::load(conn, shm, config.size),
        };
        let mut theme = theme.map_err(|e| FatalError::CursorTheme(e.to_string()))?;

        if theme.get_cursor(&config.image).is_none() {
            return Err(FatalError::CursorTheme(format!(
                "theme has no `{}` cursor",
                config.image
            ))
            .into());
        }

        info!(
            "🖱️ Cursor theme loaded ({}, size {})",
            config.theme.as_deref().unwrap_or("default"),
            config.size
        );
        Ok(Self {
            theme,
            surface: compositor.create_surface(qh, ()),
            image: config.image.clone(),
        })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Switches to another theme image. Returns whether the image changed.
    pub fn select(&mut self, name: &str) -> bool {
        if self.image == name {
            return false;
        }
        if self.theme.get_cursor(name).is_none() {
            warn!("Cursor theme has no `{}` image, keeping `{}`", name, self.image);
            return false;
        }
        debug!("Cursor image -> {}", name);
        self.image = name.to_string();
        true
    }

    /// Attaches the current image to the cursor surface and sets it on `pointer`.
    pub fn apply(&mut self, pointer: &wl_pointer::WlPointer, serial: u32) {
        let Some(cursor) = self.theme.get_cursor(&self.image) else {
            return;
        };
        let image = &cursor[0];
        let (width, height) = image.dimensions();
        let (hotspot_x, hotspot_y) = image.hotspot();

        self.surface.attach(Some(&**image), 0, 0);
        self.surface.damage(0, 0, width as i32, height as i32);
        self.surface.commit();
        pointer.set_cursor(serial, Some(&self.surface), hotspot_x as i32, hotspot_y as i32);
    }
}
