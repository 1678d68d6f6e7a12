//! Synthetic cursor and the single-output layout it moves in

use log::trace;

/// The one logical output of the embedded display, sized like the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
    pub width: u32,
    pub height: u32,
}

impl OutputLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Maps a fractional position onto the output, clamped to its box.
    pub fn absolute_to_layout(&self, fx: f64, fy: f64) -> (f64, f64) {
        let fx = fx.clamp(0.0, 1.0);
        let fy = fy.clamp(0.0, 1.0);
        (fx * f64::from(self.width), fy * f64::from(self.height))
    }
}

/// Cursor position in layout coordinates plus the selected image
#[derive(Debug, Clone, Default)]
pub struct InwardCursor {
    x: f64,
    y: f64,
    image: Option<String>,
    image_changed: bool,
}

impl InwardCursor {
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn warp_absolute(&mut self, layout: &OutputLayout, fx: f64, fy: f64) {
        let (x, y) = layout.absolute_to_layout(fx, fy);
        trace!("Cursor warp to ({:.2}, {:.2})", x, y);
        self.x = x;
        self.y = y;
    }

    /// Selects a named theme image. Re-selecting the current image is a no-op.
    pub fn set_image(&mut self, name: &str) {
        if self.image.as_deref() != Some(name) {
            self.image = Some(name.to_string());
            self.image_changed = true;
        }
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// The image selected since the last call, if it changed.
    pub fn take_image_change(&mut self) -> Option<String> {
        if std::mem::take(&mut self.image_changed) {
            self.image.clone()
        } else {
            None
        }
    }
}
