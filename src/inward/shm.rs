//! Shared-memory pools and buffers of inner clients

use std::fs::File;
use std::sync::Arc;

use log::warn;
use memmap2::{Mmap, MmapOptions};
use parking_lot::RwLock;
use wayland_server::protocol::wl_shm;

/// Mapping of a client's `wl_shm_pool`, remapped on resize
#[derive(Debug)]
pub struct ShmPool {
    file: File,
    map: RwLock<Option<Mmap>>,
}

impl ShmPool {
    pub fn new(file: File, size: i32) -> Arc<Self> {
        let pool = Arc::new(Self {
            file,
            map: RwLock::new(None),
        });
        pool.resize(size);
        pool
    }

    /// Maps `size` bytes of the pool file; a failed map leaves the pool empty.
    pub fn resize(&self, size: i32) {
        let len = size.max(0) as usize;
        let map = if len == 0 {
            None
        } else {
            // SAFETY: read-only mapping of a client-owned file, only read through `to_rgba`
            match unsafe { MmapOptions::new().len(len).map(&self.file) } {
                Ok(map) => Some(map),
                Err(e) => {
                    warn!("Failed to map shm pool of {} bytes: {}", len, e);
                    None
                }
            }
        };
        *self.map.write() = map;
    }

    pub fn len(&self) -> usize {
        self.map.read().as_ref().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current size of the backing file, which the client may have shrunk.
    pub fn file_len(&self) -> Option<usize> {
        match self.file.metadata() {
            Ok(metadata) => usize::try_from(metadata.len()).ok(),
            Err(e) => {
                warn!("Failed to stat shm pool file: {}", e);
                None
            }
        }
    }
}

/// User data of a `wl_buffer` created from a pool
#[derive(Debug, Clone)]
pub struct ShmBuffer {
    pub pool: Arc<ShmPool>,
    pub offset: i32,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub format: wl_shm::Format,
}

impl ShmBuffer {
    /// Buffer contents as tightly packed RGBA, `None` if out of bounds or unsupported.
    ///
    /// Only the part of the mapping still backed by the file is read; pages
    /// past a truncated file would fault.
    pub fn to_rgba(&self) -> Option<Vec<u8>> {
        let file_len = self.pool.file_len()?;
        let map = self.pool.map.read();
        let map = map.as_ref()?;
        let backed = &map[..map.len().min(file_len)];
        shm_to_rgba(
            backed,
            self.width,
            self.height,
            self.stride,
            self.offset,
            self.format,
        )
    }
}

pub fn is_supported_format(format: wl_shm::Format) -> bool {
    matches!(format, wl_shm::Format::Argb8888 | wl_shm::Format::Xrgb8888)
}

/// Converts little-endian ARGB8888/XRGB8888 rows to RGBA.
///
/// XRGB pixels become opaque. Alpha is copied as-is (shm contents are
/// premultiplied).
pub fn shm_to_rgba(
    src: &[u8],
    width: i32,
    height: i32,
    stride: i32,
    offset: i32,
    format: wl_shm::Format,
) -> Option<Vec<u8>> {
    if width <= 0 || height <= 0 || offset < 0 || stride < width.checked_mul(4)? {
        return None;
    }
    if !is_supported_format(format) {
        return None;
    }

    let width = width as usize;
    let height = height as usize;
    let stride = stride as usize;
    let offset = offset as usize;

    // The last row only needs width * 4 bytes
    let needed = offset
        .checked_add(stride.checked_mul(height - 1)?)?
        .checked_add(width * 4)?;
    if needed > src.len() {
        return None;
    }

    let opaque = format == wl_shm::Format::Xrgb8888;
    let mut out = vec![0u8; width * height * 4];
    for y in 0..height {
        let row_start = offset + y * stride;
        let row = &src[row_start..row_start + width * 4];
        let dst = &mut out[y * width * 4..(y + 1) * width * 4];
        for (px, o) in row.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
            o[0] = px[2];
            o[1] = px[1];
            o[2] = px[0];
            o[3] = if opaque { 255 } else { px[3] };
        }
    }
    Some(out)
}
