//! GPU rendering of the panel strip
//!
//! One wgpu surface is created over the panel's host `wl_surface`. Each inner
//! surface with content owns a texture; a frame clears to the background
//! colour and draws every visible buffer of the scene as a textured quad.

pub mod frame_pacing;

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle,
};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::error::FatalError;
use crate::inward::TextureUpdate;
use crate::scene::{RenderItem, SurfaceId};

/// Texture of one inner surface
struct InnerTexture {
    texture: Texture,
    bind_group: BindGroup,
    width: u32,
    height: u32,
}

/// Vertex data for rendering quads
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

pub struct PanelRenderer {
    // Declared first so the surface goes before the device
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    sampler: Sampler,
    textures: HashMap<SurfaceId, InnerTexture>,
}

impl PanelRenderer {
    /// Creates the rendering context over a host Wayland surface.
    ///
    /// # Safety
    ///
    /// `display` must be the `wl_display` of a live client connection and
    /// `surface` a `wl_surface` of that connection; both must outlive the
    /// renderer.
    pub unsafe fn from_wayland(
        display: *mut c_void,
        surface: *mut c_void,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let display = NonNull::new(display)
            .ok_or_else(|| FatalError::rendering("null wl_display pointer"))?;
        let surface = NonNull::new(surface)
            .ok_or_else(|| FatalError::rendering("null wl_surface pointer"))?;

        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_display_handle: RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display)),
            raw_window_handle: RawWindowHandle::Wayland(WaylandWindowHandle::new(surface)),
        };
        let wgpu_surface = instance
            .create_surface_unsafe(target)
            .map_err(|e| FatalError::rendering(e.to_string()))
            .context("create wgpu surface")?;

        pollster::block_on(Self::new_with_instance(&instance, wgpu_surface, width, height))
    }

    /// Picks an adapter compatible with `surface` and builds the quad pipeline.
    pub async fn new_with_instance(
        instance: &Instance,
        surface: Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        info!("🎨 Creating panel renderer ({}x{})", width, height);

        let mut chosen_adapter: Option<Adapter> = None;
        for power in [PowerPreference::HighPerformance, PowerPreference::LowPower] {
            for fallback in [false, true] {
                if let Some(adapter) = instance
                    .request_adapter(&RequestAdapterOptions {
                        power_preference: power,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: fallback,
                    })
                    .await
                {
                    chosen_adapter = Some(adapter);
                    break;
                }
            }
            if chosen_adapter.is_some() {
                break;
            }
        }
        let adapter = chosen_adapter
            .ok_or_else(|| {
                FatalError::rendering("no GPU adapter compatible with the panel surface")
            })?;
        info!("🖥️ Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    label: Some("Ledge Device"),
                },
                None,
            )
            .await
            .map_err(|e| FatalError::rendering(e.to_string()))
            .context("request GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        debug!(
            "🧩 Surface capabilities: formats={:?}, present_modes={:?}, alpha_modes={:?}",
            caps.formats, caps.present_modes, caps.alpha_modes
        );
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| FatalError::rendering("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == CompositeAlphaMode::PreMultiplied)
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(CompositeAlphaMode::Auto);

        // Host frame callbacks throttle rendering, not vsync
        let present_mode = PresentMode::AutoNoVsync;
        info!(
            "🔧 Using format={:?}, present_mode={:?}, alpha_mode={:?}",
            format, present_mode, alpha_mode
        );

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Ledge Texture BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Ledge Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Ledge Textured Quad Shader"),
            source: ShaderSource::Wgsl(include_str!("./textured_quad.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Ledge Textured Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(ColorTargetState {
                    format,
                    // shm contents are premultiplied
                    blend: Some(BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState::default(),
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
        });

        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("Ledge Sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Nearest,
            ..Default::default()
        });

        info!("✅ Panel renderer initialized");
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_group_layout,
            sampler,
            textures: HashMap::new(),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the surface for a new panel size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("Ignoring zero-sized resize {}x{}", width, height);
            return;
        }
        if (width, height) == self.size() {
            return;
        }
        info!("📐 Panel surface resized to {}x{}", width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn apply_texture_updates(&mut self, updates: Vec<TextureUpdate>) {
        for update in updates {
            match update {
                TextureUpdate::Upload {
                    surface,
                    width,
                    height,
                    rgba,
                } => self.update_surface_texture(surface, &rgba, width, height),
                TextureUpdate::Remove { surface } => {
                    if self.textures.remove(&surface).is_some() {
                        trace!("Dropped texture of {:?}", surface);
                    }
                }
            }
        }
    }

    /// Uploads RGBA pixels for an inner surface, reusing its texture when the size matches.
    pub fn update_surface_texture(
        &mut self,
        surface: SurfaceId,
        data: &[u8],
        width: u32,
        height: u32,
    ) {
        if width == 0 || height == 0 || data.len() < (width as usize) * (height as usize) * 4 {
            warn!(
                "Ignoring texture upload for {:?}: {}x{} with {} bytes",
                surface,
                width,
                height,
                data.len()
            );
            return;
        }

        let reuse = self
            .textures
            .get(&surface)
            .is_some_and(|t| t.width == width && t.height == height);
        if !reuse {
            let texture = self.device.create_texture(&TextureDescriptor {
                size: Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format: TextureFormat::Rgba8UnormSrgb,
                usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
                label: Some(&format!("Surface {} Texture", surface.0)),
                view_formats: &[],
            });
            let view = texture.create_view(&TextureViewDescriptor::default());
            let bind_group = self.device.create_bind_group(&BindGroupDescriptor {
                label: Some("Ledge Surface BindGroup"),
                layout: &self.bind_group_layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: BindingResource::TextureView(&view),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            self.textures.insert(
                surface,
                InnerTexture {
                    texture,
                    bind_group,
                    width,
                    height,
                },
            );
        }

        let Some(entry) = self.textures.get(&surface) else {
            return;
        };
        self.queue.write_texture(
            ImageCopyTexture {
                aspect: TextureAspect::All,
                texture: &entry.texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
            },
            data,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        trace!("🖼️ Uploaded {}x{} texture for {:?}", width, height, surface);
    }

    /// Draws one frame and presents it.
    ///
    /// Fails when no surface texture can be acquired; the caller still has to
    /// commit the host surface so its frame callback fires.
    pub fn render(&mut self, items: &[RenderItem], background: [f32; 4]) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                anyhow::bail!("panel surface was lost or outdated, reconfigured");
            }
            Err(e) => anyhow::bail!("failed to acquire panel surface texture: {}", e),
        };
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let output = (self.config.width as f32, self.config.height as f32);
        let mut vertices: Vec<Vertex> = Vec::with_capacity(items.len() * 4);
        let mut indices: Vec<u16> = Vec::with_capacity(items.len() * 6);
        let mut draws: Vec<&BindGroup> = Vec::with_capacity(items.len());
        for item in items {
            let Some(texture) = self.textures.get(&item.surface) else {
                continue;
            };
            let base = vertices.len() as u16;
            vertices.extend_from_slice(&quad_vertices(item, output));
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
            draws.push(&texture.bind_group);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Ledge Render Encoder"),
            });

        let buffers = if vertices.is_empty() {
            None
        } else {
            let vbuf = self.device.create_buffer_init(&util::BufferInitDescriptor {
                label: Some("Ledge Quad Verts"),
                contents: bytemuck::cast_slice(&vertices),
                usage: BufferUsages::VERTEX,
            });
            let ibuf = self.device.create_buffer_init(&util::BufferInitDescriptor {
                label: Some("Ledge Quad Indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: BufferUsages::INDEX,
            });
            Some((vbuf, ibuf))
        };

        {
            let [r, g, b, a] = background.map(f64::from);
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Ledge Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        // Premultiplied clear colour
                        load: LoadOp::Clear(Color {
                            r: r * a,
                            g: g * a,
                            b: b * a,
                            a,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some((vbuf, ibuf)) = &buffers {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_vertex_buffer(0, vbuf.slice(..));
                rpass.set_index_buffer(ibuf.slice(..), IndexFormat::Uint16);
                for (i, bind_group) in draws.iter().enumerate() {
                    rpass.set_bind_group(0, bind_group, &[]);
                    let first_index = (i as u32) * 6;
                    rpass.draw_indexed(first_index..first_index + 6, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        trace!("Presented frame with {} surfaces", draws.len());
        Ok(())
    }
}

/// Clip-space quad for an item on an output of `output` pixels.
///
/// Order: bottom-left, bottom-right, top-left, top-right.
pub fn quad_vertices(item: &RenderItem, output: (f32, f32)) -> [Vertex; 4] {
    let (fw, fh) = (output.0.max(1.0), output.1.max(1.0));
    let (x, y) = (item.x as f32, item.y as f32);
    let (w, h) = (item.width as f32, item.height as f32);

    let x0 = (x / fw) * 2.0 - 1.0;
    let y0 = 1.0 - (y / fh) * 2.0;
    let x1 = ((x + w) / fw) * 2.0 - 1.0;
    let y1 = 1.0 - ((y + h) / fh) * 2.0;

    [
        Vertex { position: [x0, y1, 0.0], tex_coords: [0.0, 1.0] },
        Vertex { position: [x1, y1, 0.0], tex_coords: [1.0, 1.0] },
        Vertex { position: [x0, y0, 0.0], tex_coords: [0.0, 0.0] },
        Vertex { position: [x1, y0, 0.0], tex_coords: [1.0, 0.0] },
    ]
}

impl Vertex {
    fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &[
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as BufferAddress,
                    shader_location: 1,
                    format: VertexFormat::Float32x2,
                },
            ],
        }
    }
}
