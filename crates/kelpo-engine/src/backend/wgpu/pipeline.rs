use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use super::gpu::{Gpu, GpuFrame, DEPTH_FORMAT};
use crate::error::{ErrorRecord, RenderResult};
use crate::polygon::{Texture, TextureId, Triangle, Vertex};

const INITIAL_VERTEX_CAPACITY: u64 = 3 * 1024;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GpuVertex {
    position: [f32; 4],
    uv: [f32; 2],
    color: [u8; 4],
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x2, 2 => Unorm8x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: [v.x, v.y, v.z, v.w],
            uv: [v.u, v.v],
            color: v.color(),
        }
    }
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Draws screen-space triangles, one draw call per texture.
pub(super) struct TriangleRenderer {
    pipeline: wgpu::RenderPipeline,
    bindings: Bindings,
    /// 1x1 opaque white, bound for untextured triangles.
    white: GpuTexture,
    textures: HashMap<TextureId, GpuTexture>,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
    staging: Vec<GpuVertex>,
}

impl TriangleRenderer {
    /// `width`/`height` is the render resolution screen-space coordinates refer to.
    pub fn new(gpu: &Gpu, width: u32, height: u32) -> Self {
        let device = gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kelpo triangle shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/triangle.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kelpo triangle bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ViewportUniform>() as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kelpo triangle pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kelpo triangle pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GpuVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kelpo viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue().write_buffer(
            &viewport_ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform {
                size: [width as f32, height as f32],
                _pad: [0.0; 2],
            }),
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kelpo nearest sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let vertex_buffer = create_vertex_buffer(device, INITIAL_VERTEX_CAPACITY);

        let bindings = Bindings {
            layout: bind_group_layout,
            viewport_ubo,
            sampler,
        };
        let white = bindings.create_texture(gpu, "kelpo white texture", 1, 1, &[vec![[255; 4]]]);

        Self {
            pipeline,
            bindings,
            white,
            textures: HashMap::new(),
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            staging: Vec::new(),
        }
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Uploads every leading level of `texture` that still holds pixels.
    pub fn upload(&mut self, gpu: &Gpu, id: TextureId, texture: &Texture) -> RenderResult<()> {
        let levels: Vec<Vec<[u8; 4]>> = (0..texture.mip_level_count())
            .map_while(|m| texture.level(m).filter(|px| !px.is_empty()))
            .map(|px| px.iter().map(|t| t.to_rgba8()).collect())
            .collect();
        if levels.is_empty() {
            return Err(ErrorRecord::api_call("texture has no level-0 pixels to upload"));
        }

        let uploaded = self.bindings.create_texture(gpu, "kelpo texture", texture.width(), texture.height(), &levels);
        if self.textures.insert(id, uploaded).is_some() {
            log::debug!("texture {id:?} re-uploaded");
        }
        Ok(())
    }

    pub fn purge(&mut self) {
        log::debug!("purging {} gpu textures", self.textures.len());
        self.textures.clear();
    }

    /// Records one pass drawing `triangles` into `frame`.
    ///
    /// With `clear` the color target and depth are cleared first; otherwise
    /// both are loaded. Triangles whose texture is gone draw with the white
    /// placeholder.
    pub fn render(&mut self, gpu: &Gpu, frame: &mut GpuFrame, triangles: &[Triangle], clear: bool) {
        // Group by texture, keeping first-seen order between groups.
        let mut groups: Vec<(Option<TextureId>, Vec<GpuVertex>)> = Vec::new();
        for tri in triangles {
            let key = tri.texture.filter(|id| self.textures.contains_key(id));
            let slot = match groups.iter().position(|(k, _)| *k == key) {
                Some(i) => i,
                None => {
                    groups.push((key, Vec::new()));
                    groups.len() - 1
                }
            };
            groups[slot].1.extend(tri.vertices.iter().map(GpuVertex::from));
        }

        self.staging.clear();
        let mut draws = Vec::with_capacity(groups.len());
        for (key, vertices) in &groups {
            let start = self.staging.len() as u32;
            self.staging.extend_from_slice(vertices);
            draws.push((*key, start..self.staging.len() as u32));
        }

        self.ensure_vertex_capacity(gpu, self.staging.len() as u64);
        if !self.staging.is_empty() {
            gpu.queue()
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(self.staging.as_slice()));
        }

        let (color_load, depth_load) = if clear {
            (wgpu::LoadOp::Clear(wgpu::Color::BLACK), wgpu::LoadOp::Clear(1.0))
        } else {
            (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kelpo triangle pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: gpu.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if draws.is_empty() {
            return;
        }

        rpass.set_pipeline(&self.pipeline);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        for (key, range) in draws {
            let bind_group = key
                .and_then(|id| self.textures.get(&id))
                .map_or(&self.white.bind_group, |t| &t.bind_group);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw(range, 0..1);
        }
    }

    fn ensure_vertex_capacity(&mut self, gpu: &Gpu, needed: u64) {
        if needed <= self.vertex_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        log::debug!("growing gpu vertex buffer to {capacity} vertices");
        self.vertex_buffer = create_vertex_buffer(gpu.device(), capacity);
        self.vertex_capacity = capacity;
    }
}

/// Layout and shared resources every texture bind group is built from.
struct Bindings {
    layout: wgpu::BindGroupLayout,
    viewport_ubo: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl Bindings {
    fn create_texture(&self, gpu: &Gpu, label: &str, width: u32, height: u32, levels: &[Vec<[u8; 4]>]) -> GpuTexture {
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (m, pixels) in levels.iter().enumerate() {
            let (w, h) = ((width >> m).max(1), (height >> m).max(1));
            gpu.queue().write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: m as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(pixels.as_slice()),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.viewport_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        GpuTexture {
            _texture: texture,
            bind_group,
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertices: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("kelpo triangle vbo"),
        size: vertices * std::mem::size_of::<GpuVertex>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
