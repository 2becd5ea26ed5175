//! Ghost pass: the wgpu DrawSurface. Records the frame walk's draw calls and
//! plays them back as one load-preserving render pass over the host's color
//! and depth attachments (depth test Less, no depth write, alpha blending,
//! back-face culling for faces).

use overlay_api::{DrawError, DrawSurface};
use wgpu::CommandEncoder;

const GHOST_SHADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/ghost.wgsl"));

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct GhostUniform {
    mvp: [f32; 16],
    color: [f32; 4],
}

enum QueuedDraw {
    Triangles {
        mvp: [f32; 16],
        color: [f32; 4],
        positions: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
    },
    Lines {
        mvp: [f32; 16],
        color: [f32; 4],
        positions: Vec<[f32; 3]>,
    },
}

pub struct GhostPass {
    tri_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    current_mvp: [f32; 16],
    line_width: f32,
    queued: Vec<QueuedDraw>,
}

impl GhostPass {
    pub fn new(
        device: &wgpu::Device,
        format_color: wgpu::TextureFormat,
        format_depth: wgpu::TextureFormat,
    ) -> Result<Self, String> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ghost_shader"),
            source: wgpu::ShaderSource::Wgsl(GHOST_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ghost_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(80),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ghost_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: 12,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        };
        let color_target = Some(wgpu::ColorTargetState {
            format: format_color,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        });
        // Ghosts test against the scene's depth but never write it, so they
        // stay behind nothing they should occlude and occlude nothing.
        let depth_stencil = Some(wgpu::DepthStencilState {
            format: format_depth,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let tri_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ghost_tri_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[vertex_layout.clone()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[color_target.clone()],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: depth_stencil.clone(),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ghost_line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[color_target],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            tri_pipeline,
            line_pipeline,
            bind_group_layout,
            current_mvp: [
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
            line_width: 1.0,
            queued: Vec::new(),
        })
    }

    /// Last width handed to `set_line_width`. wgpu line primitives rasterize
    /// 1 px wide; the value is kept so hosts with a real line-width state can
    /// query it.
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Encode every draw recorded since the last encode into one render pass
    /// over the given attachments. Both attachments are loaded, the ghosts
    /// composite over whatever the host already rendered. Clears the queue.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) -> Result<(), String> {
        if self.queued.is_empty() {
            return Ok(());
        }
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ghost_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        for draw in &self.queued {
            let (mvp, color) = match draw {
                QueuedDraw::Triangles { mvp, color, .. } => (mvp, color),
                QueuedDraw::Lines { mvp, color, .. } => (mvp, color),
            };
            let uniform = GhostUniform {
                mvp: *mvp,
                color: *color,
            };
            let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("ghost_uniform"),
                size: 80,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&uniform_buf, 0, bytemuck::bytes_of(&uniform));
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("ghost_bind_group"),
                layout: &self.bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buf.as_entire_binding(),
                }],
            });
            rp.set_bind_group(0, &bind_group, &[]);
            match draw {
                QueuedDraw::Triangles {
                    positions, indices, ..
                } => {
                    let vertex_buf = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("ghost_faces_vb"),
                        size: (positions.len() * 12) as u64,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    queue.write_buffer(&vertex_buf, 0, bytemuck::cast_slice(positions));
                    let index_buf = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("ghost_faces_ib"),
                        size: (indices.len() * 12) as u64,
                        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    queue.write_buffer(&index_buf, 0, bytemuck::cast_slice(indices));
                    rp.set_pipeline(&self.tri_pipeline);
                    rp.set_vertex_buffer(0, vertex_buf.slice(..));
                    rp.set_index_buffer(index_buf.slice(..), wgpu::IndexFormat::Uint32);
                    rp.draw_indexed(0..(indices.len() * 3) as u32, 0, 0..1);
                }
                QueuedDraw::Lines { positions, .. } => {
                    let vertex_buf = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("ghost_edges_vb"),
                        size: (positions.len() * 12) as u64,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    queue.write_buffer(&vertex_buf, 0, bytemuck::cast_slice(positions));
                    rp.set_pipeline(&self.line_pipeline);
                    rp.set_vertex_buffer(0, vertex_buf.slice(..));
                    rp.draw(0..positions.len() as u32, 0..1);
                }
            }
        }
        drop(rp);
        self.queued.clear();
        Ok(())
    }
}

impl DrawSurface for GhostPass {
    fn begin_object(&mut self, mvp: &[f32; 16]) -> Result<(), DrawError> {
        self.current_mvp = *mvp;
        Ok(())
    }

    fn set_line_width(&mut self, width: f32) {
        // wgpu has no wide-line raster state; the width is recorded only.
        self.line_width = width;
    }

    fn draw_triangles(&mut self, positions: &[[f32; 3]], indices: &[[u32; 3]], color: [f32; 4]) {
        self.queued.push(QueuedDraw::Triangles {
            mvp: self.current_mvp,
            color,
            positions: positions.to_vec(),
            indices: indices.to_vec(),
        });
    }

    fn draw_lines(&mut self, segments: &[[f32; 3]], color: [f32; 4]) {
        self.queued.push(QueuedDraw::Lines {
            mvp: self.current_mvp,
            color,
            positions: segments.to_vec(),
        });
    }

    fn end_object(&mut self) {}
}
