//! Windowed ghost demo: a hidden cube and an edit-mode cube with hidden
//! faces, ghosted over a cleared background. The surface is recreated each
//! frame from raw handles (wgpu::Surface lifetime tied to window; avoids
//! transmute and platform-specific staleness when window is dragged/resized).

use std::collections::HashMap;

use ghostmesh_bridge::GhostOverlay;
use overlay_api::{
    bound_box, MaterialId, MeshId, MeshSnapshot, ObjectId, OverlayConfig, SceneObject,
    SceneSource, SnapshotError, ViewState,
};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::SurfaceTargetUnsafe;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

struct DemoScene {
    objects: Vec<SceneObject>,
    meshes: HashMap<MeshId, MeshSnapshot>,
}

impl SceneSource for DemoScene {
    fn objects(&self) -> Vec<SceneObject> {
        self.objects.clone()
    }

    fn active_object(&self) -> Option<ObjectId> {
        None
    }

    fn evaluated_mesh(&self, object: ObjectId) -> Result<MeshSnapshot, SnapshotError> {
        let obj = self
            .objects
            .iter()
            .find(|o| o.id == object)
            .ok_or(SnapshotError::ObjectGone)?;
        self.meshes
            .get(&obj.mesh)
            .cloned()
            .ok_or(SnapshotError::ObjectGone)
    }
}

fn demo_scene() -> DemoScene {
    let mut half_hidden = MeshSnapshot::cube(1.2);
    for poly in half_hidden.polygons.iter_mut().take(3) {
        poly.hidden = false;
    }
    let mut meshes = HashMap::new();
    meshes.insert(MeshId(1), MeshSnapshot::cube(1.2));
    meshes.insert(MeshId(2), half_hidden);
    DemoScene {
        objects: vec![
            SceneObject {
                id: ObjectId(1),
                mesh: MeshId(1),
                transform: translation(-1.2),
                bound_box: bound_box([-0.6; 3], [0.6; 3]),
                hidden: true,
                selected: false,
                in_edit_mode: false,
                material_slots: vec![MaterialId(1)],
            },
            SceneObject {
                id: ObjectId(2),
                mesh: MeshId(2),
                transform: translation(1.2),
                bound_box: bound_box([-0.6; 3], [0.6; 3]),
                hidden: false,
                selected: false,
                in_edit_mode: true,
                material_slots: vec![MaterialId(2)],
            },
        ],
        meshes,
    }
}

struct Gpu {
    instance: wgpu::Instance,
    overlay: GhostOverlay,
    surface_format: wgpu::TextureFormat,
    depth: Option<(wgpu::TextureView, u32, u32)>,
}

impl Gpu {
    async fn from_raw_handles(
        raw_window_handle: raw_window_handle::RawWindowHandle,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
    ) -> Result<Self, String> {
        let instance = wgpu::Instance::default();
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_window_handle,
            raw_display_handle,
        };
        let surface = unsafe {
            instance
                .create_surface_unsafe(target)
                .map_err(|e| e.to_string())?
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("No adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await
            .map_err(|e| e.to_string())?;
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .first()
            .copied()
            .unwrap_or(wgpu::TextureFormat::Rgba8Unorm);
        let overlay = GhostOverlay::new(
            device,
            queue,
            surface_format,
            wgpu::TextureFormat::Depth32Float,
        )?;
        drop(surface);
        Ok(Self {
            instance,
            overlay,
            surface_format,
            depth: None,
        })
    }

    /// Depth target matching the swapchain size, recreated on resize.
    fn depth_view(&mut self, width: u32, height: u32) -> wgpu::TextureView {
        match &self.depth {
            Some((view, w, h)) if *w == width && *h == height => view.clone(),
            _ => {
                let texture = self.overlay.device().create_texture(&wgpu::TextureDescriptor {
                    label: Some("ghost_window_depth"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Depth32Float,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                self.depth = Some((view.clone(), width, height));
                view
            }
        }
    }
}

struct App {
    window: Option<winit::window::Window>,
    gpu: Option<Gpu>,
    scene: DemoScene,
    size: (u32, u32),
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            gpu: None,
            scene: demo_scene(),
            size: (800, 600),
        }
    }

    fn build_view_projection(&self) -> [f32; 16] {
        let (w, h) = self.size;
        let aspect = if h > 0 { w as f32 / h as f32 } else { 1.0 };
        let proj = perspective_projection(std::f32::consts::FRAC_PI_4, aspect, 0.1, 100.0);
        let view = look_at([3.0, 2.5, 4.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        mat4_mul(&proj, &view)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = winit::window::WindowAttributes::default()
            .with_title("ghostmesh overlay")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 600));
        let window = event_loop.create_window(attrs).expect("create window");
        let phys = window.inner_size();
        self.size = (phys.width, phys.height);
        self.window = Some(window);
        if let Some(ref w) = self.window {
            w.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical) => {
                self.size = (physical.width.max(1), physical.height.max(1));
                if let Some(ref w) = self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let window = match &self.window {
                    Some(w) => w,
                    None => return,
                };
                self.size = {
                    let phys = window.inner_size();
                    (phys.width.max(1), phys.height.max(1))
                };
                let (raw_window, raw_display) =
                    match (window.window_handle(), window.display_handle()) {
                        (Ok(wh), Ok(dh)) => (wh.as_raw(), dh.as_raw()),
                        _ => return,
                    };
                if self.gpu.is_none() {
                    match pollster::block_on(Gpu::from_raw_handles(raw_window, raw_display)) {
                        Ok(gpu) => self.gpu = Some(gpu),
                        Err(e) => {
                            eprintln!("ghost_window: gpu init failed: {}", e);
                            return;
                        }
                    }
                }
                let view_proj = self.build_view_projection();
                let gpu = match &mut self.gpu {
                    Some(g) => g,
                    None => return,
                };
                if let Err(e) = render(gpu, &self.scene, view_proj, self.size, raw_window, raw_display)
                {
                    eprintln!("ghost_window: frame failed: {}", e);
                }
            }
            _ => {}
        }
    }
}

fn render(
    gpu: &mut Gpu,
    scene: &DemoScene,
    view_proj: [f32; 16],
    size: (u32, u32),
    raw_window_handle: raw_window_handle::RawWindowHandle,
    raw_display_handle: raw_window_handle::RawDisplayHandle,
) -> Result<(), String> {
    let target = SurfaceTargetUnsafe::RawHandle {
        raw_window_handle,
        raw_display_handle,
    };
    let surface = unsafe {
        gpu.instance
            .create_surface_unsafe(target)
            .map_err(|e| e.to_string())?
    };
    let (width, height) = size;
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: gpu.surface_format,
        width,
        height,
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: wgpu::CompositeAlphaMode::Opaque,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(gpu.overlay.device(), &config);
    let frame = match surface.get_current_texture() {
        Ok(f) => f,
        Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
            surface.configure(gpu.overlay.device(), &config);
            surface.get_current_texture().map_err(|e| e.to_string())?
        }
        Err(e) => return Err(e.to_string()),
    };
    let color_view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = gpu.depth_view(width, height);

    let view = ViewState {
        view_proj,
        viewport_size: size,
    };
    let mut encoder =
        gpu.overlay
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ghost_window_encoder"),
            });
    // Stand-in for the host's scene pass: clear color and depth.
    let rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("ghost_window_clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color {
                    r: 0.13,
                    g: 0.14,
                    b: 0.16,
                    a: 1.0,
                }),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    drop(rp);

    gpu.overlay.overlay_frame(
        scene,
        &view,
        &OverlayConfig::default(),
        &mut encoder,
        &color_view,
        &depth_view,
    )?;
    gpu.overlay.queue().submit(Some(encoder.finish()));
    frame.present();
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::init();
    let event_loop = winit::event_loop::EventLoop::new().map_err(|e| e.to_string())?;
    let mut app = App::new();
    event_loop.run_app(&mut app).map_err(|e| e.to_string())?;
    Ok(())
}

fn translation(x: f32) -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, x, 0.0, 0.0, 1.0,
    ]
}

fn perspective_projection(fov_y_rad: f32, aspect: f32, near: f32, far: f32) -> [f32; 16] {
    let t = (fov_y_rad / 2.0).tan();
    let sy = 1.0 / t;
    let sx = sy / aspect;
    let a = far / (near - far);
    let b = (near * far) / (near - far);
    [
        sx, 0.0, 0.0, 0.0,
        0.0, sy, 0.0, 0.0,
        0.0, 0.0, a, -1.0,
        0.0, 0.0, b, 0.0,
    ]
}

fn look_at(eye: [f32; 3], center: [f32; 3], up: [f32; 3]) -> [f32; 16] {
    let f = [
        center[0] - eye[0],
        center[1] - eye[1],
        center[2] - eye[2],
    ];
    let len_f = (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt();
    let f = [f[0] / len_f, f[1] / len_f, f[2] / len_f];
    let s = [
        f[1] * up[2] - f[2] * up[1],
        f[2] * up[0] - f[0] * up[2],
        f[0] * up[1] - f[1] * up[0],
    ];
    let len_s = (s[0] * s[0] + s[1] * s[1] + s[2] * s[2]).sqrt();
    let s = [s[0] / len_s, s[1] / len_s, s[2] / len_s];
    let u = [
        s[1] * f[2] - s[2] * f[1],
        s[2] * f[0] - s[0] * f[2],
        s[0] * f[1] - s[1] * f[0],
    ];
    let tx = -(s[0] * eye[0] + s[1] * eye[1] + s[2] * eye[2]);
    let ty = -(u[0] * eye[0] + u[1] * eye[1] + u[2] * eye[2]);
    let tz = f[0] * eye[0] + f[1] * eye[1] + f[2] * eye[2];
    [
        s[0], u[0], -f[0], 0.0, s[1], u[1], -f[1], 0.0, s[2], u[2], -f[2], 0.0, tx, ty, tz, 1.0,
    ]
}

fn mat4_mul(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    let mut c = [0.0f32; 16];
    for col in 0..4 {
        for row in 0..4 {
            c[col * 4 + row] = a[row] * b[col * 4 + 0]
                + a[4 + row] * b[col * 4 + 1]
                + a[8 + row] * b[col * 4 + 2]
                + a[12 + row] * b[col * 4 + 3];
        }
    }
    c
}
