//! Headless overlay smoke test: build GhostOverlay on the default adapter,
//! render one frame of ghosts into offscreen color/depth targets, and print
//! the frame report. Stands in for a host whose scene pass ran just before.

use std::collections::HashMap;

use ghostmesh_bridge::GhostOverlay;
use overlay_api::{
    bound_box, MaterialId, MeshId, MeshSnapshot, ObjectId, OverlayConfig, SceneObject,
    SceneSource, SnapshotError, ViewState,
};

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

fn main() -> Result<(), String> {
    env_logger::init();
    let (device, queue) = pollster::block_on(request_device());
    let mut overlay = GhostOverlay::new(
        device,
        queue,
        wgpu::TextureFormat::Rgba8Unorm,
        wgpu::TextureFormat::Depth32Float,
    )?;

    let (width, height) = (800u32, 600u32);
    let color = make_target(
        overlay.device(),
        "smoke_color",
        wgpu::TextureFormat::Rgba8Unorm,
        width,
        height,
    );
    let depth = make_target(
        overlay.device(),
        "smoke_depth",
        wgpu::TextureFormat::Depth32Float,
        width,
        height,
    );
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    let mut meshes = HashMap::new();
    meshes.insert(MeshId(1), MeshSnapshot::cube(1.0));
    let scene = DemoScene {
        objects: vec![
            SceneObject {
                id: ObjectId(1),
                mesh: MeshId(1),
                transform: [
                    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -4.0,
                    1.0,
                ],
                bound_box: bound_box([-0.5; 3], [0.5; 3]),
                hidden: true,
                selected: false,
                in_edit_mode: false,
                material_slots: vec![MaterialId(1)],
            },
        ],
        meshes,
    };
    let view = ViewState {
        view_proj: perspective_projection(std::f32::consts::FRAC_PI_4, 800.0 / 600.0, 0.1, 100.0),
        viewport_size: (width, height),
    };

    let mut encoder = overlay
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("smoke_encoder"),
        });
    clear_targets(&mut encoder, &color_view, &depth_view);
    let report = overlay.overlay_frame(
        &scene,
        &view,
        &OverlayConfig::default(),
        &mut encoder,
        &color_view,
        &depth_view,
    )?;
    overlay.queue().submit(Some(encoder.finish()));

    println!("ghost overlay smoke: {:?}", report);
    println!("ghost overlay smoke: one frame OK");
    Ok(())
}

/// Clear both attachments the way a host scene pass would leave them.
fn clear_targets(
    encoder: &mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
) {
    let rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("smoke_clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color {
                    r: 0.1,
                    g: 0.1,
                    b: 0.12,
                    a: 1.0,
                }),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
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
}

fn make_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
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

async fn request_device() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .expect("No adapter");
    adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await
        .expect("No device")
}
