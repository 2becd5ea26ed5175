//! CPU-only cache demo: drive OverlayRenderer against an in-memory scene for
//! a few frames of edits, hide toggles, and removals, printing each report.
//! No GPU is touched; draws go to a do-nothing surface. RUST_LOG=debug shows
//! the per-rebuild log lines.

use std::collections::HashMap;

use ghostmesh_renderer::OverlayRenderer;
use overlay_api::{
    bound_box, DrawError, DrawSurface, MaterialId, MeshId, MeshSnapshot, ObjectId, OverlayConfig,
    SceneChange, SceneObject, SceneSource, SnapshotError, ViewState,
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

struct NullSurface;

impl DrawSurface for NullSurface {
    fn begin_object(&mut self, _mvp: &[f32; 16]) -> Result<(), DrawError> {
        Ok(())
    }
    fn set_line_width(&mut self, _width: f32) {}
    fn draw_triangles(&mut self, _p: &[[f32; 3]], _i: &[[u32; 3]], _c: [f32; 4]) {}
    fn draw_lines(&mut self, _s: &[[f32; 3]], _c: [f32; 4]) {}
    fn end_object(&mut self) {}
}

fn main() {
    env_logger::init();

    let mut edited_cube = MeshSnapshot::cube(1.0);
    for poly in edited_cube.polygons.iter_mut().skip(3) {
        poly.hidden = false;
    }
    let mut meshes = HashMap::new();
    meshes.insert(MeshId(1), MeshSnapshot::cube(1.0));
    meshes.insert(MeshId(2), edited_cube);

    let mut scene = DemoScene {
        objects: vec![
            ghost_object(1, 1, 0.0),
            edit_object(2, 2, 2.5),
            // Shares mesh 1, parked far outside the view frustum.
            ghost_object(3, 1, 60.0),
        ],
        meshes,
    };

    let view = ViewState {
        view_proj: camera(),
        viewport_size: (800, 600),
    };
    let config = OverlayConfig::default();
    let mut renderer = OverlayRenderer::new();
    let mut surface = NullSurface;

    let report = renderer.render_frame(&scene, &view, &config, &mut surface);
    println!("frame 1 (cold cache):     {:?}", report);

    let report = renderer.render_frame(&scene, &view, &config, &mut surface);
    println!("frame 2 (unchanged):      {:?}", report);

    // Unhide one more face of the edited mesh and notify.
    if let Some(mesh) = scene.meshes.get_mut(&MeshId(2)) {
        mesh.polygons[0].hidden = false;
    }
    renderer.apply_changes(&[SceneChange::MeshEdited { mesh: MeshId(2) }]);
    let report = renderer.render_frame(&scene, &view, &config, &mut surface);
    println!("frame 3 (mesh edited):    {:?}", report);

    // Unhide object 1 without any notification; the frame diff catches it.
    scene.objects[0].hidden = false;
    let report = renderer.render_frame(&scene, &view, &config, &mut surface);
    println!("frame 4 (object unhid):   {:?}", report);

    scene.objects[0].hidden = true;
    let report = renderer.render_frame(&scene, &view, &config, &mut surface);
    println!("frame 5 (object re-hid):  {:?}", report);

    scene.objects.remove(2);
    let report = renderer.render_frame(&scene, &view, &config, &mut surface);
    println!("frame 6 (object removed): {:?}", report);

    println!("cached objects at exit: {}", renderer.cache().len());
}

fn ghost_object(id: u64, mesh: u64, x: f32) -> SceneObject {
    SceneObject {
        id: ObjectId(id),
        mesh: MeshId(mesh),
        transform: translation(x),
        bound_box: bound_box([-0.5; 3], [0.5; 3]),
        hidden: true,
        selected: false,
        in_edit_mode: false,
        material_slots: vec![MaterialId(1)],
    }
}

fn edit_object(id: u64, mesh: u64, x: f32) -> SceneObject {
    SceneObject {
        hidden: false,
        in_edit_mode: true,
        ..ghost_object(id, mesh, x)
    }
}

fn translation(x: f32) -> [f32; 16] {
    [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, x, 0.0, 0.0, 1.0,
    ]
}

fn camera() -> [f32; 16] {
    let proj = perspective_projection(std::f32::consts::FRAC_PI_4, 800.0 / 600.0, 0.1, 100.0);
    let view = look_at([0.0, 4.0, 10.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
    mat4_mul(&proj, &view)
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
