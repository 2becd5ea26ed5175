//! Frame walk: prune the cache to scene membership, classify each object,
//! cull, rebuild stale entries, and submit draw calls in ghost state order.

use log::{debug, warn};

use overlay_api::{
    DrawSurface, OverlayConfig, SceneChange, SceneObject, SceneSource, ViewState,
};

use crate::cache::{GhostCache, GhostMode};
use crate::cull;
use crate::extract;
use crate::flags::GhostFlags;

/// Counters for one frame of the overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Objects the scene listed this frame.
    pub objects: usize,
    /// Ghost objects skipped by frustum culling.
    pub skipped: usize,
    /// Stale entries rebuilt this frame.
    pub rebuilds: usize,
    /// Objects served straight from a valid, non-empty cache.
    pub cache_hits: usize,
    /// Objects whose valid batches held nothing to draw.
    pub empty: usize,
    /// Objects that submitted draw calls.
    pub drawn: usize,
    /// Mesh evaluations that failed; the objects retry next frame.
    pub eval_failures: usize,
    /// Entries dropped because their object left the scene.
    pub pruned: usize,
    /// True when the draw surface refused ghost state and drawing was shut
    /// off for the rest of the frame.
    pub draw_disabled: bool,
}

/// The ghost overlay core: owns the per-object cache and the flag side table.
///
/// `render_frame` is the single per-frame entry point; `apply_changes` feeds
/// host notifications into the cache between frames. Construction allocates
/// nothing on the GPU, a draw surface is attached per frame.
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    cache: GhostCache,
    flags: GhostFlags,
    shader_warned: bool,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &GhostCache {
        &self.cache
    }

    pub fn flags(&self) -> &GhostFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut GhostFlags {
        &mut self.flags
    }

    /// Feed host change notifications into the cache. Call with everything
    /// that happened since the previous frame, before `render_frame`.
    /// Returns how many entries went stale.
    pub fn apply_changes(&mut self, changes: &[SceneChange]) -> usize {
        self.cache.apply_changes(changes)
    }

    /// Run the overlay for one frame against `scene` and draw into `surface`.
    ///
    /// Per ghost object this either skips it (culled), rebuilds its batches
    /// (stale entry), or draws from cache. A failed mesh evaluation skips the
    /// object for this frame only; a refused draw surface disables drawing
    /// for the rest of the frame while cache maintenance continues.
    pub fn render_frame(
        &mut self,
        scene: &dyn SceneSource,
        view: &ViewState,
        config: &OverlayConfig,
        surface: &mut dyn DrawSurface,
    ) -> FrameReport {
        let objects = scene.objects();
        let active = scene.active_object();

        let mut report = FrameReport {
            objects: objects.len(),
            pruned: self.cache.prune_missing(&objects),
            ..FrameReport::default()
        };
        let mut draw_enabled = true;

        for object in &objects {
            let is_active = active == Some(object.id);
            let mode = classify(&self.flags, object);
            let entry = self.cache.entry_mut(object);
            entry.observe(object, is_active, mode);

            let mode = match mode {
                Some(mode) => mode,
                None => continue,
            };

            // Selected and active objects are kept even off-screen so edit
            // feedback never pops.
            if !object.selected
                && !is_active
                && !cull::bounds_in_view(&object.bound_box, &object.transform, &view.view_proj)
            {
                report.skipped += 1;
                continue;
            }

            let mut rebuilt = false;
            if !entry.valid {
                match scene.evaluated_mesh(object.id) {
                    Ok(snapshot) => {
                        let batches = match mode {
                            GhostMode::Edit => extract::build_edit_batches(
                                &snapshot,
                                &object.material_slots,
                                &mut self.flags,
                            ),
                            GhostMode::Object => extract::build_object_batches(&snapshot),
                        };
                        debug!(
                            "ghost rebuild: object {} ({} tris, {} edges)",
                            object.id.0,
                            batches.triangle_count(),
                            batches.edge_count()
                        );
                        entry.batches = Some(batches);
                        entry.valid = true;
                        report.rebuilds += 1;
                        rebuilt = true;
                    }
                    Err(err) => {
                        // Transient: the entry stays stale and retries next frame.
                        debug!("ghost rebuild skipped: object {}: {}", object.id.0, err);
                        report.eval_failures += 1;
                        continue;
                    }
                }
            }

            let batches = match &entry.batches {
                Some(batches) => batches,
                None => continue,
            };
            if batches.is_empty() {
                report.empty += 1;
                continue;
            }
            if !rebuilt {
                report.cache_hits += 1;
            }

            if !draw_enabled {
                continue;
            }
            let (show_faces, show_edges, face_color, edge_color) = match mode {
                GhostMode::Edit => (
                    config.edit_show_faces,
                    config.edit_show_edges,
                    config.edit_face_color,
                    config.edit_edge_color,
                ),
                GhostMode::Object => (
                    config.object_show_faces,
                    config.object_show_edges,
                    config.object_face_color,
                    config.object_edge_color,
                ),
            };
            let want_faces = show_faces && !batches.face_indices.is_empty();
            let want_edges = show_edges && !batches.edge_segments.is_empty();
            if !want_faces && !want_edges {
                continue;
            }

            let mvp = cull::mat4_mul(&view.view_proj, &entry.transform);
            if let Err(err) = surface.begin_object(&mvp) {
                if !self.shader_warned {
                    warn!("ghost overlay drawing disabled: {}", err);
                    self.shader_warned = true;
                }
                draw_enabled = false;
                report.draw_disabled = true;
                continue;
            }
            if want_faces {
                surface.draw_triangles(&batches.face_positions, &batches.face_indices, face_color);
            }
            if want_edges {
                surface.set_line_width(config.line_width.clamp(1.0, 5.0));
                surface.draw_lines(&batches.edge_segments, edge_color);
            }
            surface.end_object();
            report.drawn += 1;
        }
        report
    }
}

fn classify(flags: &GhostFlags, object: &SceneObject) -> Option<GhostMode> {
    if object.in_edit_mode && !object.hidden {
        Some(GhostMode::Edit)
    } else if object.hidden && !flags.object_ghost_hide(object.id) {
        Some(GhostMode::Object)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_api::{
        bound_box, DrawError, MaterialId, MeshId, MeshSnapshot, ObjectId, SnapshotError,
    };
    use std::cell::Cell;
    use std::collections::{HashMap, HashSet};

    const IDENTITY: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];

    #[derive(Debug, PartialEq)]
    enum Call {
        Begin([f32; 16]),
        LineWidth(f32),
        Triangles(usize, [f32; 4]),
        Lines(usize, [f32; 4]),
        End,
    }

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<Call>,
        fail_begin: bool,
        begin_attempts: usize,
    }

    impl DrawSurface for RecordingSurface {
        fn begin_object(&mut self, mvp: &[f32; 16]) -> Result<(), DrawError> {
            self.begin_attempts += 1;
            if self.fail_begin {
                return Err(DrawError::ShaderUnavailable("no pipeline".into()));
            }
            self.calls.push(Call::Begin(*mvp));
            Ok(())
        }

        fn set_line_width(&mut self, width: f32) {
            self.calls.push(Call::LineWidth(width));
        }

        fn draw_triangles(
            &mut self,
            _positions: &[[f32; 3]],
            indices: &[[u32; 3]],
            color: [f32; 4],
        ) {
            self.calls.push(Call::Triangles(indices.len(), color));
        }

        fn draw_lines(&mut self, segments: &[[f32; 3]], color: [f32; 4]) {
            self.calls.push(Call::Lines(segments.len() / 2, color));
        }

        fn end_object(&mut self) {
            self.calls.push(Call::End);
        }
    }

    struct FakeScene {
        objects: Vec<SceneObject>,
        active: Option<ObjectId>,
        meshes: HashMap<MeshId, MeshSnapshot>,
        fail_eval: HashSet<ObjectId>,
        evals: Cell<usize>,
    }

    impl FakeScene {
        fn new(objects: Vec<SceneObject>, meshes: Vec<(MeshId, MeshSnapshot)>) -> Self {
            Self {
                objects,
                active: None,
                meshes: meshes.into_iter().collect(),
                fail_eval: HashSet::new(),
                evals: Cell::new(0),
            }
        }

        fn object_mut(&mut self, id: ObjectId) -> &mut SceneObject {
            self.objects.iter_mut().find(|o| o.id == id).unwrap()
        }
    }

    impl SceneSource for FakeScene {
        fn objects(&self) -> Vec<SceneObject> {
            self.objects.clone()
        }

        fn active_object(&self) -> Option<ObjectId> {
            self.active
        }

        fn evaluated_mesh(&self, object: ObjectId) -> Result<MeshSnapshot, SnapshotError> {
            self.evals.set(self.evals.get() + 1);
            if self.fail_eval.contains(&object) {
                return Err(SnapshotError::EvaluationFailed("modifier stack".into()));
            }
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

    fn base_object(id: u64, mesh: u64) -> SceneObject {
        SceneObject {
            id: ObjectId(id),
            mesh: MeshId(mesh),
            transform: IDENTITY,
            bound_box: bound_box([-0.5; 3], [0.5; 3]),
            hidden: false,
            selected: false,
            in_edit_mode: false,
            material_slots: vec![MaterialId(mesh)],
        }
    }

    fn hidden_object(id: u64, mesh: u64) -> SceneObject {
        SceneObject {
            hidden: true,
            ..base_object(id, mesh)
        }
    }

    fn edit_object(id: u64, mesh: u64) -> SceneObject {
        SceneObject {
            in_edit_mode: true,
            ..base_object(id, mesh)
        }
    }

    fn translated(mut object: SceneObject, x: f32) -> SceneObject {
        object.transform[12] = x;
        object
    }

    fn run(
        renderer: &mut OverlayRenderer,
        scene: &FakeScene,
        config: &OverlayConfig,
    ) -> (FrameReport, RecordingSurface) {
        let mut surface = RecordingSurface::default();
        let report = renderer.render_frame(scene, &ViewState::default(), config, &mut surface);
        (report, surface)
    }

    #[test]
    fn first_frame_rebuilds_then_hits() {
        let scene = FakeScene::new(
            vec![hidden_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        assert_eq!(report.cache_hits, 0);
        assert_eq!(report.drawn, 1);

        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 0);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.drawn, 1);
        assert_eq!(scene.evals.get(), 1);
    }

    #[test]
    fn empty_batches_are_a_valid_cache_state() {
        let mut cube = MeshSnapshot::cube(1.0);
        for poly in &mut cube.polygons {
            poly.hidden = false;
        }
        let scene = FakeScene::new(vec![edit_object(1, 1)], vec![(MeshId(1), cube)]);
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        let (report, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        assert_eq!(report.empty, 1);
        assert_eq!(report.drawn, 0);
        assert!(surface.calls.is_empty());

        // Still empty next frame, and no rebuild happens.
        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 0);
        assert_eq!(report.empty, 1);
        assert_eq!(scene.evals.get(), 1);
    }

    #[test]
    fn culled_objects_are_neither_rebuilt_nor_drawn() {
        let scene = FakeScene::new(
            vec![translated(hidden_object(1, 1), 10.0)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        for _ in 0..3 {
            let (report, surface) = run(&mut renderer, &scene, &config);
            assert_eq!(report.skipped, 1);
            assert_eq!(report.rebuilds, 0);
            assert_eq!(report.drawn, 0);
            assert!(surface.calls.is_empty());
        }
        assert_eq!(scene.evals.get(), 0);
    }

    #[test]
    fn selected_objects_bypass_culling() {
        let mut object = translated(hidden_object(1, 1), 10.0);
        object.selected = true;
        let scene = FakeScene::new(vec![object], vec![(MeshId(1), MeshSnapshot::cube(1.0))]);
        let mut renderer = OverlayRenderer::new();

        let (report, _) = run(&mut renderer, &scene, &OverlayConfig::default());
        assert_eq!(report.skipped, 0);
        assert_eq!(report.rebuilds, 1);
        assert_eq!(report.drawn, 1);
    }

    #[test]
    fn active_objects_bypass_culling() {
        let mut scene = FakeScene::new(
            vec![translated(edit_object(1, 1), 10.0)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        scene.active = Some(ObjectId(1));
        let mut renderer = OverlayRenderer::new();

        let (report, _) = run(&mut renderer, &scene, &OverlayConfig::default());
        assert_eq!(report.skipped, 0);
        assert_eq!(report.drawn, 1);
    }

    #[test]
    fn hide_round_trip_rebuilds_identical_batches() {
        let mut scene = FakeScene::new(
            vec![hidden_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        run(&mut renderer, &scene, &config);
        let first = renderer.cache().get(ObjectId(1)).unwrap().batches.clone();
        assert!(first.is_some());

        // Unhide: the object stops ghosting, no notification sent.
        scene.object_mut(ObjectId(1)).hidden = false;
        let (report, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(report.drawn, 0);
        assert!(surface.calls.is_empty());

        // Re-hide: the diff backstop stales the entry and the rebuild is
        // byte-identical to the first one.
        scene.object_mut(ObjectId(1)).hidden = true;
        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        let second = renderer.cache().get(ObjectId(1)).unwrap().batches.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn notification_plus_diff_stale_only_once() {
        let mut scene = FakeScene::new(
            vec![base_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();
        run(&mut renderer, &scene, &config);
        assert_eq!(scene.evals.get(), 0);

        // Host both notifies the hide and shows it in the scene state.
        renderer.apply_changes(&[SceneChange::HideToggled {
            object: ObjectId(1),
            hidden: true,
        }]);
        scene.object_mut(ObjectId(1)).hidden = true;
        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        assert_eq!(scene.evals.get(), 1);
    }

    #[test]
    fn mesh_edit_notification_rebuilds_sharers() {
        let mut scene = FakeScene::new(
            vec![edit_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        scene.active = Some(ObjectId(1));
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);

        // Unhide one face and notify; the rebuilt batches shrink.
        if let Some(mesh) = scene.meshes.get_mut(&MeshId(1)) {
            mesh.polygons[0].hidden = false;
        }
        renderer.apply_changes(&[SceneChange::MeshEdited { mesh: MeshId(1) }]);
        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        let entry = renderer.cache().get(ObjectId(1)).unwrap();
        assert_eq!(entry.batches.as_ref().unwrap().triangle_count(), 10);
    }

    #[test]
    fn removed_objects_leave_the_cache() {
        let mut scene = FakeScene::new(
            vec![hidden_object(1, 1), hidden_object(2, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();
        run(&mut renderer, &scene, &config);
        assert_eq!(renderer.cache().len(), 2);

        scene.objects.remove(1);
        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.pruned, 1);
        assert_eq!(renderer.cache().len(), 1);
        assert!(!renderer.cache().contains(ObjectId(2)));
    }

    #[test]
    fn object_opt_out_suppresses_whole_object_ghosting() {
        let scene = FakeScene::new(
            vec![hidden_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        renderer.flags_mut().set_object_ghost_hide(ObjectId(1), true);
        let config = OverlayConfig::default();

        let (report, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(report.drawn, 0);
        assert_eq!(report.rebuilds, 0);
        assert!(surface.calls.is_empty());
        assert_eq!(scene.evals.get(), 0);

        // Clearing the opt-out brings the ghost back on the next frame.
        renderer.flags_mut().set_object_ghost_hide(ObjectId(1), false);
        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        assert_eq!(report.drawn, 1);
    }

    #[test]
    fn transient_eval_failure_skips_then_retries() {
        let mut scene = FakeScene::new(
            vec![hidden_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        scene.fail_eval.insert(ObjectId(1));
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        let (report, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(report.eval_failures, 1);
        assert_eq!(report.rebuilds, 0);
        assert_eq!(report.drawn, 0);
        assert!(surface.calls.is_empty());

        scene.fail_eval.clear();
        let (report, _) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        assert_eq!(report.drawn, 1);
    }

    #[test]
    fn refused_surface_disables_drawing_but_not_caching() {
        let scene = FakeScene::new(
            vec![hidden_object(1, 1), hidden_object(2, 2)],
            vec![
                (MeshId(1), MeshSnapshot::cube(1.0)),
                (MeshId(2), MeshSnapshot::cube(2.0)),
            ],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        let mut surface = RecordingSurface {
            fail_begin: true,
            ..RecordingSurface::default()
        };
        let report =
            renderer.render_frame(&scene, &ViewState::default(), &config, &mut surface);
        assert!(report.draw_disabled);
        assert_eq!(report.drawn, 0);
        assert_eq!(report.rebuilds, 2);
        // After the first refusal no further begin is attempted this frame.
        assert_eq!(surface.begin_attempts, 1);

        // A working surface next frame draws straight from cache.
        let (report, _) = run(&mut renderer, &scene, &config);
        assert!(!report.draw_disabled);
        assert_eq!(report.cache_hits, 2);
        assert_eq!(report.drawn, 2);
    }

    #[test]
    fn draw_calls_follow_ghost_state_order() {
        let scene = FakeScene::new(
            vec![edit_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        let (_, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(
            surface.calls,
            vec![
                Call::Begin(IDENTITY),
                Call::Triangles(12, config.edit_face_color),
                Call::LineWidth(2.0),
                Call::Lines(12, config.edit_edge_color),
                Call::End,
            ]
        );
    }

    #[test]
    fn hidden_objects_draw_with_object_colors() {
        let scene = FakeScene::new(
            vec![hidden_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();

        let (_, surface) = run(&mut renderer, &scene, &config);
        assert!(surface
            .calls
            .contains(&Call::Triangles(12, config.object_face_color)));
        assert!(surface
            .calls
            .contains(&Call::Lines(12, config.object_edge_color)));
    }

    #[test]
    fn display_toggles_gate_draws_without_staling_the_cache() {
        let scene = FakeScene::new(
            vec![edit_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        run(&mut renderer, &scene, &OverlayConfig::default());

        let mut config = OverlayConfig::default();
        config.edit_show_faces = false;
        let (report, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 0);
        assert!(!surface
            .calls
            .iter()
            .any(|c| matches!(c, Call::Triangles(..))));
        assert!(surface.calls.iter().any(|c| matches!(c, Call::Lines(..))));

        config.edit_show_edges = false;
        let (report, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 0);
        assert_eq!(report.drawn, 0);
        assert!(surface.calls.is_empty());
        assert!(renderer.cache().get(ObjectId(1)).unwrap().valid);
    }

    #[test]
    fn line_width_is_clamped_at_draw_time() {
        let scene = FakeScene::new(
            vec![hidden_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let mut config = OverlayConfig::default();
        config.line_width = 9.0;

        let (_, surface) = run(&mut renderer, &scene, &config);
        assert!(surface.calls.contains(&Call::LineWidth(5.0)));
    }

    #[test]
    fn mode_flip_rebuilds_for_the_new_ghost_set() {
        let mut scene = FakeScene::new(
            vec![hidden_object(1, 1)],
            vec![(MeshId(1), MeshSnapshot::cube(1.0))],
        );
        let mut renderer = OverlayRenderer::new();
        let config = OverlayConfig::default();
        run(&mut renderer, &scene, &config);

        // The object reappears open for editing; ghosts switch to edit colors.
        {
            let object = scene.object_mut(ObjectId(1));
            object.hidden = false;
            object.in_edit_mode = true;
        }
        let (report, surface) = run(&mut renderer, &scene, &config);
        assert_eq!(report.rebuilds, 1);
        assert!(surface
            .calls
            .contains(&Call::Triangles(12, config.edit_face_color)));
    }
}
