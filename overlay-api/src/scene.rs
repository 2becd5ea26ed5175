//! Scene-side data the host supplies each frame: object records, view state,
//! change notifications, and the SceneSource trait the overlay reads through.

use thiserror::Error;

use crate::snapshot::MeshSnapshot;

/// Host-defined stable handle of a scene object. The overlay keys its cache on this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

/// Stable handle of a mesh data-block. Several objects may share one mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub u64);

/// Stable handle of a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u64);

/// Per-object scene state, read fresh by the overlay each frame.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Mesh data-block this object displays.
    pub mesh: MeshId,
    /// World transform: column-major 4x4 matrix (WGSL/wgpu convention).
    /// Index [col*4+row]; e.g. m[0..4] is the first column.
    pub transform: [f32; 16],
    /// Object-local bounding box, 8 corners.
    pub bound_box: [[f32; 3]; 8],
    /// Object-level hide state.
    pub hidden: bool,
    pub selected: bool,
    /// Whether the object is open for interactive mesh editing.
    pub in_edit_mode: bool,
    /// Material slots in slot order; polygon material indices point in here.
    pub material_slots: Vec<MaterialId>,
}

/// View/camera data for the current frame.
#[derive(Clone, Debug)]
pub struct ViewState {
    pub view_proj: [f32; 16],
    pub viewport_size: (u32, u32),
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view_proj: [
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
            viewport_size: (800, 600),
        }
    }
}

/// Scene-change notification the host forwards to the overlay between frames.
#[derive(Clone, Copy, Debug)]
pub enum SceneChange {
    /// Mesh geometry or topology changed; stales every object using it.
    MeshEdited { mesh: MeshId },
    /// An object's hide state flipped to `hidden`.
    HideToggled { object: ObjectId, hidden: bool },
    /// The active object moved from `previous` to `current`.
    ActiveChanged {
        previous: Option<ObjectId>,
        current: Option<ObjectId>,
    },
    /// Object left the scene; its cache entry is dropped.
    ObjectRemoved { object: ObjectId },
}

/// Mesh evaluation failure. Transient: the overlay skips the object for the
/// frame and retries on the next one.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("object is no longer present in the scene")]
    ObjectGone,
    #[error("mesh evaluation failed: {0}")]
    EvaluationFailed(String),
}

/// Host scene access: per-frame object listing plus on-demand mesh evaluation.
pub trait SceneSource {
    /// Mesh objects currently in the scene, in a stable order.
    fn objects(&self) -> Vec<SceneObject>;

    /// The active (edit-target) object, if any.
    fn active_object(&self) -> Option<ObjectId>;

    /// Evaluate the object's mesh through its modifier stack and return a
    /// snapshot of the result. The snapshot is an owned temporary copy;
    /// dropping it releases the evaluated data on every exit path.
    fn evaluated_mesh(&self, object: ObjectId) -> Result<MeshSnapshot, SnapshotError>;
}

/// Expand a min/max pair into 8 box corners (bit i selects min or max per axis).
pub fn bound_box(min: [f32; 3], max: [f32; 3]) -> [[f32; 3]; 8] {
    let mut corners = [[0.0f32; 3]; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        corner[0] = if i & 1 == 0 { min[0] } else { max[0] };
        corner[1] = if i & 2 == 0 { min[1] } else { max[1] };
        corner[2] = if i & 4 == 0 { min[2] } else { max[2] };
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_box_covers_all_corners() {
        let corners = bound_box([-1.0, -2.0, -3.0], [1.0, 2.0, 3.0]);
        assert_eq!(corners.len(), 8);
        // Every corner is made of min/max components only.
        for corner in &corners {
            assert!(corner[0] == -1.0 || corner[0] == 1.0);
            assert!(corner[1] == -2.0 || corner[1] == 2.0);
            assert!(corner[2] == -3.0 || corner[2] == 3.0);
        }
        // And all 8 combinations are distinct.
        for i in 0..8 {
            for j in (i + 1)..8 {
                assert_ne!(corners[i], corners[j]);
            }
        }
    }
}
