//! Ghost flag side table: material- and object-level ghost controls, owned by
//! the overlay instead of being injected onto host data types.

use std::collections::HashSet;

use overlay_api::{MaterialId, ObjectId};

/// Authored and derived ghost flags.
///
/// Authored flags persist until the host changes them. The per-material
/// "hides faces" mirror is derived state: it is recomputed from scratch for a
/// material's slots every time an edit-mode object using them rebuilds, so UI
/// can show which materials currently own hidden geometry.
#[derive(Debug, Default)]
pub struct GhostFlags {
    // Opt-out sets; absence means the default (ghost on, no hiding).
    ghost_off_materials: HashSet<MaterialId>,
    hidden_objects_opted_out: HashSet<ObjectId>,
    materials_with_hidden_faces: HashSet<MaterialId>,
}

impl GhostFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authored: whether hidden faces using this material ghost-render.
    /// Defaults to true for materials never set.
    pub fn set_material_ghost(&mut self, material: MaterialId, ghost: bool) {
        if ghost {
            self.ghost_off_materials.remove(&material);
        } else {
            self.ghost_off_materials.insert(material);
        }
    }

    pub fn material_ghost(&self, material: MaterialId) -> bool {
        !self.ghost_off_materials.contains(&material)
    }

    /// Authored: suppress whole-object ghosting for this object while hidden.
    /// Defaults to false.
    pub fn set_object_ghost_hide(&mut self, object: ObjectId, hide: bool) {
        if hide {
            self.hidden_objects_opted_out.insert(object);
        } else {
            self.hidden_objects_opted_out.remove(&object);
        }
    }

    pub fn object_ghost_hide(&self, object: ObjectId) -> bool {
        self.hidden_objects_opted_out.contains(&object)
    }

    /// Derived: whether any hidden face used this material at its last rebuild.
    pub fn material_hides_faces(&self, material: MaterialId) -> bool {
        self.materials_with_hidden_faces.contains(&material)
    }

    /// Reset the derived mirror for an object's slots before a rebuild walks
    /// its faces.
    pub(crate) fn clear_hidden_faces(&mut self, slots: &[MaterialId]) {
        for material in slots {
            self.materials_with_hidden_faces.remove(material);
        }
    }

    pub(crate) fn mark_hidden_faces(&mut self, material: MaterialId) {
        self.materials_with_hidden_faces.insert(material);
    }
}
