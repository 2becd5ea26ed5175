//! Per-object ghost cache: entry lifecycle, invalidation tracking, and
//! membership pruning. Entries hold object-local batches; transforms are
//! refreshed every frame and never count as an invalidation input.

use std::collections::{HashMap, HashSet};

use overlay_api::{MeshId, ObjectId, SceneChange, SceneObject};

use crate::extract::GhostBatches;

/// Which ghost set an object contributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GhostMode {
    /// Edit mode: the object's hidden faces, material predicate applied.
    Edit,
    /// Hidden object: the whole mesh.
    Object,
}

/// Cached draw data and change baselines for one object.
#[derive(Debug)]
pub struct CacheEntry {
    /// False when the batches are stale and must be rebuilt before drawing.
    pub valid: bool,
    /// Hide state at the last observation; a flip stales the entry.
    pub last_hidden: bool,
    /// Whether the object was the active one at the last observation.
    pub last_active: bool,
    /// Ghost classification at the last observation; None when not ghosted.
    pub last_mode: Option<GhostMode>,
    /// Mesh data-block backing the batches.
    pub mesh: MeshId,
    /// World transform snapshot for draw submission.
    pub transform: [f32; 16],
    /// Object-local batches; None until the first successful rebuild.
    pub batches: Option<GhostBatches>,
}

impl CacheEntry {
    fn new(object: &SceneObject) -> Self {
        Self {
            valid: false,
            last_hidden: object.hidden,
            last_active: false,
            last_mode: None,
            mesh: object.mesh,
            transform: object.transform,
            batches: None,
        }
    }

    /// Mark the entry stale. Idempotent; returns true only on the
    /// valid-to-invalid flip.
    pub fn invalidate(&mut self) -> bool {
        let was_valid = self.valid;
        self.valid = false;
        was_valid
    }

    /// Frame-time diff against the object's current state: the backstop for
    /// changes that arrived without a notification. Stales the entry on
    /// hide/active/mode/mesh differences, refreshes every baseline, and
    /// always refreshes the draw transform.
    pub fn observe(&mut self, object: &SceneObject, is_active: bool, mode: Option<GhostMode>) {
        if object.hidden != self.last_hidden {
            self.invalidate();
            self.last_hidden = object.hidden;
        }
        if is_active != self.last_active {
            self.invalidate();
            self.last_active = is_active;
        }
        if mode != self.last_mode {
            self.invalidate();
            self.last_mode = mode;
        }
        if object.mesh != self.mesh {
            self.invalidate();
            self.mesh = object.mesh;
        }
        self.transform = object.transform;
    }
}

/// Object-keyed cache map plus the change tracking over it.
#[derive(Debug, Default)]
pub struct GhostCache {
    entries: HashMap<ObjectId, CacheEntry>,
}

impl GhostCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.entries.contains_key(&object)
    }

    pub fn get(&self, object: ObjectId) -> Option<&CacheEntry> {
        self.entries.get(&object)
    }

    /// Entry for the object, created stale on first encounter so the next
    /// frame rebuilds it.
    pub fn entry_mut(&mut self, object: &SceneObject) -> &mut CacheEntry {
        self.entries
            .entry(object.id)
            .or_insert_with(|| CacheEntry::new(object))
    }

    /// Drop entries whose object is no longer in the scene. Returns the
    /// number pruned.
    pub fn prune_missing(&mut self, objects: &[SceneObject]) -> usize {
        let live: HashSet<ObjectId> = objects.iter().map(|o| o.id).collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        before - self.entries.len()
    }

    /// Apply a batch of host notifications. Unknown ids are ignored (the
    /// entry may simply not exist yet). Returns how many entries flipped to
    /// stale; entries already stale do not count twice.
    pub fn apply_changes(&mut self, changes: &[SceneChange]) -> usize {
        let mut staled = 0;
        for change in changes {
            match *change {
                SceneChange::MeshEdited { mesh } => {
                    for entry in self.entries.values_mut() {
                        if entry.mesh == mesh && entry.invalidate() {
                            staled += 1;
                        }
                    }
                }
                SceneChange::HideToggled { object, hidden } => {
                    if let Some(entry) = self.entries.get_mut(&object) {
                        if entry.invalidate() {
                            staled += 1;
                        }
                        entry.last_hidden = hidden;
                    }
                }
                SceneChange::ActiveChanged { previous, current } => {
                    for object in [previous, current].into_iter().flatten() {
                        if let Some(entry) = self.entries.get_mut(&object) {
                            if entry.invalidate() {
                                staled += 1;
                            }
                        }
                    }
                }
                SceneChange::ObjectRemoved { object } => {
                    self.entries.remove(&object);
                }
            }
        }
        staled
    }
}
