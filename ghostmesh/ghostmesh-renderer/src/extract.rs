//! Batch extraction: turn an evaluated mesh snapshot into the flat ghost
//! triangle/edge batches the draw surface consumes.

use std::collections::HashSet;

use overlay_api::{MaterialId, MeshSnapshot, Polygon};

use crate::flags::GhostFlags;

/// GPU-ready ghost geometry for one object, in object-local space.
///
/// Face vertices are emitted per polygon loop (no sharing across polygons);
/// edge segments are consecutive position pairs. Building twice from the same
/// snapshot yields identical batches, emission follows snapshot order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GhostBatches {
    pub face_positions: Vec<[f32; 3]>,
    /// Triangle list indexing into `face_positions`.
    pub face_indices: Vec<[u32; 3]>,
    /// Line list: consecutive pairs form ghost edges.
    pub edge_segments: Vec<[f32; 3]>,
}

impl GhostBatches {
    pub fn is_empty(&self) -> bool {
        self.face_indices.is_empty() && self.edge_segments.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.face_indices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_segments.len() / 2
    }
}

/// Build batches for the hidden faces of an edit-mode object.
///
/// Applies the per-material ghost predicate (a face whose material opted out
/// contributes neither triangles nor edges) and recomputes the per-slot
/// hidden-face mirror in `flags` as a side effect.
pub fn build_edit_batches(
    snapshot: &MeshSnapshot,
    slots: &[MaterialId],
    flags: &mut GhostFlags,
) -> GhostBatches {
    flags.clear_hidden_faces(slots);
    let mut batches = GhostBatches::default();
    let mut seen_edges: HashSet<u32> = HashSet::new();
    for poly in &snapshot.polygons {
        if !poly.hidden {
            continue;
        }
        // The mirror is marked before the predicate: an opted-out material
        // still reports that it owns hidden faces.
        if let Some(material) = slots.get(poly.material as usize) {
            flags.mark_hidden_faces(*material);
            if !flags.material_ghost(*material) {
                continue;
            }
        }
        emit_polygon(&mut batches, &mut seen_edges, snapshot, poly);
    }
    batches
}

/// Build whole-mesh batches for a hidden object. Every polygon contributes
/// regardless of its hide flag or material.
pub fn build_object_batches(snapshot: &MeshSnapshot) -> GhostBatches {
    let mut batches = GhostBatches::default();
    let mut seen_edges: HashSet<u32> = HashSet::new();
    for poly in &snapshot.polygons {
        emit_polygon(&mut batches, &mut seen_edges, snapshot, poly);
    }
    batches
}

fn emit_polygon(
    batches: &mut GhostBatches,
    seen_edges: &mut HashSet<u32>,
    snapshot: &MeshSnapshot,
    poly: &Polygon,
) {
    // Fan triangulation over the loop; degenerate loops contribute no triangles.
    if poly.verts.len() >= 3 {
        let start = batches.face_positions.len() as u32;
        for &vert in &poly.verts {
            batches.face_positions.push(snapshot.positions[vert as usize]);
        }
        for i in 1..poly.verts.len() as u32 - 1 {
            batches.face_indices.push([start, start + i, start + i + 1]);
        }
    }
    // Shared edges are emitted once, by whichever polygon reaches them first.
    for &edge_index in &poly.edges {
        if !seen_edges.insert(edge_index) {
            continue;
        }
        let [a, b] = snapshot.edges[edge_index as usize];
        batches.edge_segments.push(snapshot.positions[a as usize]);
        batches.edge_segments.push(snapshot.positions[b as usize]);
    }
}
