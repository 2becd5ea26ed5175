//! Evaluated mesh snapshot: the modifier-evaluated geometry of one object,
//! in object-local space, in a form the overlay can triangulate directly.

/// One polygon of a snapshot: an ordered vertex loop plus its edge-table
/// entries, material slot index, and interactive-editing hide flag.
#[derive(Clone, Debug)]
pub struct Polygon {
    /// Vertex indices in loop order (length >= 3).
    pub verts: Vec<u32>,
    /// Edge-table indices, parallel to `verts`: edge i joins vert i and vert
    /// i+1 (wrapping at the end of the loop).
    pub edges: Vec<u32>,
    /// Index into the owning object's material slot list.
    pub material: u32,
    /// Hidden by the host's interactive editing state.
    pub hidden: bool,
}

/// Snapshot of an evaluated mesh. Positions are object-local; the world
/// transform is applied at draw time, never baked in here.
#[derive(Clone, Debug, Default)]
pub struct MeshSnapshot {
    pub positions: Vec<[f32; 3]>,
    pub polygons: Vec<Polygon>,
    /// Unique edges as vertex index pairs; polygon edge lists point in here.
    pub edges: Vec<[u32; 2]>,
}

impl MeshSnapshot {
    /// Axis-aligned cube centered at the origin: 8 vertices, 6 quads, 12
    /// edges, one material slot (index 0), every face marked hidden.
    /// Test and demo fixture.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let positions = vec![
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ];
        let edges = vec![
            [0, 1],
            [1, 2],
            [2, 3],
            [3, 0],
            [4, 5],
            [5, 6],
            [6, 7],
            [7, 4],
            [0, 4],
            [1, 5],
            [2, 6],
            [3, 7],
        ];
        // Quad loops wind counter-clockwise seen from outside the cube.
        let faces: [([u32; 4], [u32; 4]); 6] = [
            ([4, 5, 6, 7], [4, 5, 6, 7]),
            ([1, 0, 3, 2], [0, 3, 2, 1]),
            ([0, 4, 7, 3], [8, 7, 11, 3]),
            ([5, 1, 2, 6], [9, 1, 10, 5]),
            ([3, 7, 6, 2], [11, 6, 10, 2]),
            ([0, 1, 5, 4], [0, 9, 4, 8]),
        ];
        let polygons = faces
            .iter()
            .map(|(verts, face_edges)| Polygon {
                verts: verts.to_vec(),
                edges: face_edges.to_vec(),
                material: 0,
                hidden: true,
            })
            .collect();
        Self {
            positions,
            polygons,
            edges,
        }
    }
}
