//! Frustum culling: conservative 8-corner clip-space test, plus the
//! column-major 4x4 helpers the overlay needs for it.

/// Corners with |w| below this are degenerate and count as out of view.
const W_EPSILON: f32 = 1e-6;

/// Multiply two 4x4 column-major matrices: C = A * B.
pub fn mat4_mul(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
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

/// Transform a point by a column-major 4x4 matrix, returning homogeneous
/// clip coordinates (x, y, z, w).
pub fn mat4_transform_point(m: &[f32; 16], p: [f32; 3]) -> [f32; 4] {
    let mut out = [0.0f32; 4];
    for row in 0..4 {
        out[row] = m[row] * p[0] + m[4 + row] * p[1] + m[8 + row] * p[2] + m[12 + row];
    }
    out
}

/// Conservative in-view test for an object-local bounding box.
///
/// Each of the 8 corners is taken to clip space by `view_proj * model`,
/// perspective-divided, and checked against the [-1, 1] cube on all three
/// axes. One passing corner keeps the object; corners behind the camera fall
/// out on the z axis after the divide flips their sign.
pub fn bounds_in_view(
    bound_box: &[[f32; 3]; 8],
    model: &[f32; 16],
    view_proj: &[f32; 16],
) -> bool {
    let mvp = mat4_mul(view_proj, model);
    for corner in bound_box {
        let clip = mat4_transform_point(&mvp, *corner);
        if clip[3].abs() < W_EPSILON {
            continue;
        }
        let x = clip[0] / clip[3];
        let y = clip[1] / clip[3];
        let z = clip[2] / clip[3];
        if (-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y) && (-1.0..=1.0).contains(&z) {
            return true;
        }
    }
    false
}
