//! Draw-surface seam: the immediate-mode drawing calls the overlay submits
//! ghost batches through. The wgpu ghost pass implements this; a host with
//! its own immediate-mode GPU layer can implement it directly instead.

use thiserror::Error;

/// Failure to set up drawing primitives for the frame.
#[derive(Debug, Error)]
pub enum DrawError {
    /// The uniform-color shader (or its pipeline) could not be provided.
    #[error("uniform-color shader unavailable: {0}")]
    ShaderUnavailable(String),
}

/// Immediate-mode surface the overlay draws each ghost object into.
///
/// Call order per object: `begin_object` binds the uniform-color shader and
/// enters ghost state (depth test Less, alpha blending, back-face culling),
/// the draw calls submit geometry in object-local space, and `end_object`
/// restores whatever GPU state was active before. Implementations must not
/// leak ghost state across objects or into the host's own drawing.
pub trait DrawSurface {
    /// Enter ghost state for one object. `mvp` is the full column-major
    /// model-view-projection matrix applied to every vertex that follows.
    fn begin_object(&mut self, mvp: &[f32; 16]) -> Result<(), DrawError>;

    /// Width for subsequent `draw_lines` calls.
    fn set_line_width(&mut self, width: f32);

    /// Indexed triangle list with a single flat color.
    fn draw_triangles(&mut self, positions: &[[f32; 3]], indices: &[[u32; 3]], color: [f32; 4]);

    /// Line list: consecutive position pairs form independent segments.
    fn draw_lines(&mut self, segments: &[[f32; 3]], color: [f32; 4]);

    /// Leave ghost state, restoring prior GPU state.
    fn end_object(&mut self);
}
