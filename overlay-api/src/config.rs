//! Overlay configuration: ghost colors, display toggles, line width.

/// Ghost overlay display configuration.
///
/// Read fresh at draw time every frame; changing a value here never stales
/// cached geometry, the next frame simply draws with the new settings.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    /// Draw ghost edges of hidden faces on edit-mode objects.
    pub edit_show_edges: bool,
    /// Draw ghost faces of hidden faces on edit-mode objects.
    pub edit_show_faces: bool,
    /// Draw ghost edges of hidden objects.
    pub object_show_edges: bool,
    /// Draw ghost faces of hidden objects.
    pub object_show_faces: bool,
    /// Edge color for edit-mode ghosts (straight RGBA).
    pub edit_edge_color: [f32; 4],
    /// Face color for edit-mode ghosts.
    pub edit_face_color: [f32; 4],
    /// Edge color for hidden-object ghosts.
    pub object_edge_color: [f32; 4],
    /// Face color for hidden-object ghosts.
    pub object_face_color: [f32; 4],
    /// Ghost edge width in pixels, clamped to 1..=5 at draw time.
    pub line_width: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            edit_show_edges: true,
            edit_show_faces: true,
            object_show_edges: true,
            object_show_faces: true,
            edit_edge_color: [0.0, 1.0, 0.0, 0.1],
            edit_face_color: [0.0, 0.8, 0.0, 0.1],
            object_edge_color: [0.8, 0.8, 0.0, 0.1],
            object_face_color: [0.5, 0.5, 0.0, 0.1],
            line_width: 2.0,
        }
    }
}
