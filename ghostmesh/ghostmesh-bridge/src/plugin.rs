//! Ghost overlay plugin: owns the wgpu device/queue, the overlay core, and
//! the ghost pass; the host calls overlay_frame after its own scene pass.

use ghostmesh_renderer::{FrameReport, GhostPass, OverlayRenderer};
use overlay_api::{OverlayConfig, SceneChange, SceneSource, ViewState};

/// Install-once ghost overlay.
///
/// Construction builds the ghost pipelines against the host's attachment
/// formats; dropping the value releases every GPU resource and all cached
/// batches, which is the whole teardown. Failing to construct leaves the
/// host renderer untouched.
pub struct GhostOverlay {
    device: wgpu::Device,
    queue: wgpu::Queue,
    renderer: OverlayRenderer,
    pass: GhostPass,
}

impl GhostOverlay {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format_color: wgpu::TextureFormat,
        format_depth: wgpu::TextureFormat,
    ) -> Result<Self, String> {
        let pass = GhostPass::new(&device, format_color, format_depth)?;
        Ok(Self {
            device,
            queue,
            renderer: OverlayRenderer::new(),
            pass,
        })
    }

    /// Access device/queue if the host needs them (e.g. for attachments).
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The overlay core, e.g. to inspect the cache.
    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    /// Mutable core access, e.g. to author ghost flags.
    pub fn renderer_mut(&mut self) -> &mut OverlayRenderer {
        &mut self.renderer
    }

    /// Forward host change notifications to the cache. Call with everything
    /// that happened since the last frame, before that frame's overlay_frame.
    pub fn notify(&mut self, changes: &[SceneChange]) -> usize {
        self.renderer.apply_changes(changes)
    }

    /// Run the overlay for one frame: walk the scene, rebuild stale caches,
    /// and encode the ghost pass over the host's color and depth attachments.
    /// Call after the opaque scene has been encoded so the ghosts composite
    /// on top of it.
    pub fn overlay_frame(
        &mut self,
        scene: &dyn SceneSource,
        view: &ViewState,
        config: &OverlayConfig,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) -> Result<FrameReport, String> {
        let report = self
            .renderer
            .render_frame(scene, view, config, &mut self.pass);
        self.pass
            .encode(&self.device, &self.queue, encoder, color_view, depth_view)?;
        Ok(report)
    }
}
