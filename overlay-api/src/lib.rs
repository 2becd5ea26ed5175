//! Shared host-facing API for the ghostmesh overlay.
//! Defines scene/view types, the evaluated mesh snapshot, and the SceneSource and
//! DrawSurface traits so a host can drive the overlay renderer with the same code
//! path regardless of which GPU surface sits underneath (render_frame + encode).

mod config;
mod draw;
mod scene;
mod snapshot;

pub use config::OverlayConfig;
pub use draw::{DrawError, DrawSurface};
pub use scene::{
    bound_box, MaterialId, MeshId, ObjectId, SceneChange, SceneObject, SceneSource,
    SnapshotError, ViewState,
};
pub use snapshot::{MeshSnapshot, Polygon};
