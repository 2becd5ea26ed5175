//! Ghostmesh renderer: draws the geometry a host viewport hides (hidden faces
//! of edit-mode objects, whole hidden objects) as translucent ghosts on top of
//! the normal scene. Core pieces: per-object cache with invalidation tracking,
//! frustum culling, batch extraction from mesh snapshots, and the frame walk
//! that ties them together. The wgpu ghost pass lives in `ghost_pass`.

pub mod cache;
pub mod cull;
pub mod extract;
pub mod flags;
pub mod frame;
pub mod ghost_pass;

pub use cache::{CacheEntry, GhostCache, GhostMode};
pub use extract::GhostBatches;
pub use flags::GhostFlags;
pub use frame::{FrameReport, OverlayRenderer};
pub use ghost_pass::GhostPass;
