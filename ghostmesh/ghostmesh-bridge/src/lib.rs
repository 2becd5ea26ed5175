//! Bridge crate: glues the overlay core to the wgpu ghost pass behind one
//! install-once type the host drives per frame.

mod plugin;

pub use plugin::GhostOverlay;
