pub mod engine;
pub mod placement;
pub mod remap;

pub use engine::{GeometryEngine, GeometrySettings, Proposal, Sanitized};
pub use remap::{Remapped, ScreenRemapper, remap, remap_axis};
