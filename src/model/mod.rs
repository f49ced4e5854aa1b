pub mod geometry;
pub mod hints;
pub mod registry;
pub mod screen;
pub mod server;
pub mod window;

pub use geometry::{CursorShape, Decoration, DimensionLimiter, Edge, Point, Rect, Strut};
pub use hints::SizeHints;
pub use registry::WindowRegistry;
pub use screen::ScreenLayout;
pub use window::{ManagedWindow, NetState, Protocols, WindowId, WindowProperties, WmState};
