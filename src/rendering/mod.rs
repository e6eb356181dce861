pub mod headless;
pub mod surface;

// Re-export main types
pub use headless::{HeadlessSurface, SurfaceStats};
pub use surface::{CameraMove, ElementId, MapSurface, PopupId};
