pub mod interpolation;
pub mod navigation;
pub mod transitions;

// Re-export commonly used types and functions for convenience
pub use interpolation::{EasingFunction, Interpolation};
pub use navigation::{
    Locality, NavigationController, NavigationRequest, NavigationSource, NavigationToken,
};
pub use transitions::{CameraTransition, TransitionState};
