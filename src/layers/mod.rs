pub mod manager;
pub mod marker;
pub mod scheduler;

pub use manager::{MarkerManager, ReconcileReport};
pub use marker::{GraphicElement, MarkerHandle, MarkerKey, MarkerKind};
pub use scheduler::ReconcileScheduler;
