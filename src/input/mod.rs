pub mod events;

pub use events::{coalesce_viewport_changes, MapEvent};
