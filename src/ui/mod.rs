pub mod popup;
pub mod style;

pub use popup::{ListingDetailHandler, PopupContent, PopupController, PopupState};
pub use style::{style_for, Rgba, ShapeClass, StyleResolver, StyleToken};
