pub mod builder;
pub mod clustering;
pub mod index;
