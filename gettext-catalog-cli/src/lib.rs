//! CLI library for testing purposes

pub mod lookup;
pub mod view;

pub use lookup::{Query, resolve};
pub use view::{truncate, view_json};
