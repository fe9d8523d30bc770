//! Alert templates: the static per-kind table and its renderer.

mod render;
mod table;

pub use render::{TemplateError, TemplateRenderer};
pub use table::AlertTemplate;
