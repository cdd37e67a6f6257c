//! Generic table renderer and sort engine.

mod render;
mod sort;

pub use render::*;
pub use sort::sort_records;
pub(crate) use sort::parse_datetime;
