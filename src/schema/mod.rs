//! Entity schema registry: static description of every kind's fields, labels and columns.

mod kind;
mod registry;

pub use kind::{EntityKind, FieldKind};
pub use registry::*;
