//! The closed set of managed entity kinds and the field kinds that drive rendering.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Customer,
    Product,
    Store,
    Sale,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Customer,
        EntityKind::Product,
        EntityKind::Store,
        EntityKind::Sale,
    ];

    /// Display name, e.g. "Customer".
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Customer => "Customer",
            EntityKind::Product => "Product",
            EntityKind::Store => "Store",
            EntityKind::Sale => "Sale",
        }
    }

    /// Lowercase URL segment under `/api`.
    pub fn path_segment(self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Product => "product",
            EntityKind::Store => "store",
            EntityKind::Sale => "sale",
        }
    }

    /// Case-insensitive match against the display name / path segment.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.path_segment().eq_ignore_ascii_case(segment))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_path_segment(s.trim()).ok_or_else(|| EngineError::UnknownEntityKind(s.to_string()))
    }
}

/// How a field is edited and compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Non-negative number.
    Number,
    /// Date only; any time component is dropped for editing and display.
    Date,
    /// Foreign id plus denormalized display name of another entity.
    Reference(EntityKind),
}
