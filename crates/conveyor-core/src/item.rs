use crate::id::PartId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single item riding the belt or held by a worker.
///
/// Only the part identifier is modeled, so two items are equal exactly when
/// their identifiers are. Items move by value on every hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    part: PartId,
}

impl Item {
    pub fn new(part: PartId) -> Self {
        Self { part }
    }

    pub fn part(&self) -> PartId {
        self.part
    }
}

impl From<PartId> for Item {
    fn from(part: PartId) -> Self {
        Self::new(part)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.part.fmt(f)
    }
}
