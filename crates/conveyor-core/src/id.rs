use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an item design (not an instance). Cheap to copy and compare.
///
/// Parts are conventionally tagged with a character code (`'A'`, `'B'`,
/// `'P'`), but any `u32` is a valid identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartId(pub u32);

impl PartId {
    /// Build a part identifier from its character code.
    pub const fn from_char(code: char) -> Self {
        Self(code as u32)
    }

    /// The character code of this part, if it has a printable one.
    pub fn as_char(self) -> Option<char> {
        char::from_u32(self.0).filter(|c| c.is_ascii_graphic())
    }
}

impl From<char> for PartId {
    fn from(code: char) -> Self {
        Self::from_char(code)
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_char() {
            Some(c) => write!(f, "{c}"),
            None => write!(f, "#{}", self.0),
        }
    }
}
