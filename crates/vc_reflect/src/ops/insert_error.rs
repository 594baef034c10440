use core::error::Error;
use core::fmt;

/// Returned by [`Map::insert_boxed`](crate::ops::Map::insert_boxed) when a
/// key or value has the wrong concrete type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInsertError {
    /// `"key"` or `"value"`.
    pub slot: &'static str,
    pub expected: &'static str,
    pub found: &'static str,
}

impl fmt::Display for MapInsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "map {} type mismatch: expected `{}`, found `{}`",
            self.slot, self.expected, self.found,
        )
    }
}

impl Error for MapInsertError {}
