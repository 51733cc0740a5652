//! Plane grid error types.

/// Errors raised by [`crate::PlaneGrid`] lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaneError {
    /// Nothing is stored at the requested position.
    #[error("no value at ({x}, {y})")]
    NotFound {
        /// X coordinate of the lookup.
        x: i32,
        /// Y coordinate of the lookup.
        y: i32,
    },
}
