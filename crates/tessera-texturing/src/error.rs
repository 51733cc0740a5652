//! Texturing error types.

/// Errors raised while building generators or looking up materials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureError {
    /// A lookup used a slot the generator does not define.
    #[error("bad texture name: {slot}\n allowed: {allowed:?}")]
    UnknownSlot {
        /// The requested slot.
        slot: String,
        /// Every slot the generator does define.
        allowed: Vec<String>,
    },

    /// The slot exists but has no candidate materials.
    #[error("texture slot {slot} has no materials")]
    EmptySlot {
        /// The requested slot.
        slot: String,
    },

    /// A required slot has no candidates after inheritance.
    #[error("no {slot} tile set for \"{generator}\"")]
    MissingSlot {
        /// Generator key, e.g. `normal.white.wall`.
        generator: String,
        /// The required slot.
        slot: String,
    },

    /// The bottom trim option contains characters other than `1`, `2` or `4`.
    #[error("invalid bottom trim pattern \"{pattern}\" for \"{generator}\"")]
    InvalidBottomTrim {
        /// Generator key.
        generator: String,
        /// The configured pattern.
        pattern: String,
    },
}
