//! Tiling error types.

use glam::DVec3;
use tessera_plane::FaceDirection;
use tessera_texturing::TextureError;

/// Errors raised while building templates, editing tiles or emitting brushes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TilingError {
    /// The tile template has no faces for a direction.
    #[error("bad tiling template: no faces for {normal:?}")]
    MissingOrientation { normal: FaceDirection },

    /// The tile template lacks one of the faces of a direction.
    #[error("bad tiling template: {normal:?} is missing the {face} face")]
    MissingTemplateFace { normal: FaceDirection, face: String },

    /// Tiles are 2, 4 or 8 units thick.
    #[error("bad tile thickness {thickness}")]
    BadThickness { thickness: u32 },

    /// Both tile extents must be at least 8 units.
    #[error("tile is too small ({width}x{height})")]
    TileTooSmall { width: f64, height: f64 },

    /// A character in a tile diagram has no tile type.
    #[error("unknown tile type character {0:?}")]
    UnknownTileChar(char),

    /// No tile exists at the given surface position.
    #[error("no tile at {origin} facing {normal:?}")]
    TileNotFound { origin: DVec3, normal: FaceDirection },

    /// The position does not land on a sub-tile centre.
    #[error("bad tile position {origin} facing {normal:?}")]
    OffGrid { origin: DVec3, normal: FaceDirection },

    /// Portal helper orientations must lie in the tile's plane.
    #[error("portal orient {orient} is not flat on a plane facing {normal:?}")]
    HelperNotFlat { orient: DVec3, normal: FaceDirection },

    #[error(transparent)]
    Texture(#[from] TextureError),
}
