//! What occupies each quarter-tile cell, and how panels move.

use tessera_texturing::{Portalable, TileSize};

use crate::error::TilingError;

/// Physical geometry of one 32-unit sub-tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileType {
    White,
    /// White, forced to use 4x4 materials.
    White4x4,
    Black,
    Black4x4,
    /// Black sides of goo pits.
    GooSide,
    /// Covered, so it should be nodraw.
    Nodraw,
    /// Nothing here.
    Void,
    /// A recess that was not there when the tiles were placed.
    CutoutTileBroken,
    /// A recess for work-in-progress chambers.
    CutoutTilePartial,
}

impl TileType {
    /// Every type, in diagram-character order.
    pub const ALL: [TileType; 9] = [
        TileType::White,
        TileType::White4x4,
        TileType::Black,
        TileType::Black4x4,
        TileType::GooSide,
        TileType::Nodraw,
        TileType::Void,
        TileType::CutoutTileBroken,
        TileType::CutoutTilePartial,
    ];

    /// A regular white or black tile.
    pub fn is_tile(self) -> bool {
        matches!(
            self,
            TileType::White | TileType::White4x4 | TileType::Black | TileType::Black4x4 | TileType::GooSide
        )
    }

    pub fn is_white(self) -> bool {
        matches!(self, TileType::White | TileType::White4x4)
    }

    /// Forced to 4x4 materials.
    pub fn is_4x4(self) -> bool {
        matches!(self, TileType::White4x4 | TileType::Black4x4)
    }

    /// Whether this recesses the surface.
    pub fn is_recess(self) -> bool {
        matches!(self, TileType::CutoutTileBroken | TileType::CutoutTilePartial)
    }

    pub fn is_nodraw(self) -> bool {
        self == TileType::Nodraw
    }

    /// Portalability, for types that have one.
    pub fn color(self) -> Option<Portalable> {
        match self {
            TileType::White | TileType::White4x4 => Some(Portalable::White),
            TileType::Black | TileType::Black4x4 | TileType::GooSide => Some(Portalable::Black),
            _ => None,
        }
    }

    /// Swaps white and black. Goo sides become white 4x4.
    pub fn inverted(self) -> Self {
        match self {
            TileType::White => TileType::Black,
            TileType::White4x4 => TileType::Black4x4,
            TileType::Black => TileType::White,
            TileType::Black4x4 => TileType::White4x4,
            TileType::GooSide => TileType::White4x4,
            other => other,
        }
    }

    /// The material size this type forces.
    pub fn tile_size(self) -> TileSize {
        if self.is_4x4() {
            TileSize::Tile4x4
        } else {
            TileSize::Tile1x1
        }
    }

    /// Diagram character.
    pub fn as_char(self) -> char {
        match self {
            TileType::White => 'W',
            TileType::White4x4 => 'w',
            TileType::Black => 'B',
            TileType::Black4x4 => 'b',
            TileType::GooSide => 'g',
            TileType::Nodraw => 'n',
            TileType::Void => '.',
            TileType::CutoutTileBroken => 'x',
            TileType::CutoutTilePartial => 'o',
        }
    }

    pub fn from_char(c: char) -> Result<Self, TilingError> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_char() == c)
            .ok_or(TilingError::UnknownTileChar(c))
    }
}

/// Special behaviour of a panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PanelType {
    /// A plain slab.
    #[default]
    Normal,
    /// Flips to black on the back.
    FlipBlack,
    /// Flips to the inverted color on the back.
    FlipInvert,
    Angle30,
    Angle45,
    Angle60,
    Angle90,
}

impl PanelType {
    pub fn is_flip(self) -> bool {
        matches!(self, PanelType::FlipBlack | PanelType::FlipInvert)
    }

    /// Deployed angle in degrees, for angled panels.
    pub fn angle(self) -> Option<u32> {
        match self {
            PanelType::Angle30 => Some(30),
            PanelType::Angle45 => Some(45),
            PanelType::Angle60 => Some(60),
            PanelType::Angle90 => Some(90),
            _ => None,
        }
    }
}
