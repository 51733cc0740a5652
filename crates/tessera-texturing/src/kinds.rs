//! Classification types shared by every generator.

use std::fmt;

use glam::DVec3;
use tessera_config::{MaterialEntry, MaterialSpec};

/// Folder antigel variants of materials are generated into.
pub const ANTIGEL_PATH: &str = "BEE2/antigel/gen/";

/// Broad category of a texture generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenCat {
    /// Ordinary tiled surfaces.
    Normal,
    /// Surfaces of moving panels.
    Panel,
    /// Surfaces carrying a faith plate target.
    Bullseye,
    /// Miscellaneous non-tile materials.
    Special,
    /// Overlay decals.
    Overlay,
}

impl GenCat {
    /// The three categories that produce tile materials.
    pub const TILES: [GenCat; 3] = [GenCat::Normal, GenCat::Panel, GenCat::Bullseye];

    /// Name used in config keys.
    pub fn as_str(self) -> &'static str {
        match self {
            GenCat::Normal => "normal",
            GenCat::Panel => "panel",
            GenCat::Bullseye => "bullseye",
            GenCat::Special => "special",
            GenCat::Overlay => "overlays",
        }
    }

    /// Parses a category name, accepting the common aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "normal" | "surf" | "tiles" => GenCat::Normal,
            "panel" => GenCat::Panel,
            "bullseye" | "faithplate" | "faith" | "catapult" => GenCat::Bullseye,
            "special" => GenCat::Special,
            "overlays" | "overlay" => GenCat::Overlay,
            _ => return None,
        })
    }

    /// Whether generators of this category are keyed by orient and color.
    pub fn is_tile(self) -> bool {
        matches!(self, GenCat::Normal | GenCat::Panel | GenCat::Bullseye)
    }

    pub(crate) fn tile_index(self) -> Option<usize> {
        match self {
            GenCat::Normal => Some(0),
            GenCat::Panel => Some(1),
            GenCat::Bullseye => Some(2),
            GenCat::Special | GenCat::Overlay => None,
        }
    }
}

impl fmt::Display for GenCat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a surface faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orient {
    Floor,
    Wall,
    Ceiling,
}

impl Orient {
    pub const ALL: [Orient; 3] = [Orient::Floor, Orient::Wall, Orient::Ceiling];

    /// Classifies a surface normal. Anything not clearly up or down is a wall.
    pub fn from_normal(normal: DVec3) -> Self {
        if normal.z > 0.8 {
            Orient::Floor
        } else if normal.z < -0.8 {
            Orient::Ceiling
        } else {
            Orient::Wall
        }
    }

    /// Vertical component of the representative normal.
    pub fn z(self) -> i32 {
        match self {
            Orient::Floor => 1,
            Orient::Wall => 0,
            Orient::Ceiling => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orient::Floor => "floor",
            Orient::Wall => "wall",
            Orient::Ceiling => "ceiling",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "floor" | "floors" => Orient::Floor,
            "wall" | "walls" => Orient::Wall,
            "ceil" | "ceiling" | "ceilings" => Orient::Ceiling,
            _ => return None,
        })
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Orient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a surface accepts portals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Portalable {
    White,
    Black,
}

impl Portalable {
    pub const ALL: [Portalable; 2] = [Portalable::White, Portalable::Black];

    /// The opposite color.
    pub fn invert(self) -> Self {
        match self {
            Portalable::White => Portalable::Black,
            Portalable::Black => Portalable::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Portalable::White => "white",
            Portalable::Black => "black",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "white" => Some(Portalable::White),
            "black" => Some(Portalable::Black),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Portalable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size slot of a tile material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileSize {
    /// One tile per voxel face.
    Tile1x1,
    /// Sixteen tiles per voxel face.
    Tile4x4,
    Tile2x2,
    /// Two tiles across, one down.
    Tile2x1,
    /// One tile across, two down.
    Tile1x2,
    Tile1x4,
    Tile4x1,
    /// A 1x1 material covering 256 units.
    Double,
    /// Neutral filler between clumps.
    Gap,
    /// Tiles next to goo.
    Goo,
}

impl TileSize {
    pub const ALL: [TileSize; 10] = [
        TileSize::Tile1x1,
        TileSize::Tile4x4,
        TileSize::Tile2x2,
        TileSize::Tile2x1,
        TileSize::Tile1x2,
        TileSize::Tile1x4,
        TileSize::Tile4x1,
        TileSize::Double,
        TileSize::Gap,
        TileSize::Goo,
    ];

    /// Slot name, e.g. `"2x1"`.
    pub fn as_str(self) -> &'static str {
        match self {
            TileSize::Tile1x1 => "1x1",
            TileSize::Tile4x4 => "4x4",
            TileSize::Tile2x2 => "2x2",
            TileSize::Tile2x1 => "2x1",
            TileSize::Tile1x2 => "1x2",
            TileSize::Tile1x4 => "1x4",
            TileSize::Tile4x1 => "4x1",
            TileSize::Double => "double",
            TileSize::Gap => "gap",
            TileSize::Goo => "goo",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|size| size.as_str() == name)
    }

    /// Extent of one tile of this size, in 32-unit cells, as `(u, v)`.
    pub fn size(self) -> (u32, u32) {
        match self {
            TileSize::Tile4x4 | TileSize::Goo => (1, 1),
            TileSize::Tile1x1 | TileSize::Gap => (4, 4),
            TileSize::Tile2x2 => (2, 2),
            TileSize::Tile2x1 => (2, 4),
            TileSize::Tile1x2 => (4, 2),
            TileSize::Tile4x1 => (1, 4),
            TileSize::Tile1x4 => (4, 1),
            TileSize::Double => (8, 8),
        }
    }

    pub fn width(self) -> u32 {
        self.size().0
    }

    pub fn height(self) -> u32 {
        self.size().1
    }

    /// The slot holding this size turned 90 degrees.
    pub fn rotated(self) -> Self {
        match self {
            TileSize::Tile1x2 => TileSize::Tile2x1,
            TileSize::Tile2x1 => TileSize::Tile1x2,
            TileSize::Tile1x4 => TileSize::Tile4x1,
            TileSize::Tile4x1 => TileSize::Tile1x4,
            other => other,
        }
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A texture rotation in quarter turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuarterRot {
    #[default]
    None,
    Ccw,
    Half,
    Cw,
}

impl QuarterRot {
    pub const ALL: [QuarterRot; 4] = [QuarterRot::None, QuarterRot::Ccw, QuarterRot::Half, QuarterRot::Cw];

    /// Parses degrees. Values that are not a multiple of 90 are reset to none.
    pub fn from_degrees(degrees: u32) -> Self {
        match degrees % 360 {
            0 => QuarterRot::None,
            90 => QuarterRot::Ccw,
            180 => QuarterRot::Half,
            270 => QuarterRot::Cw,
            _ => {
                tracing::warn!(degrees, "rotation must be a multiple of 90 degrees");
                QuarterRot::None
            }
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            QuarterRot::None => 0,
            QuarterRot::Ccw => 90,
            QuarterRot::Half => 180,
            QuarterRot::Cw => 270,
        }
    }

    /// Whether this rotation swaps the U and V extents.
    pub fn flips_uv(self) -> bool {
        matches!(self, QuarterRot::Ccw | QuarterRot::Cw)
    }
}

impl std::ops::Add for QuarterRot {
    type Output = QuarterRot;

    fn add(self, other: QuarterRot) -> QuarterRot {
        QuarterRot::from_degrees((self.degrees() + other.degrees()) % 360)
    }
}

/// One candidate material with its texture parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialConf {
    /// Material path.
    pub mat: String,
    /// Scale multiplier, always positive.
    pub scale: f64,
    pub rotation: QuarterRot,
    /// Maximum repeats before another material should be picked.
    pub repeat_limit: u32,
    /// Size slot the material was configured for.
    pub tile_size: TileSize,
}

impl MaterialConf {
    /// A material with default parameters.
    pub fn new(mat: impl Into<String>, tile_size: TileSize) -> Self {
        Self {
            mat: mat.into(),
            scale: 1.0,
            rotation: QuarterRot::None,
            repeat_limit: 8,
            tile_size,
        }
    }

    /// Converts a config entry, fixing up out-of-range parameters.
    pub fn from_entry(entry: &MaterialEntry, tile_size: TileSize) -> Self {
        let MaterialSpec {
            material,
            scale,
            rotation,
            repeat,
        } = entry.to_spec();
        let scale = if scale > 0.0 {
            scale
        } else {
            tracing::warn!(%material, scale, "material scale must be positive");
            1.0
        };
        let repeat_limit = if repeat > 0 {
            repeat
        } else {
            tracing::warn!(%material, "repeat limit must be positive");
            1
        };
        Self {
            mat: material,
            scale,
            rotation: QuarterRot::from_degrees(rotation),
            repeat_limit,
            tile_size,
        }
    }

    /// This material with `rot` added to its rotation.
    pub fn rotated_by(&self, rot: QuarterRot) -> Self {
        Self {
            rotation: self.rotation + rot,
            ..self.clone()
        }
    }

    /// The antigel variant of this material. Already-converted materials are
    /// returned unchanged.
    pub fn as_antigel(&self) -> Self {
        Self {
            mat: antigel_name(&self.mat),
            ..self.clone()
        }
    }
}

impl fmt::Display for MaterialConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mat)
    }
}

/// Maps a material path to its generated antigel variant.
pub fn antigel_name(mat: &str) -> String {
    let is_converted = mat
        .get(..ANTIGEL_PATH.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ANTIGEL_PATH));
    if is_converted {
        mat.to_string()
    } else {
        format!("{ANTIGEL_PATH}{}", mat.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient_from_normal() {
        assert_eq!(Orient::from_normal(DVec3::Z), Orient::Floor);
        assert_eq!(Orient::from_normal(DVec3::NEG_Z), Orient::Ceiling);
        assert_eq!(Orient::from_normal(DVec3::X), Orient::Wall);
        assert_eq!(Orient::from_normal(DVec3::new(0.0, 0.7, 0.7)), Orient::Wall);
    }

    #[test]
    fn test_name_aliases() {
        assert_eq!(GenCat::from_name("faith"), Some(GenCat::Bullseye));
        assert_eq!(GenCat::from_name("Tiles"), Some(GenCat::Normal));
        assert_eq!(Orient::from_name("ceil"), Some(Orient::Ceiling));
        assert_eq!(Portalable::from_name("BLACK"), Some(Portalable::Black));
        assert_eq!(Portalable::from_name("grey"), None);
        assert_eq!(Portalable::White.invert(), Portalable::Black);
    }

    #[test]
    fn test_tile_sizes() {
        for size in TileSize::ALL {
            assert_eq!(TileSize::from_name(size.as_str()), Some(size));
            assert_eq!(size.rotated().rotated(), size);
            let (w, h) = size.size();
            assert_eq!(size.rotated().size(), (h, w), "rotating {size} should swap extents");
        }
        assert_eq!(TileSize::Tile2x1.size(), (2, 4));
        assert_eq!(TileSize::from_name("5x5"), None);
    }

    #[test]
    fn test_quarter_rot() {
        assert_eq!(QuarterRot::Cw + QuarterRot::Ccw, QuarterRot::None);
        assert_eq!(QuarterRot::Half + QuarterRot::Cw, QuarterRot::Ccw);
        assert_eq!(QuarterRot::from_degrees(450), QuarterRot::Ccw);
        assert_eq!(QuarterRot::from_degrees(45), QuarterRot::None);
        assert!(QuarterRot::Ccw.flips_uv());
        assert!(!QuarterRot::Half.flips_uv());
    }

    #[test]
    fn test_material_entry_fixups() {
        let entry = MaterialEntry::Detailed(MaterialSpec {
            material: "tile/a".to_string(),
            scale: -2.0,
            rotation: 180,
            repeat: 0,
        });
        let conf = MaterialConf::from_entry(&entry, TileSize::Tile2x2);
        assert_eq!(conf.scale, 1.0);
        assert_eq!(conf.repeat_limit, 1);
        assert_eq!(conf.rotation, QuarterRot::Half);
        assert_eq!(conf.tile_size, TileSize::Tile2x2);
    }

    #[test]
    fn test_antigel_is_idempotent() {
        let conf = MaterialConf::new("Tile/White_Wall_Tile003a", TileSize::Tile1x1);
        let once = conf.as_antigel();
        assert_eq!(once.mat, "BEE2/antigel/gen/tile/white_wall_tile003a");
        assert_eq!(once.as_antigel(), once);
        assert_eq!(once.tile_size, TileSize::Tile1x1);
    }
}
