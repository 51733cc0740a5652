//! Stock materials used when the config leaves a generator empty.

use crate::kinds::{GenCat, Orient, Portalable, TileSize};

/// Invisible tool material.
pub const NODRAW: &str = "tools/toolsnodraw";

/// Material placed behind panels and on the back of tiles.
pub const BACKPANELS: &str = "anim_wp/framework/backpanels";

/// Stock tile materials for a tile generator.
///
/// Panel and bullseye generators have none and copy the normal generator
/// instead.
pub fn tile_defaults(cat: GenCat, orient: Orient, portal: Portalable) -> &'static [(TileSize, &'static str)] {
    use TileSize::*;

    if cat != GenCat::Normal {
        return &[];
    }
    match (orient, portal) {
        (Orient::Floor, Portalable::White) => &[(Tile4x4, "tile/white_floor_tile002a")],
        (Orient::Floor, Portalable::Black) => &[(Tile4x4, "metal/black_floor_metal_001c")],
        (Orient::Ceiling, Portalable::White) => &[(Tile4x4, "tile/white_wall_tile003f")],
        (Orient::Ceiling, Portalable::Black) => &[(Tile4x4, "metal/black_floor_metal_001c")],
        (Orient::Wall, Portalable::White) => &[
            (Tile1x1, "tile/white_wall_tile003a"),
            (Tile2x1, "tile/white_wall_tile003h"),
            (Tile2x2, "tile/white_wall_tile003c"),
            (Tile4x4, "tile/white_wall_tile003f"),
        ],
        (Orient::Wall, Portalable::Black) => &[
            (Tile1x1, "metal/black_wall_metal_002c"),
            (Tile2x2, "metal/black_wall_metal_002a"),
            (Tile4x4, "metal/black_wall_metal_002b"),
        ],
    }
}

/// Slots of the special generator with their stock materials. An empty
/// material means the slot has no default.
pub const SPECIAL_DEFAULTS: &[(&str, &str)] = &[
    ("behind", "anim_wp/framework/backpanels_cheap"),
    ("edge", "anim_wp/framework/squarebeams"),
    ("panel_edge", "anim_wp/framework/squarebeams"),
    ("goo", "nature/toxicslime_a2_bridge_intro"),
    ("goo_cheap", "nature/toxicslime_puzzlemaker_cheap"),
    ("glass", "glass/glasswindow007a_less_shiny"),
    ("grating", "metal/metalgrate018"),
    ("fizz_border", ""),
];

/// Slots of the overlay generator with their stock materials.
pub const OVERLAY_DEFAULTS: &[(&str, &str)] = &[
    ("exit", "signage/signage_exit"),
    ("arrow", "signage/signage_overlay_arrow"),
    ("dot", "signage/shape01"),
    ("moon", "signage/shape02"),
    ("triangle", "signage/shape03"),
    ("cross", "signage/shape04"),
    ("square", "signage/shape05"),
    ("circle", "signage/signage_shape_circle"),
    ("sine", "signage/signage_shape_sine"),
    ("slash", "signage/signage_shape_slash"),
    ("star", "signage/signage_shape_star"),
    ("wavy", "signage/signage_shape_wavy"),
    ("shapeframe", ""),
    ("bullseye", "signage/mgf_overlay_bullseye"),
    ("tideline", "overlays/tideline01b"),
];

/// Slots a size inherits from when left empty, applied in order.
pub const TILE_INHERIT: [(TileSize, TileSize); 7] = [
    (TileSize::Tile4x4, TileSize::Tile2x2),
    (TileSize::Tile4x4, TileSize::Tile4x1),
    (TileSize::Tile4x4, TileSize::Tile1x4),
    (TileSize::Tile2x2, TileSize::Tile2x1),
    (TileSize::Tile2x2, TileSize::Tile1x2),
    (TileSize::Tile2x1, TileSize::Tile1x1),
    (TileSize::Tile4x4, TileSize::Goo),
];

/// Special slots that never get antigel variants.
pub const NO_ANTIGEL_SLOTS: [&str; 4] = ["glass", "grating", "goo", "goo_cheap"];
