//! Tile surfaces and the brushes generated for them.
//!
//! Each voxel face in the level is a [`TileDef`]: a 4x4 grid of sub-tile
//! types, optional movable [`Panel`]s and portal helper requests. [`Tiling`]
//! owns every tile of a compile and turns them into brushes, merging plain
//! coplanar tiles and splitting mixed ones into the fewest rectangles the
//! standard [`pattern`] set allows. Goo pits are filled in the same pass.

pub mod bevel;
pub mod error;
pub mod goo;
pub mod overlay;
pub mod panel;
pub mod pattern;
pub mod template;
pub mod tile_type;
pub mod tiledef;
pub mod tiling;

pub use bevel::{BevelPoints, Bevels, EdgeSide};
pub use error::TilingError;
pub use goo::GooOptions;
pub use panel::Panel;
pub use pattern::{Cells, Pattern, PatternRect, PatternSet, SplitAxis, calc_patterns, cells_from_rows};
pub use template::{TemplatePart, TileSpec, TileTemplate};
pub use tile_type::{PanelType, TileType};
pub use tiledef::{EmitContext, MultitileOpts, SubTiles, TileDef};
pub use tiling::{MergeRect, TileKey, Tiling};
