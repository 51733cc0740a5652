//! Output level document and voxel occupancy lookups.
//!
//! Generated geometry is appended to a [`LevelDoc`] as [`Solid`] brushes and
//! marker [`Entity`] values. Bevel decisions consult a [`BlockOracle`].

pub mod block;
pub mod doc;
pub mod face;

pub use block::{BlockGrid, BlockKind, BlockOracle, VOXEL_SIZE, grid_to_world, world_to_grid};
pub use doc::{Entity, EntityId, EntityOutput, LevelDoc, format_vec};
pub use face::{Face, FaceId, Solid, SolidId, UvAxis};
