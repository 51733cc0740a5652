//! Sparse 2D plane storage used while merging coplanar tiles.
//!
//! [`PlaneGrid`] is the compacting sparse grid, [`PlaneKey`] identifies the
//! plane a grid lives on, and [`optimise`] covers a grid with rectangles.

pub mod error;
pub mod face_direction;
pub mod grid;
pub mod optimise;
pub mod plane_key;

pub use error::PlaneError;
pub use face_direction::FaceDirection;
pub use grid::{BLOCK_AREA, BLOCK_SIZE, GridKey, PlaneGrid};
pub use optimise::{CoverRect, group_runs, optimise};
pub use plane_key::PlaneKey;
