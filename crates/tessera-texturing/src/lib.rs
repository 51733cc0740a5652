//! Deterministic material selection for generated tiles.
//!
//! [`Texturing`] holds one [`Generator`] per tile category, orientation and
//! color, plus the special and overlay tables. Choices are derived from a
//! [`MapSeed`] so that an unchanged level always compiles to the same
//! materials.

pub mod defaults;
pub mod error;
pub mod generator;
pub mod kinds;
pub mod seed;
pub mod texturing;

pub use defaults::{BACKPANELS, NODRAW};
pub use error::TextureError;
pub use generator::{Clump, Generator};
pub use kinds::{ANTIGEL_PATH, GenCat, MaterialConf, Orient, Portalable, QuarterRot, TileSize, antigel_name};
pub use seed::{MapSeed, SeedValue};
pub use texturing::Texturing;
