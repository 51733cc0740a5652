//! Voxel occupancy: what fills each 128-unit cube of the level.

use glam::{DVec3, IVec3};
use rustc_hash::FxHashMap;

/// Edge length of one voxel in world units.
pub const VOXEL_SIZE: f64 = 128.0;

/// Occupancy classification of one voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Outside the level entirely.
    #[default]
    Void,
    /// Fully solid wall.
    Solid,
    /// Solid, but with item geometry embedded into it.
    Embed,
    /// Open space occupied by an item.
    Occupied,
    /// Open, empty space.
    Air,
    /// Goo filling the whole voxel.
    GooSingle,
    /// Top voxel of a goo column.
    GooTop,
    /// Inside a goo column.
    GooMid,
    /// Bottom voxel of a goo column.
    GooBottom,
    /// A single-voxel bottomless pit.
    PitSingle,
    /// Top voxel of a bottomless pit.
    PitTop,
    /// Inside a bottomless pit.
    PitMid,
    /// Bottom voxel of a bottomless pit.
    PitBottom,
}

impl BlockKind {
    /// Open space the player could reach, as opposed to solid or void.
    pub fn inside_map(self) -> bool {
        !matches!(self, Self::Void | Self::Solid | Self::Embed)
    }

    /// Fully solid, whether or not something is embedded.
    pub fn is_solid(self) -> bool {
        matches!(self, Self::Solid | Self::Embed)
    }

    /// Any goo voxel.
    pub fn is_goo(self) -> bool {
        matches!(
            self,
            Self::GooSingle | Self::GooTop | Self::GooMid | Self::GooBottom
        )
    }

    /// Any bottomless pit voxel.
    pub fn is_pit(self) -> bool {
        matches!(
            self,
            Self::PitSingle | Self::PitTop | Self::PitMid | Self::PitBottom
        )
    }
}

/// Converts a world position to the voxel containing it.
pub fn world_to_grid(pos: DVec3) -> IVec3 {
    (pos / VOXEL_SIZE).floor().as_ivec3()
}

/// Returns the world-space center of a voxel.
pub fn grid_to_world(grid: IVec3) -> DVec3 {
    grid.as_dvec3() * VOXEL_SIZE + DVec3::splat(VOXEL_SIZE / 2.0)
}

/// Answers what occupies a voxel.
pub trait BlockOracle {
    /// Returns the block in voxel `grid`.
    fn block(&self, grid: IVec3) -> BlockKind;

    /// Every voxel that isn't [`BlockKind::Void`], ordered by position.
    fn occupied(&self) -> Vec<(IVec3, BlockKind)>;

    /// Returns the block containing the world position `pos`.
    fn block_at(&self, pos: DVec3) -> BlockKind {
        self.block(world_to_grid(pos))
    }
}

/// A sparse occupancy map. Unset voxels are [`BlockKind::Void`].
#[derive(Clone, Debug, Default)]
pub struct BlockGrid {
    blocks: FxHashMap<IVec3, BlockKind>,
}

impl BlockGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block in voxel `grid`.
    pub fn set(&mut self, grid: IVec3, kind: BlockKind) {
        if kind == BlockKind::Void {
            self.blocks.remove(&grid);
        } else {
            self.blocks.insert(grid, kind);
        }
    }

    /// Fills the inclusive voxel box `min..=max`.
    pub fn fill(&mut self, min: IVec3, max: IVec3, kind: BlockKind) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set(IVec3::new(x, y, z), kind);
                }
            }
        }
    }
}

impl BlockOracle for BlockGrid {
    fn block(&self, grid: IVec3) -> BlockKind {
        self.blocks.get(&grid).copied().unwrap_or_default()
    }

    fn occupied(&self) -> Vec<(IVec3, BlockKind)> {
        let mut blocks: Vec<_> = self.blocks.iter().map(|(&grid, &kind)| (grid, kind)).collect();
        blocks.sort_by_key(|(grid, _)| grid.to_array());
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(!BlockKind::Void.inside_map());
        assert!(!BlockKind::Embed.inside_map());
        assert!(BlockKind::Air.inside_map());
        assert!(BlockKind::GooMid.inside_map());
        assert!(BlockKind::Embed.is_solid());
        assert!(!BlockKind::Occupied.is_solid());
        assert!(BlockKind::GooTop.is_goo());
        assert!(BlockKind::PitBottom.is_pit());
    }

    #[test]
    fn test_world_grid_conversion() {
        assert_eq!(world_to_grid(DVec3::new(64.0, -1.0, 128.0)), IVec3::new(0, -1, 1));
        assert_eq!(grid_to_world(IVec3::new(0, -1, 1)), DVec3::new(64.0, -64.0, 192.0));
        for grid in [IVec3::ZERO, IVec3::new(-3, 7, 2)] {
            assert_eq!(world_to_grid(grid_to_world(grid)), grid);
        }
    }

    #[test]
    fn test_block_grid_defaults_to_void() {
        let mut blocks = BlockGrid::new();
        blocks.fill(IVec3::ZERO, IVec3::new(1, 1, 0), BlockKind::Solid);
        assert_eq!(blocks.block(IVec3::new(1, 1, 0)), BlockKind::Solid);
        assert_eq!(blocks.block_at(DVec3::new(200.0, 10.0, 64.0)), BlockKind::Solid);
        assert_eq!(blocks.block(IVec3::new(2, 0, 0)), BlockKind::Void);
        blocks.set(IVec3::ZERO, BlockKind::Void);
        assert_eq!(blocks.block(IVec3::ZERO), BlockKind::Void);
    }

    #[test]
    fn test_occupied_is_sorted() {
        let mut blocks = BlockGrid::new();
        blocks.set(IVec3::new(2, 0, 0), BlockKind::GooTop);
        blocks.set(IVec3::new(-1, 5, 0), BlockKind::Air);
        blocks.set(IVec3::new(-1, 0, 3), BlockKind::Solid);
        blocks.set(IVec3::new(-1, 0, 3), BlockKind::Void);
        assert_eq!(
            blocks.occupied(),
            vec![(IVec3::new(-1, 5, 0), BlockKind::Air), (IVec3::new(2, 0, 0), BlockKind::GooTop)]
        );
    }
}
