//! Sparse 2D grid with block-level compaction.
//!
//! Positions are grouped into 8×8 blocks. A block is either dense (64
//! optional slots plus a live count) or uniform (one shared value standing in
//! for every slot). Uniform blocks only come from [`PlaneGrid::compact`] and
//! are inflated back to dense storage on the first write that changes them.

use rustc_hash::FxHashMap;

use crate::error::PlaneError;

/// Side length of a storage block.
pub const BLOCK_SIZE: i32 = 8;

/// Number of cells in a storage block (8²).
pub const BLOCK_AREA: usize = (BLOCK_SIZE * BLOCK_SIZE) as usize;

/// Storage for one 8×8 region.
#[derive(Clone, Debug)]
enum Block<T> {
    /// Every one of the 64 cells holds this value.
    Uniform(T),
    /// Independent slots, with the number of populated ones.
    Dense {
        cells: Box<[Option<T>; BLOCK_AREA]>,
        count: usize,
    },
}

impl<T: Clone> Block<T> {
    fn empty() -> Self {
        Block::Dense {
            cells: Box::new(std::array::from_fn(|_| None)),
            count: 0,
        }
    }

    fn slot(&self, index: usize) -> Option<&T> {
        match self {
            Block::Uniform(value) => Some(value),
            Block::Dense { cells, .. } => cells[index].as_ref(),
        }
    }

    /// Converts a uniform block into dense storage so one slot can change.
    fn inflate(&mut self) {
        if let Block::Uniform(value) = self {
            let cells = Box::new(std::array::from_fn(|_| Some(value.clone())));
            *self = Block::Dense {
                cells,
                count: BLOCK_AREA,
            };
        }
    }
}

/// Anything that might name a grid position.
///
/// Used by [`PlaneGrid::contains_key`] so that malformed keys answer `false`
/// instead of failing.
pub trait GridKey {
    /// Returns the `(x, y)` position, or `None` if this is not a valid 2D key.
    fn grid_pos(&self) -> Option<(i32, i32)>;
}

impl GridKey for (i32, i32) {
    fn grid_pos(&self) -> Option<(i32, i32)> {
        Some(*self)
    }
}

impl GridKey for [i32; 2] {
    fn grid_pos(&self) -> Option<(i32, i32)> {
        Some((self[0], self[1]))
    }
}

impl GridKey for glam::IVec2 {
    fn grid_pos(&self) -> Option<(i32, i32)> {
        Some((self.x, self.y))
    }
}

impl GridKey for [i32] {
    fn grid_pos(&self) -> Option<(i32, i32)> {
        match *self {
            [x, y] => Some((x, y)),
            _ => None,
        }
    }
}

impl GridKey for Vec<i32> {
    fn grid_pos(&self) -> Option<(i32, i32)> {
        self.as_slice().grid_pos()
    }
}

impl GridKey for (i64, i64) {
    fn grid_pos(&self) -> Option<(i32, i32)> {
        Some((i32::try_from(self.0).ok()?, i32::try_from(self.1).ok()?))
    }
}

/// A sparse mapping from integer `(x, y)` positions to values.
///
/// Tracks the bounding box of every position ever written. The box only
/// grows; deleting values does not shrink it, only [`PlaneGrid::clear`] does.
#[derive(Clone, Debug)]
pub struct PlaneGrid<T> {
    blocks: FxHashMap<(i32, i32), Block<T>>,
    len: usize,
    bounds: Option<((i32, i32), (i32, i32))>,
}

impl<T> Default for PlaneGrid<T> {
    fn default() -> Self {
        Self {
            blocks: FxHashMap::default(),
            len: 0,
            bounds: None,
        }
    }
}

/// Splits a position into its block key and the slot index inside the block.
fn split(x: i32, y: i32) -> ((i32, i32), usize) {
    let key = (x.div_euclid(BLOCK_SIZE), y.div_euclid(BLOCK_SIZE));
    let index = x.rem_euclid(BLOCK_SIZE) + y.rem_euclid(BLOCK_SIZE) * BLOCK_SIZE;
    (key, index as usize)
}

/// Inverse of [`split`].
fn join(key: (i32, i32), index: usize) -> (i32, i32) {
    let index = index as i32;
    (
        key.0 * BLOCK_SIZE + index % BLOCK_SIZE,
        key.1 * BLOCK_SIZE + index / BLOCK_SIZE,
    )
}

impl<T: Clone + PartialEq> PlaneGrid<T> {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value at `(x, y)`.
    pub fn get(&self, x: i32, y: i32) -> Result<&T, PlaneError> {
        let (key, index) = split(x, y);
        self.blocks
            .get(&key)
            .and_then(|block| block.slot(index))
            .ok_or(PlaneError::NotFound { x, y })
    }

    /// Returns the value at `(x, y)`, or `default` when nothing is stored there.
    pub fn get_or<'a>(&'a self, x: i32, y: i32, default: &'a T) -> &'a T {
        self.get(x, y).unwrap_or(default)
    }

    /// Stores `value` at `(x, y)`, returning the previous value.
    pub fn set(&mut self, x: i32, y: i32, value: T) -> Option<T> {
        self.bounds = Some(match self.bounds {
            None => ((x, y), (x, y)),
            Some((min, max)) => (
                (min.0.min(x), min.1.min(y)),
                (max.0.max(x), max.1.max(y)),
            ),
        });

        let (key, index) = split(x, y);
        let block = self.blocks.entry(key).or_insert_with(Block::empty);
        if matches!(block, Block::Uniform(existing) if *existing == value) {
            return Some(value);
        }
        block.inflate();
        let Block::Dense { cells, count } = block else {
            return None;
        };
        let previous = cells[index].replace(value);
        if previous.is_none() {
            *count += 1;
            self.len += 1;
        }
        previous
    }

    /// Removes the value at `(x, y)`, returning it if one was present.
    ///
    /// A block left with no values is dropped.
    pub fn delete(&mut self, x: i32, y: i32) -> Option<T> {
        let (key, index) = split(x, y);
        let block = self.blocks.get_mut(&key)?;
        block.inflate();
        let Block::Dense { cells, count } = block else {
            return None;
        };
        let removed = cells[index].take()?;
        *count -= 1;
        self.len -= 1;
        if *count == 0 {
            self.blocks.remove(&key);
        }
        Some(removed)
    }

    /// Returns `true` if a value is stored at `(x, y)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_ok()
    }

    /// Like [`PlaneGrid::contains`], but accepts any key shape.
    ///
    /// Keys that are not exactly two integers are never present.
    pub fn contains_key<K: GridKey + ?Sized>(&self, key: &K) -> bool {
        key.grid_pos()
            .is_some_and(|(x, y)| self.contains(x, y))
    }

    /// Number of populated positions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no position holds a value.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every value and resets the bounding box.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.len = 0;
        self.bounds = None;
    }

    /// Iterates over all populated positions. The order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), &T)> + '_ {
        self.blocks.iter().flat_map(|(&key, block)| {
            (0..BLOCK_AREA).filter_map(move |index| block.slot(index).map(|v| (join(key, index), v)))
        })
    }

    /// Iterates over populated positions.
    pub fn keys(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.iter().map(|(pos, _)| pos)
    }

    /// Iterates over stored values.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Collapses every full dense block whose 64 values are all equal into a
    /// uniform block. Lookups return the same values afterwards.
    pub fn compact(&mut self) {
        for block in self.blocks.values_mut() {
            let Block::Dense { cells, count } = block else {
                continue;
            };
            if *count != BLOCK_AREA {
                continue;
            }
            let Some(first) = cells[0].clone() else {
                continue;
            };
            if cells.iter().all(|cell| cell.as_ref() == Some(&first)) {
                *block = Block::Uniform(first);
            }
        }
    }

    /// Returns a populated position from the highest block, without scanning
    /// every cell.
    ///
    /// This is a cheap representative for "somewhere near the top", not the
    /// true maximum position.
    pub fn largest_index(&self) -> Option<((i32, i32), &T)> {
        let (&key, block) = self.blocks.iter().max_by_key(|(key, _)| **key)?;
        (0..BLOCK_AREA)
            .rev()
            .find_map(|index| block.slot(index).map(|v| (join(key, index), v)))
    }

    /// Smallest `(x, y)` ever written, per axis.
    pub fn mins(&self) -> Option<(i32, i32)> {
        self.bounds.map(|(min, _)| min)
    }

    /// Largest `(x, y)` ever written, per axis.
    pub fn maxes(&self) -> Option<(i32, i32)> {
        self.bounds.map(|(_, max)| max)
    }

    /// Width and height of the bounding box, `(0, 0)` if nothing was written.
    pub fn dimensions(&self) -> (u32, u32) {
        match self.bounds {
            None => (0, 0),
            Some((min, max)) => ((max.0 - min.0 + 1) as u32, (max.1 - min.1 + 1) as u32),
        }
    }

    /// Number of allocated blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if the block containing `(x, y)` is stored as uniform.
    pub fn is_block_uniform(&self, x: i32, y: i32) -> bool {
        let (key, _) = split(x, y);
        matches!(self.blocks.get(&key), Some(Block::Uniform(_)))
    }
}

impl<T: Clone + PartialEq> FromIterator<((i32, i32), T)> for PlaneGrid<T> {
    fn from_iter<I: IntoIterator<Item = ((i32, i32), T)>>(iter: I) -> Self {
        let mut grid = PlaneGrid::new();
        for ((x, y), value) in iter {
            grid.set(x, y, value);
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_block(value: &str) -> PlaneGrid<String> {
        let mut grid = PlaneGrid::new();
        for x in 0..8 {
            for y in 0..8 {
                grid.set(x, y, value.to_string());
            }
        }
        grid
    }

    #[test]
    fn test_insert_in_all_directions() {
        let mut grid = PlaneGrid::new();
        let points = [(0, 0), (5, 3), (-1, 0), (0, -9), (-30, -40), (100, -2), (-7, 64)];
        for (i, &(x, y)) in points.iter().enumerate() {
            grid.set(x, y, i);
        }
        for (i, &(x, y)) in points.iter().enumerate() {
            assert_eq!(grid.get(x, y).copied(), Ok(i), "wrong value at ({x}, {y})");
        }
        assert_eq!(grid.len(), points.len());
        assert_eq!(grid.mins(), Some((-30, -40)));
        assert_eq!(grid.maxes(), Some((100, 64)));
        assert_eq!(grid.dimensions(), (131, 105));
    }

    #[test]
    fn test_missing_position_is_not_found() {
        let mut grid = PlaneGrid::new();
        grid.set(1, 1, 'a');
        assert_eq!(grid.get(2, 1), Err(PlaneError::NotFound { x: 2, y: 1 }));
        assert_eq!(*grid.get_or(2, 1, &'z'), 'z');
        assert_eq!(*grid.get_or(1, 1, &'z'), 'a');
    }

    #[test]
    fn test_empty_grid_bounds() {
        let grid: PlaneGrid<u8> = PlaneGrid::new();
        assert_eq!(grid.mins(), None);
        assert_eq!(grid.maxes(), None);
        assert_eq!(grid.dimensions(), (0, 0));
        assert!(grid.largest_index().is_none());
    }

    #[test]
    fn test_bounds_never_shrink_on_delete() {
        let mut grid = PlaneGrid::new();
        grid.set(-4, 2, 1);
        grid.set(10, 20, 2);
        grid.set(3, 3, 3);
        assert_eq!(grid.delete(10, 20), Some(2));
        assert_eq!(grid.delete(-4, 2), Some(1));
        assert_eq!(grid.mins(), Some((-4, 2)));
        assert_eq!(grid.maxes(), Some((10, 20)));
        grid.clear();
        assert_eq!(grid.mins(), None);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_delete_drops_empty_block() {
        let mut grid = PlaneGrid::new();
        grid.set(1, 1, 5);
        grid.set(9, 1, 6);
        assert_eq!(grid.block_count(), 2);
        assert_eq!(grid.delete(1, 1), Some(5));
        assert_eq!(grid.block_count(), 1);
        assert_eq!(grid.delete(1, 1), None);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_compact_single_block() {
        let mut grid = filled_block("X");
        assert!(!grid.is_block_uniform(0, 0));
        grid.compact();
        assert!(grid.is_block_uniform(0, 0), "identical block should compact");
        assert_eq!(grid.get(3, 3).map(String::as_str), Ok("X"));
        assert_eq!(grid.get(8, 8), Err(PlaneError::NotFound { x: 8, y: 8 }));
        assert_eq!(grid.len(), 64);
    }

    #[test]
    fn test_compact_is_transparent() {
        let mut grid = filled_block("X");
        let before: Vec<_> = (0..8)
            .flat_map(|x| (0..8).map(move |y| (x, y)))
            .map(|(x, y)| grid.get(x, y).cloned())
            .collect();
        grid.compact();
        let after: Vec<_> = (0..8)
            .flat_map(|x| (0..8).map(move |y| (x, y)))
            .map(|(x, y)| grid.get(x, y).cloned())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_compact_skips_mixed_and_partial_blocks() {
        let mut grid = filled_block("X");
        grid.set(4, 4, "Y".to_string());
        grid.set(20, 20, "X".to_string());
        grid.compact();
        assert!(!grid.is_block_uniform(0, 0));
        assert!(!grid.is_block_uniform(20, 20));
    }

    #[test]
    fn test_write_inflates_uniform_block() {
        let mut grid = filled_block("X");
        grid.compact();
        grid.set(2, 5, "Y".to_string());
        assert!(!grid.is_block_uniform(0, 0));
        assert_eq!(grid.get(2, 5).map(String::as_str), Ok("Y"));
        assert_eq!(grid.get(5, 2).map(String::as_str), Ok("X"));
        assert_eq!(grid.len(), 64);

        grid.compact();
        assert_eq!(grid.delete(0, 0).as_deref(), Some("X"));
        assert_eq!(grid.len(), 63);
    }

    #[test]
    fn test_same_value_write_keeps_uniform() {
        let mut grid = filled_block("X");
        grid.compact();
        grid.set(1, 1, "X".to_string());
        assert!(grid.is_block_uniform(0, 0));
    }

    #[test]
    fn test_iteration_views() {
        let grid: PlaneGrid<i32> = [((0, 0), 1), ((-1, 3), 2), ((12, -5), 3)].into_iter().collect();
        let mut keys: Vec<_> = grid.keys().collect();
        keys.sort();
        assert_eq!(keys, vec![(-1, 3), (0, 0), (12, -5)]);
        let mut values: Vec<_> = grid.values().copied().collect();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(grid.iter().count(), 3);
    }

    #[test]
    fn test_contains_rejects_illegal_keys() {
        let mut grid = PlaneGrid::new();
        grid.set(1, 2, ());
        assert!(grid.contains(1, 2));
        assert!(grid.contains_key(&(1i32, 2i32)));
        assert!(grid.contains_key(&[1, 2]));
        assert!(grid.contains_key(&vec![1, 2]));
        assert!(!grid.contains_key(&vec![1, 2, 3]));
        assert!(!grid.contains_key(&vec![1]));
        assert!(!grid.contains_key(&[1, 2, 0][..]));
        assert!(!grid.contains_key(&(i64::MAX, 2i64)));
    }

    #[test]
    fn test_largest_index_returns_populated_cell() {
        let mut grid = PlaneGrid::new();
        grid.set(0, 0, 'a');
        grid.set(17, 3, 'b');
        grid.set(-20, 40, 'c');
        let ((x, y), value) = grid.largest_index().expect("grid is populated");
        assert_eq!(grid.get(x, y), Ok(value));
        assert_eq!((x, y), (17, 3));
    }
}
