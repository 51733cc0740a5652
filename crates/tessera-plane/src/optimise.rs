//! Greedy rectangle cover for a [`PlaneGrid`].
//!
//! Given a grid, produce non-overlapping rectangles that cover every
//! populated cell, each rectangle holding cells of a single value. The
//! result is a fast heuristic, not a minimal cover.

use rustc_hash::FxHashSet;

use crate::grid::PlaneGrid;

/// An inclusive rectangle of equal-valued cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverRect<T> {
    /// Smallest X coordinate covered.
    pub min_x: i32,
    /// Smallest Y coordinate covered.
    pub min_y: i32,
    /// Largest X coordinate covered.
    pub max_x: i32,
    /// Largest Y coordinate covered.
    pub max_y: i32,
    /// The value shared by every covered cell.
    pub value: T,
}

impl<T> CoverRect<T> {
    /// Number of cells covered.
    pub fn area(&self) -> i32 {
        (self.max_x - self.min_x + 1) * (self.max_y - self.min_y + 1)
    }
}

fn fillable<T: Clone + PartialEq>(
    grid: &PlaneGrid<T>,
    used: &FxHashSet<(i32, i32)>,
    value: &T,
    x: i32,
    y: i32,
) -> bool {
    grid.get(x, y).is_ok_and(|v| v == value) && !used.contains(&(x, y))
}

/// Covers every populated cell of `grid` with equal-valued rectangles.
///
/// Cells are scanned by X then Y. From each uncovered cell the rectangle is
/// grown X-first and Y-first, and the larger of the two is kept.
pub fn optimise<T: Clone + PartialEq>(grid: &PlaneGrid<T>) -> Vec<CoverRect<T>> {
    let (Some((x_min, y_min)), Some((x_max, y_max))) = (grid.mins(), grid.maxes()) else {
        return Vec::new();
    };
    let mut used = FxHashSet::default();
    let mut rects = Vec::new();

    for x in x_min..=x_max {
        for y in y_min..=y_max {
            let Ok(value) = grid.get(x, y) else {
                continue;
            };
            if used.contains(&(x, y)) {
                continue;
            }

            // Exclusive ends.
            let mut x1 = x;
            while x1 <= x_max && fillable(grid, &used, value, x1, y) {
                x1 += 1;
            }
            let mut y1 = y;
            while y1 <= y_max && (x..x1).all(|cx| fillable(grid, &used, value, cx, y1)) {
                y1 += 1;
            }

            let mut y2 = y;
            while y2 <= y_max && fillable(grid, &used, value, x, y2) {
                y2 += 1;
            }
            let mut x2 = x;
            while x2 <= x_max && (y..y2).all(|cy| fillable(grid, &used, value, x2, cy)) {
                x2 += 1;
            }

            let (end_x, end_y) = if (x1 - x) * (y1 - y) > (x2 - x) * (y2 - y) {
                (x1, y1)
            } else {
                (x2, y2)
            };
            for cx in x..end_x {
                for cy in y..end_y {
                    used.insert((cx, cy));
                }
            }
            rects.push(CoverRect {
                min_x: x,
                min_y: y,
                max_x: end_x - 1,
                max_y: end_y - 1,
                value: value.clone(),
            });
        }
    }
    rects
}

/// Groups consecutive equal items, yielding `(value, first_index, last_index)`.
pub fn group_runs<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize, usize)> {
    let mut runs: Vec<(T, usize, usize)> = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        match runs.last_mut() {
            Some((value, _, end)) if *value == item => *end = i,
            _ => runs.push((item, i, i)),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(rows: &[&str]) -> PlaneGrid<char> {
        let mut grid = PlaneGrid::new();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c != '.' {
                    grid.set(x as i32, y as i32, c);
                }
            }
        }
        grid
    }

    fn assert_exact_cover(grid: &PlaneGrid<char>, rects: &[CoverRect<char>]) {
        let mut seen = FxHashSet::default();
        for rect in rects {
            for x in rect.min_x..=rect.max_x {
                for y in rect.min_y..=rect.max_y {
                    assert_eq!(grid.get(x, y), Ok(&rect.value), "rect {rect:?} covers a foreign cell");
                    assert!(seen.insert((x, y)), "cell ({x}, {y}) covered twice");
                }
            }
        }
        assert_eq!(seen.len(), grid.len(), "every populated cell must be covered");
    }

    #[test]
    fn test_single_block() {
        let grid = grid_from(&["aaa", "aaa"]);
        let rects = optimise(&grid);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].area(), 6);
    }

    #[test]
    fn test_mixed_values_are_split() {
        let grid = grid_from(&["aab", "aab", "ccc"]);
        let rects = optimise(&grid);
        assert_exact_cover(&grid, &rects);
        assert_eq!(rects.len(), 3);
    }

    #[test]
    fn test_holes_are_skipped() {
        let grid = grid_from(&["a.a", "aaa", "a.a"]);
        let rects = optimise(&grid);
        assert_exact_cover(&grid, &rects);
    }

    #[test]
    fn test_prefers_larger_orientation() {
        // Growing along Y first from (0, 0) covers the tall column.
        let grid = grid_from(&["a.", "a.", "aa"]);
        let rects = optimise(&grid);
        assert_exact_cover(&grid, &rects);
        assert_eq!(rects[0].area(), 3);
    }

    #[test]
    fn test_empty_grid() {
        let grid: PlaneGrid<char> = PlaneGrid::new();
        assert!(optimise(&grid).is_empty());
    }

    #[test]
    fn test_group_runs() {
        let runs = group_runs([1, 1, 2, 2, 2, 1]);
        assert_eq!(runs, vec![(1, 0, 1), (2, 2, 4), (1, 5, 5)]);
        assert!(group_runs(Vec::<u8>::new()).is_empty());
    }
}
