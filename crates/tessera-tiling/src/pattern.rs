//! Rectangle patterns and the matcher that packs a 4x4 cell grid into them.
//!
//! Pattern bounds are `(u_min, v_min, u_max, v_max)` in 32-unit cells with
//! exclusive maxima. Tables are tried in priority order, largest and most
//! constrained first.

use std::sync::LazyLock;

use tessera_texturing::TileSize;

use crate::tile_type::TileType;

/// Cells on one side of a tile face.
pub const GRID: usize = 4;

/// Row-major storage of a tile's 16 cells, indexed `u * 4 + v`.
pub type Cells = [TileType; GRID * GRID];

/// Index of cell `(u, v)` in [`Cells`].
pub fn cell_index(u: usize, v: usize) -> usize {
    u * GRID + v
}

/// Axis along which a centred fizzler splits a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplitAxis {
    U,
    V,
}

/// A set of placements sharing one material size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub tex: TileSize,
    /// Only usable on walls.
    pub wall_only: bool,
    pub tiles: Vec<(u8, u8, u8, u8)>,
}

impl Pattern {
    /// Builds a pattern, checking every placement fits the grid and is a
    /// whole number of tiles of `tex`.
    ///
    /// # Panics
    ///
    /// Panics on a malformed placement. Tables are fixed, so this only fires
    /// when a table is edited incorrectly.
    pub fn new(tex: TileSize, wall_only: bool, tiles: Vec<(u8, u8, u8, u8)>) -> Self {
        let (tile_u, tile_v) = tex.size();
        for &(u_min, v_min, u_max, v_max) in &tiles {
            assert!(u_min < u_max && u_max <= 4, "{tex} -> {u_min} {v_min} {u_max} {v_max}");
            assert!(v_min < v_max && v_max <= 4, "{tex} -> {u_min} {v_min} {u_max} {v_max}");
            assert_eq!(u32::from(u_max - u_min) % tile_u, 0, "{tex} -> {u_min} {v_min} {u_max} {v_max}");
            assert_eq!(u32::from(v_max - v_min) % tile_v, 0, "{tex} -> {u_min} {v_min} {u_max} {v_max}");
        }
        Self { tex, wall_only, tiles }
    }
}

/// Named pattern tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatternSet {
    /// Everything, including off-grid 2x2 and 2x1 tiles.
    Clean,
    /// Only 1x1, 2x1 and 2x2 tiles aligned to the 64-unit grid.
    GridOnly,
    /// [`PatternSet::Clean`] without tiles crossing the U centreline.
    FizzlerSplitU,
    /// [`PatternSet::Clean`] without tiles crossing the V centreline.
    FizzlerSplitV,
}

impl PatternSet {
    pub fn patterns(self) -> &'static [Pattern] {
        match self {
            PatternSet::Clean => &CLEAN,
            PatternSet::GridOnly => &GRID_ONLY,
            PatternSet::FizzlerSplitU => &SPLIT_U,
            PatternSet::FizzlerSplitV => &SPLIT_V,
        }
    }
}

static CLEAN: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    // Rows and columns for merging with neighbours, largest maxima first.
    let mut strips = Vec::new();
    for x in 0..4 {
        strips.extend([
            (x, 0, x + 1, 4),
            (0, x, 4, x + 1),
            (x, 2, x + 1, 4),
            (2, x, 4, x + 1),
            (x, 0, x + 1, 2),
            (0, x, 2, x + 1),
            (x, 1, x + 1, 3),
            (1, x, 3, x + 1),
        ]);
    }
    strips.sort_by_key(|&(u_min, v_min, u_max, v_max)| (u_min, v_min, std::cmp::Reverse(u_max), std::cmp::Reverse(v_max)));

    vec![
        Pattern::new(TileSize::Tile1x1, false, vec![(0, 0, 4, 4)]),
        Pattern::new(
            TileSize::Tile2x1,
            true,
            vec![(0, 0, 4, 4), (0, 0, 2, 4), (2, 0, 4, 4), (1, 0, 3, 4)],
        ),
        Pattern::new(
            TileSize::Tile2x2,
            false,
            vec![
                (0, 0, 2, 4),
                (0, 0, 4, 2),
                (0, 2, 4, 4),
                (2, 0, 4, 4),
                (1, 0, 3, 4),
                (0, 1, 4, 3),
                // Corners.
                (0, 0, 2, 2),
                (2, 0, 4, 2),
                (0, 2, 2, 4),
                (2, 2, 4, 4),
                (0, 1, 4, 3),
                (1, 1, 3, 3),
                (1, 0, 3, 2),
                (1, 2, 3, 4),
                (0, 1, 2, 3),
                (2, 1, 4, 3),
            ],
        ),
        Pattern::new(TileSize::Tile4x4, false, strips),
    ]
});

static GRID_ONLY: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::new(TileSize::Tile1x1, false, vec![(0, 0, 4, 4)]),
        Pattern::new(TileSize::Tile2x1, true, vec![(0, 0, 2, 4), (2, 0, 4, 4)]),
        Pattern::new(
            TileSize::Tile2x2,
            false,
            vec![(0, 0, 2, 2), (2, 0, 4, 2), (0, 2, 2, 4), (2, 2, 4, 4)],
        ),
    ]
});

static SPLIT_U: LazyLock<Vec<Pattern>> = LazyLock::new(|| split_patterns(|(u_min, _, u_max, _)| u_min >= 2 || u_max <= 2));

static SPLIT_V: LazyLock<Vec<Pattern>> = LazyLock::new(|| split_patterns(|(_, v_min, _, v_max)| v_min >= 2 || v_max <= 2));

/// The clean table restricted to placements accepted by `keep`.
fn split_patterns(keep: impl Fn((u8, u8, u8, u8)) -> bool) -> Vec<Pattern> {
    CLEAN
        .iter()
        .filter_map(|pat| {
            let tiles: Vec<_> = pat.tiles.iter().copied().filter(|&tile| keep(tile)).collect();
            (!tiles.is_empty()).then(|| Pattern::new(pat.tex, pat.wall_only, tiles))
        })
        .collect()
}

/// One brush produced by the matcher.
///
/// Bounds are in cells. They may be half-integers next to a centred split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternRect {
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    pub size: TileSize,
    pub tile: TileType,
}

impl PatternRect {
    fn cells(u_min: usize, u_max: usize, v_min: usize, v_max: usize, size: TileSize, tile: TileType) -> Self {
        Self {
            u_min: u_min as f64,
            u_max: u_max as f64,
            v_min: v_min as f64,
            v_max: v_max as f64,
            size,
            tile,
        }
    }

    /// Integer cell ranges covered, clamped to the grid.
    pub fn cell_ranges(&self) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let clamp = |min: f64, max: f64| (min.max(0.0) as usize)..(max.min(4.0) as usize);
        (clamp(self.u_min, self.u_max), clamp(self.v_min, self.v_max))
    }
}

/// Packs `cells` into rectangles.
///
/// Every non-void cell ends up in exactly one rectangle. Cells no pattern
/// covers are emitted one by one at 4x4 size. With `split`, the two halves
/// are matched separately, their centre edges are pulled back by half a
/// cell, and a nodraw strip fills the gap.
pub fn calc_patterns(cells: &Cells, is_wall: bool, split: Option<SplitAxis>) -> Vec<PatternRect> {
    let Some(axis) = split else {
        return match_patterns(cells, is_wall, PatternSet::Clean);
    };
    let set = match axis {
        SplitAxis::U => PatternSet::FizzlerSplitU,
        SplitAxis::V => PatternSet::FizzlerSplitV,
    };
    let mut rects = match_patterns(cells, is_wall, set);
    let nudge = |min: &mut f64, max: &mut f64| {
        if *min == 2.0 {
            *min = 2.5;
        }
        if *max == 2.0 {
            *max = 1.5;
        }
    };
    for rect in &mut rects {
        match axis {
            SplitAxis::U => nudge(&mut rect.u_min, &mut rect.u_max),
            SplitAxis::V => nudge(&mut rect.v_min, &mut rect.v_max),
        }
    }
    let (u_min, u_max, v_min, v_max) = match axis {
        SplitAxis::U => (1.5, 2.5, 0.0, 4.0),
        SplitAxis::V => (0.0, 4.0, 1.5, 2.5),
    };
    rects.push(PatternRect {
        u_min,
        u_max,
        v_min,
        v_max,
        size: TileSize::Tile4x4,
        tile: TileType::Nodraw,
    });
    rects
}

/// Runs one pattern table over a working copy of the grid.
pub fn match_patterns(cells: &Cells, is_wall: bool, set: PatternSet) -> Vec<PatternRect> {
    let mut work = *cells;
    let mut rects = Vec::new();

    for pattern in set.patterns() {
        if pattern.wall_only && !is_wall {
            continue;
        }
        for &(u_min, v_min, u_max, v_max) in &pattern.tiles {
            let (u_min, v_min, u_max, v_max) = (
                usize::from(u_min),
                usize::from(v_min),
                usize::from(u_max),
                usize::from(v_max),
            );
            let tile = work[cell_index(u_min, v_min)];
            if tile == TileType::Void {
                continue;
            }
            let matches = (u_min..u_max).all(|u| (v_min..v_max).all(|v| work[cell_index(u, v)] == tile));
            if !matches {
                continue;
            }
            for u in u_min..u_max {
                for v in v_min..v_max {
                    work[cell_index(u, v)] = TileType::Void;
                }
            }
            rects.push(PatternRect::cells(u_min, u_max, v_min, v_max, pattern.tex, tile));
        }
    }

    for u in 0..GRID {
        for v in 0..GRID {
            let tile = work[cell_index(u, v)];
            if tile != TileType::Void {
                rects.push(PatternRect::cells(u, u + 1, v, v + 1, TileSize::Tile4x4, tile));
            }
        }
    }
    rects
}

/// Parses a diagram of 4 rows of 4 type characters. The first row is the
/// highest V; columns run along U.
pub fn cells_from_rows(rows: [&str; 4]) -> Result<Cells, crate::TilingError> {
    let mut cells = [TileType::Void; GRID * GRID];
    for (row, line) in rows.iter().enumerate() {
        let v = GRID - 1 - row;
        for (u, c) in line.chars().take(GRID).enumerate() {
            cells[cell_index(u, v)] = TileType::from_char(c)?;
        }
    }
    Ok(cells)
}
