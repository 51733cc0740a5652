//! Bevel flags for the four edges of a tile brush.

use std::collections::BTreeSet;

/// One of the four edges of a tile, in its `(u, v)` plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeSide {
    UMin = 0,
    UMax = 1,
    VMin = 2,
    VMax = 3,
}

impl EdgeSide {
    pub const ALL: [EdgeSide; 4] = [EdgeSide::UMin, EdgeSide::UMax, EdgeSide::VMin, EdgeSide::VMax];

    /// Unit step towards this edge, as `(du, dv)`.
    pub fn offset(self) -> (i32, i32) {
        match self {
            EdgeSide::UMin => (-1, 0),
            EdgeSide::UMax => (1, 0),
            EdgeSide::VMin => (0, -1),
            EdgeSide::VMax => (0, 1),
        }
    }

    /// The four cells just outside a 4x4 grid on this side.
    pub fn ring_points(self) -> [(i32, i32); 4] {
        std::array::from_fn(|i| {
            let i = i as i32;
            match self {
                EdgeSide::UMin => (-1, i),
                EdgeSide::UMax => (4, i),
                EdgeSide::VMin => (i, -1),
                EdgeSide::VMax => (i, 4),
            }
        })
    }
}

/// Which edges of a brush are chamfered at 45 degrees.
///
/// Bit 0 = U min, bit 1 = U max, bit 2 = V min, bit 3 = V max.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bevels(pub u8);

impl Bevels {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    /// Builds flags in `(u_min, u_max, v_min, v_max)` order.
    pub fn from_flags(u_min: bool, u_max: bool, v_min: bool, v_max: bool) -> Self {
        let mut bevels = Self::NONE;
        for (side, on) in EdgeSide::ALL.into_iter().zip([u_min, u_max, v_min, v_max]) {
            if on {
                bevels.set(side);
            }
        }
        bevels
    }

    pub fn contains(self, side: EdgeSide) -> bool {
        self.0 & (1 << side as u8) != 0
    }

    pub fn set(&mut self, side: EdgeSide) {
        self.0 |= 1 << side as u8;
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl std::ops::BitOr for Bevels {
    type Output = Bevels;

    fn bitor(self, other: Bevels) -> Bevels {
        Bevels(self.0 | other.0)
    }
}

/// Cells around (or inside) a 4x4 grid that neighbouring brushes bevel
/// towards.
pub type BevelPoints = BTreeSet<(i32, i32)>;

/// Bevel flags for the cell rectangle `u_range x v_range`: an edge is
/// bevelled when any cell just past it is in `points`.
pub fn rect_bevels(points: &BevelPoints, u_min: i32, u_max: i32, v_min: i32, v_max: i32) -> Bevels {
    let u_cells = u_min.max(0)..u_max.min(4);
    let v_cells = v_min.max(0)..v_max.min(4);
    Bevels::from_flags(
        v_cells.clone().any(|v| points.contains(&(u_min - 1, v))),
        v_cells.clone().any(|v| points.contains(&(u_max, v))),
        u_cells.clone().any(|u| points.contains(&(u, v_min - 1))),
        u_cells.clone().any(|u| points.contains(&(u, v_max))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let bevels = Bevels::from_flags(true, false, false, true);
        assert!(bevels.contains(EdgeSide::UMin));
        assert!(!bevels.contains(EdgeSide::UMax));
        assert!(bevels.contains(EdgeSide::VMax));
        assert_eq!(bevels.count(), 2);
        assert_eq!(bevels | Bevels::from_flags(false, true, true, false), Bevels::ALL);
    }

    #[test]
    fn test_ring_points_surround_grid() {
        let ring: BevelPoints = EdgeSide::ALL.into_iter().flat_map(EdgeSide::ring_points).collect();
        assert_eq!(ring.len(), 16);
        assert!(ring.contains(&(-1, 0)));
        assert!(ring.contains(&(3, 4)));
        assert!(!ring.contains(&(-1, -1)));
    }

    #[test]
    fn test_rect_bevels_is_union_of_cells() {
        // Only the cell beside row 2 wants a bevel on the U min side.
        let points: BevelPoints = [(-1, 2)].into_iter().collect();
        assert_eq!(rect_bevels(&points, 0, 4, 0, 4), Bevels::from_flags(true, false, false, false));
        // A rectangle not reaching row 2 stays flat.
        assert_eq!(rect_bevels(&points, 0, 4, 0, 2), Bevels::NONE);
        // Interior points bevel rectangles that stop next to them.
        let inner: BevelPoints = [(2, 1)].into_iter().collect();
        assert_eq!(rect_bevels(&inner, 0, 2, 0, 4), Bevels::from_flags(false, true, false, false));
    }
}
