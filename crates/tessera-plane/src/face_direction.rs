//! The six axis-aligned directions a tile surface can face.

use glam::{DVec3, IVec3};

/// One of the six axis-aligned unit normals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FaceDirection {
    /// +X direction.
    PosX = 0,
    /// −X direction.
    NegX = 1,
    /// +Y direction.
    PosY = 2,
    /// −Y direction.
    NegY = 3,
    /// +Z direction.
    PosZ = 4,
    /// −Z direction.
    NegZ = 5,
}

impl FaceDirection {
    /// All six directions in order.
    pub const ALL: [FaceDirection; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Returns the axis this direction lies along (0=X, 1=Y, 2=Z).
    pub fn axis(self) -> usize {
        match self {
            Self::PosX | Self::NegX => 0,
            Self::PosY | Self::NegY => 1,
            Self::PosZ | Self::NegZ => 2,
        }
    }

    /// Returns the two axes spanning a plane with this normal: `(u_axis, v_axis)`.
    ///
    /// X-facing planes use (Y, Z), Y-facing use (X, Z), Z-facing use (X, Y).
    pub fn uv_axes(self) -> (usize, usize) {
        match self.axis() {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        }
    }

    /// `+1` for positive directions, `-1` for negative ones.
    pub fn sign(self) -> i32 {
        match self {
            Self::PosX | Self::PosY | Self::PosZ => 1,
            Self::NegX | Self::NegY | Self::NegZ => -1,
        }
    }

    /// Returns the unit normal as an integer vector.
    pub fn ivec(self) -> IVec3 {
        let mut v = IVec3::ZERO;
        v[self.axis()] = self.sign();
        v
    }

    /// Returns the unit normal as a double-precision vector.
    pub fn vec(self) -> DVec3 {
        self.ivec().as_dvec3()
    }

    /// Builds the direction pointing along `axis` with the sign of `sign`.
    pub fn from_axis(axis: usize, sign: i32) -> Option<Self> {
        let dir = match (axis, sign.signum()) {
            (0, 1) => Self::PosX,
            (0, -1) => Self::NegX,
            (1, 1) => Self::PosY,
            (1, -1) => Self::NegY,
            (2, 1) => Self::PosZ,
            (2, -1) => Self::NegZ,
            _ => return None,
        };
        Some(dir)
    }

    /// Classifies a vector as one of the six directions.
    ///
    /// Returns `None` unless the vector is (within rounding) a unit axis.
    pub fn from_vec(v: DVec3) -> Option<Self> {
        const EPS: f64 = 1e-6;
        let arr = v.to_array();
        let mut found = None;
        for (axis, &c) in arr.iter().enumerate() {
            if (c.abs() - 1.0).abs() < EPS {
                if found.is_some() {
                    return None;
                }
                found = Self::from_axis(axis, if c > 0.0 { 1 } else { -1 });
            } else if c.abs() > EPS {
                return None;
            }
        }
        found
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::NegX => Self::PosX,
            Self::PosY => Self::NegY,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// True for the four horizontal directions.
    pub fn is_wall(self) -> bool {
        self.axis() != 2
    }

    /// Returns the direction index (0–5).
    pub fn index(self) -> usize {
        self as usize
    }
}
