//! Brush faces and convex solids.

use glam::{DQuat, DVec3};

/// Unique identifier of a face within one [`crate::LevelDoc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u32);

/// Unique identifier of a solid within one [`crate::LevelDoc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolidId(pub u32);

/// Texture projection along one axis of a face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvAxis {
    /// World-space direction the texture runs along.
    pub axis: DVec3,
    /// Texture offset in texels.
    pub offset: f64,
    /// World units per texel.
    pub scale: f64,
}

impl UvAxis {
    /// A projection along `axis` with no offset and the stock 0.25 scale.
    pub fn new(axis: DVec3) -> Self {
        Self {
            axis,
            offset: 0.0,
            scale: 0.25,
        }
    }
}

/// One bounding plane of a solid, with its material and texture alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    /// Identifier used to reattach overlays.
    pub id: FaceId,
    /// A point lying on the plane.
    pub point: DVec3,
    /// Outward unit normal.
    pub normal: DVec3,
    /// Material applied to the face.
    pub material: String,
    /// Texture U projection.
    pub u_axis: UvAxis,
    /// Texture V projection.
    pub v_axis: UvAxis,
}

impl Face {
    /// Signed distance of the plane from the origin, along its normal.
    pub fn plane_distance(&self) -> f64 {
        self.point.dot(self.normal)
    }

    /// Moves the face by `offset`. Texture offsets follow the movement so the
    /// material stays locked to the geometry.
    pub fn translate(&mut self, offset: DVec3) {
        self.point += offset;
        self.u_axis.offset -= offset.dot(self.u_axis.axis) / self.u_axis.scale;
        self.v_axis.offset -= offset.dot(self.v_axis.axis) / self.v_axis.scale;
    }

    /// Rigidly rotates the face around `pivot`.
    pub fn rotate_about(&mut self, pivot: DVec3, rotation: DQuat) {
        self.point = pivot + rotation * (self.point - pivot);
        self.normal = (rotation * self.normal).normalize();
        self.u_axis.axis = rotation * self.u_axis.axis;
        self.v_axis.axis = rotation * self.v_axis.axis;
    }

    /// Returns `true` if `pos` lies on this face's plane.
    pub fn contains_point(&self, pos: DVec3) -> bool {
        (pos - self.point).dot(self.normal).abs() < 1e-3
    }
}

/// A convex brush bounded by its faces.
#[derive(Clone, Debug, PartialEq)]
pub struct Solid {
    /// Identifier of the brush.
    pub id: SolidId,
    /// Bounding faces.
    pub faces: Vec<Face>,
}

impl Solid {
    /// Moves every face by `offset`.
    pub fn translate(&mut self, offset: DVec3) {
        for face in &mut self.faces {
            face.translate(offset);
        }
    }

    /// Rigidly rotates every face around `pivot`.
    pub fn rotate_about(&mut self, pivot: DVec3, rotation: DQuat) {
        for face in &mut self.faces {
            face.rotate_about(pivot, rotation);
        }
    }

    /// Looks up a face by identifier.
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.iter().find(|face| face.id == id)
    }

    /// Returns `true` if `pos` is inside or on the boundary of the solid.
    pub fn contains_point(&self, pos: DVec3) -> bool {
        self.faces
            .iter()
            .all(|face| (pos - face.point).dot(face.normal) <= 1e-3)
    }
}
