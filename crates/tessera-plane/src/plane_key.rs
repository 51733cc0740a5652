//! Identity of an infinite axis-aligned plane.

use glam::{DVec2, DVec3};

use crate::face_direction::FaceDirection;

/// An axis-aligned plane: one of six normals plus a signed distance along it.
///
/// Two keys are equal exactly when both the normal and the distance match,
/// so planes facing opposite ways through the same point are distinct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaneKey {
    /// Direction the plane faces.
    pub normal: FaceDirection,
    /// Signed distance from the origin, measured along `normal`.
    pub distance: i32,
}

impl PlaneKey {
    /// Builds the key of the plane facing `normal` that passes through `point`.
    pub fn new(normal: FaceDirection, point: DVec3) -> Self {
        Self {
            normal,
            distance: point.dot(normal.vec()).round() as i32,
        }
    }

    /// Projects a world position onto the plane's `(u, v)` axes.
    pub fn world_to_plane(&self, pos: DVec3) -> DVec2 {
        let (u, v) = self.normal.uv_axes();
        DVec2::new(pos[u], pos[v])
    }

    /// Converts plane coordinates back to a world position lying on the plane.
    pub fn plane_to_world(&self, u: f64, v: f64) -> DVec3 {
        let (u_axis, v_axis) = self.normal.uv_axes();
        let mut pos = self.normal.vec() * f64::from(self.distance);
        pos[u_axis] = u;
        pos[v_axis] = v;
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_signed_along_normal() {
        let point = DVec3::new(10.0, 20.0, 192.0);
        assert_eq!(PlaneKey::new(FaceDirection::PosZ, point).distance, 192);
        assert_eq!(PlaneKey::new(FaceDirection::NegZ, point).distance, -192);
    }

    #[test]
    fn test_opposite_normals_differ() {
        let point = DVec3::new(0.0, 64.0, 0.0);
        let a = PlaneKey::new(FaceDirection::PosY, point);
        let b = PlaneKey::new(FaceDirection::NegY, -point);
        assert_eq!(a.distance, b.distance);
        assert_ne!(a, b);
    }

    #[test]
    fn test_world_plane_round_trip() {
        let key = PlaneKey::new(FaceDirection::NegX, DVec3::new(-320.0, 0.0, 0.0));
        let pos = DVec3::new(-320.0, 48.0, -96.0);
        let uv = key.world_to_plane(pos);
        assert_eq!(uv, DVec2::new(48.0, -96.0));
        assert_eq!(key.plane_to_world(uv.x, uv.y), pos);
    }
}
