//! Marker entities placed alongside tile brushes.

use glam::DVec3;
use tessera_brush::{EntityId, FaceId, LevelDoc, format_vec};

/// Keys that hold the face list of an `info_overlay`.
pub const SIDES_KEY: &str = "sides";

/// Converts a forward/up basis to `"pitch yaw roll"` in degrees.
pub fn basis_to_angles(forward: DVec3, up: DVec3) -> String {
    let forward = forward.normalize();
    let up = up.normalize();
    let left = up.cross(forward);
    let horiz = forward.x.hypot(forward.y);

    let pitch = (-forward.z).atan2(horiz);
    let (yaw, roll) = if horiz > 1e-6 {
        (forward.y.atan2(forward.x), left.z.atan2(up.z))
    } else {
        ((-left.x).atan2(left.y), 0.0)
    };
    format!("{} {} {}", angle_degrees(pitch), angle_degrees(yaw), angle_degrees(roll))
}

fn angle_degrees(radians: f64) -> f64 {
    let degrees = (radians.to_degrees().rem_euclid(360.0) * 1000.0).round() / 1000.0;
    if degrees >= 360.0 { 0.0 } else { degrees + 0.0 }
}

/// Adds an `info_placement_helper` at `pos`, aimed out of `normal` with
/// `orient` as its up direction.
pub fn make_portal_helper(doc: &mut LevelDoc, pos: DVec3, normal: DVec3, orient: DVec3, force: bool) -> EntityId {
    let force = if force { "1" } else { "0" }.to_string();
    doc.create_entity(
        "info_placement_helper",
        [
            ("angles", basis_to_angles(normal, orient)),
            ("origin", format_vec(pos)),
            ("force_placement", force.clone()),
            ("snap_to_helper_angles", force),
            ("radius", "64".to_string()),
        ],
    )
}

/// Adds an `info_overlay` centred on `origin`.
///
/// `u` and `v` are the half extents of the overlay along its texture axes.
pub fn make_overlay(
    doc: &mut LevelDoc,
    material: &str,
    origin: DVec3,
    normal: DVec3,
    u: DVec3,
    v: DVec3,
    faces: &[FaceId],
) -> EntityId {
    let (u_len, v_len) = (u.length(), v.length());
    let corner = |su: f64, sv: f64| format!("{} {} 0", su * u_len, sv * v_len);
    doc.create_entity(
        "info_overlay",
        [
            ("material", material.to_string()),
            ("origin", format_vec(origin)),
            ("basisorigin", format_vec(origin)),
            ("basisnormal", format_vec(normal)),
            ("basisu", format_vec(u.normalize())),
            ("basisv", format_vec(v.normalize())),
            ("startu", "0".to_string()),
            ("endu", "1".to_string()),
            ("startv", "0".to_string()),
            ("endv", "1".to_string()),
            ("uv0", corner(-1.0, -1.0)),
            ("uv1", corner(-1.0, 1.0)),
            ("uv2", corner(1.0, 1.0)),
            ("uv3", corner(1.0, -1.0)),
            (SIDES_KEY, format_sides(faces)),
            ("renderorder", "0".to_string()),
        ],
    )
}

/// Formats face ids the way `sides` stores them.
pub fn format_sides(faces: &[FaceId]) -> String {
    faces.iter().map(|id| id.0.to_string()).collect::<Vec<_>>().join(" ")
}

/// Parses a `sides` value, skipping anything that is not a face id.
pub fn parse_sides(sides: &str) -> Vec<FaceId> {
    sides.split_whitespace().filter_map(|s| s.parse().ok()).map(FaceId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angles_for_axis_bases() {
        assert_eq!(basis_to_angles(DVec3::X, DVec3::Z), "0 0 0");
        assert_eq!(basis_to_angles(DVec3::Y, DVec3::Z), "0 90 0");
        assert_eq!(basis_to_angles(DVec3::NEG_X, DVec3::Z), "0 180 0");
        // Straight up, with the top of the helper towards +X.
        assert_eq!(basis_to_angles(DVec3::Z, DVec3::NEG_X), "270 0 0");
        assert_eq!(basis_to_angles(DVec3::NEG_Z, DVec3::X), "90 0 0");
    }

    #[test]
    fn test_helper_keys() {
        let mut doc = LevelDoc::new();
        let id = make_portal_helper(&mut doc, DVec3::new(64.0, 64.0, 128.0), DVec3::Z, DVec3::X, true);
        let ent = doc.entity(id).unwrap();
        assert_eq!(ent.classname, "info_placement_helper");
        assert_eq!(ent.get("force_placement"), Some("1"));
        assert_eq!(ent.get("snap_to_helper_angles"), Some("1"));
        assert_eq!(ent.get("radius"), Some("64"));
        assert_eq!(ent.origin(), Some(DVec3::new(64.0, 64.0, 128.0)));
    }

    #[test]
    fn test_overlay_corners_and_sides() {
        let mut doc = LevelDoc::new();
        let id = make_overlay(
            &mut doc,
            "signage/mgf_overlay_bullseye",
            DVec3::new(0.0, 0.0, 64.0),
            DVec3::Z,
            DVec3::X * 64.0,
            DVec3::Y * 32.0,
            &[FaceId(4), FaceId(9)],
        );
        let ent = doc.entity(id).unwrap();
        assert_eq!(ent.get("uv0"), Some("-64 -32 0"));
        assert_eq!(ent.get("uv2"), Some("64 32 0"));
        assert_eq!(ent.get("basisu"), Some("1 0 0"));
        assert_eq!(ent.get(SIDES_KEY), Some("4 9"));
        assert_eq!(parse_sides("4 9 x"), vec![FaceId(4), FaceId(9)]);
    }
}
