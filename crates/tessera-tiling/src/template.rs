//! Master faces that tile brushes are stamped from.
//!
//! A template holds, per facing direction, one front face, one back face and
//! an edge face for every side, thickness and bevel state. [`TileTemplate::make_tile`]
//! copies the relevant faces, moves them onto the tile's footprint and
//! assigns materials.

use std::collections::BTreeMap;

use glam::DVec3;
use tessera_brush::{Face, FaceId, LevelDoc, Solid, UvAxis};
use tessera_plane::FaceDirection;
use tessera_texturing::{MaterialConf, QuarterRot, Texturing};

use crate::bevel::{Bevels, EdgeSide};
use crate::error::TilingError;

/// Tile thicknesses that have edge faces.
pub const THICKNESSES: [u32; 3] = [2, 4, 8];

/// Texture offsets on edges and backs wrap at this many texels.
const EDGE_WRAP: f64 = 512.0;

/// Which master face a template entry provides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplatePart {
    Front,
    Back,
    Edge(EdgeKey),
}

/// Identifies one edge face: the side, the brush thickness and whether the
/// edge is bevelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub side: EdgeSide,
    pub thickness: u32,
    pub bevel: bool,
}

impl std::fmt::Display for TemplatePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplatePart::Front => f.write_str("front"),
            TemplatePart::Back => f.write_str("back"),
            TemplatePart::Edge(key) => write!(
                f,
                "{:?} edge ({} thick{})",
                key.side,
                key.thickness,
                if key.bevel { ", bevelled" } else { "" }
            ),
        }
    }
}

#[derive(Clone, Debug)]
struct TemplateFaces {
    front: Face,
    back: Face,
    edges: BTreeMap<EdgeKey, Face>,
}

/// Master faces for all six directions.
#[derive(Clone, Debug)]
pub struct TileTemplate {
    faces: [TemplateFaces; 6],
}

/// Everything needed to build one tile brush.
#[derive(Clone, Debug)]
pub struct TileSpec<'a> {
    /// Centre of the front face.
    pub origin: DVec3,
    pub normal: FaceDirection,
    pub front: &'a MaterialConf,
    pub back: &'a str,
    /// Extent along the plane's U axis.
    pub width: f64,
    /// Extent along the plane's V axis.
    pub height: f64,
    pub bevels: Bevels,
    pub thickness: u32,
    /// Front texture offsets wrap at these texel counts.
    pub u_align: f64,
    pub v_align: f64,
    pub antigel: bool,
    /// Use the panel edge material instead of the regular one.
    pub panel_edge: bool,
}

impl<'a> TileSpec<'a> {
    /// A flat, unbevelled tile 4 units thick.
    pub fn new(origin: DVec3, normal: FaceDirection, front: &'a MaterialConf, back: &'a str, width: f64, height: f64) -> Self {
        Self {
            origin,
            normal,
            front,
            back,
            width,
            height,
            bevels: Bevels::NONE,
            thickness: 4,
            u_align: 512.0,
            v_align: 512.0,
            antigel: false,
            panel_edge: false,
        }
    }
}

impl TileTemplate {
    /// Builds a template from explicit faces.
    ///
    /// Every direction needs a front, a back and all twelve edge variants per
    /// side. Face ids in the entries are ignored.
    pub fn from_faces(entries: impl IntoIterator<Item = (FaceDirection, TemplatePart, Face)>) -> Result<Self, TilingError> {
        let mut by_dir: [BTreeMap<TemplatePart, Face>; 6] = Default::default();
        for (normal, part, face) in entries {
            by_dir[normal.index()].insert(part, face);
        }

        let mut faces = Vec::with_capacity(6);
        for (dir, mut parts) in FaceDirection::ALL.into_iter().zip(by_dir) {
            if parts.is_empty() {
                return Err(TilingError::MissingOrientation { normal: dir });
            }
            let mut take = |part: TemplatePart| {
                parts.remove(&part).ok_or_else(|| TilingError::MissingTemplateFace {
                    normal: dir,
                    face: part.to_string(),
                })
            };
            let front = take(TemplatePart::Front)?;
            let back = take(TemplatePart::Back)?;
            let mut edges = BTreeMap::new();
            for key in all_edge_keys() {
                edges.insert(key, take(TemplatePart::Edge(key))?);
            }
            faces.push(TemplateFaces { front, back, edges });
        }

        let faces: [TemplateFaces; 6] = faces
            .try_into()
            .map_err(|_| TilingError::MissingOrientation { normal: FaceDirection::PosX })?;
        Ok(Self { faces })
    }

    /// Geometric master faces: front and back through the origin, edges
    /// through the origin facing outwards, tilted 45 degrees back when
    /// bevelled.
    pub fn standard() -> Self {
        Self {
            faces: FaceDirection::ALL.map(standard_faces),
        }
    }

    /// Builds one tile brush. The front face is the solid's first face.
    pub fn make_tile(&self, doc: &mut LevelDoc, texturing: &Texturing, spec: &TileSpec<'_>) -> Result<Solid, TilingError> {
        if !THICKNESSES.contains(&spec.thickness) {
            return Err(TilingError::BadThickness {
                thickness: spec.thickness,
            });
        }
        if spec.width < 8.0 || spec.height < 8.0 {
            return Err(TilingError::TileTooSmall {
                width: spec.width,
                height: spec.height,
            });
        }

        let template = &self.faces[spec.normal.index()];
        let n = spec.normal.vec();
        let (u_ax, v_ax) = spec.normal.uv_axes();
        let u_dir = axis_vec(u_ax);
        let v_dir = axis_vec(v_ax);
        let block_min = (spec.origin / 128.0).floor() * 128.0;

        let mut front = doc.copy_face(&template.front);
        front.translate(spec.origin);
        apply_material(&mut front, spec.front);
        front.u_axis.offset =
            ((block_min[u_ax] - (spec.origin[u_ax] - spec.width / 2.0)) / front.u_axis.scale).rem_euclid(spec.u_align);
        front.v_axis.offset =
            ((block_min[v_ax] - (spec.origin[v_ax] - spec.height / 2.0)) / front.v_axis.scale).rem_euclid(spec.v_align);

        let mut back = doc.copy_face(&template.back);
        back.material = spec.back.to_string();
        back.u_axis.scale = back_scale(spec.bevels.contains(EdgeSide::UMin), spec.bevels.contains(EdgeSide::UMax));
        back.v_axis.scale = back_scale(spec.bevels.contains(EdgeSide::VMin), spec.bevels.contains(EdgeSide::VMax));
        let bu = if spec.bevels.contains(EdgeSide::UMin) { 1.0 } else { 0.0 };
        let bv = if spec.bevels.contains(EdgeSide::VMin) { 1.0 } else { 0.0 };
        back.translate(
            spec.origin - n * f64::from(spec.thickness) + u_dir * (4.0 * bu - 64.0) + v_dir * (4.0 * bv - 64.0),
        );
        back.u_axis.offset = back.u_axis.offset.rem_euclid(EDGE_WRAP);
        back.v_axis.offset = back.v_axis.offset.rem_euclid(EDGE_WRAP);

        let edge_slot = if spec.panel_edge { "panel_edge" } else { "edge" };
        let edge_mat = texturing.special().get_antigel(spec.origin, edge_slot, spec.antigel)?;

        let mut faces = vec![front, back];
        for side in EdgeSide::ALL {
            let key = EdgeKey {
                side,
                thickness: spec.thickness,
                bevel: spec.bevels.contains(side),
            };
            let Some(master) = template.edges.get(&key) else {
                return Err(TilingError::MissingTemplateFace {
                    normal: spec.normal,
                    face: TemplatePart::Edge(key).to_string(),
                });
            };
            let (du, dv) = side.offset();
            let mut edge = doc.copy_face(master);
            edge.translate(
                spec.origin + u_dir * (f64::from(du) * spec.width / 2.0) + v_dir * (f64::from(dv) * spec.height / 2.0),
            );
            edge.material = edge_mat.mat.clone();
            edge.u_axis.offset = edge.u_axis.offset.rem_euclid(EDGE_WRAP);
            edge.v_axis.offset = 0.0;
            faces.push(edge);
        }
        Ok(doc.new_solid(faces))
    }
}

/// Sets a face's material, scale and rotation from a configured material.
pub fn apply_material(face: &mut Face, conf: &MaterialConf) {
    face.material = conf.mat.clone();
    face.u_axis.scale = 0.25 * conf.scale;
    face.v_axis.scale = 0.25 * conf.scale;
    let (u, v) = (face.u_axis.axis, face.v_axis.axis);
    let (u, v) = match conf.rotation {
        QuarterRot::None => (u, v),
        QuarterRot::Ccw => (v, -u),
        QuarterRot::Half => (-u, -v),
        QuarterRot::Cw => (-v, u),
    };
    face.u_axis.axis = u;
    face.v_axis.axis = v;
}

/// Makes the face invisible, with unit texture scale.
pub fn make_nodraw(face: &mut Face) {
    face.material = tessera_texturing::NODRAW.to_string();
    face.u_axis.offset = 0.0;
    face.v_axis.offset = 0.0;
    face.u_axis.scale = 0.25;
    face.v_axis.scale = 0.25;
}

/// Back texture scale for a tile axis with the given bevels.
fn back_scale(bevel_min: bool, bevel_max: bool) -> f64 {
    match u8::from(bevel_min) + u8::from(bevel_max) {
        0 => 128.0 / 512.0,
        1 => 124.0 / 512.0,
        _ => 120.0 / 512.0,
    }
}

fn axis_vec(axis: usize) -> DVec3 {
    let mut v = DVec3::ZERO;
    v[axis] = 1.0;
    v
}

fn all_edge_keys() -> impl Iterator<Item = EdgeKey> {
    EdgeSide::ALL.into_iter().flat_map(|side| {
        THICKNESSES
            .into_iter()
            .flat_map(move |thickness| [false, true].map(|bevel| EdgeKey { side, thickness, bevel }))
    })
}

fn template_face(point: DVec3, normal: DVec3, u: DVec3, v: DVec3) -> Face {
    Face {
        id: FaceId(0),
        point,
        normal,
        material: tessera_texturing::NODRAW.to_string(),
        u_axis: UvAxis::new(u),
        v_axis: UvAxis::new(v),
    }
}

fn standard_faces(dir: FaceDirection) -> TemplateFaces {
    let n = dir.vec();
    let (u_ax, v_ax) = dir.uv_axes();
    let u = axis_vec(u_ax);
    let v = axis_vec(v_ax);

    let edges = all_edge_keys()
        .map(|key| {
            let (du, dv) = key.side.offset();
            let side = u * f64::from(du) + v * f64::from(dv);
            let along = if du != 0 { v } else { u };
            let normal = if key.bevel { (side - n).normalize() } else { side };
            (key, template_face(DVec3::ZERO, normal, along, -n))
        })
        .collect();
    TemplateFaces {
        front: template_face(DVec3::ZERO, n, u, -v),
        back: template_face(DVec3::ZERO, -n, u, -v),
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::TexturingConfig;
    use tessera_texturing::{MapSeed, TileSize};

    fn entries(dir: FaceDirection) -> Vec<(FaceDirection, TemplatePart, Face)> {
        let faces = standard_faces(dir);
        let mut out = vec![
            (dir, TemplatePart::Front, faces.front),
            (dir, TemplatePart::Back, faces.back),
        ];
        out.extend(faces.edges.into_iter().map(|(key, face)| (dir, TemplatePart::Edge(key), face)));
        out
    }

    fn texturing() -> Texturing {
        Texturing::from_config(&TexturingConfig::default(), MapSeed::default()).unwrap()
    }

    #[test]
    fn test_missing_orientation() {
        let err = TileTemplate::from_faces(entries(FaceDirection::PosZ)).unwrap_err();
        assert_eq!(err, TilingError::MissingOrientation { normal: FaceDirection::PosX });
    }

    #[test]
    fn test_missing_edge_face() {
        let dropped = TemplatePart::Edge(EdgeKey {
            side: EdgeSide::VMax,
            thickness: 8,
            bevel: true,
        });
        let all = FaceDirection::ALL
            .into_iter()
            .flat_map(entries)
            .filter(|(dir, part, _)| !(*dir == FaceDirection::NegY && *part == dropped));
        match TileTemplate::from_faces(all) {
            Err(TilingError::MissingTemplateFace { normal, face }) => {
                assert_eq!(normal, FaceDirection::NegY);
                assert!(face.contains("VMax"), "{face}");
            }
            other => panic!("expected missing face, got {other:?}"),
        }
    }

    #[test]
    fn test_standard_round_trips_through_from_faces() {
        assert!(TileTemplate::from_faces(FaceDirection::ALL.into_iter().flat_map(entries)).is_ok());
    }

    #[test]
    fn test_make_tile_box() {
        let template = TileTemplate::standard();
        let texturing = texturing();
        let mut doc = LevelDoc::new();
        let front = MaterialConf::new("tile/white_floor_tile002a", TileSize::Tile4x4);
        let spec = TileSpec::new(DVec3::new(64.0, 64.0, 128.0), FaceDirection::PosZ, &front, "behind", 128.0, 128.0);
        let solid = template.make_tile(&mut doc, &texturing, &spec).unwrap();

        assert_eq!(solid.faces.len(), 6);
        assert_eq!(solid.faces[0].material, "tile/white_floor_tile002a");
        assert_eq!(solid.faces[1].material, "behind");
        assert!(solid.contains_point(DVec3::new(64.0, 64.0, 126.0)));
        assert!(solid.contains_point(DVec3::new(1.0, 127.0, 124.5)));
        assert!(!solid.contains_point(DVec3::new(64.0, 64.0, 129.0)));
        assert!(!solid.contains_point(DVec3::new(64.0, 64.0, 123.0)));
        assert!(!solid.contains_point(DVec3::new(129.0, 64.0, 126.0)));
        let ids: std::collections::BTreeSet<_> = solid.faces.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), 6, "faces get fresh ids");
    }

    #[test]
    fn test_bevelled_edge_is_inset_at_the_back() {
        let template = TileTemplate::standard();
        let texturing = texturing();
        let mut doc = LevelDoc::new();
        let front = MaterialConf::new("a", TileSize::Tile4x4);
        let mut spec = TileSpec::new(DVec3::new(0.0, 64.0, 64.0), FaceDirection::PosX, &front, "behind", 128.0, 128.0);
        spec.bevels = Bevels::from_flags(true, false, false, false);
        let solid = template.make_tile(&mut doc, &texturing, &spec).unwrap();
        // The U axis of an X-facing tile is Y; the U-min edge is at y = 0.
        assert!(solid.contains_point(DVec3::new(-0.5, 0.5, 64.0)));
        assert!(!solid.contains_point(DVec3::new(-3.5, 0.5, 64.0)));
        assert!(solid.contains_point(DVec3::new(-3.5, 127.5, 64.0)));
    }

    #[test]
    fn test_make_tile_rejects_bad_sizes() {
        let template = TileTemplate::standard();
        let texturing = texturing();
        let mut doc = LevelDoc::new();
        let front = MaterialConf::new("a", TileSize::Tile4x4);
        let mut spec = TileSpec::new(DVec3::ZERO, FaceDirection::PosZ, &front, "behind", 128.0, 4.0);
        assert!(matches!(
            template.make_tile(&mut doc, &texturing, &spec),
            Err(TilingError::TileTooSmall { .. })
        ));
        spec.height = 128.0;
        spec.thickness = 3;
        assert_eq!(
            template.make_tile(&mut doc, &texturing, &spec).unwrap_err(),
            TilingError::BadThickness { thickness: 3 }
        );
    }

    #[test]
    fn test_back_scale_shrinks_with_bevels() {
        assert_eq!(back_scale(false, false), 0.25);
        assert!(back_scale(true, false) < back_scale(false, false));
        assert!(back_scale(true, true) < back_scale(true, false));
    }

    #[test]
    fn test_apply_material_rotation() {
        let mut face = template_face(DVec3::ZERO, DVec3::Z, DVec3::X, DVec3::NEG_Y);
        let mut conf = MaterialConf::new("a", TileSize::Tile1x1);
        conf.scale = 2.0;
        conf.rotation = QuarterRot::Half;
        apply_material(&mut face, &conf);
        assert_eq!(face.u_axis.axis, DVec3::NEG_X);
        assert_eq!(face.v_axis.axis, DVec3::Y);
        assert_eq!(face.u_axis.scale, 0.5);
    }
}
