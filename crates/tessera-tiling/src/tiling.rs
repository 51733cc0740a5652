//! Every tile in a level, and the pass that turns them into brushes.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use glam::{DVec3, IVec3};
use rustc_hash::FxHashMap;
use tessera_brush::{BlockKind, BlockOracle, EntityId, FaceId, LevelDoc, grid_to_world, world_to_grid};
use tessera_plane::{FaceDirection, PlaneGrid, PlaneKey, group_runs, optimise};
use tessera_texturing::{GenCat, MaterialConf, NODRAW, Portalable, TileSize, Texturing};
use tracing::{debug, info, warn};

use crate::bevel::{BevelPoints, Bevels, EdgeSide};
use crate::error::TilingError;
use crate::goo::GooOptions;
use crate::overlay::{SIDES_KEY, format_sides, make_portal_helper, parse_sides};
use crate::template::{TileSpec, TileTemplate};
use crate::tile_type::TileType;
use crate::tiledef::{EmitContext, TileDef};

/// Identifies a tile: the voxel behind it and the direction it faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub grid: IVec3,
    pub normal: FaceDirection,
}

impl TileKey {
    pub fn new(grid: IVec3, normal: FaceDirection) -> Self {
        Self { grid, normal }
    }

    pub fn of(tile: &TileDef) -> Self {
        Self::new(world_to_grid(tile.pos), tile.normal)
    }
}

impl Ord for TileKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.grid
            .to_array()
            .cmp(&other.grid.to_array())
            .then(self.normal.cmp(&other.normal))
    }
}

impl PartialOrd for TileKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A merged rectangle of plane cells, inclusive, with its bevels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeRect {
    pub min_u: i32,
    pub max_u: i32,
    pub min_v: i32,
    pub max_v: i32,
    pub bevels: Bevels,
}

/// Tiles sharing one material on one plane.
struct TexGroup {
    mat: MaterialConf,
    antigel: bool,
    grid: PlaneGrid<bool>,
    cells: FxHashMap<(i32, i32), TileKey>,
}

/// All tiles of one compile.
#[derive(Clone, Debug, Default)]
pub struct Tiling {
    tiles: BTreeMap<TileKey, TileDef>,
    overlays: BTreeMap<EntityId, BTreeSet<TileKey>>,
    pub goo: GooOptions,
}

impl Tiling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tile, replacing and returning any tile with the same key.
    pub fn insert(&mut self, tile: TileDef) -> Option<TileDef> {
        self.tiles.insert(TileKey::of(&tile), tile)
    }

    pub fn get(&self, grid: IVec3, normal: FaceDirection) -> Option<&TileDef> {
        self.tiles.get(&TileKey::new(grid, normal))
    }

    pub fn get_mut(&mut self, grid: IVec3, normal: FaceDirection) -> Option<&mut TileDef> {
        self.tiles.get_mut(&TileKey::new(grid, normal))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&TileKey, &TileDef)> + '_ {
        self.tiles.iter()
    }

    /// Returns the tile at a key, creating one of type `ty` if it's missing.
    pub fn ensure(&mut self, grid: IVec3, normal: FaceDirection, ty: TileType) -> &mut TileDef {
        self.tiles
            .entry(TileKey::new(grid, normal))
            .or_insert_with(|| TileDef::new(grid_to_world(grid), normal, ty))
    }

    /// Finds the tile and sub-tile cell whose front surface holds `origin`.
    ///
    /// `origin` must be the centre of a 32 unit cell on the surface.
    pub fn find_tile(&self, origin: DVec3, normal: FaceDirection) -> Result<(TileKey, usize, usize), TilingError> {
        let found = Self::locate(origin, normal)?;
        if !self.tiles.contains_key(&found.0) {
            return Err(TilingError::TileNotFound { origin, normal });
        }
        Ok(found)
    }

    /// Like [`Tiling::find_tile`], but a missing tile is created as void.
    pub fn find_or_create_tile(
        &mut self,
        origin: DVec3,
        normal: FaceDirection,
    ) -> Result<(TileKey, usize, usize), TilingError> {
        let found = Self::locate(origin, normal)?;
        if !self.tiles.contains_key(&found.0) {
            debug!(?origin, ?normal, "creating tile");
            self.ensure(found.0.grid, normal, TileType::Void);
        }
        Ok(found)
    }

    fn locate(origin: DVec3, normal: FaceDirection) -> Result<(TileKey, usize, usize), TilingError> {
        let grid = world_to_grid(origin - normal.vec() * 64.0);
        let centre = grid_to_world(grid);
        let (u_ax, v_ax) = normal.uv_axes();
        let off_grid = || TilingError::OffGrid { origin, normal };
        let cell = |axis: usize| {
            let pos = (origin[axis] - centre[axis] + 64.0 - 16.0) / 32.0;
            if pos.fract() == 0.0 && (0.0..4.0).contains(&pos) {
                Ok(pos as usize)
            } else {
                Err(off_grid())
            }
        };
        let (u, v) = (cell(u_ax)?, cell(v_ax)?);
        Ok((TileKey::new(grid, normal), u, v))
    }

    /// Changes the type of one sub-tile.
    ///
    /// Unless `force` is set, void cells stay void, nodraw cells don't turn
    /// back into tiles and goo sides don't regress to black. A forced edit
    /// also creates a missing tile. Returns whether the cell was changed.
    pub fn edit_quarter_tile(
        &mut self,
        origin: DVec3,
        normal: FaceDirection,
        ty: TileType,
        force: bool,
    ) -> Result<bool, TilingError> {
        let found = if force {
            self.find_or_create_tile(origin, normal)
        } else {
            self.find_tile(origin, normal)
        };
        let (key, u, v) = match found {
            Ok(found) => found,
            Err(TilingError::TileNotFound { .. }) => {
                warn!(?origin, ?normal, "expected a tile to edit");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        let Some(tile) = self.tiles.get_mut(&key) else {
            return Ok(false);
        };
        let old = tile.get(u, v);
        if !force {
            let keep = match old {
                TileType::Void => true,
                TileType::Nodraw => ty.is_tile(),
                TileType::GooSide => matches!(ty, TileType::Black | TileType::Black4x4),
                _ => false,
            };
            if keep {
                return Ok(false);
            }
        }
        tile.set(u, v, ty);
        Ok(true)
    }

    /// Attaches an overlay to a tile. After emission its `sides` list the
    /// faces generated for every tile it is bound to.
    pub fn bind_overlay(&mut self, overlay: EntityId, key: TileKey) {
        self.overlays.entry(overlay).or_default().insert(key);
    }

    /// Voxel and normal of every tile with real tile cells, for clump setup.
    pub fn texture_setup_points(&self) -> Vec<(IVec3, DVec3)> {
        self.tiles
            .iter()
            .filter(|(_, tile)| tile.iter().any(|(_, _, ty)| ty.is_tile()))
            .map(|(key, _)| (key.grid, key.normal.vec()))
            .collect()
    }

    /// Whether the edge of a tile one step along `(du, dv)` needs a bevel.
    pub fn should_bevel(&self, key: TileKey, du: i32, dv: i32, blocks: &dyn BlockOracle) -> bool {
        let (u_ax, v_ax) = key.normal.uv_axes();
        let side = if du != 0 {
            FaceDirection::from_axis(u_ax, du)
        } else {
            FaceDirection::from_axis(v_ax, dv)
        };
        let Some(side) = side else {
            return false;
        };
        let neighbour = key.grid + side.ivec();

        if blocks.block(neighbour).inside_map() {
            return true;
        }
        if let Some(tile) = self.tiles.get(&TileKey::new(key.grid, side)) {
            return tile.base_type() != TileType::Void;
        }
        if blocks.block(key.grid) == BlockKind::Embed {
            return match self.tiles.get(&TileKey::new(neighbour, key.normal)) {
                Some(tile) => tile.base_type() == TileType::Void,
                None => {
                    warn!(grid = ?neighbour, normal = ?key.normal, "no tile next to embedded voxel");
                    true
                }
            };
        }
        false
    }

    /// Ring cells around a tile on the sides that need bevelling.
    pub fn bevel_points(&self, key: TileKey, blocks: &dyn BlockOracle) -> BevelPoints {
        EdgeSide::ALL
            .into_iter()
            .filter(|side| {
                let (du, dv) = side.offset();
                self.should_bevel(key, du, dv, blocks)
            })
            .flat_map(EdgeSide::ring_points)
            .collect()
    }

    /// Builds every tile's brushes into `doc`.
    ///
    /// Black cells facing into goo become goo sides first. Plain tiles
    /// sharing a plane and material are merged into larger brushes. The rest
    /// go through pattern matching one by one. Goo pits follow, and finally
    /// bound overlays are pointed at the generated faces.
    pub fn generate_brushes(
        &mut self,
        doc: &mut LevelDoc,
        texturing: &Texturing,
        blocks: &dyn BlockOracle,
        template: &TileTemplate,
    ) -> Result<(), TilingError> {
        let mut ctx = EmitContext {
            doc,
            texturing,
            template,
        };
        let brushes_before = ctx.doc.brushes.len();
        self.apply_goo_sides(blocks);

        let keys: Vec<TileKey> = self.tiles.keys().copied().collect();
        let mut planes: BTreeMap<(PlaneKey, TileType), Vec<TileKey>> = BTreeMap::new();
        for key in keys {
            let Some(tile) = self.tiles.get(&key) else {
                continue;
            };
            if tile.is_simple() {
                // Merged tiles keep every requested helper, portalable or not.
                if tile.has_portal_helper() {
                    make_portal_helper(
                        ctx.doc,
                        tile.front_pos(),
                        key.normal.vec(),
                        tile.portal_helper_orient(),
                        tile.has_oriented_portal_helper(),
                    );
                }
                planes
                    .entry((PlaneKey::new(key.normal, tile.front_pos()), tile.base_type()))
                    .or_default()
                    .push(key);
                continue;
            }
            let bevels = self.bevel_points(key, blocks);
            if let Some(tile) = self.tiles.get_mut(&key) {
                tile.export(&mut ctx, &bevels)?;
            }
        }

        let plane_count = planes.len();
        for ((plane, ty), keys) in planes {
            self.merge_plane(&mut ctx, blocks, plane, ty, &keys)?;
        }
        self.generate_goo(ctx.doc, texturing, blocks)?;
        self.bind_overlay_faces(ctx.doc);

        info!(
            tiles = self.tiles.len(),
            planes = plane_count,
            brushes = ctx.doc.brushes.len() - brushes_before,
            "generated tile brushes"
        );
        Ok(())
    }

    fn merge_plane(
        &mut self,
        ctx: &mut EmitContext<'_>,
        blocks: &dyn BlockOracle,
        plane: PlaneKey,
        ty: TileType,
        keys: &[TileKey],
    ) -> Result<(), TilingError> {
        let normal = plane.normal.vec();
        let mut groups: BTreeMap<(bool, String, u32), TexGroup> = BTreeMap::new();
        for key in keys {
            let Some(tile) = self.tiles.get(key) else {
                continue;
            };
            let loc = tile.front_pos() - normal;
            let mat = match (ty, ty.color()) {
                (TileType::Nodraw, _) => MaterialConf::new(NODRAW, TileSize::Tile4x4),
                (TileType::GooSide, _) => ctx
                    .texturing
                    .generator_for(GenCat::Normal, normal, Portalable::Black)
                    .get(loc, TileSize::Goo.as_str())?
                    .clone(),
                (_, Some(color)) => ctx.texturing.tile_material(
                    GenCat::Normal,
                    normal,
                    color,
                    loc,
                    ty.tile_size().as_str(),
                    tile.is_antigel,
                )?,
                (_, None) => {
                    warn!(?ty, "cannot merge tiles without a color");
                    continue;
                }
            };
            let cell = (plane.world_to_plane(tile.front_pos()) / 128.0).floor().as_ivec2();
            let group = groups
                .entry((tile.is_antigel, mat.mat.clone(), mat.rotation.degrees()))
                .or_insert_with(|| TexGroup {
                    mat,
                    antigel: tile.is_antigel,
                    grid: PlaneGrid::new(),
                    cells: FxHashMap::default(),
                });
            group.grid.set(cell.x, cell.y, true);
            group.cells.insert((cell.x, cell.y), *key);
        }

        for group in groups.into_values() {
            for rect in self.bevel_split(&group.grid, &group.cells, blocks) {
                self.emit_merged(ctx, plane, ty, &group, rect)?;
            }
        }
        Ok(())
    }

    /// Covers a plane with rectangles, splitting each wherever the bevel
    /// state along one of its edges changes.
    pub fn bevel_split(
        &self,
        grid: &PlaneGrid<bool>,
        cells: &FxHashMap<(i32, i32), TileKey>,
        blocks: &dyn BlockOracle,
    ) -> Vec<MergeRect> {
        let bevel_at = |u: i32, v: i32, du: i32, dv: i32| {
            cells
                .get(&(u, v))
                .is_some_and(|key| self.should_bevel(*key, du, dv, blocks))
        };

        let mut out = Vec::new();
        for rect in optimise(grid) {
            let u_edges = group_runs(
                (rect.min_y..=rect.max_y).map(|v| (bevel_at(rect.min_x, v, -1, 0), bevel_at(rect.max_x, v, 1, 0))),
            );
            let v_edges = group_runs(
                (rect.min_x..=rect.max_x).map(|u| (bevel_at(u, rect.min_y, 0, -1), bevel_at(u, rect.max_y, 0, 1))),
            );
            let u_last = (rect.max_x - rect.min_x) as usize;
            let v_last = (rect.max_y - rect.min_y) as usize;

            for &((u_min_bevel, u_max_bevel), v_first, v_end) in &u_edges {
                for &((v_min_bevel, v_max_bevel), u_first, u_end) in &v_edges {
                    out.push(MergeRect {
                        min_u: rect.min_x + u_first as i32,
                        max_u: rect.min_x + u_end as i32,
                        min_v: rect.min_y + v_first as i32,
                        max_v: rect.min_y + v_end as i32,
                        bevels: Bevels::from_flags(
                            u_min_bevel && u_first == 0,
                            u_max_bevel && u_end == u_last,
                            v_min_bevel && v_first == 0,
                            v_max_bevel && v_end == v_last,
                        ),
                    });
                }
            }
        }
        out
    }

    fn emit_merged(
        &mut self,
        ctx: &mut EmitContext<'_>,
        plane: PlaneKey,
        ty: TileType,
        group: &TexGroup,
        rect: MergeRect,
    ) -> Result<(), TilingError> {
        let normal = plane.normal.vec();
        let u_cells = 1 + rect.max_u - rect.min_u;
        let v_cells = 1 + rect.max_v - rect.min_v;
        let center = plane.plane_to_world(
            64.0 * f64::from(rect.min_u + rect.max_u) + 64.0,
            64.0 * f64::from(rect.min_v + rect.max_v) + 64.0,
        );
        let loc = center - normal;

        let mut front = group.mat.clone();
        let mut double_scale = None;
        if let Some(color) = ty.color().filter(|_| ty != TileType::GooSide && !ty.is_4x4()) {
            let generator = ctx.texturing.generator_for(GenCat::Normal, normal, color);
            if generator.contains("double") && generator.weight("double") > 0 && u_cells % 2 == 0 && v_cells % 2 == 0 {
                front = generator.get_antigel(loc, "double", group.antigel)?;
                double_scale = Some(generator.options().scale_up_256);
            }
        }

        let back = ctx.texturing.special().get_antigel(loc, "behind", group.antigel)?;
        let (u_size, v_size) = match ty {
            TileType::Nodraw | TileType::GooSide => (4, 4),
            _ => ty.tile_size().size(),
        };
        let mut spec = TileSpec::new(
            center,
            plane.normal,
            &front,
            &back.mat,
            f64::from(u_cells) * 128.0,
            f64::from(v_cells) * 128.0,
        );
        spec.bevels = rect.bevels;
        spec.u_align = f64::from(u_size) * 128.0;
        spec.v_align = f64::from(v_size) * 128.0;
        spec.antigel = group.antigel;
        let mut brush = ctx.template.make_tile(ctx.doc, ctx.texturing, &spec)?;

        if let Some(scale_up) = double_scale {
            let tile_min = plane.plane_to_world(f64::from(rect.min_u) * 128.0, f64::from(rect.min_v) * 128.0);
            let face = &mut brush.faces[0];
            face.u_axis.offset = (tile_min.dot(face.u_axis.axis) / 0.25).rem_euclid(1024.0);
            face.v_axis.offset = (tile_min.dot(face.v_axis.axis) / 0.25).rem_euclid(1024.0);
            if scale_up {
                face.u_axis.scale = 0.5;
                face.v_axis.scale = 0.5;
                face.u_axis.offset /= 2.0;
                face.v_axis.offset /= 2.0;
            }
        }

        let front_id = brush.faces[0].id;
        for u in rect.min_u..=rect.max_u {
            for v in rect.min_v..=rect.max_v {
                let tile = group.cells.get(&(u, v)).and_then(|key| self.tiles.get_mut(key));
                if let Some(tile) = tile {
                    tile.brush_faces.push(front_id);
                }
            }
        }
        ctx.doc.add_brush(brush);
        Ok(())
    }

    fn bind_overlay_faces(&self, doc: &mut LevelDoc) {
        for (&overlay, keys) in &self.overlays {
            let Some(ent) = doc.entity(overlay) else {
                warn!(?overlay, "bound overlay no longer exists");
                continue;
            };
            let mut sides: BTreeSet<FaceId> = parse_sides(ent.get(SIDES_KEY).unwrap_or_default()).into_iter().collect();
            for key in keys {
                match self.tiles.get(key) {
                    Some(tile) => sides.extend(tile.brush_faces.iter().copied()),
                    None => warn!(?overlay, grid = ?key.grid, normal = ?key.normal, "overlay bound to a missing tile"),
                }
            }
            if sides.is_empty() {
                debug!(?overlay, "removing overlay with no faces");
                doc.remove_entity(overlay);
            } else if let Some(ent) = doc.entity_mut(overlay) {
                ent.set(SIDES_KEY, format_sides(&sides.into_iter().collect::<Vec<_>>()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_brush::BlockGrid;
    use tessera_config::{GeneratorConfig, MaterialEntry, TexturingConfig};
    use tessera_texturing::MapSeed;

    use crate::overlay::make_overlay;

    fn texturing(key: &str, mats: &[&str]) -> Texturing {
        let mut config = TexturingConfig::default();
        config.generators.insert(
            key.to_string(),
            GeneratorConfig {
                textures: [(
                    "4x4".to_string(),
                    mats.iter().map(|m| MaterialEntry::Name(m.to_string())).collect(),
                )]
                .into_iter()
                .collect(),
                ..GeneratorConfig::default()
            },
        );
        Texturing::from_config(&config, MapSeed::from_bytes(b"tiling tests")).unwrap()
    }

    /// Floor tiles on top of solid voxels at z = 0, with air above.
    fn floor(cells: &[(i32, i32)], ty: TileType) -> (Tiling, BlockGrid) {
        let mut tiling = Tiling::new();
        let mut blocks = BlockGrid::new();
        for &(x, y) in cells {
            let grid = IVec3::new(x, y, 0);
            blocks.set(grid, BlockKind::Solid);
            blocks.set(grid + IVec3::Z, BlockKind::Air);
            tiling.insert(TileDef::new(grid_to_world(grid), FaceDirection::PosZ, ty));
        }
        (tiling, blocks)
    }

    fn generate(tiling: &mut Tiling, texturing: &Texturing, blocks: &BlockGrid) -> LevelDoc {
        let mut doc = LevelDoc::new();
        tiling
            .generate_brushes(&mut doc, texturing, blocks, &TileTemplate::standard())
            .unwrap();
        doc
    }

    #[test]
    fn test_key_order_is_total() {
        let a = TileKey::new(IVec3::new(0, 0, 0), FaceDirection::PosZ);
        let b = TileKey::new(IVec3::new(0, 0, 1), FaceDirection::PosX);
        let c = TileKey::new(IVec3::new(0, 0, 1), FaceDirection::NegZ);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_single_black_floor_tile() {
        let texturing = texturing("normal.black.floor", &["M"]);
        let (mut tiling, blocks) = floor(&[(0, 0)], TileType::Black);
        let doc = generate(&mut tiling, &texturing, &blocks);

        assert_eq!(doc.brushes.len(), 1);
        let brush = &doc.brushes[0];
        assert_eq!(brush.faces.len(), 6);
        assert_eq!(brush.faces[0].material, "M");
        assert!(brush.faces[0].contains_point(DVec3::new(64.0, 64.0, 128.0)));
        assert!((brush.faces[0].normal - DVec3::Z).length() < 1e-9);
        let tile = tiling.get(IVec3::ZERO, FaceDirection::PosZ).unwrap();
        assert_eq!(tile.brush_faces, vec![brush.faces[0].id]);
    }

    #[test]
    fn test_coplanar_tiles_merge() {
        let texturing = texturing("normal.black.floor", &["M"]);
        let cells: Vec<_> = (0..3).flat_map(|x| (0..2).map(move |y| (x, y))).collect();
        let (mut tiling, blocks) = floor(&cells, TileType::Black);
        let doc = generate(&mut tiling, &texturing, &blocks);

        assert_eq!(doc.brushes.len(), 1);
        let brush = &doc.brushes[0];
        assert!(brush.contains_point(DVec3::new(1.0, 1.0, 126.0)));
        assert!(brush.contains_point(DVec3::new(383.0, 255.0, 126.0)));
        let front = brush.faces[0].id;
        assert!(tiling.iter().all(|(_, tile)| tile.brush_faces == vec![front]));
    }

    #[test]
    fn test_merged_edge_splits_on_bevel_change() {
        let texturing = texturing("normal.black.floor", &["M"]);
        let (mut tiling, mut blocks) = floor(&[(0, 0), (0, 1), (1, 0), (1, 1)], TileType::Black);
        // A pit next to one cell of the -X edge.
        blocks.set(IVec3::new(-1, 0, 0), BlockKind::Air);

        let key = TileKey::new(IVec3::ZERO, FaceDirection::PosZ);
        assert!(tiling.should_bevel(key, -1, 0, &blocks));
        assert!(!tiling.should_bevel(key, 0, -1, &blocks));

        let doc = generate(&mut tiling, &texturing, &blocks);
        assert_eq!(doc.brushes.len(), 2, "the -X edge can't be half bevelled");
        let bevel_normal = DVec3::new(-1.0, 0.0, -1.0).normalize();
        let bevelled: Vec<_> = doc
            .brushes
            .iter()
            .filter(|b| b.faces.iter().any(|f| (f.normal - bevel_normal).length() < 1e-9))
            .collect();
        assert_eq!(bevelled.len(), 1);
        assert!(bevelled[0].contains_point(DVec3::new(64.0, 64.0, 126.0)));
        assert!(!bevelled[0].contains_point(DVec3::new(64.0, 192.0, 126.0)));
    }

    #[test]
    fn test_embed_hop() {
        let (mut tiling, mut blocks) = floor(&[(0, 0)], TileType::Black);
        let key = TileKey::new(IVec3::ZERO, FaceDirection::PosZ);
        blocks.set(IVec3::X, BlockKind::Solid);
        assert!(!tiling.should_bevel(key, 1, 0, &blocks));

        blocks.set(IVec3::ZERO, BlockKind::Embed);
        assert!(tiling.should_bevel(key, 1, 0, &blocks), "nothing to butt against");
        tiling.insert(TileDef::new(grid_to_world(IVec3::X), FaceDirection::PosZ, TileType::Black));
        assert!(!tiling.should_bevel(key, 1, 0, &blocks));
        tiling.insert(TileDef::new(grid_to_world(IVec3::X), FaceDirection::PosZ, TileType::Void));
        assert!(tiling.should_bevel(key, 1, 0, &blocks));
    }

    #[test]
    fn test_find_tile() {
        let (tiling, _) = floor(&[(0, 0)], TileType::White);
        let (key, u, v) = tiling
            .find_tile(DVec3::new(16.0, 112.0, 128.0), FaceDirection::PosZ)
            .unwrap();
        assert_eq!(key, TileKey::new(IVec3::ZERO, FaceDirection::PosZ));
        assert_eq!((u, v), (0, 3));
        assert!(matches!(
            tiling.find_tile(DVec3::new(20.0, 112.0, 128.0), FaceDirection::PosZ),
            Err(TilingError::OffGrid { .. })
        ));
        assert!(matches!(
            tiling.find_tile(DVec3::new(16.0, 112.0, 128.0), FaceDirection::NegZ),
            Err(TilingError::TileNotFound { .. })
        ));
    }

    #[test]
    fn test_edit_quarter_tile_rules() {
        let (mut tiling, _) = floor(&[(0, 0)], TileType::White);
        let at = |u: f64, v: f64| DVec3::new(16.0 + 32.0 * u, 16.0 + 32.0 * v, 128.0);
        let normal = FaceDirection::PosZ;

        assert!(tiling.edit_quarter_tile(at(0.0, 0.0), normal, TileType::Void, false).unwrap());
        assert!(!tiling.edit_quarter_tile(at(0.0, 0.0), normal, TileType::Black, false).unwrap());
        assert!(tiling.edit_quarter_tile(at(0.0, 0.0), normal, TileType::Black, true).unwrap());

        tiling.edit_quarter_tile(at(1.0, 0.0), normal, TileType::Nodraw, false).unwrap();
        assert!(!tiling.edit_quarter_tile(at(1.0, 0.0), normal, TileType::White, false).unwrap());
        assert!(tiling.edit_quarter_tile(at(1.0, 0.0), normal, TileType::Void, false).unwrap());

        tiling.edit_quarter_tile(at(2.0, 0.0), normal, TileType::GooSide, false).unwrap();
        assert!(!tiling.edit_quarter_tile(at(2.0, 0.0), normal, TileType::Black4x4, false).unwrap());
        assert!(tiling.edit_quarter_tile(at(2.0, 0.0), normal, TileType::White, false).unwrap());

        let tile = tiling.get(IVec3::ZERO, normal).unwrap();
        assert_eq!(tile.get(0, 0), TileType::Black);
        assert_eq!(tile.get(1, 0), TileType::Void);
        assert_eq!(tile.get(2, 0), TileType::White);

        // Missing tiles only warn, unless forced.
        assert!(!tiling.edit_quarter_tile(at(0.0, 0.0), FaceDirection::NegZ, TileType::Black, false).unwrap());
        assert!(tiling.get(IVec3::ZERO, FaceDirection::NegZ).is_none());
    }

    #[test]
    fn test_forced_edit_creates_tile() {
        let mut tiling = Tiling::new();
        let origin = DVec3::new(48.0, 80.0, 128.0);
        let normal = FaceDirection::PosZ;
        assert!(tiling.edit_quarter_tile(origin, normal, TileType::White, true).unwrap());

        let tile = tiling.get(IVec3::ZERO, normal).unwrap();
        assert_eq!(tile.pos, DVec3::splat(64.0));
        assert_eq!(tile.get(1, 2), TileType::White);
        assert_eq!(tile.get(0, 0), TileType::Void);
        assert_eq!(tiling.len(), 1);
    }

    #[test]
    fn test_find_or_create_tile() {
        let mut tiling = Tiling::new();
        let origin = DVec3::new(16.0, 16.0, 128.0);
        assert!(tiling.find_tile(origin, FaceDirection::PosZ).is_err());
        let (key, u, v) = tiling.find_or_create_tile(origin, FaceDirection::PosZ).unwrap();
        assert_eq!((key.grid, u, v), (IVec3::ZERO, 0, 0));
        assert_eq!(tiling.find_tile(origin, FaceDirection::PosZ).unwrap(), (key, 0, 0));

        // An existing tile is left alone.
        tiling.ensure(IVec3::ZERO, FaceDirection::PosZ, TileType::Black).set(0, 0, TileType::White);
        assert_eq!(tiling.get(IVec3::ZERO, FaceDirection::PosZ).unwrap().get(0, 0), TileType::White);
        assert!(matches!(
            tiling.find_or_create_tile(DVec3::new(17.0, 16.0, 128.0), FaceDirection::PosZ),
            Err(TilingError::OffGrid { .. })
        ));
        assert_eq!(tiling.len(), 1);
    }

    #[test]
    fn test_overlay_binding() {
        let texturing = texturing("normal.white.floor", &["W"]);
        let (mut tiling, blocks) = floor(&[(0, 0), (3, 0)], TileType::White);
        tiling.insert(TileDef::new(grid_to_world(IVec3::new(5, 0, 0)), FaceDirection::PosZ, TileType::Void));

        let mut doc = LevelDoc::new();
        let bound = make_overlay(&mut doc, "x", DVec3::ZERO, DVec3::Z, DVec3::X, DVec3::Y, &[FaceId(900)]);
        let orphan = make_overlay(&mut doc, "y", DVec3::ZERO, DVec3::Z, DVec3::X, DVec3::Y, &[]);
        tiling.bind_overlay(bound, TileKey::new(IVec3::ZERO, FaceDirection::PosZ));
        tiling.bind_overlay(bound, TileKey::new(IVec3::new(3, 0, 0), FaceDirection::PosZ));
        tiling.bind_overlay(orphan, TileKey::new(IVec3::new(5, 0, 0), FaceDirection::PosZ));
        tiling
            .generate_brushes(&mut doc, &texturing, &blocks, &TileTemplate::standard())
            .unwrap();

        let sides = parse_sides(doc.entity(bound).unwrap().get(SIDES_KEY).unwrap());
        assert_eq!(sides.len(), 3);
        assert!(sides.contains(&FaceId(900)), "existing sides are kept");
        assert!(sides.windows(2).all(|w| w[0] < w[1]), "sorted");
        assert!(!doc.contains_entity(orphan));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let run = || {
            let texturing = texturing("normal.white.floor", &["a", "b", "c", "d"]);
            let cells: Vec<_> = (0..6).map(|x| (x * 2, 0)).collect();
            let (mut tiling, blocks) = floor(&cells, TileType::White);
            let doc = generate(&mut tiling, &texturing, &blocks);
            doc.brushes.iter().map(|b| b.faces[0].material.clone()).collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first.len(), 6);
        assert_eq!(first, run());
    }

    #[test]
    fn test_texture_setup_points() {
        let (mut tiling, _) = floor(&[(0, 0), (1, 0)], TileType::White);
        tiling.insert(TileDef::new(grid_to_world(IVec3::new(2, 0, 0)), FaceDirection::PosZ, TileType::Nodraw));
        let points = tiling.texture_setup_points();
        assert_eq!(points, vec![(IVec3::ZERO, DVec3::Z), (IVec3::X, DVec3::Z)]);
    }

    #[test]
    fn test_portal_helper_on_merged_tile() {
        let texturing = texturing("normal.white.floor", &["W"]);
        let (mut tiling, blocks) = floor(&[(0, 0)], TileType::White);
        tiling
            .get_mut(IVec3::ZERO, FaceDirection::PosZ)
            .unwrap()
            .add_portal_helper(None)
            .unwrap();
        let doc = generate(&mut tiling, &texturing, &blocks);
        let helper = doc.entities_by_class("info_placement_helper").next().unwrap();
        assert_eq!(helper.origin(), Some(DVec3::new(64.0, 64.0, 128.0)));
        assert_eq!(helper.get("force_placement"), Some("0"));
    }

    #[test]
    fn test_unportalable_merged_tile_keeps_helper() {
        let texturing = texturing("normal.black.floor", &["B"]);
        let (mut tiling, blocks) = floor(&[(0, 0), (1, 0)], TileType::Black);
        tiling
            .get_mut(IVec3::X, FaceDirection::PosZ)
            .unwrap()
            .add_portal_helper(None)
            .unwrap();
        let doc = generate(&mut tiling, &texturing, &blocks);
        let helpers: Vec<_> = doc.entities_by_class("info_placement_helper").collect();
        assert_eq!(helpers.len(), 1);
        assert_eq!(helpers[0].origin(), Some(DVec3::new(192.0, 64.0, 128.0)));
        assert_eq!(helpers[0].get("force_placement"), Some("0"));
    }
}
