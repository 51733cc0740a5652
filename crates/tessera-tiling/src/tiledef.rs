//! One face of one voxel, subdivided into 4x4 sub-tiles.

use glam::DVec3;
use tessera_brush::{FaceId, LevelDoc, Solid};
use tessera_plane::FaceDirection;
use tessera_texturing::{GenCat, MaterialConf, NODRAW, Portalable, TileSize, Texturing};
use tracing::{debug, warn};

use crate::bevel::{BevelPoints, rect_bevels};
use crate::error::TilingError;
use crate::overlay::{make_overlay, make_portal_helper};
use crate::panel::Panel;
use crate::pattern::{Cells, GRID, PatternRect, SplitAxis, calc_patterns, cell_index};
use crate::template::{TileSpec, TileTemplate};
use crate::tile_type::TileType;

/// Outputs and shared state for one emission pass.
pub struct EmitContext<'a> {
    pub doc: &'a mut LevelDoc,
    pub texturing: &'a Texturing,
    pub template: &'a TileTemplate,
}

/// Sub-tile storage.
#[derive(Clone, Debug, PartialEq)]
pub enum SubTiles {
    /// Every cell holds the base type.
    Uniform,
    /// Independent cells, indexed by [`cell_index`].
    Dense(Cells),
}

/// Knobs for [`TileDef::gen_multitile_pattern`].
#[derive(Clone, Copy, Debug)]
pub struct MultitileOpts {
    pub normal: FaceDirection,
    /// Distance from the voxel centre to the front face.
    pub offset: f64,
    pub thickness: u32,
    pub is_panel: bool,
    pub add_bullseye: bool,
    /// Bevel towards void cells inside the grid.
    pub interior_bevel: bool,
}

impl MultitileOpts {
    pub fn new(normal: FaceDirection) -> Self {
        Self {
            normal,
            offset: 64.0,
            thickness: 4,
            is_panel: false,
            add_bullseye: false,
            interior_bevel: true,
        }
    }
}

/// A voxel face and everything attached to it.
#[derive(Clone, Debug)]
pub struct TileDef {
    /// Centre of the voxel behind the surface.
    pub pos: DVec3,
    pub normal: FaceDirection,
    base_type: TileType,
    sub: SubTiles,
    split: Option<SplitAxis>,
    pub panels: Vec<Panel>,
    helper_count: u32,
    helper_orient: Option<DVec3>,
    pub bullseye_count: u32,
    pub is_antigel: bool,
    /// Forces every tile brush to this material.
    pub override_mat: Option<String>,
    /// Front faces generated for this tile.
    pub brush_faces: Vec<FaceId>,
}

impl TileDef {
    pub fn new(pos: DVec3, normal: FaceDirection, base_type: TileType) -> Self {
        Self {
            pos,
            normal,
            base_type,
            sub: SubTiles::Uniform,
            split: None,
            panels: Vec::new(),
            helper_count: 0,
            helper_orient: None,
            bullseye_count: 0,
            is_antigel: false,
            override_mat: None,
            brush_faces: Vec::new(),
        }
    }

    pub fn base_type(&self) -> TileType {
        self.base_type
    }

    /// Resets every cell to `ty`.
    pub fn set_base_type(&mut self, ty: TileType) {
        self.base_type = ty;
        self.sub = SubTiles::Uniform;
    }

    pub fn is_uniform(&self) -> bool {
        self.sub == SubTiles::Uniform
    }

    pub fn sub_tiles(&self) -> &SubTiles {
        &self.sub
    }

    pub fn get(&self, u: usize, v: usize) -> TileType {
        match &self.sub {
            SubTiles::Uniform => self.base_type,
            SubTiles::Dense(cells) => cells[cell_index(u, v)],
        }
    }

    /// Sets one cell, inflating to dense storage and collapsing back once
    /// all cells agree again.
    pub fn set(&mut self, u: usize, v: usize, ty: TileType) {
        if self.sub == SubTiles::Uniform {
            if ty == self.base_type {
                return;
            }
            self.sub = SubTiles::Dense([self.base_type; GRID * GRID]);
        }
        if let SubTiles::Dense(cells) = &mut self.sub {
            cells[cell_index(u, v)] = ty;
            if cells.iter().all(|&cell| cell == ty) {
                self.base_type = ty;
                self.sub = SubTiles::Uniform;
            }
        }
    }

    /// All 16 cells as `(u, v, type)`, U-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, TileType)> + '_ {
        (0..GRID).flat_map(move |u| (0..GRID).map(move |v| (u, v, self.get(u, v))))
    }

    pub fn cells(&self) -> Cells {
        std::array::from_fn(|i| self.get(i / GRID, i % GRID))
    }

    /// Splits the tile down its centreline, for a fizzler running through it.
    pub fn set_centre_split(&mut self, axis: Option<SplitAxis>) {
        self.split = axis;
    }

    pub fn centre_split(&self) -> Option<SplitAxis> {
        self.split
    }

    pub fn is_wall(&self) -> bool {
        self.normal.is_wall()
    }

    /// Centre of the front surface.
    pub fn front_pos(&self) -> DVec3 {
        self.pos + self.normal.vec() * 64.0
    }

    /// World directions of the tile's U and V axes.
    pub fn uv_dirs(&self) -> (DVec3, DVec3) {
        let (u, v) = self.normal.uv_axes();
        let mut u_dir = DVec3::ZERO;
        let mut v_dir = DVec3::ZERO;
        u_dir[u] = 1.0;
        v_dir[v] = 1.0;
        (u_dir, v_dir)
    }

    /// A point offset from the voxel centre along U, V and the normal.
    pub fn uv_offset(&self, u: f64, v: f64, n: f64) -> DVec3 {
        let (u_dir, v_dir) = self.uv_dirs();
        self.pos + u_dir * u + v_dir * v + self.normal.vec() * n
    }

    /// Whether portals fit: the centre is white, and a full column (or on
    /// floors and ceilings, a full row) through it is too.
    pub fn can_portal(&self) -> bool {
        let white = |u: usize, v: usize| self.get(u, v).is_white();
        let centre = white(1, 1) && white(1, 2) && white(2, 1) && white(2, 2);
        if !centre {
            return false;
        }
        if white(1, 0) && white(2, 0) && white(1, 3) && white(2, 3) {
            return true;
        }
        !self.is_wall() && white(0, 1) && white(0, 2) && white(3, 1) && white(3, 2)
    }

    /// A bullseye was requested, and the centre has a tile to put it on.
    pub fn use_bullseye(&self) -> bool {
        if self.bullseye_count == 0 {
            return false;
        }
        (1..3).any(|u| (1..3).any(|v| self.get(u, v).is_tile()))
    }

    /// Whether this tile can be merged with coplanar neighbours.
    pub fn is_simple(&self) -> bool {
        self.is_uniform()
            && self.split.is_none()
            && self.panels.is_empty()
            && self.bullseye_count == 0
            && self.override_mat.is_none()
            && (self.base_type.is_tile() || self.base_type.is_nodraw())
    }

    /// Requests a portal placement helper. With an orientation, it also
    /// forces the portal's rotation.
    pub fn add_portal_helper(&mut self, orient: Option<DVec3>) -> Result<(), TilingError> {
        match orient {
            Some(orient) => {
                let orient = orient.normalize();
                if orient.dot(self.normal.vec()).abs() > 0.001 {
                    return Err(TilingError::HelperNotFlat {
                        orient,
                        normal: self.normal,
                    });
                }
                self.helper_orient = Some(orient);
            }
            None => self.helper_count += 1,
        }
        Ok(())
    }

    /// Drops one helper request, or all of them.
    pub fn remove_portal_helper(&mut self, all: bool) {
        if all {
            self.helper_count = 0;
            self.helper_orient = None;
        } else {
            self.helper_count = self.helper_count.saturating_sub(1);
        }
    }

    pub fn has_portal_helper(&self) -> bool {
        self.helper_orient.is_some() || self.helper_count > 0
    }

    /// A helper with a fixed orientation, which forces placement.
    pub fn has_oriented_portal_helper(&self) -> bool {
        self.helper_orient.is_some()
    }

    /// The up direction given to placement helpers.
    pub fn portal_helper_orient(&self) -> DVec3 {
        match self.helper_orient {
            Some(orient) => orient,
            None if self.is_wall() => DVec3::Z,
            None => DVec3::X,
        }
    }

    /// Whether to place a helper, and whether it forces placement.
    pub fn helper_state(&self) -> (bool, bool) {
        if self.has_oriented_portal_helper() {
            (true, true)
        } else if self.helper_count > 0 && self.can_portal() {
            (true, false)
        } else {
            (false, false)
        }
    }

    /// Attaches a panel, reserving its cells.
    pub fn attach_panel(&mut self, panel: Panel) {
        self.panels.push(panel);
    }

    /// Splits the cells between the tile and its panels.
    ///
    /// A cell belongs to the first panel reserving it. Each panel's grid only
    /// holds its own cells; the tile keeps nodraw under sealed panels and void
    /// under the rest.
    pub fn resolve_cells(&self) -> (Cells, Vec<Cells>) {
        let mut tile = self.cells();
        let mut claimed = [false; GRID * GRID];
        let mut panels = Vec::with_capacity(self.panels.len());
        for panel in &self.panels {
            let mut own = [TileType::Void; GRID * GRID];
            for (u, v) in panel.reserved() {
                let i = cell_index(u, v);
                if claimed[i] {
                    continue;
                }
                claimed[i] = true;
                own[i] = tile[i];
                tile[i] = if panel.seal { TileType::Nodraw } else { TileType::Void };
            }
            panels.push(own);
        }
        (tile, panels)
    }

    /// Where an item aiming at this tile's bullseye should target, and the
    /// entity it should follow.
    pub fn position_bullseye(&self, doc: &LevelDoc) -> (DVec3, Option<String>) {
        let centre_panel = self
            .panels
            .iter()
            .find(|panel| panel.reserved().any(|(u, v)| (1..3).contains(&u) && (1..3).contains(&v)));
        match centre_panel {
            Some(panel) => (panel.bullseye_position(self), panel.parent_name(doc)),
            None => (self.front_pos(), None),
        }
    }

    /// Packs `cells` into rectangles and builds a brush for each.
    pub fn gen_multitile_pattern(
        &self,
        ctx: &mut EmitContext<'_>,
        cells: &Cells,
        bevels: &BevelPoints,
        opts: MultitileOpts,
    ) -> Result<Vec<Solid>, TilingError> {
        let mut bevels = bevels.clone();
        if opts.interior_bevel {
            for u in 0..GRID {
                for v in 0..GRID {
                    if cells[cell_index(u, v)] == TileType::Void {
                        bevels.insert((u as i32, v as i32));
                    }
                }
            }
        }

        let normal = opts.normal.vec();
        let back = ctx.texturing.special().get_antigel(self.front_pos(), "behind", self.is_antigel)?;
        let mut brushes = Vec::new();
        for rect in calc_patterns(cells, self.is_wall(), self.split) {
            let rect_bevel = rect_bevels(
                &bevels,
                rect.u_min as i32,
                rect.u_max as i32,
                rect.v_min as i32,
                rect.v_max as i32,
            );
            let center = self.uv_offset(
                (rect.u_min + rect.u_max) * 16.0 - 64.0,
                (rect.v_min + rect.v_max) * 16.0 - 64.0,
                opts.offset,
            );
            // Texture lookups sample just behind the surface.
            let loc = center - normal;

            let (front, size) = match rect.tile {
                TileType::Void => continue,
                ty if ty.is_recess() => {
                    debug!(?center, "skipping recessed tile");
                    continue;
                }
                TileType::Nodraw => (MaterialConf::new(NODRAW, TileSize::Tile4x4), TileSize::Tile4x4),
                TileType::GooSide => {
                    let mat = ctx
                        .texturing
                        .generator_for(GenCat::Normal, normal, Portalable::Black)
                        .get(loc, TileSize::Goo.as_str())?
                        .clone();
                    (mat, TileSize::Tile4x4)
                }
                ty => {
                    let size = if ty.is_4x4() { TileSize::Tile4x4 } else { rect.size };
                    let mat = match &self.override_mat {
                        Some(mat) => MaterialConf::new(mat.as_str(), size),
                        None => {
                            let Some(color) = ty.color() else {
                                warn!(?ty, "tile type has no color");
                                continue;
                            };
                            ctx.texturing.tile_material(
                                rect_category(&rect, &opts),
                                normal,
                                color,
                                loc,
                                size.as_str(),
                                self.is_antigel,
                            )?
                        }
                    };
                    (mat, size)
                }
            };

            let (u_size, v_size) = size.size();
            let mut spec = TileSpec::new(
                center,
                opts.normal,
                &front,
                &back.mat,
                (rect.u_max - rect.u_min) * 32.0,
                (rect.v_max - rect.v_min) * 32.0,
            );
            spec.bevels = rect_bevel;
            spec.thickness = opts.thickness;
            spec.u_align = f64::from(u_size) * 128.0;
            spec.v_align = f64::from(v_size) * 128.0;
            spec.antigel = self.is_antigel;
            spec.panel_edge = opts.is_panel;
            let mut brush = ctx.template.make_tile(ctx.doc, ctx.texturing, &spec)?;
            if rect.u_min.fract() != 0.0 {
                brush.faces[0].u_axis.offset = 0.0;
            }
            if rect.v_min.fract() != 0.0 {
                brush.faces[0].v_axis.offset = 0.0;
            }
            brushes.push(brush);
        }
        Ok(brushes)
    }

    /// Emits this tile's brushes, panels and markers.
    ///
    /// `bevels` holds the ring cells next to edges that need bevelling.
    pub fn export(&mut self, ctx: &mut EmitContext<'_>, bevels: &BevelPoints) -> Result<(), TilingError> {
        let (has_helper, force_helper) = self.helper_state();
        let (tile_cells, panel_cells) = self.resolve_cells();

        let panels = std::mem::take(&mut self.panels);
        let mut result = Ok(());
        for (panel, cells) in panels.iter().zip(&panel_cells) {
            result = panel.export(ctx, self, cells);
            if result.is_err() {
                break;
            }
        }
        self.panels = panels;
        result?;

        if tile_cells.iter().all(|&cell| cell == TileType::Void) {
            return Ok(());
        }

        let mut opts = MultitileOpts::new(self.normal);
        opts.add_bullseye = self.use_bullseye();
        let brushes = self.gen_multitile_pattern(ctx, &tile_cells, bevels, opts)?;
        for brush in brushes {
            self.brush_faces.push(brush.faces[0].id);
            ctx.doc.add_brush(brush);
        }

        let normal = self.normal.vec();
        if has_helper && self.can_portal() {
            make_portal_helper(ctx.doc, self.front_pos(), normal, self.portal_helper_orient(), force_helper);
        }
        if self.use_bullseye() {
            let mat = ctx.texturing.overlays().get(self.front_pos(), "bullseye")?;
            let (u_dir, v_dir) = self.uv_dirs();
            make_overlay(
                ctx.doc,
                &mat.mat,
                self.front_pos(),
                normal,
                u_dir * 64.0,
                v_dir * 64.0,
                &self.brush_faces,
            );
        }
        Ok(())
    }
}

fn rect_category(rect: &PatternRect, opts: &MultitileOpts) -> GenCat {
    if opts.is_panel {
        GenCat::Panel
    } else if opts.add_bullseye && !(rect.u_min > 2.0 || rect.v_min > 2.0 || rect.u_max < 1.0 || rect.v_max < 1.0) {
        GenCat::Bullseye
    } else {
        GenCat::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::cells_from_rows;
    use std::collections::BTreeSet;
    use tessera_config::{GeneratorConfig, TexturingConfig};
    use tessera_texturing::MapSeed;

    fn floor_tile(ty: TileType) -> TileDef {
        TileDef::new(DVec3::new(64.0, 64.0, 64.0), FaceDirection::PosZ, ty)
    }

    fn texturing_with(key: &str, all: &str) -> Texturing {
        let mut config = TexturingConfig::default();
        config.generators.insert(
            key.to_string(),
            GeneratorConfig {
                all: Some(all.to_string()),
                ..GeneratorConfig::default()
            },
        );
        Texturing::from_config(&config, MapSeed::from_bytes(b"tiledef tests")).unwrap()
    }

    #[test]
    fn test_set_inflates_and_collapses() {
        let mut tile = floor_tile(TileType::White);
        assert!(tile.is_uniform());
        tile.set(1, 2, TileType::White);
        assert!(tile.is_uniform(), "writing the base type changes nothing");

        tile.set(1, 2, TileType::Black);
        assert!(!tile.is_uniform());
        assert_eq!(tile.get(1, 2), TileType::Black);
        assert_eq!(tile.get(0, 0), TileType::White);
        assert_eq!(tile.iter().filter(|&(_, _, ty)| ty == TileType::Black).count(), 1);

        tile.set(1, 2, TileType::White);
        assert!(tile.is_uniform(), "collapses once all cells match");
        assert_eq!(tile.base_type(), TileType::White);

        for (u, v, _) in floor_tile(TileType::White).iter() {
            tile.set(u, v, TileType::Black);
        }
        assert!(tile.is_uniform());
        assert_eq!(tile.base_type(), TileType::Black);
    }

    #[test]
    fn test_can_portal() {
        let mut tile = floor_tile(TileType::White);
        assert!(tile.can_portal());
        tile.set(1, 0, TileType::Black);
        assert!(tile.can_portal(), "floors can use the other axis");
        tile.set(0, 1, TileType::Black);
        assert!(!tile.can_portal());

        let mut wall = TileDef::new(DVec3::splat(64.0), FaceDirection::PosX, TileType::White);
        wall.set(1, 0, TileType::Black);
        assert!(!wall.can_portal(), "walls need the vertical strip");
    }

    #[test]
    fn test_portal_helpers() {
        let mut tile = floor_tile(TileType::White);
        assert_eq!(tile.helper_state(), (false, false));
        tile.add_portal_helper(None).unwrap();
        assert_eq!(tile.helper_state(), (true, false));
        assert_eq!(tile.portal_helper_orient(), DVec3::X);

        assert!(matches!(
            tile.add_portal_helper(Some(DVec3::Z)),
            Err(TilingError::HelperNotFlat { .. })
        ));
        tile.add_portal_helper(Some(DVec3::new(0.0, 2.0, 0.0))).unwrap();
        assert_eq!(tile.helper_state(), (true, true));
        assert_eq!(tile.portal_helper_orient(), DVec3::Y);

        tile.remove_portal_helper(true);
        assert!(!tile.has_portal_helper());

        let mut black = floor_tile(TileType::Black);
        black.add_portal_helper(None).unwrap();
        assert_eq!(black.helper_state(), (false, false), "black tiles can't hold portals");
    }

    #[test]
    fn test_use_bullseye_needs_centre_tile() {
        let mut tile = floor_tile(TileType::White);
        assert!(!tile.use_bullseye());
        tile.bullseye_count = 1;
        assert!(tile.use_bullseye());
        for u in 1..3 {
            for v in 1..3 {
                tile.set(u, v, TileType::Void);
            }
        }
        assert!(!tile.use_bullseye());
    }

    #[test]
    fn test_uv_offset_and_front() {
        let tile = TileDef::new(DVec3::new(64.0, 64.0, 64.0), FaceDirection::NegY, TileType::Black);
        assert_eq!(tile.front_pos(), DVec3::new(64.0, 0.0, 64.0));
        assert_eq!(tile.uv_offset(16.0, -48.0, 64.0), DVec3::new(80.0, 0.0, 16.0));
    }

    #[test]
    fn test_resolve_cells_first_panel_wins() {
        let mut tile = floor_tile(TileType::White);
        let mut sealed = Panel::new([(0, 0), (0, 1)]);
        sealed.seal = true;
        tile.attach_panel(sealed);
        tile.attach_panel(Panel::new([(0, 1), (3, 3)]));

        let (cells, panels) = tile.resolve_cells();
        assert_eq!(cells[cell_index(0, 0)], TileType::Nodraw);
        assert_eq!(cells[cell_index(0, 1)], TileType::Nodraw);
        assert_eq!(cells[cell_index(3, 3)], TileType::Void);
        assert_eq!(cells[cell_index(2, 2)], TileType::White);
        assert_eq!(panels[0][cell_index(0, 1)], TileType::White);
        assert_eq!(panels[1][cell_index(0, 1)], TileType::Void, "already claimed");
        assert_eq!(panels[1][cell_index(3, 3)], TileType::White);
    }

    #[test]
    fn test_uniform_black_is_one_brush() {
        let texturing = texturing_with("normal.black.floor", "M");
        let template = TileTemplate::standard();
        let mut doc = LevelDoc::new();
        let mut ctx = EmitContext {
            doc: &mut doc,
            texturing: &texturing,
            template: &template,
        };
        let mut tile = floor_tile(TileType::Black);
        tile.export(&mut ctx, &BevelPoints::new()).unwrap();

        assert_eq!(doc.brushes.len(), 1);
        let brush = &doc.brushes[0];
        assert_eq!(brush.faces.len(), 6);
        assert_eq!(brush.faces[0].material, "M");
        assert_eq!(brush.faces[0].point, DVec3::new(64.0, 64.0, 128.0));
        assert_eq!(tile.brush_faces, vec![brush.faces[0].id]);
    }

    #[test]
    fn test_void_cells_bevel_their_neighbours() {
        let texturing = texturing_with("normal.black.floor", "M");
        let template = TileTemplate::standard();
        let mut doc = LevelDoc::new();
        let mut ctx = EmitContext {
            doc: &mut doc,
            texturing: &texturing,
            template: &template,
        };
        let mut tile = floor_tile(TileType::Black);
        for v in 0..4 {
            tile.set(0, v, TileType::Void);
        }
        let cells = tile.cells();
        let brushes = tile
            .gen_multitile_pattern(&mut ctx, &cells, &BevelPoints::new(), MultitileOpts::new(tile.normal))
            .unwrap();
        assert!(!brushes.is_empty());
        let edge_normals: BTreeSet<_> = brushes
            .iter()
            .flat_map(|b| b.faces.iter())
            .filter(|f| f.normal.x < -0.1 && f.normal.z < -0.1)
            .map(|f| f.id)
            .collect();
        assert!(!edge_normals.is_empty(), "the edge facing the void is bevelled");
    }

    #[test]
    fn test_all_void_emits_nothing() {
        let texturing = texturing_with("normal.black.floor", "M");
        let template = TileTemplate::standard();
        let mut doc = LevelDoc::new();
        let mut ctx = EmitContext {
            doc: &mut doc,
            texturing: &texturing,
            template: &template,
        };
        let mut tile = floor_tile(TileType::Void);
        tile.add_portal_helper(Some(DVec3::X)).unwrap();
        tile.export(&mut ctx, &BevelPoints::new()).unwrap();
        assert!(doc.brushes.is_empty());
        assert_eq!(doc.entities().count(), 0);
    }

    #[test]
    fn test_split_tile_gets_nodraw_strip() {
        let texturing = texturing_with("normal.white.wall", "W");
        let template = TileTemplate::standard();
        let mut doc = LevelDoc::new();
        let mut ctx = EmitContext {
            doc: &mut doc,
            texturing: &texturing,
            template: &template,
        };
        let mut tile = TileDef::new(DVec3::splat(64.0), FaceDirection::PosX, TileType::White);
        tile.set_centre_split(Some(SplitAxis::U));
        tile.export(&mut ctx, &BevelPoints::new()).unwrap();
        assert!(doc.brushes.iter().any(|b| b.faces[0].material == NODRAW));
        assert!(doc.brushes.iter().any(|b| b.faces[0].material == "W"));
    }

    #[test]
    fn test_bullseye_overlay_binds_front_faces() {
        let texturing = texturing_with("normal.white.floor", "W");
        let template = TileTemplate::standard();
        let mut doc = LevelDoc::new();
        let mut ctx = EmitContext {
            doc: &mut doc,
            texturing: &texturing,
            template: &template,
        };
        let mut tile = floor_tile(TileType::White);
        tile.bullseye_count = 1;
        tile.add_portal_helper(None).unwrap();
        tile.export(&mut ctx, &BevelPoints::new()).unwrap();

        let overlay = doc.entities_by_class("info_overlay").next().unwrap();
        let expected = crate::overlay::format_sides(&tile.brush_faces);
        assert_eq!(overlay.get("sides"), Some(expected.as_str()));
        assert_eq!(doc.entities_by_class("info_placement_helper").count(), 1);
    }

    #[test]
    fn test_cells_from_rows_orientation() {
        let cells = cells_from_rows(["B...", "....", "....", "...W"]).unwrap();
        let mut tile = floor_tile(TileType::Void);
        for (i, ty) in cells.iter().enumerate() {
            tile.set(i / GRID, i % GRID, *ty);
        }
        assert_eq!(tile.get(0, 3), TileType::Black);
        assert_eq!(tile.get(3, 0), TileType::White);
    }
}
