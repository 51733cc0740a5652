//! Item-driven slabs that replace part of a tile.

use glam::{DQuat, DVec3};
use tessera_brush::{LevelDoc, Solid, UvAxis};
use tessera_plane::FaceDirection;
use tracing::{debug, warn};

use crate::bevel::BevelPoints;
use crate::error::TilingError;
use crate::overlay::{make_overlay, make_portal_helper};
use crate::pattern::{Cells, GRID, cell_index};
use crate::template::make_nodraw;
use crate::tile_type::{PanelType, TileType};
use crate::tiledef::{EmitContext, MultitileOpts, TileDef};

/// Brush entities of this class stay static and keep overlays attached.
const STATIC_CLASS: &str = "func_detail";

/// A movable or offset slab generated for some of a tile's cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    /// Brush entity receiving the geometry, or the world when `None`.
    pub brush_ent: Option<tessera_brush::EntityId>,
    pub panel_type: PanelType,
    pub thickness: u32,
    reserved: [bool; GRID * GRID],
    /// Leave nodraw on the tile behind the panel.
    pub seal: bool,
    /// Make every face except the front nodraw.
    pub nodraw: bool,
    /// Moves all generated geometry.
    pub offset: DVec3,
    /// Axis a flip panel turns around. Defaults to the tile's V axis.
    pub flip_axis: Option<DVec3>,
    /// Direction from the hinge of an angled panel to its free end.
    pub forward: Option<DVec3>,
    /// Flip panels start showing their front.
    pub start_deployed: bool,
    /// Ring and interior cells next to panel edges that need bevelling.
    /// The surrounding tile's bevels don't apply to panels.
    pub bevels: BevelPoints,
    /// Additional brushes moved along with the panel, angled with it too.
    pub extra: Vec<Solid>,
}

impl Panel {
    /// A plain 4 unit panel over the given `(u, v)` cells. Cells outside the
    /// grid are ignored.
    pub fn new(cells: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut reserved = [false; GRID * GRID];
        for (u, v) in cells {
            if u < GRID && v < GRID {
                reserved[cell_index(u, v)] = true;
            } else {
                warn!(u, v, "panel cell outside the tile");
            }
        }
        Self {
            brush_ent: None,
            panel_type: PanelType::Normal,
            thickness: 4,
            reserved,
            seal: false,
            nodraw: false,
            offset: DVec3::ZERO,
            flip_axis: None,
            forward: None,
            start_deployed: true,
            bevels: BevelPoints::new(),
            extra: Vec::new(),
        }
    }

    /// Reserved cells, U-major.
    pub fn reserved(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..GRID * GRID)
            .filter(|&i| self.reserved[i])
            .map(|i| (i / GRID, i % GRID))
    }

    /// Hinge-to-tip direction, falling back to +X on floors and ceilings and
    /// +Z on walls when unset or not flat.
    pub fn forward_dir(&self, normal: FaceDirection) -> DVec3 {
        match self.forward {
            Some(fwd) if fwd.length_squared() > 1e-6 && fwd.normalize().dot(normal.vec()).abs() < 1e-3 => fwd.normalize(),
            _ if normal.is_wall() => DVec3::Z,
            _ => DVec3::X,
        }
    }

    /// Static panels are merged into the surrounding geometry.
    pub fn is_static(&self, doc: &LevelDoc) -> bool {
        match self.brush_ent {
            None => true,
            Some(id) => doc.entity(id).is_none_or(|ent| ent.classname == STATIC_CLASS),
        }
    }

    /// Name of the moving entity that things on this panel should follow.
    pub fn parent_name(&self, doc: &LevelDoc) -> Option<String> {
        let ent = doc.entity(self.brush_ent?)?;
        if ent.classname == STATIC_CLASS {
            return None;
        }
        ent.get("targetname").map(str::to_string)
    }

    /// Centre of the panel's deployed surface.
    pub fn bullseye_position(&self, tile: &TileDef) -> DVec3 {
        match self.panel_type.angle() {
            Some(angle) => {
                let forward = self.forward_dir(tile.normal);
                let hinge = tile.front_pos() - forward * 64.0;
                let (sin, cos) = f64::from(angle).to_radians().sin_cos();
                hinge + (forward * cos + tile.normal.vec() * sin) * 64.0 + self.offset
            }
            None => tile.front_pos() + self.offset,
        }
    }

    /// Mirrors a flipped grid (and its bevel cells) across the flip axis.
    fn mirror(&self, tile: &TileDef, cells: &Cells, bevels: &BevelPoints) -> (Cells, BevelPoints) {
        let (u_dir, v_dir) = tile.uv_dirs();
        let axis = self.flip_axis.unwrap_or(v_dir);
        let flip: fn(i32, i32) -> (i32, i32) = if axis.dot(v_dir).abs() > 0.99 {
            |u, v| (3 - u, v)
        } else if axis.dot(u_dir).abs() > 0.99 {
            |u, v| (u, 3 - v)
        } else {
            warn!(?axis, normal = ?tile.normal, "flip panel axis is not along the tile");
            |u, v| (u, v)
        };

        let mut mirrored = [TileType::Void; GRID * GRID];
        for u in 0..GRID {
            for v in 0..GRID {
                let (mu, mv) = flip(u as i32, v as i32);
                mirrored[cell_index(mu as usize, mv as usize)] = cells[cell_index(u, v)];
            }
        }
        let bevels = bevels.iter().map(|&(u, v)| flip(u, v)).collect();
        (mirrored, bevels)
    }

    /// Emits this panel's brushes and markers.
    ///
    /// `cells` holds only the cells this panel owns; the rest are void.
    pub fn export(&self, ctx: &mut EmitContext<'_>, tile: &mut TileDef, cells: &Cells) -> Result<(), TilingError> {
        if cells.iter().all(|&cell| cell == TileType::Void) {
            if let Some(ent) = self.brush_ent {
                debug!(?ent, "removing empty panel entity");
                ctx.doc.remove_entity(ent);
            }
            return Ok(());
        }

        let is_static = self.is_static(ctx.doc);
        let (has_helper, force_helper) = tile.helper_state();
        let use_bullseye = tile.use_bullseye();
        let normal = tile.normal.vec();
        let forward = self.forward_dir(tile.normal);
        let left = normal.cross(forward);
        let front_pos = tile.front_pos();

        let mut opts = MultitileOpts::new(tile.normal);
        opts.thickness = self.thickness;
        opts.is_panel = true;
        opts.add_bullseye = use_bullseye;
        opts.interior_bevel = false;
        let bevels = &self.bevels;

        let mut brushes;
        let front_count;
        if self.panel_type.is_flip() {
            let back: Cells = std::array::from_fn(|i| {
                let ty = cells[i];
                if self.panel_type == PanelType::FlipInvert || ty.is_white() {
                    ty.inverted()
                } else {
                    ty
                }
            });
            let (front_cells, back_cells) = if self.start_deployed { (*cells, back) } else { (back, *cells) };
            brushes = tile.gen_multitile_pattern(ctx, &front_cells, bevels, opts)?;
            front_count = brushes.len();

            let (mirrored, mirrored_bevels) = self.mirror(tile, &back_cells, bevels);
            let mut back_opts = opts;
            back_opts.normal = tile.normal.opposite();
            back_opts.offset = 64.0 - 2.0 * f64::from(self.thickness);
            back_opts.add_bullseye = false;
            brushes.extend(tile.gen_multitile_pattern(ctx, &mirrored, &mirrored_bevels, back_opts)?);

            // Pull the outer sides in so the halves can turn.
            let (u_dir, v_dir) = tile.uv_dirs();
            for brush in &mut brushes {
                for face in brush.faces.iter_mut().skip(2) {
                    for axis in [u_dir, v_dir] {
                        let dist = (face.point - front_pos).dot(axis);
                        if (dist.abs() - 64.0).abs() < 1e-3 {
                            face.translate(-axis * dist.signum() * 2.0);
                            face.v_axis.offset = 0.0;
                        }
                    }
                }
            }
        } else {
            brushes = tile.gen_multitile_pattern(ctx, cells, bevels, opts)?;
            front_count = brushes.len();
        }
        brushes.extend(self.extra.iter().cloned());

        if self.nodraw {
            for brush in &mut brushes[..front_count] {
                for face in brush.faces.iter_mut().skip(1) {
                    make_nodraw(face);
                }
            }
        }

        let front_ids: Vec<_> = brushes[..front_count].iter().map(|brush| brush.faces[0].id).collect();
        let overlay_mat = if use_bullseye {
            Some(ctx.texturing.overlays().get(front_pos, "bullseye")?.mat.clone())
        } else {
            None
        };

        if let Some(angle) = self.panel_type.angle() {
            let rotation = DQuat::from_axis_angle(-left, f64::from(angle).to_radians());
            let hinge = front_pos - forward * 64.0;
            for brush in &mut brushes {
                let clip = brush
                    .faces
                    .iter()
                    .position(|face| face.normal.dot(-forward) > 0.99 && face.contains_point(hinge));
                brush.rotate_about(hinge, rotation);
                if let Some(i) = clip {
                    let face = &mut brush.faces[i];
                    face.point = hinge;
                    face.normal = -forward;
                    face.u_axis = UvAxis::new(left);
                    face.v_axis = UvAxis::new(normal);
                    make_nodraw(face);
                }
            }

            let top_center = hinge + rotation * (forward * 64.0);
            let angled_normal = rotation * normal;
            if has_helper {
                make_portal_helper(
                    ctx.doc,
                    top_center + self.offset,
                    angled_normal,
                    rotation * tile.portal_helper_orient(),
                    force_helper,
                );
            }
            if let Some(mat) = overlay_mat.filter(|_| is_static) {
                make_overlay(
                    ctx.doc,
                    &mat,
                    top_center + self.offset,
                    angled_normal,
                    left * 64.0,
                    rotation * forward * 64.0,
                    &front_ids,
                );
            }
        } else {
            if let Some(mat) = overlay_mat {
                make_overlay(
                    ctx.doc,
                    &mat,
                    front_pos + self.offset,
                    normal,
                    left * 64.0,
                    forward * 64.0,
                    &front_ids,
                );
            }
            if has_helper || self.panel_type.is_flip() {
                let helper = make_portal_helper(
                    ctx.doc,
                    front_pos + self.offset,
                    normal,
                    tile.portal_helper_orient(),
                    force_helper,
                );
                let target = self
                    .brush_ent
                    .and_then(|id| ctx.doc.entity(id))
                    .and_then(|ent| ent.get("targetname"))
                    .map(str::to_string);
                if let (false, Some(target)) = (is_static, target) {
                    let key = if self.panel_type.is_flip() { "attach_target_name" } else { "parentname" };
                    if let Some(ent) = ctx.doc.entity_mut(helper) {
                        ent.set(key, target);
                    }
                }
            }
        }

        for brush in &mut brushes {
            brush.translate(self.offset);
        }
        match self.brush_ent.and_then(|id| ctx.doc.entity_mut(id)) {
            Some(ent) => ent.solids.extend(brushes),
            None => {
                for brush in brushes {
                    ctx.doc.add_brush(brush);
                }
            }
        }
        if is_static {
            tile.brush_faces.extend(front_ids);
        }
        Ok(())
    }
}
