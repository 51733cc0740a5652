//! Goo pits: the liquid brushes, the triggers that destroy whatever falls
//! in, and tideline overlays on the walls around them.

use std::collections::BTreeMap;

use glam::{DVec3, IVec3};
use rand::Rng;
use tessera_brush::{BlockKind, BlockOracle, EntityId, EntityOutput, LevelDoc, VOXEL_SIZE, format_vec, grid_to_world};
use tessera_plane::{FaceDirection, PlaneGrid, optimise};
use tessera_texturing::{NODRAW, SeedValue, Texturing};
use tracing::{debug, info};

use crate::error::TilingError;
use crate::overlay::make_overlay;
use crate::tile_type::TileType;
use crate::tiling::{TileKey, Tiling};

/// Material of trigger brushes.
pub const TRIGGER: &str = "tools/toolstrigger";

/// Goo surface height above the bottom of the top voxel.
const SURFACE_HEIGHT: f64 = 96.0;
const HURT_HEIGHT: f64 = 77.0;
const DISSOLVE_HEIGHT: f64 = 26.0;
/// Voxels per wall section sharing one tideline overlay.
const TIDELINE_SECTION: i32 = 8;
/// Radiation damage.
const DAMAGE_TYPE: u32 = 1 << 18;

const HORIZONTAL: [FaceDirection; 4] = [
    FaceDirection::NegX,
    FaceDirection::NegY,
    FaceDirection::PosX,
    FaceDirection::PosY,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GooOptions {
    /// Add tideline overlays to walls bordering goo.
    pub tidelines: bool,
    /// Texture scale of the goo surface.
    pub scale: f64,
}

impl Default for GooOptions {
    fn default() -> Self {
        Self {
            tidelines: false,
            scale: 1.0,
        }
    }
}

/// An overlay growing along one wall section.
struct Tideline {
    overlay: EntityId,
    origin: DVec3,
    mid: f64,
    min: f64,
    max: f64,
}

/// Lowest voxel of the goo column topped by `top`.
fn column_bottom(blocks: &dyn BlockOracle, top: IVec3) -> i32 {
    let mut z = top.z;
    loop {
        match blocks.block(IVec3::new(top.x, top.y, z - 1)) {
            BlockKind::GooMid => z -= 1,
            BlockKind::GooBottom => return z - 1,
            _ => return z,
        }
    }
}

impl Tiling {
    /// Turns black cells facing into goo into goo sides. White cells stay,
    /// they can only be there on purpose.
    pub fn apply_goo_sides(&mut self, blocks: &dyn BlockOracle) {
        for (grid, kind) in blocks.occupied() {
            if !kind.is_goo() {
                continue;
            }
            for normal in FaceDirection::ALL {
                let Some(tile) = self.get_mut(grid - normal.ivec(), normal) else {
                    continue;
                };
                let black: Vec<_> = tile
                    .iter()
                    .filter(|&(_, _, ty)| matches!(ty, TileType::Black | TileType::Black4x4))
                    .map(|(u, v, _)| (u, v))
                    .collect();
                for (u, v) in black {
                    tile.set(u, v, TileType::GooSide);
                }
            }
        }
    }

    /// Builds goo brushes, with one trigger killing players and another
    /// dissolving objects.
    ///
    /// Columns sharing the same depth merge into as few brushes as possible.
    /// The surface height with the most goo gets the expensive material.
    pub fn generate_goo(
        &mut self,
        doc: &mut LevelDoc,
        texturing: &Texturing,
        blocks: &dyn BlockOracle,
    ) -> Result<(), TilingError> {
        let mut columns: BTreeMap<(i32, i32), PlaneGrid<bool>> = BTreeMap::new();
        let mut surfaces: BTreeMap<i32, PlaneGrid<bool>> = BTreeMap::new();
        let mut heights: BTreeMap<i32, usize> = BTreeMap::new();
        let mut tidelines: BTreeMap<(i32, i32, i32, FaceDirection), Tideline> = BTreeMap::new();

        for (grid, kind) in blocks.occupied() {
            let bottom = match kind {
                BlockKind::GooSingle => grid.z,
                BlockKind::GooTop => column_bottom(blocks, grid),
                _ => continue,
            };
            columns.entry((bottom, grid.z)).or_default().set(grid.x, grid.y, true);
            surfaces.entry(grid.z).or_default().set(grid.x, grid.y, true);
            *heights.entry(grid.z).or_default() += 1;
            if self.goo.tidelines {
                self.add_tidelines(doc, texturing, &mut tidelines, grid)?;
            }
        }

        for tideline in tidelines.values() {
            finish_tideline(doc, texturing, tideline);
        }

        // Ties go to the higher surface.
        let Some(best) = heights.iter().max_by_key(|&(_, count)| *count).map(|(&z, _)| z) else {
            return Ok(());
        };

        let mut goo_brushes = 0;
        for ((min_z, max_z), grid) in &columns {
            for rect in optimise(grid) {
                let min = DVec3::new(f64::from(rect.min_x), f64::from(rect.min_y), f64::from(*min_z)) * VOXEL_SIZE;
                let max = DVec3::new(f64::from(rect.max_x + 1), f64::from(rect.max_y + 1), f64::from(*max_z))
                    * VOXEL_SIZE
                    + DVec3::Z * SURFACE_HEIGHT;
                let slot = if *max_z == best { "goo" } else { "goo_cheap" };
                let mat = texturing.special().get(max, slot)?;
                let mut prism = doc.make_prism(min, max, NODRAW);
                let top = &mut prism.faces[0];
                top.material = mat.mat.clone();
                top.u_axis.scale = self.goo.scale * mat.scale;
                top.v_axis.scale = self.goo.scale * mat.scale;
                doc.add_brush(prism);
                goo_brushes += 1;
            }
        }

        let mut hurt = Vec::new();
        let mut dissolve = Vec::new();
        for (z, grid) in &surfaces {
            for rect in optimise(grid) {
                let min = DVec3::new(f64::from(rect.min_x), f64::from(rect.min_y), f64::from(*z)) * VOXEL_SIZE;
                let max = DVec3::new(f64::from(rect.max_x + 1), f64::from(rect.max_y + 1), f64::from(*z)) * VOXEL_SIZE;
                hurt.push(doc.make_prism(min, max + DVec3::Z * HURT_HEIGHT, TRIGGER));
                dissolve.push(doc.make_prism(min, max + DVec3::Z * DISSOLVE_HEIGHT, TRIGGER));
            }
        }
        let origin = columns
            .values()
            .find_map(PlaneGrid::mins)
            .map(|(x, y)| grid_to_world(IVec3::new(x, y, best)))
            .unwrap_or_default();

        let phys = doc.create_entity(
            "trigger_multiple",
            [
                // Physics objects only.
                ("spawnflags", "8".to_string()),
                ("wait", "0.1".to_string()),
                ("origin", format_vec(origin)),
            ],
        );
        if let Some(ent) = doc.entity_mut(phys) {
            ent.add_output(EntityOutput::new("OnStartTouch", "!activator", "SilentDissolve"));
            ent.add_output(EntityOutput::new("OnStartTouch", "!activator", "Kill").with_delay(0.1));
            ent.solids = dissolve;
        }
        let player = doc.create_entity(
            "trigger_hurt",
            [
                // Clients only.
                ("spawnflags", "1".to_string()),
                ("damage", "1000".to_string()),
                ("damagecap", "1000".to_string()),
                ("damagetype", DAMAGE_TYPE.to_string()),
                ("origin", format_vec(origin)),
            ],
        );
        if let Some(ent) = doc.entity_mut(player) {
            ent.solids = hurt;
        }

        info!(
            brushes = goo_brushes,
            surfaces = surfaces.len(),
            tidelines = tidelines.len(),
            "generated goo"
        );
        Ok(())
    }

    /// Extends or starts tidelines on the walls around one goo surface voxel.
    fn add_tidelines(
        &mut self,
        doc: &mut LevelDoc,
        texturing: &Texturing,
        tidelines: &mut BTreeMap<(i32, i32, i32, FaceDirection), Tideline>,
        grid: IVec3,
    ) -> Result<(), TilingError> {
        let center = grid_to_world(grid);
        for normal in HORIZONTAL {
            let key = TileKey::new(grid - normal.ivec(), normal);
            if self.get(key.grid, key.normal).is_none() {
                continue;
            }
            let side = normal.vec().cross(DVec3::NEG_Z);
            let off = center.dot(side);
            let section = (
                grid.z,
                grid.x.div_euclid(TIDELINE_SECTION),
                grid.y.div_euclid(TIDELINE_SECTION),
                normal,
            );
            match tidelines.get_mut(&section) {
                Some(tideline) => {
                    tideline.min = tideline.min.min(off);
                    tideline.max = tideline.max.max(off);
                    self.bind_overlay(tideline.overlay, key);
                }
                None => {
                    let origin = center + DVec3::Z * 32.0;
                    let mat = texturing.overlays().get(origin, "tideline")?;
                    let overlay = make_overlay(doc, &mat.mat, origin, normal.vec(), side * 64.0, DVec3::Z * 32.0, &[]);
                    if let Some(ent) = doc.entity_mut(overlay) {
                        ent.set("startv", "1");
                        ent.set("endv", "0");
                    }
                    debug!(?origin, ?normal, "new tideline");
                    self.bind_overlay(overlay, key);
                    tidelines.insert(
                        section,
                        Tideline {
                            overlay,
                            origin,
                            mid: off,
                            min: off,
                            max: off,
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

/// Stretches a tideline over its whole section, with slightly uneven ends.
fn finish_tideline(doc: &mut LevelDoc, texturing: &Texturing, tideline: &Tideline) {
    let tide_min = tideline.min - tideline.mid - 64.0;
    let tide_max = tideline.max - tideline.mid + 64.0;
    let width = (tide_max - tide_min) / 128.0;
    let mut rng = texturing.overlays().seed().rng(
        b"tideline",
        &[
            tideline.origin.into(),
            SeedValue::Int(tide_min as i64),
            SeedValue::Int(tide_max as i64),
        ],
    );
    let Some(ent) = doc.entity_mut(tideline.overlay) else {
        return;
    };
    let (start, end) = if rng.random_bool(0.5) { (0.0, width) } else { (width, 0.0) };
    ent.set("startu", start.to_string());
    ent.set("endu", end.to_string());
    ent.set("uv0", format!("{tide_min} {} 0", rng.random_range(-36..=-28)));
    ent.set("uv1", format!("{tide_min} {} 0", rng.random_range(28..=32)));
    ent.set("uv2", format!("{tide_max} {} 0", rng.random_range(28..=32)));
    ent.set("uv3", format!("{tide_max} {} 0", rng.random_range(-36..=-28)));
}
