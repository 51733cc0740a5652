//! Texture generators: pick a material for a slot at a world position.
//!
//! Every choice is derived from the [`MapSeed`], so recompiling an unchanged
//! level gives the same materials. Random generators choose independently
//! per position. Clump generators first partition the registered tile
//! positions into boxes, then let every position in a box share its choice.

use std::collections::BTreeMap;

use glam::{DVec3, IVec3};
use rand::Rng;
use rand::seq::IndexedRandom;
use tessera_brush::world_to_grid;
use tessera_config::{Algorithm, GenOptions};
use tracing::{debug, info};

use crate::error::TextureError;
use crate::kinds::{GenCat, MaterialConf, Orient, Portalable, TileSize};
use crate::seed::MapSeed;

/// An inclusive voxel box whose positions share texture choices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clump {
    pub min: IVec3,
    pub max: IVec3,
    /// Seed folded into every choice made inside the box.
    pub seed: u64,
}

impl Clump {
    pub fn contains(&self, grid: IVec3) -> bool {
        self.min.cmple(grid).all() && grid.cmple(self.max).all()
    }
}

/// Chooses materials for one category, orientation and color.
#[derive(Clone, Debug)]
pub struct Generator {
    name: String,
    category: GenCat,
    orient: Option<Orient>,
    portal: Option<Portalable>,
    options: GenOptions,
    weights: BTreeMap<String, u32>,
    textures: BTreeMap<String, Vec<MaterialConf>>,
    bottom_trim: Vec<TileSize>,
    seed: MapSeed,
    clumps: Vec<Clump>,
}

impl Generator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        category: GenCat,
        orient: Option<Orient>,
        portal: Option<Portalable>,
        options: GenOptions,
        weights: BTreeMap<String, u32>,
        textures: BTreeMap<String, Vec<MaterialConf>>,
        bottom_trim: Vec<TileSize>,
        seed: MapSeed,
    ) -> Self {
        let name = match (orient, portal) {
            (Some(orient), Some(portal)) => format!("{category}.{portal}.{orient}"),
            _ => category.to_string(),
        };
        Self {
            name,
            category,
            orient,
            portal,
            options,
            weights,
            textures,
            bottom_trim,
            seed,
            clumps: Vec::new(),
        }
    }

    /// Config key of this generator, e.g. `normal.white.wall`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> GenCat {
        self.category
    }

    pub fn orient(&self) -> Option<Orient> {
        self.orient
    }

    pub fn portal(&self) -> Option<Portalable> {
        self.portal
    }

    /// Options in effect, with per-generator overrides applied.
    /// Seed this generator draws its randomness from.
    pub fn seed(&self) -> &MapSeed {
        &self.seed
    }

    pub fn options(&self) -> &GenOptions {
        &self.options
    }

    pub fn algorithm(&self) -> Algorithm {
        self.options.algorithm
    }

    /// Tile sizes forced along the bottom of walls.
    pub fn bottom_trim(&self) -> &[TileSize] {
        &self.bottom_trim
    }

    /// Relative weight of a size slot. Unknown slots weigh 0.
    pub fn weight(&self, slot: &str) -> u32 {
        self.weights.get(slot).copied().unwrap_or(0)
    }

    /// Every slot name, including empty ones.
    pub fn slots(&self) -> impl Iterator<Item = &str> + '_ {
        self.textures.keys().map(String::as_str)
    }

    /// Whether `slot` is defined and has candidates.
    pub fn contains(&self, slot: &str) -> bool {
        self.textures.get(slot).is_some_and(|mats| !mats.is_empty())
    }

    /// Every candidate for `slot`.
    pub fn get_all(&self, slot: &str) -> Result<&[MaterialConf], TextureError> {
        self.textures
            .get(slot)
            .map(Vec::as_slice)
            .ok_or_else(|| TextureError::UnknownSlot {
                slot: slot.to_string(),
                allowed: self.textures.keys().cloned().collect(),
            })
    }

    /// Every candidate of every slot.
    pub fn all_materials(&self) -> impl Iterator<Item = (&str, &MaterialConf)> + '_ {
        self.textures
            .iter()
            .flat_map(|(slot, mats)| mats.iter().map(move |mat| (slot.as_str(), mat)))
    }

    /// Picks the material for `slot` at `loc`.
    ///
    /// `loc` should sit just behind the surface, inside the voxel that owns
    /// it. The same inputs always give the same answer.
    pub fn get(&self, loc: DVec3, slot: &str) -> Result<&MaterialConf, TextureError> {
        let candidates = self.get_all(slot)?;
        let chosen = match self.options.algorithm {
            Algorithm::Rand => {
                let mut rng = self.seed.rng(b"tex_rand", &[loc.into()]);
                candidates.choose(&mut rng)
            }
            Algorithm::Clump => self.choose_clumped(loc, slot, candidates),
        };
        chosen.ok_or_else(|| TextureError::EmptySlot {
            slot: slot.to_string(),
        })
    }

    /// Like [`Generator::get`], converting to the antigel variant if asked.
    pub fn get_antigel(&self, loc: DVec3, slot: &str, antigel: bool) -> Result<MaterialConf, TextureError> {
        let mat = self.get(loc, slot)?;
        Ok(if antigel { mat.as_antigel() } else { mat.clone() })
    }

    fn choose_clumped<'a>(&'a self, loc: DVec3, slot: &str, candidates: &'a [MaterialConf]) -> Option<&'a MaterialConf> {
        let grid = world_to_grid(loc);
        match self.clumps.iter().find(|clump| clump.contains(grid)) {
            Some(clump) => {
                let mut rng = self
                    .seed
                    .rng(b"tex_clump_side", &[self.name.as_str().into(), slot.into(), clump.seed.into()]);
                candidates.choose(&mut rng)
            }
            None => {
                let mut rng = self.seed.rng(b"tex_clump_side", &[loc.into()]);
                let gap = self.textures.get(TileSize::Gap.as_str()).filter(|mats| !mats.is_empty());
                match gap {
                    Some(gap) if slot != TileSize::Goo.as_str() => gap.choose(&mut rng),
                    _ => candidates.choose(&mut rng),
                }
            }
        }
    }

    /// Every recorded clump, in creation order.
    pub fn clumps(&self) -> &[Clump] {
        &self.clumps
    }

    /// Partitions the tiles facing this generator's orientation into clumps.
    ///
    /// `tiles` holds `(voxel position, normal)` pairs. Random generators
    /// ignore this. Calling it again rebuilds the clumps from scratch.
    pub fn setup(&mut self, tiles: &[(IVec3, DVec3)]) {
        if self.options.algorithm != Algorithm::Clump {
            return;
        }
        let Some(orient) = self.orient else {
            return;
        };

        let mut remaining: Vec<IVec3> = tiles
            .iter()
            .filter(|(_, normal)| Orient::from_normal(*normal) == orient)
            .map(|(pos, _)| *pos)
            .collect();
        remaining.sort_unstable_by_key(|p| (p.x, p.y, p.z));
        remaining.dedup();

        let length = self.options.clump_length as i32;
        let width = self.options.clump_width as i32;
        let mut rng = self.seed.rng(b"clump_pos", &[self.name.as_str().into()]);
        self.clumps.clear();

        while !remaining.is_empty() {
            let pos = remaining.swap_remove(rng.random_range(0..remaining.len()));
            let direction = rng.random_range(0..3);
            let mut min = pos;
            let mut max = pos;
            for axis in 0..3 {
                let dist = if axis == direction { length } else { width };
                min[axis] -= rng.random_range(0..=dist);
                max[axis] += rng.random_range(0..=dist);
            }
            let clump = Clump {
                min,
                max,
                seed: rng.random(),
            };
            remaining.retain(|p| !clump.contains(*p));
            if self.options.clump_debug {
                info!(generator = %self.name, min = ?clump.min, max = ?clump.max, "clump");
            }
            self.clumps.push(clump);
        }
        debug!(generator = %self.name, clumps = self.clumps.len(), "clump setup done");
    }
}
