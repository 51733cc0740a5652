//! The full set of generators for one compile.

use std::collections::{BTreeMap, BTreeSet};

use glam::{DVec3, IVec3};
use tessera_config::{Algorithm, GeneratorConfig, MaterialEntry, TexturingConfig, default_weights};
use tracing::warn;

use crate::defaults::{NO_ANTIGEL_SLOTS, OVERLAY_DEFAULTS, SPECIAL_DEFAULTS, TILE_INHERIT, tile_defaults};
use crate::error::TextureError;
use crate::generator::Generator;
use crate::kinds::{GenCat, MaterialConf, Orient, Portalable, QuarterRot, TileSize};
use crate::seed::MapSeed;

type GenKey = (GenCat, Orient, Portalable);

fn tile_index(cat: usize, orient: Orient, portal: Portalable) -> usize {
    cat * 6 + orient.index() * 2 + portal.index()
}

fn tile_keys() -> impl Iterator<Item = GenKey> {
    GenCat::TILES.into_iter().flat_map(|cat| {
        Orient::ALL
            .into_iter()
            .flat_map(move |orient| Portalable::ALL.into_iter().map(move |portal| (cat, orient, portal)))
    })
}

fn gen_name((cat, orient, portal): GenKey) -> String {
    format!("{cat}.{portal}.{orient}")
}

/// Parses a `"<category>.<portalable>.<orient>"` generator key.
fn parse_gen_key(key: &str) -> Option<GenKey> {
    let mut parts = key.split('.');
    let cat = GenCat::from_name(parts.next()?)?;
    let portal = Portalable::from_name(parts.next()?)?;
    let orient = Orient::from_name(parts.next()?)?;
    if parts.next().is_some() || !cat.is_tile() {
        return None;
    }
    Some((cat, orient, portal))
}

fn parse_bottom_trim(pattern: &str, generator: &str) -> Result<Vec<TileSize>, TextureError> {
    pattern
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '1' => Ok(TileSize::Tile1x1),
            '2' => Ok(TileSize::Tile2x2),
            '4' => Ok(TileSize::Tile4x4),
            _ => Err(TextureError::InvalidBottomTrim {
                generator: generator.to_string(),
                pattern: pattern.to_string(),
            }),
        })
        .collect()
}

fn convert(entries: &[MaterialEntry], size: TileSize) -> Vec<MaterialConf> {
    entries.iter().map(|entry| MaterialConf::from_entry(entry, size)).collect()
}

/// Reads the tile textures of one generator, before cross-generator fixups.
fn tile_textures(key: GenKey, conf: &GeneratorConfig, mix_rotation: bool) -> BTreeMap<TileSize, Vec<MaterialConf>> {
    let mut textures: BTreeMap<TileSize, Vec<MaterialConf>> =
        TileSize::ALL.into_iter().map(|size| (size, Vec::new())).collect();

    if let Some(all) = &conf.all {
        textures.insert(TileSize::Tile4x4, vec![MaterialConf::new(all.clone(), TileSize::Tile4x4)]);
    } else {
        for (slot, entries) in &conf.textures {
            match TileSize::from_name(slot) {
                Some(size) => textures.insert(size, convert(entries, size)),
                None => {
                    warn!(generator = %gen_name(key), %slot, "unknown texture name");
                    continue;
                }
            };
        }
    }

    if mix_rotation {
        let originals = textures.clone();
        for (start, mats) in originals {
            for rot in QuarterRot::ALL {
                let size = if rot.flips_uv() { start.rotated() } else { start };
                if let Some(list) = textures.get_mut(&size) {
                    list.extend(mats.iter().map(|mat| mat.rotated_by(rot)));
                }
            }
        }
    }

    if textures.values().all(Vec::is_empty) {
        let (cat, orient, portal) = key;
        for &(size, mat) in tile_defaults(cat, orient, portal) {
            textures.insert(size, vec![MaterialConf::new(mat, size)]);
        }
    }
    textures
}

/// Builds a special/overlay table: configured slots, else the stock default.
fn named_textures(
    cat: GenCat,
    defaults: &[(&str, &str)],
    configured: &BTreeMap<String, Vec<MaterialEntry>>,
) -> BTreeMap<String, Vec<MaterialConf>> {
    for slot in configured.keys() {
        if !defaults.iter().any(|(name, _)| name.eq_ignore_ascii_case(slot)) {
            warn!(generator = %cat, %slot, "unknown texture name");
        }
    }
    defaults
        .iter()
        .map(|&(slot, default)| {
            let mut mats = configured
                .get(slot)
                .map(|entries| convert(entries, TileSize::Tile4x4))
                .unwrap_or_default();
            if mats.is_empty() && !default.is_empty() {
                mats.push(MaterialConf::new(default, TileSize::Tile4x4));
            }
            (slot.to_string(), mats)
        })
        .collect()
}

/// Every generator of a compile, built once from the config.
#[derive(Clone, Debug)]
pub struct Texturing {
    tiles: Vec<Generator>,
    special: Generator,
    overlays: Generator,
}

impl Texturing {
    /// Builds and validates every generator.
    ///
    /// Fails if a tile generator ends up without 4x4 materials, or its bottom
    /// trim pattern is malformed.
    pub fn from_config(config: &TexturingConfig, seed: MapSeed) -> Result<Self, TextureError> {
        let mut configured: BTreeMap<GenKey, &GeneratorConfig> = BTreeMap::new();
        for (key, conf) in &config.generators {
            match parse_gen_key(key) {
                Some(gen_key) => {
                    configured.insert(gen_key, conf);
                }
                None => warn!(key = %key, "could not parse texture generator type"),
            }
        }

        let empty = GeneratorConfig::default();
        let mut options = BTreeMap::new();
        let mut all_textures = BTreeMap::new();
        for key in tile_keys() {
            let conf = configured.get(&key).copied().unwrap_or(&empty);
            let mut opts = config.options.merged(&conf.options);
            if conf.all.is_some() {
                opts.algorithm = Algorithm::Rand;
            }
            let mix_rotation = opts.mix_rotation.unwrap_or(key.1 == Orient::Ceiling);
            all_textures.insert(key, tile_textures(key, conf, mix_rotation));
            options.insert(key, opts);
        }

        let mut tiles = Vec::with_capacity(18);
        for key in tile_keys() {
            let (cat, orient, portal) = key;
            let name = gen_name(key);
            let mut textures = all_textures.get(&key).cloned().unwrap_or_default();

            if cat != GenCat::Normal && textures.values().all(Vec::is_empty) {
                textures = all_textures
                    .get(&(GenCat::Normal, orient, portal))
                    .cloned()
                    .unwrap_or_default();
            }
            let opts = options.remove(&key).unwrap_or_else(|| config.options.clone());

            if textures.get(&TileSize::Tile4x4).is_none_or(Vec::is_empty) {
                return Err(TextureError::MissingSlot {
                    generator: name,
                    slot: TileSize::Tile4x4.to_string(),
                });
            }

            if opts.mix_tiles {
                let mut mixed = Vec::new();
                for size in [TileSize::Tile4x4, TileSize::Tile2x2, TileSize::Tile2x1] {
                    mixed.extend(textures.get(&size).into_iter().flatten().cloned());
                }
                textures.entry(TileSize::Tile1x1).or_default().extend(mixed);
            }

            for (from, to) in TILE_INHERIT {
                if textures.get(&to).is_none_or(Vec::is_empty) {
                    let inherited = textures.get(&from).cloned().unwrap_or_default();
                    textures.insert(to, inherited);
                }
            }

            let mut weights = default_weights();
            if let Some(conf) = configured.get(&key) {
                for (slot, weight) in &conf.weights {
                    if TileSize::from_name(slot).is_some() {
                        weights.insert(slot.to_ascii_lowercase(), *weight);
                    } else {
                        warn!(generator = %name, %slot, "unknown tile size");
                    }
                }
            }

            let bottom_trim = parse_bottom_trim(&opts.bottom_trim, &name)?;
            let textures = textures
                .into_iter()
                .map(|(size, mats)| (size.to_string(), mats))
                .collect();
            tiles.push(Generator::new(
                cat,
                Some(orient),
                Some(portal),
                opts,
                weights,
                textures,
                bottom_trim,
                seed.clone(),
            ));
        }

        // Non-tile generators always pick independently.
        let mut plain_options = config.options.clone();
        plain_options.algorithm = Algorithm::Rand;
        let special = Generator::new(
            GenCat::Special,
            None,
            None,
            plain_options.clone(),
            BTreeMap::new(),
            named_textures(GenCat::Special, SPECIAL_DEFAULTS, &config.special),
            Vec::new(),
            seed.clone(),
        );
        let overlays = Generator::new(
            GenCat::Overlay,
            None,
            None,
            plain_options,
            BTreeMap::new(),
            named_textures(GenCat::Overlay, OVERLAY_DEFAULTS, &config.overlays),
            Vec::new(),
            seed,
        );

        Ok(Self {
            tiles,
            special,
            overlays,
        })
    }

    /// The generator for a category. Special and overlay generators ignore
    /// `orient` and `portal`.
    pub fn generator(&self, cat: GenCat, orient: Orient, portal: Portalable) -> &Generator {
        match cat.tile_index() {
            Some(index) => &self.tiles[tile_index(index, orient, portal)],
            None if cat == GenCat::Special => &self.special,
            None => &self.overlays,
        }
    }

    /// The generator for a surface facing `normal`.
    pub fn generator_for(&self, cat: GenCat, normal: DVec3, portal: Portalable) -> &Generator {
        self.generator(cat, Orient::from_normal(normal), portal)
    }

    pub fn special(&self) -> &Generator {
        &self.special
    }

    pub fn overlays(&self) -> &Generator {
        &self.overlays
    }

    /// Picks a tile material, handling antigel.
    ///
    /// Bullseye generators without `antigel_bullseye` fall back to the normal
    /// generator on antigel surfaces.
    pub fn tile_material(
        &self,
        cat: GenCat,
        normal: DVec3,
        portal: Portalable,
        loc: DVec3,
        slot: &str,
        antigel: bool,
    ) -> Result<MaterialConf, TextureError> {
        let mut generator = self.generator_for(cat, normal, portal);
        if antigel && cat == GenCat::Bullseye && !generator.options().antigel_bullseye {
            generator = self.generator_for(GenCat::Normal, normal, portal);
        }
        generator.get_antigel(loc, slot, antigel)
    }

    /// Runs clump setup on every tile generator.
    ///
    /// `tiles` holds the voxel position and normal of every tile face.
    pub fn setup(&mut self, tiles: &[(IVec3, DVec3)]) {
        for generator in &mut self.tiles {
            generator.setup(tiles);
        }
    }

    /// Every material that needs an antigel variant generated.
    pub fn antigel_materials(&self) -> BTreeSet<String> {
        self.tiles
            .iter()
            .chain(std::iter::once(&self.special))
            .filter(|g| g.category() != GenCat::Bullseye || g.options().antigel_bullseye)
            .flat_map(Generator::all_materials)
            .filter(|(slot, _)| !NO_ANTIGEL_SLOTS.contains(slot))
            .map(|(_, mat)| mat.mat.clone())
            .collect()
    }
}
