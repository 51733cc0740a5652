//! Configuration structs with stock defaults and RON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used by [`TexturingConfig::load_or_create`] and [`TexturingConfig::save`].
pub const CONFIG_FILE: &str = "texturing.ron";

/// Top-level texturing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TexturingConfig {
    /// Options shared by every generator unless overridden.
    pub options: GenOptions,
    /// Tile generators keyed `"<category>.<portalable>.<orient>"`,
    /// e.g. `"normal.white.wall"`.
    pub generators: BTreeMap<String, GeneratorConfig>,
    /// Miscellaneous materials (`behind`, `edge`, `goo`, ...).
    pub special: BTreeMap<String, Vec<MaterialEntry>>,
    /// Overlay materials (`bullseye`, `tideline`, signage shapes).
    pub overlays: BTreeMap<String, Vec<MaterialEntry>>,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Algorithm a tile generator uses to pick among candidates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Algorithm {
    /// Independent choice per position.
    #[default]
    Rand,
    /// Positions are grouped into clumps sharing a choice.
    Clump,
}

/// Tuning options for a tile generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenOptions {
    /// Also use the larger tile materials for 1x1 tiles.
    pub mix_tiles: bool,
    /// Use `double` materials at twice the scale.
    pub scale_up_256: bool,
    /// Add rotated copies of every material. Unset means "on for ceilings".
    pub mix_rotation: Option<bool>,
    /// Allow bullseye decoration on antigel surfaces.
    pub antigel_bullseye: bool,
    /// Selection algorithm.
    pub algorithm: Algorithm,
    /// Tile sizes forced along the bottom of walls, as `1`/`2`/`4` digits.
    pub bottom_trim: String,
    /// Maximum clump extent along its long axis, in voxels.
    pub clump_length: u32,
    /// Maximum clump extent along its other axes, in voxels.
    pub clump_width: u32,
    /// Log every generated clump.
    pub clump_debug: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            mix_tiles: false,
            scale_up_256: false,
            mix_rotation: None,
            antigel_bullseye: false,
            algorithm: Algorithm::Rand,
            bottom_trim: String::new(),
            clump_length: 4,
            clump_width: 2,
            clump_debug: false,
        }
    }
}

/// Per-generator overrides of [`GenOptions`]. Unset fields inherit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptionOverrides {
    pub mix_tiles: Option<bool>,
    pub scale_up_256: Option<bool>,
    pub mix_rotation: Option<bool>,
    pub antigel_bullseye: Option<bool>,
    pub algorithm: Option<Algorithm>,
    pub bottom_trim: Option<String>,
    pub clump_length: Option<u32>,
    pub clump_width: Option<u32>,
    pub clump_debug: Option<bool>,
}

impl GenOptions {
    /// Applies `overrides` on top of these options.
    pub fn merged(&self, overrides: &OptionOverrides) -> GenOptions {
        GenOptions {
            mix_tiles: overrides.mix_tiles.unwrap_or(self.mix_tiles),
            scale_up_256: overrides.scale_up_256.unwrap_or(self.scale_up_256),
            mix_rotation: overrides.mix_rotation.or(self.mix_rotation),
            antigel_bullseye: overrides.antigel_bullseye.unwrap_or(self.antigel_bullseye),
            algorithm: overrides.algorithm.unwrap_or(self.algorithm),
            bottom_trim: overrides
                .bottom_trim
                .clone()
                .unwrap_or_else(|| self.bottom_trim.clone()),
            clump_length: overrides.clump_length.unwrap_or(self.clump_length),
            clump_width: overrides.clump_width.unwrap_or(self.clump_width),
            clump_debug: overrides.clump_debug.unwrap_or(self.clump_debug),
        }
    }
}

/// Configuration of a single tile generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Shorthand: use this one material for every size, with random selection.
    pub all: Option<String>,
    /// Option overrides for this generator.
    pub options: OptionOverrides,
    /// Candidate materials per size slot (`"1x1"`, `"4x4"`, `"double"`, ...).
    pub textures: BTreeMap<String, Vec<MaterialEntry>>,
    /// Selection weight overrides per size slot.
    pub weights: BTreeMap<String, u32>,
}

/// A material, either as a bare name or with extra parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MaterialEntry {
    /// Just the material name, with default scale and rotation.
    Name(String),
    /// A material with explicit parameters.
    Detailed(MaterialSpec),
}

/// Explicit material parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialSpec {
    /// Material path.
    pub material: String,
    /// Texture scale multiplier.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Rotation in degrees, a multiple of 90.
    #[serde(default)]
    pub rotation: u32,
    /// Maximum repeats before a new material must be chosen.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_scale() -> f64 {
    1.0
}

fn default_repeat() -> u32 {
    8
}

impl MaterialEntry {
    /// Returns the material path.
    pub fn material(&self) -> &str {
        match self {
            MaterialEntry::Name(name) => name,
            MaterialEntry::Detailed(spec) => &spec.material,
        }
    }

    /// Normalizes the entry into explicit parameters.
    pub fn to_spec(&self) -> MaterialSpec {
        match self {
            MaterialEntry::Name(name) => MaterialSpec {
                material: name.clone(),
                scale: default_scale(),
                rotation: 0,
                repeat: default_repeat(),
            },
            MaterialEntry::Detailed(spec) => spec.clone(),
        }
    }
}

/// Stock selection weight for each size slot.
pub fn default_weights() -> BTreeMap<String, u32> {
    [
        ("double", 60),
        ("1x1", 40),
        ("2x1", 25),
        ("1x2", 25),
        ("2x2", 4),
        ("4x1", 3),
        ("1x4", 3),
        ("4x4", 1),
        ("goo", 1),
        ("gap", 1),
    ]
    .into_iter()
    .map(|(slot, weight)| (slot.to_string(), weight))
    .collect()
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save ---

impl TexturingConfig {
    /// Parses a config from RON text.
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(ConfigError::ParseError)
    }

    /// Loads the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&contents)?;
        log::info!("Loaded texturing config from {}", path.display());
        Ok(config)
    }

    /// Loads `texturing.ron` from the given directory, or writes a default one.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let config = TexturingConfig::default();
            config.save(config_dir)?;
            log::info!("Created default texturing config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Saves the config to the given directory as `texturing.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::WriteError {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Options for the named generator, with its overrides applied.
    pub fn options_for(&self, generator: &str) -> GenOptions {
        match self.generators.get(generator) {
            Some(conf) => self.options.merged(&conf.options),
            None => self.options.clone(),
        }
    }
}
