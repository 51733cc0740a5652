//! Reproducible randomness derived from the level layout.
//!
//! A [`MapSeed`] is a SHA-256 state fed once with the packed layout of the
//! level. Each query clones that state, folds in a tag plus its own
//! arguments, and turns the digest into a fresh [`ChaCha8Rng`]. No stream is
//! shared between queries, so results never depend on call order.

use std::fmt;

use glam::{DVec3, IVec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// One argument folded into a derived seed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeedValue<'a> {
    /// UTF-8 text.
    Str(&'a str),
    /// A position, rounded to 6 decimals and packed as three `f32`.
    Vec(DVec3),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// Raw bytes.
    Bytes(&'a [u8]),
}

impl SeedValue<'_> {
    fn feed(&self, hasher: &mut Sha256) {
        match *self {
            SeedValue::Str(text) => hasher.update(text.as_bytes()),
            SeedValue::Vec(v) => {
                for component in [v.x, v.y, v.z] {
                    // `+ 0.0` folds -0.0 into 0.0.
                    let rounded = ((component * 1e6).round() / 1e6 + 0.0) as f32;
                    hasher.update(rounded.to_le_bytes());
                }
            }
            SeedValue::Int(n) => hasher.update(n.to_le_bytes()),
            SeedValue::UInt(n) => hasher.update(n.to_le_bytes()),
            SeedValue::Bytes(bytes) => hasher.update(bytes),
        }
    }
}

impl<'a> From<&'a str> for SeedValue<'a> {
    fn from(text: &'a str) -> Self {
        SeedValue::Str(text)
    }
}

impl From<DVec3> for SeedValue<'_> {
    fn from(v: DVec3) -> Self {
        SeedValue::Vec(v)
    }
}

impl From<i64> for SeedValue<'_> {
    fn from(n: i64) -> Self {
        SeedValue::Int(n)
    }
}

impl From<u64> for SeedValue<'_> {
    fn from(n: u64) -> Self {
        SeedValue::UInt(n)
    }
}

impl<'a> From<&'a [u8]> for SeedValue<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        SeedValue::Bytes(bytes)
    }
}

/// Per-compile hash state that every random choice is derived from.
#[derive(Clone)]
pub struct MapSeed {
    state: Sha256,
}

impl MapSeed {
    /// Seeds from the occupied voxel positions of the level.
    ///
    /// Positions are sorted and deduplicated first, so the input order does
    /// not matter.
    pub fn from_layout(points: impl IntoIterator<Item = IVec3>) -> Self {
        let mut points: Vec<IVec3> = points.into_iter().collect();
        points.sort_unstable_by_key(|p| (p.x, p.y, p.z));
        points.dedup();

        let mut state = Sha256::new();
        for point in points {
            state.update(point.x.to_le_bytes());
            state.update(point.y.to_le_bytes());
            state.update(point.z.to_le_bytes());
        }
        Self { state }
    }

    /// Seeds from arbitrary bytes. Mostly useful for tests.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut state = Sha256::new();
        state.update(bytes);
        Self { state }
    }

    /// Derives an independent generator from `tag` and `values`.
    pub fn rng(&self, tag: &[u8], values: &[SeedValue<'_>]) -> ChaCha8Rng {
        let mut state = self.state.clone();
        state.update(tag);
        for value in values {
            value.feed(&mut state);
        }
        let digest: [u8; 32] = state.finalize().into();
        ChaCha8Rng::from_seed(digest)
    }
}

impl fmt::Debug for MapSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSeed").finish_non_exhaustive()
    }
}

impl Default for MapSeed {
    fn default() -> Self {
        Self::from_layout(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_same_inputs_same_stream() {
        let seed = MapSeed::from_bytes(b"level");
        let a: u64 = seed.rng(b"tag", &[DVec3::new(1.0, 2.0, 3.0).into()]).random();
        let b: u64 = seed.rng(b"tag", &[DVec3::new(1.0, 2.0, 3.0).into()]).random();
        assert_eq!(a, b);
    }

    #[test]
    fn test_inputs_change_stream() {
        let seed = MapSeed::from_bytes(b"level");
        let base: u64 = seed.rng(b"tag", &["x".into()]).random();
        let other_tag: u64 = seed.rng(b"tag2", &["x".into()]).random();
        let other_value: u64 = seed.rng(b"tag", &["y".into()]).random();
        assert_ne!(base, other_tag);
        assert_ne!(base, other_value);
    }

    #[test]
    fn test_layout_order_is_irrelevant() {
        let points = [IVec3::new(1, 0, 0), IVec3::new(0, 5, -2), IVec3::ZERO];
        let a = MapSeed::from_layout(points);
        let b = MapSeed::from_layout(points.into_iter().rev().chain([IVec3::ZERO]));
        let x: u64 = a.rng(b"t", &[]).random();
        let y: u64 = b.rng(b"t", &[]).random();
        assert_eq!(x, y);
    }

    #[test]
    fn test_vectors_are_rounded() {
        let seed = MapSeed::default();
        let a: u64 = seed.rng(b"t", &[DVec3::new(0.0, 1.0, 2.0).into()]).random();
        let b: u64 = seed
            .rng(b"t", &[DVec3::new(-0.0, 1.000_000_01, 2.0).into()])
            .random();
        assert_eq!(a, b);
    }
}
