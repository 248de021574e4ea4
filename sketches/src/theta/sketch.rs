// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Heap-resident theta sketch and its compact form.

use std::hash::Hash;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::assert::ensure_preamble_longs_in;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::assert::insufficient_data;
use crate::codec::family::Family;
use crate::codec::flags;
use crate::common::NumStdDev;
use crate::common::ResizeFactor;
use crate::common::binomial_bounds;
use crate::common::canonical_double;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::compute_seed_hash;
use crate::theta::UpdateResult;
use crate::theta::hash_table::DEFAULT_LG_NOM_LONGS;
use crate::theta::hash_table::MAX_LG_NOM_LONGS;
use crate::theta::hash_table::MAX_THETA;
use crate::theta::hash_table::MIN_LG_NOM_LONGS;
use crate::theta::hash_table::ThetaHashTable;
use crate::theta::serialization;

/// Mutable theta sketch for building from input data.
#[derive(Debug)]
pub struct ThetaSketch {
    table: ThetaHashTable,
}

impl ThetaSketch {
    /// Create a new builder for ThetaSketch.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sketches::theta::ThetaSketch;
    /// let sketch = ThetaSketch::builder().lg_k(12).build();
    /// assert_eq!(sketch.lg_k(), 12);
    /// ```
    pub fn builder() -> ThetaSketchBuilder {
        ThetaSketchBuilder::default()
    }

    /// Update the sketch with a hashable value.
    ///
    /// For `f32`/`f64` values, use `update_f32`/`update_f64` instead.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sketches::theta::ThetaSketch;
    /// let mut sketch = ThetaSketch::builder().build();
    /// sketch.update("apple");
    /// assert!(sketch.estimate() >= 1.0);
    /// ```
    pub fn update<T: Hash>(&mut self, value: T) -> UpdateResult {
        let hash = self.table.hash_value(value);
        self.table.try_update(hash)
    }

    /// Update the sketch with an already-computed hash.
    ///
    /// The hash must lie in the 63-bit theta domain `[0, 2^63)`; zero is
    /// rejected. This is the entry point for callers that hash upstream.
    pub fn update_hash(&mut self, hash: u64) -> UpdateResult {
        self.table.try_update(hash)
    }

    /// Update the sketch with a f64 value.
    ///
    /// Numerically equal doubles update identically: -0.0 hashes as +0.0 and
    /// every NaN payload hashes as the canonical NaN.
    pub fn update_f64(&mut self, value: f64) -> UpdateResult {
        self.update(canonical_double(value))
    }

    /// Update the sketch with a f32 value.
    pub fn update_f32(&mut self, value: f32) -> UpdateResult {
        self.update_f64(value as f64)
    }

    /// Return the cardinality estimate.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sketches::theta::ThetaSketch;
    /// # let mut sketch = ThetaSketch::builder().build();
    /// # sketch.update("apple");
    /// assert!(sketch.estimate() >= 1.0);
    /// ```
    pub fn estimate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let num_retained = self.table.num_entries() as f64;
        let theta = self.table.theta() as f64 / MAX_THETA as f64;
        num_retained / theta
    }

    /// Return theta as a fraction (0.0 to 1.0).
    pub fn theta(&self) -> f64 {
        self.table.theta() as f64 / MAX_THETA as f64
    }

    /// Return theta as u64.
    pub fn theta64(&self) -> u64 {
        self.table.theta()
    }

    /// Check if the sketch is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Check if the sketch is in estimation mode.
    pub fn is_estimation_mode(&self) -> bool {
        self.table.theta() < MAX_THETA
    }

    /// Return the number of retained entries.
    pub fn num_retained(&self) -> usize {
        self.table.num_entries()
    }

    /// Return lg_k.
    pub fn lg_k(&self) -> u8 {
        self.table.lg_nom_size()
    }

    /// Return the 16-bit seed hash.
    pub fn seed_hash(&self) -> u16 {
        self.table.seed_hash()
    }

    /// Trim the sketch to nominal size k.
    pub fn trim(&mut self) {
        self.table.trim();
    }

    /// Reset the sketch to its empty state.
    pub fn reset(&mut self) {
        self.table.reset();
    }

    /// Return an iterator over retained hash values.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.table.iter()
    }

    /// Return this sketch in compact (immutable) form.
    ///
    /// If `ordered` is true, retained hash values are sorted ascending.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sketches::theta::ThetaSketch;
    /// let mut sketch = ThetaSketch::builder().build();
    /// sketch.update("apple");
    /// let compact = sketch.compact(true);
    /// assert_eq!(compact.num_retained(), 1);
    /// ```
    pub fn compact(&self, ordered: bool) -> CompactThetaSketch {
        compact_from_parts(
            self.iter().collect(),
            self.table.theta(),
            self.table.seed_hash(),
            ordered,
        )
    }

    /// Returns the approximate lower error bound given the specified number
    /// of standard deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        binomial_bounds::lower_bound(self.num_retained() as u64, self.theta(), num_std_dev)
            .expect("theta of an updatable sketch is always valid")
    }

    /// Returns the approximate upper error bound given the specified number
    /// of standard deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        binomial_bounds::upper_bound(
            self.num_retained() as u64,
            self.theta(),
            num_std_dev,
            self.is_empty(),
        )
        .expect("theta of an updatable sketch is always valid")
    }
}

/// Assembles a compact sketch from retained entries, normalizing the
/// empty/single-item special cases the wire form distinguishes.
pub(crate) fn compact_from_parts(
    mut entries: Vec<u64>,
    theta: u64,
    seed_hash: u16,
    ordered: bool,
) -> CompactThetaSketch {
    let empty = entries.is_empty();
    // A never-filled sketch built with p < 1.0 still serializes as exact.
    let theta = if empty { MAX_THETA } else { theta };
    let is_single = entries.len() == 1 && theta == MAX_THETA;
    // Empty and single-item images are ordered by definition.
    let ordered = ordered || empty || is_single;
    if ordered && entries.len() > 1 {
        entries.sort_unstable();
    }
    CompactThetaSketch {
        entries,
        theta,
        seed_hash,
        ordered,
        empty,
    }
}

/// Compact (immutable) theta sketch.
///
/// This is the serialized-friendly form: a flat array of retained hash
/// values plus theta and the 16-bit seed hash. It can be ordered (sorted
/// ascending) or unordered.
#[derive(Clone, Debug)]
pub struct CompactThetaSketch {
    entries: Vec<u64>,
    theta: u64,
    seed_hash: u16,
    ordered: bool,
    empty: bool,
}

impl CompactThetaSketch {
    /// Returns the cardinality estimate.
    pub fn estimate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let num_retained = self.num_retained() as f64;
        if self.theta == MAX_THETA {
            return num_retained;
        }
        let theta = self.theta as f64 / MAX_THETA as f64;
        num_retained / theta
    }

    /// Returns theta as a fraction (0.0 to 1.0).
    pub fn theta(&self) -> f64 {
        self.theta as f64 / MAX_THETA as f64
    }

    /// Returns theta as u64.
    pub fn theta64(&self) -> u64 {
        self.theta
    }

    /// Returns true if this sketch is empty.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Returns true if this sketch is in estimation mode.
    pub fn is_estimation_mode(&self) -> bool {
        self.theta < MAX_THETA
    }

    /// Returns the number of retained entries.
    pub fn num_retained(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if retained entries are ordered (sorted ascending).
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Returns the 16-bit seed hash.
    pub fn seed_hash(&self) -> u16 {
        self.seed_hash
    }

    /// Return an iterator over retained hash values.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().copied()
    }

    /// Returns the approximate lower error bound given the specified number
    /// of standard deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        binomial_bounds::lower_bound(self.num_retained() as u64, self.theta(), num_std_dev)
            .expect("theta of a compact sketch is always valid")
    }

    /// Returns the approximate upper error bound given the specified number
    /// of standard deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.num_retained() as f64;
        }
        binomial_bounds::upper_bound(
            self.num_retained() as u64,
            self.theta(),
            num_std_dev,
            self.is_empty(),
        )
        .expect("theta of a compact sketch is always valid")
    }

    fn preamble_longs(&self) -> u8 {
        if self.is_estimation_mode() {
            serialization::PREAMBLE_LONGS_COMPACT_ESTIMATING
        } else if self.is_empty() {
            serialization::PREAMBLE_LONGS_COMPACT_MIN
        } else {
            serialization::PREAMBLE_LONGS_COMPACT_EXACT
        }
    }

    /// Serializes this sketch into the compact theta format.
    pub fn serialize(&self) -> Vec<u8> {
        let pre_longs = self.preamble_longs();
        let mut bytes =
            SketchBytes::with_capacity(pre_longs as usize * 8 + self.entries.len() * 8);

        bytes.write_u8(pre_longs);
        bytes.write_u8(serialization::SER_VER);
        bytes.write_u8(Family::COMPACT.id);
        bytes.write_u16_le(0); // bytes 3-4 unused for compact

        let mut flag_bits = flags::FLAG_READ_ONLY | flags::FLAG_COMPACT;
        if self.is_empty() {
            flag_bits |= flags::FLAG_EMPTY;
        }
        if self.is_ordered() {
            flag_bits |= flags::FLAG_ORDERED;
        }
        bytes.write_u8(flag_bits);

        bytes.write_u16_le(self.seed_hash);

        if pre_longs > 1 {
            bytes.write_u32_le(self.entries.len() as u32);
            bytes.write_u32_le(0); // second half of the count long, unused
        }
        if self.is_estimation_mode() {
            bytes.write_u64_le(self.theta);
        }
        for hash in self.entries.iter() {
            bytes.write_u64_le(*hash);
        }
        bytes.into_bytes()
    }

    /// Deserializes a compact theta sketch, expecting the default seed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, DEFAULT_UPDATE_SEED)
    }

    /// Deserializes a compact theta sketch built with the provided seed.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let pre_longs = cursor
            .read_u8()
            .map_err(insufficient_data("preamble_longs"))?;
        let ser_ver = cursor
            .read_u8()
            .map_err(insufficient_data("serial_version"))?;
        let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;

        Family::COMPACT.validate_id(family_id)?;
        ensure_serial_version_is(serialization::SER_VER, ser_ver)?;
        ensure_preamble_longs_in(
            &[
                serialization::PREAMBLE_LONGS_COMPACT_MIN,
                serialization::PREAMBLE_LONGS_COMPACT_EXACT,
                serialization::PREAMBLE_LONGS_COMPACT_ESTIMATING,
            ],
            pre_longs,
        )?;

        cursor
            .read_u16_le()
            .map_err(insufficient_data("<unused>"))?;
        let flag_bits = cursor.read_u8().map_err(insufficient_data("flags"))?;
        flags::ensure_flags_valid(flag_bits)?;
        let seed_hash = cursor
            .read_u16_le()
            .map_err(insufficient_data("seed_hash"))?;

        let empty = (flag_bits & flags::FLAG_EMPTY) != 0;
        let mut theta = MAX_THETA;
        let mut entries = vec![];
        if !empty {
            let expected_seed_hash = compute_seed_hash(seed);
            if seed_hash != expected_seed_hash {
                return Err(Error::seed_mismatch(expected_seed_hash, seed_hash));
            }
            if pre_longs == 1 {
                return Err(Error::deserial(
                    "corrupted: one preamble long but empty flag not set",
                ));
            }
            let num_entries = cursor
                .read_u32_le()
                .map_err(insufficient_data("num_entries"))?;
            cursor
                .read_u32_le()
                .map_err(insufficient_data("<unused_u32>"))?;
            if pre_longs > 2 {
                theta = cursor
                    .read_u64_le()
                    .map_err(insufficient_data("theta_long"))?;
            }
            entries = read_entries(&mut cursor, num_entries as usize, theta)?;
        }
        let ordered = (flag_bits & flags::FLAG_ORDERED) != 0;
        Ok(Self {
            entries,
            theta,
            seed_hash,
            ordered,
            empty,
        })
    }
}

fn read_entries(
    cursor: &mut SketchSlice<'_>,
    num_entries: usize,
    theta: u64,
) -> Result<Vec<u64>, Error> {
    let mut entries = Vec::with_capacity(num_entries);
    for _ in 0..num_entries {
        let hash = cursor.read_u64_le().map_err(insufficient_data("entries"))?;
        if hash == 0 || hash >= theta {
            return Err(Error::deserial("corrupted: invalid retained hash value"));
        }
        entries.push(hash);
    }
    Ok(entries)
}

/// Builder for ThetaSketch.
#[derive(Debug)]
pub struct ThetaSketchBuilder {
    lg_k: u8,
    resize_factor: ResizeFactor,
    sampling_probability: f32,
    seed: u64,
}

impl Default for ThetaSketchBuilder {
    fn default() -> Self {
        Self {
            lg_k: DEFAULT_LG_NOM_LONGS,
            resize_factor: ResizeFactor::X8,
            sampling_probability: 1.0,
            seed: DEFAULT_UPDATE_SEED,
        }
    }
}

impl ThetaSketchBuilder {
    /// Set lg_k (log2 of the nominal entry count k).
    ///
    /// # Panics
    ///
    /// If lg_k is not in range [4, 26].
    pub fn lg_k(mut self, lg_k: u8) -> Self {
        assert!(
            (MIN_LG_NOM_LONGS..=MAX_LG_NOM_LONGS).contains(&lg_k),
            "lg_k must be in [{MIN_LG_NOM_LONGS}, {MAX_LG_NOM_LONGS}], got {lg_k}"
        );
        self.lg_k = lg_k;
        self
    }

    /// Set the resize factor.
    pub fn resize_factor(mut self, factor: ResizeFactor) -> Self {
        self.resize_factor = factor;
        self
    }

    /// Set the sampling probability p, applied once at initialization.
    ///
    /// # Panics
    ///
    /// Panics if p is not in range (0.0, 1.0].
    pub fn sampling_probability(mut self, probability: f32) -> Self {
        assert!(
            probability > 0.0 && probability <= 1.0,
            "sampling_probability must be in (0.0, 1.0], got {probability}"
        );
        self.sampling_probability = probability;
        self
    }

    /// Set the hash seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the ThetaSketch.
    pub fn build(self) -> ThetaSketch {
        let table = ThetaHashTable::new(
            self.lg_k,
            self.resize_factor,
            self.sampling_probability,
            self.seed,
        );
        ThetaSketch { table }
    }
}
