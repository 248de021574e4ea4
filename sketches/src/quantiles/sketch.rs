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

//! Heap-resident doubles quantiles sketch.

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::Error;
use crate::quantiles::query;
use crate::quantiles::serialization;
use crate::quantiles::update_impl::in_place_propagate_carry;
use crate::quantiles::util;

/// Doubles quantiles sketch with heap-resident storage.
///
/// The sketch retains `n mod 2k` recent items in an unsorted base buffer
/// plus k sorted items per occupied level; level `l` is occupied exactly
/// when bit `l` of `n / 2k` is set. Quantile, rank, PMF and CDF queries
/// evaluate the weighted empirical distribution of the retained items.
///
/// NaN inputs are silently dropped.
///
/// # Examples
///
/// ```
/// # use sketches::quantiles::DoublesSketch;
/// let mut sketch = DoublesSketch::builder().k(128).build();
/// for i in 1..=1000 {
///     sketch.update(i as f64);
/// }
/// let median = sketch.quantile(0.5).unwrap();
/// assert!(median > 400.0 && median < 600.0);
/// ```
pub struct DoublesSketch {
    k: u16,
    n: u64,
    min_value: f64,
    max_value: f64,
    combined: Vec<f64>,
    rng: Box<dyn RngCore>,
}

impl std::fmt::Debug for DoublesSketch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoublesSketch")
            .field("k", &self.k)
            .field("n", &self.n)
            .field("min_value", &self.min_value)
            .field("max_value", &self.max_value)
            .field("retained", &util::total_retained(self.k, self.n))
            .finish()
    }
}

impl DoublesSketch {
    /// Create a new builder for DoublesSketch.
    pub fn builder() -> DoublesSketchBuilder {
        DoublesSketchBuilder::default()
    }

    fn with_parts(
        k: u16,
        n: u64,
        min_value: f64,
        max_value: f64,
        combined: Vec<f64>,
        rng: Box<dyn RngCore>,
    ) -> Self {
        Self {
            k,
            n,
            min_value,
            max_value,
            combined,
            rng,
        }
    }

    /// Update the sketch with a value. NaN is silently dropped.
    pub fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        if value > self.max_value {
            self.max_value = value;
        }
        if value < self.min_value {
            self.min_value = value;
        }

        let two_k = 2 * self.k as usize;
        let bb_count = util::base_buffer_items(self.k, self.n);
        self.combined[bb_count] = value;
        let new_n = self.n + 1;

        if bb_count + 1 == two_k {
            let needed = util::combined_buffer_item_capacity(self.k, new_n);
            if self.combined.len() < needed {
                self.combined.resize(needed, 0.0);
            }
            self.combined[..two_k].sort_unstable_by(f64::total_cmp);
            let pattern = util::bit_pattern(self.k, self.n);
            let new_pattern = in_place_propagate_carry(
                &mut self.combined,
                self.k as usize,
                pattern,
                self.rng.as_mut(),
            );
            debug_assert_eq!(new_pattern, util::bit_pattern(self.k, new_n));
        }
        self.n = new_n;
    }

    /// Returns the value at normalized rank `rank` in [0.0, 1.0].
    ///
    /// Rank 0 returns the exact minimum and rank 1 the exact maximum. Fails
    /// on an empty sketch or a rank outside [0, 1].
    pub fn quantile(&self, rank: f64) -> Result<f64, Error> {
        let view = query::sorted_view(self.k, self.n, &self.combined);
        query::quantile(&view, self.n, self.min_value, self.max_value, rank)
    }

    /// Returns the normalized rank of `value`.
    pub fn rank(&self, value: f64) -> Result<f64, Error> {
        let view = query::sorted_view(self.k, self.n, &self.combined);
        query::rank(&view, self.n, value)
    }

    /// Returns the probability masses between consecutive split points.
    ///
    /// Splits must be strictly increasing and NaN-free; the result has
    /// `splits.len() + 1` masses summing to 1.
    pub fn pmf(&self, splits: &[f64]) -> Result<Vec<f64>, Error> {
        let view = query::sorted_view(self.k, self.n, &self.combined);
        query::pmf(&view, self.n, splits)
    }

    /// Returns the cumulative distribution at each split point plus 1.0.
    pub fn cdf(&self, splits: &[f64]) -> Result<Vec<f64>, Error> {
        let view = query::sorted_view(self.k, self.n, &self.combined);
        query::cdf(&view, self.n, splits)
    }

    /// Returns k.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns the stream length.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if no values have been retained.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> usize {
        util::total_retained(self.k, self.n)
    }

    /// Returns the smallest value seen, or +inf when empty.
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Returns the largest value seen, or -inf when empty.
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Returns the normalized rank error guarantee for this sketch's k.
    pub fn normalized_rank_error(&self) -> f64 {
        util::normalized_rank_error(self.k)
    }

    /// Returns the bit pattern of occupied levels, derived from n.
    pub fn bit_pattern(&self) -> u64 {
        util::bit_pattern(self.k, self.n)
    }

    /// Resets the sketch to its empty state.
    pub fn reset(&mut self) {
        self.n = 0;
        self.min_value = f64::INFINITY;
        self.max_value = f64::NEG_INFINITY;
        self.combined = vec![0.0; 2 * self.k as usize];
    }

    /// Serializes the sketch.
    ///
    /// The compact form stores only live items; the updatable form stores
    /// the full combined buffer and can be wrapped by
    /// [`crate::quantiles::DirectDoublesSketch`].
    pub fn serialize(&self, compact: bool) -> Vec<u8> {
        serialization::write_image(
            self.k,
            self.n,
            self.min_value,
            self.max_value,
            &self.combined,
            compact,
        )
    }

    /// Rebuilds a sketch from a compact or updatable image.
    pub fn heapify(bytes: &[u8]) -> Result<Self, Error> {
        Self::heapify_with_rng(bytes, Box::new(StdRng::from_entropy()))
    }

    /// Rebuilds a sketch from an image with a caller-supplied RNG.
    pub fn heapify_with_rng(bytes: &[u8], rng: Box<dyn RngCore>) -> Result<Self, Error> {
        let state = serialization::read_image(bytes)?;
        Ok(Self::with_parts(
            state.k,
            state.n,
            state.min_value,
            state.max_value,
            state.combined,
            rng,
        ))
    }
}

/// Builder for DoublesSketch.
pub struct DoublesSketchBuilder {
    k: u16,
    rng: Option<Box<dyn RngCore>>,
}

impl std::fmt::Debug for DoublesSketchBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoublesSketchBuilder")
            .field("k", &self.k)
            .finish()
    }
}

impl Default for DoublesSketchBuilder {
    fn default() -> Self {
        Self {
            k: util::DEFAULT_K,
            rng: None,
        }
    }
}

impl DoublesSketchBuilder {
    /// Set k, which controls space usage and accuracy.
    ///
    /// # Panics
    ///
    /// If k is not a power of two in [2, 2^15].
    pub fn k(mut self, k: u16) -> Self {
        util::check_k(k).unwrap_or_else(|e| panic!("{}", e.message()));
        self.k = k;
        self
    }

    /// Inject the RNG used for down-sampling parity choices.
    ///
    /// Two sketches fed identical streams with identically seeded RNGs
    /// produce identical state.
    pub fn rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Build the DoublesSketch.
    pub fn build(self) -> DoublesSketch {
        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(StdRng::from_entropy()));
        DoublesSketch::with_parts(
            self.k,
            0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            vec![0.0; 2 * self.k as usize],
            rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::*;

    fn seeded(k: u16, seed: u64) -> DoublesSketch {
        DoublesSketch::builder()
            .k(k)
            .rng(Box::new(StdRng::seed_from_u64(seed)))
            .build()
    }

    #[test]
    fn empty_sketch_state() {
        let sketch = DoublesSketch::builder().k(8).build();
        assert!(sketch.is_empty());
        assert_eq!(sketch.n(), 0);
        assert_eq!(sketch.min_value(), f64::INFINITY);
        assert_eq!(sketch.max_value(), f64::NEG_INFINITY);
        let err = sketch.quantile(0.5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn nan_updates_are_dropped() {
        let mut sketch = seeded(8, 1);
        sketch.update(f64::NAN);
        sketch.update(1.0);
        sketch.update(f64::NAN);
        sketch.update(2.0);
        assert_eq!(sketch.n(), 2);
        assert_eq!(sketch.min_value(), 1.0);
        assert_eq!(sketch.max_value(), 2.0);
    }

    #[test]
    fn ordered_stream_scenario() {
        let mut sketch = seeded(8, 42);
        for i in 1..=1024 {
            sketch.update(i as f64);
        }
        assert_eq!(sketch.n(), 1024);
        assert_eq!(sketch.min_value(), 1.0);
        assert_eq!(sketch.max_value(), 1024.0);
        // 1024 / 16 = 64: level 6 only
        assert_eq!(sketch.bit_pattern(), 64);
        assert_eq!(sketch.num_retained(), 8);

        assert_eq!(sketch.quantile(0.0).unwrap(), 1.0);
        assert_eq!(sketch.quantile(1.0).unwrap(), 1024.0);
        let median = sketch.quantile(0.5).unwrap();
        let eps = sketch.normalized_rank_error();
        assert!((median - 512.0).abs() <= 3.0 * eps * 1024.0 + 128.0);
    }

    #[test]
    fn quantiles_are_monotone_and_ranks_invert() {
        let mut sketch = seeded(32, 7);
        for i in 0..10_000 {
            sketch.update(((i * 7919) % 10_000) as f64);
        }
        let mut previous = f64::NEG_INFINITY;
        for i in 0..=20 {
            let rank = i as f64 / 20.0;
            let q = sketch.quantile(rank).unwrap();
            assert!(q >= previous);
            previous = q;
        }
        let r = sketch.rank(5000.0).unwrap();
        assert!((r - 0.5).abs() < 3.0 * sketch.normalized_rank_error());
    }

    #[test]
    fn pmf_masses_sum_to_one() {
        let mut sketch = seeded(16, 3);
        for i in 0..1000 {
            sketch.update(i as f64);
        }
        let masses = sketch.pmf(&[100.0, 500.0, 900.0]).unwrap();
        assert_eq!(masses.len(), 4);
        assert!((masses.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(masses.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn serialize_round_trips_compact_and_updatable() {
        let mut sketch = seeded(8, 11);
        for i in 0..777 {
            sketch.update(i as f64);
        }
        for compact in [true, false] {
            let bytes = sketch.serialize(compact);
            let restored = DoublesSketch::heapify(&bytes).unwrap();
            assert_eq!(restored.k(), sketch.k());
            assert_eq!(restored.n(), sketch.n());
            assert_eq!(restored.bit_pattern(), sketch.bit_pattern());
            assert_eq!(restored.min_value(), sketch.min_value());
            assert_eq!(restored.max_value(), sketch.max_value());
            assert_eq!(
                restored.quantile(0.25).unwrap(),
                sketch.quantile(0.25).unwrap()
            );
        }
    }

    #[test]
    fn empty_round_trip_is_eight_bytes() {
        let sketch = DoublesSketch::builder().k(64).build();
        let bytes = sketch.serialize(true);
        assert_eq!(bytes.len(), 8);
        let restored = DoublesSketch::heapify(&bytes).unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.k(), 64);
    }

    #[test]
    fn heapify_rejects_corrupt_images() {
        let mut sketch = seeded(8, 13);
        for i in 0..100 {
            sketch.update(i as f64);
        }
        let good = sketch.serialize(true);

        let mut bad_family = good.clone();
        bad_family[2] = 1;
        assert_eq!(
            DoublesSketch::heapify(&bad_family).unwrap_err().kind(),
            ErrorKind::Corruption
        );

        let mut bad_ver = good.clone();
        bad_ver[1] = 2;
        assert_eq!(
            DoublesSketch::heapify(&bad_ver).unwrap_err().kind(),
            ErrorKind::Corruption
        );

        let mut truncated = good;
        truncated.truncate(40);
        assert_eq!(
            DoublesSketch::heapify(&truncated).unwrap_err().kind(),
            ErrorKind::Corruption
        );
    }

    #[test]
    fn identical_rngs_give_identical_images() {
        let mut a = seeded(16, 1234);
        let mut b = seeded(16, 1234);
        for i in 0..5000 {
            let value = ((i * 31) % 997) as f64;
            a.update(value);
            b.update(value);
        }
        assert_eq!(a.serialize(true), b.serialize(true));
        assert_eq!(a.serialize(false), b.serialize(false));
    }
}
