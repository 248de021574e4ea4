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

//! Direct doubles quantiles sketch: all state lives in a caller-provided
//! byte store holding an updatable image.
//!
//! The base-buffer count and the bit pattern are never stored; both are
//! derived from n on each read. Growth for new levels goes through the
//! store's callback, which may reallocate; the sketch updates its handle
//! and never keeps a stale one.

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::codec::assert::ensure_empty_consistent_with_n;
use crate::codec::assert::ensure_preamble_longs_in;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::family::Family;
use crate::codec::flags;
use crate::error::Error;
use crate::quantiles::query;
use crate::quantiles::serialization as ser;
use crate::quantiles::update_impl::propagate_carry_in_store;
use crate::quantiles::util;
use crate::store::ByteStore;
use crate::store::HeapByteStore;

/// Doubles quantiles sketch whose state is a caller-provided [`ByteStore`].
pub struct DirectDoublesSketch {
    store: Box<dyn ByteStore>,
    k: u16,
    rng: Box<dyn RngCore>,
}

impl std::fmt::Debug for DirectDoublesSketch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectDoublesSketch")
            .field("k", &self.k)
            .field("capacity", &self.store.capacity())
            .finish()
    }
}

fn required_bytes(k: u16, n: u64) -> usize {
    ser::COMBINED_BUFFER + util::combined_buffer_item_capacity(k, n) * 8
}

impl DirectDoublesSketch {
    /// Initializes a new direct sketch in `store`.
    ///
    /// The store must initially hold at least `32 + 16k` bytes; it grows
    /// through its own callback as levels are added.
    pub fn new_instance(k: u16, store: Box<dyn ByteStore>) -> Result<Self, Error> {
        Self::new_instance_with_rng(k, store, Box::new(StdRng::from_entropy()))
    }

    /// Initializes a new direct sketch with a caller-supplied RNG.
    pub fn new_instance_with_rng(
        k: u16,
        mut store: Box<dyn ByteStore>,
        rng: Box<dyn RngCore>,
    ) -> Result<Self, Error> {
        util::check_k(k)?;
        let required = required_bytes(k, 0);
        if store.capacity() < required {
            return Err(Error::buffer_too_small(required, store.capacity()));
        }

        store.write_u8(ser::PREAMBLE_LONGS_BYTE, ser::PREAMBLE_LONGS_NONEMPTY)?;
        store.write_u8(ser::SER_VER_BYTE, ser::SER_VER)?;
        store.write_u8(ser::FAMILY_BYTE, Family::QUANTILES.id)?;
        store.write_u8(ser::FLAGS_BYTE, flags::FLAG_EMPTY)?;
        store.write_u16(ser::K_SHORT, k)?;
        store.write_u16(6, 0)?;
        store.write_u64(ser::N_LONG, 0)?;
        store.write_f64(ser::MIN_DOUBLE, f64::INFINITY)?;
        store.write_f64(ser::MAX_DOUBLE, f64::NEG_INFINITY)?;

        Ok(Self { store, k, rng })
    }

    /// Wraps an existing updatable quantiles image for further updates.
    pub fn wrap(store: Box<dyn ByteStore>) -> Result<Self, Error> {
        Self::wrap_with_rng(store, Box::new(StdRng::from_entropy()))
    }

    /// Wraps an existing updatable image with a caller-supplied RNG.
    ///
    /// Compact images cannot back a mutable sketch and fail with
    /// `NotSupported`.
    pub fn wrap_with_rng(
        mut store: Box<dyn ByteStore>,
        rng: Box<dyn RngCore>,
    ) -> Result<Self, Error> {
        let pre_longs = store.read_u8(ser::PREAMBLE_LONGS_BYTE)?;
        let ser_ver = store.read_u8(ser::SER_VER_BYTE)?;
        let family_id = store.read_u8(ser::FAMILY_BYTE)?;
        let flag_bits = store.read_u8(ser::FLAGS_BYTE)?;
        let k = store.read_u16(ser::K_SHORT)?;

        ensure_preamble_longs_in(
            &[ser::PREAMBLE_LONGS_EMPTY, ser::PREAMBLE_LONGS_NONEMPTY],
            pre_longs,
        )?;
        ensure_serial_version_is(ser::SER_VER, ser_ver)?;
        Family::QUANTILES.validate_id(family_id)?;
        flags::ensure_flags_valid(flag_bits)?;
        if flag_bits & flags::FLAG_COMPACT != 0 {
            return Err(Error::not_supported(
                "cannot wrap a compact image as a mutable direct sketch",
            ));
        }
        util::check_k(k)
            .map_err(|e| Error::deserial(format!("corrupted: {}", e.message())))?;

        let required_empty = required_bytes(k, 0);
        if store.capacity() < required_empty {
            return Err(Error::buffer_too_small(required_empty, store.capacity()));
        }

        let empty = flag_bits & flags::FLAG_EMPTY != 0;
        let n = if pre_longs == ser::PREAMBLE_LONGS_NONEMPTY {
            store.read_u64(ser::N_LONG)?
        } else {
            // one-preamble-long images are empty; normalize the state fields
            store.write_u64(ser::N_LONG, 0)?;
            store.write_f64(ser::MIN_DOUBLE, f64::INFINITY)?;
            store.write_f64(ser::MAX_DOUBLE, f64::NEG_INFINITY)?;
            0
        };
        ensure_empty_consistent_with_n(empty, n)?;

        let required = required_bytes(k, n);
        if store.capacity() < required {
            return Err(Error::buffer_too_small(required, store.capacity()));
        }

        Ok(Self { store, k, rng })
    }

    /// Update the sketch with a value. NaN is silently dropped.
    pub fn update(&mut self, value: f64) -> Result<(), Error> {
        if value.is_nan() {
            return Ok(());
        }
        if value > self.store.read_f64(ser::MAX_DOUBLE)? {
            self.store.write_f64(ser::MAX_DOUBLE, value)?;
        }
        if value < self.store.read_f64(ser::MIN_DOUBLE)? {
            self.store.write_f64(ser::MIN_DOUBLE, value)?;
        }

        let n = self.n()?;
        let two_k = 2 * self.k as usize;
        let bb_count = util::base_buffer_items(self.k, n);
        self.store
            .write_f64(ser::COMBINED_BUFFER + bb_count * 8, value)?;
        self.store.write_u8(ser::FLAGS_BYTE, 0)?;
        let new_n = n + 1;

        if bb_count + 1 == two_k {
            self.grow_store(required_bytes(self.k, new_n))?;

            let mut base = self.store.read_f64_array(ser::COMBINED_BUFFER, two_k)?;
            base.sort_unstable_by(f64::total_cmp);
            self.store.write_f64_array(ser::COMBINED_BUFFER, &base)?;

            let pattern = util::bit_pattern(self.k, n);
            propagate_carry_in_store(
                self.store.as_mut(),
                self.k as usize,
                pattern,
                self.rng.as_mut(),
            )?;
        }
        self.store.write_u64(ser::N_LONG, new_n)
    }

    fn grow_store(&mut self, required: usize) -> Result<(), Error> {
        if self.store.capacity() >= required {
            return Ok(());
        }
        let placeholder: Box<dyn ByteStore> = Box::new(HeapByteStore::fixed(0));
        let store = std::mem::replace(&mut self.store, placeholder);
        self.store = store.request_grow(required, true)?;
        Ok(())
    }

    fn combined(&self) -> Result<Vec<f64>, Error> {
        let n = self.n()?;
        let capacity = util::combined_buffer_item_capacity(self.k, n);
        self.store.read_f64_array(ser::COMBINED_BUFFER, capacity)
    }

    /// Returns the value at normalized rank `rank` in [0.0, 1.0].
    pub fn quantile(&self, rank: f64) -> Result<f64, Error> {
        let n = self.n()?;
        let view = query::sorted_view(self.k, n, &self.combined()?);
        query::quantile(&view, n, self.min_value()?, self.max_value()?, rank)
    }

    /// Returns the normalized rank of `value`.
    pub fn rank(&self, value: f64) -> Result<f64, Error> {
        let n = self.n()?;
        let view = query::sorted_view(self.k, n, &self.combined()?);
        query::rank(&view, n, value)
    }

    /// Returns the probability masses between consecutive split points.
    pub fn pmf(&self, splits: &[f64]) -> Result<Vec<f64>, Error> {
        let n = self.n()?;
        let view = query::sorted_view(self.k, n, &self.combined()?);
        query::pmf(&view, n, splits)
    }

    /// Returns the cumulative distribution at each split point plus 1.0.
    pub fn cdf(&self, splits: &[f64]) -> Result<Vec<f64>, Error> {
        let n = self.n()?;
        let view = query::sorted_view(self.k, n, &self.combined()?);
        query::cdf(&view, n, splits)
    }

    /// Returns k.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns the stream length.
    pub fn n(&self) -> Result<u64, Error> {
        self.store.read_u64(ser::N_LONG)
    }

    /// Returns true if no values have been retained.
    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.n()? == 0)
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> Result<usize, Error> {
        Ok(util::total_retained(self.k, self.n()?))
    }

    /// Returns the smallest value seen, or +inf when empty.
    pub fn min_value(&self) -> Result<f64, Error> {
        self.store.read_f64(ser::MIN_DOUBLE)
    }

    /// Returns the largest value seen, or -inf when empty.
    pub fn max_value(&self) -> Result<f64, Error> {
        self.store.read_f64(ser::MAX_DOUBLE)
    }

    /// Returns the bit pattern of occupied levels, derived from n.
    pub fn bit_pattern(&self) -> Result<u64, Error> {
        Ok(util::bit_pattern(self.k, self.n()?))
    }

    /// Resets the sketch to its empty state.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.store.write_u64(ser::N_LONG, 0)?;
        self.store.write_f64(ser::MIN_DOUBLE, f64::INFINITY)?;
        self.store.write_f64(ser::MAX_DOUBLE, f64::NEG_INFINITY)?;
        self.store.write_u8(ser::FLAGS_BYTE, flags::FLAG_EMPTY)
    }

    /// Serializes the sketch, in the same formats as the heap variant.
    pub fn serialize(&self, compact: bool) -> Result<Vec<u8>, Error> {
        Ok(ser::write_image(
            self.k,
            self.n()?,
            self.min_value()?,
            self.max_value()?,
            &self.combined()?,
            compact,
        ))
    }

    /// Returns a view of the underlying store.
    pub fn store(&self) -> &dyn ByteStore {
        self.store.as_ref()
    }

    /// Releases the underlying store, consuming the sketch.
    pub fn into_store(self) -> Box<dyn ByteStore> {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::*;

    fn new_direct(k: u16, capacity: usize, seed: u64) -> DirectDoublesSketch {
        let store = Box::new(HeapByteStore::with_capacity(capacity));
        DirectDoublesSketch::new_instance_with_rng(
            k,
            store,
            Box::new(StdRng::seed_from_u64(seed)),
        )
        .unwrap()
    }

    #[test]
    fn new_instance_requires_initial_capacity() {
        let store = Box::new(HeapByteStore::with_capacity(16));
        let err = DirectDoublesSketch::new_instance(8, store).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn update_and_query_in_store() {
        let mut sketch = new_direct(8, 4096, 5);
        for i in 1..=1024 {
            sketch.update(i as f64).unwrap();
        }
        assert_eq!(sketch.n().unwrap(), 1024);
        assert_eq!(sketch.min_value().unwrap(), 1.0);
        assert_eq!(sketch.max_value().unwrap(), 1024.0);
        assert_eq!(sketch.bit_pattern().unwrap(), 64);
        assert_eq!(sketch.quantile(0.0).unwrap(), 1.0);
        assert_eq!(sketch.quantile(1.0).unwrap(), 1024.0);
    }

    #[test]
    fn nan_is_dropped_in_direct_mode_too() {
        let mut sketch = new_direct(8, 1024, 6);
        sketch.update(f64::NAN).unwrap();
        sketch.update(1.0).unwrap();
        sketch.update(f64::NAN).unwrap();
        sketch.update(2.0).unwrap();
        assert_eq!(sketch.n().unwrap(), 2);
        assert_eq!(sketch.min_value().unwrap(), 1.0);
        assert_eq!(sketch.max_value().unwrap(), 2.0);
    }

    #[test]
    fn grows_through_the_store_callback() {
        let k = 16u16;
        let initial = required_bytes(k, 0);
        let store = Box::new(HeapByteStore::with_capacity(initial));
        let mut sketch = DirectDoublesSketch::new_instance_with_rng(
            k,
            store,
            Box::new(StdRng::seed_from_u64(9)),
        )
        .unwrap();
        for i in 0..10_000 {
            sketch.update(i as f64).unwrap();
        }
        assert!(sketch.store().capacity() > initial);
        assert_eq!(sketch.n().unwrap(), 10_000);
    }

    #[test]
    fn fixed_store_growth_failure_surfaces() {
        let k = 16u16;
        let store = Box::new(HeapByteStore::fixed(required_bytes(k, 0)));
        let mut sketch = DirectDoublesSketch::new_instance_with_rng(
            k,
            store,
            Box::new(StdRng::seed_from_u64(9)),
        )
        .unwrap();
        let mut failed = false;
        for i in 0..10_000 {
            if let Err(err) = sketch.update(i as f64) {
                assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
                failed = true;
                break;
            }
        }
        assert!(failed);
    }

    #[test]
    fn wrap_resumes_updating() {
        let mut sketch = new_direct(8, 4096, 21);
        for i in 0..500 {
            sketch.update(i as f64).unwrap();
        }
        let n = sketch.n().unwrap();
        let store = sketch.into_store();

        let mut resumed = DirectDoublesSketch::wrap(store).unwrap();
        assert_eq!(resumed.n().unwrap(), n);
        for i in 500..1000 {
            resumed.update(i as f64).unwrap();
        }
        assert_eq!(resumed.n().unwrap(), 1000);
    }

    #[test]
    fn wrap_rejects_compact_image() {
        let mut sketch = new_direct(8, 4096, 22);
        for i in 0..100 {
            sketch.update(i as f64).unwrap();
        }
        let bytes = sketch.serialize(true).unwrap();
        let store = Box::new(HeapByteStore::from_vec(bytes, true));
        let err = DirectDoublesSketch::wrap(store).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn wrap_rejects_undersized_store_for_n() {
        let mut sketch = new_direct(8, 1 << 14, 23);
        for i in 0..10_000 {
            sketch.update(i as f64).unwrap();
        }
        // image claims n=10000 but the store is truncated
        let image = sketch.serialize(false).unwrap();
        let truncated = image[..required_bytes(8, 0)].to_vec();
        let store = Box::new(HeapByteStore::from_vec(truncated, false));
        let err = DirectDoublesSketch::wrap(store).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }
}
