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

//! Direct theta sketch: all state lives in a caller-provided byte store.
//!
//! The store always holds a valid updatable theta image, so snapshotting the
//! store bytes is the same as serializing. The sketch owns the store for its
//! lifetime; growth goes through the store's callback and invalidates the
//! old handle.

use std::hash::Hash;
use std::hash::Hasher;

use crate::codec::assert::ensure_preamble_longs_in;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::family::Family;
use crate::codec::flags;
use crate::common::NumStdDev;
use crate::common::ResizeFactor;
use crate::common::binomial_bounds;
use crate::common::starting_sub_multiple;
use crate::error::Error;
use crate::hash::MurmurHash3X64128;
use crate::hash::compute_seed_hash;
use crate::store::ByteStore;
use crate::store::HeapByteStore;
use crate::theta::UpdateResult;
use crate::theta::hash_table::MAX_LG_NOM_LONGS;
use crate::theta::hash_table::MAX_THETA;
use crate::theta::hash_table::MIN_LG_ARR_LONGS;
use crate::theta::hash_table::MIN_LG_NOM_LONGS;
use crate::theta::hash_table::probe;
use crate::theta::hash_table::rebuild_threshold;
use crate::theta::hash_table::starting_theta;
use crate::theta::serialization as ser;
use crate::theta::sketch::CompactThetaSketch;
use crate::theta::sketch::compact_from_parts;

/// Mutable theta sketch whose state is a caller-provided [`ByteStore`].
pub struct DirectThetaSketch {
    store: Box<dyn ByteStore>,
    lg_nom_longs: u8,
    seed: u64,
    seed_hash: u16,
    resize_factor: ResizeFactor,
}

impl std::fmt::Debug for DirectThetaSketch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectThetaSketch")
            .field("lg_nom_longs", &self.lg_nom_longs)
            .field("seed", &self.seed)
            .field("capacity", &self.store.capacity())
            .finish()
    }
}

impl DirectThetaSketch {
    /// Initializes a new direct sketch in `store`.
    ///
    /// The store must hold the initial preamble plus hash array; it grows
    /// through its own callback as the table resizes toward `2^(lg_k + 1)`
    /// slots.
    pub fn new_instance(
        lg_k: u8,
        seed: u64,
        p: f32,
        rf: ResizeFactor,
        mut store: Box<dyn ByteStore>,
    ) -> Result<Self, Error> {
        if !(MIN_LG_NOM_LONGS..=MAX_LG_NOM_LONGS).contains(&lg_k) {
            return Err(Error::invalid_parameter(format!(
                "lg_k must be in [{MIN_LG_NOM_LONGS}, {MAX_LG_NOM_LONGS}], got {lg_k}"
            )));
        }
        if !(p > 0.0 && p <= 1.0) {
            return Err(Error::invalid_parameter(format!(
                "sampling probability must be in (0.0, 1.0], got {p}"
            )));
        }
        let lg_arr_longs = starting_sub_multiple(lg_k + 1, rf.lg(), MIN_LG_ARR_LONGS);
        let required = ser::HASHES_START + (8usize << lg_arr_longs);
        if store.capacity() < required {
            return Err(Error::buffer_too_small(required, store.capacity()));
        }
        let seed_hash = compute_seed_hash(seed);

        // the resize factor rides in the top two bits of byte 0
        store.write_u8(
            ser::PREAMBLE_LONGS_BYTE,
            ser::PREAMBLE_LONGS_UPDATABLE | (rf.lg() << 6),
        )?;
        store.write_u8(ser::SER_VER_BYTE, ser::SER_VER)?;
        store.write_u8(ser::FAMILY_BYTE, Family::QUICK_SELECT.id)?;
        store.write_u8(ser::LG_NOM_LONGS_BYTE, lg_k)?;
        store.write_u8(ser::LG_ARR_LONGS_BYTE, lg_arr_longs)?;
        store.write_u8(ser::FLAGS_BYTE, flags::FLAG_EMPTY)?;
        store.write_u16(ser::SEED_HASH_SHORT, seed_hash)?;
        store.write_u32(ser::RETAINED_ENTRIES_INT, 0)?;
        store.write_f32(ser::P_FLOAT, p)?;
        store.write_u64(ser::THETA_LONG, starting_theta(p))?;
        store.write_u64_array(ser::HASHES_START, &vec![0u64; 1 << lg_arr_longs])?;

        Ok(Self {
            store,
            lg_nom_longs: lg_k,
            seed,
            seed_hash,
            resize_factor: rf,
        })
    }

    /// Wraps an existing updatable theta image for further updates.
    ///
    /// Compact or read-only images cannot be wrapped mutably and fail with
    /// `NotSupported`.
    pub fn wrap(store: Box<dyn ByteStore>, seed: u64) -> Result<Self, Error> {
        let pre_byte = store.read_u8(ser::PREAMBLE_LONGS_BYTE)?;
        let pre_longs = pre_byte & 0x3F;
        let lg_rf = pre_byte >> 6;
        let ser_ver = store.read_u8(ser::SER_VER_BYTE)?;
        let family_id = store.read_u8(ser::FAMILY_BYTE)?;
        let lg_nom_longs = store.read_u8(ser::LG_NOM_LONGS_BYTE)?;
        let lg_arr_longs = store.read_u8(ser::LG_ARR_LONGS_BYTE)?;
        let flag_bits = store.read_u8(ser::FLAGS_BYTE)?;
        let seed_hash = store.read_u16(ser::SEED_HASH_SHORT)?;

        ensure_preamble_longs_in(&[ser::PREAMBLE_LONGS_UPDATABLE], pre_longs)?;
        ensure_serial_version_is(ser::SER_VER, ser_ver)?;
        Family::QUICK_SELECT.validate_id(family_id)?;
        flags::ensure_flags_valid(flag_bits)?;
        if flag_bits & (flags::FLAG_COMPACT | flags::FLAG_READ_ONLY) != 0 {
            return Err(Error::not_supported(
                "cannot wrap a compact or read-only image as a mutable direct sketch",
            ));
        }
        if !(MIN_LG_NOM_LONGS..=MAX_LG_NOM_LONGS).contains(&lg_nom_longs) {
            return Err(Error::deserial(format!(
                "corrupted: lg_nom_longs out of range: {lg_nom_longs}"
            )));
        }
        if lg_arr_longs < MIN_LG_ARR_LONGS || lg_arr_longs > lg_nom_longs + 1 {
            return Err(Error::deserial(format!(
                "corrupted: lg_arr_longs out of range: {lg_arr_longs}"
            )));
        }
        let expected_seed_hash = compute_seed_hash(seed);
        if seed_hash != expected_seed_hash {
            return Err(Error::seed_mismatch(expected_seed_hash, seed_hash));
        }
        let required = ser::HASHES_START + (8usize << lg_arr_longs);
        if store.capacity() < required {
            return Err(Error::buffer_too_small(required, store.capacity()));
        }
        let num_entries = store.read_u32(ser::RETAINED_ENTRIES_INT)?;
        if flag_bits & flags::FLAG_EMPTY != 0 && num_entries > 0 {
            return Err(Error::deserial(format!(
                "corrupted: empty flag set but {num_entries} retained entries"
            )));
        }
        let p = store.read_f32(ser::P_FLOAT)?;
        if !(p > 0.0 && p <= 1.0) {
            return Err(Error::deserial(format!(
                "corrupted: sampling probability out of range: {p}"
            )));
        }

        let resize_factor = ResizeFactor::from_lg(lg_rf)
            .expect("two bits always decode to a resize factor");

        Ok(Self {
            store,
            lg_nom_longs,
            seed,
            seed_hash,
            resize_factor,
        })
    }

    /// Update the sketch with a hashable value.
    pub fn update<T: Hash>(&mut self, value: T) -> Result<UpdateResult, Error> {
        let mut hasher = MurmurHash3X64128::with_seed(self.seed);
        value.hash(&mut hasher);
        self.update_hash(hasher.finish() >> 1)
    }

    /// Update the sketch with an already-computed hash in `[0, 2^63)`.
    pub fn update_hash(&mut self, hash: u64) -> Result<UpdateResult, Error> {
        if hash == 0 {
            return Ok(UpdateResult::RejectedNull);
        }
        let flag_bits = self.store.read_u8(ser::FLAGS_BYTE)?;
        if flag_bits & flags::FLAG_EMPTY != 0 {
            self.store
                .write_u8(ser::FLAGS_BYTE, flag_bits & !flags::FLAG_EMPTY)?;
        }
        let theta = self.store.read_u64(ser::THETA_LONG)?;
        if hash >= theta {
            return Ok(UpdateResult::RejectedOverTheta);
        }

        let lg_arr_longs = self.store.read_u8(ser::LG_ARR_LONGS_BYTE)?;
        let mask = (1usize << lg_arr_longs) - 1;
        let stride = (((hash >> lg_arr_longs) as usize) & mask) | 1;
        let mut index = (hash as usize) & mask;
        loop {
            let slot = self.store.read_u64(ser::HASHES_START + index * 8)?;
            if slot == hash {
                return Ok(UpdateResult::RejectedDuplicate);
            }
            if slot == 0 {
                break;
            }
            index = (index + stride) & mask;
        }

        self.store.write_u64(ser::HASHES_START + index * 8, hash)?;
        let num_entries = self.store.read_u32(ser::RETAINED_ENTRIES_INT)? as usize + 1;
        self.store
            .write_u32(ser::RETAINED_ENTRIES_INT, num_entries as u32)?;

        if num_entries > rebuild_threshold(lg_arr_longs) {
            self.rebuild(lg_arr_longs)?;
            if hash >= self.store.read_u64(ser::THETA_LONG)? {
                return Ok(UpdateResult::InsertedCountNotIncremented);
            }
        }
        Ok(UpdateResult::InsertedCountIncremented)
    }

    fn rebuild(&mut self, lg_arr_longs: u8) -> Result<(), Error> {
        let lg_target = self.lg_nom_longs + 1;
        if lg_arr_longs < lg_target {
            let lg_grow = self.resize_factor.lg().max(1);
            self.resize(lg_arr_longs, (lg_arr_longs + lg_grow).min(lg_target))
        } else {
            self.trim_theta(lg_arr_longs)
        }
    }

    fn resize(&mut self, lg_arr_longs: u8, new_lg_arr_longs: u8) -> Result<(), Error> {
        let old_slots = self
            .store
            .read_u64_array(ser::HASHES_START, 1 << lg_arr_longs)?;

        let required = ser::HASHES_START + (8usize << new_lg_arr_longs);
        self.grow_store(required)?;

        let mut slots = vec![0u64; 1 << new_lg_arr_longs];
        for hash in old_slots {
            if hash != 0 {
                if let Err(index) = probe(&slots, new_lg_arr_longs, hash) {
                    slots[index] = hash;
                }
            }
        }
        self.store.write_u8(ser::LG_ARR_LONGS_BYTE, new_lg_arr_longs)?;
        self.store.write_u64_array(ser::HASHES_START, &slots)
    }

    fn trim_theta(&mut self, lg_arr_longs: u8) -> Result<(), Error> {
        let nominal = 1usize << self.lg_nom_longs;
        let mut retained: Vec<u64> = self
            .store
            .read_u64_array(ser::HASHES_START, 1 << lg_arr_longs)?
            .into_iter()
            .filter(|&h| h != 0)
            .collect();
        if retained.len() <= nominal {
            return Ok(());
        }
        let (_, pivot, _) = retained.select_nth_unstable(nominal);
        let theta = *pivot;

        let mut slots = vec![0u64; 1 << lg_arr_longs];
        for hash in retained {
            if hash < theta {
                if let Err(index) = probe(&slots, lg_arr_longs, hash) {
                    slots[index] = hash;
                }
            }
        }
        self.store.write_u64(ser::THETA_LONG, theta)?;
        self.store.write_u32(ser::RETAINED_ENTRIES_INT, nominal as u32)?;
        self.store.write_u64_array(ser::HASHES_START, &slots)
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

    /// Returns the cardinality estimate.
    pub fn estimate(&self) -> Result<f64, Error> {
        if self.is_empty()? {
            return Ok(0.0);
        }
        let num_retained = self.num_retained()? as f64;
        let theta = self.store.read_u64(ser::THETA_LONG)? as f64 / MAX_THETA as f64;
        Ok(num_retained / theta)
    }

    /// Returns the approximate lower error bound.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> Result<f64, Error> {
        if !self.is_estimation_mode()? {
            return Ok(self.num_retained()? as f64);
        }
        binomial_bounds::lower_bound(self.num_retained()? as u64, self.theta()?, num_std_dev)
    }

    /// Returns the approximate upper error bound.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> Result<f64, Error> {
        if !self.is_estimation_mode()? {
            return Ok(self.num_retained()? as f64);
        }
        binomial_bounds::upper_bound(
            self.num_retained()? as u64,
            self.theta()?,
            num_std_dev,
            self.is_empty()?,
        )
    }

    /// Returns theta as a fraction (0.0 to 1.0).
    pub fn theta(&self) -> Result<f64, Error> {
        Ok(self.theta64()? as f64 / MAX_THETA as f64)
    }

    /// Returns theta as u64.
    pub fn theta64(&self) -> Result<u64, Error> {
        self.store.read_u64(ser::THETA_LONG)
    }

    /// Returns true if the sketch is empty.
    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.store.read_u8(ser::FLAGS_BYTE)? & flags::FLAG_EMPTY != 0)
    }

    /// Returns true if the sketch is in estimation mode.
    pub fn is_estimation_mode(&self) -> Result<bool, Error> {
        Ok(self.theta64()? < MAX_THETA)
    }

    /// Returns the number of retained entries.
    pub fn num_retained(&self) -> Result<usize, Error> {
        Ok(self.store.read_u32(ser::RETAINED_ENTRIES_INT)? as usize)
    }

    /// Returns lg_k.
    pub fn lg_k(&self) -> u8 {
        self.lg_nom_longs
    }

    /// Returns the 16-bit seed hash.
    pub fn seed_hash(&self) -> u16 {
        self.seed_hash
    }

    /// Returns the retained hash values in slot order.
    pub fn retained_hashes(&self) -> Result<Vec<u64>, Error> {
        let lg_arr_longs = self.store.read_u8(ser::LG_ARR_LONGS_BYTE)?;
        Ok(self
            .store
            .read_u64_array(ser::HASHES_START, 1 << lg_arr_longs)?
            .into_iter()
            .filter(|&h| h != 0)
            .collect())
    }

    /// Returns this sketch in compact (immutable) form.
    pub fn compact(&self, ordered: bool) -> Result<CompactThetaSketch, Error> {
        let entries = self.retained_hashes()?;
        let theta = self.theta64()?;
        Ok(compact_from_parts(entries, theta, self.seed_hash, ordered))
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
