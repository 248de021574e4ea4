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

//! Heap-resident quick-select hash table backing the mutable theta sketch.
//!
//! The table is open-addressed over a power-of-two array of 64-bit hash
//! values with 0 meaning empty. All retained hashes satisfy `0 < h < theta`.
//! When the retained count exceeds 15/16 of the physical size the table
//! either grows by the resize factor (up to twice the nominal size) or, at
//! full size, trims theta by quick-selecting the (k+1)-th smallest hash.

use std::hash::Hash;
use std::hash::Hasher;

use crate::common::ResizeFactor;
use crate::common::starting_sub_multiple;
use crate::hash::MurmurHash3X64128;
use crate::hash::compute_seed_hash;
use crate::theta::UpdateResult;

/// Minimum lg of the nominal entry count.
pub const MIN_LG_NOM_LONGS: u8 = 4;
/// Maximum lg of the nominal entry count.
pub const MAX_LG_NOM_LONGS: u8 = 26;
/// Default lg of the nominal entry count.
pub const DEFAULT_LG_NOM_LONGS: u8 = 12;
/// Minimum lg of the physical array size.
pub(crate) const MIN_LG_ARR_LONGS: u8 = 5;
/// Theta of a sketch that has not entered estimation mode.
pub const MAX_THETA: u64 = i64::MAX as u64;

/// Retained count may not exceed 15/16 of the physical array size.
pub(crate) const REBUILD_THRESHOLD_NUMERATOR: usize = 15;
pub(crate) const REBUILD_THRESHOLD_DENOMINATOR: usize = 16;

pub(crate) fn rebuild_threshold(lg_arr_longs: u8) -> usize {
    ((1usize << lg_arr_longs) * REBUILD_THRESHOLD_NUMERATOR) / REBUILD_THRESHOLD_DENOMINATOR
}

/// Theta at initialization for sampling probability `p`.
pub(crate) fn starting_theta(p: f32) -> u64 {
    if p < 1.0 {
        (p as f64 * (MAX_THETA as f64 + 1.0)) as u64
    } else {
        MAX_THETA
    }
}

/// Probes `slots` for `hash`, returning `Ok(index)` of the matching slot or
/// `Err(index)` of the empty slot where it belongs.
///
/// The stride is forced odd so it is coprime with the power-of-two size;
/// termination is guaranteed because the load factor stays below 1.
pub(crate) fn probe(slots: &[u64], lg_arr_longs: u8, hash: u64) -> Result<usize, usize> {
    let mask = (1usize << lg_arr_longs) - 1;
    let stride = (((hash >> lg_arr_longs) as usize) & mask) | 1;
    let mut index = (hash as usize) & mask;
    loop {
        let slot = slots[index];
        if slot == 0 {
            return Err(index);
        }
        if slot == hash {
            return Ok(index);
        }
        index = (index + stride) & mask;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ThetaHashTable {
    lg_nom_longs: u8,
    lg_arr_longs: u8,
    resize_factor: ResizeFactor,
    sampling_probability: f32,
    seed: u64,
    seed_hash: u16,
    theta: u64,
    num_entries: usize,
    empty: bool,
    slots: Vec<u64>,
}

impl ThetaHashTable {
    pub fn new(
        lg_nom_longs: u8,
        resize_factor: ResizeFactor,
        sampling_probability: f32,
        seed: u64,
    ) -> Self {
        let lg_nom_longs = lg_nom_longs.max(MIN_LG_NOM_LONGS);
        let lg_arr_longs = starting_sub_multiple(
            lg_nom_longs + 1,
            resize_factor.lg(),
            MIN_LG_ARR_LONGS,
        );
        Self {
            lg_nom_longs,
            lg_arr_longs,
            resize_factor,
            sampling_probability,
            seed,
            seed_hash: compute_seed_hash(seed),
            theta: starting_theta(sampling_probability),
            num_entries: 0,
            empty: true,
            slots: vec![0; 1 << lg_arr_longs],
        }
    }

    /// Hashes a value with the sketch seed into the 63-bit theta domain.
    pub fn hash_value<T: Hash>(&self, value: T) -> u64 {
        let mut hasher = MurmurHash3X64128::with_seed(self.seed);
        value.hash(&mut hasher);
        hasher.finish() >> 1
    }

    /// Inserts `hash` if it passes screening, rebuilding as needed.
    pub fn try_update(&mut self, hash: u64) -> UpdateResult {
        if hash == 0 {
            return UpdateResult::RejectedNull;
        }
        self.empty = false;
        if hash >= self.theta {
            return UpdateResult::RejectedOverTheta;
        }
        match probe(&self.slots, self.lg_arr_longs, hash) {
            Ok(_) => UpdateResult::RejectedDuplicate,
            Err(index) => {
                self.slots[index] = hash;
                self.num_entries += 1;
                if self.num_entries > rebuild_threshold(self.lg_arr_longs) {
                    self.rebuild();
                    if hash >= self.theta {
                        return UpdateResult::InsertedCountNotIncremented;
                    }
                }
                UpdateResult::InsertedCountIncremented
            }
        }
    }

    /// Grows the table toward full size, or trims theta when already there.
    fn rebuild(&mut self) {
        let lg_target = self.lg_nom_longs + 1;
        if self.lg_arr_longs < lg_target {
            let lg_grow = self.resize_factor.lg().max(1);
            self.resize((self.lg_arr_longs + lg_grow).min(lg_target));
        } else {
            self.trim_theta();
        }
    }

    fn resize(&mut self, new_lg_arr_longs: u8) {
        let old_slots = std::mem::replace(&mut self.slots, vec![0; 1 << new_lg_arr_longs]);
        self.lg_arr_longs = new_lg_arr_longs;
        for hash in old_slots {
            if hash != 0 {
                if let Err(index) = probe(&self.slots, self.lg_arr_longs, hash) {
                    self.slots[index] = hash;
                }
            }
        }
    }

    /// Selects the (k+1)-th smallest retained hash as the new theta and
    /// discards everything at or above it, leaving exactly k entries.
    pub fn trim_theta(&mut self) {
        let nominal = 1usize << self.lg_nom_longs;
        if self.num_entries <= nominal {
            return;
        }
        let mut retained: Vec<u64> = self.slots.iter().copied().filter(|&h| h != 0).collect();
        let (_, pivot, _) = retained.select_nth_unstable(nominal);
        self.theta = *pivot;

        self.slots.fill(0);
        self.num_entries = 0;
        for hash in retained {
            if hash < self.theta {
                if let Err(index) = probe(&self.slots, self.lg_arr_longs, hash) {
                    self.slots[index] = hash;
                    self.num_entries += 1;
                }
            }
        }
        debug_assert_eq!(self.num_entries, nominal);
    }

    /// Trims the retained count down to the nominal k if it exceeds it.
    pub fn trim(&mut self) {
        if self.num_entries > (1usize << self.lg_nom_longs) {
            self.trim_theta();
        }
    }

    pub fn reset(&mut self) {
        let fresh = Self::new(
            self.lg_nom_longs,
            self.resize_factor,
            self.sampling_probability,
            self.seed,
        );
        *self = fresh;
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.slots.iter().copied().filter(|&h| h != 0)
    }

    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    pub fn theta(&self) -> u64 {
        self.theta
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn lg_nom_size(&self) -> u8 {
        self.lg_nom_longs
    }

    pub fn seed_hash(&self) -> u16 {
        self.seed_hash
    }
}
