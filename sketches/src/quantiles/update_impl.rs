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

//! Carry propagation for the leveled buffer hierarchy.
//!
//! A full base buffer of 2k sorted items is zipped down to k items (random
//! parity keeps the estimate unbiased) and carried into the lowest vacant
//! level; every occupied level below it is merged in and zipped on the way.
//! The heap and store variants perform the identical sequence of zips so
//! that identical RNG seeds produce identical sketches.

use rand::Rng;
use rand::RngCore;

use crate::error::Error;
use crate::quantiles::serialization::COMBINED_BUFFER;
use crate::quantiles::util::lowest_zero_bit_starting_at;
use crate::store::ByteStore;

/// Down-samples the sorted 2k-item `src` into the k-item `dst` by taking
/// every other item starting from a random parity.
pub(crate) fn zip_buffer(src: &[f64], dst: &mut [f64], rng: &mut dyn RngCore) {
    debug_assert_eq!(src.len(), 2 * dst.len());
    let offset = usize::from(rng.gen::<bool>());
    for (i, slot) in dst.iter_mut().enumerate() {
        *slot = src[2 * i + offset];
    }
}

/// Merges two sorted k-item runs into a sorted 2k-item buffer.
pub(crate) fn merge_two_size_k_buffers(a: &[f64], b: &[f64], dst: &mut [f64]) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(dst.len(), a.len() + b.len());
    let mut ia = 0;
    let mut ib = 0;
    for slot in dst.iter_mut() {
        if ia < a.len() && (ib == b.len() || a[ia] <= b[ib]) {
            *slot = a[ia];
            ia += 1;
        } else {
            *slot = b[ib];
            ib += 1;
        }
    }
}

/// Propagates a full, sorted base buffer up the level hierarchy in place.
///
/// `combined` is the heap combined buffer: 2k base slots followed by k-item
/// levels; the base buffer must already be sorted. Returns the new bit
/// pattern (`bit_pattern + 1`).
pub(crate) fn in_place_propagate_carry(
    combined: &mut [f64],
    k: usize,
    bit_pattern: u64,
    rng: &mut dyn RngCore,
) -> u64 {
    let ending_level = lowest_zero_bit_starting_at(bit_pattern, 0) as usize;
    debug_assert!(combined.len() >= (3 + ending_level) * k);

    let mut carry = vec![0.0; k];
    zip_buffer(&combined[0..2 * k], &mut carry, rng);

    let mut scratch = vec![0.0; 2 * k];
    for lvl in 0..ending_level {
        let level = &combined[(2 + lvl) * k..(3 + lvl) * k];
        merge_two_size_k_buffers(level, &carry, &mut scratch);
        zip_buffer(&scratch, &mut carry, rng);
    }
    combined[(2 + ending_level) * k..(3 + ending_level) * k].copy_from_slice(&carry);
    bit_pattern + 1
}

/// Byte offset of level `lvl` in a serialized/direct image.
pub(crate) fn level_offset_bytes(k: usize, lvl: usize) -> usize {
    COMBINED_BUFFER + (2 + lvl) * k * 8
}

/// Store-backed twin of [`in_place_propagate_carry`].
///
/// The base buffer at the combined-buffer offset must already be sorted in
/// the store. Consumes the RNG in the same order as the heap variant.
pub(crate) fn propagate_carry_in_store(
    store: &mut dyn ByteStore,
    k: usize,
    bit_pattern: u64,
    rng: &mut dyn RngCore,
) -> Result<u64, Error> {
    let ending_level = lowest_zero_bit_starting_at(bit_pattern, 0) as usize;

    let base = store.read_f64_array(COMBINED_BUFFER, 2 * k)?;
    let mut carry = vec![0.0; k];
    zip_buffer(&base, &mut carry, rng);

    let mut scratch = vec![0.0; 2 * k];
    for lvl in 0..ending_level {
        let level = store.read_f64_array(level_offset_bytes(k, lvl), k)?;
        merge_two_size_k_buffers(&level, &carry, &mut scratch);
        zip_buffer(&scratch, &mut carry, rng);
    }
    store.write_f64_array(level_offset_bytes(k, ending_level), &carry)?;
    Ok(bit_pattern + 1)
}
