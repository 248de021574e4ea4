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

//! Serialization constants and the shared image writer/reader for doubles
//! quantiles sketches.
//!
//! Both the heap and the direct variant produce images through
//! [`write_image`], which is what makes their serialized output
//! byte-identical for identical state.

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::assert::ensure_empty_consistent_with_n;
use crate::codec::assert::ensure_preamble_longs_in;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::assert::insufficient_data;
use crate::codec::family::Family;
use crate::codec::flags;
use crate::error::Error;
use crate::quantiles::util;

/// Serial version for quantiles images.
pub const SER_VER: u8 = 3;

/// Preamble longs for an empty image.
pub const PREAMBLE_LONGS_EMPTY: u8 = 1;
/// Preamble longs for a non-empty image.
pub const PREAMBLE_LONGS_NONEMPTY: u8 = 2;

/// Offset of the preamble longs byte.
pub const PREAMBLE_LONGS_BYTE: usize = 0;
/// Offset of the serial version byte.
pub const SER_VER_BYTE: usize = 1;
/// Offset of the family id byte.
pub const FAMILY_BYTE: usize = 2;
/// Offset of the flags byte.
pub const FLAGS_BYTE: usize = 3;
/// Offset of k as u16.
pub const K_SHORT: usize = 4;
/// Offset of n as u64 (preLongs = 2).
pub const N_LONG: usize = 8;
/// Offset of the minimum value.
pub const MIN_DOUBLE: usize = 16;
/// Offset of the maximum value.
pub const MAX_DOUBLE: usize = 24;
/// Offset of the combined buffer.
pub const COMBINED_BUFFER: usize = 32;

/// Serializes quantiles sketch state into an image.
///
/// `combined` must cover the full derived item capacity for `n`. The compact
/// form stores the sorted base-buffer items followed by the occupied levels;
/// the updatable form stores the whole combined buffer.
pub(crate) fn write_image(
    k: u16,
    n: u64,
    min_value: f64,
    max_value: f64,
    combined: &[f64],
    compact: bool,
) -> Vec<u8> {
    let empty = n == 0;
    let pre_longs = if empty {
        PREAMBLE_LONGS_EMPTY
    } else {
        PREAMBLE_LONGS_NONEMPTY
    };

    let mut flag_bits = 0u8;
    if empty {
        flag_bits |= flags::FLAG_EMPTY;
    }
    if compact {
        flag_bits |= flags::FLAG_COMPACT | flags::FLAG_READ_ONLY | flags::FLAG_ORDERED;
    }

    let mut bytes = SketchBytes::with_capacity(COMBINED_BUFFER + combined.len() * 8);
    bytes.write_u8(pre_longs);
    bytes.write_u8(SER_VER);
    bytes.write_u8(Family::QUANTILES.id);
    bytes.write_u8(flag_bits);
    bytes.write_u16_le(k);
    bytes.write_u16_le(0); // bytes 6-7 unused

    if empty {
        return bytes.into_bytes();
    }

    bytes.write_u64_le(n);
    bytes.write_f64_le(min_value);
    bytes.write_f64_le(max_value);

    if compact {
        let bb_count = util::base_buffer_items(k, n);
        let mut base: Vec<f64> = combined[..bb_count].to_vec();
        base.sort_unstable_by(f64::total_cmp);
        for value in base {
            bytes.write_f64_le(value);
        }
        let pattern = util::bit_pattern(k, n);
        for lvl in 0..util::num_levels_needed(k, n) {
            if (pattern >> lvl) & 1 == 1 {
                let start = (2 + lvl as usize) * k as usize;
                for &value in &combined[start..start + k as usize] {
                    bytes.write_f64_le(value);
                }
            }
        }
    } else {
        let capacity = util::combined_buffer_item_capacity(k, n);
        for &value in &combined[..capacity] {
            bytes.write_f64_le(value);
        }
    }
    bytes.into_bytes()
}

/// State recovered from a serialized quantiles image.
pub(crate) struct ImageState {
    pub k: u16,
    pub n: u64,
    pub min_value: f64,
    pub max_value: f64,
    /// Combined buffer restored to the full updatable layout.
    pub combined: Vec<f64>,
}

/// Parses a compact or updatable quantiles image.
pub(crate) fn read_image(bytes: &[u8]) -> Result<ImageState, Error> {
    let mut cursor = SketchSlice::new(bytes);
    let pre_longs = cursor
        .read_u8()
        .map_err(insufficient_data("preamble_longs"))?;
    let ser_ver = cursor
        .read_u8()
        .map_err(insufficient_data("serial_version"))?;
    let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;
    let flag_bits = cursor.read_u8().map_err(insufficient_data("flags"))?;
    let k = cursor.read_u16_le().map_err(insufficient_data("k"))?;
    cursor
        .read_u16_le()
        .map_err(insufficient_data("<unused>"))?;

    Family::QUANTILES.validate_id(family_id)?;
    ensure_serial_version_is(SER_VER, ser_ver)?;
    ensure_preamble_longs_in(&[PREAMBLE_LONGS_EMPTY, PREAMBLE_LONGS_NONEMPTY], pre_longs)?;
    flags::ensure_flags_valid(flag_bits)?;
    util::check_k(k).map_err(|e| Error::deserial(format!("corrupted: {}", e.message())))?;

    let empty = flag_bits & flags::FLAG_EMPTY != 0;
    if empty || pre_longs == PREAMBLE_LONGS_EMPTY {
        ensure_empty_consistent_with_n(empty, 0)?;
        if !empty {
            return Err(Error::deserial(
                "corrupted: one preamble long but empty flag not set",
            ));
        }
        return Ok(ImageState {
            k,
            n: 0,
            min_value: f64::INFINITY,
            max_value: f64::NEG_INFINITY,
            combined: vec![0.0; 2 * k as usize],
        });
    }

    let n = cursor.read_u64_le().map_err(insufficient_data("n"))?;
    ensure_empty_consistent_with_n(empty, n)?;
    if n == 0 {
        return Err(Error::deserial(
            "corrupted: non-empty image with n = 0",
        ));
    }
    let min_value = cursor
        .read_f64_le()
        .map_err(insufficient_data("min_value"))?;
    let max_value = cursor
        .read_f64_le()
        .map_err(insufficient_data("max_value"))?;

    let capacity = util::combined_buffer_item_capacity(k, n);
    let mut combined = vec![0.0; capacity];
    let bb_count = util::base_buffer_items(k, n);

    if flag_bits & flags::FLAG_COMPACT != 0 {
        for slot in combined.iter_mut().take(bb_count) {
            *slot = cursor
                .read_f64_le()
                .map_err(insufficient_data("base_buffer"))?;
        }
        let pattern = util::bit_pattern(k, n);
        for lvl in 0..util::num_levels_needed(k, n) {
            if (pattern >> lvl) & 1 == 1 {
                let start = (2 + lvl as usize) * k as usize;
                for slot in combined.iter_mut().skip(start).take(k as usize) {
                    *slot = cursor
                        .read_f64_le()
                        .map_err(insufficient_data("level_buffer"))?;
                }
            }
        }
    } else {
        for slot in combined.iter_mut() {
            *slot = cursor
                .read_f64_le()
                .map_err(insufficient_data("combined_buffer"))?;
        }
    }

    Ok(ImageState {
        k,
        n,
        min_value,
        max_value,
        combined,
    })
}
