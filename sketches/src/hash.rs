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

//! MurmurHash3 x64-128 and seed-hash helpers.

use std::hash::Hasher;

/// Default update seed shared by sketches that hash their input.
pub const DEFAULT_UPDATE_SEED: u64 = 9001;

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

/// Computes the 128-bit MurmurHash3 (x64 variant) of `bytes` with `seed`.
pub fn murmur3_x64_128(bytes: &[u8], seed: u64) -> (u64, u64) {
    let mut h1 = seed;
    let mut h2 = seed;
    let len = bytes.len();
    let n_blocks = len / 16;

    for i in 0..n_blocks {
        let off = i * 16;
        let k1 = u64::from_le_bytes(bytes[off..off + 8].try_into().expect("block k1"));
        let k2 = u64::from_le_bytes(bytes[off + 8..off + 16].try_into().expect("block k2"));

        h1 ^= mix_k1(k1);
        h1 = h1.rotate_left(27).wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        h2 ^= mix_k2(k2);
        h2 = h2.rotate_left(31).wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = &bytes[n_blocks * 16..];
    let mut k1 = 0u64;
    let mut k2 = 0u64;
    for (i, &b) in tail.iter().enumerate() {
        if i < 8 {
            k1 |= (b as u64) << (8 * i);
        } else {
            k2 |= (b as u64) << (8 * (i - 8));
        }
    }
    if !tail.is_empty() {
        h1 ^= mix_k1(k1);
        if tail.len() > 8 {
            h2 ^= mix_k2(k2);
        }
    }

    h1 ^= len as u64;
    h2 ^= len as u64;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    (h1, h2)
}

#[inline]
fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

#[inline]
fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// MurmurHash3 x64-128 exposed as a [`std::hash::Hasher`].
///
/// Bytes written through the `Hasher` interface are buffered and hashed in
/// one pass on `finish`, which returns the first 64 bits of the 128-bit
/// result. Not a streaming hasher; intended for single values.
#[derive(Debug, Clone)]
pub struct MurmurHash3X64128 {
    buffer: Vec<u8>,
    seed: u64,
}

impl MurmurHash3X64128 {
    /// Creates a hasher with an explicit seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            buffer: Vec::with_capacity(16),
            seed,
        }
    }
}

impl Default for MurmurHash3X64128 {
    fn default() -> Self {
        Self::with_seed(DEFAULT_UPDATE_SEED)
    }
}

impl Hasher for MurmurHash3X64128 {
    fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    // Integer writes are pinned to little-endian so hashes are identical
    // across platforms.
    fn write_u16(&mut self, i: u16) {
        self.write(&i.to_le_bytes());
    }

    fn write_u32(&mut self, i: u32) {
        self.write(&i.to_le_bytes());
    }

    fn write_u64(&mut self, i: u64) {
        self.write(&i.to_le_bytes());
    }

    fn write_i64(&mut self, i: i64) {
        self.write(&i.to_le_bytes());
    }

    fn write_usize(&mut self, i: usize) {
        self.write(&(i as u64).to_le_bytes());
    }

    fn finish(&self) -> u64 {
        murmur3_x64_128(&self.buffer, self.seed).0
    }
}

/// Computes the 16-bit seed hash identifying a seed on the wire.
///
/// # Panics
///
/// Panics if the seed hashes to 0, which cannot be represented in serialized
/// images; choose a different seed.
pub fn compute_seed_hash(seed: u64) -> u16 {
    let (h1, _) = murmur3_x64_128(&seed.to_le_bytes(), 0);
    let seed_hash = (h1 & 0xFFFF) as u16;
    assert!(
        seed_hash != 0,
        "the given seed {seed} hashes to zero and cannot be used; choose a different seed"
    );
    seed_hash
}
