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

//! Serialization constants for the weighted-sampling reservoir family.

/// Serial version for reservoir images.
pub const SER_VER: u8 = 3;

/// Preamble longs for an empty image.
pub const PREAMBLE_LONGS_EMPTY: u8 = 1;
/// Preamble longs during warmup (all items carry explicit weights).
pub const PREAMBLE_LONGS_WARMUP: u8 = 2;
/// Preamble longs in steady state (H/R split plus the R region weight).
pub const PREAMBLE_LONGS_FULL: u8 = 4;

/// Offset of the preamble longs byte; the resize factor lg rides in the top
/// two bits.
pub const PREAMBLE_LONGS_BYTE: usize = 0;
/// Offset of the serial version byte.
pub const SER_VER_BYTE: usize = 1;
/// Offset of the family id byte.
pub const FAMILY_BYTE: usize = 2;
/// Offset of the flags byte.
pub const FLAGS_BYTE: usize = 3;
/// Offset of k as u32.
pub const K_INT: usize = 4;
/// Offset of the items-seen count (48 bits of the second preamble long).
pub const ITEMS_SEEN_LONG: usize = 8;
/// Offset of the heap region count (preLongs = 4).
pub const H_COUNT_INT: usize = 16;
/// Offset of the reservoir region count (preLongs = 4).
pub const R_COUNT_INT: usize = 20;
/// Offset of the total weight in the reservoir region (preLongs = 4).
pub const TOTAL_WT_R_DOUBLE: usize = 24;

/// Largest representable items-seen count (48 bits).
pub const MAX_ITEMS_SEEN: u64 = 0xFFFF_FFFF_FFFF;
