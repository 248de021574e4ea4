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

//! Serialization constants and byte offsets for theta sketch images.

/// Serial version for theta images.
pub const SER_VER: u8 = 3;

/// Preamble longs for an updatable (hash table) image.
pub const PREAMBLE_LONGS_UPDATABLE: u8 = 3;
/// Preamble longs for an empty compact image.
pub const PREAMBLE_LONGS_COMPACT_MIN: u8 = 1;
/// Preamble longs for an exact-mode compact image.
pub const PREAMBLE_LONGS_COMPACT_EXACT: u8 = 2;
/// Preamble longs for an estimating compact image.
pub const PREAMBLE_LONGS_COMPACT_ESTIMATING: u8 = 3;

/// Offset of the preamble longs byte.
pub const PREAMBLE_LONGS_BYTE: usize = 0;
/// Offset of the serial version byte.
pub const SER_VER_BYTE: usize = 1;
/// Offset of the family id byte.
pub const FAMILY_BYTE: usize = 2;
/// Offset of the lg nominal longs byte (updatable images).
pub const LG_NOM_LONGS_BYTE: usize = 3;
/// Offset of the lg array longs byte (updatable images).
pub const LG_ARR_LONGS_BYTE: usize = 4;
/// Offset of the flags byte.
pub const FLAGS_BYTE: usize = 5;
/// Offset of the 16-bit seed hash.
pub const SEED_HASH_SHORT: usize = 6;
/// Offset of the retained entry count (preLongs >= 2).
pub const RETAINED_ENTRIES_INT: usize = 8;
/// Offset of the sampling probability p as f32 (preLongs >= 2).
pub const P_FLOAT: usize = 12;
/// Offset of theta (preLongs >= 3).
pub const THETA_LONG: usize = 16;
/// Offset of the hash array in an updatable image.
pub const HASHES_START: usize = 24;
