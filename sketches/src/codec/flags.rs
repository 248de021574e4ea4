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

//! Flags bitfield shared by all serialized sketch forms (byte 3 of the
//! preamble). Bit 0 (big-endian) must always be clear: images are
//! little-endian only.

pub(crate) const FLAG_BIG_ENDIAN: u8 = 1;
pub(crate) const FLAG_READ_ONLY: u8 = 2;
pub(crate) const FLAG_EMPTY: u8 = 4;
pub(crate) const FLAG_COMPACT: u8 = 8;
pub(crate) const FLAG_ORDERED: u8 = 16;

use crate::error::Error;

/// Rejects flag bytes with the big-endian bit or any reserved bit set.
pub(crate) fn ensure_flags_valid(flags: u8) -> Result<(), Error> {
    let known = FLAG_BIG_ENDIAN | FLAG_READ_ONLY | FLAG_EMPTY | FLAG_COMPACT | FLAG_ORDERED;
    if flags & FLAG_BIG_ENDIAN != 0 {
        return Err(Error::deserial(
            "corrupted: big-endian flag set; images must be little-endian",
        ));
    }
    if flags & !known != 0 {
        return Err(Error::deserial(format!(
            "corrupted: reserved flag bits set: {flags:#010b}"
        )));
    }
    Ok(())
}
