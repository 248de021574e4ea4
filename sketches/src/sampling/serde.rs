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

//! Item array serialization for sampling sketches.
//!
//! Sampling sketches are generic in their item type, so the byte form of the
//! item payload is delegated to a caller-supplied [`ArrayOfItemsSerDe`].
//! Implementations for `i64` and `String` items are provided.

use std::str;

use crate::error::Error;

/// Serializes and deserializes arrays of items of a user type.
pub trait ArrayOfItemsSerDe<T> {
    /// Serializes `items` into a byte payload.
    fn serialize(&self, items: &[T]) -> Vec<u8>;

    /// Deserializes `num_items` items from the front of `bytes`, returning
    /// the items and the number of bytes consumed.
    fn deserialize(&self, bytes: &[u8], num_items: usize) -> Result<(Vec<T>, usize), Error>;
}

/// Fixed-width little-endian codec for `i64` items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayOfI64SerDe;

impl ArrayOfItemsSerDe<i64> for ArrayOfI64SerDe {
    fn serialize(&self, items: &[i64]) -> Vec<u8> {
        let mut out = Vec::with_capacity(items.len() * 8);
        for item in items {
            out.extend_from_slice(&item.to_le_bytes());
        }
        out
    }

    fn deserialize(&self, bytes: &[u8], num_items: usize) -> Result<(Vec<i64>, usize), Error> {
        let needed = num_items
            .checked_mul(8)
            .ok_or_else(|| Error::deserial("items size overflow"))?;
        if bytes.len() < needed {
            return Err(Error::insufficient_data("i64 items"));
        }
        let mut items = Vec::with_capacity(num_items);
        for i in 0..num_items {
            let offset = i * 8;
            let raw: [u8; 8] = bytes[offset..offset + 8].try_into().expect("i64 item");
            items.push(i64::from_le_bytes(raw));
        }
        Ok((items, needed))
    }
}

/// Length-prefixed UTF-8 codec for `String` items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayOfStringsSerDe;

impl ArrayOfItemsSerDe<String> for ArrayOfStringsSerDe {
    fn serialize(&self, items: &[String]) -> Vec<u8> {
        let total_len: usize = items.iter().map(|item| 4 + item.len()).sum();
        let mut out = Vec::with_capacity(total_len);
        for item in items {
            let bytes = item.as_bytes();
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        out
    }

    fn deserialize(&self, bytes: &[u8], num_items: usize) -> Result<(Vec<String>, usize), Error> {
        let mut items = Vec::with_capacity(num_items);
        let mut offset = 0usize;
        for _ in 0..num_items {
            if offset + 4 > bytes.len() {
                return Err(Error::insufficient_data("string length"));
            }
            let raw: [u8; 4] = bytes[offset..offset + 4].try_into().expect("string length");
            let len = u32::from_le_bytes(raw) as usize;
            offset += 4;
            if offset + len > bytes.len() {
                return Err(Error::insufficient_data("string payload"));
            }
            let value = match str::from_utf8(&bytes[offset..offset + len]) {
                Ok(s) => s.to_string(),
                Err(_) => return Err(Error::deserial("invalid UTF-8 string payload")),
            };
            items.push(value);
            offset += len;
        }
        Ok((items, offset))
    }
}
