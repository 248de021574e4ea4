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

//! Caller-provided byte storage for direct-mode sketches.
//!
//! A [`ByteStore`] is a random-access byte region with typed little-endian
//! accessors and a growth request. Direct sketches keep every piece of their
//! state in such a store, so a sketch image in the store is always a valid
//! serialized form. Growth consumes the old store and returns a new one; the
//! old handle must not be used afterward, which the consuming `Box<Self>`
//! receiver enforces at compile time.

use crate::error::Error;

/// Random-access little-endian byte region with typed accessors.
///
/// Out-of-range accesses fail with [`ErrorKind::BufferTooSmall`]
/// (`crate::error::ErrorKind`). Implementations may alias externally shared
/// regions; the sketch assumes exclusive write access for its lifetime.
pub trait ByteStore {
    /// Returns the store capacity in bytes.
    fn capacity(&self) -> usize;

    fn read_u8(&self, offset: usize) -> Result<u8, Error>;
    fn read_u16(&self, offset: usize) -> Result<u16, Error>;
    fn read_u32(&self, offset: usize) -> Result<u32, Error>;
    fn read_u64(&self, offset: usize) -> Result<u64, Error>;
    fn read_f32(&self, offset: usize) -> Result<f32, Error>;
    fn read_f64(&self, offset: usize) -> Result<f64, Error>;

    fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), Error>;
    fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), Error>;
    fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), Error>;
    fn write_u64(&mut self, offset: usize, value: u64) -> Result<(), Error>;
    fn write_f32(&mut self, offset: usize, value: f32) -> Result<(), Error>;
    fn write_f64(&mut self, offset: usize, value: f64) -> Result<(), Error>;

    /// Reads `len` doubles starting at `offset`.
    fn read_f64_array(&self, offset: usize, len: usize) -> Result<Vec<f64>, Error> {
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(self.read_f64(offset + i * 8)?);
        }
        Ok(out)
    }

    /// Writes `values` starting at `offset`.
    fn write_f64_array(&mut self, offset: usize, values: &[f64]) -> Result<(), Error> {
        for (i, &value) in values.iter().enumerate() {
            self.write_f64(offset + i * 8, value)?;
        }
        Ok(())
    }

    /// Reads `len` longs starting at `offset`.
    fn read_u64_array(&self, offset: usize, len: usize) -> Result<Vec<u64>, Error> {
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(self.read_u64(offset + i * 8)?);
        }
        Ok(out)
    }

    /// Writes `values` starting at `offset`.
    fn write_u64_array(&mut self, offset: usize, values: &[u64]) -> Result<(), Error> {
        for (i, &value) in values.iter().enumerate() {
            self.write_u64(offset + i * 8, value)?;
        }
        Ok(())
    }

    /// Requests a store of at least `new_bytes` capacity, consuming this one.
    ///
    /// When `copy_existing` is set, the returned store holds this store's
    /// bytes as a prefix; otherwise its content is unspecified apart from
    /// being addressable. Fails with `BufferTooSmall` when the store cannot
    /// grow.
    fn request_grow(
        self: Box<Self>,
        new_bytes: usize,
        copy_existing: bool,
    ) -> Result<Box<dyn ByteStore>, Error>;
}

/// Heap-allocated [`ByteStore`].
///
/// The growable flavor reallocates on `request_grow`; the fixed flavor
/// refuses growth, which models a caller-provided region that cannot be
/// extended.
#[derive(Debug, Clone)]
pub struct HeapByteStore {
    bytes: Vec<u8>,
    growable: bool,
}

impl HeapByteStore {
    /// Creates a growable zero-filled store of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
            growable: true,
        }
    }

    /// Creates a fixed-capacity zero-filled store; `request_grow` fails.
    pub fn fixed(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
            growable: false,
        }
    }

    /// Wraps existing bytes in a store.
    pub fn from_vec(bytes: Vec<u8>, growable: bool) -> Self {
        Self { bytes, growable }
    }

    /// Returns the raw content, e.g. for snapshotting a sketch image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check(&self, offset: usize, len: usize) -> Result<(), Error> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::buffer_too_small(usize::MAX, self.bytes.len()))?;
        if end > self.bytes.len() {
            return Err(Error::buffer_too_small(end, self.bytes.len()));
        }
        Ok(())
    }
}

macro_rules! impl_accessors {
    ($read:ident, $write:ident, $ty:ty, $len:expr) => {
        fn $read(&self, offset: usize) -> Result<$ty, Error> {
            self.check(offset, $len)?;
            let raw: [u8; $len] = self.bytes[offset..offset + $len]
                .try_into()
                .expect("checked length");
            Ok(<$ty>::from_le_bytes(raw))
        }

        fn $write(&mut self, offset: usize, value: $ty) -> Result<(), Error> {
            self.check(offset, $len)?;
            self.bytes[offset..offset + $len].copy_from_slice(&value.to_le_bytes());
            Ok(())
        }
    };
}

impl ByteStore for HeapByteStore {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    impl_accessors!(read_u8, write_u8, u8, 1);
    impl_accessors!(read_u16, write_u16, u16, 2);
    impl_accessors!(read_u32, write_u32, u32, 4);
    impl_accessors!(read_u64, write_u64, u64, 8);
    impl_accessors!(read_f32, write_f32, f32, 4);
    impl_accessors!(read_f64, write_f64, f64, 8);

    fn request_grow(
        mut self: Box<Self>,
        new_bytes: usize,
        copy_existing: bool,
    ) -> Result<Box<dyn ByteStore>, Error> {
        if new_bytes <= self.bytes.len() {
            return Ok(self);
        }
        if !self.growable {
            return Err(Error::buffer_too_small(new_bytes, self.bytes.len()));
        }
        if copy_existing {
            self.bytes.resize(new_bytes, 0);
        } else {
            self.bytes = vec![0; new_bytes];
        }
        Ok(self)
    }
}
