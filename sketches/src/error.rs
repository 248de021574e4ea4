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

//! Error type shared by all sketch families.
//!
//! The cores never log and never recover internally; every failure surfaces
//! to the caller as an [`Error`] with a classifying [`ErrorKind`].

use std::fmt;

/// Classification of sketch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A constructor or update argument is out of its documented range.
    InvalidParameter,
    /// A serialized image is inconsistent: bad family, unsupported serial
    /// version, reserved flag bits set, preamble out of range, or data that
    /// contradicts the preamble.
    Corruption,
    /// A byte store's capacity is below what the operation requires.
    BufferTooSmall,
    /// Two sketches carry different seed hashes.
    SeedMismatch,
    /// A counter reached its representable maximum; further updates refused.
    CapacityExceeded,
    /// The requested mode is not supported for this image, e.g. wrapping a
    /// compact image as a mutable direct sketch.
    NotSupported,
}

/// Error returned by sketch operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, message)
    }

    /// Corruption detected while deserializing or wrapping an image.
    pub(crate) fn deserial(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corruption, message)
    }

    pub(crate) fn insufficient_data(tag: &'static str) -> Self {
        Self::new(
            ErrorKind::Corruption,
            format!("insufficient data reading {tag}"),
        )
    }

    pub(crate) fn invalid_preamble_longs(expected: &[u8], actual: u8) -> Self {
        Self::new(
            ErrorKind::Corruption,
            format!("invalid preamble longs: expected one of {expected:?}, got {actual}"),
        )
    }

    pub(crate) fn buffer_too_small(required: usize, capacity: usize) -> Self {
        Self::new(
            ErrorKind::BufferTooSmall,
            format!("byte store capacity too small: need {required} bytes, have {capacity}"),
        )
    }

    pub(crate) fn seed_mismatch(expected: u16, actual: u16) -> Self {
        Self::new(
            ErrorKind::SeedMismatch,
            format!("incompatible seed hash: expected {expected}, got {actual}"),
        )
    }

    pub(crate) fn capacity_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CapacityExceeded, message)
    }

    pub(crate) fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported, message)
    }

    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_messages_survive_construction() {
        let err = Error::buffer_too_small(64, 16);
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
        assert!(err.message().contains("need 64"));

        let err = Error::seed_mismatch(1, 2);
        assert_eq!(err.kind(), ErrorKind::SeedMismatch);

        let err = Error::invalid_preamble_longs(&[1, 2, 3], 9);
        assert_eq!(err.kind(), ErrorKind::Corruption);
        assert!(err.message().contains("got 9"));
    }
}
