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

//! Theta sketch implementation for cardinality estimation.
//!
//! A theta sketch keeps the hashed values that fall below a retention
//! threshold theta. While theta is at its maximum the sketch is exact; once
//! the hash table reaches its nominal size, theta is trimmed to the (k+1)-th
//! smallest retained hash and the retained count divided by the theta
//! fraction estimates the stream cardinality.
//!
//! Three forms are provided:
//!
//! - [`ThetaSketch`]: mutable, heap-resident.
//! - [`DirectThetaSketch`]: mutable, with all state in a caller-provided
//!   [`crate::store::ByteStore`].
//! - [`CompactThetaSketch`]: immutable, the serialized-friendly form.

mod direct;
mod hash_table;
pub mod serialization;
mod sketch;

pub use self::direct::DirectThetaSketch;
pub use self::hash_table::DEFAULT_LG_NOM_LONGS;
pub use self::hash_table::MAX_LG_NOM_LONGS;
pub use self::hash_table::MAX_THETA;
pub use self::hash_table::MIN_LG_NOM_LONGS;
pub use self::sketch::CompactThetaSketch;
pub use self::sketch::ThetaSketch;
pub use self::sketch::ThetaSketchBuilder;

/// Outcome of presenting one hash to an updatable theta sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The hash was zero, which cannot be stored.
    RejectedNull,
    /// The hash was at or above theta and was discarded.
    RejectedOverTheta,
    /// The hash was inserted and the retained count grew.
    InsertedCountIncremented,
    /// The hash was inserted, but the rebuild it triggered trimmed it back
    /// out, so the net retained count did not grow.
    InsertedCountNotIncremented,
    /// The hash was already retained.
    RejectedDuplicate,
}
