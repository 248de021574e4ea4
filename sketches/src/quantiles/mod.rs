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

//! Doubles quantiles sketch.
//!
//! The sketch answers quantile, rank, PMF and CDF queries over a stream of
//! doubles in space `O(k log(n/k))`. New items land in an unsorted base
//! buffer of 2k slots; a full base buffer is sorted, down-sampled to k items
//! by random parity, and carried into a hierarchy of k-item levels indexed
//! by the bits of `n / 2k`.
//!
//! [`DoublesSketch`] keeps its state on the heap; [`DirectDoublesSketch`]
//! keeps it in a caller-provided byte store and re-derives the base-buffer
//! count and bit pattern from n on every read.

mod direct;
mod query;
pub mod serialization;
mod sketch;
mod update_impl;
pub mod util;

pub use self::direct::DirectDoublesSketch;
pub use self::sketch::DoublesSketch;
pub use self::sketch::DoublesSketchBuilder;
pub use self::util::DEFAULT_K;
pub use self::util::MAX_K;
pub use self::util::MIN_K;
pub use self::util::normalized_rank_error;
