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

//! Streaming sketch cores: compact probabilistic summaries of large data
//! streams answering cardinality, quantile, and weighted-sampling queries
//! in sublinear space.
//!
//! # Sketch families
//!
//! - [`theta`]: distinct-count estimation with a dynamically adjusting
//!   retention threshold.
//! - [`quantiles`]: quantile, rank, PMF and CDF queries over streams of
//!   doubles via the leveled-buffer algorithm.
//! - [`sampling`]: variance-optimal (VarOpt) weighted reservoir sampling.
//!
//! The theta and quantiles families come in heap-resident and *direct*
//! flavors; a direct sketch keeps every piece of its state in a
//! caller-provided [`store::ByteStore`] and grows it through a callback.
//! All sketches are single-threaded and never log; failures surface as
//! [`error::Error`] values.
//!
//! # Example
//!
//! ```
//! use sketches::theta::ThetaSketch;
//!
//! let mut sketch = ThetaSketch::builder().lg_k(12).build();
//! for i in 0..10_000 {
//!     sketch.update(i);
//! }
//! let estimate = sketch.estimate();
//! assert!(estimate > 9_000.0 && estimate < 11_000.0);
//! ```

pub mod common;
pub mod error;
pub mod hash;
pub mod quantiles;
pub mod sampling;
pub mod store;
pub mod theta;

mod codec;
