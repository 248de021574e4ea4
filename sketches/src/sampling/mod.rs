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

//! Weighted sampling sketches.
//!
//! [`VarOptItemsSketch`] maintains a variance-optimal weighted sample of at
//! most k items: subset-sum estimates built from the sample and its
//! effective weights are unbiased with provably minimal variance.

pub mod serde;
pub mod serialization;
mod varopt;

pub use self::serde::ArrayOfI64SerDe;
pub use self::serde::ArrayOfItemsSerDe;
pub use self::serde::ArrayOfStringsSerDe;
pub use self::varopt::VarOptItemsSketch;
