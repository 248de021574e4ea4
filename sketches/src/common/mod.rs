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

//! Common types shared across sketch families.

pub mod binomial_bounds;

/// Number of standard deviations for confidence bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumStdDev {
    /// One standard deviation, roughly 68% confidence.
    One,
    /// Two standard deviations, roughly 95% confidence.
    Two,
    /// Three standard deviations, roughly 99% confidence.
    Three,
}

impl NumStdDev {
    pub(crate) fn value(self) -> f64 {
        match self {
            NumStdDev::One => 1.0,
            NumStdDev::Two => 2.0,
            NumStdDev::Three => 3.0,
        }
    }
}

/// Resize factor controlling how storage grows toward its target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFactor {
    /// No resizing; storage is allocated at full size up front.
    X1,
    /// Double on each resize.
    X2,
    /// Quadruple on each resize.
    X4,
    /// Grow by a factor of eight on each resize.
    X8,
}

impl ResizeFactor {
    /// Returns log2 of the growth multiple.
    pub fn lg(self) -> u8 {
        match self {
            ResizeFactor::X1 => 0,
            ResizeFactor::X2 => 1,
            ResizeFactor::X4 => 2,
            ResizeFactor::X8 => 3,
        }
    }

    pub(crate) fn from_lg(lg: u8) -> Option<Self> {
        match lg {
            0 => Some(ResizeFactor::X1),
            1 => Some(ResizeFactor::X2),
            2 => Some(ResizeFactor::X4),
            3 => Some(ResizeFactor::X8),
            _ => None,
        }
    }
}

/// Returns the canonical 64-bit image of a double for hashing.
///
/// Collapses -0.0 to +0.0 and all NaN payloads to the canonical NaN so that
/// numerically equal inputs hash identically.
pub fn canonical_double(value: f64) -> i64 {
    if value == 0.0 {
        return 0.0f64.to_bits() as i64;
    }
    if value.is_nan() {
        return f64::NAN.to_bits() as i64;
    }
    value.to_bits() as i64
}

/// Returns the smallest lg size that is a sub-multiple start for growing
/// storage by `lg_resize` steps toward `lg_target`, floored at `lg_min`.
pub(crate) fn starting_sub_multiple(lg_target: u8, lg_resize: u8, lg_min: u8) -> u8 {
    if lg_target <= lg_min {
        lg_min
    } else if lg_resize == 0 {
        lg_target
    } else {
        ((lg_target - lg_min) % lg_resize) + lg_min
    }
}
