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

//! Sketch family descriptors (byte 2 of the preamble).

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Family {
    pub name: &'static str,
    pub id: u8,
}

impl Family {
    /// Updatable theta sketch with quick-select theta trimming.
    pub const QUICK_SELECT: Family = Family {
        name: "QuickSelect",
        id: 2,
    };

    /// Compact (immutable) theta sketch.
    pub const COMPACT: Family = Family {
        name: "Compact",
        id: 3,
    };

    /// Doubles quantiles sketch.
    pub const QUANTILES: Family = Family {
        name: "Quantiles",
        id: 8,
    };

    /// Weighted sampling reservoir (VarOpt).
    pub const RESERVOIR: Family = Family {
        name: "Reservoir",
        id: 12,
    };

    pub fn validate_id(&self, actual: u8) -> Result<(), Error> {
        if self.id == actual {
            Ok(())
        } else {
            Err(Error::deserial(format!(
                "invalid family id: expected {} ({}), got {actual}",
                self.id, self.name
            )))
        }
    }
}
