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

//! Confidence bounds for theta estimators.
//!
//! The retained count of a theta sketch is binomially distributed with
//! success probability theta. The bounds here use the normal approximation
//! on that count, which is the standard regime for the retained sizes theta
//! sketches operate at.

use crate::common::NumStdDev;
use crate::error::Error;

/// Returns the approximate lower bound on the true cardinality.
///
/// `num_retained` is the retained entry count and `theta` the sampling
/// fraction in (0, 1]. The bound never falls below `num_retained`.
pub fn lower_bound(num_retained: u64, theta: f64, num_std_dev: NumStdDev) -> Result<f64, Error> {
    check_theta(theta)?;
    let n = num_retained as f64;
    let estimate = n / theta;
    let sd = (n * (1.0 - theta)).sqrt() / theta;
    Ok((estimate - num_std_dev.value() * sd).max(n))
}

/// Returns the approximate upper bound on the true cardinality.
///
/// An empty sketch has seen nothing, so its upper bound is zero.
pub fn upper_bound(
    num_retained: u64,
    theta: f64,
    num_std_dev: NumStdDev,
    empty: bool,
) -> Result<f64, Error> {
    check_theta(theta)?;
    if empty {
        return Ok(0.0);
    }
    let n = num_retained as f64;
    let estimate = n / theta;
    let sd = (n * (1.0 - theta)).sqrt() / theta;
    Ok(estimate + num_std_dev.value() * sd)
}

fn check_theta(theta: f64) -> Result<(), Error> {
    if theta > 0.0 && theta <= 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_parameter(format!(
            "theta must be in (0.0, 1.0], got {theta}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_bracket_the_estimate() {
        let n = 4096u64;
        let theta = 0.125;
        let estimate = n as f64 / theta;
        let lb = lower_bound(n, theta, NumStdDev::Two).unwrap();
        let ub = upper_bound(n, theta, NumStdDev::Two, false).unwrap();
        assert!(lb <= estimate);
        assert!(estimate <= ub);
        assert!(lb >= n as f64);
    }

    #[test]
    fn exact_mode_collapses_bounds() {
        let lb = lower_bound(100, 1.0, NumStdDev::Three).unwrap();
        let ub = upper_bound(100, 1.0, NumStdDev::Three, false).unwrap();
        assert_eq!(lb, 100.0);
        assert_eq!(ub, 100.0);
    }

    #[test]
    fn empty_upper_bound_is_zero() {
        assert_eq!(upper_bound(0, 0.5, NumStdDev::Two, true).unwrap(), 0.0);
    }

    #[test]
    fn invalid_theta_is_rejected() {
        assert!(lower_bound(10, 0.0, NumStdDev::One).is_err());
        assert!(lower_bound(10, 1.5, NumStdDev::One).is_err());
    }
}
