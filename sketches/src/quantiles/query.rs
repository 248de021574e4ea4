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

//! Query evaluation over the weighted empirical distribution of a quantiles
//! sketch.
//!
//! Each base-buffer item carries weight 1 and each level-`l` item carries
//! weight `2^(l+1)`; the weights of all retained items sum to `n`. Both the
//! heap and the direct variant build the same sorted view and evaluate
//! queries against it.

use crate::error::Error;
use crate::quantiles::util;

/// Retained items with their weights, sorted ascending by value.
pub(crate) fn sorted_view(k: u16, n: u64, combined: &[f64]) -> Vec<(f64, u64)> {
    let bb_count = util::base_buffer_items(k, n);
    let pattern = util::bit_pattern(k, n);
    let mut view: Vec<(f64, u64)> = Vec::with_capacity(util::total_retained(k, n));
    for &value in &combined[..bb_count] {
        view.push((value, 1));
    }
    for lvl in 0..util::num_levels_needed(k, n) {
        if (pattern >> lvl) & 1 == 1 {
            let weight = 1u64 << (lvl + 1);
            let start = (2 + lvl as usize) * k as usize;
            for &value in &combined[start..start + k as usize] {
                view.push((value, weight));
            }
        }
    }
    view.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    view
}

/// Returns the value at normalized rank `rank`.
pub(crate) fn quantile(
    view: &[(f64, u64)],
    n: u64,
    min_value: f64,
    max_value: f64,
    rank: f64,
) -> Result<f64, Error> {
    if !(0.0..=1.0).contains(&rank) {
        return Err(Error::invalid_parameter(format!(
            "rank must be in [0.0, 1.0], got {rank}"
        )));
    }
    ensure_nonempty(n)?;
    if rank == 0.0 {
        return Ok(min_value);
    }
    if rank == 1.0 {
        return Ok(max_value);
    }
    let target = rank * n as f64;
    let mut cumulative = 0u64;
    for &(value, weight) in view {
        cumulative += weight;
        if cumulative as f64 > target {
            return Ok(value);
        }
    }
    Ok(max_value)
}

/// Returns the normalized rank of `value`: the weight fraction of retained
/// items below it.
pub(crate) fn rank(view: &[(f64, u64)], n: u64, value: f64) -> Result<f64, Error> {
    if value.is_nan() {
        return Err(Error::invalid_parameter("rank query value must not be NaN"));
    }
    ensure_nonempty(n)?;
    let mut below = 0u64;
    for &(item, weight) in view {
        if item < value {
            below += weight;
        } else {
            break;
        }
    }
    Ok(below as f64 / n as f64)
}

/// Returns the cumulative distribution at each split point, plus a final 1.0.
pub(crate) fn cdf(view: &[(f64, u64)], n: u64, splits: &[f64]) -> Result<Vec<f64>, Error> {
    check_splits(splits)?;
    ensure_nonempty(n)?;
    let mut out = Vec::with_capacity(splits.len() + 1);
    let mut below = 0u64;
    let mut index = 0usize;
    for &split in splits {
        while index < view.len() && view[index].0 < split {
            below += view[index].1;
            index += 1;
        }
        out.push(below as f64 / n as f64);
    }
    out.push(1.0);
    Ok(out)
}

/// Returns the probability mass between consecutive split points.
pub(crate) fn pmf(view: &[(f64, u64)], n: u64, splits: &[f64]) -> Result<Vec<f64>, Error> {
    let cumulative = cdf(view, n, splits)?;
    let mut out = Vec::with_capacity(cumulative.len());
    let mut previous = 0.0;
    for mass in cumulative {
        out.push(mass - previous);
        previous = mass;
    }
    Ok(out)
}

fn ensure_nonempty(n: u64) -> Result<(), Error> {
    if n == 0 {
        Err(Error::invalid_parameter(
            "the sketch is empty and has no distribution to query",
        ))
    } else {
        Ok(())
    }
}

fn check_splits(splits: &[f64]) -> Result<(), Error> {
    for pair in splits.windows(2) {
        if !(pair[0] < pair[1]) {
            return Err(Error::invalid_parameter(
                "split points must be strictly increasing",
            ));
        }
    }
    if splits.iter().any(|s| s.is_nan()) {
        return Err(Error::invalid_parameter("split points must not be NaN"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // view over 4 items of weight 1: {1, 2, 3, 4}
    fn small_view() -> Vec<(f64, u64)> {
        vec![(1.0, 1), (2.0, 1), (3.0, 1), (4.0, 1)]
    }

    #[test]
    fn quantile_endpoints_are_exact() {
        let view = small_view();
        assert_eq!(quantile(&view, 4, 1.0, 4.0, 0.0).unwrap(), 1.0);
        assert_eq!(quantile(&view, 4, 1.0, 4.0, 1.0).unwrap(), 4.0);
    }

    #[test]
    fn quantile_is_monotone_in_rank() {
        let view = small_view();
        let mut previous = f64::NEG_INFINITY;
        for i in 0..=100 {
            let rank = i as f64 / 100.0;
            let q = quantile(&view, 4, 1.0, 4.0, rank).unwrap();
            assert!(q >= previous);
            previous = q;
        }
    }

    #[test]
    fn rank_counts_weight_below() {
        let view = small_view();
        assert_eq!(rank(&view, 4, 1.0).unwrap(), 0.0);
        assert_eq!(rank(&view, 4, 2.5).unwrap(), 0.5);
        assert_eq!(rank(&view, 4, 100.0).unwrap(), 1.0);
    }

    #[test]
    fn cdf_and_pmf_sum_to_one() {
        let view = small_view();
        let splits = [1.5, 3.5];
        let cumulative = cdf(&view, 4, &splits).unwrap();
        assert_eq!(cumulative, vec![0.25, 0.75, 1.0]);
        let masses = pmf(&view, 4, &splits).unwrap();
        assert_eq!(masses.len(), splits.len() + 1);
        assert!((masses.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn splits_must_be_increasing_and_nan_free() {
        let view = small_view();
        assert!(cdf(&view, 4, &[2.0, 1.0]).is_err());
        assert!(cdf(&view, 4, &[1.0, 1.0]).is_err());
        assert!(cdf(&view, 4, &[f64::NAN]).is_err());
    }

    #[test]
    fn invalid_rank_is_rejected() {
        let view = small_view();
        assert!(quantile(&view, 4, 1.0, 4.0, -0.1).is_err());
        assert!(quantile(&view, 4, 1.0, 4.0, 1.1).is_err());
    }
}
