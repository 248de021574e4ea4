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

use sketches::common::NumStdDev;
use sketches::theta::CompactThetaSketch;
use sketches::theta::ThetaSketch;
use sketches::theta::UpdateResult;

#[test]
fn retained_hashes_always_sit_strictly_below_theta() {
    let mut sketch = ThetaSketch::builder().lg_k(4).build();
    for i in 0..50_000u64 {
        sketch.update(i);
        if i % 9973 == 0 {
            let theta = sketch.theta64();
            assert!(sketch.iter().all(|h| h > 0 && h < theta));
            assert_eq!(sketch.num_retained(), sketch.iter().count());
        }
    }
}

#[test]
fn trim_leaves_exactly_nominal_entries() {
    let mut sketch = ThetaSketch::builder().lg_k(4).build();
    for i in 0..32u64 {
        sketch.update(i);
    }
    sketch.trim();
    // nominal is 16; theta is the 17th smallest of the hashed inputs
    assert_eq!(sketch.num_retained(), 16);
    let estimate = sketch.estimate();
    assert!(estimate > 16.0 && estimate < 64.0);
}

#[test]
fn prehashed_updates_screen_on_the_raw_value() {
    let mut sketch = ThetaSketch::builder().lg_k(4).build();
    assert_eq!(sketch.update_hash(0), UpdateResult::RejectedNull);
    assert_eq!(sketch.update_hash(1), UpdateResult::InsertedCountIncremented);
    assert_eq!(sketch.update_hash(1), UpdateResult::RejectedDuplicate);
    assert_eq!(
        sketch.update_hash(u64::MAX >> 1),
        UpdateResult::RejectedOverTheta
    );
    assert_eq!(sketch.num_retained(), 1);
}

#[test]
fn estimator_stays_within_three_standard_errors() {
    // Monte Carlo over disjoint input ranges; relative standard error for
    // lg_k = 10 is about 1/sqrt(1024)
    let trials = 100u64;
    let n = 10_000u64;
    let rse = 1.0 / (1024f64).sqrt();
    let mut within = 0;
    for trial in 0..trials {
        let mut sketch = ThetaSketch::builder().lg_k(10).build();
        let base = trial * 1_000_000_000;
        for i in 0..n {
            sketch.update(base + i);
        }
        let estimate = sketch.estimate();
        if (estimate - n as f64).abs() <= 3.0 * rse * n as f64 {
            within += 1;
        }
        let lb = sketch.lower_bound(NumStdDev::Three);
        let ub = sketch.upper_bound(NumStdDev::Three);
        assert!(lb <= estimate && estimate <= ub);
    }
    assert!(within >= 95, "only {within}/{trials} trials within 3 RSE");
}

#[test]
fn serialized_round_trip_preserves_the_sketch() {
    for n in [0u64, 1, 10, 1000, 100_000] {
        let mut sketch = ThetaSketch::builder().lg_k(6).build();
        for i in 0..n {
            sketch.update(i);
        }
        let compact = sketch.compact(true);
        let bytes = compact.serialize();
        let decoded = CompactThetaSketch::deserialize(&bytes).unwrap();

        assert_eq!(decoded.is_empty(), compact.is_empty());
        assert_eq!(decoded.num_retained(), compact.num_retained());
        assert_eq!(decoded.theta64(), compact.theta64());
        assert_eq!(
            decoded.iter().collect::<Vec<_>>(),
            compact.iter().collect::<Vec<_>>()
        );
        // serializing the decoded sketch reproduces the image
        assert_eq!(decoded.serialize(), bytes);
    }
}

#[test]
fn sampling_probability_starts_estimation_immediately() {
    let mut sketch = ThetaSketch::builder()
        .lg_k(12)
        .sampling_probability(0.25)
        .build();
    assert!(sketch.is_estimation_mode());
    let n = 100_000u64;
    for i in 0..n {
        sketch.update(i);
    }
    let estimate = sketch.estimate();
    assert!((estimate - n as f64).abs() < 0.2 * n as f64);
}
