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

use rand::SeedableRng;
use rand::rngs::StdRng;
use sketches::sampling::ArrayOfI64SerDe;
use sketches::sampling::ArrayOfStringsSerDe;
use sketches::sampling::VarOptItemsSketch;

fn seeded(k: usize, seed: u64) -> VarOptItemsSketch<i64> {
    VarOptItemsSketch::with_rng(k, Box::new(StdRng::seed_from_u64(seed))).unwrap()
}

#[test]
fn five_unit_items_into_k4_reservoir() {
    let mut sketch = seeded(4, 1);
    for (item, weight) in [(0i64, 1.0), (1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0)] {
        sketch.update(item, weight).unwrap();
    }
    let samples = sketch.samples();
    assert_eq!(samples.len(), 4);
    assert_eq!(sketch.n(), 5);
    // unit weights: everything is pseudo-light, the whole sample is in R
    assert!(sketch.total_weight_r() > 0.0);
    let total: f64 = samples.iter().map(|(_, w)| w).sum();
    assert!((total - 5.0).abs() < 1e-9);
}

#[test]
fn subset_sum_estimates_are_unbiased() {
    // estimate the summed weight of items 0..10 out of 0..50 across many
    // independently seeded runs; the estimator mean must land on the truth
    let trials = 400;
    let k = 16;
    let true_sum = 10.0;
    let mut total = 0.0;
    for trial in 0..trials {
        let mut sketch = seeded(k, 1000 + trial);
        for item in 0..50i64 {
            sketch.update(item, 1.0).unwrap();
        }
        let estimate: f64 = sketch
            .samples()
            .iter()
            .filter(|(item, _)| **item < 10)
            .map(|(_, weight)| weight)
            .sum();
        total += estimate;
    }
    let mean = total / trials as f64;
    assert!(
        (mean - true_sum).abs() < 1.0,
        "estimator mean {mean} too far from {true_sum}"
    );
}

#[test]
fn empty_round_trip() {
    let sketch = seeded(8, 2);
    let bytes = sketch.serialize(&ArrayOfI64SerDe);
    assert_eq!(bytes.len(), 8);
    let restored =
        VarOptItemsSketch::<i64>::deserialize(&bytes, &ArrayOfI64SerDe).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.k(), 8);
}

#[test]
fn warmup_round_trip_keeps_exact_weights() {
    let mut sketch = seeded(16, 3);
    for item in 0..10i64 {
        sketch.update(item, (item + 1) as f64).unwrap();
    }
    let bytes = sketch.serialize(&ArrayOfI64SerDe);
    let restored =
        VarOptItemsSketch::<i64>::deserialize(&bytes, &ArrayOfI64SerDe).unwrap();

    assert_eq!(restored.n(), sketch.n());
    assert_eq!(restored.k(), sketch.k());
    let mut original = sketch.samples();
    let mut recovered = restored.samples();
    original.sort_by(|a, b| a.0.cmp(b.0));
    recovered.sort_by(|a, b| a.0.cmp(b.0));
    assert_eq!(original.len(), recovered.len());
    for ((item_a, wt_a), (item_b, wt_b)) in original.iter().zip(recovered.iter()) {
        assert_eq!(item_a, item_b);
        assert_eq!(wt_a, wt_b);
    }
}

#[test]
fn steady_state_round_trip_preserves_regions_and_tau() {
    let mut sketch = seeded(32, 4);
    for item in 0..5000i64 {
        sketch.update(item, 1.0 + (item % 11) as f64).unwrap();
    }
    let bytes = sketch.serialize(&ArrayOfI64SerDe);
    let restored =
        VarOptItemsSketch::<i64>::deserialize(&bytes, &ArrayOfI64SerDe).unwrap();

    assert_eq!(restored.n(), sketch.n());
    assert_eq!(restored.k(), sketch.k());
    assert_eq!(restored.num_samples(), sketch.num_samples());
    assert_eq!(restored.total_weight_r(), sketch.total_weight_r());
    assert_eq!(restored.tau(), sketch.tau());

    let mut original = sketch.samples();
    let mut recovered = restored.samples();
    original.sort_by(|a, b| a.0.cmp(b.0));
    recovered.sort_by(|a, b| a.0.cmp(b.0));
    assert_eq!(original, recovered);
}

#[test]
fn deserialized_sketch_accepts_more_updates() {
    let mut sketch = seeded(8, 5);
    for item in 0..100i64 {
        sketch.update(item, 1.0).unwrap();
    }
    let bytes = sketch.serialize(&ArrayOfI64SerDe);
    let mut restored = VarOptItemsSketch::<i64>::deserialize_with_rng(
        &bytes,
        &ArrayOfI64SerDe,
        Box::new(StdRng::seed_from_u64(99)),
    )
    .unwrap();
    for item in 100..200i64 {
        restored.update(item, 2.0).unwrap();
    }
    assert_eq!(restored.n(), 200);
    assert_eq!(restored.num_samples(), 8);
}

#[test]
fn string_items_round_trip() {
    let mut sketch =
        VarOptItemsSketch::<String>::with_rng(4, Box::new(StdRng::seed_from_u64(6))).unwrap();
    for (i, name) in ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"]
        .iter()
        .enumerate()
    {
        sketch.update(name.to_string(), 1.0 + i as f64).unwrap();
    }
    let bytes = sketch.serialize(&ArrayOfStringsSerDe);
    let restored =
        VarOptItemsSketch::<String>::deserialize(&bytes, &ArrayOfStringsSerDe).unwrap();
    assert_eq!(restored.n(), 6);
    assert_eq!(restored.num_samples(), 4);
    assert_eq!(restored.total_weight_r(), sketch.total_weight_r());
}

#[test]
fn corrupt_images_are_rejected() {
    use sketches::error::ErrorKind;

    let mut sketch = seeded(8, 7);
    for item in 0..100i64 {
        sketch.update(item, 1.0).unwrap();
    }
    let good = sketch.serialize(&ArrayOfI64SerDe);

    let mut bad_family = good.clone();
    bad_family[2] = 3;
    assert_eq!(
        VarOptItemsSketch::<i64>::deserialize(&bad_family, &ArrayOfI64SerDe)
            .unwrap_err()
            .kind(),
        ErrorKind::Corruption
    );

    let mut bad_ver = good.clone();
    bad_ver[1] = 9;
    assert_eq!(
        VarOptItemsSketch::<i64>::deserialize(&bad_ver, &ArrayOfI64SerDe)
            .unwrap_err()
            .kind(),
        ErrorKind::Corruption
    );

    let mut truncated = good;
    truncated.truncate(truncated.len() - 4);
    assert_eq!(
        VarOptItemsSketch::<i64>::deserialize(&truncated, &ArrayOfI64SerDe)
            .unwrap_err()
            .kind(),
        ErrorKind::Corruption
    );
}
