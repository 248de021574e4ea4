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
use sketches::quantiles::DoublesSketch;
use sketches::quantiles::normalized_rank_error;

fn seeded(k: u16, seed: u64) -> DoublesSketch {
    DoublesSketch::builder()
        .k(k)
        .rng(Box::new(StdRng::seed_from_u64(seed)))
        .build()
}

#[test]
fn ordered_k8_stream_of_1024_items() {
    let mut sketch = seeded(8, 1);
    for i in 1..=1024 {
        sketch.update(i as f64);
    }
    assert_eq!(sketch.n(), 1024);
    assert_eq!(sketch.min_value(), 1.0);
    assert_eq!(sketch.max_value(), 1024.0);
    assert_eq!(sketch.bit_pattern(), 64); // level 6 only
    assert_eq!(sketch.quantile(0.0).unwrap(), 1.0);
    assert_eq!(sketch.quantile(1.0).unwrap(), 1024.0);
}

#[test]
fn nan_inputs_are_dropped_silently() {
    let mut sketch = seeded(8, 2);
    for value in [f64::NAN, 1.0, f64::NAN, 2.0] {
        sketch.update(value);
    }
    assert_eq!(sketch.n(), 2);
    assert_eq!(sketch.min_value(), 1.0);
    assert_eq!(sketch.max_value(), 2.0);
}

#[test]
fn rank_error_holds_over_a_million_items() {
    let k = 128u16;
    let n = 1_000_000u64;
    let mut sketch = seeded(k, 3);
    // pseudo-random permutation of 0..n
    let mut value = 0u64;
    for _ in 0..n {
        value = (value + 611_953) % n;
        sketch.update(value as f64);
    }
    assert_eq!(sketch.n(), n);

    // the value at true rank r is r * n, so the rank error is directly
    // readable from the returned quantile
    let eps = normalized_rank_error(k);
    for i in 1..20 {
        let rank = i as f64 / 20.0;
        let q = sketch.quantile(rank).unwrap();
        let error = (q - rank * n as f64).abs() / n as f64;
        assert!(
            error <= 3.0 * eps,
            "rank {rank}: quantile {q} off by {error}, eps {eps}"
        );
    }
}

#[test]
fn quantiles_are_nondecreasing_and_pin_the_extremes() {
    let mut sketch = seeded(32, 4);
    let mut rng_value = 7u64;
    for _ in 0..50_000 {
        rng_value = rng_value.wrapping_mul(6364136223846793005).wrapping_add(1);
        sketch.update((rng_value >> 16) as f64);
    }
    let mut previous = f64::NEG_INFINITY;
    for i in 0..=50 {
        let q = sketch.quantile(i as f64 / 50.0).unwrap();
        assert!(q >= previous);
        previous = q;
    }
    assert_eq!(sketch.quantile(0.0).unwrap(), sketch.min_value());
    assert_eq!(sketch.quantile(1.0).unwrap(), sketch.max_value());
}

#[test]
fn round_trip_preserves_retained_state() {
    let mut sketch = seeded(16, 5);
    for i in 0..12_345 {
        sketch.update((i * 37 % 1000) as f64);
    }
    for compact in [true, false] {
        let bytes = sketch.serialize(compact);
        let restored = DoublesSketch::heapify(&bytes).unwrap();
        assert_eq!(restored.n(), sketch.n());
        assert_eq!(restored.k(), sketch.k());
        assert_eq!(restored.bit_pattern(), sketch.bit_pattern());
        assert_eq!(restored.num_retained(), sketch.num_retained());
        assert_eq!(restored.min_value(), sketch.min_value());
        assert_eq!(restored.max_value(), sketch.max_value());
        for i in 0..=10 {
            let rank = i as f64 / 10.0;
            assert_eq!(
                restored.quantile(rank).unwrap(),
                sketch.quantile(rank).unwrap()
            );
        }
    }
}

#[test]
fn pmf_cdf_consistency() {
    let mut sketch = seeded(64, 6);
    for i in 0..100_000 {
        sketch.update((i % 1000) as f64);
    }
    let splits = [100.0, 250.0, 500.0, 900.0];
    let masses = sketch.pmf(&splits).unwrap();
    let cumulative = sketch.cdf(&splits).unwrap();
    assert_eq!(masses.len(), splits.len() + 1);
    assert_eq!(cumulative.len(), splits.len() + 1);
    assert!((masses.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    assert_eq!(*cumulative.last().unwrap(), 1.0);

    let mut running = 0.0;
    for (mass, cum) in masses.iter().zip(cumulative.iter()) {
        running += mass;
        assert!((running - cum).abs() < 1e-12);
    }
}
