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

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use sketches::quantiles::DoublesSketch;
use sketches::sampling::VarOptItemsSketch;
use sketches::theta::ThetaSketch;

fn bench_theta_update(c: &mut Criterion) {
    c.bench_function("theta_update_100k_lg12", |b| {
        b.iter(|| {
            let mut sketch = ThetaSketch::builder().lg_k(12).build();
            for i in 0..100_000u64 {
                sketch.update(i);
            }
            black_box(sketch.estimate());
        })
    });
}

fn bench_theta_compact_serialize(c: &mut Criterion) {
    let mut sketch = ThetaSketch::builder().lg_k(12).build();
    for i in 0..100_000u64 {
        sketch.update(i);
    }
    let compact = sketch.compact(true);
    c.bench_function("theta_serialize_lg12", |b| {
        b.iter(|| black_box(compact.serialize()))
    });
}

fn bench_quantiles_update(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1234);
    let values: Vec<f64> = (0..100_000).map(|_| rng.gen::<f64>() * 1e6).collect();
    c.bench_function("quantiles_update_100k_k128", |b| {
        b.iter(|| {
            let mut sketch = DoublesSketch::builder()
                .k(128)
                .rng(Box::new(StdRng::seed_from_u64(42)))
                .build();
            for &value in &values {
                sketch.update(value);
            }
            black_box(sketch.n());
        })
    });
}

fn bench_quantiles_query(c: &mut Criterion) {
    let mut sketch = DoublesSketch::builder()
        .k(128)
        .rng(Box::new(StdRng::seed_from_u64(42)))
        .build();
    for i in 0..1_000_000 {
        sketch.update(i as f64);
    }
    c.bench_function("quantiles_quantile_1m", |b| {
        b.iter(|| black_box(sketch.quantile(0.99).unwrap()))
    });
}

fn bench_varopt_update(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let weights: Vec<f64> = (0..100_000).map(|_| 1.0 + rng.gen::<f64>() * 10.0).collect();
    c.bench_function("varopt_update_100k_k256", |b| {
        b.iter(|| {
            let mut sketch =
                VarOptItemsSketch::with_rng(256, Box::new(StdRng::seed_from_u64(42))).unwrap();
            for (i, &weight) in weights.iter().enumerate() {
                sketch.update(i as u64, weight).unwrap();
            }
            black_box(sketch.num_samples());
        })
    });
}

criterion_group!(
    benches,
    bench_theta_update,
    bench_theta_compact_serialize,
    bench_quantiles_update,
    bench_quantiles_query,
    bench_varopt_update
);
criterion_main!(benches);
