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

//! Heap and direct variants fed identical inputs (and, where randomness is
//! involved, identically seeded RNGs) must produce byte-identical
//! serialized output.

use rand::SeedableRng;
use rand::rngs::StdRng;
use sketches::common::ResizeFactor;
use sketches::hash::DEFAULT_UPDATE_SEED;
use sketches::quantiles::DirectDoublesSketch;
use sketches::quantiles::DoublesSketch;
use sketches::store::HeapByteStore;
use sketches::theta::DirectThetaSketch;
use sketches::theta::ThetaSketch;

#[test]
fn theta_heap_and_direct_agree_bytewise() {
    for (lg_k, n) in [(4u8, 10u64), (4, 1000), (6, 50_000)] {
        let mut heap = ThetaSketch::builder().lg_k(lg_k).build();
        let store = Box::new(HeapByteStore::with_capacity(1 << 20));
        let mut direct = DirectThetaSketch::new_instance(
            lg_k,
            DEFAULT_UPDATE_SEED,
            1.0,
            ResizeFactor::X8,
            store,
        )
        .unwrap();

        for i in 0..n {
            let heap_result = heap.update(i);
            let direct_result = direct.update(i).unwrap();
            assert_eq!(heap_result, direct_result);
        }

        assert_eq!(heap.num_retained(), direct.num_retained().unwrap());
        assert_eq!(heap.theta64(), direct.theta64().unwrap());
        for ordered in [false, true] {
            assert_eq!(
                heap.compact(ordered).serialize(),
                direct.compact(ordered).unwrap().serialize()
            );
        }
    }
}

#[test]
fn quantiles_heap_and_direct_agree_bytewise_with_shared_seed() {
    for (k, n) in [(8u16, 100u64), (8, 4096), (32, 65_536)] {
        let seed = 0xC0FFEE ^ n;
        let mut heap = DoublesSketch::builder()
            .k(k)
            .rng(Box::new(StdRng::seed_from_u64(seed)))
            .build();
        // minimal initial store: every level addition goes through growth
        let store = Box::new(HeapByteStore::with_capacity(32 + 16 * k as usize));
        let mut direct = DirectDoublesSketch::new_instance_with_rng(
            k,
            store,
            Box::new(StdRng::seed_from_u64(seed)),
        )
        .unwrap();

        let mut value = 1u64;
        for _ in 0..n {
            value = value.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            let item = (value >> 11) as f64 / 1e6;
            heap.update(item);
            direct.update(item).unwrap();
        }

        assert_eq!(heap.n(), direct.n().unwrap());
        assert_eq!(heap.bit_pattern(), direct.bit_pattern().unwrap());
        for compact in [true, false] {
            assert_eq!(heap.serialize(compact), direct.serialize(compact).unwrap());
        }
    }
}

#[test]
fn wrapped_updatable_quantiles_image_continues_like_the_heap() {
    let k = 16u16;
    let mut heap = DoublesSketch::builder()
        .k(k)
        .rng(Box::new(StdRng::seed_from_u64(7)))
        .build();
    let store = Box::new(HeapByteStore::with_capacity(32 + 16 * k as usize));
    let mut direct =
        DirectDoublesSketch::new_instance_with_rng(k, store, Box::new(StdRng::seed_from_u64(7)))
            .unwrap();

    for i in 0..1000 {
        heap.update(i as f64);
        direct.update(i as f64).unwrap();
    }

    // hand the direct image off and keep updating both
    let store = direct.into_store();
    let mut resumed =
        DirectDoublesSketch::wrap_with_rng(store, Box::new(StdRng::seed_from_u64(11))).unwrap();
    let mut heap_rng_swap = DoublesSketch::heapify_with_rng(
        &heap.serialize(false),
        Box::new(StdRng::seed_from_u64(11)),
    )
    .unwrap();

    for i in 1000..5000 {
        heap_rng_swap.update(i as f64);
        resumed.update(i as f64).unwrap();
    }
    assert_eq!(
        heap_rng_swap.serialize(true),
        resumed.serialize(true).unwrap()
    );
    assert_eq!(
        heap_rng_swap.serialize(false),
        resumed.serialize(false).unwrap()
    );
}

#[test]
fn theta_updatable_image_survives_wrap_round_trip() {
    let store = Box::new(HeapByteStore::with_capacity(1 << 16));
    let mut direct = DirectThetaSketch::new_instance(
        5,
        DEFAULT_UPDATE_SEED,
        1.0,
        ResizeFactor::X2,
        store,
    )
    .unwrap();
    for i in 0..10_000u64 {
        direct.update(i).unwrap();
    }
    let reference = direct.compact(true).unwrap().serialize();

    let wrapped =
        DirectThetaSketch::wrap(direct.into_store(), DEFAULT_UPDATE_SEED).unwrap();
    assert_eq!(wrapped.compact(true).unwrap().serialize(), reference);
}
