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

//! Variance-optimal (VarOpt) weighted reservoir sampling.
//!
//! The sketch keeps at most k weighted items such that inclusion
//! probabilities match the variance-minimizing scheme for subset-sum
//! estimation. Its k+1 item slots are partitioned left to right into three
//! regions:
//!
//! - **H**: a min-heap over item weights; heavy items still competing to
//!   keep their exact weight.
//! - **M**: a transient middle region, nonempty only inside an update.
//! - **R**: the reservoir; its items share the implicit weight
//!   `tau = total_wt_r / r`.
//!
//! An incoming item is classified against the old tau ("pseudo" light or
//! heavy, since the final tau is not known yet), placed, and then the
//! candidate set is grown with every heap item light enough to join before
//! exactly one candidate is deleted.

use rand::Rng;
use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::assert::ensure_preamble_longs_in;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::assert::insufficient_data;
use crate::codec::family::Family;
use crate::codec::flags;
use crate::common::ResizeFactor;
use crate::common::starting_sub_multiple;
use crate::error::Error;
use crate::sampling::serde::ArrayOfItemsSerDe;
use crate::sampling::serialization as ser;
use crate::sampling::serialization::MAX_ITEMS_SEEN;

/// Smallest sampling array allocation: 16 slots.
const MIN_LG_ARR_ITEMS: u8 = 4;

/// Weight written into slots whose item no longer carries an explicit
/// weight, so that reads of stale weights fail loudly in debug builds.
const SENTINEL_WEIGHT: f64 = -1.0;

/// VarOpt weighted reservoir sampling sketch.
///
/// # Examples
///
/// ```
/// # use sketches::sampling::VarOptItemsSketch;
/// let mut sketch = VarOptItemsSketch::new(32).unwrap();
/// for i in 0..1000u32 {
///     sketch.update(i, 1.0 + (i % 7) as f64).unwrap();
/// }
/// let samples = sketch.samples();
/// assert_eq!(samples.len(), 32);
/// ```
pub struct VarOptItemsSketch<T> {
    k: usize,
    items_seen: u64,
    resize_factor: ResizeFactor,
    data: Vec<Option<T>>,
    weights: Vec<f64>,
    h: usize,
    m: usize,
    r: usize,
    total_wt_r: f64,
    rng: Box<dyn RngCore>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for VarOptItemsSketch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarOptItemsSketch")
            .field("k", &self.k)
            .field("items_seen", &self.items_seen)
            .field("h", &self.h)
            .field("m", &self.m)
            .field("r", &self.r)
            .field("total_wt_r", &self.total_wt_r)
            .finish()
    }
}

impl<T> VarOptItemsSketch<T> {
    /// Creates a sketch keeping at most `k` samples.
    ///
    /// k must be at least 2: any two items can be down-sampled to one, which
    /// is what merging and the candidate-set machinery rely on.
    pub fn new(k: usize) -> Result<Self, Error> {
        Self::with_rng(k, Box::new(StdRng::from_entropy()))
    }

    /// Creates a sketch with a caller-supplied RNG, for deterministic runs.
    pub fn with_rng(k: usize, rng: Box<dyn RngCore>) -> Result<Self, Error> {
        Self::with_rng_and_resize_factor(k, rng, ResizeFactor::X8)
    }

    fn with_rng_and_resize_factor(
        k: usize,
        rng: Box<dyn RngCore>,
        resize_factor: ResizeFactor,
    ) -> Result<Self, Error> {
        if k < 2 {
            return Err(Error::invalid_parameter(format!(
                "k must be at least 2, got {k}"
            )));
        }
        let ceiling_lg_k = (k.next_power_of_two().trailing_zeros()) as u8;
        let initial_lg = starting_sub_multiple(ceiling_lg_k, resize_factor.lg(), MIN_LG_ARR_ITEMS);
        let mut initial_alloc = (1usize << initial_lg).min(k);
        if initial_alloc == k {
            initial_alloc += 1;
        }
        Ok(Self {
            k,
            items_seen: 0,
            resize_factor,
            data: Vec::with_capacity(initial_alloc),
            weights: Vec::with_capacity(initial_alloc),
            h: 0,
            m: 0,
            r: 0,
            total_wt_r: 0.0,
            rng,
        })
    }

    /// Returns k, the maximum number of samples.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the number of items presented to the sketch.
    pub fn n(&self) -> u64 {
        self.items_seen
    }

    /// Returns true if nothing has been sampled.
    pub fn is_empty(&self) -> bool {
        self.items_seen == 0
    }

    /// Returns the current number of stored samples, at most k.
    pub fn num_samples(&self) -> usize {
        (self.items_seen as usize).min(self.k)
    }

    /// Returns the implicit weight of each reservoir item, or 0 before the
    /// reservoir region exists.
    pub fn tau(&self) -> f64 {
        if self.r == 0 {
            0.0
        } else {
            self.total_wt_r / self.r as f64
        }
    }

    /// Returns the total weight of the reservoir region.
    pub fn total_weight_r(&self) -> f64 {
        self.total_wt_r
    }

    /// Returns the number of items in the heap region H, which keep their
    /// exact weights.
    pub fn h_count(&self) -> usize {
        self.h
    }

    /// Returns the number of items in the reservoir region R, which share
    /// the implicit weight tau.
    pub fn r_count(&self) -> usize {
        self.r
    }

    /// Presents `(item, weight)` to the sketch.
    ///
    /// Weights must be strictly positive and finite. Once 2^48 - 1 items
    /// have been seen, further updates are refused.
    pub fn update(&mut self, item: T, weight: f64) -> Result<(), Error> {
        if self.items_seen == MAX_ITEMS_SEEN {
            return Err(Error::capacity_exceeded(format!(
                "sketch has exceeded its capacity for total items seen: {MAX_ITEMS_SEEN}"
            )));
        }
        if !(weight > 0.0) || !weight.is_finite() {
            return Err(Error::invalid_parameter(format!(
                "item weights must be strictly positive and finite, got {weight}"
            )));
        }
        self.items_seen += 1;

        if self.r == 0 {
            self.update_warmup_phase(item, weight);
        } else {
            // comparisons below are against the OLD tau; true lightness
            // during this event depends on the new tau, not yet known
            let avg_wt_r = self.total_wt_r / self.r as f64;
            if weight <= avg_wt_r {
                self.update_pseudo_light(item, weight);
            } else if self.r == 1 {
                self.update_pseudo_heavy_r_eq_1(item, weight);
            } else {
                self.update_pseudo_heavy_general(item, weight);
            }
        }
        Ok(())
    }

    /// Returns the stored samples with their effective weights.
    ///
    /// During warmup every item keeps its true weight; afterwards H items
    /// keep their true weights and R items report tau.
    pub fn samples(&self) -> Vec<(&T, f64)> {
        if self.items_seen == 0 {
            return Vec::new();
        }
        debug_assert_eq!(self.m, 0);
        let mut out = Vec::with_capacity(self.num_samples());
        for i in 0..self.h {
            let item = self.data[i].as_ref().expect("H slot holds an item");
            out.push((item, self.weights[i]));
        }
        if self.r > 0 {
            let tau = self.tau();
            for slot in self.data.iter().skip(self.h + 1) {
                let item = slot.as_ref().expect("R slot holds an item");
                out.push((item, tau));
            }
        }
        out
    }

    // While itemsSeen <= k items accumulate unsorted in H; the first
    // overflow heapifies and moves the two lightest items across the
    // M/R boundary.
    fn update_warmup_phase(&mut self, item: T, weight: f64) {
        debug_assert!(self.r == 0 && self.m == 0 && self.h <= self.k);
        self.data.push(Some(item));
        self.weights.push(weight);
        self.h += 1;

        if self.h > self.k {
            self.convert_to_heap();
            self.transition_from_warmup();
        }
    }

    fn transition_from_warmup(&mut self) {
        // move the two lightest items from H to M; the lighter of them
        // really belongs in R, so adjust the counts to match
        self.pop_min_to_m_region();
        self.pop_min_to_m_region();
        self.m -= 1;
        self.r += 1;

        debug_assert_eq!(self.h, self.k - 1);
        debug_assert_eq!(self.m, 1);
        debug_assert_eq!(self.r, 1);

        // grab the R weight, then overwrite the slot with the sentinel
        self.total_wt_r = self.weights[self.k];
        self.weights[self.k] = SENTINEL_WEIGHT;

        // any two items can be down-sampled to one, so the two lightest
        // are a valid starting candidate set
        self.grow_candidate_set(self.weights[self.k - 1] + self.total_wt_r, 2);
    }

    // In the pseudo-light case the new item would sit to the right of the R
    // items in a reverse-sorted view, so it is certainly light enough to be
    // part of this round's down-sampling.
    fn update_pseudo_light(&mut self, item: T, weight: f64) {
        debug_assert!(self.r >= 1);
        debug_assert_eq!(self.r + self.h, self.k);

        // the gap slot at index h becomes the M region
        let m_slot = self.h;
        self.data[m_slot] = Some(item);
        self.weights[m_slot] = weight;
        self.m += 1;

        self.grow_candidate_set(self.total_wt_r + weight, self.r + 1);
    }

    // In the pseudo-heavy case the new item goes into the H heap whether it
    // belongs there or not; it may come right back out, which is fine
    // because pseudo-heavy items cannot predominate in long streams unless
    // the weight spread is enormous.
    fn update_pseudo_heavy_general(&mut self, item: T, weight: f64) {
        debug_assert_eq!(self.m, 0);
        debug_assert!(self.r >= 2);
        debug_assert_eq!(self.r + self.h, self.k);

        self.push(item, weight);
        self.grow_candidate_set(self.total_wt_r, self.r);
    }

    // With r == 1 an M item must be grabbed so the starting candidate set
    // has the two members the growth loop requires.
    fn update_pseudo_heavy_r_eq_1(&mut self, item: T, weight: f64) {
        debug_assert_eq!(self.m, 0);
        debug_assert_eq!(self.r, 1);
        debug_assert_eq!(self.r + self.h, self.k);

        self.push(item, weight);
        self.pop_min_to_m_region();

        let m_slot = self.k - 1; // one item in R, so the slot before is M
        self.grow_candidate_set(self.weights[m_slot] + self.total_wt_r, 2);
    }

    fn convert_to_heap(&mut self) {
        if self.h < 2 {
            return;
        }
        let last_slot = self.h - 1;
        let last_non_leaf = ((last_slot + 1) / 2) - 1;
        for j in (0..=last_non_leaf).rev() {
            self.restore_towards_leaves(j);
        }
    }

    fn restore_towards_leaves(&mut self, slot_in: usize) {
        debug_assert!(self.h > 0);
        let last_slot = self.h - 1;
        debug_assert!(slot_in <= last_slot);

        let mut slot = slot_in;
        let mut child = 2 * slot_in + 1;
        while child <= last_slot {
            let child2 = child + 1;
            if child2 <= last_slot && self.weights[child2] < self.weights[child] {
                child = child2;
            }
            if self.weights[slot] <= self.weights[child] {
                break;
            }
            self.swap_values(slot, child);
            slot = child;
            child = 2 * slot + 1;
        }
    }

    fn restore_towards_root(&mut self, slot_in: usize) {
        let mut slot = slot_in;
        while slot > 0 {
            let parent = ((slot + 1) / 2) - 1;
            if self.weights[slot] >= self.weights[parent] {
                break;
            }
            self.swap_values(slot, parent);
            slot = parent;
        }
    }

    fn push(&mut self, item: T, weight: f64) {
        self.data[self.h] = Some(item);
        self.weights[self.h] = weight;
        self.h += 1;
        self.restore_towards_root(self.h - 1);
    }

    fn peek_min(&self) -> f64 {
        debug_assert!(self.h > 0);
        self.weights[0]
    }

    fn pop_min_to_m_region(&mut self) {
        debug_assert!(self.h > 0);
        debug_assert_eq!(self.h + self.m + self.r, self.k + 1);

        if self.h == 1 {
            // the lone heap item is already adjacent to M
            self.m += 1;
            self.h -= 1;
        } else {
            let target = self.h - 1;
            self.swap_values(0, target);
            self.m += 1;
            self.h -= 1;
            self.restore_towards_leaves(0);
        }
    }

    // The new item sits in H or M, the array is full, and the candidates
    // (R plus at most one M item) are right-justified. Grow the candidate
    // set by pulling every sufficiently light item from H into M, then
    // down-sample the candidates by deleting exactly one.
    fn grow_candidate_set(&mut self, mut wt_cands: f64, mut num_cands: usize) {
        debug_assert_eq!(self.h + self.m + self.r, self.k + 1);
        debug_assert!(num_cands >= 2);
        debug_assert_eq!(num_cands, self.m + self.r);

        while self.h > 0 {
            let next_wt = self.peek_min();
            let next_tot_wt = wt_cands + next_wt;
            // strict lightness of the next prospect, denominator multiplied
            // through
            if next_wt * (num_cands as f64) < next_tot_wt {
                wt_cands = next_tot_wt;
                num_cands += 1;
                self.pop_min_to_m_region();
            } else {
                break;
            }
        }
        self.downsample_candidate_set(wt_cands, num_cands);
    }

    fn pick_random_slot_in_r(&mut self) -> usize {
        debug_assert!(self.r > 0);
        let offset = self.h + self.m;
        if self.r == 1 {
            offset
        } else {
            offset + self.rng.gen_range(0..self.r)
        }
    }

    fn choose_delete_slot(&mut self, wt_cand: f64, num_cand: usize) -> usize {
        debug_assert!(self.r > 0);
        if self.m == 0 {
            // an extremely heavy item landed: all candidates are in R
            self.pick_random_slot_in_r()
        } else if self.m == 1 {
            // keep the M item with probability (num_cand - 1) * wt_M / wt_cand
            let wt_m_cand = self.weights[self.h];
            if wt_cand * self.rng.gen::<f64>() < (num_cand - 1) as f64 * wt_m_cand {
                self.pick_random_slot_in_r()
            } else {
                self.h
            }
        } else {
            let delete_slot = self.choose_weighted_delete_slot(wt_cand, num_cand);
            let first_r_slot = self.h + self.m;
            if delete_slot == first_r_slot {
                self.pick_random_slot_in_r()
            } else {
                delete_slot
            }
        }
    }

    fn choose_weighted_delete_slot(&mut self, wt_cand: f64, num_cand: usize) -> usize {
        debug_assert!(self.m >= 1);
        let offset = self.h;
        let final_m = offset + self.m - 1;
        let num_to_keep = num_cand - 1;

        let mut left_subtotal = 0.0;
        let mut right_subtotal = -wt_cand * self.rng.gen::<f64>();
        for i in offset..=final_m {
            left_subtotal += num_to_keep as f64 * self.weights[i];
            right_subtotal += wt_cand;
            if left_subtotal < right_subtotal {
                return i;
            }
        }
        // no M slot matched: the caller deletes out of R
        final_m + 1
    }

    fn downsample_candidate_set(&mut self, wt_cands: f64, num_cands: usize) {
        debug_assert!(num_cands >= 2);
        debug_assert_eq!(self.h + num_cands, self.k + 1);

        // decide the victim before overwriting anything
        let delete_slot = self.choose_delete_slot(wt_cands, num_cands);
        let leftmost_cand_slot = self.h;
        debug_assert!(delete_slot >= leftmost_cand_slot);
        debug_assert!(delete_slot <= self.k);

        // wipe weights of M items moving into R
        let stop_idx = (leftmost_cand_slot + self.m).saturating_sub(1);
        for j in leftmost_cand_slot..stop_idx {
            self.weights[j] = SENTINEL_WEIGHT;
        }

        // move the leftmost candidate over the victim; when the victim IS
        // the leftmost candidate, taking it out already deletes it
        let moved = self.data[leftmost_cand_slot].take();
        if delete_slot != leftmost_cand_slot {
            self.data[delete_slot] = moved;
        }
        self.weights[delete_slot] = SENTINEL_WEIGHT;
        self.weights[leftmost_cand_slot] = SENTINEL_WEIGHT;

        self.m = 0;
        self.r = num_cands - 1;
        self.total_wt_r = wt_cands;
    }

    fn swap_values(&mut self, src: usize, dst: usize) {
        self.data.swap(src, dst);
        self.weights.swap(src, dst);
    }

    #[cfg(test)]
    pub(crate) fn validate_invariants(&self) {
        assert_eq!(self.m, 0);
        if self.items_seen as usize <= self.k {
            assert_eq!(self.h, self.items_seen as usize);
            assert_eq!(self.r, 0);
        } else {
            assert_eq!(self.h + self.r, self.k);
            assert!(self.r >= 1);
            assert!(self.total_wt_r > 0.0);
        }
        // heap property over H
        for j in 1..self.h {
            let parent = ((j + 1) / 2) - 1;
            assert!(self.weights[parent] <= self.weights[j]);
        }
    }
}

impl<T> VarOptItemsSketch<T> {
    /// Serializes the sketch; item payloads go through `serde`.
    pub fn serialize(&self, serde: &dyn ArrayOfItemsSerDe<T>) -> Vec<u8>
    where
        T: Clone,
    {
        debug_assert_eq!(self.m, 0);
        let empty = self.items_seen == 0;
        let pre_longs = if empty {
            ser::PREAMBLE_LONGS_EMPTY
        } else if self.r == 0 {
            ser::PREAMBLE_LONGS_WARMUP
        } else {
            ser::PREAMBLE_LONGS_FULL
        };

        let mut bytes = SketchBytes::with_capacity(pre_longs as usize * 8 + self.h * 8);
        bytes.write_u8(pre_longs | (self.resize_factor.lg() << 6));
        bytes.write_u8(ser::SER_VER);
        bytes.write_u8(Family::RESERVOIR.id);
        bytes.write_u8(if empty { flags::FLAG_EMPTY } else { 0 });
        bytes.write_u32_le(self.k as u32);
        if empty {
            return bytes.into_bytes();
        }

        bytes.write_u64_le(self.items_seen);
        if pre_longs == ser::PREAMBLE_LONGS_FULL {
            bytes.write_u32_le(self.h as u32);
            bytes.write_u32_le(self.r as u32);
            bytes.write_f64_le(self.total_wt_r);
        }

        for &weight in &self.weights[..self.h] {
            bytes.write_f64_le(weight);
        }

        let mut items: Vec<T> = Vec::with_capacity(self.h + self.r);
        for i in 0..self.h {
            items.push(self.data[i].as_ref().expect("H slot holds an item").clone());
        }
        if self.r > 0 {
            for slot in self.data.iter().skip(self.h + 1) {
                items.push(slot.as_ref().expect("R slot holds an item").clone());
            }
        }
        bytes.write(&serde.serialize(&items));
        bytes.into_bytes()
    }

    /// Rebuilds a sketch from an image.
    pub fn deserialize(bytes: &[u8], serde: &dyn ArrayOfItemsSerDe<T>) -> Result<Self, Error> {
        Self::deserialize_with_rng(bytes, serde, Box::new(StdRng::from_entropy()))
    }

    /// Rebuilds a sketch from an image with a caller-supplied RNG.
    pub fn deserialize_with_rng(
        bytes: &[u8],
        serde: &dyn ArrayOfItemsSerDe<T>,
        rng: Box<dyn RngCore>,
    ) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let pre_byte = cursor
            .read_u8()
            .map_err(insufficient_data("preamble_longs"))?;
        let pre_longs = pre_byte & 0x3F;
        let resize_factor = ResizeFactor::from_lg(pre_byte >> 6)
            .expect("two bits always decode to a resize factor");
        let ser_ver = cursor
            .read_u8()
            .map_err(insufficient_data("serial_version"))?;
        let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;
        let flag_bits = cursor.read_u8().map_err(insufficient_data("flags"))?;
        let k = cursor.read_u32_le().map_err(insufficient_data("k"))? as usize;

        Family::RESERVOIR.validate_id(family_id)?;
        ensure_serial_version_is(ser::SER_VER, ser_ver)?;
        ensure_preamble_longs_in(
            &[
                ser::PREAMBLE_LONGS_EMPTY,
                ser::PREAMBLE_LONGS_WARMUP,
                ser::PREAMBLE_LONGS_FULL,
            ],
            pre_longs,
        )?;
        flags::ensure_flags_valid(flag_bits)?;
        if k < 2 {
            return Err(Error::deserial(format!("corrupted: k must be at least 2, got {k}")));
        }

        let empty = flag_bits & flags::FLAG_EMPTY != 0;
        if empty || pre_longs == ser::PREAMBLE_LONGS_EMPTY {
            if !empty || pre_longs != ser::PREAMBLE_LONGS_EMPTY {
                return Err(Error::deserial(
                    "corrupted: empty flag inconsistent with preamble longs",
                ));
            }
            return Self::with_rng_and_resize_factor(k, rng, resize_factor);
        }

        let items_seen = cursor
            .read_u64_le()
            .map_err(insufficient_data("items_seen"))?;
        if items_seen == 0 || items_seen > MAX_ITEMS_SEEN {
            return Err(Error::deserial(format!(
                "corrupted: items seen out of range: {items_seen}"
            )));
        }

        let mut sketch = Self::with_rng_and_resize_factor(k, rng, resize_factor)?;
        sketch.items_seen = items_seen;

        if pre_longs == ser::PREAMBLE_LONGS_WARMUP {
            let h = items_seen as usize;
            if h > k {
                return Err(Error::deserial(format!(
                    "corrupted: warmup image with {h} items but k = {k}"
                )));
            }
            let weights = read_weights(&mut cursor, h)?;
            let (items, _) = serde.deserialize(cursor.remaining(), h)?;
            if items.len() != h {
                return Err(Error::insufficient_data("warmup items"));
            }
            sketch.data = items.into_iter().map(Some).collect();
            sketch.weights = weights;
            sketch.h = h;
            return Ok(sketch);
        }

        let h = cursor.read_u32_le().map_err(insufficient_data("h_count"))? as usize;
        let r = cursor.read_u32_le().map_err(insufficient_data("r_count"))? as usize;
        let total_wt_r = cursor
            .read_f64_le()
            .map_err(insufficient_data("total_wt_r"))?;
        if h + r != k || r == 0 {
            return Err(Error::deserial(format!(
                "corrupted: region counts h = {h}, r = {r} do not partition k = {k}"
            )));
        }
        if items_seen <= k as u64 {
            return Err(Error::deserial(format!(
                "corrupted: a reservoir region exists but only {items_seen} items were seen"
            )));
        }
        if !(total_wt_r > 0.0) || !total_wt_r.is_finite() {
            return Err(Error::deserial(format!(
                "corrupted: total weight in R out of range: {total_wt_r}"
            )));
        }

        let h_weights = read_weights(&mut cursor, h)?;
        let (items, _) = serde.deserialize(cursor.remaining(), h + r)?;
        if items.len() != h + r {
            return Err(Error::insufficient_data("sampled items"));
        }

        let mut data: Vec<Option<T>> = Vec::with_capacity(k + 1);
        let mut weights = Vec::with_capacity(k + 1);
        let mut iter = items.into_iter();
        for weight in &h_weights {
            data.push(Some(iter.next().expect("length checked")));
            weights.push(*weight);
        }
        data.push(None); // the gap slot between H and R
        weights.push(SENTINEL_WEIGHT);
        for item in iter {
            data.push(Some(item));
            weights.push(SENTINEL_WEIGHT);
        }

        sketch.data = data;
        sketch.weights = weights;
        sketch.h = h;
        sketch.r = r;
        sketch.total_wt_r = total_wt_r;
        Ok(sketch)
    }
}

fn read_weights(cursor: &mut SketchSlice<'_>, count: usize) -> Result<Vec<f64>, Error> {
    let mut weights = Vec::with_capacity(count);
    for _ in 0..count {
        let weight = cursor
            .read_f64_le()
            .map_err(insufficient_data("item_weights"))?;
        if !(weight > 0.0) || !weight.is_finite() {
            return Err(Error::deserial(format!(
                "corrupted: item weight out of range: {weight}"
            )));
        }
        weights.push(weight);
    }
    Ok(weights)
}
