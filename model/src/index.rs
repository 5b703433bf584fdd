/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::triple::Triple;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::ops::Bound;

/// Indexing strategy, fixed at graph construction time. Both modes return
/// identical results for every query pattern; the strategy only changes the
/// speed/memory trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingMode {
    Full,
    Reduced,
}

/// Pattern-lookup storage for triples. `insert` returns false when the triple
/// is already present; `delete` of an absent triple is a no-op returning
/// false, never an error. `query` with any combination of bound components
/// must return exactly the set a full scan filtered by those components
/// would return.
pub trait TripleIndex: Debug + Send + Sync {
    fn insert(&mut self, triple: &Triple) -> bool;
    fn delete(&mut self, triple: &Triple) -> bool;
    fn query(&self, s: Option<u32>, p: Option<u32>, o: Option<u32>) -> Vec<Triple>;
    fn len(&self) -> usize;
    fn clear(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, triple: &Triple) -> bool {
        !self
            .query(
                Some(triple.subject),
                Some(triple.predicate),
                Some(triple.object),
            )
            .is_empty()
    }

    fn build_from(&mut self, triples: &[Triple]) {
        self.clear();
        for triple in triples {
            self.insert(triple);
        }
    }
}

pub fn new_index(mode: IndexingMode) -> Box<dyn TripleIndex> {
    match mode {
        IndexingMode::Full => Box::new(FullIndex::new()),
        IndexingMode::Reduced => Box::new(TreeIndex::new()),
    }
}

type NestedMap = FxHashMap<u32, FxHashMap<u32, FxHashSet<u32>>>;

/// Full cross-indexing: the six permutations, each a nested hash map, so
/// every bound/unbound combination resolves through a point lookup.
#[derive(Debug, Clone, Default)]
pub struct FullIndex {
    spo: NestedMap,
    pos: NestedMap,
    osp: NestedMap,
    pso: NestedMap,
    ops: NestedMap,
    sop: NestedMap,
    count: usize,
}

impl FullIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-build from a slice of triples, deduplicating chunks in parallel
    /// before the sequential index merge.
    pub fn build_parallel(&mut self, triples: &[Triple]) {
        use rayon::prelude::*;

        self.clear();
        if triples.is_empty() {
            return;
        }

        let num_threads = rayon::current_num_threads();
        let chunk_size = (triples.len() / num_threads).max(1024);

        let deduped: BTreeSet<Triple> = triples
            .par_chunks(chunk_size)
            .map(|chunk| chunk.iter().copied().collect::<BTreeSet<Triple>>())
            .reduce(BTreeSet::new, |mut acc, local| {
                acc.extend(local);
                acc
            });

        for triple in &deduped {
            self.insert(triple);
        }
    }
}

impl TripleIndex for FullIndex {
    fn insert(&mut self, triple: &Triple) -> bool {
        let Triple {
            subject: s,
            predicate: p,
            object: o,
        } = *triple;
        if let Some(pred_map) = self.spo.get(&s) {
            if let Some(objects) = pred_map.get(&p) {
                if objects.contains(&o) {
                    return false; // triple already stored
                }
            }
        }
        self.spo.entry(s).or_default().entry(p).or_default().insert(o);
        self.pos.entry(p).or_default().entry(o).or_default().insert(s);
        self.osp.entry(o).or_default().entry(s).or_default().insert(p);
        self.pso.entry(p).or_default().entry(s).or_default().insert(o);
        self.ops.entry(o).or_default().entry(p).or_default().insert(s);
        self.sop.entry(s).or_default().entry(o).or_default().insert(p);
        self.count += 1;
        true
    }

    fn delete(&mut self, triple: &Triple) -> bool {
        let Triple {
            subject: s,
            predicate: p,
            object: o,
        } = *triple;

        let exists = self
            .spo
            .get(&s)
            .and_then(|pred_map| pred_map.get(&p))
            .map_or(false, |objects| objects.contains(&o));
        if !exists {
            return false;
        }

        remove_from_nested(&mut self.spo, s, p, o);
        remove_from_nested(&mut self.pos, p, o, s);
        remove_from_nested(&mut self.osp, o, s, p);
        remove_from_nested(&mut self.pso, p, s, o);
        remove_from_nested(&mut self.ops, o, p, s);
        remove_from_nested(&mut self.sop, s, o, p);
        self.count -= 1;
        true
    }

    fn query(&self, s: Option<u32>, p: Option<u32>, o: Option<u32>) -> Vec<Triple> {
        let mut results = Vec::new();

        match (s, p, o) {
            (Some(ss), Some(pp), Some(oo)) => {
                if let Some(pred_map) = self.spo.get(&ss) {
                    if let Some(objects) = pred_map.get(&pp) {
                        if objects.contains(&oo) {
                            results.push(Triple::new(ss, pp, oo));
                        }
                    }
                }
            }
            (Some(ss), Some(pp), None) => {
                if let Some(pred_map) = self.spo.get(&ss) {
                    if let Some(objects) = pred_map.get(&pp) {
                        for &obj in objects {
                            results.push(Triple::new(ss, pp, obj));
                        }
                    }
                }
            }
            (Some(ss), None, Some(oo)) => {
                if let Some(obj_map) = self.sop.get(&ss) {
                    if let Some(predicates) = obj_map.get(&oo) {
                        for &pred in predicates {
                            results.push(Triple::new(ss, pred, oo));
                        }
                    }
                }
            }
            (None, Some(pp), Some(oo)) => {
                if let Some(obj_map) = self.pos.get(&pp) {
                    if let Some(subjects) = obj_map.get(&oo) {
                        for &subj in subjects {
                            results.push(Triple::new(subj, pp, oo));
                        }
                    }
                }
            }
            (Some(ss), None, None) => {
                if let Some(pred_map) = self.spo.get(&ss) {
                    for (&pred, objects) in pred_map {
                        for &obj in objects {
                            results.push(Triple::new(ss, pred, obj));
                        }
                    }
                }
            }
            (None, Some(pp), None) => {
                if let Some(subj_map) = self.pso.get(&pp) {
                    for (&subj, objects) in subj_map {
                        for &obj in objects {
                            results.push(Triple::new(subj, pp, obj));
                        }
                    }
                }
            }
            (None, None, Some(oo)) => {
                if let Some(pred_map) = self.ops.get(&oo) {
                    for (&pred, subjects) in pred_map {
                        for &subj in subjects {
                            results.push(Triple::new(subj, pred, oo));
                        }
                    }
                }
            }
            (None, None, None) => {
                for (&subj, pred_map) in &self.spo {
                    for (&pred, objects) in pred_map {
                        for &obj in objects {
                            results.push(Triple::new(subj, pred, obj));
                        }
                    }
                }
            }
        }

        results
    }

    fn len(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.spo.clear();
        self.pos.clear();
        self.osp.clear();
        self.pso.clear();
        self.ops.clear();
        self.sop.clear();
        self.count = 0;
    }

    fn build_from(&mut self, triples: &[Triple]) {
        self.build_parallel(triples);
    }
}

fn remove_from_nested(index: &mut NestedMap, key1: u32, key2: u32, value: u32) {
    if let Some(inner_map) = index.get_mut(&key1) {
        if let Some(set) = inner_map.get_mut(&key2) {
            set.remove(&value);
            if set.is_empty() {
                inner_map.remove(&key2);
            }
        }
        if inner_map.is_empty() {
            index.remove(&key1);
        }
    }
}

/// Reduced indexing: one ordered set keyed (s, p, o). Subject-bound lookups
/// run as range scans, everything else falls back to a filtered scan. Far
/// smaller than the six-permutation index, slower on predicate/object-bound
/// patterns, result-identical by construction.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    triples: BTreeSet<Triple>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan_subject(&self, s: u32) -> impl Iterator<Item = &Triple> {
        let lo = Triple::new(s, 0, 0);
        let hi = Triple::new(s, u32::MAX, u32::MAX);
        self.triples
            .range((Bound::Included(lo), Bound::Included(hi)))
    }
}

impl TripleIndex for TreeIndex {
    fn insert(&mut self, triple: &Triple) -> bool {
        self.triples.insert(*triple)
    }

    fn delete(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    fn query(&self, s: Option<u32>, p: Option<u32>, o: Option<u32>) -> Vec<Triple> {
        let keep = |t: &Triple| {
            p.map_or(true, |pp| t.predicate == pp) && o.map_or(true, |oo| t.object == oo)
        };
        match s {
            Some(ss) => self
                .scan_subject(ss)
                .filter(|t| keep(t))
                .copied()
                .collect(),
            None => self.triples.iter().filter(|t| keep(t)).copied().collect(),
        }
    }

    fn len(&self) -> usize {
        self.triples.len()
    }

    fn clear(&mut self) {
        self.triples.clear();
    }

    fn build_from(&mut self, triples: &[Triple]) {
        self.triples = triples.iter().copied().collect();
    }
}
