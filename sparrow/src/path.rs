/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Property-path evaluation as reachability search over the index.
//!
//! Closure operators (`*`, `+`) never materialize the full transitive
//! closure when an endpoint is bound: they run a breadth-first search from
//! the bound endpoint with a per-traversal visited set, so cyclic data
//! terminates and large graphs stay cheap for point queries. The
//! unoptimized fixpoint evaluator is kept as `eval_path_reference`; both
//! must produce the same relation on any graph.

use crate::graph::Graph;
use log::debug;
use model::algebra::{PathExpr, Term};
use model::binding::{try_bind, Binding, Bindings};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Evaluate `subject path object` under an outer binding, producing solution
/// rows. Variables already bound in `seed` act as constants.
pub fn eval_path_pattern(
    subject: &Term,
    path: &PathExpr,
    object: &Term,
    seed: &Binding,
    graph: &Graph,
) -> Bindings {
    let s_id = match resolve_endpoint(subject, seed, graph) {
        Ok(id) => id,
        Err(()) => return Vec::new(),
    };
    let o_id = match resolve_endpoint(object, seed, graph) {
        Ok(id) => id,
        Err(()) => return Vec::new(),
    };

    let pairs = eval_pairs(s_id, path, o_id, graph);
    debug!(
        "path produced {} pairs (s bound: {}, o bound: {})",
        pairs.len(),
        s_id.is_some(),
        o_id.is_some()
    );

    let mut out = Vec::new();
    for (s, o) in pairs {
        let mut row = seed.clone();
        let bound = bind_endpoint(&mut row, subject, s, graph)
            && bind_endpoint(&mut row, object, o, graph);
        if bound {
            out.push(row);
        }
    }
    out
}

/// `Err(())` means a constant endpoint the store never interned: the path
/// matches nothing.
fn resolve_endpoint(term: &Term, seed: &Binding, graph: &Graph) -> Result<Option<u32>, ()> {
    match term {
        Term::Constant(value) => graph.dictionary.lookup(value).map(Some).ok_or(()),
        Term::Variable(name) => match seed.get(name) {
            Some(value) => graph.dictionary.lookup(value).map(Some).ok_or(()),
            None => Ok(None),
        },
    }
}

fn bind_endpoint(row: &mut Binding, term: &Term, id: u32, graph: &Graph) -> bool {
    match term {
        Term::Constant(_) => true,
        Term::Variable(name) => graph
            .decode(id)
            .map_or(false, |value| try_bind(row, name, value)),
    }
}

/// Endpoint-directed pair enumeration. Non-closure operators compose
/// recursively; closure operators search from whichever endpoint is bound.
pub fn eval_pairs(
    s: Option<u32>,
    path: &PathExpr,
    o: Option<u32>,
    graph: &Graph,
) -> Vec<(u32, u32)> {
    match path {
        PathExpr::Pred(iri) => match graph.dictionary.lookup(iri) {
            Some(pid) => graph
                .query_ids(s, Some(pid), o)
                .into_iter()
                .map(|t| (t.subject, t.object))
                .collect(),
            None => Vec::new(),
        },
        PathExpr::Inverse(inner) => eval_pairs(o, inner, s, graph)
            .into_iter()
            .map(|(a, b)| (b, a))
            .collect(),
        PathExpr::Alt(a, b) => {
            let mut pairs = eval_pairs(s, a, o, graph);
            pairs.extend(eval_pairs(s, b, o, graph));
            pairs
        }
        PathExpr::Seq(a, b) => {
            if s.is_some() || o.is_none() {
                // Walk left-to-right, pinning the midpoint.
                let mut out = Vec::new();
                for (x, mid) in eval_pairs(s, a, None, graph) {
                    for (_, y) in eval_pairs(Some(mid), b, o, graph) {
                        out.push((x, y));
                    }
                }
                out
            } else {
                // Only the object is bound: walk right-to-left instead.
                let mut out = Vec::new();
                for (mid, y) in eval_pairs(None, b, o, graph) {
                    for (x, _) in eval_pairs(None, a, Some(mid), graph) {
                        out.push((x, y));
                    }
                }
                out
            }
        }
        PathExpr::ZeroOrOne(inner) => {
            let mut pairs: FxHashSet<(u32, u32)> =
                eval_pairs(s, inner, o, graph).into_iter().collect();
            match (s, o) {
                (Some(ss), Some(oo)) => {
                    if ss == oo {
                        pairs.insert((ss, ss));
                    }
                }
                (Some(ss), None) => {
                    pairs.insert((ss, ss));
                }
                (None, Some(oo)) => {
                    pairs.insert((oo, oo));
                }
                (None, None) => {
                    for id in graph.term_ids() {
                        pairs.insert((id, id));
                    }
                }
            }
            pairs.into_iter().collect()
        }
        PathExpr::ZeroOrMore(inner) => closure_pairs(s, inner, o, graph, true),
        PathExpr::OneOrMore(inner) => closure_pairs(s, inner, o, graph, false),
    }
}

/// Cycle-safe transitive closure, directed by whichever endpoint is bound.
/// Set semantics: each (start, reached) pair appears once.
fn closure_pairs(
    s: Option<u32>,
    inner: &PathExpr,
    o: Option<u32>,
    graph: &Graph,
    include_zero: bool,
) -> Vec<(u32, u32)> {
    match (s, o) {
        (Some(ss), _) => {
            let reached = traverse(ss, graph, include_zero, |n, g| successors(n, inner, g));
            reached
                .into_iter()
                .filter(|r| o.map_or(true, |oo| oo == *r))
                .map(|r| (ss, r))
                .collect()
        }
        (None, Some(oo)) => {
            // Only the object is bound: search backwards.
            let reached = traverse(oo, graph, include_zero, |n, g| predecessors(n, inner, g));
            reached.into_iter().map(|r| (r, oo)).collect()
        }
        (None, None) => {
            let mut out = Vec::new();
            for start in graph.term_ids() {
                let reached =
                    traverse(start, graph, include_zero, |n, g| successors(n, inner, g));
                for r in reached {
                    out.push((start, r));
                }
            }
            out
        }
    }
}

/// BFS with a per-traversal visited set; terminates on cycles. With
/// `include_zero` the start node itself is part of the result (zero-length
/// path).
fn traverse(
    start: u32,
    graph: &Graph,
    include_zero: bool,
    step: impl Fn(u32, &Graph) -> Vec<u32>,
) -> Vec<u32> {
    let mut visited: FxHashSet<u32> = FxHashSet::default();
    let mut queue: VecDeque<u32> = VecDeque::new();
    let mut out = Vec::new();

    if include_zero {
        visited.insert(start);
        out.push(start);
    }
    for next in step(start, graph) {
        if visited.insert(next) {
            out.push(next);
            queue.push_back(next);
        }
    }
    while let Some(node) = queue.pop_front() {
        for next in step(node, graph) {
            if visited.insert(next) {
                out.push(next);
                queue.push_back(next);
            }
        }
    }
    out
}

fn successors(node: u32, path: &PathExpr, graph: &Graph) -> Vec<u32> {
    let mut seen = FxHashSet::default();
    eval_pairs(Some(node), path, None, graph)
        .into_iter()
        .filter_map(|(_, o)| seen.insert(o).then_some(o))
        .collect()
}

fn predecessors(node: u32, path: &PathExpr, graph: &Graph) -> Vec<u32> {
    let mut seen = FxHashSet::default();
    eval_pairs(None, path, Some(node), graph)
        .into_iter()
        .filter_map(|(s, _)| seen.insert(s).then_some(s))
        .collect()
}

/// Unoptimized golden evaluator: materializes the whole relation by naive
/// fixpoint iteration, no endpoint-directed search. Kept for conformance
/// testing against the optimized path; must agree on any graph.
pub fn eval_path_reference(path: &PathExpr, graph: &Graph) -> FxHashSet<(u32, u32)> {
    match path {
        PathExpr::Pred(iri) => match graph.dictionary.lookup(iri) {
            Some(pid) => graph
                .query_ids(None, Some(pid), None)
                .into_iter()
                .map(|t| (t.subject, t.object))
                .collect(),
            None => FxHashSet::default(),
        },
        PathExpr::Inverse(inner) => eval_path_reference(inner, graph)
            .into_iter()
            .map(|(a, b)| (b, a))
            .collect(),
        PathExpr::Alt(a, b) => {
            let mut rel = eval_path_reference(a, graph);
            rel.extend(eval_path_reference(b, graph));
            rel
        }
        PathExpr::Seq(a, b) => {
            let left = eval_path_reference(a, graph);
            let right = eval_path_reference(b, graph);
            compose(&left, &right)
        }
        PathExpr::ZeroOrOne(inner) => {
            let mut rel = eval_path_reference(inner, graph);
            for id in graph.term_ids() {
                rel.insert((id, id));
            }
            rel
        }
        PathExpr::ZeroOrMore(inner) => {
            let edges = eval_path_reference(inner, graph);
            let mut rel: FxHashSet<(u32, u32)> = edges.clone();
            for id in graph.term_ids() {
                rel.insert((id, id));
            }
            fixpoint(rel, &edges)
        }
        PathExpr::OneOrMore(inner) => {
            let edges = eval_path_reference(inner, graph);
            fixpoint(edges.clone(), &edges)
        }
    }
}

fn compose(left: &FxHashSet<(u32, u32)>, right: &FxHashSet<(u32, u32)>) -> FxHashSet<(u32, u32)> {
    let mut out = FxHashSet::default();
    for &(a, m1) in left {
        for &(m2, b) in right {
            if m1 == m2 {
                out.insert((a, b));
            }
        }
    }
    out
}

fn fixpoint(mut rel: FxHashSet<(u32, u32)>, edges: &FxHashSet<(u32, u32)>) -> FxHashSet<(u32, u32)> {
    loop {
        let grown = compose(&rel, edges);
        let before = rel.len();
        rel.extend(grown);
        if rel.len() == before {
            return rel;
        }
    }
}
