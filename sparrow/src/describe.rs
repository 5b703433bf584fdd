/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! DESCRIBE subgraph extraction. Each variant is a traversal policy over the
//! same index, injected as a strategy at query-construction time. Every
//! traversal tracks visited blank nodes explicitly, so cyclic blank-node
//! graphs terminate.

use crate::error::QueryError;
use crate::graph::Graph;
use model::node::Node;
use model::triple::Triple;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// A describe algorithm: seed ids in, bounded description subgraph out.
/// The result is always a graph, possibly empty, never an error.
pub trait Describer: Send + Sync {
    fn describe(&self, seeds: &[u32], graph: &Graph) -> Graph;
}

/// Closed set of describer variants; explicit construction, no runtime type
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriberKind {
    ConciseBounded,
    SymmetricConciseBounded,
    SimpleSubject,
    SimpleSubjectObject,
    MinimalSpanning,
    Labelled,
}

impl DescriberKind {
    pub fn from_name(name: &str) -> Result<Self, QueryError> {
        match name {
            "cbd" | "concise-bounded" => Ok(DescriberKind::ConciseBounded),
            "scbd" | "symmetric-concise-bounded" => Ok(DescriberKind::SymmetricConciseBounded),
            "subject" => Ok(DescriberKind::SimpleSubject),
            "subject-object" => Ok(DescriberKind::SimpleSubjectObject),
            "minimal-spanning" => Ok(DescriberKind::MinimalSpanning),
            "labelled" => Ok(DescriberKind::Labelled),
            other => Err(QueryError::UnknownDescriber(other.to_string())),
        }
    }

    pub fn build(self) -> Box<dyn Describer> {
        match self {
            DescriberKind::ConciseBounded => Box::new(ConciseBoundedDescription),
            DescriberKind::SymmetricConciseBounded => Box::new(SymmetricConciseBoundedDescription),
            DescriberKind::SimpleSubject => Box::new(SimpleSubjectDescription),
            DescriberKind::SimpleSubjectObject => Box::new(SimpleSubjectObjectDescription),
            DescriberKind::MinimalSpanning => Box::new(MinimalSpanningGraph),
            DescriberKind::Labelled => Box::new(LabelledDescription),
        }
    }
}

fn copy_triple(source: &Graph, out: &mut Graph, triple: &Triple) {
    if let (Some(s), Some(p), Some(o)) = (
        source.decode(triple.subject),
        source.decode(triple.predicate),
        source.decode(triple.object),
    ) {
        out.insert_parts(s, p, o);
    }
}

/// Concise Bounded Description: all subject triples of each seed, recursing
/// into blank-node objects only. Blank nodes are never top-level resources,
/// they are only followed from a parent.
pub struct ConciseBoundedDescription;

impl Describer for ConciseBoundedDescription {
    fn describe(&self, seeds: &[u32], graph: &Graph) -> Graph {
        let mut out = Graph::new(graph.mode());
        let mut visited: FxHashSet<u32> = seeds.iter().copied().collect();
        let mut queue: VecDeque<u32> = seeds.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            for triple in graph.query_ids(Some(id), None, None) {
                copy_triple(graph, &mut out, &triple);
                if graph.is_blank(triple.object) && visited.insert(triple.object) {
                    queue.push_back(triple.object);
                }
            }
        }
        out
    }
}

/// CBD plus the symmetric closure: triples where the seed is object as well,
/// recursing into blank-node subjects. CBD output is a subset of this.
pub struct SymmetricConciseBoundedDescription;

impl Describer for SymmetricConciseBoundedDescription {
    fn describe(&self, seeds: &[u32], graph: &Graph) -> Graph {
        let mut out = Graph::new(graph.mode());
        let mut visited: FxHashSet<u32> = seeds.iter().copied().collect();
        let mut queue: VecDeque<u32> = seeds.iter().copied().collect();

        while let Some(id) = queue.pop_front() {
            for triple in graph.query_ids(Some(id), None, None) {
                copy_triple(graph, &mut out, &triple);
                if graph.is_blank(triple.object) && visited.insert(triple.object) {
                    queue.push_back(triple.object);
                }
            }
            for triple in graph.query_ids(None, None, Some(id)) {
                copy_triple(graph, &mut out, &triple);
                if graph.is_blank(triple.subject) && visited.insert(triple.subject) {
                    queue.push_back(triple.subject);
                }
            }
        }
        out
    }
}

/// Subject triples only, no recursion.
pub struct SimpleSubjectDescription;

impl Describer for SimpleSubjectDescription {
    fn describe(&self, seeds: &[u32], graph: &Graph) -> Graph {
        let mut out = Graph::new(graph.mode());
        for &seed in seeds {
            for triple in graph.query_ids(Some(seed), None, None) {
                copy_triple(graph, &mut out, &triple);
            }
        }
        out
    }
}

/// Subject or object triples, no recursion.
pub struct SimpleSubjectObjectDescription;

impl Describer for SimpleSubjectObjectDescription {
    fn describe(&self, seeds: &[u32], graph: &Graph) -> Graph {
        let mut out = Graph::new(graph.mode());
        for &seed in seeds {
            for triple in graph.query_ids(Some(seed), None, None) {
                copy_triple(graph, &mut out, &triple);
            }
            for triple in graph.query_ids(None, None, Some(seed)) {
                copy_triple(graph, &mut out, &triple);
            }
        }
        out
    }
}

/// Smallest subgraph connecting the seeds: BFS shortest paths from the first
/// seed to each remaining one over direction-ignoring edges, union of the
/// path triples. A lone or unreachable seed contributes its subject triples
/// so no seed is silently dropped.
pub struct MinimalSpanningGraph;

impl Describer for MinimalSpanningGraph {
    fn describe(&self, seeds: &[u32], graph: &Graph) -> Graph {
        let mut out = Graph::new(graph.mode());
        let Some((&root, rest)) = seeds.split_first() else {
            return out;
        };
        if rest.is_empty() {
            for triple in graph.query_ids(Some(root), None, None) {
                copy_triple(graph, &mut out, &triple);
            }
            return out;
        }

        // Parent pointers from an undirected BFS rooted at the first seed.
        let mut parent: rustc_hash::FxHashMap<u32, (u32, Triple)> = rustc_hash::FxHashMap::default();
        let mut visited: FxHashSet<u32> = FxHashSet::default();
        visited.insert(root);
        let mut queue: VecDeque<u32> = VecDeque::new();
        queue.push_back(root);

        while let Some(node) = queue.pop_front() {
            for triple in graph.query_ids(Some(node), None, None) {
                if visited.insert(triple.object) {
                    parent.insert(triple.object, (node, triple));
                    queue.push_back(triple.object);
                }
            }
            for triple in graph.query_ids(None, None, Some(node)) {
                if visited.insert(triple.subject) {
                    parent.insert(triple.subject, (node, triple));
                    queue.push_back(triple.subject);
                }
            }
        }

        for &seed in rest {
            if !visited.contains(&seed) {
                for triple in graph.query_ids(Some(seed), None, None) {
                    copy_triple(graph, &mut out, &triple);
                }
                continue;
            }
            let mut cursor = seed;
            while cursor != root {
                let (prev, triple) = parent[&cursor];
                copy_triple(graph, &mut out, &triple);
                cursor = prev;
            }
        }
        out
    }
}

/// Subject triples plus one rdfs:label triple per referenced resource, for
/// human-readable descriptions.
pub struct LabelledDescription;

impl Describer for LabelledDescription {
    fn describe(&self, seeds: &[u32], graph: &Graph) -> Graph {
        let mut out = Graph::new(graph.mode());
        // Label data may have been loaded typed or as raw canonical forms.
        let label_id = graph
            .dictionary
            .lookup(&Node::iri(RDFS_LABEL).canonical_form())
            .or_else(|| graph.dictionary.lookup(RDFS_LABEL));
        let mut referenced: FxHashSet<u32> = FxHashSet::default();

        for &seed in seeds {
            for triple in graph.query_ids(Some(seed), None, None) {
                copy_triple(graph, &mut out, &triple);
                referenced.insert(triple.object);
            }
        }

        if let Some(label_id) = label_id {
            for id in referenced {
                if let Some(triple) = graph.query_ids(Some(id), Some(label_id), None).first() {
                    copy_triple(graph, &mut out, triple);
                }
            }
        }
        out
    }
}
