/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use log::warn;
use model::algebra::{Term, TriplePattern};
use model::dictionary::Dictionary;
use model::index::{new_index, IndexingMode, TripleIndex};
use model::node::{is_blank_form, Node};
use model::triple::Triple;
use rustc_hash::FxHashMap;

/// An in-memory RDF graph: a node dictionary plus a triple index. The
/// indexing strategy is chosen at construction and never changes for the
/// graph's lifetime.
#[derive(Debug)]
pub struct Graph {
    pub dictionary: Dictionary,
    index: Box<dyn TripleIndex>,
    mode: IndexingMode,
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new(IndexingMode::Full)
    }
}

impl Graph {
    pub fn new(mode: IndexingMode) -> Self {
        Graph {
            dictionary: Dictionary::new(),
            index: new_index(mode),
            mode,
        }
    }

    pub fn mode(&self) -> IndexingMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Insert a typed triple. Positional rules are enforced here: a literal
    /// subject or a non-IRI predicate is rejected.
    pub fn insert(&mut self, subject: &Node, predicate: &Node, object: &Node) -> bool {
        if !subject.valid_subject() || !predicate.valid_predicate() {
            warn!(
                "rejecting ill-positioned triple: {} {} {}",
                subject, predicate, object
            );
            return false;
        }
        let triple = Triple::new(
            self.dictionary.encode_node(subject),
            self.dictionary.encode_node(predicate),
            self.dictionary.encode_node(object),
        );
        self.index.insert(&triple)
    }

    /// Insert from raw canonical forms. Used by tests and bulk loaders that
    /// already hold canonical strings.
    pub fn insert_parts(&mut self, subject: &str, predicate: &str, object: &str) -> bool {
        let triple = Triple::new(
            self.dictionary.encode(subject),
            self.dictionary.encode(predicate),
            self.dictionary.encode(object),
        );
        self.index.insert(&triple)
    }

    pub fn remove(&mut self, subject: &Node, predicate: &Node, object: &Node) -> bool {
        match (
            self.dictionary.lookup(&subject.canonical_form()),
            self.dictionary.lookup(&predicate.canonical_form()),
            self.dictionary.lookup(&object.canonical_form()),
        ) {
            (Some(s), Some(p), Some(o)) => self.index.delete(&Triple::new(s, p, o)),
            _ => false,
        }
    }

    pub fn remove_parts(&mut self, subject: &str, predicate: &str, object: &str) -> bool {
        match (
            self.dictionary.lookup(subject),
            self.dictionary.lookup(predicate),
            self.dictionary.lookup(object),
        ) {
            (Some(s), Some(p), Some(o)) => self.index.delete(&Triple::new(s, p, o)),
            _ => false,
        }
    }

    pub fn contains_parts(&self, subject: &str, predicate: &str, object: &str) -> bool {
        match (
            self.dictionary.lookup(subject),
            self.dictionary.lookup(predicate),
            self.dictionary.lookup(object),
        ) {
            (Some(s), Some(p), Some(o)) => self.index.contains(&Triple::new(s, p, o)),
            _ => false,
        }
    }

    /// Raw id-level pattern lookup.
    pub fn query_ids(&self, s: Option<u32>, p: Option<u32>, o: Option<u32>) -> Vec<Triple> {
        self.index.query(s, p, o)
    }

    pub fn all_triples(&self) -> Vec<Triple> {
        self.index.query(None, None, None)
    }

    /// Resolve a pattern term to an id slot. `Err(())` means the constant
    /// was never interned here, so the pattern cannot match anything.
    pub fn resolve_term(&self, term: &Term) -> Result<Option<u32>, ()> {
        match term {
            Term::Variable(_) => Ok(None),
            Term::Constant(value) => self.dictionary.lookup(value).map(Some).ok_or(()),
        }
    }

    /// All triples matching a pattern, with unresolvable constants yielding
    /// the empty set rather than an error.
    pub fn match_pattern(&self, pattern: &TriplePattern) -> Vec<Triple> {
        let (s, p, o) = pattern;
        match (
            self.resolve_term(s),
            self.resolve_term(p),
            self.resolve_term(o),
        ) {
            (Ok(s), Ok(p), Ok(o)) => self.index.query(s, p, o),
            _ => Vec::new(),
        }
    }

    pub fn decode(&self, id: u32) -> Option<&str> {
        self.dictionary.decode(id)
    }

    pub fn is_blank(&self, id: u32) -> bool {
        self.dictionary.decode(id).map_or(false, is_blank_form)
    }

    /// Every id that occurs in subject or object position.
    pub fn term_ids(&self) -> Vec<u32> {
        let mut seen = FxHashMap::default();
        for triple in self.all_triples() {
            seen.entry(triple.subject).or_insert(());
            seen.entry(triple.object).or_insert(());
        }
        let mut ids: Vec<u32> = seen.into_keys().collect();
        ids.sort_unstable();
        ids
    }
}

/// A dataset: one default graph plus named graphs keyed by IRI. Queries
/// address the default graph unless a named graph is selected.
#[derive(Debug, Default)]
pub struct Dataset {
    pub default: Graph,
    pub named: FxHashMap<String, Graph>,
}

impl Dataset {
    pub fn new(mode: IndexingMode) -> Self {
        Dataset {
            default: Graph::new(mode),
            named: FxHashMap::default(),
        }
    }

    pub fn with_default(graph: Graph) -> Self {
        Dataset {
            default: graph,
            named: FxHashMap::default(),
        }
    }

    pub fn insert_named(&mut self, iri: impl Into<String>, graph: Graph) {
        self.named.insert(iri.into(), graph);
    }

    pub fn graph(&self, name: Option<&str>) -> Option<&Graph> {
        match name {
            None => Some(&self.default),
            Some(iri) => self.named.get(iri),
        }
    }
}
