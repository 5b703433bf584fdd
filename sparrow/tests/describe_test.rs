/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate sparrow;
use model::index::IndexingMode;
use sparrow::describe::{DescriberKind, RDFS_LABEL};
use sparrow::error::QueryError;
use sparrow::evaluator::{execute, DescribeTarget, QueryForm};
use sparrow::graph::{Dataset, Graph};

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "http://example.org/alice";
    const BOB: &str = "http://example.org/bob";
    const ACME: &str = "http://example.org/acme";

    fn setup_graph() -> Graph {
        let mut g = Graph::new(IndexingMode::Full);
        g.insert_parts(ALICE, "ex:name", "Alice");
        g.insert_parts(ALICE, "ex:address", "_:addr");
        g.insert_parts("_:addr", "ex:street", "Main St 1");
        g.insert_parts("_:addr", "ex:city", "Springfield");
        g.insert_parts(BOB, "ex:knows", ALICE);
        g.insert_parts(BOB, "ex:worksFor", ACME);
        g.insert_parts(ACME, RDFS_LABEL, "ACME Corp");
        g.insert_parts(ACME, "ex:industry", "Technology");
        g
    }

    fn seed(g: &Graph, iri: &str) -> u32 {
        g.dictionary.lookup(iri).expect("seed not interned")
    }

    fn is_subgraph(inner: &Graph, outer: &Graph) -> bool {
        inner.all_triples().iter().all(|t| {
            let (Some(s), Some(p), Some(o)) = (
                inner.decode(t.subject),
                inner.decode(t.predicate),
                inner.decode(t.object),
            ) else {
                return false;
            };
            outer.contains_parts(s, p, o)
        })
    }

    #[test]
    fn cbd_follows_blank_objects_only() {
        let g = setup_graph();
        let out = DescriberKind::ConciseBounded
            .build()
            .describe(&[seed(&g, ALICE)], &g);

        assert!(out.contains_parts(ALICE, "ex:name", "Alice"));
        assert!(out.contains_parts("_:addr", "ex:street", "Main St 1"));
        assert!(out.contains_parts("_:addr", "ex:city", "Springfield"));
        assert!(
            !out.contains_parts(BOB, "ex:knows", ALICE),
            "CBD never walks inbound edges"
        );
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn scbd_adds_inbound_edges_and_contains_cbd() {
        let g = setup_graph();
        let id = seed(&g, ALICE);
        let cbd = DescriberKind::ConciseBounded.build().describe(&[id], &g);
        let scbd = DescriberKind::SymmetricConciseBounded
            .build()
            .describe(&[id], &g);

        assert!(scbd.contains_parts(BOB, "ex:knows", ALICE));
        assert!(is_subgraph(&cbd, &scbd));
        assert!(is_subgraph(&scbd, &g), "descriptions never invent triples");
    }

    #[test]
    fn simple_variants_do_not_recurse() {
        let g = setup_graph();
        let id = seed(&g, ALICE);

        let subject = DescriberKind::SimpleSubject.build().describe(&[id], &g);
        assert_eq!(subject.len(), 2, "name and address, nothing about the blank node");
        assert!(!subject.contains_parts("_:addr", "ex:street", "Main St 1"));

        let both = DescriberKind::SimpleSubjectObject.build().describe(&[id], &g);
        assert_eq!(both.len(), 3);
        assert!(both.contains_parts(BOB, "ex:knows", ALICE));
        assert!(is_subgraph(&subject, &both));
    }

    #[test]
    fn minimal_spanning_connects_the_seeds() {
        let mut g = setup_graph();
        g.insert_parts(ALICE, "ex:rival", BOB);
        let out = DescriberKind::MinimalSpanning
            .build()
            .describe(&[seed(&g, BOB), seed(&g, ACME)], &g);

        // Bob and ACME are one hop apart; the connecting edge and nothing
        // further away must appear.
        assert!(out.contains_parts(BOB, "ex:worksFor", ACME));
        assert!(!out.contains_parts(ALICE, "ex:name", "Alice"));
        assert!(is_subgraph(&out, &g));
    }

    #[test]
    fn minimal_spanning_degrades_to_subject_triples() {
        let mut g = setup_graph();
        g.insert_parts("ex:island", "ex:name", "Elba");
        let lone = DescriberKind::MinimalSpanning
            .build()
            .describe(&[seed(&g, BOB)], &g);
        assert_eq!(lone.len(), 2, "a lone seed keeps its subject triples");

        let unreachable = DescriberKind::MinimalSpanning
            .build()
            .describe(&[seed(&g, BOB), seed(&g, "ex:island")], &g);
        assert!(
            unreachable.contains_parts("ex:island", "ex:name", "Elba"),
            "an unreachable seed is not silently dropped"
        );
    }

    #[test]
    fn labelled_description_pulls_in_labels() {
        let g = setup_graph();
        let out = DescriberKind::Labelled
            .build()
            .describe(&[seed(&g, BOB)], &g);

        assert!(out.contains_parts(BOB, "ex:knows", ALICE));
        assert!(out.contains_parts(BOB, "ex:worksFor", ACME));
        assert!(
            out.contains_parts(ACME, RDFS_LABEL, "ACME Corp"),
            "referenced resources bring one label each"
        );
        assert!(
            !out.contains_parts(ACME, "ex:industry", "Technology"),
            "labels only, not full descriptions of neighbours"
        );
    }

    #[test]
    fn cyclic_blank_nodes_terminate() {
        let mut g = Graph::new(IndexingMode::Full);
        g.insert_parts(ALICE, "ex:part", "_:a");
        g.insert_parts("_:a", "ex:next", "_:b");
        g.insert_parts("_:b", "ex:next", "_:a");
        let out = DescriberKind::ConciseBounded
            .build()
            .describe(&[seed(&g, ALICE)], &g);
        assert_eq!(out.len(), 3, "the blank cycle is walked exactly once");

        let sym = DescriberKind::SymmetricConciseBounded
            .build()
            .describe(&[seed(&g, ALICE)], &g);
        assert_eq!(sym.len(), 3);
    }

    #[test]
    fn literal_spelled_like_a_blank_id_is_not_followed() {
        use model::node::Node;
        let mut g = Graph::new(IndexingMode::Full);
        g.insert(&Node::iri(ALICE), &Node::iri("ex:note"), &Node::literal("_:addr"));
        g.insert(
            &Node::blank("addr"),
            &Node::iri("ex:street"),
            &Node::literal("Main St 1"),
        );
        let id = g
            .dictionary
            .lookup(&Node::iri(ALICE).canonical_form())
            .expect("seed not interned");
        let out = DescriberKind::ConciseBounded.build().describe(&[id], &g);
        assert_eq!(out.len(), 1, "the note is a literal, not the blank node");
    }

    #[test]
    fn empty_seeds_describe_the_empty_graph() {
        let g = setup_graph();
        for kind in [
            DescriberKind::ConciseBounded,
            DescriberKind::SymmetricConciseBounded,
            DescriberKind::SimpleSubject,
            DescriberKind::SimpleSubjectObject,
            DescriberKind::MinimalSpanning,
            DescriberKind::Labelled,
        ] {
            let out = kind.build().describe(&[], &g);
            assert!(out.is_empty(), "{:?} over no seeds must be empty", kind);
        }
    }

    #[test]
    fn kinds_resolve_from_names() {
        assert_eq!(
            DescriberKind::from_name("cbd").expect("cbd"),
            DescriberKind::ConciseBounded
        );
        assert_eq!(
            DescriberKind::from_name("symmetric-concise-bounded").expect("scbd"),
            DescriberKind::SymmetricConciseBounded
        );
        assert!(matches!(
            DescriberKind::from_name("holographic"),
            Err(QueryError::UnknownDescriber(name)) if name == "holographic"
        ));
    }

    #[test]
    fn describe_runs_as_a_query_form() {
        let g = setup_graph();
        let dataset = Dataset::with_default(g);
        let outcome = execute(
            &model::algebra::Algebra::Bgp(vec![(
                model::algebra::Term::var("s"),
                model::algebra::Term::constant("ex:knows"),
                model::algebra::Term::var("o"),
            )]),
            &QueryForm::Describe {
                targets: vec![DescribeTarget::Var("s".to_string())],
                describer: DescriberKind::SimpleSubject,
            },
            &dataset,
        )
        .expect("execute failed");
        let out = outcome.as_graph().expect("DESCRIBE yields a graph");
        assert!(out.contains_parts(BOB, "ex:knows", ALICE));
        assert!(out.contains_parts(BOB, "ex:worksFor", ACME));
        assert_eq!(out.len(), 2);
    }
}
