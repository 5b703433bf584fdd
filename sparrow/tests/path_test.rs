/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate sparrow;
use model::algebra::{Algebra, PathExpr, Term};
use model::index::IndexingMode;
use sparrow::evaluator::evaluate;
use sparrow::graph::{Dataset, Graph};
use sparrow::path::{eval_pairs, eval_path_reference};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rustc_hash::FxHashSet;

    const KNOWS: &str = "http://example.org/knows";
    const LIKES: &str = "http://example.org/likes";

    fn node(i: usize) -> String {
        format!("http://example.org/n{}", i)
    }

    fn chain_graph(len: usize) -> Graph {
        let mut g = Graph::new(IndexingMode::Full);
        for i in 0..len - 1 {
            g.insert_parts(&node(i), KNOWS, &node(i + 1));
        }
        g
    }

    fn cyclic_graph() -> Graph {
        let mut g = Graph::new(IndexingMode::Full);
        g.insert_parts(&node(0), KNOWS, &node(1));
        g.insert_parts(&node(1), KNOWS, &node(2));
        g.insert_parts(&node(2), KNOWS, &node(0));
        g
    }

    fn optimized_relation(path: &PathExpr, g: &Graph) -> FxHashSet<(u32, u32)> {
        eval_pairs(None, path, None, g).into_iter().collect()
    }

    fn assert_agrees(path: &PathExpr, g: &Graph) {
        let reference = eval_path_reference(path, g);
        assert_eq!(
            optimized_relation(path, g),
            reference,
            "full relation diverged for {:?}",
            path
        );

        // Every bound-subject and bound-object point query must agree with
        // the corresponding slice of the reference relation.
        for id in g.term_ids() {
            let forward: FxHashSet<(u32, u32)> =
                eval_pairs(Some(id), path, None, g).into_iter().collect();
            let expected: FxHashSet<(u32, u32)> =
                reference.iter().copied().filter(|(s, _)| *s == id).collect();
            assert_eq!(forward, expected, "subject-bound slice diverged for {:?}", path);

            let backward: FxHashSet<(u32, u32)> =
                eval_pairs(None, path, Some(id), g).into_iter().collect();
            let expected: FxHashSet<(u32, u32)> =
                reference.iter().copied().filter(|(_, o)| *o == id).collect();
            assert_eq!(backward, expected, "object-bound slice diverged for {:?}", path);
        }
    }

    #[test]
    fn simple_operators_match_the_reference() {
        let g = chain_graph(6);
        let p = PathExpr::pred(KNOWS);
        assert_agrees(&p, &g);
        assert_agrees(&PathExpr::Inverse(Box::new(p.clone())), &g);
        assert_agrees(
            &PathExpr::Seq(Box::new(p.clone()), Box::new(p.clone())),
            &g,
        );
        assert_agrees(&PathExpr::ZeroOrOne(Box::new(p)), &g);
    }

    #[test]
    fn closure_operators_match_the_reference() {
        let g = chain_graph(6);
        let p = PathExpr::pred(KNOWS);
        assert_agrees(&PathExpr::ZeroOrMore(Box::new(p.clone())), &g);
        assert_agrees(&PathExpr::OneOrMore(Box::new(p.clone())), &g);
        assert_agrees(
            &PathExpr::ZeroOrMore(Box::new(PathExpr::Inverse(Box::new(p)))),
            &g,
        );
    }

    #[test]
    fn closure_terminates_on_cycles() {
        let g = cyclic_graph();
        let plus = PathExpr::OneOrMore(Box::new(PathExpr::pred(KNOWS)));
        assert_agrees(&plus, &g);

        // On a 3-cycle, every node reaches every node including itself.
        let start = g.dictionary.lookup(&node(0)).expect("n0 interned");
        let reached: FxHashSet<u32> = eval_pairs(Some(start), &plus, None, &g)
            .into_iter()
            .map(|(_, o)| o)
            .collect();
        assert_eq!(reached.len(), 3);
        assert!(reached.contains(&start), "the cycle returns to its start");
    }

    #[test]
    fn random_graphs_agree_between_evaluators() {
        let mut rng = rand::thread_rng();
        let mut g = Graph::new(IndexingMode::Full);
        for _ in 0..150 {
            let s = node(rng.gen_range(0..40));
            let o = node(rng.gen_range(0..40));
            let p = if rng.gen_bool(0.5) { KNOWS } else { LIKES };
            g.insert_parts(&s, p, &o);
        }

        let knows = PathExpr::pred(KNOWS);
        let likes = PathExpr::pred(LIKES);
        let paths = vec![
            PathExpr::ZeroOrMore(Box::new(knows.clone())),
            PathExpr::OneOrMore(Box::new(PathExpr::Alt(
                Box::new(knows.clone()),
                Box::new(likes.clone()),
            ))),
            PathExpr::ZeroOrMore(Box::new(PathExpr::Inverse(Box::new(knows.clone())))),
            PathExpr::OneOrMore(Box::new(PathExpr::Seq(
                Box::new(knows),
                Box::new(PathExpr::Inverse(Box::new(likes))),
            ))),
        ];
        for path in &paths {
            let reference = eval_path_reference(path, &g);
            assert_eq!(
                optimized_relation(path, &g),
                reference,
                "relation diverged for {:?}",
                path
            );
            // Spot-check a few bound endpoints rather than the full grid;
            // the relation check already covers the unbound case.
            for id in g.term_ids().into_iter().take(8) {
                let forward: FxHashSet<(u32, u32)> =
                    eval_pairs(Some(id), path, None, &g).into_iter().collect();
                let expected: FxHashSet<(u32, u32)> =
                    reference.iter().copied().filter(|(s, _)| *s == id).collect();
                assert_eq!(forward, expected);
            }
        }
    }

    #[test]
    fn unknown_predicate_matches_nothing() {
        let g = chain_graph(4);
        let path = PathExpr::ZeroOrMore(Box::new(PathExpr::pred("http://example.org/absent")));
        let start = g.dictionary.lookup(&node(0)).expect("n0 interned");
        let pairs = eval_pairs(Some(start), &path, None, &g);
        // Zero-length paths still match the start itself.
        assert_eq!(pairs, vec![(start, start)]);

        let plus = PathExpr::OneOrMore(Box::new(PathExpr::pred("http://example.org/absent")));
        assert!(eval_pairs(Some(start), &plus, None, &g).is_empty());
    }

    #[test]
    fn path_patterns_integrate_with_the_algebra() {
        let g = chain_graph(5);
        let dataset = Dataset::with_default(g);

        // Everything reachable from n0 in one or more hops.
        let query = Algebra::Path(
            Term::constant(node(0)),
            PathExpr::OneOrMore(Box::new(PathExpr::pred(KNOWS))),
            Term::var("reached"),
        );
        let rows = evaluate(&query, &dataset).expect("evaluation failed");
        let reached: FxHashSet<&str> = rows.iter().map(|r| r["reached"].as_str()).collect();
        assert_eq!(reached.len(), 4);
        assert!(reached.contains(node(4).as_str()));

        // A seed binding flowing in through a join constrains the path.
        let query = Algebra::join(
            Algebra::Bgp(vec![(
                Term::var("s"),
                Term::constant(KNOWS),
                Term::constant(node(1)),
            )]),
            Algebra::Path(
                Term::var("s"),
                PathExpr::ZeroOrMore(Box::new(PathExpr::pred(KNOWS))),
                Term::var("reached"),
            ),
        );
        let rows = evaluate(&query, &dataset).expect("evaluation failed");
        assert_eq!(rows.len(), 5, "n0 reaches all five nodes including itself");
        assert!(rows.iter().all(|r| r["s"] == node(0)));
    }
}
