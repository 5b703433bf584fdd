/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Recursive-descent evaluation of the algebra tree. Every node consumes the
//! solution multisets of its children and produces its own; bag semantics
//! throughout unless DISTINCT collapses duplicates.

use crate::describe::DescriberKind;
use crate::error::QueryError;
use crate::expression::{compare_raw, eval_expression, Value};
use crate::graph::{Dataset, Graph};
use crate::path::eval_path_pattern;
use crate::results::{QueryOutcome, ResultSet};
use log::debug;
use model::algebra::{
    Aggregate, Algebra, Expression, OrderCondition, SortDirection, Term, TriplePattern,
};
use model::binding::{compatible, merge, try_bind, Binding, Bindings};
use rand::seq::SliceRandom;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

/// The query form wrapped around a WHERE-clause algebra tree.
#[derive(Debug, Clone)]
pub enum QueryForm {
    /// Project the listed variables; an empty list keeps every variable.
    Select(Vec<String>),
    Ask,
    Construct(Vec<TriplePattern>),
    Describe {
        targets: Vec<DescribeTarget>,
        describer: DescriberKind,
    },
}

#[derive(Debug, Clone)]
pub enum DescribeTarget {
    Var(String),
    Iri(String),
}

/// Evaluate a WHERE-clause algebra tree against the dataset's default graph.
/// Zero solutions is a well-formed empty multiset, not an error.
pub fn evaluate(algebra: &Algebra, dataset: &Dataset) -> Result<Bindings, QueryError> {
    evaluate_in(algebra, dataset, None)
}

/// Evaluate against a selected graph: the default one for `None`, a named
/// graph otherwise. A name the dataset does not hold is an error, not an
/// empty result.
pub fn evaluate_in(
    algebra: &Algebra,
    dataset: &Dataset,
    graph_name: Option<&str>,
) -> Result<Bindings, QueryError> {
    validate(algebra)?;
    let graph = dataset
        .graph(graph_name)
        .ok_or_else(|| QueryError::UnknownGraph(graph_name.unwrap_or_default().to_string()))?;
    Ok(eval_seeded(algebra, &Binding::new(), graph))
}

/// Evaluate a full query: WHERE clause plus query form.
pub fn execute(
    algebra: &Algebra,
    form: &QueryForm,
    dataset: &Dataset,
) -> Result<QueryOutcome, QueryError> {
    let rows = evaluate(algebra, dataset)?;
    let graph = &dataset.default;
    match form {
        QueryForm::Select(vars) => Ok(QueryOutcome::Solutions(project(rows, vars))),
        QueryForm::Ask => Ok(QueryOutcome::Boolean(!rows.is_empty())),
        QueryForm::Construct(template) => Ok(QueryOutcome::Graph(construct(template, &rows, graph))),
        QueryForm::Describe { targets, describer } => {
            let seeds = describe_seeds(targets, &rows, graph);
            Ok(QueryOutcome::Graph(describer.build().describe(&seeds, graph)))
        }
    }
}

/// Reject structurally unusable trees before evaluation starts.
pub fn validate(algebra: &Algebra) -> Result<(), QueryError> {
    match algebra {
        Algebra::Table => Ok(()),
        Algebra::Bgp(patterns) => {
            for (s, p, o) in patterns {
                for term in [s, p, o] {
                    if let Term::Variable(name) = term {
                        if name.is_empty() {
                            return Err(QueryError::InvalidAlgebra(
                                "empty variable name in triple pattern".into(),
                            ));
                        }
                    }
                }
            }
            Ok(())
        }
        Algebra::Join(l, r) | Algebra::Union(l, r) => {
            validate(l)?;
            validate(r)
        }
        Algebra::LeftJoin(l, r, _) => {
            validate(l)?;
            validate(r)
        }
        Algebra::Filter(_, inner)
        | Algebra::Extend(inner, _, _)
        | Algebra::Having(_, inner)
        | Algebra::Distinct(inner)
        | Algebra::Slice(inner, _, _) => validate(inner),
        Algebra::Group(inner, keys, aggregates) => {
            if keys.is_empty() && aggregates.is_empty() {
                return Err(QueryError::InvalidAlgebra(
                    "group with neither keys nor aggregates".into(),
                ));
            }
            validate(inner)
        }
        Algebra::OrderBy(inner, conditions) => {
            if conditions.is_empty() {
                return Err(QueryError::InvalidAlgebra(
                    "order by with no sort conditions".into(),
                ));
            }
            validate(inner)
        }
        Algebra::Path(subject, _, object) => {
            for term in [subject, object] {
                if let Term::Variable(name) = term {
                    if name.is_empty() {
                        return Err(QueryError::InvalidAlgebra(
                            "empty variable name in path endpoint".into(),
                        ));
                    }
                }
            }
            Ok(())
        }
    }
}

/// Evaluate with an outer binding injected as the initial solution. The seed
/// is how correlated EXISTS works: variables bound in the outer scope act as
/// constants in every pattern and expression of the sub-evaluation.
fn eval_seeded(algebra: &Algebra, seed: &Binding, graph: &Graph) -> Bindings {
    match algebra {
        Algebra::Table => vec![seed.clone()],
        Algebra::Bgp(patterns) => {
            let mut rows = vec![seed.clone()];
            for pattern in patterns {
                rows = extend_by_pattern(rows, pattern, graph);
                if rows.is_empty() {
                    break;
                }
            }
            rows
        }
        Algebra::Join(left, right) => {
            let left_rows = eval_seeded(left, seed, graph);
            if left_rows.is_empty() {
                return Vec::new();
            }
            let right_rows = eval_seeded(right, seed, graph);
            join(left_rows, right_rows)
        }
        Algebra::LeftJoin(left, right, filter) => {
            let left_rows = eval_seeded(left, seed, graph);
            let right_rows = eval_seeded(right, seed, graph);
            left_join(left_rows, right_rows, filter.as_ref(), graph)
        }
        Algebra::Union(left, right) => {
            let mut rows = eval_seeded(left, seed, graph);
            rows.extend(eval_seeded(right, seed, graph));
            rows
        }
        Algebra::Filter(expr, inner) => {
            let rows = eval_seeded(inner, seed, graph);
            apply_filter(rows, expr, graph)
        }
        Algebra::Extend(inner, var, expr) => {
            let mut rows = eval_seeded(inner, seed, graph);
            for row in &mut rows {
                if row.contains_key(var) {
                    debug!("BIND target ?{} already bound, leaving row unchanged", var);
                    continue;
                }
                // An erroring BIND leaves the variable unbound, not the
                // query aborted.
                if let Ok(value) = eval_expression(expr, row, graph) {
                    row.insert(var.clone(), value.display());
                }
            }
            rows
        }
        Algebra::Group(inner, keys, aggregates) => {
            let rows = eval_seeded(inner, seed, graph);
            group(rows, keys, aggregates)
        }
        Algebra::Having(expr, inner) => {
            let rows = eval_seeded(inner, seed, graph);
            apply_filter(rows, expr, graph)
        }
        Algebra::Path(subject, path, object) => {
            eval_path_pattern(subject, path, object, seed, graph)
        }
        Algebra::Distinct(inner) => {
            let rows = eval_seeded(inner, seed, graph);
            let mut seen: FxHashSet<Vec<(String, String)>> = FxHashSet::default();
            rows.into_iter()
                .filter(|row| {
                    let key: Vec<(String, String)> =
                        row.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                    seen.insert(key)
                })
                .collect()
        }
        Algebra::Slice(inner, offset, limit) => {
            let rows = eval_seeded(inner, seed, graph);
            match limit {
                Some(limit) => rows.into_iter().skip(*offset).take(*limit).collect(),
                None => rows.into_iter().skip(*offset).collect(),
            }
        }
        Algebra::OrderBy(inner, conditions) => {
            let rows = eval_seeded(inner, seed, graph);
            order_by(rows, conditions)
        }
    }
}

/// Correlated existence test for EXISTS / NOT EXISTS.
pub fn eval_exists(sub: &Algebra, binding: &Binding, graph: &Graph) -> bool {
    !eval_seeded(sub, binding, graph).is_empty()
}

/// Index-nested-loop extension of the current solutions by one triple
/// pattern. Variables already bound in a row narrow the index lookup to a
/// point query; a constant the store never interned matches nothing.
fn extend_by_pattern(rows: Bindings, pattern: &TriplePattern, graph: &Graph) -> Bindings {
    let (s_term, p_term, o_term) = pattern;
    let mut out = Vec::new();

    'rows: for row in &rows {
        let mut slots: [Option<u32>; 3] = [None, None, None];
        for (slot, term) in slots.iter_mut().zip([s_term, p_term, o_term]) {
            let resolved = match term {
                Term::Constant(value) => match graph.dictionary.lookup(value) {
                    Some(id) => Some(id),
                    None => continue 'rows,
                },
                Term::Variable(name) => match row.get(name) {
                    Some(value) => match graph.dictionary.lookup(value) {
                        Some(id) => Some(id),
                        None => continue 'rows,
                    },
                    None => None,
                },
            };
            *slot = resolved;
        }

        for triple in graph.query_ids(slots[0], slots[1], slots[2]) {
            let mut extended = row.clone();
            let bound = bind_slot(&mut extended, s_term, triple.subject, graph)
                && bind_slot(&mut extended, p_term, triple.predicate, graph)
                && bind_slot(&mut extended, o_term, triple.object, graph);
            if bound {
                out.push(extended);
            }
        }
    }
    out
}

fn bind_slot(row: &mut Binding, term: &Term, id: u32, graph: &Graph) -> bool {
    match term {
        Term::Constant(_) => true,
        Term::Variable(name) => match graph.decode(id) {
            Some(value) => try_bind(row, name, value),
            None => false,
        },
    }
}

/// Variables bound in every row of a multiset; the usable hash-join keys.
fn universal_vars(rows: &Bindings) -> BTreeSet<String> {
    let mut iter = rows.iter();
    let mut vars: BTreeSet<String> = match iter.next() {
        Some(first) => first.keys().cloned().collect(),
        None => return BTreeSet::new(),
    };
    for row in iter {
        vars.retain(|v| row.contains_key(v));
    }
    vars
}

/// Natural join with correct multiplicities: every compatible pair of rows
/// contributes exactly one merged row. Hash join on the variables bound on
/// both sides in every row; OPTIONAL/UNION children may carry partial
/// domains, which the per-pair compatibility check covers.
pub fn join(left: Bindings, right: Bindings) -> Bindings {
    if left.is_empty() || right.is_empty() {
        return Vec::new();
    }

    let shared: Vec<String> = universal_vars(&left)
        .intersection(&universal_vars(&right))
        .cloned()
        .collect();
    debug!(
        "join: {} x {} rows on {:?}",
        left.len(),
        right.len(),
        shared
    );

    let mut out = Vec::new();
    if shared.is_empty() {
        for l in &left {
            for r in &right {
                if compatible(l, r) {
                    out.push(merge(l, r));
                }
            }
        }
        return out;
    }

    let mut table: FxHashMap<Vec<&str>, Vec<&Binding>> = FxHashMap::default();
    for r in &right {
        let key: Vec<&str> = shared.iter().map(|v| r[v].as_str()).collect();
        table.entry(key).or_default().push(r);
    }
    for l in &left {
        let key: Vec<&str> = shared.iter().map(|v| l[v].as_str()).collect();
        if let Some(bucket) = table.get(&key) {
            for r in bucket {
                if compatible(l, r) {
                    out.push(merge(l, r));
                }
            }
        }
    }
    out
}

/// OPTIONAL: left rows without a matching right row survive with the
/// right-side variables absent. The optional filter applies to joined rows
/// only; an erroring filter counts as no match.
fn left_join(
    left: Bindings,
    right: Bindings,
    filter: Option<&Expression>,
    graph: &Graph,
) -> Bindings {
    let mut out = Vec::new();
    for l in &left {
        let mut matched = false;
        for r in &right {
            if !compatible(l, r) {
                continue;
            }
            let joined = merge(l, r);
            let keep = match filter {
                None => true,
                Some(expr) => matches!(
                    eval_expression(expr, &joined, graph),
                    Ok(Value::Bool(true))
                ),
            };
            if keep {
                out.push(joined);
                matched = true;
            }
        }
        if !matched {
            out.push(l.clone());
        }
    }
    out
}

/// Keep rows whose expression evaluates to true; false and error both drop
/// the row, errors never abort the query.
fn apply_filter(rows: Bindings, expr: &Expression, graph: &Graph) -> Bindings {
    let before = rows.len();
    let kept: Bindings = if before > 512 {
        rows.into_par_iter()
            .filter(|row| matches!(eval_expression(expr, row, graph), Ok(Value::Bool(true))))
            .collect()
    } else {
        rows.into_iter()
            .filter(|row| matches!(eval_expression(expr, row, graph), Ok(Value::Bool(true))))
            .collect()
    };
    debug!("filter kept {}/{} rows", kept.len(), before);
    kept
}

/// Partition by the group-key tuple and run the accumulators per partition.
/// Aggregate outputs become ordinary bound values, so later expressions
/// (HAVING, REPLACE over SAMPLE) see them like any other binding. With no
/// keys the whole input forms a single group, even when it is empty.
fn group(rows: Bindings, keys: &[String], aggregates: &[(String, Aggregate)]) -> Bindings {
    let mut order: Vec<Vec<Option<String>>> = Vec::new();
    let mut partitions: FxHashMap<Vec<Option<String>>, Bindings> = FxHashMap::default();

    if keys.is_empty() {
        order.push(Vec::new());
        partitions.insert(Vec::new(), rows);
    } else {
        for row in rows {
            let key: Vec<Option<String>> = keys.iter().map(|k| row.get(k).cloned()).collect();
            if !partitions.contains_key(&key) {
                order.push(key.clone());
            }
            partitions.entry(key).or_default().push(row);
        }
    }

    let mut out = Vec::new();
    for key in order {
        let members = &partitions[&key];
        let mut row = Binding::new();
        for (name, value) in keys.iter().zip(&key) {
            if let Some(value) = value {
                row.insert(name.clone(), value.clone());
            }
        }
        for (out_var, aggregate) in aggregates {
            if let Some(value) = accumulate(aggregate, members) {
                row.insert(out_var.clone(), value);
            }
        }
        out.push(row);
    }
    out
}

/// One aggregate over one partition. `None` leaves the output variable
/// unbound, mirroring how SPARQL aggregates error out per group.
fn accumulate(aggregate: &Aggregate, members: &Bindings) -> Option<String> {
    let values = |var: &str| -> Vec<&String> {
        members.iter().filter_map(|row| row.get(var)).collect()
    };
    match aggregate {
        Aggregate::Count(None) => Some(members.len().to_string()),
        Aggregate::Count(Some(var)) => Some(values(var).len().to_string()),
        Aggregate::Sum(var) => {
            let mut total = 0.0;
            for v in values(var) {
                total += v.parse::<f64>().ok()?;
            }
            Some(Value::Num(total).display())
        }
        Aggregate::Avg(var) => {
            let values = values(var);
            if values.is_empty() {
                return None;
            }
            let mut total = 0.0;
            for v in &values {
                total += v.parse::<f64>().ok()?;
            }
            Some(Value::Num(total / values.len() as f64).display())
        }
        Aggregate::Min(var) => values(var)
            .into_iter()
            .min_by(|a, b| compare_raw(a, b))
            .cloned(),
        Aggregate::Max(var) => values(var)
            .into_iter()
            .max_by(|a, b| compare_raw(a, b))
            .cloned(),
        Aggregate::Sample(var) => values(var)
            .choose(&mut rand::thread_rng())
            .map(|v| (*v).clone()),
    }
}

/// Stable multi-key sort; rows equal under every key keep their input order.
/// Numeric comparison when both values parse as numbers, lexicographic
/// otherwise; unbound sorts before bound.
fn order_by(mut rows: Bindings, conditions: &[OrderCondition]) -> Bindings {
    rows.sort_by(|a, b| {
        for condition in conditions {
            let val_a = a.get(&condition.variable).map(|s| s.as_str()).unwrap_or("");
            let val_b = b.get(&condition.variable).map(|s| s.as_str()).unwrap_or("");
            let comparison = match condition.direction {
                SortDirection::Asc => compare_raw(val_a, val_b),
                SortDirection::Desc => compare_raw(val_a, val_b).reverse(),
            };
            if comparison != std::cmp::Ordering::Equal {
                return comparison;
            }
        }
        std::cmp::Ordering::Equal
    });
    rows
}

fn project(rows: Bindings, vars: &[String]) -> ResultSet {
    if vars.is_empty() {
        let mut variables: BTreeSet<String> = BTreeSet::new();
        for row in &rows {
            variables.extend(row.keys().cloned());
        }
        return ResultSet::new(variables.into_iter().collect(), rows);
    }
    let projected: Bindings = rows
        .into_iter()
        .map(|row| {
            let mut out = Binding::new();
            for var in vars {
                if let Some(value) = row.get(var) {
                    out.insert(var.clone(), value.clone());
                }
            }
            out
        })
        .collect();
    ResultSet::new(vars.to_vec(), projected)
}

/// Instantiate a CONSTRUCT template once per solution. Triples with an
/// unbound slot are skipped for that solution.
fn construct(template: &[TriplePattern], rows: &Bindings, graph: &Graph) -> Graph {
    let mut out = Graph::new(graph.mode());
    for row in rows {
        'patterns: for (s, p, o) in template {
            let mut parts: [&str; 3] = [""; 3];
            for (slot, term) in parts.iter_mut().zip([s, p, o]) {
                match term {
                    Term::Constant(value) => *slot = value,
                    Term::Variable(name) => match row.get(name) {
                        Some(value) => *slot = value,
                        None => continue 'patterns,
                    },
                }
            }
            out.insert_parts(parts[0], parts[1], parts[2]);
        }
    }
    out
}

/// Project the DESCRIBE'd variables and IRIs of the WHERE solutions down to
/// the distinct seed ids the describe engine starts from.
fn describe_seeds(targets: &[DescribeTarget], rows: &Bindings, graph: &Graph) -> Vec<u32> {
    let mut seen = FxHashSet::default();
    let mut seeds = Vec::new();
    for target in targets {
        match target {
            DescribeTarget::Iri(iri) => {
                if let Some(id) = graph.dictionary.lookup(iri) {
                    if seen.insert(id) {
                        seeds.push(id);
                    }
                }
            }
            DescribeTarget::Var(var) => {
                for row in rows {
                    if let Some(value) = row.get(var) {
                        if let Some(id) = graph.dictionary.lookup(value) {
                            if seen.insert(id) {
                                seeds.push(id);
                            }
                        }
                    }
                }
            }
        }
    }
    seeds
}
