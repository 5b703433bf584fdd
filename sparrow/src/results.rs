/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::graph::Graph;
use model::binding::Bindings;
use serde::Serialize;
use serde_json::json;

/// A SELECT/ASK result: the projected variable list plus the solution rows.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    pub variables: Vec<String>,
    pub rows: Bindings,
}

impl ResultSet {
    pub fn new(variables: Vec<String>, rows: Bindings) -> Self {
        ResultSet { variables, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// SPARQL-results-shaped JSON: head.vars plus results.bindings.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "head": { "vars": self.variables },
            "results": { "bindings": self.rows },
        })
    }
}

/// What a query evaluates to, by form: solutions for SELECT, a boolean for
/// ASK, a graph for CONSTRUCT and DESCRIBE.
#[derive(Debug)]
pub enum QueryOutcome {
    Solutions(ResultSet),
    Boolean(bool),
    Graph(Graph),
}

impl QueryOutcome {
    pub fn as_solutions(&self) -> Option<&ResultSet> {
        match self {
            QueryOutcome::Solutions(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            QueryOutcome::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            QueryOutcome::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}
