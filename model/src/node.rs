/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// An RDF term. Nodes are immutable once constructed; two nodes are equal
/// iff they are the same variant with the same normalized value. Blank node
/// identifiers are scoped to the store that minted them and must never be
/// compared across unrelated stores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Node {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
}

impl Node {
    pub fn iri(value: impl Into<String>) -> Self {
        Node::Iri(value.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Node::Blank(id.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn literal_lang(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            lang: Some(lang.into()),
            datatype: None,
        }
    }

    pub fn literal_typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            lang: None,
            datatype: Some(datatype.into()),
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Node::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal { .. })
    }

    /// May this node appear in subject position?
    pub fn valid_subject(&self) -> bool {
        !self.is_literal()
    }

    /// May this node appear in predicate position?
    pub fn valid_predicate(&self) -> bool {
        self.is_iri()
    }

    /// The canonical string form under which the node is interned,
    /// N-Triples-like: IRIs in angle brackets, blank nodes with the `_:`
    /// marker, literal values quoted with escaped `\` and `"` plus language
    /// tag or datatype. The framing keeps the mapping injective across
    /// variants, so a literal spelled like an IRI or a blank id never
    /// interns to the same id as one.
    pub fn canonical_form(&self) -> String {
        match self {
            Node::Iri(iri) => format!("<{}>", iri),
            Node::Blank(id) => format!("_:{}", id),
            Node::Literal {
                value,
                lang: Some(lang),
                ..
            } => format!("\"{}\"@{}", escape_literal(value), lang),
            Node::Literal {
                value,
                datatype: Some(dt),
                ..
            } => format!("\"{}\"^^<{}>", escape_literal(value), dt),
            Node::Literal { value, .. } => format!("\"{}\"", escape_literal(value)),
        }
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_form())
    }
}

/// Canonical-form marker for blank nodes, shared by the describe traversals.
/// Literal values are quoted in canonical form, so a literal whose value is
/// spelled `_:x` does not match.
pub fn is_blank_form(form: &str) -> bool {
    form.starts_with("_:")
}
