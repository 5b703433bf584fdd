/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::BTreeMap;

/// One solution: a partial mapping from variable name to the canonical form
/// of the bound term. Unbound variables are simply absent.
pub type Binding = BTreeMap<String, String>;

/// A solution multiset. Order is irrelevant and duplicates are preserved
/// (SPARQL bag semantics) unless DISTINCT collapses them.
pub type Bindings = Vec<Binding>;

/// Attempt to bind `var` to `value`, failing when the variable is already
/// bound to a different value. Used when one pattern mentions the same
/// variable twice and when merging join rows.
pub fn try_bind(binding: &mut Binding, var: &str, value: &str) -> bool {
    match binding.get(var) {
        Some(existing) => existing == value,
        None => {
            binding.insert(var.to_string(), value.to_string());
            true
        }
    }
}

/// Two bindings are compatible when every variable bound in both carries the
/// same value. The merge of two compatible bindings is their union.
pub fn compatible(a: &Binding, b: &Binding) -> bool {
    a.iter()
        .all(|(var, value)| b.get(var).map_or(true, |other| other == value))
}

pub fn merge(a: &Binding, b: &Binding) -> Binding {
    let mut merged = a.clone();
    for (var, value) in b {
        merged.entry(var.clone()).or_insert_with(|| value.clone());
    }
    merged
}
