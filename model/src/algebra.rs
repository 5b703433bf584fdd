/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The algebra tree a parsed query compiles to. The tree is immutable; the
//! evaluator only reads it. Building one is the job of an external parser or
//! of query-construction code in tests.

/// A slot of a triple pattern: either a variable to bind or a constant in
/// canonical form. Constants are resolved against the store dictionary at
/// evaluation time; a constant the store never interned matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Term {
    Variable(String),
    Constant(String),
}

impl Term {
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn constant(value: impl Into<String>) -> Self {
        Term::Constant(value.into())
    }
}

pub type TriplePattern = (Term, Term, Term);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct OrderCondition {
    pub variable: String,
    pub direction: SortDirection,
}

/// Aggregate accumulators usable under `Group`. Each aggregates the values
/// of one variable across a partition (COUNT may aggregate rows instead).
#[derive(Debug, Clone)]
pub enum Aggregate {
    Count(Option<String>),
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
    Sample(String),
}

/// Scalar expressions evaluated per solution binding. Multiplication and
/// division bind tighter than addition and subtraction; all four are
/// left-associative, so `10/5/2` is `(10/5)/2`. Logical precedence is
/// NOT > AND > OR.
#[derive(Debug, Clone)]
pub enum Expression {
    Var(String),
    Literal(String),
    Number(f64),
    Neg(Box<Expression>),
    Add(Box<Expression>, Box<Expression>),
    Sub(Box<Expression>, Box<Expression>),
    Mul(Box<Expression>, Box<Expression>),
    Div(Box<Expression>, Box<Expression>),
    Eq(Box<Expression>, Box<Expression>),
    Ne(Box<Expression>, Box<Expression>),
    Lt(Box<Expression>, Box<Expression>),
    Le(Box<Expression>, Box<Expression>),
    Gt(Box<Expression>, Box<Expression>),
    Ge(Box<Expression>, Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    Bound(String),
    Str(Box<Expression>),
    Concat(Vec<Expression>),
    Replace(Box<Expression>, Box<Expression>, Box<Expression>),
    Exists(Box<Algebra>),
    NotExists(Box<Algebra>),
}

impl Expression {
    pub fn var(name: impl Into<String>) -> Self {
        Expression::Var(name.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Expression::Literal(value.into())
    }
}

/// Property path expressions: a regular-expression-like path over
/// predicates connecting two terms.
#[derive(Debug, Clone)]
pub enum PathExpr {
    Pred(String),
    Seq(Box<PathExpr>, Box<PathExpr>),
    Alt(Box<PathExpr>, Box<PathExpr>),
    Inverse(Box<PathExpr>),
    ZeroOrMore(Box<PathExpr>),
    OneOrMore(Box<PathExpr>),
    ZeroOrOne(Box<PathExpr>),
}

impl PathExpr {
    pub fn pred(iri: impl Into<String>) -> Self {
        PathExpr::Pred(iri.into())
    }
}

/// The algebra node set. `Table` is the empty graph pattern, which binds the
/// empty solution and acts as the identity for joins.
#[derive(Debug, Clone)]
pub enum Algebra {
    Table,
    Bgp(Vec<TriplePattern>),
    Join(Box<Algebra>, Box<Algebra>),
    LeftJoin(Box<Algebra>, Box<Algebra>, Option<Expression>),
    Union(Box<Algebra>, Box<Algebra>),
    Filter(Expression, Box<Algebra>),
    Extend(Box<Algebra>, String, Expression),
    Group(Box<Algebra>, Vec<String>, Vec<(String, Aggregate)>),
    Having(Expression, Box<Algebra>),
    Path(Term, PathExpr, Term),
    Distinct(Box<Algebra>),
    Slice(Box<Algebra>, usize, Option<usize>),
    OrderBy(Box<Algebra>, Vec<OrderCondition>),
}

impl Algebra {
    pub fn join(left: Algebra, right: Algebra) -> Self {
        Algebra::Join(Box::new(left), Box::new(right))
    }

    pub fn filter(expr: Expression, inner: Algebra) -> Self {
        Algebra::Filter(expr, Box::new(inner))
    }

    pub fn union(left: Algebra, right: Algebra) -> Self {
        Algebra::Union(Box::new(left), Box::new(right))
    }
}
