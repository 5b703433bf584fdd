/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Per-binding scalar expression evaluation. Failures are local: the caller
//! decides whether an erroring binding is dropped (FILTER) or left without
//! the target variable (BIND).

use crate::error::EvalError;
use crate::evaluator::eval_exists;
use crate::graph::Graph;
use model::algebra::Expression;
use model::binding::Binding;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    pub fn as_num(&self) -> Result<f64, EvalError> {
        match self {
            Value::Num(n) => Ok(*n),
            Value::Text(s) => s
                .parse::<f64>()
                .map_err(|_| EvalError::new(format!("'{}' is not numeric", s))),
            Value::Bool(_) => Err(EvalError::new("boolean used as number")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Num(n) => Ok(*n != 0.0),
            Value::Text(s) => Err(EvalError::new(format!("'{}' is not a boolean", s))),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Value::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
        }
    }
}

pub fn eval_expression(
    expr: &Expression,
    binding: &Binding,
    graph: &Graph,
) -> Result<Value, EvalError> {
    match expr {
        Expression::Var(name) => binding
            .get(name)
            .map(|v| Value::Text(v.clone()))
            .ok_or_else(|| EvalError::new(format!("unbound variable ?{}", name))),
        Expression::Literal(value) => Ok(Value::Text(value.clone())),
        Expression::Number(n) => Ok(Value::Num(*n)),
        Expression::Neg(inner) => {
            let n = eval_expression(inner, binding, graph)?.as_num()?;
            Ok(Value::Num(-n))
        }
        Expression::Add(l, r) => arith(l, r, binding, graph, |a, b| Ok(a + b)),
        Expression::Sub(l, r) => arith(l, r, binding, graph, |a, b| Ok(a - b)),
        Expression::Mul(l, r) => arith(l, r, binding, graph, |a, b| Ok(a * b)),
        Expression::Div(l, r) => arith(l, r, binding, graph, |a, b| {
            if b == 0.0 {
                Err(EvalError::new("division by zero"))
            } else {
                Ok(a / b)
            }
        }),
        Expression::Eq(l, r) => compare(l, r, binding, graph).map(|o| Value::Bool(o == std::cmp::Ordering::Equal)),
        Expression::Ne(l, r) => compare(l, r, binding, graph).map(|o| Value::Bool(o != std::cmp::Ordering::Equal)),
        Expression::Lt(l, r) => compare(l, r, binding, graph).map(|o| Value::Bool(o == std::cmp::Ordering::Less)),
        Expression::Le(l, r) => compare(l, r, binding, graph).map(|o| Value::Bool(o != std::cmp::Ordering::Greater)),
        Expression::Gt(l, r) => compare(l, r, binding, graph).map(|o| Value::Bool(o == std::cmp::Ordering::Greater)),
        Expression::Ge(l, r) => compare(l, r, binding, graph).map(|o| Value::Bool(o != std::cmp::Ordering::Less)),
        Expression::And(l, r) => {
            // SPARQL logical-and: a false operand wins over an error.
            let left = eval_expression(l, binding, graph).and_then(|v| v.as_bool());
            match left {
                Ok(false) => Ok(Value::Bool(false)),
                Ok(true) => Ok(Value::Bool(
                    eval_expression(r, binding, graph)?.as_bool()?,
                )),
                Err(err) => match eval_expression(r, binding, graph).and_then(|v| v.as_bool()) {
                    Ok(false) => Ok(Value::Bool(false)),
                    _ => Err(err),
                },
            }
        }
        Expression::Or(l, r) => {
            // Dual of AND: a true operand wins over an error.
            let left = eval_expression(l, binding, graph).and_then(|v| v.as_bool());
            match left {
                Ok(true) => Ok(Value::Bool(true)),
                Ok(false) => Ok(Value::Bool(
                    eval_expression(r, binding, graph)?.as_bool()?,
                )),
                Err(err) => match eval_expression(r, binding, graph).and_then(|v| v.as_bool()) {
                    Ok(true) => Ok(Value::Bool(true)),
                    _ => Err(err),
                },
            }
        }
        Expression::Not(inner) => {
            let b = eval_expression(inner, binding, graph)?.as_bool()?;
            Ok(Value::Bool(!b))
        }
        Expression::Bound(name) => Ok(Value::Bool(binding.contains_key(name))),
        Expression::Str(inner) => {
            let v = eval_expression(inner, binding, graph)?;
            Ok(Value::Text(v.display()))
        }
        Expression::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&eval_expression(part, binding, graph)?.display());
            }
            Ok(Value::Text(out))
        }
        Expression::Replace(value, pattern, replacement) => {
            let value = eval_expression(value, binding, graph)?.display();
            let pattern = eval_expression(pattern, binding, graph)?.display();
            let replacement = eval_expression(replacement, binding, graph)?.display();
            let re = Regex::new(&pattern)
                .map_err(|e| EvalError::new(format!("bad REPLACE pattern: {}", e)))?;
            Ok(Value::Text(re.replace_all(&value, replacement.as_str()).into_owned()))
        }
        Expression::Exists(sub) => Ok(Value::Bool(eval_exists(sub, binding, graph))),
        Expression::NotExists(sub) => Ok(Value::Bool(!eval_exists(sub, binding, graph))),
    }
}

fn arith(
    l: &Expression,
    r: &Expression,
    binding: &Binding,
    graph: &Graph,
    op: impl Fn(f64, f64) -> Result<f64, EvalError>,
) -> Result<Value, EvalError> {
    let a = eval_expression(l, binding, graph)?.as_num()?;
    let b = eval_expression(r, binding, graph)?.as_num()?;
    op(a, b).map(Value::Num)
}

/// Numeric comparison when both sides coerce to numbers, lexicographic
/// otherwise. The same policy ORDER BY uses.
fn compare(
    l: &Expression,
    r: &Expression,
    binding: &Binding,
    graph: &Graph,
) -> Result<std::cmp::Ordering, EvalError> {
    let a = eval_expression(l, binding, graph)?;
    let b = eval_expression(r, binding, graph)?;
    match (a.as_num(), b.as_num()) {
        (Ok(x), Ok(y)) => x
            .partial_cmp(&y)
            .ok_or_else(|| EvalError::new("incomparable numbers")),
        _ => Ok(a.display().cmp(&b.display())),
    }
}

/// Compare two raw binding values the way ORDER BY does.
pub fn compare_raw(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Build a precedence-correct expression tree from an arithmetic string like
/// `"?x + 10/2"`. Unary minus binds tightest, then `*`/`/`, then `+`/`-`,
/// all left-associative. This is a construction helper for arithmetic FILTER
/// and BIND fragments, not a query parser.
pub fn parse_arithmetic(input: &str) -> Result<Expression, EvalError> {
    let tokens = tokenize(input)?;
    let mut parser = ArithParser { tokens, pos: 0 };
    let expr = parser.parse_sum()?;
    if parser.pos != parser.tokens.len() {
        return Err(EvalError::new(format!(
            "trailing input after arithmetic expression: '{}'",
            input
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Var(String),
    Plus,
    Minus,
    Star,
    Slash,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '?' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                if end == start {
                    return Err(EvalError::new("empty variable name"));
                }
                tokens.push(Token::Var(chars[start..end].iter().collect()));
                i = end;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                let mut end = i;
                while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.') {
                    end += 1;
                }
                let text: String = chars[start..end].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| EvalError::new(format!("bad number '{}'", text)))?;
                tokens.push(Token::Num(n));
                i = end;
            }
            other => {
                return Err(EvalError::new(format!(
                    "unexpected character '{}' in arithmetic expression",
                    other
                )))
            }
        }
    }
    Ok(tokens)
}

struct ArithParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ArithParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_sum(&mut self) -> Result<Expression, EvalError> {
        let mut left = self.parse_product()?;
        while let Some(op) = self.peek().cloned() {
            match op {
                Token::Plus => {
                    self.next();
                    let right = self.parse_product()?;
                    left = Expression::Add(Box::new(left), Box::new(right));
                }
                Token::Minus => {
                    self.next();
                    let right = self.parse_product()?;
                    left = Expression::Sub(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_product(&mut self) -> Result<Expression, EvalError> {
        let mut left = self.parse_factor()?;
        while let Some(op) = self.peek().cloned() {
            match op {
                Token::Star => {
                    self.next();
                    let right = self.parse_factor()?;
                    left = Expression::Mul(Box::new(left), Box::new(right));
                }
                Token::Slash => {
                    self.next();
                    let right = self.parse_factor()?;
                    left = Expression::Div(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expression, EvalError> {
        match self.next() {
            Some(Token::Minus) => {
                let inner = self.parse_factor()?;
                Ok(Expression::Neg(Box::new(inner)))
            }
            Some(Token::Num(n)) => Ok(Expression::Number(n)),
            Some(Token::Var(name)) => Ok(Expression::Var(name)),
            Some(Token::Open) => {
                let inner = self.parse_sum()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(EvalError::new("missing closing parenthesis")),
                }
            }
            other => Err(EvalError::new(format!(
                "unexpected token in arithmetic expression: {:?}",
                other
            ))),
        }
    }
}
