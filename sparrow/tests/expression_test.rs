/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate sparrow;
use model::algebra::Expression;
use model::binding::Binding;
use sparrow::expression::{eval_expression, parse_arithmetic, Value};
use sparrow::graph::Graph;

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(input: &str) -> Value {
        let expr = parse_arithmetic(input).expect("parse failed");
        eval_expression(&expr, &Binding::new(), &Graph::default()).expect("eval failed")
    }

    #[test]
    fn division_binds_tighter_than_addition() {
        assert_eq!(eval_str("10/5+5"), Value::Num(7.0));
        assert_eq!(eval_str("6+10/2"), Value::Num(11.0));
        assert_eq!(eval_str("10-4/2"), Value::Num(8.0));
        assert_eq!(eval_str("2*3+4*5"), Value::Num(26.0));
    }

    #[test]
    fn same_precedence_associates_left() {
        assert_eq!(eval_str("10/5/2"), Value::Num(1.0));
        assert_eq!(eval_str("10-3-2"), Value::Num(5.0));
        assert_eq!(eval_str("100/10*2"), Value::Num(20.0));
    }

    #[test]
    fn parentheses_and_unary_minus() {
        assert_eq!(eval_str("(6+10)/2"), Value::Num(8.0));
        assert_eq!(eval_str("-3+5"), Value::Num(2.0));
        assert_eq!(eval_str("2*-3"), Value::Num(-6.0));
        assert_eq!(eval_str("-(2+3)"), Value::Num(-5.0));
    }

    #[test]
    fn parser_rejects_malformed_input() {
        assert!(parse_arithmetic("1+").is_err());
        assert!(parse_arithmetic("(1+2").is_err());
        assert!(parse_arithmetic("1 2").is_err(), "trailing token must be rejected");
        assert!(parse_arithmetic("? + 1").is_err(), "empty variable name");
        assert!(parse_arithmetic("1 $ 2").is_err());
    }

    #[test]
    fn variables_read_from_the_binding() {
        let expr = parse_arithmetic("?x * 2 + ?y").expect("parse failed");
        let mut binding = Binding::new();
        binding.insert("x".to_string(), "4".to_string());
        binding.insert("y".to_string(), "1".to_string());
        let value = eval_expression(&expr, &binding, &Graph::default()).expect("eval failed");
        assert_eq!(value, Value::Num(9.0));
    }

    #[test]
    fn unbound_variable_is_an_error_not_a_panic() {
        let expr = parse_arithmetic("?missing + 1").expect("parse failed");
        assert!(eval_expression(&expr, &Binding::new(), &Graph::default()).is_err());
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let expr = parse_arithmetic("1/0").expect("parse failed");
        assert!(eval_expression(&expr, &Binding::new(), &Graph::default()).is_err());
    }

    #[test]
    fn logical_operators_tolerate_one_erroring_operand() {
        let g = Graph::default();
        let binding = Binding::new();
        let err = || Box::new(Expression::var("missing"));
        let truth = |b: bool| {
            Box::new(if b {
                Expression::Eq(Box::new(Expression::Number(1.0)), Box::new(Expression::Number(1.0)))
            } else {
                Expression::Eq(Box::new(Expression::Number(1.0)), Box::new(Expression::Number(2.0)))
            })
        };

        // false AND error = false, regardless of operand order.
        let and = Expression::And(truth(false), err());
        assert_eq!(eval_expression(&and, &binding, &g).ok(), Some(Value::Bool(false)));
        let and = Expression::And(err(), truth(false));
        assert_eq!(eval_expression(&and, &binding, &g).ok(), Some(Value::Bool(false)));

        // true OR error = true, regardless of operand order.
        let or = Expression::Or(truth(true), err());
        assert_eq!(eval_expression(&or, &binding, &g).ok(), Some(Value::Bool(true)));
        let or = Expression::Or(err(), truth(true));
        assert_eq!(eval_expression(&or, &binding, &g).ok(), Some(Value::Bool(true)));

        // true AND error stays an error; so does false OR error.
        assert!(eval_expression(&Expression::And(truth(true), err()), &binding, &g).is_err());
        assert!(eval_expression(&Expression::Or(truth(false), err()), &binding, &g).is_err());
    }

    #[test]
    fn replace_substitutes_by_regex() {
        let g = Graph::default();
        let mut binding = Binding::new();
        binding.insert("v".to_string(), "item1-v1".to_string());
        let expr = Expression::Replace(
            Box::new(Expression::var("v")),
            Box::new(Expression::literal("1")),
            Box::new(Expression::literal("2")),
        );
        let value = eval_expression(&expr, &binding, &g).expect("eval failed");
        assert_eq!(value, Value::Text("item2-v2".to_string()));
    }

    #[test]
    fn replace_rejects_bad_pattern() {
        let g = Graph::default();
        let expr = Expression::Replace(
            Box::new(Expression::literal("abc")),
            Box::new(Expression::literal("[")),
            Box::new(Expression::literal("x")),
        );
        assert!(eval_expression(&expr, &Binding::new(), &g).is_err());
    }

    #[test]
    fn concat_and_str_coerce_to_text() {
        let g = Graph::default();
        let expr = Expression::Concat(vec![
            Expression::literal("n="),
            Expression::Str(Box::new(Expression::Number(4.0))),
        ]);
        let value = eval_expression(&expr, &Binding::new(), &g).expect("eval failed");
        assert_eq!(value, Value::Text("n=4".to_string()));
    }

    #[test]
    fn bound_reports_presence_without_erroring() {
        let g = Graph::default();
        let mut binding = Binding::new();
        binding.insert("x".to_string(), "1".to_string());
        let present = eval_expression(&Expression::Bound("x".to_string()), &binding, &g);
        let absent = eval_expression(&Expression::Bound("y".to_string()), &binding, &g);
        assert_eq!(present.ok(), Some(Value::Bool(true)));
        assert_eq!(absent.ok(), Some(Value::Bool(false)));
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(Value::Num(4.0).display(), "4");
        assert_eq!(Value::Num(4.5).display(), "4.5");
        assert_eq!(Value::Num(-0.0).display(), "0");
    }
}
