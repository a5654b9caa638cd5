// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Predicate evaluation against a metadata map. Pure and allocation-free.

use std::cmp::Ordering;

use serde_json::Value;

use super::predicate::{FieldOp, FilterPredicate};
use crate::types::Metadata;

/// Returns true when `metadata` satisfies `predicate`.
///
/// Absent fields fail every comparison except `$ne` and `$nin`.
pub fn matches(predicate: &FilterPredicate, metadata: &Metadata) -> bool {
    match predicate {
        FilterPredicate::And(children) => children.iter().all(|c| matches(c, metadata)),
        FilterPredicate::Or(children) => children.iter().any(|c| matches(c, metadata)),
        FilterPredicate::Field { field, op } => match metadata.get(field) {
            Some(value) => evaluate(op, value),
            None => matches!(op, FieldOp::Ne(_) | FieldOp::Nin(_)),
        },
    }
}

/// `None` matches everything.
pub fn matches_opt(predicate: Option<&FilterPredicate>, metadata: &Metadata) -> bool {
    predicate.map_or(true, |p| matches(p, metadata))
}

fn evaluate(op: &FieldOp, value: &Value) -> bool {
    match op {
        FieldOp::Eq(operand) => field_eq(value, operand),
        FieldOp::Ne(operand) => !field_eq(value, operand),
        FieldOp::Gt(operand) => compare(value, operand) == Some(Ordering::Greater),
        FieldOp::Gte(operand) => matches!(
            compare(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FieldOp::Lt(operand) => compare(value, operand) == Some(Ordering::Less),
        FieldOp::Lte(operand) => matches!(
            compare(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FieldOp::In(set) => set.iter().any(|candidate| field_eq(value, candidate)),
        FieldOp::Nin(set) => !set.iter().any(|candidate| field_eq(value, candidate)),
    }
}

/// Equality with array-field semantics: an array field equals a scalar
/// operand when any element does.
fn field_eq(field: &Value, operand: &Value) -> bool {
    if json_eq(field, operand) {
        return true;
    }
    match (field, operand) {
        (Value::Array(items), op) if !op.is_array() => items.iter().any(|i| json_eq(i, op)),
        _ => false,
    }
}

/// Structural JSON equality where numbers compare by value (1 == 1.0).
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering between numbers or between strings; anything else is unordered.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => Some(i.cmp(&j)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
