// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Filter predicate AST and its parser from MongoDB-style JSON.
//!
//! Accepted forms:
//! - `{ "field": scalar }` (equality shorthand, same as `$eq`)
//! - `{ "field": { "$gt": 40, "$lte": 90 } }` (several operators are AND-ed)
//! - `{ "$and": [ ... ] }`, `{ "$or": [ ... ] }`, nestable
//! - several keys at one level are AND-ed; `{}` matches everything

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};

/// Operator applied to a single metadata field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldOp {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum FilterPredicate {
    Field { field: String, op: FieldOp },
    And(Vec<FilterPredicate>),
    Or(Vec<FilterPredicate>),
}

impl FilterPredicate {
    /// A predicate that matches every record.
    pub fn all() -> Self {
        FilterPredicate::And(Vec::new())
    }

    pub fn field(field: impl Into<String>, op: FieldOp) -> Self {
        FilterPredicate::Field { field: field.into(), op }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, FieldOp::Eq(value.into()))
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => parse_object(map),
            other => Err(EngineError::InvalidFilter(format!(
                "filter must be an object, got {}",
                type_name(other)
            ))),
        }
    }
}

impl TryFrom<Value> for FilterPredicate {
    type Error = EngineError;

    fn try_from(value: Value) -> Result<Self> {
        FilterPredicate::from_json(&value)
    }
}

fn parse_object(map: &Map<String, Value>) -> Result<FilterPredicate> {
    let mut clauses = Vec::with_capacity(map.len());
    for (key, value) in map {
        let clause = if let Some(op) = key.strip_prefix('$') {
            parse_logical(op, value)?
        } else {
            parse_field(key, value)?
        };
        clauses.push(clause);
    }
    Ok(collapse_and(clauses))
}

fn parse_logical(op: &str, value: &Value) -> Result<FilterPredicate> {
    let children = match value {
        Value::Array(items) => items
            .iter()
            .map(FilterPredicate::from_json)
            .collect::<Result<Vec<_>>>()?,
        other => {
            return Err(EngineError::InvalidFilter(format!(
                "${} expects an array of predicates, got {}",
                op,
                type_name(other)
            )))
        }
    };
    match op {
        "and" => Ok(FilterPredicate::And(children)),
        "or" => Ok(FilterPredicate::Or(children)),
        _ => Err(EngineError::InvalidFilter(format!(
            "unknown logical operator ${}",
            op
        ))),
    }
}

fn parse_field(field: &str, value: &Value) -> Result<FilterPredicate> {
    let ops = match value {
        Value::Object(map) if is_operator_object(map) => map,
        Value::Object(map) if map.keys().any(|k| k.starts_with('$')) => {
            return Err(EngineError::InvalidFilter(format!(
                "field {:?} mixes operators and plain keys",
                field
            )))
        }
        // Plain values (objects included) are equality shorthand.
        other => return Ok(FilterPredicate::field(field, FieldOp::Eq(other.clone()))),
    };

    let mut clauses = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let op = parse_field_op(field, op, operand)?;
        clauses.push(FilterPredicate::field(field, op));
    }
    Ok(collapse_and(clauses))
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

fn parse_field_op(field: &str, op: &str, operand: &Value) -> Result<FieldOp> {
    let op = match op {
        "$eq" => FieldOp::Eq(operand.clone()),
        "$ne" => FieldOp::Ne(operand.clone()),
        "$gt" => FieldOp::Gt(orderable(field, op, operand)?),
        "$gte" => FieldOp::Gte(orderable(field, op, operand)?),
        "$lt" => FieldOp::Lt(orderable(field, op, operand)?),
        "$lte" => FieldOp::Lte(orderable(field, op, operand)?),
        "$in" => FieldOp::In(array_operand(field, op, operand)?),
        "$nin" => FieldOp::Nin(array_operand(field, op, operand)?),
        unknown => {
            return Err(EngineError::InvalidFilter(format!(
                "unknown operator {} on field {:?}",
                unknown, field
            )))
        }
    };
    Ok(op)
}

fn orderable(field: &str, op: &str, operand: &Value) -> Result<Value> {
    match operand {
        Value::Number(_) | Value::String(_) => Ok(operand.clone()),
        other => Err(EngineError::InvalidFilter(format!(
            "{} on field {:?} needs a number or string, got {}",
            op,
            field,
            type_name(other)
        ))),
    }
}

fn array_operand(field: &str, op: &str, operand: &Value) -> Result<Vec<Value>> {
    match operand {
        Value::Array(items) => Ok(items.clone()),
        other => Err(EngineError::InvalidFilter(format!(
            "{} on field {:?} needs an array, got {}",
            op,
            field,
            type_name(other)
        ))),
    }
}

fn collapse_and(mut clauses: Vec<FilterPredicate>) -> FilterPredicate {
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        FilterPredicate::And(clauses)
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
