// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Metadata filter engine.

pub mod eval;
pub mod predicate;

pub use eval::{matches, matches_opt};
pub use predicate::{FieldOp, FilterPredicate};
