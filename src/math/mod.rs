// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Vector arithmetic used by the index and the scorer.

pub mod cosine;
pub mod dot;
pub mod l2;

pub use cosine::{cosine_score, normalize};
pub use dot::{dot, norm, norm_f64};
pub use l2::l2_sq;
