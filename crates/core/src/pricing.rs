//! Pure pricing engine: fold answers into a total and a readable breakdown.
//!
//! This runs on every UI update, so it must never fail on malformed input:
//! an answer referencing an unknown question or an out-of-bounds option
//! contributes zero instead of erroring. Boundary validation is the caller's
//! job (see the wizard and the estimate submission endpoint).

use serde::Serialize;

use crate::catalog::Catalog;
use crate::quote::{Answer, ResolvedAnswer};

/// One line of the "additional costs" breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownLine {
    pub label: String,
    pub price: i64,
}

/// Resolve each answer against the catalog, snapshotting label and price.
///
/// Unresolvable answers are kept (with an empty label and zero price) so the
/// full selections view still shows one entry per answered question. A custom
/// surcharge is folded into the snapshot price.
pub fn resolve_answers(catalog: &Catalog, answers: &[Answer]) -> Vec<ResolvedAnswer> {
    answers
        .iter()
        .map(|answer| {
            let (label, option_price) = match catalog.option(&answer.question_id, answer.selected_option) {
                Some(option) => (option.label.clone(), option.price),
                None => (String::new(), 0),
            };
            ResolvedAnswer {
                question_id: answer.question_id.clone(),
                selected_option: answer.selected_option,
                option_label: label,
                price: option_price + answer.custom_value.unwrap_or(0),
            }
        })
        .collect()
}

/// Compute `base_price + Σ option price + Σ custom surcharge`.
///
/// Idempotent and side-effect-free; the result does not depend on answer
/// insertion order.
pub fn compute_total(catalog: &Catalog, base_price: i64, answers: &[Answer]) -> i64 {
    base_price
        + resolve_answers(catalog, answers)
            .iter()
            .map(|a| a.price)
            .sum::<i64>()
}

/// Breakdown of priced selections, in answer order.
///
/// Only answers resolving to a positive price appear; zero-priced selections
/// stay visible in [`resolve_answers`] output instead.
pub fn breakdown(catalog: &Catalog, answers: &[Answer]) -> Vec<BreakdownLine> {
    resolve_answers(catalog, answers)
        .into_iter()
        .filter(|a| a.price > 0)
        .map(|a| BreakdownLine {
            label: a.option_label,
            price: a.price,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
