//! Server-side quote mirror endpoints.
//!
//! The browser session owns the canonical quote; it posts a copy here so a
//! later webhook can be matched back to it. Submissions are re-validated
//! against the catalog and re-priced server-side — a client-claimed total
//! that does not match the catalog is rejected, never trusted.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use mansei_core::catalog::standard_catalog;
use mansei_core::error::CoreError;
use mansei_core::pricing;
use mansei_core::quote::Answer;
use mansei_core::wizard::FinalizedQuote;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// One answer as submitted by the client. Any client-side label or price is
/// ignored; the server re-resolves both from the catalog.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub selected_option: usize,
    #[serde(default)]
    pub custom_value: Option<i64>,
}

/// POST body for `/api/estimate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateSubmission {
    pub answers: Vec<SubmittedAnswer>,
    pub base_price: i64,
    pub total_price: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/estimate
///
/// Validate and mirror a finalized quote; returns the generated estimate id.
pub async fn submit_estimate(
    State(state): State<AppState>,
    Json(submission): Json<EstimateSubmission>,
) -> AppResult<Json<Value>> {
    let catalog = standard_catalog();

    if submission.base_price < 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Base price must be non-negative".to_string(),
        )));
    }

    let mut answers = Vec::with_capacity(submission.answers.len());
    for submitted in &submission.answers {
        if catalog
            .option(&submitted.question_id, submitted.selected_option)
            .is_none()
        {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Answer references unknown question or option: {} / {}",
                submitted.question_id, submitted.selected_option
            ))));
        }
        answers.push(Answer {
            question_id: submitted.question_id.clone(),
            selected_option: submitted.selected_option,
            custom_value: submitted.custom_value,
        });
    }

    let computed_total = pricing::compute_total(&catalog, submission.base_price, &answers);
    if computed_total != submission.total_price {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Submitted total {} does not match computed total {}",
            submission.total_price, computed_total
        ))));
    }

    let finalized = FinalizedQuote {
        answers: pricing::resolve_answers(&catalog, &answers),
        base_price: submission.base_price,
        total_price: computed_total,
    };
    let estimate_id = state.quotes.create(finalized).await;

    Ok(Json(json!({ "success": true, "estimateId": estimate_id })))
}

/// GET /api/estimate/{id}
///
/// The mirrored quote, or an explicit not-found body (200 either way; the
/// mirror is disposable and absence is expected after the retention
/// window). This read starts the retention clock.
pub async fn get_estimate(
    State(state): State<AppState>,
    Path(estimate_id): Path<String>,
) -> Json<Value> {
    match state.quotes.get(&estimate_id).await {
        Some(quote) => Json(json!({ "success": true, "estimate": quote })),
        None => Json(json!({
            "success": false,
            "message": "No estimate found for this ID",
        })),
    }
}
