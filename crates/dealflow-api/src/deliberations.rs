//! Handlers for deliberation reads and decision saves.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/applications/:id/deliberation` | 404 if none exists yet |
//! | `POST` | `/applications/:id/decision` | Body: [`DecisionBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::NaiveDate;
use dealflow_core::{
  deliberation::{Decision, DecisionInput, Deliberation, InvestmentTerms},
  dispatch::Dispatcher,
  pipeline::{DecisionOutcome, Pipeline},
  rejection::RejectionReason,
  store::CrmStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::ActorContext, error::ApiError};

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /applications/:id/deliberation`
pub async fn get_one<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Deliberation>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let deliberation = pipeline
    .store()
    .get_deliberation(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no deliberation for application {id}"))
    })?;
  Ok(Json(deliberation))
}

// ─── Save ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /applications/:id/decision`.
#[derive(Debug, Deserialize)]
pub struct DecisionBody {
  pub decision:        Decision,
  pub meeting_date:    Option<NaiveDate>,
  pub idea_summary:    Option<String>,
  pub thoughts:        Option<String>,
  pub status:          Option<String>,
  #[serde(default)]
  pub tags:            Vec<String>,
  pub investment:      Option<InvestmentTerms>,
  pub email_sender_id: Option<Uuid>,
  #[serde(default)]
  pub reasons:         Vec<RejectionReason>,
}

impl From<DecisionBody> for DecisionInput {
  fn from(b: DecisionBody) -> Self {
    DecisionInput {
      decision:          b.decision,
      meeting_date:      b.meeting_date,
      idea_summary:      b.idea_summary,
      thoughts:          b.thoughts,
      status:            b.status,
      tags:              b.tags,
      investment:        b.investment,
      email_sender_id:   b.email_sender_id,
      rejection_reasons: b.reasons,
    }
  }
}

/// `POST /applications/:id/decision`
pub async fn save<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  ActorContext(actor): ActorContext,
  Json(body): Json<DecisionBody>,
) -> Result<Json<DecisionOutcome>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let outcome = pipeline
    .save_decision(&actor, id, DecisionInput::from(body))
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(outcome))
}
