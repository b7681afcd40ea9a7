//! Handlers for `/applications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/applications` | Optional `?stage=`, `?text=`, `?limit=`, `?offset=` |
//! | `POST` | `/applications` | Body: [`CreateBody`] |
//! | `GET`  | `/applications/:id` | 404 if not found |
//! | `POST` | `/applications/:id/advance` | Quorum-gated unless `skip_voting` |
//! | `POST` | `/applications/:id/reject` | Direct reject, no interview |
//! | `POST` | `/applications/:id/move-back` | Back to the application queue |
//! | `POST` | `/applications/:id/restore` | Back to the stored previous stage |
//! | `POST` | `/applications/:id/rejection-draft` | Generate a draft now |
//! | `PUT`  | `/applications/:id/rejection-draft` | Persist partner edits |
//! | `POST` | `/applications/:id/email-sent` | Stamp the sent flag |
//! | `GET`  | `/rejection-reasons` | The reason library for rejection drafts |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dealflow_core::{
  application::{Application, NewApplication},
  dispatch::Dispatcher,
  pipeline::Pipeline,
  rejection::RejectionReason,
  stage::ApplicationStage,
  store::{ApplicationQuery, CrmStore},
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{actor::ActorContext, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub stage:  Option<ApplicationStage>,
  pub text:   Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /applications[?stage=...][&text=...]`
pub async fn list<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Application>>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let query = ApplicationQuery {
    stage:  params.stage,
    text:   params.text,
    limit:  params.limit,
    offset: params.offset,
  };
  let applications = pipeline
    .store()
    .list_applications(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(applications))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub company_id:    Option<Uuid>,
  pub company_name:  String,
  pub contact_email: Option<String>,
  pub founder_info:  Option<String>,
}

/// `POST /applications`
pub async fn create<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .store()
    .add_application(NewApplication {
      company_id:    body.company_id,
      company_name:  body.company_name,
      contact_email: body.contact_email,
      founder_info:  body.founder_info,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(application)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /applications/:id`
pub async fn get_one<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .store()
    .get_application(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;
  Ok(Json(application))
}

// ─── Stage actions ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdvanceBody {
  pub email_sender_id: Option<Uuid>,
  /// Manual override: skip the vote round entirely. Requires explicit user
  /// confirmation in the client.
  #[serde(default)]
  pub skip_voting:     bool,
}

/// `POST /applications/:id/advance`
pub async fn advance<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  ActorContext(actor): ActorContext,
  Json(body): Json<AdvanceBody>,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = if body.skip_voting {
    pipeline
      .advance_to_interview_unvoted(&actor, id)
      .await
      .map_err(ApiError::from_pipeline)?
  } else {
    let sender = body.email_sender_id.ok_or_else(|| {
      ApiError::Validation("an email sender must be selected".to_string())
    })?;
    pipeline
      .advance_to_interview(&actor, id, sender)
      .await
      .map_err(ApiError::from_pipeline)?
  };
  Ok(Json(application))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub email_sender_id: Uuid,
  #[serde(default)]
  pub reasons:         Vec<RejectionReason>,
}

/// `POST /applications/:id/reject` — direct reject from the queue.
pub async fn reject<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  ActorContext(actor): ActorContext,
  Json(body): Json<RejectBody>,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .reject_application(&actor, id, body.email_sender_id, body.reasons)
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(application))
}

/// `POST /applications/:id/move-back`
pub async fn move_back<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  ActorContext(actor): ActorContext,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .move_back(&actor, id)
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(application))
}

/// `POST /applications/:id/restore`
pub async fn restore<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  ActorContext(actor): ActorContext,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .restore(&actor, id)
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(application))
}

// ─── Rejection drafts ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct GenerateDraftBody {
  #[serde(default)]
  pub reasons: Vec<RejectionReason>,
}

/// `POST /applications/:id/rejection-draft`
pub async fn generate_draft<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<GenerateDraftBody>,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .generate_rejection_draft(id, body.reasons)
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(application))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDraftBody {
  pub email: String,
}

/// `PUT /applications/:id/rejection-draft`
pub async fn update_draft<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateDraftBody>,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .update_rejection_draft(id, body.email)
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(application))
}

/// One selectable rejection reason with its summary line.
#[derive(Debug, Serialize)]
pub struct ReasonEntry {
  pub reason:  RejectionReason,
  pub summary: &'static str,
}

/// `GET /rejection-reasons` — the reason library partners pick from.
pub async fn rejection_reasons() -> Json<Vec<ReasonEntry>> {
  Json(
    RejectionReason::iter()
      .map(|reason| ReasonEntry {
        reason,
        summary: reason.summary(),
      })
      .collect(),
  )
}

/// `POST /applications/:id/email-sent`
pub async fn email_sent<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Application>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let application = pipeline
    .mark_email_sent(id)
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(application))
}
