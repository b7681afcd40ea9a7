//! Handlers for `/applications/:id/votes`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT` | `/applications/:id/votes` | Cast or update the actor's vote |
//! | `GET` | `/applications/:id/votes` | Tally always; values once revealed |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use dealflow_core::{
  application::{Vote, VoteRound, VoteTally, VoteValue},
  dispatch::Dispatcher,
  pipeline::Pipeline,
  store::CrmStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{actor::ActorContext, error::ApiError};

// ─── Cast ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CastBody {
  pub value: VoteValue,
  pub notes: Option<String>,
}

/// `PUT /applications/:id/votes` — idempotent per voter.
pub async fn cast<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  ActorContext(actor): ActorContext,
  Json(body): Json<CastBody>,
) -> Result<Json<Vote>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let vote = pipeline
    .cast_vote(&actor, id, body.value, body.notes)
    .await
    .map_err(ApiError::from_pipeline)?;
  Ok(Json(vote))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// Vote listing with the reveal rule applied: how partners voted stays
/// hidden until the application's reveal flag is set. The voter count (the
/// quorum input) is always visible.
#[derive(Debug, Serialize)]
pub struct VotesResponse {
  pub revealed:       bool,
  pub total:          usize,
  pub quorum_reached: bool,
  /// Per-value counts; `None` until revealed.
  pub tally:          Option<VoteTally>,
  /// Individual votes; `None` until revealed.
  pub votes:          Option<Vec<Vote>>,
}

/// `GET /applications/:id/votes`
pub async fn list<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<VotesResponse>, ApiError>
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

  let votes = pipeline
    .store()
    .list_votes(id, VoteRound::Initial)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let tally = VoteTally::from_votes(&votes);
  let revealed = application.votes_revealed;

  Ok(Json(VotesResponse {
    revealed,
    total: tally.total(),
    quorum_reached: tally.quorum_reached(),
    tally: revealed.then_some(tally),
    votes: revealed.then_some(votes),
  }))
}
