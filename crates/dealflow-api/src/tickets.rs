//! Handler for `GET /tickets`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use dealflow_core::{
  dispatch::Dispatcher, pipeline::Pipeline, store::CrmStore, ticket::Ticket,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub assignee:  Option<Uuid>,
  /// When `true`, only tickets without a closed timestamp are returned.
  #[serde(default)]
  pub open_only: bool,
}

/// `GET /tickets[?assignee=...][&open_only=true]`
pub async fn list<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Ticket>>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let tickets = pipeline
    .store()
    .list_tickets(params.assignee, params.open_only)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(tickets))
}
