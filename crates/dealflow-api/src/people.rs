//! Handlers for `/people` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/people` | Body: `{"name": "...", "email": "..."}` |
//! | `GET`  | `/people/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use dealflow_core::{
  company::{NewPerson, Person},
  dispatch::Dispatcher,
  pipeline::Pipeline,
  store::CrmStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:  String,
  pub email: Option<String>,
}

/// `POST /people`
pub async fn create<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let person = pipeline
    .store()
    .add_person(NewPerson {
      name:  body.name,
      email: body.email,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /people/:id`
pub async fn get_one<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let person = pipeline
    .store()
    .get_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}
