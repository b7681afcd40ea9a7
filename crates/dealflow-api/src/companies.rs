//! Handlers for `/companies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/companies` | Optional `?stage=`, `?text=`, `?limit=`, `?offset=` |
//! | `POST`   | `/companies` | Body: [`CreateBody`] |
//! | `GET`    | `/companies/:id` | 404 if not found |
//! | `GET`    | `/companies/:id/investments` | |
//! | `GET`    | `/companies/:id/people` | Optional `?include_ended=true` |
//! | `POST`   | `/companies/:id/people` | Attach a person |
//! | `DELETE` | `/companies/:id/people/:person_id` | Soft removal |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dealflow_core::{
  company::{
    Company, CompanyPerson, Investment, NewCompany, Person, RelationshipKind,
  },
  dispatch::Dispatcher,
  pipeline::Pipeline,
  stage::CompanyStage,
  store::{CompanyQuery, CrmStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub stage:  Option<CompanyStage>,
  pub text:   Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /companies[?stage=...][&text=...]`
pub async fn list<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Company>>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let query = CompanyQuery {
    stage:  params.stage,
    text:   params.text,
    limit:  params.limit,
    offset: params.offset,
  };
  let companies = pipeline
    .store()
    .list_companies(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(companies))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub stage:       Option<CompanyStage>,
  pub one_liner:   Option<String>,
  pub description: Option<String>,
  #[serde(default)]
  pub tags:        Vec<String>,
  pub logo_path:   Option<String>,
}

/// `POST /companies`
pub async fn create<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let company = pipeline
    .store()
    .add_company(NewCompany {
      name:        body.name,
      stage:       body.stage.unwrap_or(CompanyStage::Prospect),
      one_liner:   body.one_liner,
      description: body.description,
      tags:        body.tags,
      logo_path:   body.logo_path,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(company)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /companies/:id`
pub async fn get_one<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let company = pipeline
    .store()
    .get_company(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("company {id} not found")))?;
  Ok(Json(company))
}

// ─── Investments ─────────────────────────────────────────────────────────────

/// `GET /companies/:id/investments`
pub async fn investments<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Investment>>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let investments = pipeline
    .store()
    .list_investments(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(investments))
}

// ─── People ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PeopleParams {
  #[serde(default)]
  pub include_ended: bool,
}

/// One entry in the company's people listing.
#[derive(Debug, Serialize)]
pub struct CompanyPersonEntry {
  pub link:   CompanyPerson,
  pub person: Person,
}

/// `GET /companies/:id/people[?include_ended=true]`
pub async fn people<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  Query(params): Query<PeopleParams>,
) -> Result<Json<Vec<CompanyPersonEntry>>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let entries = pipeline
    .store()
    .list_company_people(id, params.include_ended)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .map(|(link, person)| CompanyPersonEntry { link, person })
    .collect();
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct LinkBody {
  pub person_id:    Uuid,
  pub relationship: RelationshipKind,
}

/// `POST /companies/:id/people`
pub async fn link_person<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<LinkBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let link = pipeline
    .store()
    .link_person(id, body.person_id, body.relationship)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(link)))
}

/// `DELETE /companies/:id/people/:person_id` — stamps the end timestamp.
pub async fn unlink_person<S, D>(
  State(pipeline): State<Arc<Pipeline<S, D>>>,
  Path((id, person_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CompanyPerson>, ApiError>
where
  S: CrmStore,
  D: Dispatcher,
{
  let link = pipeline
    .store()
    .end_person_link(id, person_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(link))
}
