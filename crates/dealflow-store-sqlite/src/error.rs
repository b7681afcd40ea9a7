//! Error type for `dealflow-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dealflow_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("column decode error: {0}")]
  Decode(String),

  #[error("application not found: {0}")]
  ApplicationNotFound(Uuid),

  #[error("company not found: {0}")]
  CompanyNotFound(Uuid),

  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  /// The person is not (or no longer) linked to the company.
  #[error("person {person_id} is not linked to company {company_id}")]
  LinkNotFound { company_id: Uuid, person_id: Uuid },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
