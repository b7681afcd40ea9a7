//! Company records, the people attached to them, and their investments.
//!
//! Companies outlive any single application. People are joined through
//! relationship rows that are only ever soft-removed (an end timestamp),
//! and investments are append-only from the pipeline's perspective.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::stage::CompanyStage;

// ─── Company ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub company_id:  Uuid,
  pub name:        String,
  pub stage:       CompanyStage,
  pub one_liner:   Option<String>,
  pub description: Option<String>,
  pub tags:        Vec<String>,
  /// Path into the logo file store; no binary data lives in the database.
  pub logo_path:   Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::CrmStore::add_company`].
#[derive(Debug, Clone)]
pub struct NewCompany {
  pub name:        String,
  pub stage:       CompanyStage,
  pub one_liner:   Option<String>,
  pub description: Option<String>,
  pub tags:        Vec<String>,
  pub logo_path:   Option<String>,
}

impl NewCompany {
  /// Convenience constructor: a fresh prospect with no descriptive fields.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      stage:       CompanyStage::Prospect,
      one_liner:   None,
      description: None,
      tags:        Vec::new(),
      logo_path:   None,
    }
  }
}

// ─── People ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub person_id:  Uuid,
  pub name:       String,
  pub email:      Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPerson {
  pub name:  String,
  pub email: Option<String>,
}

/// How a person relates to a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
  Founder,
  Executive,
  Advisor,
  Custom(String),
}

/// Join row between a company and a person. Removal is soft: `ended_at` is
/// set and the row stays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyPerson {
  pub company_id:   Uuid,
  pub person_id:    Uuid,
  pub relationship: RelationshipKind,
  pub started_at:   DateTime<Utc>,
  pub ended_at:     Option<DateTime<Utc>>,
}

// ─── Investments ─────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvestmentStatus {
  #[default]
  Active,
  Exited,
  WrittenOff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
  pub investment_id:   Uuid,
  pub company_id:      Uuid,
  /// The application whose yes decision created this row, if any.
  pub application_id:  Option<Uuid>,
  pub amount_cents:    i64,
  pub terms:           String,
  pub round:           Option<String>,
  pub valuation_cents: Option<i64>,
  pub invested_at:     NaiveDate,
  pub status:          InvestmentStatus,
  pub recorded_at:     DateTime<Utc>,
}

/// Input to [`crate::store::CrmStore::add_investment`].
/// `recorded_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewInvestment {
  pub company_id:      Uuid,
  pub application_id:  Option<Uuid>,
  pub amount_cents:    i64,
  pub terms:           String,
  pub round:           Option<String>,
  pub valuation_cents: Option<i64>,
  pub invested_at:     NaiveDate,
  pub status:          InvestmentStatus,
}
