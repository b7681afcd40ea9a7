//! Deliberation — the single decision record attached to an application.
//!
//! Created once the application reaches interview stage and updated via
//! upsert keyed on the application reference. Decision transitions drive the
//! pipeline's side effects.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::rejection::RejectionReason;

// ─── Decision ────────────────────────────────────────────────────────────────

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
  #[default]
  Pending,
  Maybe,
  Yes,
  No,
}

impl Decision {
  /// Whether this decision ends the interview stage.
  pub fn is_terminal(self) -> bool { matches!(self, Self::Yes | Self::No) }
}

// ─── Deliberation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deliberation {
  pub deliberation_id: Uuid,
  pub application_id:  Uuid,
  pub meeting_date:    Option<NaiveDate>,
  pub idea_summary:    Option<String>,
  pub thoughts:        Option<String>,
  pub decision:        Decision,
  /// Free status label; forced to "portfolio" on a yes decision.
  pub status:          Option<String>,
  pub tags:            Vec<String>,
  pub updated_at:      DateTime<Utc>,
}

/// Upsert input keyed on `application_id`. At most one deliberation exists
/// per application; a second save updates it in place.
#[derive(Debug, Clone)]
pub struct DeliberationDraft {
  pub application_id: Uuid,
  pub meeting_date:   Option<NaiveDate>,
  pub idea_summary:   Option<String>,
  pub thoughts:       Option<String>,
  pub decision:       Decision,
  pub status:         Option<String>,
  pub tags:           Vec<String>,
}

// ─── Decision input ──────────────────────────────────────────────────────────

/// Terms captured when a yes decision is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentTerms {
  pub amount_cents:    i64,
  pub terms:           String,
  pub round:           Option<String>,
  pub valuation_cents: Option<i64>,
  pub invested_at:     NaiveDate,
}

/// Input to [`crate::pipeline::Pipeline::save_decision`].
#[derive(Debug, Clone)]
pub struct DecisionInput {
  pub decision:          Decision,
  pub meeting_date:      Option<NaiveDate>,
  pub idea_summary:      Option<String>,
  pub thoughts:          Option<String>,
  pub status:            Option<String>,
  pub tags:              Vec<String>,
  /// Required when `decision` is yes.
  pub investment:        Option<InvestmentTerms>,
  /// Required when `decision` is no.
  pub email_sender_id:   Option<Uuid>,
  /// Feeds the rejection draft when `decision` is no.
  pub rejection_reasons: Vec<RejectionReason>,
}

impl DecisionInput {
  /// A bare decision with every optional field unset.
  pub fn decided(decision: Decision) -> Self {
    Self {
      decision,
      meeting_date: None,
      idea_summary: None,
      thoughts: None,
      status: None,
      tags: Vec::new(),
      investment: None,
      email_sender_id: None,
      rejection_reasons: Vec::new(),
    }
  }
}
