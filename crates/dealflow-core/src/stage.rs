//! Lifecycle stages and the application→company stage mapping.
//!
//! Both tables are plain lookups. Company stages outside the ranked four
//! (`tracked`, `archived`, `fund`) never participate in the sync.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ─── Application stage ───────────────────────────────────────────────────────

/// Stage of an application as it moves through the intake pipeline.
///
/// `New` is an intake-only label: it counts as `Application` for queue
/// filtering and has no entry in the company-stage mapping.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApplicationStage {
  New,
  Application,
  Interview,
  Portfolio,
  Rejected,
}

impl ApplicationStage {
  /// Whether this stage sits in the open application queue.
  pub fn in_application_queue(self) -> bool {
    matches!(self, Self::New | Self::Application)
  }
}

// ─── Company stage ───────────────────────────────────────────────────────────

/// Stage of a company record. The vocabulary is wider than the pipeline's:
/// only the first four variants are ranked and written by the synchronizer.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompanyStage {
  Prospect,
  Diligence,
  Passed,
  Portfolio,
  Tracked,
  Archived,
  Fund,
}

impl CompanyStage {
  /// Rank used by the monotonic sync guard. Unranked stages are 0 so that
  /// any mapped stage can overwrite them.
  pub fn rank(self) -> u8 {
    match self {
      Self::Prospect => 1,
      Self::Diligence => 2,
      Self::Passed => 3,
      Self::Portfolio => 4,
      Self::Tracked | Self::Archived | Self::Fund => 0,
    }
  }
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

/// The company stage an application stage maps to, if any.
pub fn company_stage_for(stage: ApplicationStage) -> Option<CompanyStage> {
  match stage {
    ApplicationStage::Application => Some(CompanyStage::Prospect),
    ApplicationStage::Interview => Some(CompanyStage::Diligence),
    ApplicationStage::Portfolio => Some(CompanyStage::Portfolio),
    ApplicationStage::Rejected => Some(CompanyStage::Passed),
    ApplicationStage::New => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mapping_matches_table() {
    assert_eq!(
      company_stage_for(ApplicationStage::Application),
      Some(CompanyStage::Prospect)
    );
    assert_eq!(
      company_stage_for(ApplicationStage::Interview),
      Some(CompanyStage::Diligence)
    );
    assert_eq!(
      company_stage_for(ApplicationStage::Portfolio),
      Some(CompanyStage::Portfolio)
    );
    assert_eq!(
      company_stage_for(ApplicationStage::Rejected),
      Some(CompanyStage::Passed)
    );
    assert_eq!(company_stage_for(ApplicationStage::New), None);
  }

  #[test]
  fn ranks_are_ordered() {
    assert!(CompanyStage::Prospect.rank() < CompanyStage::Diligence.rank());
    assert!(CompanyStage::Diligence.rank() < CompanyStage::Passed.rank());
    assert!(CompanyStage::Passed.rank() < CompanyStage::Portfolio.rank());
  }

  #[test]
  fn unranked_stages_are_zero() {
    assert_eq!(CompanyStage::Tracked.rank(), 0);
    assert_eq!(CompanyStage::Archived.rank(), 0);
    assert_eq!(CompanyStage::Fund.rank(), 0);
  }

  #[test]
  fn new_counts_as_application_queue() {
    assert!(ApplicationStage::New.in_application_queue());
    assert!(ApplicationStage::Application.in_application_queue());
    assert!(!ApplicationStage::Interview.in_application_queue());
  }

  #[test]
  fn stage_text_roundtrip() {
    assert_eq!(ApplicationStage::Interview.to_string(), "interview");
    assert_eq!(
      "interview".parse::<ApplicationStage>().unwrap(),
      ApplicationStage::Interview
    );
    assert_eq!(CompanyStage::Diligence.to_string(), "diligence");
    assert_eq!(
      "diligence".parse::<CompanyStage>().unwrap(),
      CompanyStage::Diligence
    );
  }
}
