//! Application — one company's fundraising intake record — and its votes.
//!
//! An application is the unit that moves through the stage pipeline. Votes
//! hang off it one row per (application, voter, round); re-votes update in
//! place rather than inserting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::stage::ApplicationStage;

/// Number of distinct partner votes that make a quorum. The fund models a
/// three-partner voting body.
pub const QUORUM: usize = 3;

// ─── Application ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
  pub application_id:  Uuid,
  /// Nullable — an application may predate its company record.
  pub company_id:      Option<Uuid>,
  pub company_name:    String,
  pub contact_email:   Option<String>,
  pub founder_info:    Option<String>,
  pub stage:           ApplicationStage,
  /// Undo pointer for the restore path.
  pub previous_stage:  Option<ApplicationStage>,
  pub votes_revealed:  bool,
  pub email_sender_id: Option<Uuid>,
  pub email_sent:      bool,
  pub email_sent_at:   Option<DateTime<Utc>>,
  pub rejection_draft: Option<String>,
  pub submitted_at:    DateTime<Utc>,
}

/// Input to [`crate::store::CrmStore::add_application`].
/// `submitted_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewApplication {
  pub company_id:    Option<Uuid>,
  pub company_name:  String,
  pub contact_email: Option<String>,
  pub founder_info:  Option<String>,
}

impl NewApplication {
  /// Convenience constructor with all optional fields unset.
  pub fn named(company_name: impl Into<String>) -> Self {
    Self {
      company_id:    None,
      company_name:  company_name.into(),
      contact_email: None,
      founder_info:  None,
    }
  }
}

/// Partial update applied to an application row.
///
/// `None` leaves the column unchanged; on nullable columns, `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
  pub stage:           Option<ApplicationStage>,
  pub previous_stage:  Option<Option<ApplicationStage>>,
  pub votes_revealed:  Option<bool>,
  pub email_sender_id: Option<Option<Uuid>>,
  pub email_sent:      Option<bool>,
  pub email_sent_at:   Option<Option<DateTime<Utc>>>,
  pub rejection_draft: Option<Option<String>>,
}

// ─── Votes ───────────────────────────────────────────────────────────────────

/// The voting round a vote belongs to. Only the initial round exists today.
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
pub enum VoteRound {
  #[default]
  Initial,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VoteValue {
  Yes,
  Maybe,
  No,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
  pub vote_id:        Uuid,
  pub application_id: Uuid,
  pub voter_id:       Uuid,
  pub round:          VoteRound,
  pub value:          VoteValue,
  pub notes:          Option<String>,
  pub recorded_at:    DateTime<Utc>,
}

/// Input to [`crate::store::CrmStore::upsert_vote`]. At most one vote exists
/// per (application, voter, round); a second submission updates it in place.
#[derive(Debug, Clone)]
pub struct NewVote {
  pub application_id: Uuid,
  pub voter_id:       Uuid,
  pub round:          VoteRound,
  pub value:          VoteValue,
  pub notes:          Option<String>,
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// Read-side vote aggregate for one application and round.
///
/// Quorum depends only on the distinct-voter count, never on the values cast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
  pub yes:   usize,
  pub maybe: usize,
  pub no:    usize,
}

impl VoteTally {
  pub fn from_votes(votes: &[Vote]) -> Self {
    let mut tally = Self::default();
    for vote in votes {
      match vote.value {
        VoteValue::Yes => tally.yes += 1,
        VoteValue::Maybe => tally.maybe += 1,
        VoteValue::No => tally.no += 1,
      }
    }
    tally
  }

  pub fn total(&self) -> usize { self.yes + self.maybe + self.no }

  pub fn quorum_reached(&self) -> bool { self.total() >= QUORUM }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn vote(value: VoteValue) -> Vote {
    Vote {
      vote_id:        Uuid::new_v4(),
      application_id: Uuid::new_v4(),
      voter_id:       Uuid::new_v4(),
      round:          VoteRound::Initial,
      value,
      notes:          None,
      recorded_at:    Utc::now(),
    }
  }

  #[test]
  fn tally_counts_by_value() {
    let votes = vec![
      vote(VoteValue::Yes),
      vote(VoteValue::Yes),
      vote(VoteValue::No),
    ];
    let tally = VoteTally::from_votes(&votes);
    assert_eq!(tally.yes, 2);
    assert_eq!(tally.maybe, 0);
    assert_eq!(tally.no, 1);
    assert_eq!(tally.total(), 3);
  }

  #[test]
  fn quorum_ignores_values() {
    // Three "no" votes make quorum just as well as three "yes" votes.
    let all_no = vec![
      vote(VoteValue::No),
      vote(VoteValue::No),
      vote(VoteValue::No),
    ];
    assert!(VoteTally::from_votes(&all_no).quorum_reached());

    let mixed = vec![vote(VoteValue::Yes), vote(VoteValue::Maybe)];
    assert!(!VoteTally::from_votes(&mixed).quorum_reached());
  }
}
