//! Follow-up tickets created as best-effort side effects of stage moves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketKind {
  /// Created when an application advances to interview; assigned to the
  /// partner who will send the interview email.
  InterviewFollowUp,
  /// Created when an application is rejected; assigned to the partner who
  /// will send the rejection email.
  RejectionEmail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:      Uuid,
  pub application_id: Uuid,
  pub assignee_id:    Uuid,
  pub kind:           TicketKind,
  pub note:           Option<String>,
  pub created_at:     DateTime<Utc>,
  pub closed_at:      Option<DateTime<Utc>>,
}

/// Input to [`crate::store::CrmStore::add_ticket`].
#[derive(Debug, Clone)]
pub struct NewTicket {
  pub application_id: Uuid,
  pub assignee_id:    Uuid,
  pub kind:           TicketKind,
  pub note:           Option<String>,
}
