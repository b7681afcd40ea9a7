//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`. Stage
//! and decision enums round-trip through their canonical lowercase text form.
//! Tag sets are compact JSON arrays. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use dealflow_core::{
  application::{Application, Vote, VoteRound, VoteValue},
  company::{
    Company, CompanyPerson, Investment, InvestmentStatus, Person,
    RelationshipKind,
  },
  deliberation::{Decision, Deliberation},
  stage::{ApplicationStage, CompanyStage},
  ticket::{Ticket, TicketKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_uuid_opt(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("bad date {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_application_stage(s: &str) -> Result<ApplicationStage> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown application stage: {s:?}")))
}

pub fn decode_company_stage(s: &str) -> Result<CompanyStage> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown company stage: {s:?}")))
}

pub fn decode_vote_round(s: &str) -> Result<VoteRound> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown vote round: {s:?}")))
}

pub fn decode_vote_value(s: &str) -> Result<VoteValue> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown vote value: {s:?}")))
}

pub fn decode_decision(s: &str) -> Result<Decision> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown decision: {s:?}")))
}

pub fn decode_investment_status(s: &str) -> Result<InvestmentStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown investment status: {s:?}")))
}

pub fn decode_ticket_kind(s: &str) -> Result<TicketKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown ticket kind: {s:?}")))
}

// ─── Relationship ────────────────────────────────────────────────────────────

/// Custom relationship labels are stored as-is; anything that isn't a known
/// keyword decodes back into `Custom`.
pub fn encode_relationship(kind: &RelationshipKind) -> String {
  match kind {
    RelationshipKind::Founder => "founder".to_string(),
    RelationshipKind::Executive => "executive".to_string(),
    RelationshipKind::Advisor => "advisor".to_string(),
    RelationshipKind::Custom(label) => label.clone(),
  }
}

pub fn decode_relationship(s: &str) -> RelationshipKind {
  match s {
    "founder" => RelationshipKind::Founder,
    "executive" => RelationshipKind::Executive,
    "advisor" => RelationshipKind::Advisor,
    other => RelationshipKind::Custom(other.to_owned()),
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `companies` row.
pub struct RawCompany {
  pub company_id:  String,
  pub name:        String,
  pub stage:       String,
  pub one_liner:   Option<String>,
  pub description: Option<String>,
  pub tags:        String,
  pub logo_path:   Option<String>,
  pub created_at:  String,
}

impl RawCompany {
  pub fn into_company(self) -> Result<Company> {
    Ok(Company {
      company_id:  decode_uuid(&self.company_id)?,
      name:        self.name,
      stage:       decode_company_stage(&self.stage)?,
      one_liner:   self.one_liner,
      description: self.description,
      tags:        decode_tags(&self.tags)?,
      logo_path:   self.logo_path,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `applications` row.
pub struct RawApplication {
  pub application_id:  String,
  pub company_id:      Option<String>,
  pub company_name:    String,
  pub contact_email:   Option<String>,
  pub founder_info:    Option<String>,
  pub stage:           String,
  pub previous_stage:  Option<String>,
  pub votes_revealed:  bool,
  pub email_sender_id: Option<String>,
  pub email_sent:      bool,
  pub email_sent_at:   Option<String>,
  pub rejection_draft: Option<String>,
  pub submitted_at:    String,
}

impl RawApplication {
  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      application_id:  decode_uuid(&self.application_id)?,
      company_id:      decode_uuid_opt(self.company_id.as_deref())?,
      company_name:    self.company_name,
      contact_email:   self.contact_email,
      founder_info:    self.founder_info,
      stage:           decode_application_stage(&self.stage)?,
      previous_stage:  self
        .previous_stage
        .as_deref()
        .map(decode_application_stage)
        .transpose()?,
      votes_revealed:  self.votes_revealed,
      email_sender_id: decode_uuid_opt(self.email_sender_id.as_deref())?,
      email_sent:      self.email_sent,
      email_sent_at:   self.email_sent_at.as_deref().map(decode_dt).transpose()?,
      rejection_draft: self.rejection_draft,
      submitted_at:    decode_dt(&self.submitted_at)?,
    })
  }
}

/// Raw strings read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:        String,
  pub application_id: String,
  pub voter_id:       String,
  pub round:          String,
  pub value:          String,
  pub notes:          Option<String>,
  pub recorded_at:    String,
}

impl RawVote {
  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:        decode_uuid(&self.vote_id)?,
      application_id: decode_uuid(&self.application_id)?,
      voter_id:       decode_uuid(&self.voter_id)?,
      round:          decode_vote_round(&self.round)?,
      value:          decode_vote_value(&self.value)?,
      notes:          self.notes,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `deliberations` row.
pub struct RawDeliberation {
  pub deliberation_id: String,
  pub application_id:  String,
  pub meeting_date:    Option<String>,
  pub idea_summary:    Option<String>,
  pub thoughts:        Option<String>,
  pub decision:        String,
  pub status:          Option<String>,
  pub tags:            String,
  pub updated_at:      String,
}

impl RawDeliberation {
  pub fn into_deliberation(self) -> Result<Deliberation> {
    Ok(Deliberation {
      deliberation_id: decode_uuid(&self.deliberation_id)?,
      application_id:  decode_uuid(&self.application_id)?,
      meeting_date:    self
        .meeting_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      idea_summary:    self.idea_summary,
      thoughts:        self.thoughts,
      decision:        decode_decision(&self.decision)?,
      status:          self.status,
      tags:            decode_tags(&self.tags)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `investments` row.
pub struct RawInvestment {
  pub investment_id:   String,
  pub company_id:      String,
  pub application_id:  Option<String>,
  pub amount_cents:    i64,
  pub terms:           String,
  pub round:           Option<String>,
  pub valuation_cents: Option<i64>,
  pub invested_at:     String,
  pub status:          String,
  pub recorded_at:     String,
}

impl RawInvestment {
  pub fn into_investment(self) -> Result<Investment> {
    Ok(Investment {
      investment_id:   decode_uuid(&self.investment_id)?,
      company_id:      decode_uuid(&self.company_id)?,
      application_id:  decode_uuid_opt(self.application_id.as_deref())?,
      amount_cents:    self.amount_cents,
      terms:           self.terms,
      round:           self.round,
      valuation_cents: self.valuation_cents,
      invested_at:     decode_date(&self.invested_at)?,
      status:          decode_investment_status(&self.status)?,
      recorded_at:     decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `people` row.
pub struct RawPerson {
  pub person_id:  String,
  pub name:       String,
  pub email:      Option<String>,
  pub created_at: String,
}

impl RawPerson {
  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:  decode_uuid(&self.person_id)?,
      name:       self.name,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `company_people` row.
pub struct RawCompanyPerson {
  pub company_id:   String,
  pub person_id:    String,
  pub relationship: String,
  pub started_at:   String,
  pub ended_at:     Option<String>,
}

impl RawCompanyPerson {
  pub fn into_link(self) -> Result<CompanyPerson> {
    Ok(CompanyPerson {
      company_id:   decode_uuid(&self.company_id)?,
      person_id:    decode_uuid(&self.person_id)?,
      relationship: decode_relationship(&self.relationship),
      started_at:   decode_dt(&self.started_at)?,
      ended_at:     self.ended_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `tickets` row.
pub struct RawTicket {
  pub ticket_id:      String,
  pub application_id: String,
  pub assignee_id:    String,
  pub kind:           String,
  pub note:           Option<String>,
  pub created_at:     String,
  pub closed_at:      Option<String>,
}

impl RawTicket {
  pub fn into_ticket(self) -> Result<Ticket> {
    Ok(Ticket {
      ticket_id:      decode_uuid(&self.ticket_id)?,
      application_id: decode_uuid(&self.application_id)?,
      assignee_id:    decode_uuid(&self.assignee_id)?,
      kind:           decode_ticket_kind(&self.kind)?,
      note:           self.note,
      created_at:     decode_dt(&self.created_at)?,
      closed_at:      self.closed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
