//! [`SqliteStore`] — the SQLite implementation of [`CrmStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use dealflow_core::{
  application::{
    Application, ApplicationPatch, NewApplication, NewVote, Vote, VoteRound,
  },
  company::{
    Company, CompanyPerson, Investment, NewCompany, NewInvestment, NewPerson,
    Person, RelationshipKind,
  },
  deliberation::{Deliberation, DeliberationDraft},
  stage::{ApplicationStage, CompanyStage},
  store::{ApplicationQuery, CompanyQuery, CrmStore},
  ticket::{NewTicket, Ticket},
};

use crate::{
  Error, Result,
  encode::{
    RawApplication, RawCompany, RawCompanyPerson, RawDeliberation,
    RawInvestment, RawPerson, RawTicket, RawVote, encode_date, encode_dt,
    encode_relationship, encode_tags, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Column lists ────────────────────────────────────────────────────────────

const COMPANY_COLS: &str =
  "company_id, name, stage, one_liner, description, tags, logo_path, \
   created_at";

const APPLICATION_COLS: &str =
  "application_id, company_id, company_name, contact_email, founder_info, \
   stage, previous_stage, votes_revealed, email_sender_id, email_sent, \
   email_sent_at, rejection_draft, submitted_at";

const VOTE_COLS: &str =
  "vote_id, application_id, voter_id, round, value, notes, recorded_at";

const DELIBERATION_COLS: &str =
  "deliberation_id, application_id, meeting_date, idea_summary, thoughts, \
   decision, status, tags, updated_at";

const INVESTMENT_COLS: &str =
  "investment_id, company_id, application_id, amount_cents, terms, round, \
   valuation_cents, invested_at, status, recorded_at";

const TICKET_COLS: &str =
  "ticket_id, application_id, assignee_id, kind, note, created_at, closed_at";

// ─── Row readers ─────────────────────────────────────────────────────────────

fn company_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCompany> {
  Ok(RawCompany {
    company_id:  row.get(0)?,
    name:        row.get(1)?,
    stage:       row.get(2)?,
    one_liner:   row.get(3)?,
    description: row.get(4)?,
    tags:        row.get(5)?,
    logo_path:   row.get(6)?,
    created_at:  row.get(7)?,
  })
}

fn application_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawApplication> {
  Ok(RawApplication {
    application_id:  row.get(0)?,
    company_id:      row.get(1)?,
    company_name:    row.get(2)?,
    contact_email:   row.get(3)?,
    founder_info:    row.get(4)?,
    stage:           row.get(5)?,
    previous_stage:  row.get(6)?,
    votes_revealed:  row.get(7)?,
    email_sender_id: row.get(8)?,
    email_sent:      row.get(9)?,
    email_sent_at:   row.get(10)?,
    rejection_draft: row.get(11)?,
    submitted_at:    row.get(12)?,
  })
}

fn vote_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawVote> {
  Ok(RawVote {
    vote_id:        row.get(0)?,
    application_id: row.get(1)?,
    voter_id:       row.get(2)?,
    round:          row.get(3)?,
    value:          row.get(4)?,
    notes:          row.get(5)?,
    recorded_at:    row.get(6)?,
  })
}

fn deliberation_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawDeliberation> {
  Ok(RawDeliberation {
    deliberation_id: row.get(0)?,
    application_id:  row.get(1)?,
    meeting_date:    row.get(2)?,
    idea_summary:    row.get(3)?,
    thoughts:        row.get(4)?,
    decision:        row.get(5)?,
    status:          row.get(6)?,
    tags:            row.get(7)?,
    updated_at:      row.get(8)?,
  })
}

fn investment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawInvestment> {
  Ok(RawInvestment {
    investment_id:   row.get(0)?,
    company_id:      row.get(1)?,
    application_id:  row.get(2)?,
    amount_cents:    row.get(3)?,
    terms:           row.get(4)?,
    round:           row.get(5)?,
    valuation_cents: row.get(6)?,
    invested_at:     row.get(7)?,
    status:          row.get(8)?,
    recorded_at:     row.get(9)?,
  })
}

fn ticket_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTicket> {
  Ok(RawTicket {
    ticket_id:      row.get(0)?,
    application_id: row.get(1)?,
    assignee_id:    row.get(2)?,
    kind:           row.get(3)?,
    note:           row.get(4)?,
    created_at:     row.get(5)?,
    closed_at:      row.get(6)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dealflow CRM store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CrmStore impl ───────────────────────────────────────────────────────────

impl CrmStore for SqliteStore {
  type Error = Error;

  // ── Companies ─────────────────────────────────────────────────────────────

  async fn add_company(&self, input: NewCompany) -> Result<Company> {
    let company = Company {
      company_id:  Uuid::new_v4(),
      name:        input.name,
      stage:       input.stage,
      one_liner:   input.one_liner,
      description: input.description,
      tags:        input.tags,
      logo_path:   input.logo_path,
      created_at:  Utc::now(),
    };

    let id_str    = encode_uuid(company.company_id);
    let name      = company.name.clone();
    let stage_str = company.stage.to_string();
    let one_liner = company.one_liner.clone();
    let desc      = company.description.clone();
    let tags_str  = encode_tags(&company.tags)?;
    let logo      = company.logo_path.clone();
    let at_str    = encode_dt(company.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO companies (
             company_id, name, stage, one_liner, description, tags,
             logo_path, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, name, stage_str, one_liner, desc, tags_str, logo, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(company)
  }

  async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCompany> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {COMPANY_COLS} FROM companies WHERE company_id = ?1"
              ),
              rusqlite::params![id_str],
              company_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompany::into_company).transpose()
  }

  async fn list_companies(&self, query: &CompanyQuery) -> Result<Vec<Company>> {
    let stage_str    = query.stage.map(|s| s.to_string());
    let text_pattern = query.text.as_deref().map(|t| format!("%{t}%"));
    let limit_val    = query.limit.unwrap_or(100) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawCompany> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if stage_str.is_some() {
          conds.push("stage = ?1");
        }
        if text_pattern.is_some() {
          conds.push(
            "(name LIKE ?2 OR one_liner LIKE ?2 OR description LIKE ?2)",
          );
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {COMPANY_COLS} FROM companies
           {where_clause}
           ORDER BY name, company_id
           LIMIT ?3 OFFSET ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              stage_str.as_deref(),
              text_pattern.as_deref(),
              limit_val,
              offset_val,
            ],
            company_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompany::into_company).collect()
  }

  async fn set_company_stage(
    &self,
    id: Uuid,
    stage: CompanyStage,
  ) -> Result<()> {
    let id_str    = encode_uuid(id);
    let stage_str = stage.to_string();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE companies SET stage = ?2 WHERE company_id = ?1",
          rusqlite::params![id_str, stage_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::CompanyNotFound(id));
    }
    Ok(())
  }

  // ── Applications ──────────────────────────────────────────────────────────

  async fn add_application(
    &self,
    input: NewApplication,
  ) -> Result<Application> {
    let application = Application {
      application_id:  Uuid::new_v4(),
      company_id:      input.company_id,
      company_name:    input.company_name,
      contact_email:   input.contact_email,
      founder_info:    input.founder_info,
      stage:           ApplicationStage::New,
      previous_stage:  None,
      votes_revealed:  false,
      email_sender_id: None,
      email_sent:      false,
      email_sent_at:   None,
      rejection_draft: None,
      submitted_at:    Utc::now(),
    };

    let id_str      = encode_uuid(application.application_id);
    let company_str = application.company_id.map(encode_uuid);
    let name        = application.company_name.clone();
    let email       = application.contact_email.clone();
    let founders    = application.founder_info.clone();
    let stage_str   = application.stage.to_string();
    let at_str      = encode_dt(application.submitted_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO applications (
             application_id, company_id, company_name, contact_email,
             founder_info, stage, submitted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, company_str, name, email, founders, stage_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(application)
  }

  async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawApplication> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {APPLICATION_COLS} FROM applications
                 WHERE application_id = ?1"
              ),
              rusqlite::params![id_str],
              application_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawApplication::into_application).transpose()
  }

  async fn list_applications(
    &self,
    query: &ApplicationQuery,
  ) -> Result<Vec<Application>> {
    // The intake-only `new` label shares the open queue with `application`.
    let queue_filter =
      query.stage.is_some_and(ApplicationStage::in_application_queue);
    let stage_str    = query.stage.map(|s| s.to_string());
    let text_pattern = query.text.as_deref().map(|t| format!("%{t}%"));
    let limit_val    = query.limit.unwrap_or(100) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawApplication> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if stage_str.is_some() {
          if queue_filter {
            conds.push("stage IN ('new', 'application')");
          } else {
            conds.push("stage = ?1");
          }
        }
        if text_pattern.is_some() {
          conds.push("(company_name LIKE ?2 OR founder_info LIKE ?2)");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {APPLICATION_COLS} FROM applications
           {where_clause}
           ORDER BY submitted_at DESC, application_id
           LIMIT ?3 OFFSET ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              stage_str.as_deref(),
              text_pattern.as_deref(),
              limit_val,
              offset_val,
            ],
            application_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawApplication::into_application)
      .collect()
  }

  async fn update_application(
    &self,
    id: Uuid,
    patch: ApplicationPatch,
  ) -> Result<Application> {
    // Read-then-write: fetch the current row, apply the patch in memory,
    // write the mutable columns back.
    let Some(mut application) = self.get_application(id).await? else {
      return Err(Error::ApplicationNotFound(id));
    };

    if let Some(stage) = patch.stage {
      application.stage = stage;
    }
    if let Some(previous) = patch.previous_stage {
      application.previous_stage = previous;
    }
    if let Some(revealed) = patch.votes_revealed {
      application.votes_revealed = revealed;
    }
    if let Some(sender) = patch.email_sender_id {
      application.email_sender_id = sender;
    }
    if let Some(sent) = patch.email_sent {
      application.email_sent = sent;
    }
    if let Some(sent_at) = patch.email_sent_at {
      application.email_sent_at = sent_at;
    }
    if let Some(draft) = patch.rejection_draft {
      application.rejection_draft = draft;
    }

    let id_str       = encode_uuid(id);
    let stage_str    = application.stage.to_string();
    let previous_str = application.previous_stage.map(|s| s.to_string());
    let revealed     = application.votes_revealed;
    let sender_str   = application.email_sender_id.map(encode_uuid);
    let sent         = application.email_sent;
    let sent_at_str  = application.email_sent_at.map(encode_dt);
    let draft        = application.rejection_draft.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE applications SET
             stage           = ?2,
             previous_stage  = ?3,
             votes_revealed  = ?4,
             email_sender_id = ?5,
             email_sent      = ?6,
             email_sent_at   = ?7,
             rejection_draft = ?8
           WHERE application_id = ?1",
          rusqlite::params![
            id_str,
            stage_str,
            previous_str,
            revealed,
            sender_str,
            sent,
            sent_at_str,
            draft,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(application)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn upsert_vote(&self, input: NewVote) -> Result<Vote> {
    let vote_id_str = encode_uuid(Uuid::new_v4());
    let app_str     = encode_uuid(input.application_id);
    let voter_str   = encode_uuid(input.voter_id);
    let round_str   = input.round.to_string();
    let value_str   = input.value.to_string();
    let notes       = input.notes.clone();
    let at_str      = encode_dt(Utc::now());

    let raw: RawVote = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO votes (
             vote_id, application_id, voter_id, round, value, notes,
             recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (application_id, voter_id, round)
           DO UPDATE SET
             value       = excluded.value,
             notes       = excluded.notes,
             recorded_at = excluded.recorded_at",
          rusqlite::params![
            vote_id_str, app_str, voter_str, round_str, value_str, notes,
            at_str,
          ],
        )?;

        // Re-read the canonical row: on conflict the original vote_id wins.
        Ok(conn.query_row(
          &format!(
            "SELECT {VOTE_COLS} FROM votes
             WHERE application_id = ?1 AND voter_id = ?2 AND round = ?3"
          ),
          rusqlite::params![app_str, voter_str, round_str],
          vote_row,
        )?)
      })
      .await?;

    raw.into_vote()
  }

  async fn list_votes(
    &self,
    application_id: Uuid,
    round: VoteRound,
  ) -> Result<Vec<Vote>> {
    let app_str   = encode_uuid(application_id);
    let round_str = round.to_string();

    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VOTE_COLS} FROM votes
           WHERE application_id = ?1 AND round = ?2
           ORDER BY recorded_at, vote_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![app_str, round_str], vote_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }

  async fn count_voters(
    &self,
    application_id: Uuid,
    round: VoteRound,
  ) -> Result<usize> {
    let app_str   = encode_uuid(application_id);
    let round_str = round.to_string();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(DISTINCT voter_id) FROM votes
           WHERE application_id = ?1 AND round = ?2",
          rusqlite::params![app_str, round_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as usize)
  }

  // ── Deliberations ─────────────────────────────────────────────────────────

  async fn upsert_deliberation(
    &self,
    draft: DeliberationDraft,
  ) -> Result<Deliberation> {
    let delib_id_str = encode_uuid(Uuid::new_v4());
    let app_str      = encode_uuid(draft.application_id);
    let meeting_str  = draft.meeting_date.map(encode_date);
    let summary      = draft.idea_summary.clone();
    let thoughts     = draft.thoughts.clone();
    let decision_str = draft.decision.to_string();
    let status       = draft.status.clone();
    let tags_str     = encode_tags(&draft.tags)?;
    let at_str       = encode_dt(Utc::now());

    let raw: RawDeliberation = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO deliberations (
             deliberation_id, application_id, meeting_date, idea_summary,
             thoughts, decision, status, tags, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT (application_id)
           DO UPDATE SET
             meeting_date = excluded.meeting_date,
             idea_summary = excluded.idea_summary,
             thoughts     = excluded.thoughts,
             decision     = excluded.decision,
             status       = excluded.status,
             tags         = excluded.tags,
             updated_at   = excluded.updated_at",
          rusqlite::params![
            delib_id_str,
            app_str,
            meeting_str,
            summary,
            thoughts,
            decision_str,
            status,
            tags_str,
            at_str,
          ],
        )?;

        Ok(conn.query_row(
          &format!(
            "SELECT {DELIBERATION_COLS} FROM deliberations
             WHERE application_id = ?1"
          ),
          rusqlite::params![app_str],
          deliberation_row,
        )?)
      })
      .await?;

    raw.into_deliberation()
  }

  async fn get_deliberation(
    &self,
    application_id: Uuid,
  ) -> Result<Option<Deliberation>> {
    let app_str = encode_uuid(application_id);

    let raw: Option<RawDeliberation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DELIBERATION_COLS} FROM deliberations
                 WHERE application_id = ?1"
              ),
              rusqlite::params![app_str],
              deliberation_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDeliberation::into_deliberation).transpose()
  }

  // ── Investments ───────────────────────────────────────────────────────────

  async fn add_investment(&self, input: NewInvestment) -> Result<Investment> {
    let investment = Investment {
      investment_id:   Uuid::new_v4(),
      company_id:      input.company_id,
      application_id:  input.application_id,
      amount_cents:    input.amount_cents,
      terms:           input.terms,
      round:           input.round,
      valuation_cents: input.valuation_cents,
      invested_at:     input.invested_at,
      status:          input.status,
      recorded_at:     Utc::now(),
    };

    let id_str       = encode_uuid(investment.investment_id);
    let company_str  = encode_uuid(investment.company_id);
    let app_str      = investment.application_id.map(encode_uuid);
    let amount       = investment.amount_cents;
    let terms        = investment.terms.clone();
    let round        = investment.round.clone();
    let valuation    = investment.valuation_cents;
    let invested_str = encode_date(investment.invested_at);
    let status_str   = investment.status.to_string();
    let at_str       = encode_dt(investment.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO investments (
             investment_id, company_id, application_id, amount_cents, terms,
             round, valuation_cents, invested_at, status, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            company_str,
            app_str,
            amount,
            terms,
            round,
            valuation,
            invested_str,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(investment)
  }

  async fn list_investments(&self, company_id: Uuid) -> Result<Vec<Investment>> {
    let company_str = encode_uuid(company_id);

    let raws: Vec<RawInvestment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INVESTMENT_COLS} FROM investments
           WHERE company_id = ?1
           ORDER BY recorded_at, investment_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![company_str], investment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInvestment::into_investment).collect()
  }

  // ── People ────────────────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      person_id:  Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(person.person_id);
    let name   = person.name.clone();
    let email  = person.email.clone();
    let at_str = encode_dt(person.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (person_id, name, email, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, email, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT person_id, name, email, created_at FROM people
               WHERE person_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPerson {
                  person_id:  row.get(0)?,
                  name:       row.get(1)?,
                  email:      row.get(2)?,
                  created_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn link_person(
    &self,
    company_id: Uuid,
    person_id: Uuid,
    relationship: RelationshipKind,
  ) -> Result<CompanyPerson> {
    if self.get_company(company_id).await?.is_none() {
      return Err(Error::CompanyNotFound(company_id));
    }
    if self.get_person(person_id).await?.is_none() {
      return Err(Error::PersonNotFound(person_id));
    }

    let link = CompanyPerson {
      company_id,
      person_id,
      relationship,
      started_at: Utc::now(),
      ended_at: None,
    };

    let company_str  = encode_uuid(company_id);
    let person_str   = encode_uuid(person_id);
    let relation_str = encode_relationship(&link.relationship);
    let at_str       = encode_dt(link.started_at);

    self
      .conn
      .call(move |conn| {
        // Re-linking a soft-removed person reactivates the row.
        conn.execute(
          "INSERT INTO company_people (
             company_id, person_id, relationship, started_at, ended_at
           ) VALUES (?1, ?2, ?3, ?4, NULL)
           ON CONFLICT (company_id, person_id)
           DO UPDATE SET
             relationship = excluded.relationship,
             started_at   = excluded.started_at,
             ended_at     = NULL",
          rusqlite::params![company_str, person_str, relation_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(link)
  }

  async fn end_person_link(
    &self,
    company_id: Uuid,
    person_id: Uuid,
  ) -> Result<CompanyPerson> {
    let company_str = encode_uuid(company_id);
    let person_str  = encode_uuid(person_id);
    let ended_str   = encode_dt(Utc::now());

    let raw: Option<RawCompanyPerson> = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE company_people SET ended_at = ?3
           WHERE company_id = ?1 AND person_id = ?2 AND ended_at IS NULL",
          rusqlite::params![company_str, person_str, ended_str],
        )?;
        if updated == 0 {
          return Ok(None);
        }

        Ok(
          conn
            .query_row(
              "SELECT company_id, person_id, relationship, started_at,
                      ended_at
               FROM company_people
               WHERE company_id = ?1 AND person_id = ?2",
              rusqlite::params![company_str, person_str],
              |row| {
                Ok(RawCompanyPerson {
                  company_id:   row.get(0)?,
                  person_id:    row.get(1)?,
                  relationship: row.get(2)?,
                  started_at:   row.get(3)?,
                  ended_at:     row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .ok_or(Error::LinkNotFound { company_id, person_id })?
      .into_link()
  }

  async fn list_company_people(
    &self,
    company_id: Uuid,
    include_ended: bool,
  ) -> Result<Vec<(CompanyPerson, Person)>> {
    let company_str = encode_uuid(company_id);

    let raws: Vec<(RawCompanyPerson, RawPerson)> = self
      .conn
      .call(move |conn| {
        let ended_clause = if include_ended {
          ""
        } else {
          "AND cp.ended_at IS NULL"
        };

        let sql = format!(
          "SELECT cp.company_id, cp.person_id, cp.relationship,
                  cp.started_at, cp.ended_at,
                  p.person_id, p.name, p.email, p.created_at
           FROM company_people cp
           JOIN people p ON p.person_id = cp.person_id
           WHERE cp.company_id = ?1 {ended_clause}
           ORDER BY cp.started_at, cp.person_id"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![company_str], |row| {
            Ok((
              RawCompanyPerson {
                company_id:   row.get(0)?,
                person_id:    row.get(1)?,
                relationship: row.get(2)?,
                started_at:   row.get(3)?,
                ended_at:     row.get(4)?,
              },
              RawPerson {
                person_id:  row.get(5)?,
                name:       row.get(6)?,
                email:      row.get(7)?,
                created_at: row.get(8)?,
              },
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(link, person)| Ok((link.into_link()?, person.into_person()?)))
      .collect()
  }

  // ── Tickets ───────────────────────────────────────────────────────────────

  async fn add_ticket(&self, input: NewTicket) -> Result<Ticket> {
    let ticket = Ticket {
      ticket_id:      Uuid::new_v4(),
      application_id: input.application_id,
      assignee_id:    input.assignee_id,
      kind:           input.kind,
      note:           input.note,
      created_at:     Utc::now(),
      closed_at:      None,
    };

    let id_str       = encode_uuid(ticket.ticket_id);
    let app_str      = encode_uuid(ticket.application_id);
    let assignee_str = encode_uuid(ticket.assignee_id);
    let kind_str     = ticket.kind.to_string();
    let note         = ticket.note.clone();
    let at_str       = encode_dt(ticket.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tickets (
             ticket_id, application_id, assignee_id, kind, note, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, app_str, assignee_str, kind_str, note, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(ticket)
  }

  async fn list_tickets(
    &self,
    assignee_id: Option<Uuid>,
    open_only: bool,
  ) -> Result<Vec<Ticket>> {
    let assignee_str = assignee_id.map(encode_uuid);

    let raws: Vec<RawTicket> = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if assignee_str.is_some() {
          conds.push("assignee_id = ?1");
        }
        if open_only {
          conds.push("closed_at IS NULL");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {TICKET_COLS} FROM tickets
           {where_clause}
           ORDER BY created_at, ticket_id"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = if let Some(assignee) = assignee_str.as_deref() {
          stmt
            .query_map(rusqlite::params![assignee], ticket_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          stmt
            .query_map([], ticket_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTicket::into_ticket).collect()
  }
}
