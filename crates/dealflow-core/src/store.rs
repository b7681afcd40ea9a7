//! The `CrmStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `dealflow-store-sqlite`).
//! Higher layers (`dealflow-api`, the pipeline) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  application::{
    Application, ApplicationPatch, NewApplication, NewVote, Vote, VoteRound,
  },
  company::{
    Company, CompanyPerson, Investment, NewCompany, NewInvestment, NewPerson,
    Person, RelationshipKind,
  },
  deliberation::{Deliberation, DeliberationDraft},
  stage::{ApplicationStage, CompanyStage},
  ticket::{NewTicket, Ticket},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`CrmStore::list_applications`].
///
/// A `stage` filter of `Application` also matches the intake-only `New`
/// label; the two share the open application queue.
#[derive(Debug, Clone, Default)]
pub struct ApplicationQuery {
  pub stage:  Option<ApplicationStage>,
  /// Free-text filter over company name and founder info.
  pub text:   Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Parameters for [`CrmStore::list_companies`].
#[derive(Debug, Clone, Default)]
pub struct CompanyQuery {
  pub stage:  Option<CompanyStage>,
  /// Free-text filter over name, one-liner, and description.
  pub text:   Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a dealflow storage backend.
///
/// Vote and deliberation writes are upserts on their conflict keys;
/// investments are append-only; person links are only ever soft-removed.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CrmStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Companies ─────────────────────────────────────────────────────────

  fn add_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  /// Retrieve a company by id. Returns `None` if not found.
  fn get_company(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  fn list_companies<'a>(
    &'a self,
    query: &'a CompanyQuery,
  ) -> impl Future<Output = Result<Vec<Company>, Self::Error>> + Send + 'a;

  /// Overwrite a company's stage and nothing else. The stage synchronizer
  /// is the only pipeline code path that calls this.
  fn set_company_stage(
    &self,
    id: Uuid,
    stage: CompanyStage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Applications ──────────────────────────────────────────────────────

  /// Create an application; `submitted_at` is set by the store and the
  /// stage starts at `New`.
  fn add_application(
    &self,
    input: NewApplication,
  ) -> impl Future<Output = Result<Application, Self::Error>> + Send + '_;

  fn get_application(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Application>, Self::Error>> + Send + '_;

  fn list_applications<'a>(
    &'a self,
    query: &'a ApplicationQuery,
  ) -> impl Future<Output = Result<Vec<Application>, Self::Error>> + Send + 'a;

  /// Apply a partial update and return the updated row.
  fn update_application(
    &self,
    id: Uuid,
    patch: ApplicationPatch,
  ) -> impl Future<Output = Result<Application, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Insert or overwrite the voter's vote for the round. Idempotent per
  /// (application, voter, round).
  fn upsert_vote(
    &self,
    input: NewVote,
  ) -> impl Future<Output = Result<Vote, Self::Error>> + Send + '_;

  fn list_votes(
    &self,
    application_id: Uuid,
    round: VoteRound,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  /// Count of distinct voters for the round — the quorum input.
  fn count_voters(
    &self,
    application_id: Uuid,
    round: VoteRound,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Deliberations ─────────────────────────────────────────────────────

  /// Insert or overwrite the application's deliberation. Idempotent per
  /// application.
  fn upsert_deliberation(
    &self,
    draft: DeliberationDraft,
  ) -> impl Future<Output = Result<Deliberation, Self::Error>> + Send + '_;

  fn get_deliberation(
    &self,
    application_id: Uuid,
  ) -> impl Future<Output = Result<Option<Deliberation>, Self::Error>> + Send + '_;

  // ── Investments ───────────────────────────────────────────────────────

  fn add_investment(
    &self,
    input: NewInvestment,
  ) -> impl Future<Output = Result<Investment, Self::Error>> + Send + '_;

  fn list_investments(
    &self,
    company_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Investment>, Self::Error>> + Send + '_;

  // ── People ────────────────────────────────────────────────────────────

  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Attach a person to a company with a relationship kind.
  fn link_person(
    &self,
    company_id: Uuid,
    person_id: Uuid,
    relationship: RelationshipKind,
  ) -> impl Future<Output = Result<CompanyPerson, Self::Error>> + Send + '_;

  /// Soft-remove a link by stamping its end timestamp. The row stays.
  fn end_person_link(
    &self,
    company_id: Uuid,
    person_id: Uuid,
  ) -> impl Future<Output = Result<CompanyPerson, Self::Error>> + Send + '_;

  fn list_company_people(
    &self,
    company_id: Uuid,
    include_ended: bool,
  ) -> impl Future<Output = Result<Vec<(CompanyPerson, Person)>, Self::Error>>
  + Send
  + '_;

  // ── Tickets ───────────────────────────────────────────────────────────

  fn add_ticket(
    &self,
    input: NewTicket,
  ) -> impl Future<Output = Result<Ticket, Self::Error>> + Send + '_;

  fn list_tickets(
    &self,
    assignee_id: Option<Uuid>,
    open_only: bool,
  ) -> impl Future<Output = Result<Vec<Ticket>, Self::Error>> + Send + '_;
}
