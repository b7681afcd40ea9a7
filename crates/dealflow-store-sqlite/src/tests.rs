//! Integration tests for `SqliteStore` against an in-memory database,
//! including the full vote/decision pipeline driven end to end.

use chrono::NaiveDate;
use dealflow_core::{
  Error as CoreError,
  actor::Actor,
  application::{NewApplication, VoteValue},
  company::NewCompany,
  deliberation::{Decision, DecisionInput, InvestmentTerms},
  dispatch::TemplateDispatcher,
  pipeline::{Pipeline, PipelineError, SyncOutcome},
  rejection::RejectionReason,
  stage::{ApplicationStage, CompanyStage},
  store::{ApplicationQuery, CrmStore},
  ticket::TicketKind,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn pipeline(store: &SqliteStore) -> Pipeline<SqliteStore, TemplateDispatcher> {
  Pipeline::new(store.clone(), TemplateDispatcher)
}

fn partner(name: &str) -> Actor { Actor::new(Uuid::new_v4(), name) }

/// A company plus an application linked to it, both freshly created.
async fn linked_application(
  s: &SqliteStore,
) -> (dealflow_core::company::Company, dealflow_core::application::Application)
{
  let company = s.add_company(NewCompany::named("Acme Robotics")).await.unwrap();
  let application = s
    .add_application(NewApplication {
      company_id:    Some(company.company_id),
      company_name:  "Acme Robotics".into(),
      contact_email: Some("founders@acme.example".into()),
      founder_info:  Some("Ada and Grace".into()),
    })
    .await
    .unwrap();
  (company, application)
}

/// Three distinct partners vote so quorum is reached.
async fn cast_quorum(
  p: &Pipeline<SqliteStore, TemplateDispatcher>,
  application_id: Uuid,
  values: [VoteValue; 3],
) {
  for value in values {
    p.cast_vote(&partner("voter"), application_id, value, None)
      .await
      .unwrap();
  }
}

fn yes_input() -> DecisionInput {
  DecisionInput {
    investment: Some(InvestmentTerms {
      amount_cents:    50_000_000,
      terms:           "SAFE, 10% discount".into(),
      round:           Some("pre-seed".into()),
      valuation_cents: Some(1_000_000_000),
      invested_at:     NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    }),
    ..DecisionInput::decided(Decision::Yes)
  }
}

// ─── Companies and applications ──────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_company() {
  let s = store().await;
  let company = s.add_company(NewCompany::named("Acme")).await.unwrap();
  assert_eq!(company.stage, CompanyStage::Prospect);

  let fetched = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(fetched.company_id, company.company_id);
  assert_eq!(fetched.name, "Acme");
}

#[tokio::test]
async fn get_company_missing_returns_none() {
  let s = store().await;
  assert!(s.get_company(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn new_applications_start_in_intake() {
  let s = store().await;
  let application = s
    .add_application(NewApplication::named("Acme"))
    .await
    .unwrap();
  assert_eq!(application.stage, ApplicationStage::New);
  assert!(application.company_id.is_none());
  assert!(!application.votes_revealed);
}

#[tokio::test]
async fn application_queue_filter_includes_new_label() {
  let s = store().await;
  let p = pipeline(&s);

  let fresh = s.add_application(NewApplication::named("Fresh")).await.unwrap();
  let (_, advanced) = linked_application(&s).await;
  cast_quorum(&p, advanced.application_id, [VoteValue::Yes; 3]).await;
  p.advance_to_interview(
    &partner("lead"),
    advanced.application_id,
    Uuid::new_v4(),
  )
  .await
  .unwrap();

  let queue = s
    .list_applications(&ApplicationQuery {
      stage: Some(ApplicationStage::Application),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(queue.len(), 1);
  assert_eq!(queue[0].application_id, fresh.application_id);
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn vote_upsert_is_idempotent_per_voter() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;
  let voter = partner("avery");

  let first = p
    .cast_vote(&voter, application.application_id, VoteValue::Yes, None)
    .await
    .unwrap();
  let second = p
    .cast_vote(&voter, application.application_id, VoteValue::Yes, None)
    .await
    .unwrap();

  // Same row, not a second one.
  assert_eq!(first.vote_id, second.vote_id);
  let tally = p.tally(application.application_id).await.unwrap();
  assert_eq!(tally.total(), 1);

  // A re-vote with a different value updates in place.
  let flipped = p
    .cast_vote(
      &voter,
      application.application_id,
      VoteValue::No,
      Some("changed my mind".into()),
    )
    .await
    .unwrap();
  assert_eq!(flipped.vote_id, first.vote_id);
  assert_eq!(flipped.value, VoteValue::No);

  let tally = p.tally(application.application_id).await.unwrap();
  assert_eq!(tally.total(), 1);
  assert_eq!(tally.no, 1);
}

#[tokio::test]
async fn quorum_counts_voters_not_values() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;

  cast_quorum(&p, application.application_id, [VoteValue::No; 3]).await;

  let tally = p.tally(application.application_id).await.unwrap();
  assert!(tally.quorum_reached());
  assert_eq!(tally.no, 3);
  assert_eq!(
    s.count_voters(
      application.application_id,
      dealflow_core::application::VoteRound::Initial
    )
    .await
    .unwrap(),
    3
  );
}

#[tokio::test]
async fn vote_on_missing_application_errors() {
  let s = store().await;
  let p = pipeline(&s);

  let err = p
    .cast_vote(&partner("avery"), Uuid::new_v4(), VoteValue::Yes, None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Domain(CoreError::ApplicationNotFound(_))
  ));
}

// ─── Stage synchronizer ──────────────────────────────────────────────────────

#[tokio::test]
async fn sync_is_monotonic_by_rank() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;

  // prospect → diligence → portfolio advances each time.
  let outcome = p
    .sync_company_stage(application.application_id, ApplicationStage::Interview)
    .await
    .unwrap();
  assert_eq!(outcome, SyncOutcome::Applied(CompanyStage::Diligence));

  let outcome = p
    .sync_company_stage(application.application_id, ApplicationStage::Portfolio)
    .await
    .unwrap();
  assert_eq!(outcome, SyncOutcome::Applied(CompanyStage::Portfolio));

  // A late reject cannot downgrade portfolio to passed.
  let outcome = p
    .sync_company_stage(application.application_id, ApplicationStage::Rejected)
    .await
    .unwrap();
  assert_eq!(
    outcome,
    SyncOutcome::SkippedRank {
      current:  CompanyStage::Portfolio,
      proposed: CompanyStage::Passed,
    }
  );
  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Portfolio);
}

#[tokio::test]
async fn sync_application_stage_is_the_escape_hatch() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;

  s.set_company_stage(company.company_id, CompanyStage::Portfolio)
    .await
    .unwrap();

  let outcome = p
    .sync_company_stage(
      application.application_id,
      ApplicationStage::Application,
    )
    .await
    .unwrap();
  assert_eq!(outcome, SyncOutcome::Applied(CompanyStage::Prospect));

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Prospect);
}

#[tokio::test]
async fn sync_without_linked_company_is_a_soft_noop() {
  let s = store().await;
  let p = pipeline(&s);

  let unlinked = s
    .add_application(NewApplication::named("Orphan"))
    .await
    .unwrap();
  let outcome = p
    .sync_company_stage(unlinked.application_id, ApplicationStage::Interview)
    .await
    .unwrap();
  assert_eq!(outcome, SyncOutcome::SkippedNoCompany);

  // Unknown application ids are equally soft.
  let outcome = p
    .sync_company_stage(Uuid::new_v4(), ApplicationStage::Interview)
    .await
    .unwrap();
  assert_eq!(outcome, SyncOutcome::SkippedNoCompany);
}

#[tokio::test]
async fn sync_intake_label_has_no_mapping() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;

  let outcome = p
    .sync_company_stage(application.application_id, ApplicationStage::New)
    .await
    .unwrap();
  assert_eq!(outcome, SyncOutcome::SkippedUnmapped);

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Prospect);
}

#[tokio::test]
async fn late_rejection_of_an_unrelated_application_leaves_portfolio_untouched() {
  // A company already in the portfolio has an older application from a
  // former round. Rejecting that one maps to passed (rank 3), which must
  // lose against portfolio (rank 4).
  let s = store().await;
  let p = pipeline(&s);
  let (company, _current) = linked_application(&s).await;

  s.set_company_stage(company.company_id, CompanyStage::Portfolio)
    .await
    .unwrap();

  let former_round = s
    .add_application(NewApplication {
      company_id:    Some(company.company_id),
      company_name:  "Acme Robotics".into(),
      contact_email: None,
      founder_info:  None,
    })
    .await
    .unwrap();

  let outcome = p
    .reject_application(
      &partner("lead"),
      former_round.application_id,
      Uuid::new_v4(),
      vec![],
    )
    .await
    .unwrap();
  assert_eq!(outcome.stage, ApplicationStage::Rejected);

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Portfolio);
}

#[tokio::test]
async fn sync_overwrites_unranked_stages() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;

  s.set_company_stage(company.company_id, CompanyStage::Tracked)
    .await
    .unwrap();

  let outcome = p
    .sync_company_stage(application.application_id, ApplicationStage::Interview)
    .await
    .unwrap();
  assert_eq!(outcome, SyncOutcome::Applied(CompanyStage::Diligence));
}

// ─── application → interview ─────────────────────────────────────────────────

#[tokio::test]
async fn advance_requires_quorum() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;

  p.cast_vote(
    &partner("avery"),
    application.application_id,
    VoteValue::Yes,
    None,
  )
  .await
  .unwrap();

  let err = p
    .advance_to_interview(
      &partner("lead"),
      application.application_id,
      Uuid::new_v4(),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Domain(CoreError::QuorumNotReached { recorded: 1 })
  ));
}

#[tokio::test]
async fn advance_reveals_votes_and_files_a_ticket() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;
  let sender = Uuid::new_v4();

  cast_quorum(&p, application.application_id, [VoteValue::Yes; 3]).await;
  let advanced = p
    .advance_to_interview(&partner("lead"), application.application_id, sender)
    .await
    .unwrap();

  assert_eq!(advanced.stage, ApplicationStage::Interview);
  assert_eq!(advanced.previous_stage, Some(ApplicationStage::Application));
  assert!(advanced.votes_revealed);
  assert_eq!(advanced.email_sender_id, Some(sender));
  assert!(!advanced.email_sent);

  let tickets = s.list_tickets(Some(sender), true).await.unwrap();
  assert_eq!(tickets.len(), 1);
  assert_eq!(tickets[0].kind, TicketKind::InterviewFollowUp);
  assert_eq!(tickets[0].application_id, application.application_id);

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Diligence);
}

#[tokio::test]
async fn unvoted_override_skips_quorum_sender_and_ticket() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;

  let advanced = p
    .advance_to_interview_unvoted(&partner("lead"), application.application_id)
    .await
    .unwrap();

  assert_eq!(advanced.stage, ApplicationStage::Interview);
  assert_eq!(advanced.previous_stage, Some(ApplicationStage::Application));
  assert!(!advanced.votes_revealed);
  assert!(advanced.email_sender_id.is_none());
  assert!(s.list_tickets(None, true).await.unwrap().is_empty());

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Diligence);
}

// ─── application → rejected ──────────────────────────────────────────────────

#[tokio::test]
async fn direct_reject_mirrors_advance_and_drafts_email() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;
  let sender = Uuid::new_v4();

  let rejected = p
    .reject_application(
      &partner("lead"),
      application.application_id,
      sender,
      vec![RejectionReason::TooEarly],
    )
    .await
    .unwrap();

  assert_eq!(rejected.stage, ApplicationStage::Rejected);
  assert_eq!(rejected.previous_stage, Some(ApplicationStage::Application));
  assert_eq!(rejected.email_sender_id, Some(sender));

  // The template dispatcher generated and persisted a draft.
  let stored = s
    .get_application(application.application_id)
    .await
    .unwrap()
    .unwrap();
  let draft = stored.rejection_draft.unwrap();
  assert!(draft.contains("Acme Robotics"), "draft: {draft}");
  assert!(draft.contains("very early stage"), "draft: {draft}");

  let tickets = s.list_tickets(Some(sender), true).await.unwrap();
  assert_eq!(tickets.len(), 1);
  assert_eq!(tickets[0].kind, TicketKind::RejectionEmail);

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Passed);
}

// ─── Decision save ───────────────────────────────────────────────────────────

#[tokio::test]
async fn yes_decision_creates_exactly_one_investment() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;
  let lead = partner("lead");

  cast_quorum(&p, application.application_id, [VoteValue::Yes; 3]).await;
  p.advance_to_interview(&lead, application.application_id, Uuid::new_v4())
    .await
    .unwrap();

  let outcome = p
    .save_decision(&lead, application.application_id, yes_input())
    .await
    .unwrap();

  assert_eq!(outcome.deliberation.decision, Decision::Yes);
  // Status is forced to portfolio whatever was picked in the form.
  assert_eq!(outcome.deliberation.status.as_deref(), Some("portfolio"));

  let investment = outcome.investment.unwrap();
  assert_eq!(investment.company_id, company.company_id);
  assert_eq!(
    investment.application_id,
    Some(application.application_id)
  );
  assert_eq!(investment.amount_cents, 50_000_000);

  let investments = s.list_investments(company.company_id).await.unwrap();
  assert_eq!(investments.len(), 1);

  let stored = outcome.application.unwrap();
  assert_eq!(stored.stage, ApplicationStage::Portfolio);
  assert_eq!(stored.previous_stage, Some(ApplicationStage::Interview));

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Portfolio);
}

#[tokio::test]
async fn yes_decision_validates_before_any_write() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;
  let lead = partner("lead");

  // Missing terms entirely.
  let err = p
    .save_decision(
      &lead,
      application.application_id,
      DecisionInput::decided(Decision::Yes),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Domain(CoreError::MissingInvestmentTerms)
  ));

  // Zero amount.
  let mut input = yes_input();
  input.investment.as_mut().unwrap().amount_cents = 0;
  let err = p
    .save_decision(&lead, application.application_id, input)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Domain(CoreError::InvalidInvestmentAmount)
  ));

  // Blank terms text.
  let mut input = yes_input();
  input.investment.as_mut().unwrap().terms = "   ".into();
  let err = p
    .save_decision(&lead, application.application_id, input)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Domain(CoreError::EmptyInvestmentTerms)
  ));

  // No deliberation row was created by any of the rejected saves.
  assert!(
    s.get_deliberation(application.application_id)
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn yes_decision_requires_a_linked_company() {
  let s = store().await;
  let p = pipeline(&s);
  let unlinked = s
    .add_application(NewApplication::named("Orphan"))
    .await
    .unwrap();

  let err = p
    .save_decision(&partner("lead"), unlinked.application_id, yes_input())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Domain(CoreError::ApplicationNotLinked(_))
  ));
}

#[tokio::test]
async fn no_decision_requires_an_email_sender() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;

  let err = p
    .save_decision(
      &partner("lead"),
      application.application_id,
      DecisionInput::decided(Decision::No),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    PipelineError::Domain(CoreError::MissingEmailSender)
  ));
}

#[tokio::test]
async fn no_decision_rejects_without_an_investment() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;
  let sender = Uuid::new_v4();

  let outcome = p
    .save_decision(
      &partner("lead"),
      application.application_id,
      DecisionInput {
        email_sender_id: Some(sender),
        rejection_reasons: vec![RejectionReason::ImpactUnclear],
        ..DecisionInput::decided(Decision::No)
      },
    )
    .await
    .unwrap();

  assert!(outcome.investment.is_none());
  assert!(s.list_investments(company.company_id).await.unwrap().is_empty());

  let stored = outcome.application.unwrap();
  assert_eq!(stored.stage, ApplicationStage::Rejected);
  assert_eq!(stored.previous_stage, Some(ApplicationStage::Interview));
  assert_eq!(stored.email_sender_id, Some(sender));
  assert!(!stored.email_sent);

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Passed);

  let tickets = s.list_tickets(Some(sender), true).await.unwrap();
  assert_eq!(tickets.len(), 1);
  assert_eq!(tickets[0].kind, TicketKind::RejectionEmail);
}

#[tokio::test]
async fn no_decision_cannot_downgrade_a_portfolio_company() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;

  s.set_company_stage(company.company_id, CompanyStage::Portfolio)
    .await
    .unwrap();

  p.save_decision(
    &partner("lead"),
    application.application_id,
    DecisionInput {
      email_sender_id: Some(Uuid::new_v4()),
      ..DecisionInput::decided(Decision::No)
    },
  )
  .await
  .unwrap();

  // Passed ranks below portfolio; the synchronizer refuses the downgrade.
  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Portfolio);
}

#[tokio::test]
async fn pending_decision_only_upserts_the_deliberation() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;

  let outcome = p
    .save_decision(
      &partner("lead"),
      application.application_id,
      DecisionInput {
        thoughts: Some("need a technical deep-dive".into()),
        ..DecisionInput::decided(Decision::Pending)
      },
    )
    .await
    .unwrap();

  assert!(outcome.application.is_none());
  assert!(outcome.investment.is_none());

  let stored = s
    .get_application(application.application_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.stage, ApplicationStage::New);

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Prospect);
}

#[tokio::test]
async fn deliberation_upsert_is_idempotent_per_application() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;
  let lead = partner("lead");

  let first = p
    .save_decision(
      &lead,
      application.application_id,
      DecisionInput::decided(Decision::Pending),
    )
    .await
    .unwrap();
  let second = p
    .save_decision(
      &lead,
      application.application_id,
      DecisionInput {
        thoughts: Some("second pass".into()),
        ..DecisionInput::decided(Decision::Maybe)
      },
    )
    .await
    .unwrap();

  assert_eq!(
    first.deliberation.deliberation_id,
    second.deliberation.deliberation_id
  );
  assert_eq!(second.deliberation.decision, Decision::Maybe);
  assert_eq!(
    second.deliberation.thoughts.as_deref(),
    Some("second pass")
  );
}

#[tokio::test]
async fn retriggered_yes_save_duplicates_the_investment() {
  // The multi-step save has no transactional envelope and no replay guard;
  // a second yes save inserts a second investment row. Callers disable the
  // action after a success.
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;
  let lead = partner("lead");

  p.save_decision(&lead, application.application_id, yes_input())
    .await
    .unwrap();
  p.save_decision(&lead, application.application_id, yes_input())
    .await
    .unwrap();

  let investments = s.list_investments(company.company_id).await.unwrap();
  assert_eq!(investments.len(), 2);
}

// ─── Restore / undo ──────────────────────────────────────────────────────────

#[tokio::test]
async fn restore_returns_to_previous_stage_and_resets_everything() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;
  let lead = partner("lead");

  p.save_decision(&lead, application.application_id, yes_input())
    .await
    .unwrap();

  let restored = p.restore(&lead, application.application_id).await.unwrap();

  // The yes save stamped previous_stage = interview; restore targets it.
  assert_eq!(restored.stage, ApplicationStage::Interview);
  assert_eq!(restored.previous_stage, None);

  let deliberation = s
    .get_deliberation(application.application_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(deliberation.decision, Decision::Pending);
  assert_eq!(deliberation.status, None);

  // The company is forced back to prospect regardless of rank.
  let company_row = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company_row.stage, CompanyStage::Prospect);

  // The investment created by the yes decision is intentionally kept.
  let investments = s.list_investments(company.company_id).await.unwrap();
  assert_eq!(investments.len(), 1);
}

#[tokio::test]
async fn move_back_always_targets_the_application_queue() {
  let s = store().await;
  let p = pipeline(&s);
  let (company, application) = linked_application(&s).await;
  let lead = partner("lead");

  p.advance_to_interview_unvoted(&lead, application.application_id)
    .await
    .unwrap();
  let moved = p.move_back(&lead, application.application_id).await.unwrap();

  assert_eq!(moved.stage, ApplicationStage::Application);
  assert_eq!(moved.previous_stage, None);

  let company = s.get_company(company.company_id).await.unwrap().unwrap();
  assert_eq!(company.stage, CompanyStage::Prospect);
}

#[tokio::test]
async fn restore_without_previous_stage_targets_the_queue() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;

  // No stage transition ever ran, so previous_stage is empty.
  let restored = p
    .restore(&partner("lead"), application.application_id)
    .await
    .unwrap();
  assert_eq!(restored.stage, ApplicationStage::Application);
}

// ─── Rejection drafts ────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_and_edit_rejection_draft() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;

  let drafted = p
    .generate_rejection_draft(
      application.application_id,
      vec![RejectionReason::NoTechnicalFounder],
    )
    .await
    .unwrap();
  let draft = drafted.rejection_draft.unwrap();
  assert!(draft.contains("technical founding leadership"));

  let edited = p
    .update_rejection_draft(
      application.application_id,
      "Dear founders, …".into(),
    )
    .await
    .unwrap();
  assert_eq!(edited.rejection_draft.as_deref(), Some("Dear founders, …"));
}

#[tokio::test]
async fn mark_email_sent_stamps_the_timestamp() {
  let s = store().await;
  let p = pipeline(&s);
  let (_, application) = linked_application(&s).await;

  let updated = p.mark_email_sent(application.application_id).await.unwrap();
  assert!(updated.email_sent);
  assert!(updated.email_sent_at.is_some());
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn person_links_are_soft_removed() {
  let s = store().await;
  let (company, _) = linked_application(&s).await;

  let person = s
    .add_person(dealflow_core::company::NewPerson {
      name:  "Ada".into(),
      email: Some("ada@acme.example".into()),
    })
    .await
    .unwrap();

  s.link_person(
    company.company_id,
    person.person_id,
    dealflow_core::company::RelationshipKind::Founder,
  )
  .await
  .unwrap();

  let active = s
    .list_company_people(company.company_id, false)
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].1.name, "Ada");

  let ended = s
    .end_person_link(company.company_id, person.person_id)
    .await
    .unwrap();
  assert!(ended.ended_at.is_some());

  // Gone from the active view, still present in the full history.
  let active = s
    .list_company_people(company.company_id, false)
    .await
    .unwrap();
  assert!(active.is_empty());

  let all = s.list_company_people(company.company_id, true).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn ending_a_missing_link_errors() {
  let s = store().await;
  let (company, _) = linked_application(&s).await;

  let err = s
    .end_person_link(company.company_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::LinkNotFound { .. }));
}
