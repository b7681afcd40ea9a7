//! The stage synchronizer and vote/decision pipeline.
//!
//! [`Pipeline`] is the only code path in this subsystem allowed to write
//! `Company::stage`. Stage advances are monotonic by rank; the single escape
//! hatch is the explicit move-back/restore action, which may regress the
//! company back to prospect.
//!
//! Multi-step saves are not transactional: each write is attempted
//! independently, and a failure on a secondary write leaves the earlier
//! writes committed. In particular, re-triggering a yes decision after its
//! application update failed would insert a second investment row; callers
//! are expected to disable the action after a success.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::{
  actor::Actor,
  application::{
    Application, ApplicationPatch, NewVote, Vote, VoteRound, VoteTally,
    VoteValue,
  },
  company::{Investment, InvestmentStatus, NewInvestment},
  deliberation::{
    Decision, DecisionInput, Deliberation, DeliberationDraft,
  },
  dispatch::{Dispatcher, Notification, NotificationKind},
  error::Error,
  rejection::RejectionReason,
  stage::{ApplicationStage, CompanyStage, company_stage_for},
  store::CrmStore,
  ticket::{NewTicket, TicketKind},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error from a pipeline operation: a domain/validation failure, a store
/// failure bubbled up from the backend, or a failed user-initiated dispatch.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError<E> {
  #[error(transparent)]
  Domain(#[from] Error),

  #[error("store error: {0}")]
  Store(E),

  #[error("draft generation failed: {0}")]
  Dispatch(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type PipelineResult<T, E> = Result<T, PipelineError<E>>;

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What the stage synchronizer did with one `sync` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The company row was updated to the mapped stage.
  Applied(CompanyStage),
  /// The application stage has no mapping entry.
  SkippedUnmapped,
  /// The application is missing or has no linked company.
  SkippedNoCompany,
  /// The mapped stage would not advance the company's rank.
  SkippedRank {
    current:  CompanyStage,
    proposed: CompanyStage,
  },
}

/// Result of a deliberation decision save.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecisionOutcome {
  pub deliberation: Deliberation,
  /// The updated application, when the decision changed its stage.
  pub application:  Option<Application>,
  /// The investment row created by a yes decision.
  pub investment:   Option<Investment>,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<S, D> {
  store:      S,
  dispatcher: D,
}

impl<S, D> Pipeline<S, D>
where
  S: CrmStore,
  D: Dispatcher,
{
  pub fn new(store: S, dispatcher: D) -> Self { Self { store, dispatcher } }

  /// The underlying store, for plain reads outside the pipeline.
  pub fn store(&self) -> &S { &self.store }

  // ── Stage synchronizer ────────────────────────────────────────────────

  /// Align the linked company's stage with `new_stage`.
  ///
  /// Monotonic by rank, so a slow advance landing after a faster one cannot
  /// downgrade the company. `ApplicationStage::Application` force-applies as
  /// the explicit regression escape hatch for the move-back/restore action.
  /// Missing rows are soft no-ops: partial linkage is an expected data
  /// state, not a corruption.
  pub async fn sync_company_stage(
    &self,
    application_id: Uuid,
    new_stage: ApplicationStage,
  ) -> PipelineResult<SyncOutcome, S::Error> {
    let Some(target) = company_stage_for(new_stage) else {
      return Ok(SyncOutcome::SkippedUnmapped);
    };

    let Some(application) = self
      .store
      .get_application(application_id)
      .await
      .map_err(PipelineError::Store)?
    else {
      return Ok(SyncOutcome::SkippedNoCompany);
    };
    let Some(company_id) = application.company_id else {
      return Ok(SyncOutcome::SkippedNoCompany);
    };

    // Re-read the current stage immediately before deciding to write.
    let Some(company) = self
      .store
      .get_company(company_id)
      .await
      .map_err(PipelineError::Store)?
    else {
      return Ok(SyncOutcome::SkippedNoCompany);
    };

    let force = new_stage == ApplicationStage::Application;
    if !force && target.rank() <= company.stage.rank() {
      return Ok(SyncOutcome::SkippedRank {
        current:  company.stage,
        proposed: target,
      });
    }

    self
      .store
      .set_company_stage(company_id, target)
      .await
      .map_err(PipelineError::Store)?;
    Ok(SyncOutcome::Applied(target))
  }

  // ── Voting ────────────────────────────────────────────────────────────

  /// Record (or overwrite) the actor's vote for the initial round.
  pub async fn cast_vote(
    &self,
    actor: &Actor,
    application_id: Uuid,
    value: VoteValue,
    notes: Option<String>,
  ) -> PipelineResult<Vote, S::Error> {
    self.require_application(application_id).await?;
    self
      .store
      .upsert_vote(NewVote {
        application_id,
        voter_id: actor.partner_id,
        round: VoteRound::Initial,
        value,
        notes,
      })
      .await
      .map_err(PipelineError::Store)
  }

  /// Current vote tally for the initial round. Quorum is a pure function of
  /// the distinct-voter count.
  pub async fn tally(
    &self,
    application_id: Uuid,
  ) -> PipelineResult<VoteTally, S::Error> {
    let votes = self
      .store
      .list_votes(application_id, VoteRound::Initial)
      .await
      .map_err(PipelineError::Store)?;
    Ok(VoteTally::from_votes(&votes))
  }

  // ── application → interview ───────────────────────────────────────────

  /// Advance to interview after a full vote round.
  ///
  /// Requires quorum and an email sender. Reveals the votes, stamps the
  /// undo pointer, files a follow-up ticket for the sender, and syncs the
  /// company to diligence.
  pub async fn advance_to_interview(
    &self,
    actor: &Actor,
    application_id: Uuid,
    email_sender_id: Uuid,
  ) -> PipelineResult<Application, S::Error> {
    self.require_application(application_id).await?;

    let tally = self.tally(application_id).await?;
    if !tally.quorum_reached() {
      return Err(
        Error::QuorumNotReached { recorded: tally.total() }.into(),
      );
    }

    let application = self
      .store
      .update_application(application_id, ApplicationPatch {
        stage:           Some(ApplicationStage::Interview),
        previous_stage:  Some(Some(ApplicationStage::Application)),
        votes_revealed:  Some(true),
        email_sender_id: Some(Some(email_sender_id)),
        email_sent:      Some(false),
        ..ApplicationPatch::default()
      })
      .await
      .map_err(PipelineError::Store)?;

    self
      .create_ticket_best_effort(NewTicket {
        application_id,
        assignee_id: email_sender_id,
        kind: TicketKind::InterviewFollowUp,
        note: Some(format!(
          "Send the interview invitation to {}",
          application.company_name
        )),
      })
      .await;

    self.sync_company_stage(application_id, ApplicationStage::Interview).await?;

    self
      .notify_best_effort(
        actor,
        application_id,
        NotificationKind::MovedToInterview,
        Some(email_sender_id),
      )
      .await;

    Ok(application)
  }

  /// Manual override: advance to interview without a vote round.
  ///
  /// Transitions regardless of quorum, skips the email-sender requirement,
  /// and files no follow-up ticket. The caller confirms this explicitly.
  pub async fn advance_to_interview_unvoted(
    &self,
    actor: &Actor,
    application_id: Uuid,
  ) -> PipelineResult<Application, S::Error> {
    self.require_application(application_id).await?;

    let application = self
      .store
      .update_application(application_id, ApplicationPatch {
        stage:          Some(ApplicationStage::Interview),
        previous_stage: Some(Some(ApplicationStage::Application)),
        ..ApplicationPatch::default()
      })
      .await
      .map_err(PipelineError::Store)?;

    self.sync_company_stage(application_id, ApplicationStage::Interview).await?;

    self
      .notify_best_effort(
        actor,
        application_id,
        NotificationKind::MovedToInterview,
        None,
      )
      .await;

    Ok(application)
  }

  // ── application → rejected ────────────────────────────────────────────

  /// Reject directly from the application queue, without an interview.
  ///
  /// Mirrors the advance path (reveal, sender, undo pointer), files a
  /// rejection-email ticket, and kicks off draft generation.
  pub async fn reject_application(
    &self,
    actor: &Actor,
    application_id: Uuid,
    email_sender_id: Uuid,
    reasons: Vec<RejectionReason>,
  ) -> PipelineResult<Application, S::Error> {
    self.require_application(application_id).await?;

    let application = self
      .store
      .update_application(application_id, ApplicationPatch {
        stage:           Some(ApplicationStage::Rejected),
        previous_stage:  Some(Some(ApplicationStage::Application)),
        votes_revealed:  Some(true),
        email_sender_id: Some(Some(email_sender_id)),
        email_sent:      Some(false),
        rejection_draft: Some(None),
        ..ApplicationPatch::default()
      })
      .await
      .map_err(PipelineError::Store)?;

    self.sync_company_stage(application_id, ApplicationStage::Rejected).await?;

    self
      .create_ticket_best_effort(NewTicket {
        application_id,
        assignee_id: email_sender_id,
        kind: TicketKind::RejectionEmail,
        note: Some(format!(
          "Send the rejection email to {}",
          application.company_name
        )),
      })
      .await;

    self.draft_rejection_best_effort(&application, &reasons).await;

    self
      .notify_best_effort(
        actor,
        application_id,
        NotificationKind::ApplicationRejected,
        Some(email_sender_id),
      )
      .await;

    Ok(application)
  }

  // ── interview → decision ──────────────────────────────────────────────

  /// Save the deliberation decision and run its side-effect branch.
  ///
  /// Validation happens before any write. A yes decision requires linked
  /// company, positive amount, terms, and a date; a no decision requires an
  /// email sender. Pending/maybe only upsert the deliberation row.
  pub async fn save_decision(
    &self,
    actor: &Actor,
    application_id: Uuid,
    input: DecisionInput,
  ) -> PipelineResult<DecisionOutcome, S::Error> {
    let current = self.require_application(application_id).await?;

    // Validate the whole branch up front so no partial state is created by
    // a rejected input.
    match input.decision {
      Decision::Yes => {
        let terms =
          input.investment.as_ref().ok_or(Error::MissingInvestmentTerms)?;
        if terms.amount_cents <= 0 {
          return Err(Error::InvalidInvestmentAmount.into());
        }
        if terms.terms.trim().is_empty() {
          return Err(Error::EmptyInvestmentTerms.into());
        }
        if current.company_id.is_none() {
          return Err(Error::ApplicationNotLinked(application_id).into());
        }
      }
      Decision::No => {
        if input.email_sender_id.is_none() {
          return Err(Error::MissingEmailSender.into());
        }
      }
      Decision::Pending | Decision::Maybe => {}
    }

    // A yes decision lands the company in the portfolio, whatever status
    // label was picked in the form.
    let status = match input.decision {
      Decision::Yes => Some("portfolio".to_string()),
      _ => input.status.clone(),
    };

    let deliberation = self
      .store
      .upsert_deliberation(DeliberationDraft {
        application_id,
        meeting_date: input.meeting_date,
        idea_summary: input.idea_summary.clone(),
        thoughts: input.thoughts.clone(),
        decision: input.decision,
        status,
        tags: input.tags.clone(),
      })
      .await
      .map_err(PipelineError::Store)?;

    match input.decision {
      Decision::Yes => {
        let terms = input
          .investment
          .ok_or(Error::MissingInvestmentTerms)?;
        let company_id = current
          .company_id
          .ok_or(Error::ApplicationNotLinked(application_id))?;
        let investment = self
          .store
          .add_investment(NewInvestment {
            company_id,
            application_id: Some(application_id),
            amount_cents: terms.amount_cents,
            terms: terms.terms,
            round: terms.round,
            valuation_cents: terms.valuation_cents,
            invested_at: terms.invested_at,
            status: InvestmentStatus::default(),
          })
          .await
          .map_err(PipelineError::Store)?;

        let application = self
          .store
          .update_application(application_id, ApplicationPatch {
            stage:          Some(ApplicationStage::Portfolio),
            previous_stage: Some(Some(ApplicationStage::Interview)),
            ..ApplicationPatch::default()
          })
          .await
          .map_err(PipelineError::Store)?;

        self
          .sync_company_stage(application_id, ApplicationStage::Portfolio)
          .await?;

        self
          .notify_best_effort(
            actor,
            application_id,
            NotificationKind::DecisionRecorded,
            None,
          )
          .await;

        Ok(DecisionOutcome {
          deliberation,
          application: Some(application),
          investment: Some(investment),
        })
      }

      Decision::No => {
        let email_sender_id =
          input.email_sender_id.ok_or(Error::MissingEmailSender)?;

        let application = self
          .store
          .update_application(application_id, ApplicationPatch {
            stage:           Some(ApplicationStage::Rejected),
            previous_stage:  Some(Some(ApplicationStage::Interview)),
            email_sender_id: Some(Some(email_sender_id)),
            email_sent:      Some(false),
            rejection_draft: Some(None),
            ..ApplicationPatch::default()
          })
          .await
          .map_err(PipelineError::Store)?;

        self
          .sync_company_stage(application_id, ApplicationStage::Rejected)
          .await?;

        self
          .create_ticket_best_effort(NewTicket {
            application_id,
            assignee_id: email_sender_id,
            kind: TicketKind::RejectionEmail,
            note: Some(format!(
              "Send the rejection email to {}",
              application.company_name
            )),
          })
          .await;

        self
          .draft_rejection_best_effort(&application, &input.rejection_reasons)
          .await;

        self
          .notify_best_effort(
            actor,
            application_id,
            NotificationKind::DecisionRecorded,
            Some(email_sender_id),
          )
          .await;

        Ok(DecisionOutcome {
          deliberation,
          application: Some(application),
          investment: None,
        })
      }

      Decision::Pending | Decision::Maybe => Ok(DecisionOutcome {
        deliberation,
        application: None,
        investment: None,
      }),
    }
  }

  // ── Restore / undo ────────────────────────────────────────────────────

  /// Move an advanced application back into the application queue.
  ///
  /// Clears the undo pointer, resets the deliberation to pending, and
  /// force-applies the company back to prospect.
  pub async fn move_back(
    &self,
    actor: &Actor,
    application_id: Uuid,
  ) -> PipelineResult<Application, S::Error> {
    self
      .restore_to(actor, application_id, ApplicationStage::Application)
      .await
  }

  /// Restore an archived (portfolio/rejected) application to its stored
  /// previous stage, or to the application queue when none is stored.
  ///
  /// Investments created by an earlier yes decision are left in place.
  pub async fn restore(
    &self,
    actor: &Actor,
    application_id: Uuid,
  ) -> PipelineResult<Application, S::Error> {
    let current = self.require_application(application_id).await?;
    let target =
      current.previous_stage.unwrap_or(ApplicationStage::Application);
    self.restore_to(actor, application_id, target).await
  }

  async fn restore_to(
    &self,
    actor: &Actor,
    application_id: Uuid,
    target: ApplicationStage,
  ) -> PipelineResult<Application, S::Error> {
    self.require_application(application_id).await?;

    let application = self
      .store
      .update_application(application_id, ApplicationPatch {
        stage:          Some(target),
        previous_stage: Some(None),
        ..ApplicationPatch::default()
      })
      .await
      .map_err(PipelineError::Store)?;

    self.reset_deliberation_if_any(application_id).await?;

    // The restore path always syncs with the escape-hatch stage: the
    // company drops back to prospect regardless of rank and re-advances on
    // the next decision save.
    self
      .sync_company_stage(application_id, ApplicationStage::Application)
      .await?;

    self
      .notify_best_effort(
        actor,
        application_id,
        NotificationKind::ApplicationRestored,
        None,
      )
      .await;

    Ok(application)
  }

  async fn reset_deliberation_if_any(
    &self,
    application_id: Uuid,
  ) -> PipelineResult<(), S::Error> {
    let Some(deliberation) = self
      .store
      .get_deliberation(application_id)
      .await
      .map_err(PipelineError::Store)?
    else {
      return Ok(());
    };

    self
      .store
      .upsert_deliberation(DeliberationDraft {
        application_id,
        meeting_date: deliberation.meeting_date,
        idea_summary: deliberation.idea_summary,
        thoughts: deliberation.thoughts,
        decision: Decision::Pending,
        status: None,
        tags: deliberation.tags,
      })
      .await
      .map_err(PipelineError::Store)?;
    Ok(())
  }

  // ── Rejection drafts ──────────────────────────────────────────────────

  /// Generate a rejection draft now and persist it on the application.
  /// User-initiated, so failures are surfaced rather than swallowed.
  pub async fn generate_rejection_draft(
    &self,
    application_id: Uuid,
    reasons: Vec<RejectionReason>,
  ) -> PipelineResult<Application, S::Error> {
    let application = self.require_application(application_id).await?;

    let draft = self
      .dispatcher
      .draft_rejection(&application, &reasons)
      .await
      .map_err(|e| PipelineError::Dispatch(Box::new(e)))?;

    self
      .store
      .update_application(application_id, ApplicationPatch {
        rejection_draft: Some(Some(draft)),
        ..ApplicationPatch::default()
      })
      .await
      .map_err(PipelineError::Store)
  }

  /// Persist a partner's edits to the rejection draft.
  pub async fn update_rejection_draft(
    &self,
    application_id: Uuid,
    email: String,
  ) -> PipelineResult<Application, S::Error> {
    self.require_application(application_id).await?;
    self
      .store
      .update_application(application_id, ApplicationPatch {
        rejection_draft: Some(Some(email)),
        ..ApplicationPatch::default()
      })
      .await
      .map_err(PipelineError::Store)
  }

  /// Mark the rejection email as sent.
  pub async fn mark_email_sent(
    &self,
    application_id: Uuid,
  ) -> PipelineResult<Application, S::Error> {
    self.require_application(application_id).await?;
    self
      .store
      .update_application(application_id, ApplicationPatch {
        email_sent:    Some(true),
        email_sent_at: Some(Some(Utc::now())),
        ..ApplicationPatch::default()
      })
      .await
      .map_err(PipelineError::Store)
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn require_application(
    &self,
    application_id: Uuid,
  ) -> PipelineResult<Application, S::Error> {
    self
      .store
      .get_application(application_id)
      .await
      .map_err(PipelineError::Store)?
      .ok_or_else(|| Error::ApplicationNotFound(application_id).into())
  }

  async fn notify_best_effort(
    &self,
    actor: &Actor,
    application_id: Uuid,
    kind: NotificationKind,
    target_id: Option<Uuid>,
  ) {
    let notification = Notification {
      application_id,
      kind,
      target_id,
      actor_id: actor.partner_id,
      actor_name: actor.display_name.clone(),
    };
    if let Err(e) = self.dispatcher.notify(notification).await {
      warn!(%application_id, %kind, error = %e, "notification dispatch failed");
    }
  }

  async fn create_ticket_best_effort(&self, ticket: NewTicket) {
    let application_id = ticket.application_id;
    if let Err(e) = self.store.add_ticket(ticket).await {
      warn!(%application_id, error = %e, "follow-up ticket creation failed");
    }
  }

  async fn draft_rejection_best_effort(
    &self,
    application: &Application,
    reasons: &[RejectionReason],
  ) {
    let application_id = application.application_id;
    match self.dispatcher.draft_rejection(application, reasons).await {
      Ok(draft) => {
        let patch = ApplicationPatch {
          rejection_draft: Some(Some(draft)),
          ..ApplicationPatch::default()
        };
        if let Err(e) =
          self.store.update_application(application_id, patch).await
        {
          warn!(%application_id, error = %e, "persisting rejection draft failed");
        }
      }
      Err(e) => {
        warn!(%application_id, error = %e, "rejection draft generation failed");
      }
    }
  }
}
