//! Best-effort side-effect dispatch.
//!
//! Notification fan-out and rejection-draft generation are fire-and-forget:
//! the pipeline logs a failed dispatch and moves on. A [`Dispatcher`] error
//! never propagates into the result of the primary transition.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::{application::Application, rejection, rejection::RejectionReason};

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
  MovedToInterview,
  ApplicationRejected,
  DecisionRecorded,
  ApplicationRestored,
}

/// Payload POSTed to the notification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub application_id: Uuid,
  pub kind:           NotificationKind,
  /// The partner the event concerns (e.g. the chosen email sender).
  pub target_id:      Option<Uuid>,
  pub actor_id:       Uuid,
  pub actor_name:     String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Outbound side effects of a stage transition.
pub trait Dispatcher: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fan one notification out to whatever endpoint is configured.
  fn notify(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Produce a rejection-email draft for `application`.
  fn draft_rejection<'a>(
    &'a self,
    application: &'a Application,
    reasons: &'a [RejectionReason],
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

// ─── Template-backed default ─────────────────────────────────────────────────

/// Dispatcher that renders drafts from the built-in template library and
/// logs notifications instead of delivering them. Used when no outbound
/// endpoints are configured, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDispatcher;

impl Dispatcher for TemplateDispatcher {
  type Error = std::convert::Infallible;

  async fn notify(
    &self,
    notification: Notification,
  ) -> Result<(), Self::Error> {
    tracing::info!(
      application_id = %notification.application_id,
      kind = %notification.kind,
      actor = %notification.actor_name,
      "notification (no endpoint configured)"
    );
    Ok(())
  }

  async fn draft_rejection(
    &self,
    application: &Application,
    reasons: &[RejectionReason],
  ) -> Result<String, Self::Error> {
    Ok(rejection::render_email(application, reasons))
  }
}
