//! Outbound best-effort dispatcher.
//!
//! POSTs notification payloads fire-and-forget and fetches rejection drafts
//! from an external drafting endpoint when one is configured, falling back
//! to the built-in template renderer otherwise. The pipeline treats every
//! failure here as log-and-continue.

use std::time::Duration;

use anyhow::Context as _;
use dealflow_core::{
  application::Application,
  dispatch::{Dispatcher, Notification},
  rejection::{self, RejectionReason},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("endpoint returned {0}")]
  Endpoint(reqwest::StatusCode),
}

/// Dispatcher backed by plain HTTP endpoints.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpDispatcher {
  client:     reqwest::Client,
  notify_url: Option<String>,
  draft_url:  Option<String>,
}

impl HttpDispatcher {
  pub fn new(
    notify_url: Option<String>,
    draft_url: Option<String>,
  ) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      notify_url,
      draft_url,
    })
  }
}

#[derive(Serialize)]
struct DraftRequest<'a> {
  application_id: Uuid,
  reasons:        &'a [RejectionReason],
}

#[derive(Deserialize)]
struct DraftResponse {
  email: String,
}

impl Dispatcher for HttpDispatcher {
  type Error = DispatchError;

  async fn notify(
    &self,
    notification: Notification,
  ) -> Result<(), DispatchError> {
    let Some(url) = &self.notify_url else {
      tracing::debug!(
        application_id = %notification.application_id,
        "no notify endpoint configured, dropping notification"
      );
      return Ok(());
    };

    let resp = self.client.post(url).json(&notification).send().await?;
    if !resp.status().is_success() {
      return Err(DispatchError::Endpoint(resp.status()));
    }
    Ok(())
  }

  async fn draft_rejection(
    &self,
    application: &Application,
    reasons: &[RejectionReason],
  ) -> Result<String, DispatchError> {
    let Some(url) = &self.draft_url else {
      return Ok(rejection::render_email(application, reasons));
    };

    let resp = self
      .client
      .post(url)
      .json(&DraftRequest {
        application_id: application.application_id,
        reasons,
      })
      .send()
      .await?;
    if !resp.status().is_success() {
      return Err(DispatchError::Endpoint(resp.status()));
    }
    Ok(resp.json::<DraftResponse>().await?.email)
  }
}
