//! HTTP server wiring for the dealflow CRM.
//!
//! Composes the JSON API router from `dealflow-api` with Basic-auth
//! middleware, request tracing, and runtime configuration. The binary in
//! `main.rs` loads [`ServerConfig`] and serves the result.

pub mod auth;
pub mod dispatch;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use dealflow_core::{dispatch::Dispatcher, pipeline::Pipeline, store::CrmStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `DEALFLOW_*` environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// Notification fan-out endpoint; notifications are dropped when unset.
  pub notify_url:         Option<String>,
  /// External rejection-draft endpoint; the built-in templates are used
  /// when unset.
  pub draft_url:          Option<String>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through the router.
#[derive(Clone)]
pub struct AppState<S: CrmStore, D: Dispatcher> {
  pub pipeline: Arc<Pipeline<S, D>>,
  pub auth:     Arc<AuthConfig>,
  pub config:   Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full server router: the API behind Basic auth, plus an
/// unauthenticated health probe.
pub fn router<S, D>(state: AppState<S, D>) -> Router
where
  S: CrmStore + 'static,
  D: Dispatcher + 'static,
{
  Router::new()
    .nest(
      "/api",
      dealflow_api::api_router(state.pipeline.clone()).layer(
        middleware::from_fn_with_state(state.auth.clone(), auth::require_auth),
      ),
    )
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use dealflow_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::dispatch::HttpDispatcher;

  type TestState = AppState<SqliteStore, HttpDispatcher>;

  async fn make_state(password: &str) -> TestState {
    let store = SqliteStore::open_in_memory().await.unwrap();
    // No outbound endpoints configured: notifications are dropped and
    // drafts come from the template library.
    let dispatcher = HttpDispatcher::new(None, None).unwrap();
    let pipeline = Arc::new(Pipeline::new(store, dispatcher));

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AppState {
      pipeline,
      auth: Arc::new(AuthConfig {
        username:      "partner".to_string(),
        password_hash: hash.clone(),
      }),
      config: Arc::new(ServerConfig {
        host:               "127.0.0.1".to_string(),
        port:               8080,
        store_path:         PathBuf::from(":memory:"),
        auth_username:      "partner".to_string(),
        auth_password_hash: hash,
        notify_url:         None,
        draft_url:          None,
      }),
    }
  }

  fn basic_auth() -> String {
    format!("Basic {}", B64.encode("partner:secret"))
  }

  async fn request(
    state: TestState,
    method: &str,
    uri: &str,
    actor: Option<Uuid>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::AUTHORIZATION, basic_auth());
    if let Some(actor_id) = actor {
      builder = builder
        .header("x-actor-id", actor_id.to_string())
        .header("x-actor-name", "Avery");
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
  }

  async fn create_company(state: &TestState, name: &str) -> String {
    let (status, body) = request(
      state.clone(),
      "POST",
      "/api/companies",
      None,
      Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["company_id"].as_str().unwrap().to_string()
  }

  async fn create_application(state: &TestState, company_id: &str) -> String {
    let (status, body) = request(
      state.clone(),
      "POST",
      "/api/applications",
      None,
      Some(json!({
        "company_id": company_id,
        "company_name": "Acme Robotics",
        "founder_info": "Ada and Grace",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["application_id"].as_str().unwrap().to_string()
  }

  // ── Auth boundary ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_public() {
    let state = make_state("secret").await;
    let req = Request::builder()
      .uri("/health")
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_requires_auth() {
    let state = make_state("secret").await;
    let req = Request::builder()
      .uri("/api/applications")
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn wrong_password_is_rejected() {
    let state = make_state("secret").await;
    let creds = format!("Basic {}", B64.encode("partner:wrong"));
    let req = Request::builder()
      .uri("/api/applications")
      .header(header::AUTHORIZATION, creds)
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Actor context ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn mutating_actions_require_an_actor_header() {
    let state = make_state("secret").await;
    let company_id = create_company(&state, "Acme").await;
    let application_id = create_application(&state, &company_id).await;

    let (status, body) = request(
      state,
      "PUT",
      &format!("/api/applications/{application_id}/votes"),
      None,
      Some(json!({ "value": "yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
      body["error"].as_str().unwrap().contains("x-actor-id"),
      "body: {body}"
    );
  }

  // ── Intake flow ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn votes_stay_hidden_until_revealed() {
    let state = make_state("secret").await;
    let company_id = create_company(&state, "Acme Robotics").await;
    let application_id = create_application(&state, &company_id).await;

    let (status, _) = request(
      state.clone(),
      "PUT",
      &format!("/api/applications/{application_id}/votes"),
      Some(Uuid::new_v4()),
      Some(json!({ "value": "yes", "notes": "strong team" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
      state,
      "GET",
      &format!("/api/applications/{application_id}/votes"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revealed"], json!(false));
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["quorum_reached"], json!(false));
    assert!(body["tally"].is_null(), "body: {body}");
    assert!(body["votes"].is_null(), "body: {body}");
  }

  #[tokio::test]
  async fn advance_without_quorum_is_unprocessable() {
    let state = make_state("secret").await;
    let company_id = create_company(&state, "Acme Robotics").await;
    let application_id = create_application(&state, &company_id).await;

    let (status, body) = request(
      state,
      "POST",
      &format!("/api/applications/{application_id}/advance"),
      Some(Uuid::new_v4()),
      Some(json!({ "email_sender_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
      body["error"].as_str().unwrap().contains("quorum"),
      "body: {body}"
    );
  }

  #[tokio::test]
  async fn full_flow_from_intake_to_portfolio() {
    let state = make_state("secret").await;
    let company_id = create_company(&state, "Acme Robotics").await;
    let application_id = create_application(&state, &company_id).await;

    // Three partners vote.
    for _ in 0..3 {
      let (status, _) = request(
        state.clone(),
        "PUT",
        &format!("/api/applications/{application_id}/votes"),
        Some(Uuid::new_v4()),
        Some(json!({ "value": "yes" })),
      )
      .await;
      assert_eq!(status, StatusCode::OK);
    }

    // Advance to interview with a chosen sender.
    let sender = Uuid::new_v4();
    let (status, body) = request(
      state.clone(),
      "POST",
      &format!("/api/applications/{application_id}/advance"),
      Some(Uuid::new_v4()),
      Some(json!({ "email_sender_id": sender })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["stage"], json!("interview"));
    assert_eq!(body["votes_revealed"], json!(true));

    // The ballots are visible now.
    let (_, body) = request(
      state.clone(),
      "GET",
      &format!("/api/applications/{application_id}/votes"),
      None,
      None,
    )
    .await;
    assert_eq!(body["revealed"], json!(true));
    assert_eq!(body["votes"].as_array().unwrap().len(), 3);

    // The sender got a follow-up ticket.
    let (_, body) = request(
      state.clone(),
      "GET",
      &format!("/api/tickets?assignee={sender}&open_only=true"),
      None,
      None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Yes decision with investment terms.
    let (status, body) = request(
      state.clone(),
      "POST",
      &format!("/api/applications/{application_id}/decision"),
      Some(Uuid::new_v4()),
      Some(json!({
        "decision": "yes",
        "investment": {
          "amount_cents": 50000000,
          "terms": "SAFE, 10% discount",
          "round": "pre-seed",
          "valuation_cents": 1000000000,
          "invested_at": "2025-06-01",
        },
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["deliberation"]["decision"], json!("yes"));
    assert_eq!(body["deliberation"]["status"], json!("portfolio"));
    assert_eq!(body["application"]["stage"], json!("portfolio"));
    assert_eq!(
      body["investment"]["amount_cents"],
      json!(50_000_000_i64)
    );

    // The company landed in the portfolio.
    let (_, body) = request(
      state.clone(),
      "GET",
      &format!("/api/companies/{company_id}"),
      None,
      None,
    )
    .await;
    assert_eq!(body["stage"], json!("portfolio"));

    // Exactly one investment row.
    let (_, body) = request(
      state,
      "GET",
      &format!("/api/companies/{company_id}/investments"),
      None,
      None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn no_decision_drafts_a_rejection_email() {
    let state = make_state("secret").await;
    let company_id = create_company(&state, "Acme Robotics").await;
    let application_id = create_application(&state, &company_id).await;

    let sender = Uuid::new_v4();
    let (status, body) = request(
      state.clone(),
      "POST",
      &format!("/api/applications/{application_id}/decision"),
      Some(Uuid::new_v4()),
      Some(json!({
        "decision": "no",
        "email_sender_id": sender,
        "reasons": ["too_early"],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["application"]["stage"], json!("rejected"));
    assert!(body["investment"].is_null());

    // The template dispatcher generated and persisted a draft.
    let (_, body) = request(
      state,
      "GET",
      &format!("/api/applications/{application_id}"),
      None,
      None,
    )
    .await;
    let draft = body["rejection_draft"].as_str().unwrap();
    assert!(draft.contains("Acme Robotics"), "draft: {draft}");
  }

  #[tokio::test]
  async fn validation_failures_do_not_write() {
    let state = make_state("secret").await;
    let company_id = create_company(&state, "Acme Robotics").await;
    let application_id = create_application(&state, &company_id).await;

    let (status, _) = request(
      state.clone(),
      "POST",
      &format!("/api/applications/{application_id}/decision"),
      Some(Uuid::new_v4()),
      Some(json!({ "decision": "yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // No deliberation was created by the rejected save.
    let (status, _) = request(
      state,
      "GET",
      &format!("/api/applications/{application_id}/deliberation"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
