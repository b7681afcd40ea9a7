//! JSON REST API for dealflow.
//!
//! Exposes an axum [`Router`] backed by any
//! [`dealflow_core::store::CrmStore`] through the vote/decision
//! [`Pipeline`](dealflow_core::pipeline::Pipeline). Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dealflow_api::api_router(pipeline.clone()))
//! ```

pub mod actor;
pub mod applications;
pub mod companies;
pub mod deliberations;
pub mod error;
pub mod people;
pub mod tickets;
pub mod votes;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use dealflow_core::{dispatch::Dispatcher, pipeline::Pipeline, store::CrmStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `pipeline`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, D>(pipeline: Arc<Pipeline<S, D>>) -> Router<()>
where
  S: CrmStore + 'static,
  D: Dispatcher + 'static,
{
  Router::new()
    // Applications
    .route(
      "/applications",
      get(applications::list::<S, D>).post(applications::create::<S, D>),
    )
    .route("/applications/{id}", get(applications::get_one::<S, D>))
    .route(
      "/applications/{id}/advance",
      post(applications::advance::<S, D>),
    )
    .route(
      "/applications/{id}/reject",
      post(applications::reject::<S, D>),
    )
    .route(
      "/applications/{id}/move-back",
      post(applications::move_back::<S, D>),
    )
    .route(
      "/applications/{id}/restore",
      post(applications::restore::<S, D>),
    )
    .route(
      "/applications/{id}/rejection-draft",
      post(applications::generate_draft::<S, D>)
        .put(applications::update_draft::<S, D>),
    )
    .route(
      "/applications/{id}/email-sent",
      post(applications::email_sent::<S, D>),
    )
    .route("/rejection-reasons", get(applications::rejection_reasons))
    // Votes
    .route(
      "/applications/{id}/votes",
      get(votes::list::<S, D>).put(votes::cast::<S, D>),
    )
    // Deliberations
    .route(
      "/applications/{id}/deliberation",
      get(deliberations::get_one::<S, D>),
    )
    .route(
      "/applications/{id}/decision",
      post(deliberations::save::<S, D>),
    )
    // Companies
    .route(
      "/companies",
      get(companies::list::<S, D>).post(companies::create::<S, D>),
    )
    .route("/companies/{id}", get(companies::get_one::<S, D>))
    .route(
      "/companies/{id}/investments",
      get(companies::investments::<S, D>),
    )
    .route(
      "/companies/{id}/people",
      get(companies::people::<S, D>).post(companies::link_person::<S, D>),
    )
    .route(
      "/companies/{id}/people/{person_id}",
      delete(companies::unlink_person::<S, D>),
    )
    // People
    .route("/people", post(people::create::<S, D>))
    .route("/people/{id}", get(people::get_one::<S, D>))
    // Tickets
    .route("/tickets", get(tickets::list::<S, D>))
    .with_state(pipeline)
}
