//! Actor extraction from request headers.
//!
//! The acting partner is passed explicitly on every request:
//!
//! | Header | |
//! |--------|---|
//! | `x-actor-id` | Required — the partner's UUID |
//! | `x-actor-name` | Optional display name |

use axum::{extract::FromRequestParts, http::request::Parts};
use dealflow_core::actor::Actor;
use uuid::Uuid;

use crate::error::ApiError;

/// Present in a handler's arguments means the request named a valid actor.
pub struct ActorContext(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for ActorContext {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let raw_id = parts
      .headers
      .get("x-actor-id")
      .and_then(|v| v.to_str().ok())
      .ok_or_else(|| {
        ApiError::BadRequest("missing x-actor-id header".to_string())
      })?;

    let partner_id = Uuid::parse_str(raw_id).map_err(|_| {
      ApiError::BadRequest(format!("invalid x-actor-id: {raw_id:?}"))
    })?;

    let display_name = parts
      .headers
      .get("x-actor-name")
      .and_then(|v| v.to_str().ok())
      .unwrap_or("partner")
      .to_string();

    Ok(Self(Actor {
      partner_id,
      display_name,
    }))
  }
}
