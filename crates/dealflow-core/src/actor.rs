//! The partner performing an action.
//!
//! Every pipeline call takes an explicit [`Actor`] rather than reading the
//! current user from ambient session state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
  pub partner_id:   Uuid,
  pub display_name: String,
}

impl Actor {
  pub fn new(partner_id: Uuid, display_name: impl Into<String>) -> Self {
    Self {
      partner_id,
      display_name: display_name.into(),
    }
  }
}
