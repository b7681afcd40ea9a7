//! Error types for `dealflow-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::application::QUORUM;

#[derive(Debug, Error)]
pub enum Error {
  #[error("application not found: {0}")]
  ApplicationNotFound(Uuid),

  #[error("application {0} has no linked company record")]
  ApplicationNotLinked(Uuid),

  #[error("quorum not reached: {recorded} of {} votes recorded", QUORUM)]
  QuorumNotReached { recorded: usize },

  #[error("an email sender must be selected")]
  MissingEmailSender,

  #[error("investment terms are required for a yes decision")]
  MissingInvestmentTerms,

  #[error("investment amount must be greater than zero")]
  InvalidInvestmentAmount,

  #[error("investment terms must not be empty")]
  EmptyInvestmentTerms,
}

impl Error {
  /// Whether this error is a missing-record lookup (as opposed to a
  /// validation failure). API layers map the two to different statuses.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::ApplicationNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
