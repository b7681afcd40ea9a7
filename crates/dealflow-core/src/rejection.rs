//! Rejection-email drafting from the fund's template library.
//!
//! Drafts follow the standard house format: a greeting, a polite decline
//! naming the company, one feedback paragraph driven by the primary
//! rejection reason, a closing wish, and a fixed sign-off. The feedback
//! paragraphs are templates; partners edit the draft before sending.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::application::Application;

// ─── Reasons ─────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RejectionReason {
  /// The product falls outside the fund's investment mandate.
  OutOfScope,
  /// Too early stage, incomplete founding team.
  TooEarly,
  /// No technical cofounder driving the core system.
  NoTechnicalFounder,
  /// Highly conceptual, no clear technical pathway.
  TooConceptual,
  /// The product's impact is not clear or central enough.
  ImpactUnclear,
  /// Not a for-profit company with a scalable business model.
  NotForProfit,
  /// General non-alignment with the fund's focus.
  NotAligned,
}

impl RejectionReason {
  /// One-line summary shown when a partner picks a reason.
  pub fn summary(self) -> &'static str {
    match self {
      Self::OutOfScope => "Product is outside the fund's investment mandate",
      Self::TooEarly => "Too early stage with an incomplete founding team",
      Self::NoTechnicalFounder => "Lacks technical founding leadership",
      Self::TooConceptual => {
        "Approach is too conceptual or lacks a clear technical pathway"
      }
      Self::ImpactUnclear => "Impact is not clear or central to the product",
      Self::NotForProfit => {
        "Not a for-profit company with a scalable business model"
      }
      Self::NotAligned => "General non-alignment with the fund's focus",
    }
  }

  /// The feedback paragraph for this reason, with the company name filled in.
  fn feedback(self, company: &str) -> String {
    match self {
      Self::OutOfScope => format!(
        "Your work is meaningful and clearly impactful. However, {company} is \
         focused on a direction that falls outside the scope of our \
         investment mandate, and we don't believe we are the right partner \
         for it."
      ),
      Self::TooEarly => format!(
        "This is an important direction, and we can see why the category \
         will matter. However, {company} is still at a very early stage, and \
         we generally look for teams with a committed founding group, clear \
         technical ownership, and a more defined product trajectory before \
         engaging as investors."
      ),
      Self::NoTechnicalFounder => format!(
        "The problem you are addressing is an important one. However, we \
         typically look for teams with strong technical founding leadership \
         given the complexity and competitiveness of the space, and at this \
         stage we don't believe {company} is the right fit for our focus."
      ),
      Self::TooConceptual => format!(
        "Your proposal explores ambitious ideas. However, the approach as \
         described is highly conceptual, and it's difficult for us to assess \
         a clear technical pathway, feasibility, or near-term product \
         direction, so {company} does not currently align with our focus on \
         practical, deployable technology."
      ),
      Self::ImpactUnclear => format!(
        "The approach is thoughtful, and we can see how tools like this \
         could be valuable. However, we are not yet convinced that \
         {company}'s impact is sufficiently clear or central to the product \
         for it to fit our criteria."
      ),
      Self::NotForProfit => format!(
        "We appreciate the work you've put into {company} and your \
         commitment to the mission. However, our fund is structured \
         specifically to invest in for-profit companies with scalable \
         business models, and we do not see a clear path for sufficient \
         venture funding to be raised."
      ),
      Self::NotAligned => format!(
        "We appreciate your ambition. However, {company} appears primarily \
         focused on a direction that, while potentially impactful, is not \
         aligned with our mission, and it sits outside the scope of what we \
         fund."
      ),
    }
  }
}

// ─── Assembly ────────────────────────────────────────────────────────────────

/// Assemble a full draft for `application`. With no reasons selected, a
/// generic decline paragraph is used.
pub fn render_email(
  application: &Application,
  reasons: &[RejectionReason],
) -> String {
  let company = application.company_name.as_str();

  let greeting = greeting(application.founder_info.as_deref());

  let opening = format!(
    "Thanks very much for expressing interest in our fund. Unfortunately at \
     this time we don't think that {company} fits within the criteria we \
     are using for our fund."
  );

  let feedback = match reasons.first() {
    Some(reason) => reason.feedback(company),
    None => format!(
      "While we appreciate your submission, {company} does not currently \
       align with our investment criteria."
    ),
  };

  let wish = closing_wish(application);

  format!(
    "{greeting}\n\n{opening}\n\n{feedback}\n\nWe wish you the best as you \
     continue {wish}.\n\nBest,\nThe Investment Team"
  )
}

/// "Hi {founders}," when the founder field looks like a short name line,
/// "Hi there," otherwise.
fn greeting(founder_info: Option<&str>) -> String {
  match founder_info {
    Some(names)
      if !names.trim().is_empty()
        && !names.contains('\n')
        && names.len() <= 80 =>
    {
      format!("Hi {},", names.trim())
    }
    _ => "Hi there,".to_string(),
  }
}

/// Closing wish chosen by keyword from the application's descriptive text.
fn closing_wish(application: &Application) -> &'static str {
  let description = application
    .founder_info
    .as_deref()
    .unwrap_or("")
    .to_lowercase();

  if description.contains("building") || description.contains("develop") {
    "building the company"
  } else if description.contains("platform") {
    "developing the platform"
  } else if description.contains("research") {
    "developing your ideas"
  } else if description.contains("product") {
    "building and refining the product"
  } else {
    "developing your ideas"
  }
}
