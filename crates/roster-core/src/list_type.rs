//! List type registry: which person shape and store partition a list uses.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  person::{JoinPayload, PersonPatch, PersonPayload},
};

// ─── ListType ────────────────────────────────────────────────────────────────

/// The declared type of an append list.
///
/// `nightslip` and `names` are legacy spellings of [`ListType::Plain`] and are
/// accepted wherever a list type is parsed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
  #[default]
  #[serde(alias = "nightslip", alias = "names")]
  Plain,
  Github,
  Others,
}

impl ListType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Plain => "plain",
      Self::Github => "github",
      Self::Others => "others",
    }
  }

  /// Normalise a stored or user-supplied discriminant. A missing or blank
  /// value means `Plain`; unknown strings yield `None`.
  pub fn normalize(raw: Option<&str>) -> Option<Self> {
    let raw = raw.map(str::trim).unwrap_or_default().to_ascii_lowercase();
    match raw.as_str() {
      "" | "plain" | "nightslip" | "names" => Some(Self::Plain),
      "github" => Some(Self::Github),
      "others" => Some(Self::Others),
      _ => None,
    }
  }

  /// The membership store partition holding this list's people.
  pub fn partition(self) -> Partition {
    match self {
      Self::Plain => Partition::People,
      Self::Github => Partition::GithubPeople,
      Self::Others => Partition::OtherPeople,
    }
  }

  /// What a join must supply beyond the principal's name and email.
  pub fn required_join_payload(self) -> RequiredPayload {
    match self {
      Self::Plain => RequiredPayload::Nothing,
      Self::Github => RequiredPayload::GithubUsername,
      Self::Others => RequiredPayload::FreeFormInputs,
    }
  }

  /// Validate a join payload against this list type, producing the stored
  /// person payload. Missing required fields are rejected, never defaulted.
  pub fn validate_join(self, payload: &JoinPayload) -> Result<PersonPayload> {
    match self.required_join_payload() {
      RequiredPayload::Nothing => Ok(PersonPayload::Plain),
      RequiredPayload::GithubUsername => Ok(PersonPayload::Github {
        github_username: github_username(payload.github_username.as_deref())?,
      }),
      RequiredPayload::FreeFormInputs => Ok(PersonPayload::Others {
        inputs: free_form_inputs(payload.inputs.as_deref())?,
      }),
    }
  }

  /// Apply the type-specific fields of an edit to `current`.
  ///
  /// Fields absent from the patch keep their current value; fields present
  /// go through the same validation as a join.
  pub fn apply_patch(
    self,
    current: &PersonPayload,
    patch: &PersonPatch,
  ) -> Result<PersonPayload> {
    match self.required_join_payload() {
      RequiredPayload::Nothing => Ok(PersonPayload::Plain),
      RequiredPayload::GithubUsername => {
        let raw = patch
          .github_username
          .as_deref()
          .or_else(|| current.github_username());
        Ok(PersonPayload::Github { github_username: github_username(raw)? })
      }
      RequiredPayload::FreeFormInputs => {
        let raw = patch.inputs.as_deref().or_else(|| current.inputs());
        Ok(PersonPayload::Others { inputs: free_form_inputs(raw)? })
      }
    }
  }
}

impl fmt::Display for ListType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ListType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::normalize(Some(s))
      .ok_or_else(|| Error::ValidationFailed(format!("unknown list type: {s:?}")))
  }
}

// ─── Partition ───────────────────────────────────────────────────────────────

/// One of the three parallel person collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
  People,
  GithubPeople,
  OtherPeople,
}

impl Partition {
  pub const ALL: [Partition; 3] =
    [Self::People, Self::GithubPeople, Self::OtherPeople];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::People => "people",
      Self::GithubPeople => "github_people",
      Self::OtherPeople => "other_people",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|p| p.as_str() == s)
  }
}

/// Extra join payload demanded by a list type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredPayload {
  Nothing,
  /// A non-blank GitHub username.
  GithubUsername,
  /// At least one non-blank free-form input.
  FreeFormInputs,
}

// ─── Field validation ────────────────────────────────────────────────────────

fn github_username(raw: Option<&str>) -> Result<String> {
  raw
    .map(str::trim)
    .filter(|u| !u.is_empty())
    .map(str::to_owned)
    .ok_or_else(|| Error::ValidationFailed("github username is required".into()))
}

/// Trim every entry and drop blanks, keeping the original order.
fn free_form_inputs(raw: Option<&[String]>) -> Result<Vec<String>> {
  let inputs: Vec<String> = raw
    .unwrap_or_default()
    .iter()
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .collect();
  if inputs.is_empty() {
    return Err(Error::ValidationFailed("at least one input is required".into()));
  }
  Ok(inputs)
}
