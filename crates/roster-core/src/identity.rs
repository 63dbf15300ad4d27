//! Identity normalisation: turning raw principal data into join keys.
//!
//! Every function here is pure. The join-dedup keys derived from a principal
//! must be deterministic: the same name/email always yields the same keys.

/// Display name used when a principal has neither a name nor an email.
pub const ANONYMOUS: &str = "Anonymous";

// ─── Principal ───────────────────────────────────────────────────────────────

/// A verified caller, as supplied by the authentication layer.
///
/// `email` and `name` are raw, user-controlled strings; use the accessor
/// methods to obtain normalised keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
  pub id:    String,
  pub email: Option<String>,
  pub name:  Option<String>,
}

impl Principal {
  pub fn new(id: impl Into<String>) -> Self {
    Self { id: id.into(), email: None, name: None }
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Lower-cased, trimmed email; `None` when absent or blank.
  pub fn email_key(&self) -> Option<String> {
    self.email.as_deref().and_then(normalize_email)
  }

  /// Trimmed name; `None` when absent or blank.
  pub fn trimmed_name(&self) -> Option<String> {
    self.name.as_deref().and_then(normalize_name)
  }

  /// See [`resolve_display_name`].
  pub fn display_name(&self) -> String {
    resolve_display_name(self.name.as_deref(), self.email.as_deref())
  }

  /// See [`identity_candidates`].
  pub fn identity_candidates(&self) -> Vec<String> {
    identity_candidates(self.name.as_deref(), self.email.as_deref())
  }
}

// ─── Normalisers ─────────────────────────────────────────────────────────────

pub fn normalize_email(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

pub fn normalize_name(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// The trimmed name if present, else the trimmed email, else [`ANONYMOUS`].
///
/// This becomes the dedup key for principals without an email. The email
/// fallback keeps its original case.
pub fn resolve_display_name(name: Option<&str>, email: Option<&str>) -> String {
  name
    .and_then(normalize_name)
    .or_else(|| email.and_then(normalize_name))
    .unwrap_or_else(|| ANONYMOUS.to_owned())
}

/// The trimmed name and the trimmed email, blanks and duplicates removed, in
/// that order. Used to match records created before email capture existed.
pub fn identity_candidates(name: Option<&str>, email: Option<&str>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(2);
  for candidate in [name, email].into_iter().flatten().filter_map(normalize_name) {
    if !out.contains(&candidate) {
      out.push(candidate);
    }
  }
  out
}

// ─── Register numbers ────────────────────────────────────────────────────────

/// Extract a register number from the last whitespace-separated token of a
/// free-text name.
///
/// The token is upper-cased and must be exactly two digits, three letters,
/// four digits (e.g. `21BCE1234`). Anything else yields `None`; this is
/// best-effort metadata, never an error.
pub fn extract_register_number(raw_name: &str) -> Option<String> {
  let candidate = raw_name.split_whitespace().last()?.to_uppercase();
  is_register_number(&candidate).then_some(candidate)
}

fn is_register_number(token: &str) -> bool {
  let bytes = token.as_bytes();
  bytes.len() == 9
    && bytes[..2].iter().all(u8::is_ascii_digit)
    && bytes[2..5].iter().all(u8::is_ascii_uppercase)
    && bytes[5..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_is_trimmed_and_lowercased() {
    assert_eq!(normalize_email("  Jane@Example.COM "), Some("jane@example.com".into()));
    assert_eq!(normalize_email("   "), None);
  }

  #[test]
  fn display_name_falls_back_to_email_then_anonymous() {
    assert_eq!(resolve_display_name(Some(" Jane "), Some("j@x.io")), "Jane");
    assert_eq!(resolve_display_name(Some("  "), Some(" J@X.io ")), "J@X.io");
    assert_eq!(resolve_display_name(None, None), ANONYMOUS);
  }

  #[test]
  fn candidates_are_deduplicated_in_order() {
    assert_eq!(
      identity_candidates(Some(" jane@x.io"), Some("jane@x.io ")),
      vec!["jane@x.io".to_owned()]
    );
    assert_eq!(
      identity_candidates(Some("Jane"), Some("jane@x.io")),
      vec!["Jane".to_owned(), "jane@x.io".to_owned()]
    );
    assert!(identity_candidates(Some(" "), None).is_empty());
  }

  #[test]
  fn register_number_from_last_token() {
    assert_eq!(extract_register_number("Jane Doe 21BCE1234"), Some("21BCE1234".into()));
    assert_eq!(extract_register_number("jane doe 21bce1234"), Some("21BCE1234".into()));
    assert_eq!(extract_register_number("  Jane\tDoe\t21bce1234  "), Some("21BCE1234".into()));
  }

  #[test]
  fn register_number_absent_on_mismatch() {
    assert_eq!(extract_register_number("Jane Doe"), None);
    assert_eq!(extract_register_number(""), None);
    assert_eq!(extract_register_number("Jane 21BCE123"), None);
    assert_eq!(extract_register_number("Jane 21BCE12345"), None);
    assert_eq!(extract_register_number("Jane 2XBCE1234"), None);
    assert_eq!(extract_register_number("21BCE1234 Jane"), None);
  }

  #[test]
  fn principal_accessors() {
    let p = Principal::new("u1").with_email(" A@B.io ").with_name("  Ann 22MIS0001 ");
    assert_eq!(p.email_key().as_deref(), Some("a@b.io"));
    assert_eq!(p.trimmed_name().as_deref(), Some("Ann 22MIS0001"));
    assert_eq!(p.display_name(), "Ann 22MIS0001");
  }
}
