//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Person payloads are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use roster_core::{
  list::AppendList,
  list_type::{ListType, Partition},
  notification::{Notification, PushKeys, PushSubscription},
  person::{PersonPayload, PersonRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ListType / Partition ─────────────────────────────────────────────────────

pub fn encode_list_type(t: ListType) -> &'static str { t.as_str() }

/// Legacy spellings and `NULL` are normalised here, at read time.
pub fn decode_list_type(s: Option<&str>) -> Result<ListType> {
  ListType::normalize(s).ok_or_else(|| Error::UnknownDiscriminant {
    column: "list_type",
    value:  s.unwrap_or_default().to_owned(),
  })
}

pub fn encode_partition(p: Partition) -> &'static str { p.as_str() }

pub fn decode_partition(s: &str) -> Result<Partition> {
  Partition::parse(s).ok_or_else(|| Error::UnknownDiscriminant {
    column: "partition_key",
    value:  s.to_owned(),
  })
}

// ─── PersonPayload ────────────────────────────────────────────────────────────

pub fn encode_payload(p: &PersonPayload) -> Result<String> {
  Ok(serde_json::to_string(p)?)
}

pub fn decode_payload(s: &str) -> Result<PersonPayload> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const LIST_COLUMNS: &str =
  "list_id, title, description, list_type, owner_id, created_at, updated_at";

/// Raw strings read directly from an `append_lists` row.
pub struct RawList {
  pub list_id:     String,
  pub title:       String,
  pub description: String,
  pub list_type:   Option<String>,
  pub owner_id:    String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawList {
  /// Row mapper for a `SELECT {LIST_COLUMNS}` statement.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      list_id:     row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      list_type:   row.get(3)?,
      owner_id:    row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_list(self) -> Result<AppendList> {
    Ok(AppendList {
      id:          decode_uuid(&self.list_id)?,
      title:       self.title,
      description: self.description,
      list_type:   decode_list_type(self.list_type.as_deref())?,
      owner_id:    self.owner_id,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const PERSON_COLUMNS: &str = "person_id, list_id, partition_key, display_name, \
   email_key, register_number, payload_json, joined_at";

/// Raw strings read directly from a `people` row.
pub struct RawPerson {
  pub person_id:       String,
  pub list_id:         String,
  pub partition_key:   String,
  pub display_name:    String,
  pub email_key:       Option<String>,
  pub register_number: Option<String>,
  pub payload_json:    String,
  pub joined_at:       String,
}

impl RawPerson {
  /// Row mapper for a `SELECT {PERSON_COLUMNS}` statement.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:       row.get(0)?,
      list_id:         row.get(1)?,
      partition_key:   row.get(2)?,
      display_name:    row.get(3)?,
      email_key:       row.get(4)?,
      register_number: row.get(5)?,
      payload_json:    row.get(6)?,
      joined_at:       row.get(7)?,
    })
  }

  pub fn into_person(self) -> Result<PersonRecord> {
    let partition = decode_partition(&self.partition_key)?;
    let payload = decode_payload(&self.payload_json)?;
    if payload.partition() != partition {
      return Err(Error::UnknownDiscriminant {
        column: "payload_json",
        value:  self.payload_json,
      });
    }

    Ok(PersonRecord {
      id: decode_uuid(&self.person_id)?,
      list_id: decode_uuid(&self.list_id)?,
      display_name: self.display_name,
      email_key: self.email_key,
      register_number: self.register_number,
      payload,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str =
  "notification_id, title, message, created_at, created_by_email";

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id:  String,
  pub title:            String,
  pub message:          String,
  pub created_at:       String,
  pub created_by_email: Option<String>,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id:  row.get(0)?,
      title:            row.get(1)?,
      message:          row.get(2)?,
      created_at:       row.get(3)?,
      created_by_email: row.get(4)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      id:               decode_uuid(&self.notification_id)?,
      title:            self.title,
      message:          self.message,
      created_at:       decode_dt(&self.created_at)?,
      created_by_email: self.created_by_email,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, viewer_id, endpoint, p256dh, auth, \
   expiration_time, user_agent, created_at, updated_at";

/// Raw values read directly from a `push_subscriptions` row.
pub struct RawSubscription {
  pub subscription_id: String,
  pub viewer_id:       String,
  pub endpoint:        String,
  pub p256dh:          String,
  pub auth:            String,
  pub expiration_time: Option<i64>,
  pub user_agent:      Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id: row.get(0)?,
      viewer_id:       row.get(1)?,
      endpoint:        row.get(2)?,
      p256dh:          row.get(3)?,
      auth:            row.get(4)?,
      expiration_time: row.get(5)?,
      user_agent:      row.get(6)?,
      created_at:      row.get(7)?,
      updated_at:      row.get(8)?,
    })
  }

  pub fn into_subscription(self) -> Result<PushSubscription> {
    Ok(PushSubscription {
      id:              decode_uuid(&self.subscription_id)?,
      viewer_id:       self.viewer_id,
      endpoint:        self.endpoint,
      keys:            PushKeys { p256dh: self.p256dh, auth: self.auth },
      expiration_time: self.expiration_time,
      user_agent:      self.user_agent,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(500_000);
    let c = a + chrono::Duration::microseconds(1_234_567);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn legacy_list_types_decode_as_plain() {
    assert_eq!(decode_list_type(None).unwrap(), ListType::Plain);
    assert_eq!(decode_list_type(Some("nightslip")).unwrap(), ListType::Plain);
    assert_eq!(decode_list_type(Some("names")).unwrap(), ListType::Plain);
    assert!(decode_list_type(Some("bogus")).is_err());
  }
}
