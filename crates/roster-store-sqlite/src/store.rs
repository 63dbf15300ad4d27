//! [`SqliteStore`], the SQLite implementation of [`MembershipStore`] and
//! [`NotificationStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use roster_core::{
  list::{AppendList, NewList},
  list_type::Partition,
  notification::{NewPushSubscription, Notification, NotificationStore, PushSubscription},
  person::{NewPerson, PersonRecord, PersonUpdate},
  store::{MembershipStore, WriteOutcome},
};

use crate::{
  Result,
  encode::{
    LIST_COLUMNS, NOTIFICATION_COLUMNS, PERSON_COLUMNS, RawList, RawNotification,
    RawPerson, RawSubscription, SUBSCRIPTION_COLUMNS, encode_dt, encode_list_type,
    encode_partition, encode_payload, encode_uuid,
  },
  schema::SCHEMA,
};

/// Store-assigned timestamps are truncated to the stored precision so that a
/// returned record equals the same record read back.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one person row matching `column = value` within a list partition.
  async fn find_person_by(
    &self,
    column: &'static str,
    list_id: Uuid,
    partition: Partition,
    value: &str,
  ) -> Result<Option<PersonRecord>> {
    let list_id_str   = encode_uuid(list_id);
    let partition_str = encode_partition(partition).to_owned();
    let value         = value.to_owned();

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PERSON_COLUMNS} FROM people
               WHERE list_id = ?1 AND partition_key = ?2 AND {column} = ?3
               LIMIT 1"
            ),
            rusqlite::params![list_id_str, partition_str, value],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }
}

// ─── MembershipStore impl ────────────────────────────────────────────────────

impl MembershipStore for SqliteStore {
  type Error = crate::Error;

  // ── Lists ─────────────────────────────────────────────────────────────────

  async fn create_list(&self, input: NewList) -> Result<AppendList> {
    let created_at = now();
    let list = AppendList {
      id: Uuid::new_v4(),
      title: input.title,
      description: input.description,
      list_type: input.list_type,
      owner_id: input.owner_id,
      created_at,
      updated_at: created_at,
    };

    let id_str      = encode_uuid(list.id);
    let title       = list.title.clone();
    let description = list.description.clone();
    let type_str    = encode_list_type(list.list_type).to_owned();
    let owner_id    = list.owner_id.clone();
    let at_str      = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO append_lists
             (list_id, title, description, list_type, owner_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, title, description, type_str, owner_id, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(list)
  }

  async fn get_list(&self, id: Uuid) -> Result<Option<AppendList>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawList> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {LIST_COLUMNS} FROM append_lists WHERE list_id = ?1"),
            rusqlite::params![id_str],
            RawList::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawList::into_list).transpose()
  }

  async fn lists_owned_by(&self, owner_id: &str) -> Result<Vec<AppendList>> {
    let owner_id = owner_id.to_owned();

    let raws: Vec<RawList> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LIST_COLUMNS} FROM append_lists
           WHERE owner_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_id], RawList::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawList::into_list).collect()
  }

  async fn delete_owned_list(&self, id: Uuid, owner_id: &str) -> Result<Option<usize>> {
    let id_str   = encode_uuid(id);
    let owner_id = owner_id.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let owned = tx
          .query_row(
            "SELECT 1 FROM append_lists WHERE list_id = ?1 AND owner_id = ?2",
            rusqlite::params![id_str, owner_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !owned {
          return Ok(None);
        }

        // Every partition is swept; only the list's own will have rows.
        let people = tx.execute(
          "DELETE FROM people WHERE list_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM append_lists WHERE list_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(Some(people))
      })
      .await?;

    Ok(removed)
  }

  // ── People ────────────────────────────────────────────────────────────────

  async fn find_by_email(
    &self,
    list_id: Uuid,
    partition: Partition,
    email_key: &str,
  ) -> Result<Option<PersonRecord>> {
    self.find_person_by("email_key", list_id, partition, email_key).await
  }

  async fn find_by_name(
    &self,
    list_id: Uuid,
    partition: Partition,
    display_name: &str,
  ) -> Result<Option<PersonRecord>> {
    self.find_person_by("display_name", list_id, partition, display_name).await
  }

  async fn list_people(&self, list_id: Uuid, partition: Partition) -> Result<Vec<PersonRecord>> {
    let list_id_str   = encode_uuid(list_id);
    let partition_str = encode_partition(partition).to_owned();

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM people
           WHERE list_id = ?1 AND partition_key = ?2
           ORDER BY joined_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![list_id_str, partition_str], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<PersonRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM people WHERE person_id = ?1"),
            rusqlite::params![id_str],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn insert_person(&self, input: NewPerson) -> Result<WriteOutcome<PersonRecord>> {
    let person = PersonRecord {
      id:              Uuid::new_v4(),
      list_id:         input.list_id,
      display_name:    input.display_name,
      email_key:       input.email_key,
      register_number: input.register_number,
      payload:         input.payload,
      joined_at:       now(),
    };

    let id_str        = encode_uuid(person.id);
    let list_id_str   = encode_uuid(person.list_id);
    let partition_str = encode_partition(person.payload.partition()).to_owned();
    let display_name  = person.display_name.clone();
    let email_key     = person.email_key.clone();
    let register      = person.register_number.clone();
    let payload_json  = encode_payload(&person.payload)?;
    let joined_at_str = encode_dt(person.joined_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO people (
             person_id, list_id, partition_key, display_name,
             email_key, register_number, payload_json, joined_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            list_id_str,
            partition_str,
            display_name,
            email_key,
            register,
            payload_json,
            joined_at_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if inserted { WriteOutcome::Written(person) } else { WriteOutcome::Conflict })
  }

  async fn update_person(
    &self,
    id: Uuid,
    update: PersonUpdate,
  ) -> Result<WriteOutcome<PersonRecord>> {
    let id_str        = encode_uuid(id);
    let partition_str = encode_partition(update.payload.partition()).to_owned();
    let payload_json  = encode_payload(&update.payload)?;

    let outcome: WriteOutcome<RawPerson> = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "UPDATE people
              SET display_name = ?2, register_number = ?3,
                  partition_key = ?4, payload_json = ?5
            WHERE person_id = ?1",
          rusqlite::params![
            id_str,
            update.display_name,
            update.register_number,
            partition_str,
            payload_json,
          ],
        );
        match result {
          Ok(0) => return Ok(WriteOutcome::Missing),
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(WriteOutcome::Conflict),
          Err(e) => return Err(e.into()),
        }
        let raw = conn.query_row(
          &format!("SELECT {PERSON_COLUMNS} FROM people WHERE person_id = ?1"),
          rusqlite::params![id_str],
          RawPerson::from_row,
        )?;
        Ok(WriteOutcome::Written(raw))
      })
      .await?;

    match outcome {
      WriteOutcome::Written(raw) => Ok(WriteOutcome::Written(raw.into_person()?)),
      WriteOutcome::Conflict => Ok(WriteOutcome::Conflict),
      WriteOutcome::Missing => Ok(WriteOutcome::Missing),
    }
  }

  async fn delete_person(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM people WHERE person_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    Ok(removed > 0)
  }
}

// ─── NotificationStore impl ──────────────────────────────────────────────────

impl NotificationStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_notification(
    &self,
    title: String,
    message: String,
    created_by_email: Option<String>,
  ) -> Result<Notification> {
    let notification = Notification {
      id: Uuid::new_v4(),
      title,
      message,
      created_at: now(),
      created_by_email,
    };

    let id_str  = encode_uuid(notification.id);
    let title   = notification.title.clone();
    let message = notification.message.clone();
    let at_str  = encode_dt(notification.created_at);
    let by      = notification.created_by_email.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications
             (notification_id, title, message, created_at, created_by_email)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, title, message, at_str, by],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNotification> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE notification_id = ?1"
            ),
            rusqlite::params![id_str],
            RawNotification::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawNotification::into_notification).transpose()
  }

  async fn unacknowledged_notifications(&self, viewer_id: &str) -> Result<Vec<Notification>> {
    let viewer_id = viewer_id.to_owned();

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications n
           WHERE NOT EXISTS (
             SELECT 1 FROM notification_acks a
             WHERE a.notification_id = n.notification_id AND a.viewer_id = ?1
           )
           ORDER BY n.created_at DESC, n.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![viewer_id], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn acknowledge(&self, notification_id: Uuid, viewer_id: &str) -> Result<bool> {
    let id_str    = encode_uuid(notification_id);
    let viewer_id = viewer_id.to_owned();
    let at_str    = encode_dt(now());

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO notification_acks
             (notification_id, viewer_id, acknowledged_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, viewer_id, at_str],
        )?)
      })
      .await?;

    Ok(inserted > 0)
  }

  async fn upsert_push_subscription(
    &self,
    viewer_id: &str,
    subscription: NewPushSubscription,
    user_agent: Option<String>,
  ) -> Result<PushSubscription> {
    let new_id_str = encode_uuid(Uuid::new_v4());
    let viewer_id  = viewer_id.to_owned();
    let at_str     = encode_dt(now());

    let raw: RawSubscription = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
          .query_row(
            "SELECT subscription_id FROM push_subscriptions WHERE endpoint = ?1",
            rusqlite::params![subscription.endpoint],
            |r| r.get(0),
          )
          .optional()?;

        match existing {
          Some(id) => {
            tx.execute(
              "UPDATE push_subscriptions
                  SET viewer_id = ?2, p256dh = ?3, auth = ?4,
                      expiration_time = ?5, user_agent = ?6, updated_at = ?7
                WHERE subscription_id = ?1",
              rusqlite::params![
                id,
                viewer_id,
                subscription.keys.p256dh,
                subscription.keys.auth,
                subscription.expiration_time,
                user_agent,
                at_str,
              ],
            )?;
          }
          None => {
            tx.execute(
              "INSERT INTO push_subscriptions (
                 subscription_id, viewer_id, endpoint, p256dh, auth,
                 expiration_time, user_agent, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
              rusqlite::params![
                new_id_str,
                viewer_id,
                subscription.endpoint,
                subscription.keys.p256dh,
                subscription.keys.auth,
                subscription.expiration_time,
                user_agent,
                at_str,
              ],
            )?;
          }
        }

        let raw = tx.query_row(
          &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM push_subscriptions WHERE endpoint = ?1"),
          rusqlite::params![subscription.endpoint],
          RawSubscription::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_subscription()
  }

  async fn remove_push_subscription(&self, endpoint: &str) -> Result<bool> {
    let endpoint = endpoint.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM push_subscriptions WHERE endpoint = ?1",
          rusqlite::params![endpoint],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn remove_viewer_push_subscription(&self, viewer_id: &str, endpoint: &str) -> Result<bool> {
    let viewer_id = viewer_id.to_owned();
    let endpoint  = endpoint.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM push_subscriptions WHERE endpoint = ?1 AND viewer_id = ?2",
          rusqlite::params![endpoint, viewer_id],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn push_subscriptions(&self) -> Result<Vec<PushSubscription>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM push_subscriptions ORDER BY created_at ASC"
        ))?;
        let rows = stmt
          .query_map([], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }
}
