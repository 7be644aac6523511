//! [`SqliteStore`], the SQLite implementation of [`MemberStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kinroll_core::{
  member::{Insertion, MemberAccount, MemberProfile, MemberRecord, NewMember},
  store::MemberStore,
  toggle::FeatureToggle,
};

use crate::{
  Result,
  encode::{MEMBER_COLUMNS, RawMember, RawToggle, encode_dt, encode_uuid, stamp},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A member registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
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

  /// Insert a fully-built row. Returns `false` when the email is taken.
  async fn insert_row(&self, raw: RawMember, password_hash: String) -> Result<bool> {
    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          &format!(
            "INSERT INTO members ({MEMBER_COLUMNS}, password_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                     ?25, ?26)"
          ),
          rusqlite::params![
            raw.member_id,
            raw.email,
            raw.family_name,
            raw.name,
            raw.surname,
            raw.role,
            raw.dob,
            raw.baptism_date,
            raw.confirmation_date,
            raw.marriage_date,
            raw.occupation,
            raw.marital_status,
            raw.phone,
            raw.father_name,
            raw.mother_name,
            raw.rite,
            raw.parish_origin,
            raw.diocese_origin,
            raw.present_place,
            raw.parish,
            raw.diocese,
            raw.photo_url,
            raw.photo_storage_id,
            raw.created_at,
            raw.updated_at,
            password_hash,
          ],
        );

        match result {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;
    Ok(inserted)
  }
}

// ─── MemberStore impl ────────────────────────────────────────────────────────

impl MemberStore for SqliteStore {
  type Error = crate::Error;

  // ── Members ───────────────────────────────────────────────────────────────

  async fn insert_member(&self, input: NewMember) -> Result<Insertion> {
    let now = stamp();
    let record = MemberRecord {
      id:               Uuid::new_v4(),
      email:            input.email,
      family_name:      input.family_name,
      profile:          input.profile,
      photo_url:        input.photo.url,
      photo_storage_id: input.photo.storage_id,
      created_at:       now,
      updated_at:       now,
    };

    let raw = RawMember::from_record(&record);
    if self.insert_row(raw, input.password_hash).await? {
      Ok(Insertion::Created(record))
    } else {
      Ok(Insertion::DuplicateEmail)
    }
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<MemberRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
            rusqlite::params![id_str],
            RawMember::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMember::into_record).transpose()
  }

  async fn find_account(&self, email: &str) -> Result<Option<MemberAccount>> {
    let email = email.trim().to_owned();

    let raw: Option<(RawMember, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {MEMBER_COLUMNS}, password_hash FROM members WHERE email = ?1"),
            rusqlite::params![email],
            |row| Ok((RawMember::from_row(row)?, row.get(25)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(raw, password_hash)| {
        Ok(MemberAccount { record: raw.into_record()?, password_hash })
      })
      .transpose()
  }

  async fn list_members(&self) -> Result<Vec<MemberRecord>> {
    let raws: Vec<RawMember> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawMember::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_record).collect()
  }

  async fn update_profile(
    &self,
    id:      Uuid,
    profile: MemberProfile,
  ) -> Result<Option<MemberRecord>> {
    let Some(mut record) = self.get_member(id).await? else {
      return Ok(None);
    };
    record.profile = profile;
    record.updated_at = stamp();

    let raw = RawMember::from_record(&record);
    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE members SET
             name = ?2, surname = ?3, role = ?4, dob = ?5, baptism_date = ?6,
             confirmation_date = ?7, marriage_date = ?8, occupation = ?9,
             marital_status = ?10, phone = ?11, father_name = ?12,
             mother_name = ?13, rite = ?14, parish_origin = ?15,
             diocese_origin = ?16, present_place = ?17, parish = ?18,
             diocese = ?19, updated_at = ?20
           WHERE member_id = ?1",
          rusqlite::params![
            raw.member_id,
            raw.name,
            raw.surname,
            raw.role,
            raw.dob,
            raw.baptism_date,
            raw.confirmation_date,
            raw.marriage_date,
            raw.occupation,
            raw.marital_status,
            raw.phone,
            raw.father_name,
            raw.mother_name,
            raw.rite,
            raw.parish_origin,
            raw.diocese_origin,
            raw.present_place,
            raw.parish,
            raw.diocese,
            raw.updated_at,
          ],
        )?;
        Ok(n)
      })
      .await?;

    // Deleted between the read and the write.
    if changed == 0 {
      return Ok(None);
    }
    Ok(Some(record))
  }

  async fn set_password_hash(&self, email: &str, password_hash: String) -> Result<bool> {
    let email  = email.trim().to_owned();
    let at_str = encode_dt(stamp());

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE members SET password_hash = ?1, updated_at = ?2 WHERE email = ?3",
          rusqlite::params![password_hash, at_str, email],
        )?;
        Ok(n)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_member(&self, id: Uuid) -> Result<Option<MemberRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
            rusqlite::params![id_str],
            RawMember::from_row,
          )
          .optional()?;
        if raw.is_some() {
          conn.execute(
            "DELETE FROM members WHERE member_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        Ok(raw)
      })
      .await?;

    raw.map(RawMember::into_record).transpose()
  }

  // ── Toggles ───────────────────────────────────────────────────────────────

  async fn get_toggle(&self, name: &str) -> Result<Option<FeatureToggle>> {
    let name = name.to_owned();

    let raw: Option<RawToggle> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT name, enabled, updated_at FROM feature_toggles WHERE name = ?1",
            rusqlite::params![name],
            |row| {
              Ok(RawToggle {
                name:       row.get(0)?,
                enabled:    row.get(1)?,
                updated_at: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawToggle::into_toggle).transpose()
  }

  async fn set_toggle(&self, name: &str, enabled: bool) -> Result<FeatureToggle> {
    let toggle = FeatureToggle {
      name: name.to_owned(),
      enabled,
      updated_at: stamp(),
    };

    let name_str = toggle.name.clone();
    let at_str   = encode_dt(toggle.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO feature_toggles (name, enabled, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(name) DO UPDATE SET
             enabled    = excluded.enabled,
             updated_at = excluded.updated_at",
          rusqlite::params![name_str, enabled, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(toggle)
  }
}
