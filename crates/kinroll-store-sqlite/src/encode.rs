//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with fixed microsecond precision, so that
//! ordering by the text column is chronological. Calendar dates are
//! `YYYY-MM-DD`. Enumerations use their wire names. UUIDs are hyphenated
//! lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use kinroll_core::{
  member::{MemberProfile, MemberRecord, Rite, Role},
  toggle::FeatureToggle,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// The current time at the precision the timestamp columns hold.
pub fn stamp() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for every member read, in [`RawMember`] field order.
pub const MEMBER_COLUMNS: &str = "
  member_id, email, family_name, name, surname, role, dob, baptism_date,
  confirmation_date, marriage_date, occupation, marital_status, phone,
  father_name, mother_name, rite, parish_origin, diocese_origin,
  present_place, parish, diocese, photo_url, photo_storage_id,
  created_at, updated_at";

/// Raw strings read directly from (or written to) a `members` row.
pub struct RawMember {
  pub member_id:         String,
  pub email:             String,
  pub family_name:       String,
  pub name:              String,
  pub surname:           String,
  pub role:              String,
  pub dob:               String,
  pub baptism_date:      String,
  pub confirmation_date: String,
  pub marriage_date:     Option<String>,
  pub occupation:        String,
  pub marital_status:    String,
  pub phone:             String,
  pub father_name:       String,
  pub mother_name:       Option<String>,
  pub rite:              String,
  pub parish_origin:     Option<String>,
  pub diocese_origin:    Option<String>,
  pub present_place:     Option<String>,
  pub parish:            Option<String>,
  pub diocese:           Option<String>,
  pub photo_url:         String,
  pub photo_storage_id:  Option<String>,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawMember {
  /// Read a row selected with [`MEMBER_COLUMNS`], starting at column 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:         row.get(0)?,
      email:             row.get(1)?,
      family_name:       row.get(2)?,
      name:              row.get(3)?,
      surname:           row.get(4)?,
      role:              row.get(5)?,
      dob:               row.get(6)?,
      baptism_date:      row.get(7)?,
      confirmation_date: row.get(8)?,
      marriage_date:     row.get(9)?,
      occupation:        row.get(10)?,
      marital_status:    row.get(11)?,
      phone:             row.get(12)?,
      father_name:       row.get(13)?,
      mother_name:       row.get(14)?,
      rite:              row.get(15)?,
      parish_origin:     row.get(16)?,
      diocese_origin:    row.get(17)?,
      present_place:     row.get(18)?,
      parish:            row.get(19)?,
      diocese:           row.get(20)?,
      photo_url:         row.get(21)?,
      photo_storage_id:  row.get(22)?,
      created_at:        row.get(23)?,
      updated_at:        row.get(24)?,
    })
  }

  pub fn from_record(record: &MemberRecord) -> Self {
    let p = &record.profile;
    Self {
      member_id:         encode_uuid(record.id),
      email:             record.email.clone(),
      family_name:       record.family_name.clone(),
      name:              p.name.clone(),
      surname:           p.surname.clone(),
      role:              p.role.to_string(),
      dob:               encode_date(p.dob),
      baptism_date:      encode_date(p.baptism_date),
      confirmation_date: encode_date(p.confirmation_date),
      marriage_date:     p.marriage_date.map(encode_date),
      occupation:        p.occupation.clone(),
      marital_status:    p.marital_status.clone(),
      phone:             p.phone.clone(),
      father_name:       p.father_name.clone(),
      mother_name:       p.mother_name.clone(),
      rite:              p.rite.to_string(),
      parish_origin:     p.parish_origin.clone(),
      diocese_origin:    p.diocese_origin.clone(),
      present_place:     p.present_place.clone(),
      parish:            p.parish.clone(),
      diocese:           p.diocese.clone(),
      photo_url:         record.photo_url.clone(),
      photo_storage_id:  record.photo_storage_id.clone(),
      created_at:        encode_dt(record.created_at),
      updated_at:        encode_dt(record.updated_at),
    }
  }

  pub fn into_record(self) -> Result<MemberRecord> {
    let marriage_date = self.marriage_date.as_deref().map(decode_date).transpose()?;

    Ok(MemberRecord {
      id:               decode_uuid(&self.member_id)?,
      email:            self.email,
      family_name:      self.family_name,
      profile:          MemberProfile {
        name:              self.name,
        surname:           self.surname,
        role:              decode_enum::<Role>("role", &self.role)?,
        dob:               decode_date(&self.dob)?,
        baptism_date:      decode_date(&self.baptism_date)?,
        confirmation_date: decode_date(&self.confirmation_date)?,
        marriage_date,
        occupation:        self.occupation,
        marital_status:    self.marital_status,
        phone:             self.phone,
        father_name:       self.father_name,
        mother_name:       self.mother_name,
        rite:              decode_enum::<Rite>("rite", &self.rite)?,
        parish_origin:     self.parish_origin,
        diocese_origin:    self.diocese_origin,
        present_place:     self.present_place,
        parish:            self.parish,
        diocese:           self.diocese,
      },
      photo_url:        self.photo_url,
      photo_storage_id: self.photo_storage_id,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `feature_toggles` row.
pub struct RawToggle {
  pub name:       String,
  pub enabled:    bool,
  pub updated_at: String,
}

impl RawToggle {
  pub fn into_toggle(self) -> Result<FeatureToggle> {
    Ok(FeatureToggle {
      name:       self.name,
      enabled:    self.enabled,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
