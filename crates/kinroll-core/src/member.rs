//! Member records, one per enrolled person.
//!
//! A record is split into an immutable identity envelope (`id`, `email`,
//! `family_name`, photo, timestamps) and a [`MemberProfile`] holding the
//! fields a member may edit on their own. Self-service updates only ever
//! replace the profile.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// A member's position within their family.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
  VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  /// The person filling in the form for themselves.
  #[serde(rename = "self")]
  #[strum(serialize = "self")]
  Oneself,
  Husband,
  Wife,
  Father,
  Mother,
  Child,
  Grandparent,
}

impl Role {
  /// Position used when listing a family: elders first, children last.
  pub fn rank(self) -> u8 {
    match self {
      Self::Grandparent => 0,
      Self::Father => 1,
      Self::Husband => 2,
      Self::Mother => 3,
      Self::Wife => 4,
      Self::Oneself => 5,
      Self::Child => 6,
    }
  }
}

/// Liturgical rite.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
  VariantNames,
)]
pub enum Rite {
  #[serde(rename = "latin")]
  #[strum(serialize = "latin")]
  Latin,
  #[serde(rename = "roman")]
  #[strum(serialize = "roman")]
  Roman,
  #[serde(rename = "syro-malabar")]
  #[strum(serialize = "syro-malabar")]
  SyroMalabar,
  #[serde(rename = "syro-malankara")]
  #[strum(serialize = "syro-malankara")]
  SyroMalankara,
  #[serde(rename = "melkite")]
  #[strum(serialize = "melkite")]
  Melkite,
  #[serde(rename = "maronite")]
  #[strum(serialize = "maronite")]
  Maronite,
  #[serde(rename = "ukrainian")]
  #[strum(serialize = "ukrainian")]
  Ukrainian,
  #[serde(rename = "coptic")]
  #[strum(serialize = "coptic")]
  Coptic,
  #[serde(rename = "ethiopian")]
  #[strum(serialize = "ethiopian")]
  Ethiopian,
  #[serde(rename = "chaldean")]
  #[strum(serialize = "chaldean")]
  Chaldean,
  #[serde(rename = "other_eastern")]
  #[strum(serialize = "other_eastern")]
  OtherEastern,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The self-editable part of a member record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
  pub name:              String,
  pub surname:           String,
  pub role:              Role,
  pub dob:               NaiveDate,
  pub baptism_date:      NaiveDate,
  pub confirmation_date: NaiveDate,
  pub marriage_date:     Option<NaiveDate>,
  pub occupation:        String,
  pub marital_status:    String,
  pub phone:             String,
  pub father_name:       String,
  pub mother_name:       Option<String>,
  pub rite:              Rite,
  pub parish_origin:     Option<String>,
  pub diocese_origin:    Option<String>,
  pub present_place:     Option<String>,
  pub parish:            Option<String>,
  pub diocese:           Option<String>,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted enrollment document, as returned to clients.
///
/// Carries no password hash; see [`MemberAccount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
  pub id:               Uuid,
  /// Trimmed and lowercased; unique across the store.
  pub email:            String,
  /// Trimmed and uppercased.
  pub family_name:      String,
  #[serde(flatten)]
  pub profile:          MemberProfile,
  pub photo_url:        String,
  /// Deletion handle at the image host. Kept server-side only.
  #[serde(skip_serializing, default)]
  pub photo_storage_id: Option<String>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// A record together with its credential, as read by the login path.
#[derive(Debug, Clone)]
pub struct MemberAccount {
  pub record:        MemberRecord,
  /// argon2 PHC string.
  pub password_hash: String,
}

/// Reference to a photo held by the external image store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPhoto {
  pub url:        String,
  pub storage_id: Option<String>,
}

/// Input to [`crate::store::MemberStore::insert_member`].
/// `id`, `created_at` and `updated_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMember {
  pub email:         String,
  pub family_name:   String,
  pub password_hash: String,
  pub profile:       MemberProfile,
  pub photo:         StoredPhoto,
}

/// Outcome of an insert against the unique email index.
#[derive(Debug, Clone)]
pub enum Insertion {
  Created(MemberRecord),
  /// Another record already holds this email (compared case-insensitively).
  DuplicateEmail,
}

/// Normalise an email for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
