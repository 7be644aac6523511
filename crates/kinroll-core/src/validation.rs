//! Field rules for sign-up forms and self-service profile patches.
//!
//! Both entry points report every violation they find, never just the
//! first one.

use std::{str::FromStr, sync::LazyLock};

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use strum::VariantNames;

use crate::{
  Error, Result,
  error::Violations,
  member::{MemberProfile, Rite, Role, normalize_email},
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Minimum number of characters in a family name.
pub const FAMILY_NAME_MIN_LEN: usize = 2;

/// Keys a member may never change through a profile patch. They are dropped
/// without complaint.
pub const PATCH_DISALLOWED: &[&str] = &[
  "password",
  "passwordHash",
  "email",
  "familyName",
  "photo",
  "photoUrl",
  "photoStorageId",
  "public_id",
  "id",
  "_id",
  "__v",
  "createdAt",
  "updatedAt",
];

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_PATTERN.is_match(email)
}

// ─── Sign-up ─────────────────────────────────────────────────────────────────

/// Raw sign-up input as submitted by the enrollment form. Every field is
/// optional here so that missing ones can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
  pub name:              Option<String>,
  pub surname:           Option<String>,
  pub family_name:       Option<String>,
  pub email:             Option<String>,
  pub password:          Option<String>,
  pub dob:               Option<String>,
  #[serde(alias = "baptism")]
  pub baptism_date:      Option<String>,
  #[serde(alias = "confirmation")]
  pub confirmation_date: Option<String>,
  #[serde(alias = "marriage")]
  pub marriage_date:     Option<String>,
  pub occupation:        Option<String>,
  #[serde(alias = "status")]
  pub marital_status:    Option<String>,
  pub phone:             Option<String>,
  #[serde(alias = "father")]
  pub father_name:       Option<String>,
  #[serde(alias = "mother")]
  pub mother_name:       Option<String>,
  pub rite:              Option<String>,
  pub role:              Option<String>,
  pub parish_origin:     Option<String>,
  pub diocese_origin:    Option<String>,
  pub present_place:     Option<String>,
  pub parish:            Option<String>,
  pub diocese:           Option<String>,
}

/// A sign-up that passed every field rule, already normalised.
#[derive(Debug, Clone)]
pub struct ValidSignup {
  /// Trimmed and lowercased.
  pub email:       String,
  /// Exactly as submitted.
  pub password:    String,
  /// Trimmed and uppercased.
  pub family_name: String,
  pub profile:     MemberProfile,
}

/// Check a sign-up form.
///
/// Missing fields are reported first, as [`Error::MissingFields`]; only a
/// complete form is checked against the remaining rules, which are reported
/// together as [`Error::Invalid`].
pub fn validate_signup(form: &SignupForm, has_photo: bool) -> Result<ValidSignup> {
  let required: [(&'static str, &Option<String>); 14] = [
    ("name", &form.name),
    ("surname", &form.surname),
    ("familyName", &form.family_name),
    ("email", &form.email),
    ("password", &form.password),
    ("dob", &form.dob),
    ("baptismDate", &form.baptism_date),
    ("confirmationDate", &form.confirmation_date),
    ("occupation", &form.occupation),
    ("maritalStatus", &form.marital_status),
    ("phone", &form.phone),
    ("fatherName", &form.father_name),
    ("rite", &form.rite),
    ("role", &form.role),
  ];

  let mut missing: Vec<&'static str> = required
    .iter()
    .filter(|(_, value)| trimmed(value).is_none())
    .map(|(field, _)| *field)
    .collect();
  if !has_photo {
    missing.push("photo");
  }
  if !missing.is_empty() {
    return Err(Error::MissingFields(missing));
  }

  let mut violations = Violations::new();

  let email = normalize_email(text(&form.email));
  if !is_valid_email(&email) {
    violations.push("email", "Invalid email format");
  }

  let family_name = text(&form.family_name).to_uppercase();
  if family_name.chars().count() < FAMILY_NAME_MIN_LEN {
    violations.push(
      "familyName",
      format!("familyName must be at least {FAMILY_NAME_MIN_LEN} characters"),
    );
  }

  let dob = parse_date("dob", text(&form.dob), &mut violations);
  let baptism = parse_date("baptismDate", text(&form.baptism_date), &mut violations);
  let confirmation = parse_date(
    "confirmationDate",
    text(&form.confirmation_date),
    &mut violations,
  );
  let marriage = trimmed(&form.marriage_date)
    .and_then(|s| parse_date("marriageDate", s, &mut violations));
  let role = parse_enum::<Role>("role", text(&form.role), &mut violations);
  let rite = parse_enum::<Rite>("rite", text(&form.rite), &mut violations);

  let (Some(dob), Some(baptism_date), Some(confirmation_date), Some(role), Some(rite)) =
    (dob, baptism, confirmation, role, rite)
  else {
    return Err(Error::Invalid(violations));
  };
  violations.into_result().map_err(Error::Invalid)?;

  Ok(ValidSignup {
    email,
    password: form.password.clone().unwrap_or_default(),
    family_name,
    profile: MemberProfile {
      name: text(&form.name).to_owned(),
      surname: text(&form.surname).to_owned(),
      role,
      dob,
      baptism_date,
      confirmation_date,
      marriage_date: marriage,
      occupation: text(&form.occupation).to_owned(),
      marital_status: text(&form.marital_status).to_owned(),
      phone: text(&form.phone).to_owned(),
      father_name: text(&form.father_name).to_owned(),
      mother_name: optional(&form.mother_name),
      rite,
      parish_origin: optional(&form.parish_origin),
      diocese_origin: optional(&form.diocese_origin),
      present_place: optional(&form.present_place),
      parish: optional(&form.parish),
      diocese: optional(&form.diocese),
    },
  })
}

// ─── Profile patches ─────────────────────────────────────────────────────────

/// The profile fields a patch may address, under their canonical names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileField {
  Name,
  Surname,
  Role,
  Dob,
  BaptismDate,
  ConfirmationDate,
  MarriageDate,
  Occupation,
  MaritalStatus,
  Phone,
  FatherName,
  MotherName,
  Rite,
  ParishOrigin,
  DioceseOrigin,
  PresentPlace,
  Parish,
  Diocese,
}

impl ProfileField {
  fn from_key(key: &str) -> Option<Self> {
    let field = match key {
      "name" => Self::Name,
      "surname" => Self::Surname,
      "role" => Self::Role,
      "dob" => Self::Dob,
      "baptismDate" | "baptism" => Self::BaptismDate,
      "confirmationDate" | "confirmation" => Self::ConfirmationDate,
      "marriageDate" | "marriage" => Self::MarriageDate,
      "occupation" => Self::Occupation,
      "maritalStatus" | "status" => Self::MaritalStatus,
      "phone" => Self::Phone,
      "fatherName" | "father" => Self::FatherName,
      "motherName" | "mother" => Self::MotherName,
      "rite" => Self::Rite,
      "parishOrigin" => Self::ParishOrigin,
      "dioceseOrigin" => Self::DioceseOrigin,
      "presentPlace" => Self::PresentPlace,
      "parish" => Self::Parish,
      "diocese" => Self::Diocese,
      _ => return None,
    };
    Some(field)
  }

  fn name(self) -> &'static str {
    match self {
      Self::Name => "name",
      Self::Surname => "surname",
      Self::Role => "role",
      Self::Dob => "dob",
      Self::BaptismDate => "baptismDate",
      Self::ConfirmationDate => "confirmationDate",
      Self::MarriageDate => "marriageDate",
      Self::Occupation => "occupation",
      Self::MaritalStatus => "maritalStatus",
      Self::Phone => "phone",
      Self::FatherName => "fatherName",
      Self::MotherName => "motherName",
      Self::Rite => "rite",
      Self::ParishOrigin => "parishOrigin",
      Self::DioceseOrigin => "dioceseOrigin",
      Self::PresentPlace => "presentPlace",
      Self::Parish => "parish",
      Self::Diocese => "diocese",
    }
  }
}

/// Apply a JSON patch to a profile and re-check every rule.
///
/// Keys in [`PATCH_DISALLOWED`] and keys that name no profile field are
/// dropped. Fails with [`Error::EmptyPatch`] when nothing is left.
pub fn apply_patch(
  current: &MemberProfile,
  patch: &Map<String, Value>,
) -> Result<MemberProfile> {
  let entries: Vec<(ProfileField, &Value)> = patch
    .iter()
    .filter(|(key, _)| !PATCH_DISALLOWED.contains(&key.as_str()))
    .filter_map(|(key, value)| ProfileField::from_key(key).map(|f| (f, value)))
    .collect();

  if entries.is_empty() {
    return Err(Error::EmptyPatch);
  }

  let mut next = current.clone();
  let mut violations = Violations::new();

  for (field, value) in entries {
    let name = field.name();
    let Some(value) = patch_text(name, value, &mut violations) else {
      continue;
    };

    if let Some(slot) = optional_slot(&mut next, field) {
      *slot = value;
      continue;
    }

    if field == ProfileField::MarriageDate {
      match value {
        None => next.marriage_date = None,
        Some(raw) => {
          if let Some(date) = parse_date(name, &raw, &mut violations) {
            next.marriage_date = Some(date);
          }
        }
      }
      continue;
    }

    let Some(raw) = required_text(name, value, &mut violations) else {
      continue;
    };

    match field {
      ProfileField::Dob | ProfileField::BaptismDate | ProfileField::ConfirmationDate => {
        let Some(date) = parse_date(name, &raw, &mut violations) else {
          continue;
        };
        match field {
          ProfileField::Dob => next.dob = date,
          ProfileField::BaptismDate => next.baptism_date = date,
          _ => next.confirmation_date = date,
        }
      }
      ProfileField::Role => {
        if let Some(role) = parse_enum::<Role>(name, &raw, &mut violations) {
          next.role = role;
        }
      }
      ProfileField::Rite => {
        if let Some(rite) = parse_enum::<Rite>(name, &raw, &mut violations) {
          next.rite = rite;
        }
      }
      _ => {
        if let Some(slot) = text_slot(&mut next, field) {
          *slot = raw;
        }
      }
    }
  }

  violations.into_result().map_err(Error::Invalid)?;
  Ok(next)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn text_slot(profile: &mut MemberProfile, field: ProfileField) -> Option<&mut String> {
  match field {
    ProfileField::Name => Some(&mut profile.name),
    ProfileField::Surname => Some(&mut profile.surname),
    ProfileField::Occupation => Some(&mut profile.occupation),
    ProfileField::MaritalStatus => Some(&mut profile.marital_status),
    ProfileField::Phone => Some(&mut profile.phone),
    ProfileField::FatherName => Some(&mut profile.father_name),
    _ => None,
  }
}

fn optional_slot(
  profile: &mut MemberProfile,
  field: ProfileField,
) -> Option<&mut Option<String>> {
  match field {
    ProfileField::MotherName => Some(&mut profile.mother_name),
    ProfileField::ParishOrigin => Some(&mut profile.parish_origin),
    ProfileField::DioceseOrigin => Some(&mut profile.diocese_origin),
    ProfileField::PresentPlace => Some(&mut profile.present_place),
    ProfileField::Parish => Some(&mut profile.parish),
    ProfileField::Diocese => Some(&mut profile.diocese),
    _ => None,
  }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// A field already known to be present.
fn text(value: &Option<String>) -> &str { trimmed(value).unwrap_or_default() }

fn optional(value: &Option<String>) -> Option<String> {
  trimmed(value).map(str::to_owned)
}

/// Read a patch value as trimmed text. `Some(None)` clears the field;
/// `None` means the value was rejected.
fn patch_text(
  field: &str,
  value: &Value,
  violations: &mut Violations,
) -> Option<Option<String>> {
  match value {
    Value::Null => Some(None),
    Value::String(s) => {
      let s = s.trim();
      Some((!s.is_empty()).then(|| s.to_owned()))
    }
    _ => {
      violations.push(field, format!("{field} must be a string"));
      None
    }
  }
}

fn required_text(
  field: &str,
  value: Option<String>,
  violations: &mut Violations,
) -> Option<String> {
  if value.is_none() {
    violations.push(field, format!("{field} is required"));
  }
  value
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, whose date part is kept.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_date(field: &str, raw: &str, violations: &mut Violations) -> Option<NaiveDate> {
  let date = parse_date_str(raw);
  if date.is_none() {
    violations.push(field, format!("{field} must be a date (YYYY-MM-DD)"));
  }
  date
}

fn parse_enum<T>(field: &str, raw: &str, violations: &mut Violations) -> Option<T>
where
  T: FromStr + VariantNames,
{
  let parsed = T::from_str(&raw.to_lowercase()).ok();
  if parsed.is_none() {
    violations.push(
      field,
      format!("{field} must be one of: {}", T::VARIANTS.join(", ")),
    );
  }
  parsed
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn complete_form() -> SignupForm {
    SignupForm {
      name:              Some("Mary".into()),
      surname:           Some("Smith".into()),
      family_name:       Some("smith ".into()),
      email:             Some(" Mary@Example.com ".into()),
      password:          Some("hunter22".into()),
      dob:               Some("1985-04-12".into()),
      baptism_date:      Some("1985-06-01".into()),
      confirmation_date: Some("1997-05-18".into()),
      marriage_date:     Some("".into()),
      occupation:        Some(" Nurse ".into()),
      marital_status:    Some("single".into()),
      phone:             Some("+1 555 0100".into()),
      father_name:       Some("Joseph".into()),
      mother_name:       None,
      rite:              Some("latin".into()),
      role:              Some("self".into()),
      parish_origin:     Some("  ".into()),
      diocese_origin:    None,
      present_place:     Some("Kochi".into()),
      parish:            None,
      diocese:           None,
    }
  }

  #[test]
  fn complete_form_is_normalised() {
    let valid = validate_signup(&complete_form(), true).unwrap();
    assert_eq!(valid.email, "mary@example.com");
    assert_eq!(valid.family_name, "SMITH");
    assert_eq!(valid.profile.occupation, "Nurse");
    assert_eq!(valid.profile.role, Role::Oneself);
    assert_eq!(valid.profile.marriage_date, None);
    assert_eq!(valid.profile.parish_origin, None);
    assert_eq!(valid.profile.present_place.as_deref(), Some("Kochi"));
  }

  #[test]
  fn every_missing_field_is_listed() {
    let mut form = complete_form();
    form.phone = None;
    form.surname = Some("   ".into());

    match validate_signup(&form, false) {
      Err(Error::MissingFields(fields)) => {
        assert_eq!(fields, vec!["surname", "phone", "photo"]);
      }
      other => panic!("expected missing fields, got {other:?}"),
    }
  }

  #[test]
  fn empty_form_lists_all_fifteen_fields() {
    match validate_signup(&SignupForm::default(), false) {
      Err(Error::MissingFields(fields)) => assert_eq!(fields.len(), 15),
      other => panic!("expected missing fields, got {other:?}"),
    }
  }

  #[test]
  fn rule_violations_are_reported_together() {
    let mut form = complete_form();
    form.email = Some("not-an-email".into());
    form.dob = Some("12/04/1985".into());
    form.role = Some("cousin".into());
    form.family_name = Some("x".into());

    match validate_signup(&form, true) {
      Err(Error::Invalid(v)) => {
        assert_eq!(v.len(), 4);
        assert!(v.contains_field("email"));
        assert!(v.contains_field("dob"));
        assert!(v.contains_field("role"));
        assert!(v.contains_field("familyName"));
      }
      other => panic!("expected violations, got {other:?}"),
    }
  }

  #[test]
  fn email_pattern() {
    assert_eq!(EMAIL_PATTERN.as_str(), r"^[^\s@]+@[^\s@]+\.[^\s@]+$");
    assert!(is_valid_email("a@b.com"));
    assert!(is_valid_email("first.last+tag@sub.example.org"));
    assert!(!is_valid_email(""));
    assert!(!is_valid_email("a@@b.com"));
    assert!(!is_valid_email("a@b"));
    assert!(!is_valid_email("a b@c.com"));
    assert!(!is_valid_email("@c.com"));
  }

  #[test]
  fn legacy_field_aliases_are_accepted() {
    let form: SignupForm = serde_json::from_value(json!({
      "baptism": "2000-01-01",
      "confirmation": "2010-01-01",
      "status": "married",
      "father": "Paul",
      "mother": "Rose",
    }))
    .unwrap();
    assert_eq!(form.baptism_date.as_deref(), Some("2000-01-01"));
    assert_eq!(form.marital_status.as_deref(), Some("married"));
    assert_eq!(form.mother_name.as_deref(), Some("Rose"));
  }

  #[test]
  fn rfc3339_dates_keep_their_date_part() {
    assert_eq!(
      parse_date_str("1990-02-03T00:00:00.000Z"),
      NaiveDate::from_ymd_opt(1990, 2, 3)
    );
  }

  // ── Patches ───────────────────────────────────────────────────────────────

  fn profile() -> MemberProfile { validate_signup(&complete_form(), true).unwrap().profile }

  fn patch(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => unreachable!(),
    }
  }

  #[test]
  fn disallowed_keys_are_dropped() {
    let current = profile();
    let next = apply_patch(
      &current,
      &patch(json!({ "email": "x@y.com", "familyName": "JONES", "phone": "123" })),
    )
    .unwrap();
    assert_eq!(next.phone, "123");
    assert_eq!(next.name, current.name);
  }

  #[test]
  fn patch_of_only_disallowed_keys_is_empty() {
    let result = apply_patch(
      &profile(),
      &patch(json!({ "password": "x", "photo": "y", "id": "z", "bogus": 1 })),
    );
    assert!(matches!(result, Err(Error::EmptyPatch)));
  }

  #[test]
  fn patch_violations_are_reported_together() {
    let result = apply_patch(
      &profile(),
      &patch(json!({ "name": "", "rite": "druid", "dob": "yesterday", "phone": 5 })),
    );
    match result {
      Err(Error::Invalid(v)) => {
        assert_eq!(v.len(), 4);
        assert!(v.contains_field("name"));
        assert!(v.contains_field("rite"));
        assert!(v.contains_field("dob"));
        assert!(v.contains_field("phone"));
      }
      other => panic!("expected violations, got {other:?}"),
    }
  }

  #[test]
  fn optional_fields_can_be_set_and_cleared() {
    let next = apply_patch(
      &profile(),
      &patch(json!({ "marriage": "2015-09-12", "mother": "Anna", "presentPlace": null })),
    )
    .unwrap();
    assert_eq!(next.marriage_date, NaiveDate::from_ymd_opt(2015, 9, 12));
    assert_eq!(next.mother_name.as_deref(), Some("Anna"));
    assert_eq!(next.present_place, None);

    let cleared = apply_patch(&next, &patch(json!({ "marriageDate": "" }))).unwrap();
    assert_eq!(cleared.marriage_date, None);
  }

  #[test]
  fn role_is_case_insensitive() {
    let next = apply_patch(&profile(), &patch(json!({ "role": "Grandparent" }))).unwrap();
    assert_eq!(next.role, Role::Grandparent);
  }
}
