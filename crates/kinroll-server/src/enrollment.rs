//! Sign-up, self-service profile edits and admin password resets.

use bytes::Bytes;
use kinroll_core::{
  media::{ImageFormat, PhotoStore, PhotoUpload},
  member::{Insertion, MemberRecord, NewMember, StoredPhoto, normalize_email},
  store::MemberStore,
  toggle::GLOBAL_FEATURE_TOGGLE,
  validation::{SignupForm, apply_patch, validate_signup},
};
use serde_json::{Map, Value};

use crate::{
  auth::AuthConfig,
  error::{Error, Result},
  password::hash_password,
};

/// A freshly created member together with their first token.
#[derive(Debug, Clone)]
pub struct Enrolled {
  pub token:  String,
  pub record: MemberRecord,
}

fn duplicate_email() -> Error { Error::Conflict("Account already exists with this email.".into()) }

// ─── Enroll ──────────────────────────────────────────────────────────────────

/// Validate a sign-up, upload its photo and create the record.
///
/// Nothing is uploaded or written unless every field rule passes. If the
/// record cannot be written after the upload succeeded, the photo is
/// deleted again.
pub async fn enroll<S, P>(
  store: &S,
  photos: &P,
  auth: &AuthConfig,
  form: &SignupForm,
  photo: Option<Bytes>,
) -> Result<Enrolled>
where
  S: MemberStore,
  P: PhotoStore,
{
  let photo = photo.filter(|bytes| !bytes.is_empty());
  let valid = validate_signup(form, photo.is_some())?;
  let bytes = photo.ok_or_else(|| kinroll_core::Error::MissingFields(vec!["photo"]))?;

  let format = ImageFormat::sniff(&bytes)
    .ok_or_else(|| Error::invalid("photo", "Only JPEG and PNG images are allowed"))?;

  if store.find_account(&valid.email).await.map_err(Error::store)?.is_some() {
    return Err(duplicate_email());
  }

  let password_hash = hash_password(&valid.password)?;

  let stored = photos
    .upload(PhotoUpload { bytes, format })
    .await
    .map_err(Error::upload)?;

  let inserted = store
    .insert_member(NewMember {
      email: valid.email,
      family_name: valid.family_name,
      password_hash,
      profile: valid.profile,
      photo: stored.clone(),
    })
    .await;

  let record = match inserted {
    Ok(Insertion::Created(record)) => record,
    Ok(Insertion::DuplicateEmail) => {
      discard_photo(photos, &stored).await;
      return Err(duplicate_email());
    }
    Err(e) => {
      discard_photo(photos, &stored).await;
      return Err(Error::store(e));
    }
  };

  tracing::info!(member = %record.id, family = %record.family_name, "member enrolled");
  let token = auth.issue_member_token(record.id)?;
  Ok(Enrolled { token, record })
}

/// Best-effort removal of an uploaded photo; failures are only logged.
pub async fn discard_photo<P: PhotoStore>(photos: &P, photo: &StoredPhoto) {
  let Some(storage_id) = photo.storage_id.as_deref() else {
    return;
  };
  if let Err(e) = photos.delete(storage_id).await {
    tracing::warn!(%storage_id, error = %e, "failed to delete photo");
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Apply a member's own patch to their profile.
///
/// With `enforce_toggle` set, edits are refused while the global feature
/// toggle is off.
pub async fn update_profile<S: MemberStore>(
  store: &S,
  enforce_toggle: bool,
  member: &MemberRecord,
  patch: &Map<String, Value>,
) -> Result<MemberRecord> {
  if enforce_toggle {
    let enabled = store
      .get_toggle(GLOBAL_FEATURE_TOGGLE)
      .await
      .map_err(Error::store)?
      .is_some_and(|t| t.enabled);
    if !enabled {
      return Err(Error::Forbidden("Profile editing is currently disabled.".into()));
    }
  }

  let profile = apply_patch(&member.profile, patch)?;

  let updated = store
    .update_profile(member.id, profile)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("User not found.".into()))?;

  tracing::info!(member = %updated.id, "profile updated");
  Ok(updated)
}

// ─── Password reset ──────────────────────────────────────────────────────────

/// Overwrite the password of the member with this email. No knowledge of
/// the old password is needed; callers gate this behind the admin token.
pub async fn update_password<S: MemberStore>(
  store: &S,
  email: &str,
  new_password: &str,
) -> Result<()> {
  let mut missing = Vec::new();
  if email.trim().is_empty() {
    missing.push("email");
  }
  if new_password.trim().is_empty() {
    missing.push("password");
  }
  if !missing.is_empty() {
    return Err(kinroll_core::Error::MissingFields(missing).into());
  }

  let email = normalize_email(email);
  let password_hash = hash_password(new_password)?;

  if !store
    .set_password_hash(&email, password_hash)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::NotFound("User not found.".into()));
  }

  tracing::info!(%email, "password reset");
  Ok(())
}
