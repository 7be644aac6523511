//! The `MemberStore` trait.
//!
//! Implemented by storage backends (e.g. `kinroll-store-sqlite`). The server
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  member::{Insertion, MemberAccount, MemberProfile, MemberRecord, NewMember},
  toggle::FeatureToggle,
};

/// Abstraction over the record and toggle collections.
///
/// Email uniqueness is the store's job: [`MemberStore::insert_member`] must
/// report [`Insertion::DuplicateEmail`] from its own unique index so two
/// concurrent sign-ups cannot both succeed.
pub trait MemberStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Members ───────────────────────────────────────────────────────────

  /// Persist a new member. `id` and timestamps are assigned here.
  fn insert_member(
    &self,
    input: NewMember,
  ) -> impl Future<Output = Result<Insertion, Self::Error>> + Send + '_;

  /// Retrieve a member by id. Returns `None` if not found.
  fn get_member(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MemberRecord>, Self::Error>> + Send + '_;

  /// Look up a member and their password hash by email (case-insensitive).
  fn find_account<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<MemberAccount>, Self::Error>> + Send + 'a;

  /// All members, newest first.
  fn list_members(
    &self,
  ) -> impl Future<Output = Result<Vec<MemberRecord>, Self::Error>> + Send + '_;

  /// Replace the self-editable profile of a member and bump `updated_at`.
  /// Returns `None` if the member does not exist.
  fn update_profile(
    &self,
    id: Uuid,
    profile: MemberProfile,
  ) -> impl Future<Output = Result<Option<MemberRecord>, Self::Error>> + Send + '_;

  /// Overwrite the password hash of the member with this email.
  /// Returns `false` if no such member exists.
  fn set_password_hash<'a>(
    &'a self,
    email: &'a str,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete a member and return the removed record.
  fn delete_member(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<MemberRecord>, Self::Error>> + Send + '_;

  // ── Toggles ───────────────────────────────────────────────────────────

  /// Read a toggle by name. `None` if it was never written.
  fn get_toggle<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<FeatureToggle>, Self::Error>> + Send + 'a;

  /// Create or overwrite a toggle.
  fn set_toggle<'a>(
    &'a self,
    name: &'a str,
    enabled: bool,
  ) -> impl Future<Output = Result<FeatureToggle, Self::Error>> + Send + 'a;
}
