//! Admin dashboard queries: listing, deletion, the feature toggle and the
//! aggregate views.

use chrono::{NaiveDate, Utc};
use kinroll_core::{
  census::{Census, Family, SubmissionFilter, group_families},
  media::PhotoStore,
  member::{MemberRecord, StoredPhoto},
  store::MemberStore,
  toggle::GLOBAL_FEATURE_TOGGLE,
};
use uuid::Uuid;

use crate::{
  enrollment::discard_photo,
  error::{Error, Result},
};

fn today() -> NaiveDate { Utc::now().date_naive() }

/// Every record matching `filter`, newest first.
pub async fn list_all<S: MemberStore>(
  store: &S,
  filter: SubmissionFilter,
) -> Result<Vec<MemberRecord>> {
  let today = today();
  let records = store.list_members().await.map_err(Error::store)?;
  Ok(
    records
      .into_iter()
      .filter(|r| filter.matches(r, today))
      .collect(),
  )
}

/// Delete a record, then its photo. A failed photo delete is logged and
/// does not fail the request.
pub async fn delete_by_id<S, P>(store: &S, photos: &P, id: &str) -> Result<MemberRecord>
where
  S: MemberStore,
  P: PhotoStore,
{
  let id = Uuid::parse_str(id).map_err(|_| Error::invalid("id", "Invalid ID"))?;

  let record = store
    .delete_member(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("Submission not found".into()))?;

  let photo = StoredPhoto {
    url:        record.photo_url.clone(),
    storage_id: record.photo_storage_id.clone(),
  };
  discard_photo(photos, &photo).await;

  tracing::info!(member = %record.id, "submission deleted");
  Ok(record)
}

pub async fn set_toggle<S: MemberStore>(store: &S, enabled: bool) -> Result<bool> {
  let toggle = store
    .set_toggle(GLOBAL_FEATURE_TOGGLE, enabled)
    .await
    .map_err(Error::store)?;
  tracing::info!(enabled = toggle.enabled, "feature toggle written");
  Ok(toggle.enabled)
}

/// The global toggle; `false` until it is first written.
pub async fn get_toggle<S: MemberStore>(store: &S) -> Result<bool> {
  Ok(
    store
      .get_toggle(GLOBAL_FEATURE_TOGGLE)
      .await
      .map_err(Error::store)?
      .is_some_and(|t| t.enabled),
  )
}

pub async fn census<S: MemberStore>(store: &S) -> Result<Census> {
  let records = store.list_members().await.map_err(Error::store)?;
  Ok(Census::tally(&records, today()))
}

pub async fn families<S: MemberStore>(store: &S) -> Result<Vec<Family>> {
  let records = store.list_members().await.map_err(Error::store)?;
  Ok(group_families(records))
}
