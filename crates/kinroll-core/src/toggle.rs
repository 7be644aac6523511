//! The global feature toggle, a single persisted boolean.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the one toggle document the service reads and writes.
pub const GLOBAL_FEATURE_TOGGLE: &str = "globalFeatureToggle";

/// Whether members may edit their own profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggle {
  pub name:       String,
  pub enabled:    bool,
  pub updated_at: DateTime<Utc>,
}
