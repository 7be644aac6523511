//! Aggregates over member records for the admin dashboard: headline
//! counts, the dashboard's quick filters, and grouping into families.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use strum::EnumString;

use crate::member::MemberRecord;

/// Age at which a member counts as an adult.
pub const ADULT_AGE: u32 = 18;
/// Age at which a member counts as old.
pub const OLD_AGE: u32 = 60;

/// Whole years between `dob` and `today`; zero for dates in the future.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 { today.years_since(dob).unwrap_or(0) }

/// The dashboard's quick filters over the submission list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionFilter {
  #[default]
  All,
  /// Has a marriage date.
  Married,
  Unmarried,
  /// Aged 18 to 59.
  Adults,
  /// Younger than 18.
  Minors,
  /// 60 or older.
  Old,
}

impl SubmissionFilter {
  pub fn matches(self, record: &MemberRecord, today: NaiveDate) -> bool {
    let age = age_on(record.profile.dob, today);
    let married = record.profile.marriage_date.is_some();
    match self {
      Self::All => true,
      Self::Married => married,
      Self::Unmarried => !married,
      Self::Adults => (ADULT_AGE..OLD_AGE).contains(&age),
      Self::Minors => age < ADULT_AGE,
      Self::Old => age >= OLD_AGE,
    }
  }
}

/// Headline counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Census {
  pub total:     usize,
  pub married:   usize,
  pub unmarried: usize,
  pub adults:    usize,
  pub minors:    usize,
  pub old:       usize,
}

impl Census {
  pub fn tally(records: &[MemberRecord], today: NaiveDate) -> Self {
    let count = |filter: SubmissionFilter| {
      records.iter().filter(|r| filter.matches(r, today)).count()
    };
    Self {
      total:     records.len(),
      married:   count(SubmissionFilter::Married),
      unmarried: count(SubmissionFilter::Unmarried),
      adults:    count(SubmissionFilter::Adults),
      minors:    count(SubmissionFilter::Minors),
      old:       count(SubmissionFilter::Old),
    }
  }
}

/// All members sharing a family name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
  pub family_name: String,
  /// Ordered by [`crate::member::Role::rank`], then by given name.
  pub members:     Vec<MemberRecord>,
}

/// Group records into families, alphabetically by family name.
pub fn group_families(records: Vec<MemberRecord>) -> Vec<Family> {
  let mut by_name: BTreeMap<String, Vec<MemberRecord>> = BTreeMap::new();
  for record in records {
    by_name.entry(record.family_name.clone()).or_default().push(record);
  }

  by_name
    .into_iter()
    .map(|(family_name, mut members)| {
      members.sort_by(|a, b| {
        a.profile
          .role
          .rank()
          .cmp(&b.profile.role.rank())
          .then_with(|| a.profile.name.cmp(&b.profile.name))
      });
      Family { family_name, members }
    })
    .collect()
}
