use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod reconcile;

pub use reconcile::merge;

pub const ALL_DAY: &str = "all-day";
pub const NO_LINK: &str = "#";
pub const UNTITLED: &str = "Untitled event";
pub const UNKNOWN_LOCATION: &str = "TBD";
pub const MANUAL_PREFIX: &str = "manual_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  Feed,
  Manual,
}

/// One displayed event, either an occurrence from the feed or a manual entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
  pub id: String,
  pub title: String,
  pub description: String,
  /// `YYYY-MM-DD`
  pub date: String,
  /// [`ALL_DAY`], `HH:MM` or `HH:MM - HH:MM`
  pub time: String,
  pub location: String,
  pub register_link: String,
  pub created_at: i64,
  pub source: Source,
}

impl EventRecord {
  pub fn has_link(&self) -> bool {
    self.register_link != NO_LINK && self.register_link.starts_with("http")
  }

  pub const fn is_manual(&self) -> bool {
    matches!(self.source, Source::Manual)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
  pub email: String,
  pub added_by: String,
  pub date_added: DateTime<Utc>,
}

impl AdminRecord {
  pub fn root(email: &str) -> Self {
    Self {
      email: email.to_owned(),
      added_by: "system".to_owned(),
      date_added: DateTime::<Utc>::UNIX_EPOCH,
    }
  }

  pub fn matches(&self, email: &str) -> bool {
    self.email.eq_ignore_ascii_case(email.trim())
  }
}

/// Orders by date, then start time, then id. Dates and times are fixed width,
/// so comparing the strings is enough.
pub fn sort(records: &mut [EventRecord]) {
  records.sort_by(|a, b| {
    a.date
      .cmp(&b.date)
      .then_with(|| a.time.cmp(&b.time))
      .then_with(|| a.id.cmp(&b.id))
  });
}

#[cfg(test)]
pub(crate) fn is_sorted(records: &[EventRecord]) -> bool {
  records
    .windows(2)
    .all(|pair| (&pair[0].date, &pair[0].time) <= (&pair[1].date, &pair[1].time))
}

#[cfg(test)]
pub(crate) fn record(id: &str, date: &str, time: &str, source: Source) -> EventRecord {
  EventRecord {
    id: id.to_owned(),
    title: id.to_owned(),
    description: String::new(),
    date: date.to_owned(),
    time: time.to_owned(),
    location: UNKNOWN_LOCATION.to_owned(),
    register_link: NO_LINK.to_owned(),
    created_at: 0,
    source,
  }
}
