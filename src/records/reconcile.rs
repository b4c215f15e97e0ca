use std::collections::HashSet;

use super::{sort, EventRecord};

/// Combines a fresh batch of feed records with the stored records.
///
/// Stored feed records are dropped and replaced by `feed` as a whole, so edits
/// and deletions on the source calendar carry over. Manual records survive.
/// The result has unique ids (first one wins) and is sorted.
pub fn merge(feed: Vec<EventRecord>, existing: Vec<EventRecord>) -> Vec<EventRecord> {
  let mut seen = HashSet::new();

  let mut merged: Vec<EventRecord> = feed
    .into_iter()
    .filter(|record| !record.is_manual())
    .chain(existing.into_iter().filter(EventRecord::is_manual))
    .filter(|record| {
      let fresh = seen.insert(record.id.clone());

      if !fresh {
        log::debug!("Dropping duplicate event {}", record.id);
      }

      fresh
    })
    .collect();

  sort(&mut merged);

  merged
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::records::{is_sorted, record, Source};

  #[test]
  fn test_feed_records_are_replaced_and_manual_kept() {
    let existing = vec![
      record("old_2025-01-01", "2025-01-01", "10:00", Source::Feed),
      record("manual_1", "2025-01-20", "12:00", Source::Manual),
    ];
    let feed = vec![
      record("new_2025-01-25", "2025-01-25", "09:00", Source::Feed),
      record("new_2025-01-10", "2025-01-10", "09:00", Source::Feed),
    ];

    let merged = merge(feed, existing);

    let ids: Vec<_> = merged.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["new_2025-01-10", "manual_1", "new_2025-01-25"]);
    assert!(is_sorted(&merged));
  }

  #[test]
  fn test_duplicate_ids_are_dropped() {
    let mut second = record("a_2025-01-10", "2025-01-10", "11:00", Source::Feed);
    second.title = "second".to_owned();
    let feed = vec![record("a_2025-01-10", "2025-01-10", "09:00", Source::Feed), second];

    let merged = merge(feed, Vec::new());

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].time, "09:00");
  }

  #[test]
  fn test_merge_is_repeatable() {
    let feed = vec![
      record("b_2025-03-01", "2025-03-01", "all-day", Source::Feed),
      record("a_2025-02-01", "2025-02-01", "10:00", Source::Feed),
    ];
    let manual = vec![record("manual_x", "2025-02-15", "10:00", Source::Manual)];

    let once = merge(feed.clone(), manual);
    let twice = merge(feed, once.clone());

    assert_eq!(
      serde_json::to_string(&once).unwrap(),
      serde_json::to_string(&twice).unwrap()
    );
  }

  #[test]
  fn test_empty_feed_clears_feed_records() {
    let existing = vec![
      record("old_2025-01-01", "2025-01-01", "10:00", Source::Feed),
      record("manual_1", "2025-01-20", "12:00", Source::Manual),
    ];

    let merged = merge(Vec::new(), existing);

    assert_eq!(merged.len(), 1);
    assert!(merged[0].is_manual());
  }
}
