use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::error::{Error, ErrorKind};
use crate::records::{AdminRecord, EventRecord, Source, ALL_DAY, MANUAL_PREFIX, NO_LINK, UNKNOWN_LOCATION};
use crate::store::{KeyValue, LocalStore};

static EMAIL_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid e-mail regex"));

/// Fields of a manually entered event, as typed in by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
  pub title: String,
  pub description: String,
  pub date: String,
  pub time: String,
  pub location: String,
  pub register_link: String,
}

impl EventDraft {
  fn validate(&self) -> Result<(), Error> {
    if self.title.trim().is_empty() {
      return Err(Error::invalid("title must not be empty"));
    }

    NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
      .ok()
      .filter(|date| date.format("%Y-%m-%d").to_string() == self.date)
      .ok_or_else(|| Error::invalid(format!("date {:?} is not YYYY-MM-DD", self.date)))?;

    if !is_valid_time(&self.time) {
      return Err(Error::invalid(format!(
        "time {:?} is not {ALL_DAY}, HH:MM or HH:MM - HH:MM",
        self.time
      )));
    }

    let link = self.register_link.trim();
    if !link.is_empty() && link != NO_LINK && !link.starts_with("http://") && !link.starts_with("https://") {
      return Err(Error::invalid(format!("registration link {link:?} is not a web address")));
    }

    Ok(())
  }

  fn into_record(self, id: String, created_at: i64) -> EventRecord {
    let location = self.location.trim();
    let link = self.register_link.trim();

    EventRecord {
      id,
      title: self.title.trim().to_owned(),
      description: self.description.trim().to_owned(),
      date: self.date,
      time: self.time,
      location: if location.is_empty() { UNKNOWN_LOCATION } else { location }.to_owned(),
      register_link: if link.is_empty() { NO_LINK } else { link }.to_owned(),
      created_at,
      source: Source::Manual,
    }
  }
}

fn is_valid_time(time: &str) -> bool {
  let parse = |part: &str| part.len() == 5 && NaiveTime::parse_from_str(part, "%H:%M").is_ok();

  if time == ALL_DAY {
    return true;
  }

  match time.split_once(" - ") {
    Some((start, end)) => parse(start) && parse(end) && start < end,
    None => parse(time),
  }
}

/// Administrative changes to the stored events and administrators.
#[derive(Debug)]
pub struct Manager<K> {
  store: LocalStore<K>,
}

impl<K: KeyValue> Manager<K> {
  pub const fn new(store: LocalStore<K>) -> Self {
    Self { store }
  }

  pub fn store_mut(&mut self) -> &mut LocalStore<K> {
    &mut self.store
  }

  pub fn events(&mut self) -> Result<Vec<EventRecord>, Error> {
    self.store.load_events()
  }

  /// Stores a new manual event and returns it.
  pub fn add_event(&mut self, draft: EventDraft, now: DateTime<Utc>) -> Result<EventRecord, Error> {
    draft.validate()?;

    let record = draft.into_record(format!("{MANUAL_PREFIX}{}", Uuid::new_v4()), now.timestamp_millis());
    let mut events = self.store.load_events()?;
    events.push(record.clone());
    self.store.save_events(events)?;

    log::info!(id = record.id.as_str(); "Added manual event");

    Ok(record)
  }

  /// Replaces the fields of a manual event. Feed events are read-only.
  pub fn update_event(&mut self, id: &str, draft: EventDraft) -> Result<EventRecord, Error> {
    draft.validate()?;

    let mut events = self.store.load_events()?;
    let existing = manual_event(&mut events, id)?;
    let record = draft.into_record(existing.id.clone(), existing.created_at);
    *existing = record.clone();
    self.store.save_events(events)?;

    log::info!(id = id; "Updated manual event");

    Ok(record)
  }

  pub fn delete_event(&mut self, id: &str) -> Result<EventRecord, Error> {
    let mut events = self.store.load_events()?;
    manual_event(&mut events, id)?;

    let position = events.iter().position(|event| event.id == id).ok_or_else(|| not_found(id))?;
    let removed = events.remove(position);
    self.store.save_events(events)?;

    log::info!(id = id; "Deleted manual event");

    Ok(removed)
  }

  pub fn admins(&mut self) -> Result<Vec<AdminRecord>, Error> {
    self.store.load_admins()
  }

  pub fn is_admin(&mut self, email: &str) -> Result<bool, Error> {
    Ok(self.store.load_admins()?.iter().any(|admin| admin.matches(email)))
  }

  /// Adds an administrator. Adding an existing address (in any letter case)
  /// is a no-op returning the stored record.
  pub fn add_admin(&mut self, email: &str, added_by: &str, now: DateTime<Utc>) -> Result<AdminRecord, Error> {
    let email = email.trim();

    if !EMAIL_PATTERN.is_match(email) {
      return Err(Error::invalid(format!("{email:?} is not an e-mail address")));
    }

    let mut admins = self.store.load_admins()?;

    if let Some(existing) = admins.iter().find(|admin| admin.matches(email)) {
      log::debug!("{email} is already an administrator");
      return Ok(existing.clone());
    }

    let admin = AdminRecord {
      email: email.to_owned(),
      added_by: added_by.trim().to_owned(),
      date_added: now,
    };
    admins.push(admin.clone());
    self.store.save_admins(admins)?;

    log::info!(email = email, added_by = added_by; "Added administrator");

    Ok(admin)
  }

  /// Removes an administrator. The root administrator cannot be removed.
  pub fn remove_admin(&mut self, email: &str) -> Result<AdminRecord, Error> {
    if AdminRecord::root(self.store.root_admin()).matches(email) {
      return Err(Error::new(
        ErrorKind::Forbidden,
        format!("{} is the root administrator and cannot be removed", self.store.root_admin()),
      ));
    }

    let mut admins = self.store.load_admins()?;
    let position = admins
      .iter()
      .position(|admin| admin.matches(email))
      .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("{} is not an administrator", email.trim())))?;
    let removed = admins.remove(position);
    self.store.save_admins(admins)?;

    log::info!(email = removed.email.as_str(); "Removed administrator");

    Ok(removed)
  }
}

fn not_found(id: &str) -> Error {
  Error::new(ErrorKind::NotFound, format!("no event with id {id}"))
}

fn manual_event<'a>(events: &'a mut [EventRecord], id: &str) -> Result<&'a mut EventRecord, Error> {
  let event = events.iter_mut().find(|event| event.id == id).ok_or_else(|| not_found(id))?;

  if event.is_manual() {
    Ok(event)
  } else {
    Err(Error::new(
      ErrorKind::Forbidden,
      format!("event {id} comes from the feed and is replaced on every sync"),
    ))
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::records::{is_sorted, record};
  use crate::store::MemoryStore;

  const ROOT: &str = "root@example.com";

  fn manager() -> Manager<MemoryStore> {
    Manager::new(LocalStore::new(MemoryStore::default(), ROOT))
  }

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
  }

  fn draft(date: &str, time: &str) -> EventDraft {
    EventDraft {
      title: "Reunion dinner".to_owned(),
      date: date.to_owned(),
      time: time.to_owned(),
      ..EventDraft::default()
    }
  }

  #[test]
  fn test_add_event_assigns_manual_id_and_defaults() {
    let mut manager = manager();

    let record = manager.add_event(draft("2025-03-01", "18:30 - 21:00"), now()).unwrap();

    assert!(record.id.starts_with(MANUAL_PREFIX));
    assert_eq!(record.source, Source::Manual);
    assert_eq!(record.location, UNKNOWN_LOCATION);
    assert_eq!(record.register_link, NO_LINK);
    assert_eq!(record.created_at, now().timestamp_millis());
    assert_eq!(manager.events().unwrap(), vec![record]);
  }

  #[test]
  fn test_invalid_drafts_are_rejected() {
    let mut manager = manager();

    for (date, time) in [
      ("2025-02-30", "10:00"),
      ("2025-3-1", "10:00"),
      ("2025-03-01", "25:00"),
      ("2025-03-01", "9:00"),
      ("2025-03-01", "12:00 - 10:00"),
      ("2025-03-01", "evening"),
    ] {
      let error = manager.add_event(draft(date, time), now()).unwrap_err();
      assert_eq!(error.kind, ErrorKind::Invalid, "{date} {time}");
    }

    let mut untitled = draft("2025-03-01", ALL_DAY);
    untitled.title = "  ".to_owned();
    assert_eq!(manager.add_event(untitled, now()).unwrap_err().kind, ErrorKind::Invalid);

    let mut bad_link = draft("2025-03-01", ALL_DAY);
    bad_link.register_link = "javascript:alert(1)".to_owned();
    assert_eq!(manager.add_event(bad_link, now()).unwrap_err().kind, ErrorKind::Invalid);

    assert!(manager.events().unwrap().is_empty());
  }

  #[test]
  fn test_update_keeps_id_and_created_at() {
    let mut manager = manager();
    let added = manager.add_event(draft("2025-03-01", "10:00"), now()).unwrap();

    let mut changed = draft("2025-02-01", ALL_DAY);
    changed.register_link = "https://forms.example.com/reunion".to_owned();
    let updated = manager.update_event(&added.id, changed).unwrap();

    assert_eq!(updated.id, added.id);
    assert_eq!(updated.created_at, added.created_at);
    assert_eq!(updated.date, "2025-02-01");
    assert!(updated.has_link());
  }

  #[test]
  fn test_feed_events_are_read_only() {
    let mut manager = manager();
    let feed = record("mixer@example.com_2025-06-01", "2025-06-01", "18:00", Source::Feed);
    manager.store_mut().save_events(vec![feed.clone()]).unwrap();

    let update = manager.update_event(&feed.id, draft("2025-06-01", "19:00")).unwrap_err();
    let delete = manager.delete_event(&feed.id).unwrap_err();

    assert_eq!(update.kind, ErrorKind::Forbidden);
    assert_eq!(delete.kind, ErrorKind::Forbidden);
    assert_eq!(manager.events().unwrap(), vec![feed]);
  }

  #[test]
  fn test_delete_event_keeps_order() {
    let mut manager = manager();
    let first = manager.add_event(draft("2025-03-01", "10:00"), now()).unwrap();
    manager.add_event(draft("2025-01-01", "10:00"), now()).unwrap();
    manager.add_event(draft("2025-02-01", "10:00"), now()).unwrap();

    assert_eq!(manager.delete_event(&first.id).unwrap(), first);
    assert_eq!(manager.delete_event(&first.id).unwrap_err().kind, ErrorKind::NotFound);

    let events = manager.events().unwrap();
    assert_eq!(events.len(), 2);
    assert!(is_sorted(&events));
  }

  #[test]
  fn test_add_admin_deduplicates_case_insensitively() {
    let mut manager = manager();

    let added = manager.add_admin("Jane@Example.com", ROOT, now()).unwrap();
    let again = manager.add_admin(" jane@example.COM ", ROOT, now()).unwrap();

    assert_eq!(added, again);
    assert_eq!(manager.admins().unwrap().len(), 2);
    assert!(manager.is_admin("JANE@example.com").unwrap());
    assert_eq!(manager.add_admin("not-an-address", ROOT, now()).unwrap_err().kind, ErrorKind::Invalid);
  }

  #[test]
  fn test_root_admin_cannot_be_removed() {
    let mut manager = manager();
    manager.add_admin("jane@example.com", ROOT, now()).unwrap();
    let before = manager.admins().unwrap();

    let error = manager.remove_admin("ROOT@example.com").unwrap_err();

    assert_eq!(error.kind, ErrorKind::Forbidden);
    assert!(error.message.contains("root administrator"));
    assert_eq!(manager.admins().unwrap(), before);
  }

  #[test]
  fn test_remove_admin() {
    let mut manager = manager();
    manager.add_admin("jane@example.com", ROOT, now()).unwrap();

    assert_eq!(manager.remove_admin("jane@example.com").unwrap().email, "jane@example.com");
    assert_eq!(manager.remove_admin("jane@example.com").unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(manager.admins().unwrap(), vec![AdminRecord::root(ROOT)]);
  }
}
