use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;
use crate::records::{self, AdminRecord, EventRecord};

mod file;
#[cfg(test)]
mod memory;

pub use file::FileStore;
#[cfg(test)]
pub use memory::MemoryStore;

pub const EVENTS_KEY: &str = "events";
pub const LAST_SYNC_KEY: &str = "last_sync";
pub const ADMINS_KEY: &str = "admins";

/// Durable string storage addressed by key.
pub trait KeyValue {
  fn get(&self, key: &str) -> Result<Option<String>, Error>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
}

/// Typed access to the persisted events, admins and last sync time.
#[derive(Debug)]
pub struct LocalStore<K> {
  kv: K,
  root_admin: String,
}

impl<K: KeyValue> LocalStore<K> {
  pub fn new(kv: K, root_admin: &str) -> Self {
    Self {
      kv,
      root_admin: root_admin.trim().to_owned(),
    }
  }

  pub fn root_admin(&self) -> &str {
    &self.root_admin
  }

  /// Stored events, an empty list on first use.
  pub fn load_events(&mut self) -> Result<Vec<EventRecord>, Error> {
    match self.read(EVENTS_KEY)? {
      Some(events) => Ok(events),
      None => {
        self.save_events(Vec::new())?;
        Ok(Vec::new())
      }
    }
  }

  /// Replaces the stored events, keeping them sorted.
  pub fn save_events(&mut self, mut events: Vec<EventRecord>) -> Result<Vec<EventRecord>, Error> {
    records::sort(&mut events);
    self.write(EVENTS_KEY, &events)?;

    Ok(events)
  }

  /// Stored administrators. The root administrator is always part of the list.
  pub fn load_admins(&mut self) -> Result<Vec<AdminRecord>, Error> {
    match self.read::<Vec<AdminRecord>>(ADMINS_KEY)? {
      Some(admins) if admins.iter().any(|admin| admin.matches(&self.root_admin)) => Ok(admins),
      Some(admins) => {
        log::warn!("Stored administrators lack the root administrator, restoring it");
        self.save_admins(admins)
      }
      None => self.save_admins(Vec::new()),
    }
  }

  pub fn save_admins(&mut self, mut admins: Vec<AdminRecord>) -> Result<Vec<AdminRecord>, Error> {
    if !admins.iter().any(|admin| admin.matches(&self.root_admin)) {
      admins.insert(0, AdminRecord::root(&self.root_admin));
    }

    self.write(ADMINS_KEY, &admins)?;

    Ok(admins)
  }

  pub fn last_sync(&self) -> Result<Option<DateTime<Utc>>, Error> {
    Ok(self
      .read::<i64>(LAST_SYNC_KEY)?
      .and_then(DateTime::from_timestamp_millis))
  }

  pub fn set_last_sync(&mut self, at: DateTime<Utc>) -> Result<(), Error> {
    self.write(LAST_SYNC_KEY, &at.timestamp_millis())
  }

  fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
    self
      .kv
      .get(key)?
      .map(|raw| serde_json::from_str(&raw).map_err(Error::from))
      .transpose()
  }

  fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), Error> {
    let raw = serde_json::to_string_pretty(value)?;

    self.kv.set(key, &raw)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::records::{record, Source};

  fn store() -> LocalStore<MemoryStore> {
    LocalStore::new(MemoryStore::default(), "root@example.com")
  }

  #[test]
  fn test_first_load_initializes_state() {
    let mut store = store();

    assert!(store.load_events().unwrap().is_empty());
    assert_eq!(store.load_admins().unwrap(), vec![AdminRecord::root("root@example.com")]);
    assert_eq!(store.last_sync().unwrap(), None);
    assert!(store.kv.get(EVENTS_KEY).unwrap().is_some());
    assert!(store.kv.get(ADMINS_KEY).unwrap().is_some());
  }

  #[test]
  fn test_events_are_saved_sorted() {
    let mut store = store();

    store
      .save_events(vec![
        record("b", "2025-02-01", "10:00", Source::Feed),
        record("a", "2025-01-01", "10:00", Source::Manual),
      ])
      .unwrap();

    let ids: Vec<_> = store.load_events().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["a", "b"]);
  }

  #[test]
  fn test_root_admin_is_restored() {
    let mut store = store();
    let other = AdminRecord {
      email: "other@example.com".to_owned(),
      added_by: "root@example.com".to_owned(),
      date_added: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    };
    store.kv.set(ADMINS_KEY, &serde_json::to_string(&vec![other.clone()]).unwrap()).unwrap();

    let admins = store.load_admins().unwrap();

    assert_eq!(admins, vec![AdminRecord::root("root@example.com"), other]);
  }

  #[test]
  fn test_last_sync_round_trip() {
    let mut store = store();
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 30, 0).unwrap();

    store.set_last_sync(at).unwrap();

    assert_eq!(store.last_sync().unwrap(), Some(at));
  }

  #[test]
  fn test_corrupt_events_surface_as_storage_error() {
    let mut store = store();
    store.kv.set(EVENTS_KEY, "{not json").unwrap();

    let error = store.load_events().unwrap_err();

    assert_eq!(error.kind, crate::error::ErrorKind::Storage);
  }
}
