use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use url::Url;

use crate::calendar::{self, Retriever, Transport, Window};
use crate::config::Config;
use crate::error::Error;
use crate::records::{self, EventRecord};
use crate::store::{KeyValue, LocalStore};

pub mod gate;

pub use gate::should_sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
  pub feed: Url,
  pub cooldown: Duration,
  pub horizon_months: u32,
  pub timezone: Tz,
}

impl From<&Config> for SyncSettings {
  fn from(config: &Config) -> Self {
    Self {
      feed: config.feed.url.clone(),
      cooldown: i64::try_from(config.sync.cooldown)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX),
      horizon_months: config.sync.horizon_months,
      timezone: config.timezone,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
  /// The feed was fetched and merged into the store.
  Fresh { count: usize, skipped: usize },
  /// The cooldown has not passed yet.
  Skipped,
  /// Retrieval or parsing failed, the stored events are unchanged.
  Failed(Error),
}

/// What a sync did, and the events the caller should show afterwards.
#[derive(Debug, Clone)]
pub struct SyncReport {
  pub outcome: SyncOutcome,
  pub events: Vec<EventRecord>,
}

/// Runs the gate, fetch, parse, expand, normalize and merge steps against a store.
#[derive(Debug)]
pub struct Synchronizer<T> {
  retriever: Retriever<T>,
  settings: SyncSettings,
}

impl<T: Transport> Synchronizer<T> {
  pub const fn new(retriever: Retriever<T>, settings: SyncSettings) -> Self {
    Self {
      retriever,
      settings,
    }
  }

  /// Syncs when due (or when `force` is set) and returns the resulting events.
  ///
  /// A failing fetch or parse does not fail the call: the outcome is
  /// [`SyncOutcome::Failed`] and the last stored events are returned.
  ///
  /// # Errors
  /// Returns an error only if the store itself cannot be read.
  pub fn sync<K: KeyValue>(
    &self,
    store: &mut LocalStore<K>,
    now: DateTime<Utc>,
    force: bool,
  ) -> Result<SyncReport, Error> {
    let last = store.last_sync()?;

    if !should_sync(now, last, force, self.settings.cooldown) {
      log::debug!("Last sync at {last:?} is recent, using stored events");

      return Ok(SyncReport {
        outcome: SyncOutcome::Skipped,
        events: store.load_events()?,
      });
    }

    match self.refresh(store, now) {
      Ok((events, skipped)) => {
        log::info!(count = events.len(), skipped = skipped; "Sync finished");

        Ok(SyncReport {
          outcome: SyncOutcome::Fresh {
            count: events.len(),
            skipped,
          },
          events,
        })
      }
      Err(e) => {
        log::warn!("Sync failed, keeping stored events: {e}");

        Ok(SyncReport {
          outcome: SyncOutcome::Failed(e),
          events: store.load_events()?,
        })
      }
    }
  }

  fn refresh<K: KeyValue>(
    &self,
    store: &mut LocalStore<K>,
    now: DateTime<Utc>,
  ) -> Result<(Vec<EventRecord>, usize), Error> {
    let body = self.retriever.fetch(&self.settings.feed, now)?;
    let document = calendar::parse(&body)?;

    let window = Window::around(now, self.settings.horizon_months);
    let feed: Vec<EventRecord> = calendar::expand_all(&document.events, &window, self.settings.timezone)
      .into_iter()
      .map(|(event, occurrence)| calendar::normalize(event, &occurrence))
      .collect();

    let existing = store.load_events()?;
    let events = store.save_events(records::merge(feed, existing))?;
    store.set_last_sync(now)?;

    Ok((events, document.skipped.len()))
  }
}
