use chrono::{DateTime, Duration, Utc};

/// Whether a sync is due. Forced syncs always run, a store that never synced
/// always runs, otherwise strictly more than `cooldown` has to have passed.
pub fn should_sync(now: DateTime<Utc>, last: Option<DateTime<Utc>>, force: bool, cooldown: Duration) -> bool {
  if force {
    return true;
  }

  last.map_or(true, |last| now - last > cooldown)
}
