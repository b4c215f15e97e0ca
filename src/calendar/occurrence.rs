use std::collections::HashMap;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::Error;
use crate::logger::LogExt;

use super::{EventTime, FeedEvent};

/// Upper bound of generated instances per series and sync.
pub const MAX_OCCURRENCES: u16 = 1000;

/// Closed interval `[start, end]` of occurrence start times worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl Window {
  pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self { start, end }
  }

  /// From one day before `now` (so that today's events survive zone skew) up to
  /// `horizon_months` ahead.
  pub fn around(now: DateTime<Utc>, horizon_months: u32) -> Self {
    let end = now
      .checked_add_months(Months::new(horizon_months))
      .unwrap_or(DateTime::<Utc>::MAX_UTC);

    Self::new(now - Duration::days(1), end)
  }

  pub fn contains<T: TimeZone>(&self, date_time: &DateTime<T>) -> bool {
    let date_time = date_time.with_timezone(&Utc);

    self.start <= date_time && date_time <= self.end
  }
}

/// A concrete dated instance of a feed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
  pub start: DateTime<Tz>,
  pub all_day: bool,
}

/// Produces the occurrences of `event` inside `window`, in start order.
///
/// Single events yield at most one occurrence. Series are expanded forward from
/// their first instance, skipping everything before the window and stopping at
/// the first instance after it. `excluded` carries extra exception instants,
/// e.g. instances that the feed overrides with their own component.
///
/// # Errors
/// Returns an error if the start cannot be placed in `tz` or the recurrence rule
/// is rejected.
pub fn expand(
  event: &FeedEvent,
  window: &Window,
  tz: Tz,
  excluded: &[EventTime],
) -> Result<Vec<Occurrence>, Error> {
  if event.cancelled {
    return Ok(Vec::new());
  }

  let all_day = event.is_all_day();

  let rule = match (&event.rrule, event.is_recurring()) {
    (Some(rule), true) => rule,
    _ => {
      let start = event
        .start
        .resolve(tz)
        .ok_or_else(|| Error::parse(format!("start of {} does not exist in {tz}", event.uid)))?;

      return Ok(window
        .contains(&start)
        .then_some(Occurrence { start, all_day })
        .into_iter()
        .collect());
    }
  };

  let rule_set: RRuleSet = rule_set_source(event, rule, tz, excluded).parse()?;

  // bounds are widened by a second, the window check below keeps them closed
  let rrule_tz: rrule::Tz = Utc.into();
  let after = (window.start - Duration::seconds(1)).with_timezone(&rrule_tz);
  let before = (window.end + Duration::seconds(1)).with_timezone(&rrule_tz);

  let result = rule_set.after(after).before(before).all(MAX_OCCURRENCES);

  if result.limited {
    log::warn!("Series {} was cut off after {MAX_OCCURRENCES} occurrences", event.uid);
  }

  Ok(result
    .dates
    .into_iter()
    .map(|date_time| date_time.with_timezone(&tz))
    .skip_while(|start| start.with_timezone(&Utc) < window.start)
    .take_while(|start| start.with_timezone(&Utc) <= window.end)
    .map(|start| Occurrence { start, all_day })
    .collect())
}

/// Expands every event of a feed. Instances that have their own overriding
/// component are dropped from their series, and a failing event is logged and
/// skipped without affecting the others.
pub fn expand_all<'a>(
  events: &'a [FeedEvent],
  window: &Window,
  tz: Tz,
) -> Vec<(&'a FeedEvent, Occurrence)> {
  let mut overridden: HashMap<&str, Vec<EventTime>> = HashMap::new();

  for event in events {
    if let Some(recurrence_id) = &event.recurrence_id {
      overridden
        .entry(event.uid.as_str())
        .or_default()
        .push(recurrence_id.clone());
    }
  }

  events
    .iter()
    .filter_map(|event| {
      let excluded = match event.is_recurring() {
        true => overridden.get(event.uid.as_str()).map_or(&[][..], Vec::as_slice),
        false => &[][..],
      };

      expand(event, window, tz, excluded)
        .log_warn(&format!("Could not expand event {}", event.uid))
        .map(|occurrences| occurrences.into_iter().map(move |occurrence| (event, occurrence)))
    })
    .flatten()
    .collect()
}

fn rule_set_source(event: &FeedEvent, rule: &str, tz: Tz, excluded: &[EventTime]) -> String {
  let mut lines = vec![
    event.start.to_rule_line("DTSTART", tz),
    format!("RRULE:{}", normalize_until(rule, &event.start, tz)),
  ];

  lines.extend(
    event
      .exdates
      .iter()
      .chain(excluded)
      .map(|exdate| exception_line(exdate, &event.start, tz)),
  );

  lines.join("\n")
}

/// Exceptions are matched by instant, so they are written in the series' own
/// form: a date exception of a timed series keeps the series' time of day.
fn exception_line(exdate: &EventTime, start: &EventTime, tz: Tz) -> String {
  let aligned = match (exdate, start) {
    (EventTime::Date(date), EventTime::Utc(start)) => EventTime::Utc(date.and_time(start.time()).and_utc()),
    (EventTime::Date(date), EventTime::Floating(start)) => EventTime::Floating(date.and_time(start.time())),
    (EventTime::Date(date), EventTime::Zoned { date_time, tz }) => EventTime::Zoned {
      date_time: date.and_time(date_time.time()),
      tz: *tz,
    },
    _ => exdate.clone(),
  };

  aligned.to_rule_line("EXDATE", tz)
}

/// Rewrites `UNTIL` to a UTC instant. Feeds write it as a plain date for all-day
/// series and sometimes as floating time, both of which the rule parser rejects
/// next to a zoned start.
fn normalize_until(rule: &str, start: &EventTime, tz: Tz) -> String {
  rule
    .split(';')
    .map(|part| match part.split_once('=') {
      Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") && !value.ends_with('Z') => {
        until_utc(value, start, tz).map_or_else(|| part.to_owned(), |until| format!("UNTIL={until}"))
      }
      _ => part.to_owned(),
    })
    .collect::<Vec<_>>()
    .join(";")
}

fn until_utc(value: &str, start: &EventTime, tz: Tz) -> Option<String> {
  let local = match NaiveDate::parse_from_str(value, "%Y%m%d") {
    Ok(date) => date.and_time(NaiveTime::from_hms_opt(23, 59, 59)?),
    Err(_) => NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?,
  };

  let zone = match start {
    EventTime::Zoned { tz, .. } => *tz,
    _ => tz,
  };

  let until = EventTime::Zoned { date_time: local, tz: zone }.resolve(Tz::UTC)?;

  Some(until.format("%Y%m%dT%H%M%SZ").to_string())
}
