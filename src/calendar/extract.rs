use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property};

use super::EventTime;

pub fn property<'a>(component: &'a Component<'a>, name: &str) -> Option<&'a Property<'a>> {
  component.properties.iter().find(|p| p.name == name)
}

pub fn properties<'a>(component: &'a Component<'a>, name: &'a str) -> impl Iterator<Item = &'a Property<'a>> {
  component.properties.iter().filter(move |p| p.name == name)
}

/// Raw value of the first property called `name`.
pub fn value(component: &Component<'_>, name: &str) -> Option<String> {
  property(component, name).map(|p| p.val.to_string())
}

/// TEXT value with RFC 5545 escapes resolved; blank values count as absent.
pub fn text(component: &Component<'_>, name: &str) -> Option<String> {
  value(component, name)
    .map(|raw| unescape(&raw))
    .filter(|text| !text.trim().is_empty())
}

pub fn param(property: &Property<'_>, key: &str) -> Option<String> {
  property
    .params
    .iter()
    .find(|p| p.key == key)
    .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
}

/// First date or date-time of a property, see [`times`].
pub fn time(property: &Property<'_>) -> Option<EventTime> {
  times(property).into_iter().next()
}

/// Parses date and date-time values, handling
/// - `VALUE=DATE` and bare 8-digit dates
/// - `TZID` parameters, unknown zones fall back to floating time
/// - UTC (`Z` suffix) and floating values
/// - comma separated lists as used by `EXDATE`
pub fn times(property: &Property<'_>) -> Vec<EventTime> {
  let tzid = param(property, "TZID");
  let zone = tzid.as_deref().and_then(|tzid| match Tz::from_str(tzid.trim_matches('"')) {
    Ok(tz) => Some(tz),
    Err(_) => {
      log::warn!("Unknown TZID {tzid:?}, treating times as floating");
      None
    }
  });
  let is_date = param(property, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));

  let val: &str = property.val.as_ref();

  val
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .filter_map(|s| parse_time(s, is_date, zone))
    .collect()
}

fn parse_time(s: &str, is_date: bool, zone: Option<Tz>) -> Option<EventTime> {
  if is_date || s.len() == 8 {
    return NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(EventTime::Date);
  }

  if let Some(utc) = s.strip_suffix('Z') {
    return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
      .ok()
      .map(|dt| EventTime::Utc(dt.and_utc()));
  }

  let date_time = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;

  Some(match zone {
    Some(tz) => EventTime::Zoned { date_time, tz },
    None => EventTime::Floating(date_time),
  })
}

/// Timestamp properties such as `CREATED`, always UTC in practice.
pub fn timestamp(component: &Component<'_>, name: &str) -> Option<DateTime<Utc>> {
  match time(property(component, name)?)? {
    EventTime::Utc(dt) => Some(dt),
    EventTime::Floating(dt) | EventTime::Zoned { date_time: dt, .. } => Some(dt.and_utc()),
    EventTime::Date(_) => None,
  }
}

/// `DURATION` value such as `PT1H30M` or `P1D`. Negative durations are rejected.
pub fn duration(raw: &str) -> Option<Duration> {
  let raw = raw.trim();

  if raw.starts_with('-') {
    return None;
  }

  let parsed = iso8601::duration(raw.trim_start_matches('+')).ok()?;
  let std_duration: std::time::Duration = parsed.into();

  Duration::from_std(std_duration).ok()
}

pub fn unescape(raw: &str) -> String {
  let mut text = String::with_capacity(raw.len());
  let mut chars = raw.chars();

  while let Some(c) = chars.next() {
    if c != '\\' {
      text.push(c);
      continue;
    }

    match chars.next() {
      Some('n' | 'N') => text.push('\n'),
      Some(escaped @ (',' | ';' | '\\')) => text.push(escaped),
      Some(other) => {
        text.push('\\');
        text.push(other);
      }
      None => text.push('\\'),
    }
  }

  text
}
