use std::sync::LazyLock;

use regex::Regex;

use crate::records::{EventRecord, Source, ALL_DAY, NO_LINK, UNTITLED, UNKNOWN_LOCATION};

use super::{FeedEvent, Occurrence};

static URL_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("valid url regex"));

/// First http(s) URL in `text`, ending at whitespace, angle brackets or quotes.
pub fn extract_link(text: &str) -> Option<&str> {
  URL_PATTERN.find(text).map(|m| m.as_str())
}

/// Turns one occurrence of a feed event into the record that gets stored.
/// Missing fields fall back to placeholders, so this never fails.
pub fn normalize(event: &FeedEvent, occurrence: &Occurrence) -> EventRecord {
  let start = occurrence.start;
  let date = start.format("%Y-%m-%d").to_string();

  let time = if occurrence.all_day {
    ALL_DAY.to_owned()
  } else {
    let end = event
      .span(start.timezone())
      .map(|span| start + span)
      .filter(|end| *end > start && end.date_naive() == start.date_naive());

    match end {
      Some(end) => format!("{} - {}", start.format("%H:%M"), end.format("%H:%M")),
      None => start.format("%H:%M").to_string(),
    }
  };

  let description = event.description.clone().unwrap_or_default();
  let register_link = extract_link(&description)
    .map(str::to_owned)
    .or_else(|| event.url.clone())
    .unwrap_or_else(|| NO_LINK.to_owned());

  EventRecord {
    id: format!("{}_{date}", event.uid),
    title: event.summary.clone().unwrap_or_else(|| UNTITLED.to_owned()),
    description,
    date,
    time,
    location: event.location.clone().unwrap_or_else(|| UNKNOWN_LOCATION.to_owned()),
    register_link,
    created_at: event.created.map_or_else(|| start.timestamp_millis(), |created| created.timestamp_millis()),
    source: Source::Feed,
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, NaiveDateTime, TimeZone};
  use chrono_tz::Tz;

  use super::*;
  use crate::calendar::EventTime;

  fn local(tz: Tz, s: &str) -> chrono::DateTime<Tz> {
    tz.from_local_datetime(&NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap())
      .unwrap()
  }

  fn mixer(tz: Tz) -> FeedEvent {
    FeedEvent {
      uid: "mixer@example.com".to_owned(),
      summary: Some("Alumni Mixer".to_owned()),
      description: None,
      location: None,
      url: None,
      start: EventTime::Zoned {
        date_time: NaiveDateTime::parse_from_str("2025-06-01 18:00", "%Y-%m-%d %H:%M").unwrap(),
        tz,
      },
      end: None,
      duration: None,
      rrule: None,
      exdates: Vec::new(),
      recurrence_id: None,
      created: None,
      cancelled: false,
    }
  }

  #[test]
  fn test_single_event_without_end() {
    let tz = chrono_tz::Asia::Taipei;
    let occurrence = Occurrence { start: local(tz, "2025-06-01 18:00"), all_day: false };

    let record = normalize(&mixer(tz), &occurrence);

    assert_eq!(record.id, "mixer@example.com_2025-06-01");
    assert_eq!(record.title, "Alumni Mixer");
    assert_eq!(record.date, "2025-06-01");
    assert_eq!(record.time, "18:00");
    assert_eq!(record.register_link, NO_LINK);
    assert_eq!(record.location, UNKNOWN_LOCATION);
    assert_eq!(record.description, "");
    assert_eq!(record.source, Source::Feed);
  }

  #[test]
  fn test_normalize_is_idempotent() {
    let tz = chrono_tz::Asia::Taipei;
    let occurrence = Occurrence { start: local(tz, "2025-06-01 18:00"), all_day: false };
    let event = mixer(tz);

    assert_eq!(normalize(&event, &occurrence), normalize(&event, &occurrence));
  }

  #[test]
  fn test_end_from_duration_and_from_end() {
    let tz = Tz::UTC;
    let occurrence = Occurrence { start: local(tz, "2025-06-08 18:00"), all_day: false };

    let mut with_duration = mixer(tz);
    with_duration.duration = Some(Duration::minutes(150));
    assert_eq!(normalize(&with_duration, &occurrence).time, "18:00 - 20:30");

    let mut with_end = mixer(tz);
    with_end.end = Some(EventTime::Zoned {
      date_time: NaiveDateTime::parse_from_str("2025-06-01 21:00", "%Y-%m-%d %H:%M").unwrap(),
      tz,
    });
    assert_eq!(normalize(&with_end, &occurrence).time, "18:00 - 21:00");
  }

  #[test]
  fn test_end_after_midnight_is_dropped() {
    let tz = Tz::UTC;
    let occurrence = Occurrence { start: local(tz, "2025-06-01 18:00"), all_day: false };
    let mut late = mixer(tz);
    late.duration = Some(Duration::hours(7));

    assert_eq!(normalize(&late, &occurrence).time, "18:00");
  }

  #[test]
  fn test_all_day_marker() {
    let tz = Tz::UTC;
    let occurrence = Occurrence { start: local(tz, "2025-06-01 00:00"), all_day: true };

    assert_eq!(normalize(&mixer(tz), &occurrence).time, ALL_DAY);
  }

  #[test]
  fn test_link_from_description_then_url_property() {
    let tz = Tz::UTC;
    let occurrence = Occurrence { start: local(tz, "2025-06-01 18:00"), all_day: false };

    let mut event = mixer(tz);
    event.url = Some("https://example.com/fallback".to_owned());
    assert_eq!(normalize(&event, &occurrence).register_link, "https://example.com/fallback");

    event.description = Some("Register here: https://forms.example.com/x?y=1 thanks".to_owned());
    assert_eq!(normalize(&event, &occurrence).register_link, "https://forms.example.com/x?y=1");
  }

  #[test]
  fn test_extract_link_stops_at_quotes() {
    assert_eq!(
      extract_link(r#"<a href="https://example.com/a">form</a>"#),
      Some("https://example.com/a")
    );
    assert_eq!(extract_link("no link here"), None);
    assert_eq!(extract_link("ftp://example.com"), None);
  }

  #[test]
  fn test_created_at_prefers_created_stamp() {
    let tz = Tz::UTC;
    let occurrence = Occurrence { start: local(tz, "2025-06-01 18:00"), all_day: false };
    let mut event = mixer(tz);

    assert_eq!(normalize(&event, &occurrence).created_at, occurrence.start.timestamp_millis());

    let created = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    event.created = Some(created);
    assert_eq!(normalize(&event, &occurrence).created_at, created.timestamp_millis());
  }
}
