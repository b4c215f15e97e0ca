use icalendar::parser::{read_calendar, unfold, Component};

use crate::error::Error;

use super::event_builder::{EventBuilder, EventBuilderError};
use super::FeedEvent;

/// Marker every calendar feed body has to contain.
pub const FEED_MARKER: &str = "BEGIN:VCALENDAR";

/// The parsed feed: usable events plus the components that had to be skipped.
#[derive(Debug, Default)]
pub struct FeedDocument {
  pub events: Vec<FeedEvent>,
  pub skipped: Vec<(Option<String>, EventBuilderError)>,
}

/// Parses a raw feed body.
///
/// # Errors
/// Returns a parse error if the body is not a calendar document at all. Broken
/// individual components are collected in [`FeedDocument::skipped`] instead.
pub fn parse(raw: &str) -> Result<FeedDocument, Error> {
  if !raw.contains(FEED_MARKER) {
    return Err(Error::parse("body has no VCALENDAR"));
  }

  let unfolded = unfold(raw);
  let calendar = read_calendar(&unfolded).map_err(Error::parse)?;

  let mut document = FeedDocument::default();
  let mut vevents = Vec::new();

  for component in &calendar.components {
    collect_vevents(component, &mut vevents);
  }

  for vevent in vevents {
    let builder = EventBuilder::from(vevent);
    let uid = builder.uid.clone();

    match builder.build() {
      Ok(event) => document.events.push(event),
      Err(error) => {
        log::warn!("Skipping event {}: {error}", uid.as_deref().unwrap_or("<no uid>"));
        document.skipped.push((uid, error));
      }
    }
  }

  Ok(document)
}

fn collect_vevents<'a>(component: &'a Component<'a>, vevents: &mut Vec<&'a Component<'a>>) {
  if component.name == "VEVENT" {
    vevents.push(component);
    return;
  }

  for child in &component.components {
    collect_vevents(child, vevents);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_collects_events_and_skips_broken_ones() {
    let raw = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Google Inc//Google Calendar 70.9054//EN\r\n\
BEGIN:VEVENT\r\n\
UID:one\r\n\
SUMMARY:First\r\n\
DTSTART:20250601T100000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:No uid\r\n\
DTSTART:20250602T100000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:three\r\n\
DTSTART;VALUE=DATE:20250603\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    let document = parse(raw).unwrap();

    assert_eq!(document.events.len(), 2);
    assert_eq!(document.events[0].uid, "one");
    assert_eq!(document.events[1].uid, "three");
    assert!(document.events[1].is_all_day());
    assert_eq!(document.skipped, vec![(None, EventBuilderError::NoUid)]);
  }

  #[test]
  fn test_parse_empty_calendar() {
    let document = parse("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n").unwrap();

    assert!(document.events.is_empty());
    assert!(document.skipped.is_empty());
  }

  #[test]
  fn test_parse_rejects_non_calendar() {
    let error = parse("<html><body>rate limited</body></html>").unwrap_err();

    assert_eq!(error.kind, crate::error::ErrorKind::Parse);
  }
}
