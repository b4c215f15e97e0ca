use std::fmt::Write as _;

use crate::records::{AdminRecord, EventRecord, Source};

/// One line per event, grouped under a heading per date.
pub fn events(events: &[EventRecord]) -> String {
  if events.is_empty() {
    return "No upcoming events.\n".to_owned();
  }

  let mut out = String::new();
  let mut date = None;

  for event in events {
    if date != Some(event.date.as_str()) {
      if date.is_some() {
        out.push('\n');
      }
      let _ = writeln!(out, "{}", event.date);
      date = Some(event.date.as_str());
    }

    let marker = match event.source {
      Source::Feed => ' ',
      Source::Manual => '*',
    };
    let _ = writeln!(out, " {marker} {:<13}  {}  @ {}", event.time, event.title, event.location);

    if event.has_link() {
      let _ = writeln!(out, "   {:<13}  {}", "", event.register_link);
    }
  }

  out
}

pub fn event(event: &EventRecord) -> String {
  let mut out = String::new();

  let _ = writeln!(out, "{} ({})", event.title, event.id);
  let _ = writeln!(out, "  when:     {} {}", event.date, event.time);
  let _ = writeln!(out, "  where:    {}", event.location);
  if event.has_link() {
    let _ = writeln!(out, "  register: {}", event.register_link);
  }
  if !event.description.is_empty() {
    let _ = writeln!(out, "\n{}", event.description);
  }

  out
}

pub fn admins(admins: &[AdminRecord]) -> String {
  admins.iter().fold(String::new(), |mut out, admin| {
    let _ = writeln!(
      out,
      "{:<32} added by {} on {}",
      admin.email,
      admin.added_by,
      admin.date_added.format("%Y-%m-%d")
    );
    out
  })
}
