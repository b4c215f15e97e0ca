use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A start, end or exception value as written in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
  Date(NaiveDate),
  Utc(DateTime<Utc>),
  Floating(NaiveDateTime),
  Zoned { date_time: NaiveDateTime, tz: Tz },
}

impl EventTime {
  pub const fn is_date(&self) -> bool {
    matches!(self, Self::Date(_))
  }

  /// Places the value on the timeline, using `tz` for dates and floating times.
  /// Times falling into a DST gap resolve to the earliest valid instant.
  pub fn resolve(&self, tz: Tz) -> Option<DateTime<Tz>> {
    match self {
      Self::Date(date) => local(tz, date.and_time(NaiveTime::MIN)),
      Self::Utc(date_time) => Some(date_time.with_timezone(&tz)),
      Self::Floating(date_time) => local(tz, *date_time),
      Self::Zoned { date_time, tz: zone } => local(*zone, *date_time).map(|dt| dt.with_timezone(&tz)),
    }
  }

  /// Content line in the form the recurrence parser understands, e.g.
  /// `DTSTART;TZID=Asia/Taipei:20250101T100000`.
  pub fn to_rule_line(&self, name: &str, tz: Tz) -> String {
    match self {
      Self::Date(date) => format!("{name};TZID={}:{}T000000", tz.name(), date.format("%Y%m%d")),
      Self::Utc(date_time) => format!("{name}:{}", date_time.format("%Y%m%dT%H%M%SZ")),
      Self::Floating(date_time) => format!("{name};TZID={}:{}", tz.name(), date_time.format("%Y%m%dT%H%M%S")),
      Self::Zoned { date_time, tz: zone } => format!("{name};TZID={}:{}", zone.name(), date_time.format("%Y%m%dT%H%M%S")),
    }
  }
}

fn local(tz: Tz, date_time: NaiveDateTime) -> Option<DateTime<Tz>> {
  let resolved = tz.from_local_datetime(&date_time);

  resolved.single().or_else(|| resolved.earliest()).or_else(|| {
    // inside a DST gap: shift forward by an hour
    tz.from_local_datetime(&(date_time + Duration::hours(1))).earliest()
  })
}

/// One VEVENT of the feed, reduced to what the event list needs.
#[derive(Debug, Clone)]
pub struct FeedEvent {
  pub uid: String,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub location: Option<String>,
  pub url: Option<String>,
  pub start: EventTime,
  pub end: Option<EventTime>,
  pub duration: Option<Duration>,
  pub rrule: Option<String>,
  pub exdates: Vec<EventTime>,
  pub recurrence_id: Option<EventTime>,
  pub created: Option<DateTime<Utc>>,
  pub cancelled: bool,
}

impl FeedEvent {
  pub const fn is_recurring(&self) -> bool {
    self.rrule.is_some() && self.recurrence_id.is_none()
  }

  pub const fn is_all_day(&self) -> bool {
    self.start.is_date()
  }

  /// The declared duration, or the distance between the declared start and end.
  pub fn span(&self, tz: Tz) -> Option<Duration> {
    if self.duration.is_some() {
      return self.duration;
    }

    let start = self.start.resolve(tz)?;
    let end = self.end.as_ref()?.resolve(tz)?;

    Some(end - start)
  }
}
