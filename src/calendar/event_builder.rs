use std::fmt::{Display, Formatter};

use chrono::{DateTime, Duration, Utc};
use icalendar::parser::Component;

use super::{extract, EventTime, FeedEvent};

#[derive(Debug, PartialEq, Eq)]
pub enum EventBuilderError {
    NoUid,
    NoStart,
    InvalidStart(String),
    InvalidDuration(String),
    InvalidRRule(String),
}

impl Display for EventBuilderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoUid => f.write_str("missing UID"),
            Self::NoStart => f.write_str("missing DTSTART"),
            Self::InvalidStart(raw) => write!(f, "invalid DTSTART {raw:?}"),
            Self::InvalidDuration(raw) => write!(f, "invalid DURATION {raw:?}"),
            Self::InvalidRRule(raw) => write!(f, "invalid RRULE {raw:?}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBuilder {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub start: Option<String>,
    pub start_time: Option<EventTime>,
    pub end: Option<EventTime>,
    pub duration: Option<String>,
    pub rrule: Option<String>,
    pub exdates: Vec<EventTime>,
    pub recurrence_id: Option<EventTime>,
    pub created: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl EventBuilder {
    /// Builds the event.
    ///
    /// # Errors
    /// Returns an error if the required fields are missing or invalid.
    pub fn build(self) -> Result<FeedEvent, EventBuilderError> {
        let uid = self
            .uid
            .filter(|uid| !uid.trim().is_empty())
            .ok_or(EventBuilderError::NoUid)?;
        let raw_start = self.start.ok_or(EventBuilderError::NoStart)?;
        let start = self
            .start_time
            .ok_or(EventBuilderError::InvalidStart(raw_start))?;
        let duration = match self.duration {
            Some(raw) => Some(
                extract::duration(&raw).ok_or(EventBuilderError::InvalidDuration(raw))?,
            ),
            None => None,
        };
        let rrule = match self.rrule {
            Some(rule) if rule.contains("FREQ=") => Some(rule),
            Some(rule) => return Err(EventBuilderError::InvalidRRule(rule)),
            None => None,
        };
        let cancelled = self
            .status
            .is_some_and(|status| status.eq_ignore_ascii_case("CANCELLED"));

        Ok(FeedEvent {
            uid,
            summary: self.summary,
            description: self.description,
            location: self.location,
            url: self.url,
            start,
            end: self.end,
            duration: duration.filter(|d| *d > Duration::zero()),
            rrule,
            exdates: self.exdates,
            recurrence_id: self.recurrence_id,
            created: self.created,
            cancelled,
        })
    }

    pub fn set_uid_opt(mut self, uid: Option<String>) -> Self {
        self.uid = uid;
        self
    }

    pub fn set_summary_opt(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    pub fn set_description_opt(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn set_location_opt(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn set_url_opt(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn set_start_opt(mut self, raw: Option<String>, start: Option<EventTime>) -> Self {
        self.start = raw;
        self.start_time = start;
        self
    }

    pub fn set_end_opt(mut self, end: Option<EventTime>) -> Self {
        self.end = end;
        self
    }

    pub fn set_duration_opt(mut self, duration: Option<String>) -> Self {
        self.duration = duration;
        self
    }

    pub fn set_rrule_opt(mut self, rrule: Option<String>) -> Self {
        self.rrule = rrule;
        self
    }

    pub fn set_exdates(mut self, exdates: Vec<EventTime>) -> Self {
        self.exdates = exdates;
        self
    }

    pub fn set_recurrence_id_opt(mut self, recurrence_id: Option<EventTime>) -> Self {
        self.recurrence_id = recurrence_id;
        self
    }

    pub const fn set_created_opt(mut self, created: Option<DateTime<Utc>>) -> Self {
        self.created = created;
        self
    }

    pub fn set_status_opt(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }
}

impl From<&Component<'_>> for EventBuilder {
    fn from(event: &Component<'_>) -> Self {
        let start = extract::property(event, "DTSTART");

        Self::default()
            .set_uid_opt(extract::value(event, "UID").map(|uid| uid.trim().to_owned()))
            .set_summary_opt(extract::text(event, "SUMMARY"))
            .set_description_opt(extract::text(event, "DESCRIPTION"))
            .set_location_opt(extract::text(event, "LOCATION"))
            .set_url_opt(extract::value(event, "URL").filter(|url| !url.trim().is_empty()))
            .set_start_opt(
                start.map(|p| p.val.to_string()),
                start.and_then(extract::time),
            )
            .set_end_opt(extract::property(event, "DTEND").and_then(extract::time))
            .set_duration_opt(extract::value(event, "DURATION"))
            .set_rrule_opt(extract::value(event, "RRULE"))
            .set_exdates(
                extract::properties(event, "EXDATE")
                    .flat_map(extract::times)
                    .collect(),
            )
            .set_recurrence_id_opt(
                extract::property(event, "RECURRENCE-ID").and_then(extract::time),
            )
            .set_created_opt(extract::timestamp(event, "CREATED"))
            .set_status_opt(extract::value(event, "STATUS"))
    }
}
