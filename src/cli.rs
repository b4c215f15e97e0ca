use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::manager::EventDraft;
use crate::records::{EventRecord, ALL_DAY};

#[derive(Debug, Clone, Parser)]
#[clap(bin_name = env!("CARGO_PKG_NAME"), version = env!("CARGO_PKG_VERSION"), about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    /// Path to the configuration file
    #[clap(name = "config")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch the feed and merge it into the local event list
    Sync {
        /// Ignore the cooldown since the last sync
        #[clap(long, short)]
        force: bool,
    },
    /// Sync when due, then print the event list
    List,
    /// Manage manually entered events
    #[clap(subcommand)]
    Event(EventCommand),
    /// Manage administrators
    #[clap(subcommand)]
    Admin(AdminCommand),
    /// Generate a description for an event
    Describe {
        title: String,
        #[clap(long, default_value = "")]
        location: String,
        #[clap(long, default_value = "")]
        date: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum EventCommand {
    /// Add a new event
    Add(EventFields),
    /// Change an existing manual event, unset fields keep their value
    Edit {
        id: String,
        #[clap(flatten)]
        fields: EventFields,
    },
    /// Delete a manual event
    Delete { id: String },
    /// Print a single event
    Show { id: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommand {
    List,
    Add {
        email: String,
        /// Administrator performing the change
        #[clap(long)]
        by: Option<String>,
    },
    Remove { email: String },
}

#[derive(Debug, Clone, Default, Args)]
pub struct EventFields {
    #[clap(long)]
    pub title: Option<String>,
    #[clap(long)]
    pub description: Option<String>,
    /// YYYY-MM-DD
    #[clap(long)]
    pub date: Option<String>,
    /// HH:MM, "HH:MM - HH:MM" or all-day
    #[clap(long)]
    pub time: Option<String>,
    #[clap(long)]
    pub location: Option<String>,
    #[clap(long)]
    pub link: Option<String>,
}

impl EventFields {
    /// Draft for a new event.
    pub fn into_draft(self) -> EventDraft {
        EventDraft {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            date: self.date.unwrap_or_default(),
            time: self.time.unwrap_or_else(|| ALL_DAY.to_owned()),
            location: self.location.unwrap_or_default(),
            register_link: self.link.unwrap_or_default(),
        }
    }

    /// Draft that changes only the given fields of `record`.
    pub fn apply_to(self, record: &EventRecord) -> EventDraft {
        EventDraft {
            title: self.title.unwrap_or_else(|| record.title.clone()),
            description: self.description.unwrap_or_else(|| record.description.clone()),
            date: self.date.unwrap_or_else(|| record.date.clone()),
            time: self.time.unwrap_or_else(|| record.time.clone()),
            location: self.location.unwrap_or_else(|| record.location.clone()),
            register_link: self.link.unwrap_or_else(|| record.register_link.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{record, Source};

    #[test]
    fn test_parse_event_add() {
        let cli = Cli::try_parse_from([
            "alumni-events",
            "config.toml",
            "event",
            "add",
            "--title",
            "Reunion",
            "--date",
            "2025-03-01",
        ])
        .unwrap();

        let Command::Event(EventCommand::Add(fields)) = cli.command else {
            panic!("unexpected command {:?}", cli.command);
        };
        let draft = fields.into_draft();
        assert_eq!(draft.title, "Reunion");
        assert_eq!(draft.time, ALL_DAY);
    }

    #[test]
    fn test_parse_sync_force() {
        let cli = Cli::try_parse_from(["alumni-events", "config.toml", "sync", "--force"]).unwrap();

        assert!(matches!(cli.command, Command::Sync { force: true }));
    }

    #[test]
    fn test_edit_keeps_unset_fields() {
        let existing = record("manual_1", "2025-01-20", "12:00", Source::Manual);
        let fields = EventFields {
            time: Some("13:00".to_owned()),
            ..EventFields::default()
        };

        let draft = fields.apply_to(&existing);

        assert_eq!(draft.time, "13:00");
        assert_eq!(draft.date, existing.date);
        assert_eq!(draft.title, existing.title);
    }
}
