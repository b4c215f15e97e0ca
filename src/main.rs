#![warn(
    clippy::all,
    // clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    // clippy::unwrap_used
)]
use std::time::Duration;

use chrono::Utc;
use clap::Parser;

use crate::assistant::{Assistant, Description, FALLBACK_DESCRIPTION};
use crate::calendar::Retriever;
use crate::cli::{AdminCommand, Command, EventCommand};
use crate::config::Config;
use crate::error::{Error, ErrorKind};
use crate::manager::Manager;
use crate::store::{FileStore, KeyValue, LocalStore};
use crate::sync::{SyncOutcome, SyncSettings, Synchronizer};

mod assistant;
pub mod calendar;
mod cli;
pub mod config;
pub mod error;
mod logger;
mod manager;
pub mod records;
mod render;
pub mod store;
pub mod sync;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init();

    let cli = cli::Cli::parse();
    let config = config::init(&cli.config)?;
    let store = LocalStore::new(FileStore::new(config.store.path()?), &config.admin.root);
    let mut manager = Manager::new(store);

    match cli.command {
        Command::Sync { force } => {
            sync(&config, &mut manager, force)?;
        }
        Command::List => {
            let events = sync(&config, &mut manager, false)?;
            print!("{}", render::events(&events));
        }
        Command::Event(command) => event(&mut manager, command)?,
        Command::Admin(command) => admin(&config, &mut manager, command)?,
        Command::Describe { title, location, date } => {
            let assistant = Assistant::from_config(&config.assistant, Duration::from_secs(config.feed.timeout))?;
            let description = assistant.describe(&title, &location, &date);

            if let Description::Unavailable(reason) = &description {
                eprintln!("No description generated ({reason}), using the default text");
            }
            println!("{}", description.text_or(FALLBACK_DESCRIPTION));
        }
    }

    Ok(())
}

fn sync<K: KeyValue>(
    config: &Config,
    manager: &mut Manager<K>,
    force: bool,
) -> Result<Vec<records::EventRecord>, Error> {
    let synchronizer = Synchronizer::new(Retriever::from_config(config), SyncSettings::from(config));
    let report = synchronizer.sync(manager.store_mut(), Utc::now(), force)?;

    match &report.outcome {
        SyncOutcome::Fresh { count, skipped } => {
            eprintln!("Synced {count} events ({skipped} feed entries skipped)");
        }
        SyncOutcome::Skipped => eprintln!("Synced recently, showing stored events"),
        SyncOutcome::Failed(e) => eprintln!("Sync failed, showing stored events: {e}"),
    }

    Ok(report.events)
}

fn event<K: KeyValue>(manager: &mut Manager<K>, command: EventCommand) -> Result<(), Error> {
    match command {
        EventCommand::Add(fields) => {
            let record = manager.add_event(fields.into_draft(), Utc::now())?;
            print!("{}", render::event(&record));
        }
        EventCommand::Edit { id, fields } => {
            let existing = find_event(manager, &id)?;
            let record = manager.update_event(&id, fields.apply_to(&existing))?;
            print!("{}", render::event(&record));
        }
        EventCommand::Delete { id } => {
            let record = manager.delete_event(&id)?;
            println!("Deleted {} ({})", record.title, record.id);
        }
        EventCommand::Show { id } => print!("{}", render::event(&find_event(manager, &id)?)),
    }

    Ok(())
}

fn admin<K: KeyValue>(config: &Config, manager: &mut Manager<K>, command: AdminCommand) -> Result<(), Error> {
    match command {
        AdminCommand::List => print!("{}", render::admins(&manager.admins()?)),
        AdminCommand::Add { email, by } => {
            let by = by.unwrap_or_else(|| config.admin.root.clone());
            if !manager.is_admin(&by)? {
                return Err(Error::new(ErrorKind::Forbidden, format!("{by} is not an administrator")));
            }
            let admin = manager.add_admin(&email, &by, Utc::now())?;
            println!("{} is an administrator", admin.email);
        }
        AdminCommand::Remove { email } => {
            let admin = manager.remove_admin(&email)?;
            println!("{} is no longer an administrator", admin.email);
        }
    }

    Ok(())
}

fn find_event<K: KeyValue>(manager: &mut Manager<K>, id: &str) -> Result<records::EventRecord, Error> {
    manager
        .events()?
        .into_iter()
        .find(|event| event.id == id)
        .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no event with id {id}")))
}
