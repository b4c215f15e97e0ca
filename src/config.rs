use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use url::Url;

use crate::error::{Error, ErrorKind};

#[derive(Debug, serde::Deserialize)]
pub struct Config {
  #[serde(default = "default_timezone")]
  pub timezone: Tz,
  pub feed: Feed,
  #[serde(default)]
  pub sync: Sync,
  #[serde(default)]
  pub store: Store,
  pub admin: Admin,
  #[serde(default)]
  pub assistant: Assistant,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Feed {
  pub url: Url,
  /// Same-origin relay that answers with the raw feed body.
  pub relay: Option<Url>,
  /// Cross-origin relay templates, `{url}` is replaced by the encoded feed url.
  #[serde(default = "default_proxies")]
  pub proxies: Vec<String>,
  #[serde(default)]
  pub direct: bool,
  #[serde(default = "default_timeout")]
  pub timeout: u64,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Sync {
  #[serde(default = "default_cooldown")]
  pub cooldown: u64,
  #[serde(default = "default_horizon_months")]
  pub horizon_months: u32,
}

impl Default for Sync {
  fn default() -> Self {
    Self {
      cooldown: default_cooldown(),
      horizon_months: default_horizon_months(),
    }
  }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct Store {
  pub path: Option<PathBuf>,
}

impl Store {
  pub fn path(&self) -> Result<PathBuf, Error> {
    if let Some(path) = &self.path {
      return Ok(path.clone());
    }

    dirs::data_dir()
      .map(|dir| dir.join(env!("CARGO_PKG_NAME")))
      .ok_or_else(|| Error::new(ErrorKind::Config, "no data directory found, set store.path"))
  }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Admin {
  pub root: String,
}

#[derive(Clone, Default, serde::Deserialize)]
pub struct Assistant {
  pub api_key_file: Option<PathBuf>,
  pub api_key: Option<String>,
  pub model: Option<String>,
  pub endpoint: Option<Url>,
}

impl core::fmt::Debug for Assistant {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Assistant")
      .field("api_key_file", &self.api_key_file)
      .field("api_key", &self.api_key.as_ref().map(|_| "<hidden>"))
      .field("model", &self.model)
      .field("endpoint", &self.endpoint)
      .finish()
  }
}

pub fn init(path: &Path) -> Result<Config, Error> {
  let string = std::fs::read_to_string(path)
    .map_err(|e| Error::new(ErrorKind::Config, format!("{}: {e}", path.display())))?;

  parse(&string)
}

pub fn parse(string: &str) -> Result<Config, Error> {
  let mut config: Config = toml::from_str(string)?;

  if let Some(file) = &config.assistant.api_key_file {
    let api_key = std::fs::read_to_string(file)
      .map_err(|e| Error::new(ErrorKind::Config, format!("{}: {e}", file.display())))?;

    config.assistant.api_key = Some(api_key.trim().to_owned());
  }

  if config.proxies_are_invalid() {
    return Err(Error::new(ErrorKind::Config, "every feed.proxies entry needs a {url} placeholder"));
  }

  Ok(config)
}

impl Config {
  fn proxies_are_invalid(&self) -> bool {
    self.feed.proxies.iter().any(|proxy| !proxy.contains("{url}"))
  }
}

const fn default_timezone() -> Tz {
  Tz::UTC
}

fn default_proxies() -> Vec<String> {
  vec![
    "https://corsproxy.io/?{url}".to_owned(),
    "https://api.allorigins.win/raw?url={url}".to_owned(),
  ]
}

const fn default_timeout() -> u64 {
  15
}

const fn default_cooldown() -> u64 {
  600
}

const fn default_horizon_months() -> u32 {
  6
}
