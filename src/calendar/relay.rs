use std::time::Duration;

use chrono::{DateTime, Utc};
use ureq::{Agent, AgentBuilder};
use url::Url;

use crate::config::Config;
use crate::error::{Error, ErrorKind};

use super::FEED_MARKER;

pub const URL_PLACEHOLDER: &str = "{url}";
pub const CACHE_BUST_PARAM: &str = "t";

/// Fetches a body as text. Implemented by the HTTP agent and by scripted fakes in tests.
pub trait Transport {
  /// # Errors
  /// Returns an error if the request fails or the status is not successful.
  fn fetch_text(&self, url: &Url) -> Result<String, Error>;
}

impl Transport for Agent {
  fn fetch_text(&self, url: &Url) -> Result<String, Error> {
    self
      .get(url.as_str())
      .set("Cache-Control", "no-cache")
      .set("Pragma", "no-cache")
      .set("Accept", "text/calendar, text/plain;q=0.9, */*;q=0.1")
      .call()?
      .into_string()
      .map_err(|e| Error::new(ErrorKind::Http, e.to_string()))
  }
}

/// One way of reaching the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
  /// Same-origin relay that serves the feed body as is.
  Relay(Url),
  /// Third-party relay, `{url}` is replaced with the encoded feed URL.
  Proxy(String),
  /// The feed URL itself.
  Direct,
}

impl Strategy {
  /// URL requested for `feed`. Everything but the trusted relay carries a
  /// cache-busting parameter on the feed URL.
  ///
  /// # Errors
  /// Returns an error if a proxy template produces an invalid URL.
  pub fn request_url(&self, feed: &Url, millis: i64) -> Result<Url, Error> {
    match self {
      Self::Relay(relay) => Ok(relay.clone()),
      Self::Proxy(template) => {
        let target = cache_busted(feed, millis);
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_str().as_bytes()).collect();

        Ok(Url::parse(&template.replace(URL_PLACEHOLDER, &encoded))?)
      }
      Self::Direct => Ok(cache_busted(feed, millis)),
    }
  }

  pub const fn name(&self) -> &'static str {
    match self {
      Self::Relay(_) => "relay",
      Self::Proxy(_) => "proxy",
      Self::Direct => "direct",
    }
  }
}

fn cache_busted(feed: &Url, millis: i64) -> Url {
  let mut url = feed.clone();
  url.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &millis.to_string());
  url
}

#[derive(Debug, Clone)]
pub struct Retriever<T> {
  transport: T,
  strategies: Vec<Strategy>,
}

impl Retriever<Agent> {
  pub fn from_config(config: &Config) -> Self {
    let agent = AgentBuilder::new()
      .timeout(Duration::from_secs(config.feed.timeout))
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build();

    let strategies = config
      .feed
      .relay
      .iter()
      .cloned()
      .map(Strategy::Relay)
      .chain(config.feed.proxies.iter().cloned().map(Strategy::Proxy))
      .chain(config.feed.direct.then_some(Strategy::Direct))
      .collect();

    Self::new(agent, strategies)
  }
}

impl<T: Transport> Retriever<T> {
  pub const fn new(transport: T, strategies: Vec<Strategy>) -> Self {
    Self {
      transport,
      strategies,
    }
  }

  /// Raw feed text from the first strategy that answers with a calendar body.
  ///
  /// # Errors
  /// Returns a [`ErrorKind::Retrieval`] error listing every attempt if all strategies fail.
  pub fn fetch(&self, feed: &Url, now: DateTime<Utc>) -> Result<String, Error> {
    let millis = now.timestamp_millis();
    let mut failures = Vec::with_capacity(self.strategies.len());

    for strategy in &self.strategies {
      match self.attempt(strategy, feed, millis) {
        Ok(body) => {
          log::debug!(strategy = strategy.name(), bytes = body.len(); "Feed retrieved");
          return Ok(body);
        }
        Err(e) => {
          log::warn!(strategy = strategy.name(); "Feed retrieval attempt failed: {e}");
          failures.push(format!("{}: {e}", strategy.name()));
        }
      }
    }

    let error = if failures.is_empty() {
      Error::retrieval("no retrieval strategy configured")
    } else {
      Error::retrieval(format!("every strategy failed ({})", failures.join("; ")))
    };
    log::error!("{error}");

    Err(error)
  }

  fn attempt(&self, strategy: &Strategy, feed: &Url, millis: i64) -> Result<String, Error> {
    let url = strategy.request_url(feed, millis)?;
    let body = self.transport.fetch_text(&url)?;

    if body.contains(FEED_MARKER) {
      Ok(body)
    } else {
      Err(Error::retrieval(format!("response from {url} is not a calendar feed")))
    }
  }
}
