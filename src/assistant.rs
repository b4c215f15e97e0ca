use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::{Agent, AgentBuilder};
use url::Url;

use crate::config;
use crate::error::{Error, ErrorKind};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/";
/// Text callers show when no description could be generated.
pub const FALLBACK_DESCRIPTION: &str = "歡迎參加這個精彩的校友活動！";

/// Result of asking the text-generation service for an event description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
  Generated(String),
  Unavailable(String),
}

impl Description {
  /// The generated text, or `fallback` if there is none.
  pub fn text_or<'a>(&'a self, fallback: &'a str) -> &'a str {
    match self {
      Self::Generated(text) => text,
      Self::Unavailable(_) => fallback,
    }
  }
}

#[derive(Serialize)]
struct Request<'a> {
  contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
  parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Deserialize)]
struct Response {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Assistant {
  agent: Agent,
  api_key: Option<String>,
  model: String,
  endpoint: Url,
}

impl Assistant {
  /// # Errors
  /// Returns an error if the configured endpoint cannot be joined with the model path.
  pub fn from_config(config: &config::Assistant, timeout: Duration) -> Result<Self, Error> {
    let endpoint = match &config.endpoint {
      Some(endpoint) => endpoint.clone(),
      None => Url::parse(DEFAULT_ENDPOINT)?,
    };

    Ok(Self {
      agent: AgentBuilder::new().timeout(timeout).build(),
      api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
      model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
      endpoint,
    })
  }

  /// Asks for a short promotional description of an event.
  pub fn describe(&self, title: &str, location: &str, date: &str) -> Description {
    let Some(api_key) = &self.api_key else {
      log::warn!("No assistant api key configured");
      return Description::Unavailable("no api key configured".to_owned());
    };

    match self.generate(api_key, &prompt(title, location, date)) {
      Ok(description) => description,
      Err(e) => {
        log::error!("Generating a description failed: {e}");
        Description::Unavailable(e.to_string())
      }
    }
  }

  fn generate(&self, api_key: &str, prompt: &str) -> Result<Description, Error> {
    let url = self.endpoint.join(&format!("models/{}:generateContent", self.model))?;
    let body = serde_json::to_string(&Request {
      contents: [Content { parts: [Part { text: prompt }] }],
    })?;

    let response = self
      .agent
      .post(url.as_str())
      .set("x-goog-api-key", api_key)
      .set("Content-Type", "application/json")
      .send_string(&body)?
      .into_string()
      .map_err(|e| Error::new(ErrorKind::Http, e.to_string()))?;

    parse_response(&response)
  }
}

fn prompt(title: &str, location: &str, date: &str) -> String {
  format!(
    "Write a warm, professional and inviting event description in Traditional Chinese for an alumni event.\n\
     Event: {title}\n\
     Location: {location}\n\
     Date: {date}\n\
     Keep it under 60 characters and encourage people to register."
  )
}

fn parse_response(raw: &str) -> Result<Description, Error> {
  let response: Response = serde_json::from_str(raw).map_err(|e| Error::parse(e.to_string()))?;

  let text: String = response
    .candidates
    .into_iter()
    .filter_map(|candidate| candidate.content)
    .flat_map(|content| content.parts)
    .filter_map(|part| part.text)
    .collect();

  Ok(match text.trim() {
    "" => Description::Unavailable("empty response".to_owned()),
    text => Description::Generated(text.to_owned()),
  })
}
