use std::fmt::{Display, Formatter};

/// Errors that may occur while syncing or editing the local event list.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Error {
  pub kind: ErrorKind,
  pub message: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
  Http,
  Retrieval,
  Parse,
  Recurrence,
  Storage,
  Config,
  Invalid,
  NotFound,
  Forbidden,
}

impl Error {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }

  pub fn retrieval(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Retrieval, message)
  }

  pub fn parse(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Parse, message)
  }

  pub fn invalid(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Invalid, message)
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}: {}", self.kind, self.message)
  }
}

impl std::error::Error for Error {}

impl From<ureq::Error> for Error {
  fn from(e: ureq::Error) -> Self {
    let message = match e {
      ureq::Error::Status(code, response) => format!("status {code} from {}", response.get_url()),
      ureq::Error::Transport(transport) => transport.to_string(),
    };

    Self {
      kind: ErrorKind::Http,
      message,
    }
  }
}

impl From<std::io::Error> for Error {
  fn from(e: std::io::Error) -> Self {
    Self {
      kind: ErrorKind::Storage,
      message: e.to_string(),
    }
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Self {
      kind: ErrorKind::Storage,
      message: e.to_string(),
    }
  }
}

impl From<url::ParseError> for Error {
  fn from(e: url::ParseError) -> Self {
    Self {
      kind: ErrorKind::Invalid,
      message: e.to_string(),
    }
  }
}

impl From<rrule::RRuleError> for Error {
  fn from(e: rrule::RRuleError) -> Self {
    Self {
      kind: ErrorKind::Recurrence,
      message: e.to_string(),
    }
  }
}

impl From<toml::de::Error> for Error {
  fn from(e: toml::de::Error) -> Self {
    Self {
      kind: ErrorKind::Config,
      message: e.to_string(),
    }
  }
}
