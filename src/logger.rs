use std::fmt::Display;

pub fn init() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Logs a contained failure and turns it into `None`, for places where one bad
/// item must not stop a batch.
pub trait LogExt<T> {
  fn log_warn(self, msg: &str) -> Option<T>;
}

impl<T, E> LogExt<T> for Result<T, E> where E: Display {
  #[track_caller]
  fn log_warn(self, msg: &str) -> Option<T> {
    match self {
      Ok(value) => Some(value),
      Err(error) => {
        let location = std::panic::Location::caller().to_string();
        log::warn!("[{location}] {msg}: {error}");
        None
      }
    }
  }
}
