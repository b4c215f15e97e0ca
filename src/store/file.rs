use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::Error;

use super::KeyValue;

/// Keeps every key in its own `<key>.json` file below `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub const fn new(dir: PathBuf) -> Self {
    Self { dir }
  }

  fn path(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{key}.json"))
  }
}

impl KeyValue for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, Error> {
    match std::fs::read_to_string(self.path(key)) {
      Ok(raw) => Ok(Some(raw)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
    std::fs::create_dir_all(&self.dir)?;

    // write next to the target and rename, so readers never see half a file
    let path = self.path(key);
    let tmp = self.dir.join(format!(".{key}.json.tmp"));
    std::fs::write(&tmp, value)?;
    std::fs::rename(tmp, path)?;

    Ok(())
  }
}
