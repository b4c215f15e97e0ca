use std::collections::BTreeMap;

use crate::error::Error;

use super::KeyValue;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore(BTreeMap<String, String>);

impl KeyValue for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, Error> {
    Ok(self.0.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
    self.0.insert(key.to_owned(), value.to_owned());
    Ok(())
  }
}
