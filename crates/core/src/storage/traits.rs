use crate::errors::CoreError;

/// Opaque string key-value storage, the shape of browser local storage.
///
/// Values are JSON documents; the store never interprets them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;
}
