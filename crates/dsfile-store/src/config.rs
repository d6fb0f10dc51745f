use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for a [`PersistedFile`](crate::PersistedFile).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long construction waits for the lock before giving up.
    #[serde(rename = "lock_timeout_ms", with = "millis")]
    pub lock_timeout: Duration,
    /// `fsync` each temp file before renaming it into place.
    pub sync_on_save: bool,
}

impl StoreConfig {
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_sync_on_save(mut self, sync: bool) -> Self {
        self.sync_on_save = sync;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(1),
            sync_on_save: true,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.lock_timeout, Duration::from_secs(1));
        assert!(c.sync_on_save);
    }

    #[test]
    fn builders() {
        let c = StoreConfig::default()
            .with_lock_timeout(Duration::from_millis(250))
            .with_sync_on_save(false);
        assert_eq!(c.lock_timeout, Duration::from_millis(250));
        assert!(!c.sync_on_save);
    }

    #[test]
    fn serde_uses_milliseconds() {
        let json = serde_json::to_string(&StoreConfig::default()).unwrap();
        assert_eq!(json, r#"{"lock_timeout_ms":1000,"sync_on_save":true}"#);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let c: StoreConfig = serde_json::from_str(r#"{"lock_timeout_ms":50}"#).unwrap();
        assert_eq!(c.lock_timeout, Duration::from_millis(50));
        assert!(c.sync_on_save);
    }
}
