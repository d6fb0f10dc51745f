use std::path::Path;

use anyhow::Context;
use dsfile_codec::CodecKind;
use dsfile_lock::LockIdentity;
use dsfile_store::StoreConfig;
use serde::{Deserialize, Serialize};

/// Defaults read from `--config`.
///
/// ```toml
/// default_codec = "cbor"
/// lock = { port = 31000 }
///
/// [store]
/// lock_timeout_ms = 500
/// sync_on_save = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub default_codec: CodecKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockIdentity>,
    pub store: StoreConfig,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Explicit choice, else the file extension, else the configured default.
    pub fn codec_for(&self, path: &Path, explicit: Option<CodecKind>) -> CodecKind {
        explicit
            .or_else(|| codec_from_extension(path))
            .unwrap_or(self.default_codec)
    }

    /// Explicit identity, else the configured one, else an ephemeral port
    /// (which coordinates with nobody).
    pub fn lock_for(&self, explicit: Option<LockIdentity>) -> LockIdentity {
        explicit
            .or_else(|| self.lock.clone())
            .unwrap_or(LockIdentity::Port(0))
    }
}

fn codec_from_extension(path: &Path) -> Option<CodecKind> {
    match path.extension()?.to_str()? {
        "json" => Some(CodecKind::Json),
        "cbor" => Some(CodecKind::Cbor),
        "bin" | "native" => Some(CodecKind::Native),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_path_gives_defaults() {
        let c = CliConfig::load(None).unwrap();
        assert_eq!(c, CliConfig::default());
        assert_eq!(c.default_codec, CodecKind::Json);
        assert!(c.lock.is_none());
    }

    #[test]
    fn load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dsfile.toml");
        std::fs::write(
            &path,
            "default_codec = \"cbor\"\nlock = { port = 31000 }\n\n[store]\nlock_timeout_ms = 500\n",
        )
        .unwrap();

        let c = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(c.default_codec, CodecKind::Cbor);
        assert_eq!(c.lock, Some(LockIdentity::Port(31000)));
        assert_eq!(c.store.lock_timeout, Duration::from_millis(500));
        assert!(c.store.sync_on_save);
    }

    #[test]
    fn bad_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "default_codec = \"yaml\"").unwrap();
        let err = CliConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err}").contains("broken.toml"));
    }

    #[test]
    fn codec_resolution_order() {
        let c = CliConfig {
            default_codec: CodecKind::Native,
            ..Default::default()
        };
        assert_eq!(
            c.codec_for(Path::new("a.json"), Some(CodecKind::Cbor)),
            CodecKind::Cbor
        );
        assert_eq!(c.codec_for(Path::new("a.cbor"), None), CodecKind::Cbor);
        assert_eq!(c.codec_for(Path::new("a.dat"), None), CodecKind::Native);
    }

    #[test]
    fn lock_resolution_order() {
        let mut c = CliConfig::default();
        assert_eq!(c.lock_for(None), LockIdentity::Port(0));
        c.lock = Some(LockIdentity::Port(9));
        assert_eq!(c.lock_for(None), LockIdentity::Port(9));
        assert_eq!(
            c.lock_for(Some(LockIdentity::Port(10))),
            LockIdentity::Port(10)
        );
    }
}
