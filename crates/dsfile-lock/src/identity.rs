use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::file::FileLocker;
use crate::port::PortLocker;
use crate::traits::Locker;

/// The name of a lock: what two processes must agree on to exclude each other.
///
/// Serialized externally tagged, so a TOML config reads `lock = { port = 31000 }`
/// or `lock = { file = "/var/run/app.lock" }`. The textual form used on the
/// command line is `port:31000` or `file:/var/run/app.lock`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockIdentity {
    /// A TCP port on the loopback interface.
    Port(u16),
    /// A lock-file path.
    File(PathBuf),
}

impl LockIdentity {
    /// Build an unheld locker for this identity.
    pub fn into_locker(self) -> Box<dyn Locker> {
        match self {
            Self::Port(port) => Box::new(PortLocker::new(port)),
            Self::File(path) => Box::new(FileLocker::new(path)),
        }
    }
}

impl fmt::Display for LockIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(port) => write!(f, "port:{port}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Error returned when a lock identity string cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid lock identity `{0}` (expected port:<number> or file:<path>)")]
pub struct InvalidIdentity(pub String);

impl FromStr for LockIdentity {
    type Err = InvalidIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidIdentity(s.to_string());
        let (scheme, rest) = s.split_once(':').ok_or_else(invalid)?;
        match scheme {
            "port" => rest.parse().map(Self::Port).map_err(|_| invalid()),
            "file" if !rest.is_empty() => Ok(Self::File(PathBuf::from(rest))),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn display_and_parse() {
        let port = LockIdentity::Port(31000);
        assert_eq!(port.to_string(), "port:31000");
        assert_eq!("port:31000".parse::<LockIdentity>().unwrap(), port);

        let file = LockIdentity::File("/tmp/app.lock".into());
        assert_eq!(file.to_string(), "file:/tmp/app.lock");
        assert_eq!("file:/tmp/app.lock".parse::<LockIdentity>().unwrap(), file);
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in ["31000", "port:", "port:70000", "port:abc", "file:", "tcp:1"] {
            assert_eq!(
                bad.parse::<LockIdentity>().unwrap_err(),
                InvalidIdentity(bad.to_string()),
                "{bad}"
            );
        }
    }

    #[test]
    fn serde_is_externally_tagged() {
        let json = serde_json::to_string(&LockIdentity::Port(9)).unwrap();
        assert_eq!(json, r#"{"port":9}"#);

        #[derive(Deserialize)]
        struct Cfg {
            lock: LockIdentity,
        }
        let cfg: Cfg = toml::from_str("lock = { file = \"/tmp/a.lock\" }").unwrap();
        assert_eq!(cfg.lock, LockIdentity::File("/tmp/a.lock".into()));
    }

    #[test]
    fn into_locker_builds_matching_strategy() {
        let dir = TempDir::new().unwrap();
        let identity = LockIdentity::File(dir.path().join("x.lock"));
        let mut locker = identity.clone().into_locker();
        assert_eq!(locker.identity(), identity);
        locker.acquire().unwrap();
        assert!(locker.is_held());
        locker.release();
        assert!(!locker.is_held());

        let port_locker = LockIdentity::Port(0).into_locker();
        assert_eq!(port_locker.identity(), LockIdentity::Port(0));
    }
}
