use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cbor::Cbor;
use crate::error::CodecResult;
use crate::json::Json;
use crate::native::Native;
use crate::traits::Codec;

/// Runtime selection among the built-in codecs.
///
/// The set is closed: there is no registry to extend. `CodecKind` is the
/// form stored in configuration and accepted on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// [`Native`] binary.
    Native,
    /// [`Json`] text.
    #[default]
    Json,
    /// [`Cbor`] binary.
    Cbor,
}

impl CodecKind {
    /// All built-in codecs, in declaration order.
    pub const ALL: [CodecKind; 3] = [CodecKind::Native, CodecKind::Json, CodecKind::Cbor];

    /// Whether a file in this format can be decoded without knowing the
    /// Rust type that produced it.
    pub fn is_self_describing(&self) -> bool {
        !matches!(self, Self::Native)
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown codec name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown codec `{0}` (expected native, json or cbor)")]
pub struct UnknownCodec(pub String);

impl FromStr for CodecKind {
    type Err = UnknownCodec;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" | "bincode" => Ok(Self::Native),
            "json" => Ok(Self::Json),
            "cbor" => Ok(Self::Cbor),
            _ => Err(UnknownCodec(s.to_string())),
        }
    }
}

impl Codec for CodecKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Native => Native.name(),
            Self::Json => Json::new().name(),
            Self::Cbor => Cbor.name(),
        }
    }

    fn encode<W, T>(&self, sink: W, value: &T) -> CodecResult<()>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        match self {
            Self::Native => Native.encode(sink, value),
            Self::Json => Json::new().encode(sink, value),
            Self::Cbor => Cbor.encode(sink, value),
        }
    }

    fn decode<R, T>(&self, source: R) -> CodecResult<T>
    where
        R: Read,
        T: DeserializeOwned,
    {
        match self {
            Self::Native => Native.decode(source),
            Self::Json => Json::new().decode(source),
            Self::Cbor => Cbor.decode(source),
        }
    }
}
