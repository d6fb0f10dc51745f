//! Serialization strategies for dsfile persisted objects.
//!
//! A [`Codec`] turns one in-memory value into a byte stream and back. Codecs
//! carry no state; the same codec instance may be shared freely across
//! threads.
//!
//! # Strategies
//!
//! - [`Native`] -- compact native binary (`bincode`), not self-describing
//! - [`Json`] -- human-readable structured text (`serde_json`)
//! - [`Cbor`] -- compact binary structured format (`ciborium`)
//!
//! [`CodecKind`] names one of the three at runtime, which is what
//! configuration files and the command line select with.
//!
//! # Design Rules
//!
//! 1. Every strategy round-trips any value serde can reflect over.
//! 2. A value the format cannot represent is an error, never dropped data.
//! 3. No header, version tag or checksum is added around the encoded bytes.

pub mod cbor;
pub mod error;
pub mod json;
pub mod kind;
pub mod native;
pub mod traits;

pub use cbor::Cbor;
pub use error::{CodecError, CodecResult};
pub use json::Json;
pub use kind::{CodecKind, UnknownCodec};
pub use native::Native;
pub use traits::Codec;
