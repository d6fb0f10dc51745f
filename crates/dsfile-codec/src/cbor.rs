use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};
use crate::traits::Codec;

/// Compact binary structured encoding (RFC 8949 CBOR) backed by `ciborium`.
///
/// Unlike [`Native`](crate::Native), CBOR is self-describing: field names
/// and item types travel with the data, so files can be inspected without the
/// Rust type at hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cbor;

impl Codec for Cbor {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode<W, T>(&self, sink: W, value: &T) -> CodecResult<()>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        ciborium::ser::into_writer(value, sink).map_err(|e| CodecError::CborEncode(e.to_string()))
    }

    fn decode<R, T>(&self, source: R) -> CodecResult<T>
    where
        R: Read,
        T: DeserializeOwned,
    {
        ciborium::de::from_reader(source).map_err(|e| CodecError::CborDecode(e.to_string()))
    }
}
