use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecResult;

/// A serialization strategy for persisted objects.
///
/// All implementations must satisfy these invariants:
/// - `decode(encode(v)) == v` for every value the strategy accepts.
/// - Encoding writes exactly the format's bytes to the sink: no framing,
///   header or checksum.
/// - Unrepresentable values are reported as errors. The sink may hold a
///   partial encoding afterwards; callers must not publish it.
pub trait Codec: Send + Sync + 'static {
    /// Short, stable name of the strategy (used in logs and config).
    fn name(&self) -> &'static str;

    /// Serialize `value` into `sink`.
    fn encode<W, T>(&self, sink: W, value: &T) -> CodecResult<()>
    where
        W: Write,
        T: Serialize + ?Sized;

    /// Deserialize a fresh value from `source`.
    ///
    /// The decoded value is returned rather than written into an existing
    /// one, so a failed decode never leaves a half-populated object behind.
    fn decode<R, T>(&self, source: R) -> CodecResult<T>
    where
        R: Read,
        T: DeserializeOwned;

    /// Encode into an in-memory buffer.
    fn encode_to_vec<T>(&self, value: &T) -> CodecResult<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        let mut buf = Vec::new();
        self.encode(&mut buf, value)?;
        Ok(buf)
    }

    /// Decode from an in-memory buffer.
    fn decode_from_slice<T>(&self, bytes: &[u8]) -> CodecResult<T>
    where
        T: DeserializeOwned,
    {
        self.decode(bytes)
    }
}
