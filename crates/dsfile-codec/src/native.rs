use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecResult;
use crate::traits::Codec;

/// Compact native binary encoding backed by `bincode`.
///
/// Fields are written positionally with fixed-width integers, so the output
/// is only readable by a decoder that knows the exact Rust type. Sequences
/// must report their length up front.
///
/// Decoding reads the whole source first so every length prefix is checked
/// against the bytes actually present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Native;

impl Codec for Native {
    fn name(&self) -> &'static str {
        "native"
    }

    fn encode<W, T>(&self, sink: W, value: &T) -> CodecResult<()>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        bincode::serialize_into(sink, value)?;
        Ok(())
    }

    fn decode<R, T>(&self, mut source: R) -> CodecResult<T>
    where
        R: Read,
        T: DeserializeOwned,
    {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use std::collections::BTreeMap;

    #[test]
    fn roundtrip_map() {
        let mut map = BTreeMap::new();
        map.insert("1".to_string(), "foo".to_string());
        map.insert("2".to_string(), "bar".to_string());
        let bytes = Native.encode_to_vec(&map).unwrap();
        let back: BTreeMap<String, String> = Native.decode_from_slice(&bytes).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn integers_are_fixed_width() {
        let bytes = Native.encode_to_vec(&42u64).unwrap();
        assert_eq!(bytes, 42u64.to_le_bytes());
    }

    #[test]
    fn truncated_input_fails() {
        let bytes = Native.encode_to_vec(&vec![1u32, 2, 3, 4]).unwrap();
        let err = Native
            .decode_from_slice::<Vec<u32>>(&bytes[..bytes.len() / 2])
            .unwrap_err();
        assert!(matches!(err, CodecError::Native(_)));
    }

    #[test]
    fn corrupt_length_prefix_fails() {
        let mut bytes = Native.encode_to_vec(&"foobar".to_string()).unwrap();
        for len in [u64::MAX, 1u64 << 40] {
            bytes[..8].copy_from_slice(&len.to_le_bytes());
            let err = Native
                .decode(std::io::Cursor::new(&bytes))
                .map(|_: String| ())
                .unwrap_err();
            assert!(matches!(err, CodecError::Native(_)));
            let err = Native.decode_from_slice::<Vec<u64>>(&bytes).unwrap_err();
            assert!(matches!(err, CodecError::Native(_)));
        }
    }

    #[test]
    fn sequence_without_length_is_rejected() {
        struct Unsized;
        impl Serialize for Unsized {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                use serde::ser::SerializeSeq;
                let mut seq = s.serialize_seq(None)?;
                seq.serialize_element(&1u8)?;
                seq.end()
            }
        }
        assert!(Native.encode_to_vec(&Unsized).is_err());
    }
}
