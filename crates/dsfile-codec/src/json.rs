use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecResult;
use crate::traits::Codec;

/// Human-readable structured text encoding backed by `serde_json`.
///
/// Each document is followed by a single newline so the durable file reads
/// well in a terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Json {
    pretty: bool,
}

impl Json {
    /// Compact, single-line output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented, multi-line output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Whether output is indented.
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl Codec for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<W, T>(&self, mut sink: W, value: &T) -> CodecResult<()>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        if self.pretty {
            serde_json::to_writer_pretty(&mut sink, value)?;
        } else {
            serde_json::to_writer(&mut sink, value)?;
        }
        sink.write_all(b"\n")?;
        Ok(())
    }

    fn decode<R, T>(&self, source: R) -> CodecResult<T>
    where
        R: Read,
        T: DeserializeOwned,
    {
        Ok(serde_json::from_reader(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use std::collections::HashMap;

    #[test]
    fn output_ends_with_newline() {
        let bytes = Json::new().encode_to_vec(&vec![1, 2, 3]).unwrap();
        assert_eq!(bytes, b"[1,2,3]\n");
    }

    #[test]
    fn pretty_output_is_indented() {
        let mut map = HashMap::new();
        map.insert("k", 1);
        let text = String::from_utf8(Json::pretty().encode_to_vec(&map).unwrap()).unwrap();
        assert_eq!(text, "{\n  \"k\": 1\n}\n");
        assert!(Json::pretty().is_pretty());
        assert!(!Json::new().is_pretty());
    }

    #[test]
    fn pretty_and_compact_decode_alike() {
        let value = vec![("a".to_string(), 1u8), ("b".to_string(), 2u8)];
        let compact = Json::new().encode_to_vec(&value).unwrap();
        let pretty = Json::pretty().encode_to_vec(&value).unwrap();
        let a: Vec<(String, u8)> = Json::new().decode_from_slice(&compact).unwrap();
        let b: Vec<(String, u8)> = Json::new().decode_from_slice(&pretty).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_string_map_keys_are_rejected() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple key");
        let err = Json::new().encode_to_vec(&map).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn truncated_document_fails() {
        let err = Json::new()
            .decode_from_slice::<Vec<u32>>(b"[1,2,")
            .unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }
}
