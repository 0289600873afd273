//! Compact binary codec backed by `postcard`.
//!
//! Proves the pluggability contract: same `pack`/`unpack` surface, same
//! record-to-tuple decomposition (both codecs drive serde), different bytes on
//! the wire. Peers interoperate as long as both sides agree on the codec.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::frame::Buffer;

/// Postcard-based binary codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binary;

impl crate::codec::Codec for Binary {
    type Serializer = BinarySerializer;
    type Deserializer = BinaryDeserializer;

    fn serializer(&self) -> BinarySerializer {
        BinarySerializer { out: Vec::new() }
    }

    fn deserializer(&self, buffer: Buffer) -> BinaryDeserializer {
        BinaryDeserializer { buf: buffer, pos: 0 }
    }
}

pub struct BinarySerializer {
    out: Vec<u8>,
}

impl crate::codec::Serializer for BinarySerializer {
    fn pack<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, CodecError> {
        let encoded = postcard::to_stdvec(value)
            .map_err(|error| CodecError::Malformed(error.to_string()))?;
        self.out.extend_from_slice(&encoded);
        Ok(self)
    }

    fn into_buffer(self) -> Buffer {
        self.out
    }
}

pub struct BinaryDeserializer {
    buf: Vec<u8>,
    pos: usize,
}

impl crate::codec::Deserializer for BinaryDeserializer {
    fn unpack<T: DeserializeOwned>(&mut self) -> Result<T, CodecError> {
        let (value, rest) =
            postcard::take_from_bytes::<T>(&self.buf[self.pos..]).map_err(de_error)?;
        self.pos = self.buf.len() - rest.len();
        Ok(value)
    }
}

fn de_error(error: postcard::Error) -> CodecError {
    match error {
        postcard::Error::DeserializeUnexpectedEnd => CodecError::Truncated,
        other => CodecError::Malformed(other.to_string()),
    }
}
