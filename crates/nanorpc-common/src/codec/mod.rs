//! Pluggable value ↔ buffer codecs.
//!
//! A codec turns argument tuples and result values into opaque byte buffers
//! and back, recursively over primitives, strings, enumerations, tuples,
//! sequences, maps and user-defined records (decomposed field-by-field via
//! their serde derives, in declaration order).
//!
//! Two implementations ship with the crate:
//!
//! - [`PlainText`], the reference wire format: ASCII, space-delimited tokens
//! - [`Binary`], a compact alternative backed by `postcard`
//!
//! Both follow the same record-to-tuple decomposition rule, so wire-level
//! interop only requires matching codecs on each side of the connection.
//!
//! # Example
//!
//! ```
//! use nanorpc_common::codec::{Codec, Deserializer as _, PlainText, Serializer as _};
//!
//! let buffer = PlainText
//!     .serializer()
//!     .pack(&(1u32, "hello"))
//!     .unwrap()
//!     .into_buffer();
//!
//! let mut reader = PlainText.deserializer(buffer);
//! let decoded: (u32, String) = reader.unpack().unwrap();
//! assert_eq!(decoded, (1, "hello".to_string()));
//! ```

mod binary;
mod plain_text;

pub use binary::Binary;
pub use plain_text::PlainText;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::frame::Buffer;

/// A pluggable serializer/deserializer pair.
pub trait Codec: Clone + Default + Send + Sync + 'static {
    type Serializer: Serializer;
    type Deserializer: Deserializer;

    /// Start an empty accumulator for encoding.
    fn serializer(&self) -> Self::Serializer;

    /// Wrap a received buffer in a stateful reader.
    fn deserializer(&self, buffer: Buffer) -> Self::Deserializer;
}

/// Chainable encoding accumulator. Each `pack` appends one value; the order
/// of appends is the order of decodes on the peer.
pub trait Serializer: Sized + Send {
    fn pack<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, CodecError>;

    /// Finish and hand off the accumulated buffer.
    fn into_buffer(self) -> Buffer;
}

/// Stateful reader over a received buffer. Consecutive `unpack` calls decode
/// concatenated values in order.
pub trait Deserializer: Sized + Send {
    fn unpack<T: DeserializeOwned>(&mut self) -> Result<T, CodecError>;
}
