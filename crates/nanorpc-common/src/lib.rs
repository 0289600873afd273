//! NanoRPC Common Types, Framing and Codecs
//!
//! This crate provides the shared infrastructure for the NanoRPC runtime:
//! the call-framing contract, the pluggable codec layer and the error
//! taxonomy used by both peers.
//!
//! # Components
//!
//! - [`frame`] - procedure ids, buffers and the request/response header
//! - [`codec`] - the codec traits plus the plain-text and binary codecs
//! - [`error`] - per-subsystem error enums, the umbrella [`Error`] and the
//!   error-sink callback
//! - [`transport`] - the buffer-in/buffer-out seam transports implement
//!
//! # Example
//!
//! ```
//! use nanorpc_common::codec::{Codec, Deserializer as _, PlainText, Serializer as _};
//! use nanorpc_common::frame::{procedure_id, FrameHeader};
//!
//! let header = FrameHeader::new(procedure_id("echo"));
//! let request = PlainText
//!     .serializer()
//!     .pack(&header)
//!     .unwrap()
//!     .pack(&("hello",))
//!     .unwrap()
//!     .into_buffer();
//!
//! let mut reader = PlainText.deserializer(request);
//! let echoed: FrameHeader = reader.unpack().unwrap();
//! assert_eq!(echoed, header);
//! ```

pub mod codec;
pub mod error;
pub mod frame;
pub mod transport;

pub use codec::{Binary, Codec, Deserializer, PlainText, Serializer};
pub use error::{
    default_error_sink, ClientError, CodecError, DispatchError, Error, ErrorSink, HandlerError,
    RegistrationError, TransportError,
};
pub use frame::{procedure_id, Buffer, FrameHeader, ProcedureId, PROTOCOL_VERSION};
pub use transport::{BoxFuture, CallExecutor};
