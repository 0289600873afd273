//! Error taxonomy shared by every layer.
//!
//! Each subsystem reports through its own enum; the [`Error`] umbrella exists
//! for the error-sink callback and the facade surface. Propagation rules:
//! codec failures inside a handler surface as [`HandlerError`] and reach the
//! caller as an HTTP 500; dispatch failures map to HTTP status codes and come
//! back to the calling application as [`TransportError::SendFailed`].

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;

use crate::frame::ProcedureId;

/// Failure while encoding or decoding a value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The reader ran out of bytes mid-decode.
    #[error("unexpected end of buffer")]
    Truncated,
    /// A leading byte did not match the expected form.
    #[error("malformed input: {0}")]
    Malformed(String),
    /// A numeric token does not fit the target type.
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl serde::ser::Error for CodecError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CodecError::Malformed(msg.to_string())
    }
}

impl serde::de::Error for CodecError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        CodecError::Malformed(msg.to_string())
    }
}

/// Failure while registering a handler.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("procedure id {0} is already registered")]
    Duplicate(ProcedureId),
}

/// A handler failed. Content-opaque to the transport: the text travels no
/// further than the error sink and the HTTP 500 body.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
    #[error("codec failure in handler: {0}")]
    Codec(#[from] CodecError),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Failure while dispatching a request buffer to a handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handlers registered")]
    NoHandlers,
    #[error("protocol version {0} is not supported")]
    UnsupportedProtocol(u32),
    #[error("no handler for procedure id {0}")]
    UnknownProcedure(ProcedureId),
    #[error("failed to decode request frame: {0}")]
    Frame(CodecError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Failure in the wire transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    ConnectFailed(String),
    #[error("failed to send request: {0}")]
    SendFailed(String),
    #[error("failed to receive response: {0}")]
    ReceiveFailed(String),
    #[error("operation aborted")]
    Aborted,
}

/// Failure observed by the calling application.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The response header does not match the request header. Fatal for the
    /// call; never retried.
    #[error("response header does not match the request header")]
    BadResponseHeader,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Umbrella over every subsystem error, used by the error sink and the
/// facade constructors.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// User-supplied sink for exceptional conditions: closed sockets, accept
/// failures, handler errors. Shared between worker tasks, so it must be
/// thread-safe and tolerate concurrent invocation.
pub type ErrorSink = Arc<dyn Fn(&Error) + Send + Sync>;

/// The documented default sink: structured logging at error level.
pub fn default_error_sink() -> ErrorSink {
    Arc::new(|error| tracing::error!(%error, "nanorpc error"))
}

/// Invoke the sink best-effort. A panicking sink is swallowed; it must never
/// take the transport down with it.
pub fn report(sink: &ErrorSink, error: &Error) {
    let _ = catch_unwind(AssertUnwindSafe(|| sink(error)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_errors_render_their_context() {
        let error = DispatchError::UnknownProcedure(42);
        assert_eq!(error.to_string(), "no handler for procedure id 42");

        let error = DispatchError::UnsupportedProtocol(7);
        assert_eq!(error.to_string(), "protocol version 7 is not supported");
    }

    #[test]
    fn codec_errors_convert_into_handler_errors() {
        let error = HandlerError::from(CodecError::Truncated);
        assert!(matches!(error, HandlerError::Codec(CodecError::Truncated)));
    }

    #[test]
    fn panicking_sink_is_swallowed() {
        let sink: ErrorSink = Arc::new(|_| panic!("sink exploded"));
        report(&sink, &Error::Transport(TransportError::Aborted));
    }
}
