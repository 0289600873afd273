//! Client-side call assembly and response validation.
//!
//! [`Client`] encodes a frame header plus the argument tuple into one buffer,
//! hands it to the transport callable, verifies that the response echoes the
//! request header, and returns a [`CallResult`] that decodes the remainder
//! lazily.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use nanorpc_common::codec::{Codec, Deserializer, PlainText, Serializer};
use nanorpc_common::error::ClientError;
use nanorpc_common::frame::{procedure_id, FrameHeader, ProcedureId};
use nanorpc_common::transport::CallExecutor;

/// Target of a call: a procedure name (hashed with
/// [`procedure_id`]) or a raw id supplied directly.
#[derive(Debug, Clone)]
pub enum CallTarget {
    Name(String),
    Id(ProcedureId),
}

impl CallTarget {
    pub fn id(&self) -> ProcedureId {
        match self {
            CallTarget::Name(name) => procedure_id(name),
            CallTarget::Id(id) => *id,
        }
    }
}

impl From<&str> for CallTarget {
    fn from(name: &str) -> Self {
        CallTarget::Name(name.to_string())
    }
}

impl From<String> for CallTarget {
    fn from(name: String) -> Self {
        CallTarget::Name(name)
    }
}

impl From<ProcedureId> for CallTarget {
    fn from(id: ProcedureId) -> Self {
        CallTarget::Id(id)
    }
}

/// RPC client over an abstract transport callable.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use nanorpc_client::{Client, ClientConfig, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpClient::connect(
///     ClientConfig::new("127.0.0.1", 55555).location("/api/"),
/// )
/// .await?;
/// let client = Client::new(Arc::new(transport));
///
/// let greeting: String = client.call("test", ("world",)).await?.result()?;
/// # Ok(())
/// # }
/// ```
pub struct Client<C: Codec = PlainText> {
    codec: C,
    executor: Arc<dyn CallExecutor>,
}

impl Client<PlainText> {
    /// Client speaking the reference plain-text codec.
    pub fn new(executor: Arc<dyn CallExecutor>) -> Self {
        Self::with_codec(PlainText, executor)
    }
}

impl<C: Codec> Client<C> {
    pub fn with_codec(codec: C, executor: Arc<dyn CallExecutor>) -> Self {
        Self { codec, executor }
    }

    /// Invoke a remote procedure.
    ///
    /// `args` is the argument tuple: `()` for a zero-argument call,
    /// `(a,)` for one argument, `(a, b)` for two, and so on.
    ///
    /// The response header must byte-equal the request header; a mismatch is
    /// fatal for the call and is never retried, since it indicates a
    /// protocol-level fault such as a cross-wired response.
    pub async fn call<T: Serialize>(
        &self,
        target: impl Into<CallTarget>,
        args: T,
    ) -> Result<CallResult<C>, ClientError> {
        let header = FrameHeader::new(target.into().id());
        let request = self
            .codec
            .serializer()
            .pack(&header)?
            .pack(&args)?
            .into_buffer();

        let response = self.executor.execute(request).await?;

        let mut reader = self.codec.deserializer(response);
        let echoed: FrameHeader = reader.unpack()?;
        if echoed != header {
            return Err(ClientError::BadResponseHeader);
        }
        Ok(CallResult { reader })
    }
}

/// Lazily-decoded call result.
///
/// Holds the response reader positioned just past the header. Decoding
/// consumes the result, so a value can only be extracted once and at one
/// type; the single-consumer contract is enforced by ownership.
pub struct CallResult<C: Codec> {
    reader: C::Deserializer,
}

impl<C: Codec> CallResult<C> {
    /// Decode the return value as `T`.
    pub fn result<T: DeserializeOwned>(mut self) -> Result<T, ClientError> {
        Ok(self.reader.unpack()?)
    }

    /// Consume a header-only response from a handler that returns nothing.
    pub fn unit(self) -> Result<(), ClientError> {
        self.result()
    }
}
