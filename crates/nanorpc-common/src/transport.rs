//! The seam between the RPC engine and a concrete wire transport.

use std::future::Future;
use std::pin::Pin;

use crate::error::TransportError;
use crate::frame::Buffer;

/// Boxed future for type-erased transport callables.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A callable that ships a request buffer to the remote peer and resolves to
/// the peer's response buffer.
///
/// The client engine is written against this trait only; any transport that
/// can move buffers qualifies.
pub trait CallExecutor: Send + Sync + 'static {
    fn execute(&self, request: Buffer) -> BoxFuture<'static, Result<Buffer, TransportError>>;
}
