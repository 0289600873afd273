//! Handler registry and request dispatcher.
//!
//! Registration captures the handler's exact argument tuple and return types
//! inside an invocation wrapper, so dispatch drives the codec without any
//! runtime reflection: decode the args, call the typed function, encode the
//! non-unit result. The registry itself is a plain `procedure_id → wrapper`
//! map, written only during configuration and read-only once mounted.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use nanorpc_common::codec::{Codec, Deserializer, PlainText, Serializer};
use nanorpc_common::error::{DispatchError, HandlerError, RegistrationError};
use nanorpc_common::frame::{procedure_id, Buffer, FrameHeader, ProcedureId, PROTOCOL_VERSION};

/// Type-erased invocation wrapper: decode arguments from the request reader,
/// run the handler, append the encoded result to the response accumulator.
pub type BoxedHandler<C> = Box<
    dyn Fn(
            &mut <C as Codec>::Deserializer,
            <C as Codec>::Serializer,
        ) -> Result<<C as Codec>::Serializer, HandlerError>
        + Send
        + Sync,
>;

/// A call executor for one URL path: the server-side `buffer → buffer`
/// dispatch entry point the HTTP transport routes into.
pub type RouteExecutor = Arc<dyn Fn(Buffer) -> Result<Buffer, DispatchError> + Send + Sync>;

/// Marker for handlers returning a plain value.
pub struct ValueReturn;
/// Marker for handlers returning `Result<T, HandlerError>`.
pub struct FallibleReturn;

/// Anything registrable as a procedure handler.
///
/// Implemented for functions and closures of arity 0 through 8, returning
/// either a serializable value or `Result<T, HandlerError>`. The `Args` and
/// `Kind` parameters only steer impl selection; callers never name them.
pub trait Handler<C: Codec, Args, Kind>: Send + Sync + 'static {
    fn into_wrapper(self) -> BoxedHandler<C>;
}

macro_rules! impl_handler {
    ($($arg:ident),*) => {
        impl<C, F, R, $($arg,)*> Handler<C, ($($arg,)*), ValueReturn> for F
        where
            C: Codec,
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Serialize + 'static,
            $($arg: DeserializeOwned + 'static,)*
        {
            fn into_wrapper(self) -> BoxedHandler<C> {
                Box::new(move |request, response| {
                    #[allow(non_snake_case)]
                    let ($($arg,)*): ($($arg,)*) = request.unpack()?;
                    let reply = (self)($($arg),*);
                    Ok(response.pack(&reply)?)
                })
            }
        }

        impl<C, F, R, $($arg,)*> Handler<C, ($($arg,)*), FallibleReturn> for F
        where
            C: Codec,
            F: Fn($($arg),*) -> Result<R, HandlerError> + Send + Sync + 'static,
            R: Serialize + 'static,
            $($arg: DeserializeOwned + 'static,)*
        {
            fn into_wrapper(self) -> BoxedHandler<C> {
                Box::new(move |request, response| {
                    #[allow(non_snake_case)]
                    let ($($arg,)*): ($($arg,)*) = request.unpack()?;
                    let reply = (self)($($arg),*)?;
                    Ok(response.pack(&reply)?)
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);
impl_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Server-side procedure registry and dispatcher.
///
/// # Example
///
/// ```
/// use nanorpc_server::Server;
///
/// let mut server = Server::new();
/// server
///     .handle("test", |s: String| format!("Tested: {s}"))
///     .unwrap();
/// server.handle("ping", || ()).unwrap();
/// ```
pub struct Server<C: Codec = PlainText> {
    codec: C,
    handlers: HashMap<ProcedureId, BoxedHandler<C>>,
}

impl Server<PlainText> {
    /// Server speaking the reference plain-text codec.
    pub fn new() -> Self {
        Self::with_codec(PlainText)
    }
}

impl Default for Server<PlainText> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> Server<C> {
    pub fn with_codec(codec: C) -> Self {
        Self {
            codec,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under a procedure name.
    pub fn handle<H, Args, Kind>(
        &mut self,
        name: &str,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Handler<C, Args, Kind>,
    {
        self.handle_with_id(procedure_id(name), handler)
    }

    /// Register a handler under a raw procedure id, bypassing name hashing.
    pub fn handle_with_id<H, Args, Kind>(
        &mut self,
        id: ProcedureId,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: Handler<C, Args, Kind>,
    {
        if self.handlers.contains_key(&id) {
            return Err(RegistrationError::Duplicate(id));
        }
        self.handlers.insert(id, handler.into_wrapper());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch one request buffer to its handler and pack the reply.
    ///
    /// The response starts with the request header echoed verbatim; a handler
    /// returning unit therefore produces a header-only response.
    pub fn execute(&self, buffer: Buffer) -> Result<Buffer, DispatchError> {
        if self.handlers.is_empty() {
            return Err(DispatchError::NoHandlers);
        }

        let mut request = self.codec.deserializer(buffer);
        let header: FrameHeader = request.unpack().map_err(DispatchError::Frame)?;
        if header.protocol != PROTOCOL_VERSION {
            return Err(DispatchError::UnsupportedProtocol(header.protocol));
        }

        let handler = self
            .handlers
            .get(&header.procedure)
            .ok_or(DispatchError::UnknownProcedure(header.procedure))?;

        let response = self
            .codec
            .serializer()
            .pack(&header)
            .map_err(DispatchError::Frame)?;
        let response = handler(&mut request, response)?;
        Ok(response.into_buffer())
    }

    /// Freeze the registry into a path executor for the HTTP transport. The
    /// handler set is immutable from here on.
    pub fn into_route(self) -> RouteExecutor {
        let server = Arc::new(self);
        Arc::new(move |buffer| server.execute(buffer))
    }
}
