//! NanoRPC: lightweight RPC over HTTP(S)
//!
//! A caller invokes a named procedure with arbitrary arguments; a symmetric
//! peer dispatches the call to a registered handler and returns the result.
//! Three interlocking subsystems make that work:
//!
//! - a pluggable **codec** ([`PlainText`] reference, [`Binary`] alternative)
//!   that turns argument tuples and results into opaque byte buffers
//! - the **engine**: [`Client`] assembles calls and validates response
//!   framing; [`Server`] maps procedure ids to typed handlers and dispatches
//! - the **HTTP transport**: [`HttpClient`] pools keep-alive connections and
//!   retries once on transient failure; [`HttpServer`] accepts, routes by URL
//!   path and shuts down gracefully
//!
//! The [`easy`] module wires all three together in one call per side.
//!
//! # Example
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut rpc = nanorpc::Server::new();
//!     rpc.handle("test", |s: String| format!("Tested: {s}"))?;
//!
//!     let http = nanorpc::easy::make_server("0.0.0.0", 55555, 2, "/api/", rpc)?;
//!
//!     let client = nanorpc::easy::make_client("127.0.0.1", 55555, 2, "/api/").await?;
//!     let reply: String = client.call("test", ("hello",)).await?.result()?;
//!     assert_eq!(reply, "Tested: hello");
//!
//!     http.stop().await;
//!     Ok(())
//! }
//! ```

pub mod easy;

pub use nanorpc_common::{codec, error, frame, transport};
pub use nanorpc_common::{
    procedure_id, Binary, Buffer, CallExecutor, Codec, Error, ErrorSink, FrameHeader, PlainText,
    ProcedureId, PROTOCOL_VERSION,
};

pub use nanorpc_client::{CallResult, CallTarget, Client, ClientConfig, HttpClient};
pub use nanorpc_server::{Handler, HttpServer, RouteExecutor, Server, ServerConfig};

pub use nanorpc_server::rustls;
