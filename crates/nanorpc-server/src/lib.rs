//! NanoRPC Server
//!
//! This crate provides the server half of the NanoRPC runtime: the typed
//! handler registry with its dispatcher, and the HTTP(S) transport that
//! carries request buffers to it.
//!
//! # Overview
//!
//! Handlers are plain functions or closures registered by name (or raw
//! procedure id) on a [`Server`]. Registration captures the argument tuple
//! and return types, so each incoming buffer is decoded, dispatched and
//! re-encoded without runtime reflection. [`HttpServer`] routes the body of
//! each `POST` to the executor mounted at the request's URL path.
//!
//! # Usage
//!
//! ```rust,no_run
//! use nanorpc_server::{HttpServer, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut rpc = Server::new();
//!     rpc.handle("test", |s: String| format!("Tested: {s}"))?;
//!     rpc.handle("ping", || ())?;
//!
//!     let mut http = HttpServer::new(ServerConfig::new("0.0.0.0", 55555));
//!     http.mount("/api/", rpc.into_route());
//!     http.run()?;
//!
//!     // ... serve until it is time to shut down ...
//!     http.stop().await;
//!     Ok(())
//! }
//! ```

pub mod http_server;
pub mod server;

pub use http_server::{HttpServer, ServerConfig};
pub use server::{BoxedHandler, FallibleReturn, Handler, RouteExecutor, Server, ValueReturn};

pub use tokio_rustls::rustls;
