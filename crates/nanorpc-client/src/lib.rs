//! NanoRPC Client
//!
//! This crate provides the client half of the NanoRPC runtime: the call
//! assembler and the pooled HTTP(S) transport.
//!
//! # Overview
//!
//! [`Client`] encodes calls with a pluggable codec and validates response
//! framing; [`HttpClient`] moves the buffers over keep-alive HTTP/1.1
//! connections with a FIFO session pool and a single failure-driven retry.
//! The two are joined through the `CallExecutor` seam, so the engine never
//! learns what wire it is running on.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use nanorpc_client::{Client, ClientConfig, HttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpClient::connect(
//!         ClientConfig::new("127.0.0.1", 55555).location("/api/"),
//!     )
//!     .await?;
//!     let client = Client::new(Arc::new(transport));
//!
//!     let reply: String = client.call("test", ("hello",)).await?.result()?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
mod pool;

pub use client::{CallResult, CallTarget, Client};
pub use http::{ClientConfig, HttpClient};

pub use tokio_rustls::rustls;
