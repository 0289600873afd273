//! One-call constructors for the common deployment: plain-text codec over
//! HTTP, one dispatcher mounted at one URL path.

use std::sync::Arc;

use nanorpc_client::{Client, ClientConfig, HttpClient};
use nanorpc_common::codec::PlainText;
use nanorpc_common::error::Error;
use nanorpc_server::{rustls, HttpServer, Server, ServerConfig};

/// Connect a plain-text RPC client to `host:port`, calling into the
/// executor mounted at `location`.
pub async fn make_client(
    host: impl Into<String>,
    port: u16,
    workers: usize,
    location: impl Into<String>,
) -> Result<Client<PlainText>, Error> {
    let transport = HttpClient::connect(
        ClientConfig::new(host, port)
            .workers(workers)
            .location(location),
    )
    .await?;
    Ok(Client::new(Arc::new(transport)))
}

/// Same as [`make_client`], with a TLS client handshake on every connection.
pub async fn make_tls_client(
    tls: Arc<rustls::ClientConfig>,
    host: impl Into<String>,
    port: u16,
    workers: usize,
    location: impl Into<String>,
) -> Result<Client<PlainText>, Error> {
    let transport = HttpClient::connect(
        ClientConfig::new(host, port)
            .workers(workers)
            .location(location)
            .tls(tls),
    )
    .await?;
    Ok(Client::new(Arc::new(transport)))
}

/// Mount `server` at `location` and start listening on `address:port`.
///
/// Must be called from within a tokio runtime.
pub fn make_server(
    address: impl Into<String>,
    port: u16,
    workers: usize,
    location: impl Into<String>,
    server: Server<PlainText>,
) -> Result<HttpServer, Error> {
    let mut http = HttpServer::new(ServerConfig::new(address, port).workers(workers));
    http.mount(location, server.into_route());
    http.run()?;
    Ok(http)
}

/// Same as [`make_server`], with a TLS server handshake on every accepted
/// connection.
pub fn make_tls_server(
    tls: Arc<rustls::ServerConfig>,
    address: impl Into<String>,
    port: u16,
    workers: usize,
    location: impl Into<String>,
    server: Server<PlainText>,
) -> Result<HttpServer, Error> {
    let mut http = HttpServer::new(ServerConfig::new(address, port).workers(workers).tls(tls));
    http.mount(location, server.into_route());
    http.run()?;
    Ok(http)
}
