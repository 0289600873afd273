//! HTTP(S) server transport.
//!
//! The acceptor binds with `SO_REUSEADDR`, listens, and spawns one session
//! task per accepted socket. A session optionally performs a TLS server
//! handshake, then serves HTTP/1.1 with keep-alive: read a request, route its
//! URL path to a mounted call executor, write the response, and go back to
//! reading until the client hangs up.
//!
//! Routing:
//! - unknown path → 404 with an explanatory body
//! - empty body → 400
//! - executor failure → 500, reported to the error sink
//! - success → 200 with the response buffer as body
//!
//! `stop()` cancels the acceptor and aborts in-flight sessions; they observe
//! the abort and tear their sockets down.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_rustls::rustls;
use tokio_rustls::TlsAcceptor;

use nanorpc_common::error::{default_error_sink, report, Error, ErrorSink, TransportError};
use nanorpc_common::frame::Buffer;

use crate::server::RouteExecutor;

const SERVER_NAME: &str = "nanorpc";
// Vestigial content type inherited from the wire protocol; binary-safe.
const CONTENT_TYPE_VALUE: &str = "text/html";
const LISTEN_BACKLOG: u32 = 1024;

/// Configuration for the HTTP server transport.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub workers: usize,
    pub tls: Option<Arc<rustls::ServerConfig>>,
    pub error_sink: ErrorSink,
}

impl ServerConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            workers: 1,
            tls: None,
            error_sink: default_error_sink(),
        }
    }

    /// Number of I/O workers the owning process should run; clamped to at
    /// least one. Consulted where the process builds its own runtime.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enable TLS with a fully-initialized rustls configuration. Every
    /// accepted socket then goes through a TLS server handshake before HTTP.
    pub fn tls(mut self, config: Arc<rustls::ServerConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    pub fn error_sink(mut self, sink: ErrorSink) -> Self {
        self.error_sink = sink;
        self
    }
}

/// HTTP(S) server hosting call executors by URL path.
///
/// # Example
///
/// ```no_run
/// use nanorpc_server::{HttpServer, Server, ServerConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut rpc = Server::new();
/// rpc.handle("test", |s: String| format!("Tested: {s}"))?;
///
/// let mut http = HttpServer::new(ServerConfig::new("0.0.0.0", 55555));
/// http.mount("/api/", rpc.into_route());
/// let addr = http.run()?;
/// println!("listening on {addr}");
/// # Ok(())
/// # }
/// ```
pub struct HttpServer {
    config: ServerConfig,
    routes: HashMap<String, RouteExecutor>,
    state: Mutex<Option<ListenerState>>,
}

struct ListenerState {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    acceptor: JoinHandle<()>,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            routes: HashMap::new(),
            state: Mutex::new(None),
        }
    }

    /// Mount a call executor at a URL path. The route map is frozen when
    /// `run` is called.
    pub fn mount(&mut self, location: impl Into<String>, executor: RouteExecutor) -> &mut Self {
        self.routes.insert(location.into(), executor);
        self
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Bind the listener and start accepting in the background. Returns the
    /// bound address, which is how callers discover a port chosen by the OS.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self) -> Result<SocketAddr, TransportError> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Err(TransportError::ConnectFailed(
                "server is already running".into(),
            ));
        }

        let listener = self.bind()?;
        let local_addr = listener
            .local_addr()
            .map_err(|error| TransportError::ConnectFailed(error.to_string()))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let routes = Arc::new(self.routes.clone());
        let sink = self.config.error_sink.clone();
        let tls = self.config.tls.clone().map(TlsAcceptor::from);
        let acceptor = tokio::spawn(accept_loop(listener, routes, sink, tls, shutdown_rx));

        tracing::info!(%local_addr, "HTTP server listening");
        *state = Some(ListenerState {
            local_addr,
            shutdown: shutdown_tx,
            acceptor,
        });
        Ok(local_addr)
    }

    fn bind(&self) -> Result<TcpListener, TransportError> {
        let addr: SocketAddr = format!("{}:{}", self.config.address, self.config.port)
            .parse()
            .map_err(|error| {
                TransportError::ConnectFailed(format!("invalid listen address: {error}"))
            })?;
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(|error| TransportError::ConnectFailed(error.to_string()))?;
        socket
            .set_reuseaddr(true)
            .map_err(|error| TransportError::ConnectFailed(error.to_string()))?;
        socket
            .bind(addr)
            .map_err(|error| {
                TransportError::ConnectFailed(format!("failed to bind {addr}: {error}"))
            })?;
        socket
            .listen(LISTEN_BACKLOG)
            .map_err(|error| TransportError::ConnectFailed(error.to_string()))
    }

    /// Cancel the acceptor, abort in-flight sessions and join the accept
    /// task. Idempotent.
    pub async fn stop(&self) {
        let state = { self.state.lock().take() };
        let Some(state) = state else {
            return;
        };
        let _ = state.shutdown.send(true);
        if let Err(error) = state.acceptor.await {
            if !error.is_cancelled() {
                tracing::error!(%error, "acceptor task failed");
            }
        }
        tracing::info!("HTTP server stopped");
    }

    /// True iff no listener is active.
    pub fn stopped(&self) -> bool {
        self.state.lock().is_none()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().as_ref().map(|state| state.local_addr)
    }
}

async fn accept_loop(
    listener: TcpListener,
    routes: Arc<HashMap<String, RouteExecutor>>,
    sink: ErrorSink,
    tls: Option<TlsAcceptor>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut sessions = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "accepted connection");
                    sessions.spawn(serve_session(
                        stream,
                        routes.clone(),
                        sink.clone(),
                        tls.clone(),
                    ));
                }
                Err(error) => {
                    // A failed accept never takes the loop down.
                    report(
                        &sink,
                        &Error::Transport(TransportError::ReceiveFailed(format!(
                            "accept failed: {error}"
                        ))),
                    );
                }
            },
            _ = shutdown.changed() => break,
        }
    }
    // In-flight sessions observe the abort and clean up their sockets.
    sessions.abort_all();
    while sessions.join_next().await.is_some() {}
}

async fn serve_session(
    stream: TcpStream,
    routes: Arc<HashMap<String, RouteExecutor>>,
    sink: ErrorSink,
    tls: Option<TlsAcceptor>,
) {
    let service_sink = sink.clone();
    let service = service_fn(move |request| {
        let routes = routes.clone();
        let sink = service_sink.clone();
        async move {
            Ok::<_, std::convert::Infallible>(handle_request(&routes, &sink, request).await)
        }
    });

    let served = match tls {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(tls_stream) => {
                http1::Builder::new()
                    .serve_connection(TokioIo::new(tls_stream), service)
                    .await
            }
            Err(error) => {
                report(
                    &sink,
                    &Error::Transport(TransportError::ReceiveFailed(format!(
                        "TLS handshake failed: {error}"
                    ))),
                );
                return;
            }
        },
        None => {
            http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
        }
    };

    if let Err(error) = served {
        if error.is_incomplete_message() {
            // Client went away mid-request; a graceful close, not a fault.
            tracing::debug!(%error, "client disconnected");
        } else {
            report(
                &sink,
                &Error::Transport(TransportError::ReceiveFailed(error.to_string())),
            );
        }
    }
}

async fn handle_request(
    routes: &HashMap<String, RouteExecutor>,
    sink: &ErrorSink,
    request: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let target = request.uri().path().to_string();

    let Some(executor) = routes.get(&target).cloned() else {
        tracing::warn!(%target, "no executor mounted for path");
        return plain_response(
            StatusCode::NOT_FOUND,
            format!("The resource \"{target}\" was not found."),
        );
    };

    let body = match request.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            report(
                sink,
                &Error::Transport(TransportError::ReceiveFailed(format!(
                    "failed to read request body: {error}"
                ))),
            );
            return plain_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred: \"failed to read request body\"".to_string(),
            );
        }
    };

    if body.is_empty() {
        tracing::warn!(%target, "request has no content");
        return plain_response(StatusCode::BAD_REQUEST, "No content.".to_string());
    }

    match executor(body.to_vec()) {
        Ok(buffer) => buffer_response(buffer),
        Err(error) => {
            let message = format!("An error occurred: \"{error}\"");
            report(sink, &Error::Dispatch(error));
            plain_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

fn buffer_response(buffer: Buffer) -> Response<Full<Bytes>> {
    response_parts(StatusCode::OK)
        .body(Full::new(Bytes::from(buffer)))
        .unwrap()
}

fn plain_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    response_parts(status)
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn response_parts(status: StatusCode) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header(header::SERVER, SERVER_NAME)
        .header(header::CONTENT_TYPE, CONTENT_TYPE_VALUE)
}
