//! Pooled HTTP(S) client transport.
//!
//! Each request travels as the body of an HTTP/1.1 `POST` to the configured
//! location; the response body is the reply buffer. Connections are kept
//! alive and recycled through a FIFO pool. A transport failure mid-call
//! closes the session (it is never returned to the pool) and the call is
//! retried exactly once on a freshly-acquired session; a second failure
//! surfaces to the caller.
//!
//! The remote endpoint is resolved once, at construction.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::header::{CONNECTION, CONTENT_TYPE, HOST, USER_AGENT};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_rustls::rustls;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

use nanorpc_common::error::{default_error_sink, report, Error, ErrorSink, TransportError};
use nanorpc_common::frame::Buffer;
use nanorpc_common::transport::{BoxFuture, CallExecutor};

use crate::pool::SessionPool;

const USER_AGENT_NAME: &str = "nanorpc";
// Vestigial content type inherited from the wire protocol. The payload is
// binary-safe regardless; peers expect this exact value.
const CONTENT_TYPE_VALUE: &str = "text/html";

/// Configuration for the HTTP client transport.
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub location: String,
    pub tls: Option<Arc<rustls::ClientConfig>>,
    pub error_sink: ErrorSink,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            workers: 1,
            location: "/".into(),
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

    /// URL path the remote dispatcher is mounted at, e.g. `/api/`.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Enable TLS with a fully-initialized rustls configuration. The client
    /// performs a TLS client handshake on every new connection.
    pub fn tls(mut self, config: Arc<rustls::ClientConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    pub fn error_sink(mut self, sink: ErrorSink) -> Self {
        self.error_sink = sink;
        self
    }
}

/// A keep-alive connection: the hyper request sender plus the task driving
/// the connection I/O. Owned by the pool at rest and by exactly one caller
/// while a request is in flight.
pub(crate) struct Session {
    sender: http1::SendRequest<Full<Bytes>>,
    driver: tokio::task::JoinHandle<()>,
}

impl Session {
    pub(crate) fn healthy(&self) -> bool {
        !self.sender.is_closed()
    }

    pub(crate) fn close(self) {
        self.driver.abort();
    }
}

/// Pooled HTTP(S) transport bound to one remote `(host, port, location)`.
///
/// Cheap to clone; all clones share the same pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

struct Inner {
    endpoints: Vec<SocketAddr>,
    authority: String,
    location: String,
    workers: usize,
    tls: Option<(TlsConnector, ServerName<'static>)>,
    pool: SessionPool<Session>,
    stopped: AtomicBool,
    error_sink: ErrorSink,
}

impl HttpClient {
    /// Resolve the endpoint and prepare an empty session pool. No connection
    /// is opened until the first call.
    pub async fn connect(config: ClientConfig) -> Result<Self, TransportError> {
        let endpoints: Vec<SocketAddr> =
            tokio::net::lookup_host((config.host.as_str(), config.port))
                .await
                .map_err(|error| {
                    TransportError::ConnectFailed(format!(
                        "failed to resolve {}:{}: {error}",
                        config.host, config.port
                    ))
                })?
                .collect();
        if endpoints.is_empty() {
            return Err(TransportError::ConnectFailed(format!(
                "no addresses for {}:{}",
                config.host, config.port
            )));
        }

        let tls = match config.tls {
            Some(tls_config) => {
                let name = ServerName::try_from(config.host.clone()).map_err(|error| {
                    TransportError::ConnectFailed(format!(
                        "invalid TLS server name {:?}: {error}",
                        config.host
                    ))
                })?;
                Some((TlsConnector::from(tls_config), name))
            }
            None => None,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                authority: format!("{}:{}", config.host, config.port),
                endpoints,
                location: config.location,
                workers: config.workers.max(1),
                tls,
                pool: SessionPool::new(),
                stopped: AtomicBool::new(false),
                error_sink: config.error_sink,
            }),
        })
    }

    pub fn workers(&self) -> usize {
        self.inner.workers
    }

    /// Number of sessions constructed so far. Stays flat while the pool is
    /// recycling connections.
    pub fn created_sessions(&self) -> u64 {
        self.inner.pool.created()
    }

    /// Close every pooled session. Calls already in flight observe
    /// [`TransportError::Aborted`]; new calls are refused.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        for session in self.inner.pool.drain() {
            session.close();
        }
    }

    pub fn stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Ship one request buffer and await the response buffer, retrying once
    /// on a fresh session after a transport failure.
    pub async fn send(&self, request: Buffer) -> Result<Buffer, TransportError> {
        // The retry path needs the payload a second time; Bytes makes that
        // reuse a cheap handle clone.
        let body = Bytes::from(request);

        let mut session = self.acquire().await?;
        match self.roundtrip(&mut session, body.clone()).await {
            Ok(response) => {
                self.release(session);
                Ok(response)
            }
            Err(TransportError::Aborted) => {
                session.close();
                Err(TransportError::Aborted)
            }
            Err(first) => {
                session.close();
                tracing::warn!(error = %first, "request failed, retrying on a fresh session");
                report(&self.inner.error_sink, &Error::Transport(first));

                let mut fresh = self.acquire().await?;
                match self.roundtrip(&mut fresh, body).await {
                    Ok(response) => {
                        self.release(fresh);
                        Ok(response)
                    }
                    Err(TransportError::Aborted) => {
                        fresh.close();
                        Err(TransportError::Aborted)
                    }
                    Err(second) => {
                        fresh.close();
                        Err(TransportError::SendFailed(second.to_string()))
                    }
                }
            }
        }
    }

    async fn acquire(&self) -> Result<Session, TransportError> {
        if self.stopped() {
            return Err(TransportError::Aborted);
        }
        if let Some(session) = self.inner.pool.checkout() {
            return Ok(session);
        }
        self.open_session().await
    }

    fn release(&self, session: Session) {
        if session.healthy() && !self.stopped() {
            self.inner.pool.checkin(session);
        } else {
            session.close();
        }
    }

    async fn open_session(&self) -> Result<Session, TransportError> {
        let stream = self.connect_any().await?;
        let session = match &self.inner.tls {
            Some((connector, name)) => {
                let tls_stream =
                    connector
                        .connect(name.clone(), stream)
                        .await
                        .map_err(|error| {
                            TransportError::ConnectFailed(format!("TLS handshake failed: {error}"))
                        })?;
                self.handshake(TokioIo::new(tls_stream)).await?
            }
            None => self.handshake(TokioIo::new(stream)).await?,
        };
        self.inner.pool.record_created();
        Ok(session)
    }

    async fn connect_any(&self) -> Result<TcpStream, TransportError> {
        let mut last_error = None;
        for addr in &self.inner.endpoints {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(error) => last_error = Some(error),
            }
        }
        Err(TransportError::ConnectFailed(match last_error {
            Some(error) => error.to_string(),
            None => "no endpoints".into(),
        }))
    }

    async fn handshake<IO>(&self, io: IO) -> Result<Session, TransportError>
    where
        IO: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
    {
        let (sender, connection) = http1::handshake::<_, Full<Bytes>>(io)
            .await
            .map_err(|error| {
                TransportError::ConnectFailed(format!("HTTP handshake failed: {error}"))
            })?;
        let sink = self.inner.error_sink.clone();
        let driver = tokio::spawn(async move {
            // Closed-socket conditions surface here; report, never panic.
            if let Err(error) = connection.await {
                report(
                    &sink,
                    &Error::Transport(TransportError::ReceiveFailed(error.to_string())),
                );
            }
        });
        Ok(Session { sender, driver })
    }

    async fn roundtrip(
        &self,
        session: &mut Session,
        body: Bytes,
    ) -> Result<Buffer, TransportError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.inner.location.as_str())
            .header(HOST, self.inner.authority.as_str())
            .header(USER_AGENT, USER_AGENT_NAME)
            .header(CONTENT_TYPE, CONTENT_TYPE_VALUE)
            .header(CONNECTION, "keep-alive")
            .body(Full::new(body))
            .map_err(|error| TransportError::SendFailed(error.to_string()))?;

        session
            .sender
            .ready()
            .await
            .map_err(|error| self.send_error(error))?;
        let response = session
            .sender
            .send_request(request)
            .await
            .map_err(|error| self.send_error(error))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|error| {
                if self.stopped() {
                    TransportError::Aborted
                } else {
                    TransportError::ReceiveFailed(error.to_string())
                }
            })?
            .to_bytes();

        if !status.is_success() {
            return Err(TransportError::SendFailed(format!(
                "HTTP status {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        Ok(body.to_vec())
    }

    fn send_error(&self, error: hyper::Error) -> TransportError {
        if self.stopped() {
            TransportError::Aborted
        } else {
            TransportError::SendFailed(error.to_string())
        }
    }
}

impl CallExecutor for HttpClient {
    fn execute(&self, request: Buffer) -> BoxFuture<'static, Result<Buffer, TransportError>> {
        let client = self.clone();
        Box::pin(async move { client.send(request).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_are_clamped_to_at_least_one() {
        let config = ClientConfig::new("localhost", 8080).workers(0);
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn location_defaults_to_root() {
        let config = ClientConfig::new("localhost", 8080);
        assert_eq!(config.location, "/");
        let config = config.location("/api/");
        assert_eq!(config.location, "/api/");
    }

    #[tokio::test]
    async fn connect_resolves_loopback() {
        let client = HttpClient::connect(ClientConfig::new("127.0.0.1", 4242))
            .await
            .unwrap();
        assert!(!client.stopped());
        assert_eq!(client.created_sessions(), 0);
    }

    #[tokio::test]
    async fn stopped_client_refuses_calls() {
        let client = HttpClient::connect(ClientConfig::new("127.0.0.1", 4242))
            .await
            .unwrap();
        client.stop();
        assert!(client.stopped());
        let error = client.send(b"1 2 ".to_vec()).await.err().expect("refused");
        assert!(matches!(error, TransportError::Aborted));
    }

    #[tokio::test]
    async fn connection_refused_is_a_connect_failure() {
        let client = HttpClient::connect(ClientConfig::new("127.0.0.1", 1))
            .await
            .unwrap();
        let error = client.send(b"1 2 ".to_vec()).await.err().expect("no server");
        assert!(matches!(error, TransportError::ConnectFailed(_)));
    }
}
