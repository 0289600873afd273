//! End-to-end RPC scenarios over real loopback HTTP.
//!
//! Scenarios:
//! 1. Echo (string in, string out)
//! 2. No args, no return (header-only response)
//! 3. CRUD on a keyed record, including a handler failure on double delete
//! 4. Unknown procedure surfaces as a transport send failure
//! 5. Keep-alive reuses one pooled session across sequential calls
//! 6. Mid-call connection reset triggers a single retry on a fresh session

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use nanorpc::error::{ClientError, HandlerError, TransportError};
use nanorpc::{Client, ClientConfig, HttpClient, HttpServer, Server, ServerConfig};

const LOCATION: &str = "/api/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Employee {
    name: String,
    age: u32,
    email: String,
}

fn employee() -> Employee {
    Employee {
        name: "Scotty".into(),
        age: 45,
        email: "scotty@enterprise.example".into(),
    }
}

fn start_http(rpc: Server) -> (HttpServer, SocketAddr) {
    let mut http = HttpServer::new(ServerConfig::new("127.0.0.1", 0));
    http.mount(LOCATION, rpc.into_route());
    let addr = http.run().unwrap();
    (http, addr)
}

async fn connect(addr: SocketAddr) -> (Client, HttpClient) {
    let transport = HttpClient::connect(
        ClientConfig::new("127.0.0.1", addr.port()).location(LOCATION),
    )
    .await
    .unwrap();
    (Client::new(Arc::new(transport.clone())), transport)
}

// ============================================================================
// Scenario 1: Echo
// ============================================================================

#[tokio::test]
async fn echo_round_trips_through_http() {
    let mut rpc = Server::new();
    rpc.handle("test", |s: String| format!("Tested: {s}"))
        .unwrap();
    let (http, addr) = start_http(rpc);
    let (client, transport) = connect(addr).await;

    let reply: String = client
        .call("test", ("abc",))
        .await
        .unwrap()
        .result()
        .unwrap();
    assert_eq!(reply, "Tested: abc");

    transport.stop();
    http.stop().await;
}

// ============================================================================
// Scenario 2: No args, no return
// ============================================================================

#[tokio::test]
async fn ping_returns_a_header_only_response() {
    let mut rpc = Server::new();
    rpc.handle("ping", || ()).unwrap();
    let (http, addr) = start_http(rpc);
    let (client, transport) = connect(addr).await;

    client.call("ping", ()).await.unwrap().unit().unwrap();

    transport.stop();
    http.stop().await;
}

// ============================================================================
// Scenario 3: CRUD on a keyed record
// ============================================================================

fn crud_server() -> Server {
    let storage: Arc<Mutex<HashMap<String, Employee>>> = Arc::new(Mutex::new(HashMap::new()));
    let mut rpc = Server::new();

    let db = storage.clone();
    rpc.handle("create", move |id: String, employee: Employee| -> String {
        db.lock().unwrap().insert(id.clone(), employee);
        id
    })
    .unwrap();

    let db = storage.clone();
    rpc.handle("read", move |id: String| -> Result<Employee, HandlerError> {
        db.lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| HandlerError::failed(format!("employee \"{id}\" not found")))
    })
    .unwrap();

    let db = storage.clone();
    rpc.handle(
        "update",
        move |id: String, employee: Employee| -> Result<(), HandlerError> {
            match db.lock().unwrap().get_mut(&id) {
                Some(slot) => {
                    *slot = employee;
                    Ok(())
                }
                None => Err(HandlerError::failed(format!("employee \"{id}\" not found"))),
            }
        },
    )
    .unwrap();

    let db = storage;
    rpc.handle("delete", move |id: String| -> Result<(), HandlerError> {
        db.lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| HandlerError::failed(format!("employee \"{id}\" not found")))
    })
    .unwrap();

    rpc
}

#[tokio::test]
async fn crud_sequence_runs_and_double_delete_fails() {
    let (http, addr) = start_http(crud_server());
    let (client, transport) = connect(addr).await;

    let original = employee();
    let id: String = client
        .call("create", ("e1", original.clone()))
        .await
        .unwrap()
        .result()
        .unwrap();
    assert_eq!(id, "e1");

    let read_back: Employee = client
        .call("read", ("e1",))
        .await
        .unwrap()
        .result()
        .unwrap();
    assert_eq!(read_back, original);

    let updated = Employee {
        age: 46,
        ..original
    };
    client
        .call("update", ("e1", updated.clone()))
        .await
        .unwrap()
        .unit()
        .unwrap();

    let read_back: Employee = client
        .call("read", ("e1",))
        .await
        .unwrap()
        .result()
        .unwrap();
    assert_eq!(read_back, updated);

    client.call("delete", ("e1",)).await.unwrap().unit().unwrap();

    // The handler reports "not found"; the server answers 500 and the
    // transport surfaces a send failure after its single retry.
    let error = client
        .call("delete", ("e1",))
        .await
        .err()
        .expect("second delete must fail");
    assert!(matches!(
        error,
        ClientError::Transport(TransportError::SendFailed(_))
    ));

    transport.stop();
    http.stop().await;
}

// ============================================================================
// Scenario 4: Unknown procedure
// ============================================================================

#[tokio::test]
async fn unknown_procedure_surfaces_as_send_failure() {
    let mut rpc = Server::new();
    rpc.handle("known", || ()).unwrap();
    let (http, addr) = start_http(rpc);
    let (client, transport) = connect(addr).await;

    let error = client
        .call("never_registered", ())
        .await
        .err()
        .expect("must fail");
    assert!(matches!(
        error,
        ClientError::Transport(TransportError::SendFailed(_))
    ));

    transport.stop();
    http.stop().await;
}

// ============================================================================
// Scenario 5: Keep-alive reuse
// ============================================================================

#[tokio::test]
async fn sequential_calls_reuse_one_pooled_session() {
    let mut rpc = Server::new();
    rpc.handle("test", |s: String| format!("Tested: {s}"))
        .unwrap();
    let (http, addr) = start_http(rpc);
    let (client, transport) = connect(addr).await;

    for i in 0..3 {
        let reply: String = client
            .call("test", (format!("call {i}"),))
            .await
            .unwrap()
            .result()
            .unwrap();
        assert_eq!(reply, format!("Tested: call {i}"));
    }
    assert_eq!(transport.created_sessions(), 1);

    transport.stop();
    http.stop().await;
}

// ============================================================================
// Scenario 6: Retry on mid-call reset
// ============================================================================

/// Minimal HTTP/1.1 double that dispatches into a real `Server`, but drops
/// the first connection right after its first response: the server side of
/// "a pooled session dies between calls".
async fn start_flaky_http(rpc: Server) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rpc = Arc::new(rpc);

    tokio::spawn(async move {
        let mut first_connection = true;
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let rpc = rpc.clone();
            let drop_after_one = first_connection;
            first_connection = false;
            tokio::spawn(async move {
                loop {
                    let Some(body) = read_http_request(&mut stream).await else {
                        break;
                    };
                    let reply = rpc.execute(body).unwrap();
                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
                        reply.len()
                    );
                    if stream.write_all(head.as_bytes()).await.is_err() {
                        break;
                    }
                    if stream.write_all(&reply).await.is_err() {
                        break;
                    }
                    let _ = stream.flush().await;
                    if drop_after_one {
                        break;
                    }
                }
            });
        }
    });
    addr
}

async fn read_http_request(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buffered = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = buffered
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
        {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buffered.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buffered[..header_end]).to_string();
    let content_length: usize = head.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })?;

    let mut body = buffered[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);
    Some(body)
}

#[tokio::test]
async fn reset_pooled_session_is_retried_once_on_a_fresh_session() {
    let mut rpc = Server::new();
    rpc.handle("test", |s: String| format!("Tested: {s}"))
        .unwrap();
    let addr = start_flaky_http(rpc).await;
    let (client, transport) = connect(addr).await;

    let reply: String = client
        .call("test", ("one",))
        .await
        .unwrap()
        .result()
        .unwrap();
    assert_eq!(reply, "Tested: one");
    assert_eq!(transport.created_sessions(), 1);

    // Give the server's FIN time to land on the pooled session.
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The pooled session is dead; the call fails once, retries on a fresh
    // session and succeeds.
    let reply: String = client
        .call("test", ("two",))
        .await
        .unwrap()
        .result()
        .unwrap();
    assert_eq!(reply, "Tested: two");
    assert_eq!(transport.created_sessions(), 2);

    transport.stop();
}
