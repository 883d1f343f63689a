//! Tests de integración para el servidor de tareas
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero y habla
//! HTTP/1.0 crudo sobre TCP.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use task_relay::config::Config;
use task_relay::processor::FnProcessor;
use task_relay::server::{Server, ServerHandle};
use task_relay::tasks::{PendingTask, TaskResult, TaskService};
use task_relay::workers::WorkerPool;

/// Response ya parseada
struct HttpResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("body is not JSON")
    }
}

struct TestServer {
    handle: ServerHandle,
    _pool: Arc<WorkerPool>,
}

impl TestServer {
    fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }
}

/// Procesador de prueba:
/// - "hello" → "world"
/// - "boom" → falla
/// - "slow" → tarda 300 ms
/// - cualquier otra cosa → eco con el mismo content-type
fn test_processor(task: PendingTask) -> TaskResult {
    match task.payload.as_slice() {
        b"hello" => TaskResult::success(task.id, b"world".to_vec(), "text/plain"),
        b"boom" => TaskResult::failure(task.id, "boom"),
        b"slow" => {
            thread::sleep(Duration::from_millis(300));
            TaskResult::success(task.id, b"done".to_vec(), "text/plain")
        }
        _ => TaskResult::success(task.id, task.payload, task.content_type),
    }
}

fn start_server(config: Config) -> TestServer {
    let processor = Arc::new(FnProcessor::new(test_processor));
    let (service, pool) = TaskService::with_worker_pool(2, processor).unwrap();
    let handle = Server::bind(&config, Arc::new(service))
        .unwrap()
        .spawn()
        .unwrap();

    TestServer {
        handle,
        _pool: pool,
    }
}

fn start_default_server() -> TestServer {
    start_server(Config {
        port: 0,
        ..Config::default()
    })
}

/// Envía bytes crudos y parsea la response completa
fn send_raw(addr: SocketAddr, raw: &[u8]) -> HttpResponse {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream.write_all(raw).unwrap();
    stream.flush().unwrap();

    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).unwrap();
    parse_response(&bytes)
}

fn parse_response(bytes: &[u8]) -> HttpResponse {
    let split = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response without header terminator");
    let head = std::str::from_utf8(&bytes[..split]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    assert!(status_line.starts_with("HTTP/1.0 "), "status line: {}", status_line);
    let status = status_line.split_whitespace().nth(1).unwrap().parse().unwrap();

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    HttpResponse {
        status,
        headers,
        body: bytes[split + 4..].to_vec(),
    }
}

fn get(addr: SocketAddr, path: &str) -> HttpResponse {
    send_raw(addr, format!("GET {} HTTP/1.0\r\n\r\n", path).as_bytes())
}

fn submit(addr: SocketAddr, body: &[u8], content_type: &str) -> String {
    let mut raw = format!(
        "POST /process HTTP/1.0\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        content_type,
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);

    let response = send_raw(addr, &raw);
    assert_eq!(response.status, 200);
    response.json()["taskId"].as_str().unwrap().to_string()
}

/// Hace polling hasta que el status deje de ser 202
fn poll_until_ready(addr: SocketAddr, task_id: &str) -> HttpResponse {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let response = get(addr, &format!("/result/{}", task_id));
        if response.status != 202 || Instant::now() > deadline {
            return response;
        }
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn test_hello_world() {
    let server = start_default_server();
    let task_id = submit(server.addr(), b"hello", "text/plain");

    let response = poll_until_ready(server.addr(), &task_id);
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.body, b"world");
}

#[test]
fn test_failed_task_returns_500() {
    let server = start_default_server();
    let task_id = submit(server.addr(), b"boom", "text/plain");

    let response = poll_until_ready(server.addr(), &task_id);
    assert_eq!(response.status, 500);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert_eq!(response.body, b"boom");
}

#[test]
fn test_unknown_task_is_processing() {
    let server = start_default_server();

    let response = get(server.addr(), "/result/nonexistent-id");
    assert_eq!(response.status, 202);
    assert_eq!(response.json()["taskId"], "nonexistent-id");
    assert_eq!(response.json()["status"], "processing");
}

#[test]
fn test_pending_then_ready() {
    let server = start_default_server();
    let task_id = submit(server.addr(), b"slow", "text/plain");

    let pending = get(server.addr(), &format!("/result/{}", task_id));
    assert_eq!(pending.status, 202);
    assert_eq!(pending.json()["taskId"], task_id.as_str());

    let ready = poll_until_ready(server.addr(), &task_id);
    assert_eq!(ready.status, 200);
    assert_eq!(ready.body, b"done");

    // Se puede leer más de una vez
    let again = get(server.addr(), &format!("/result/{}", task_id));
    assert_eq!(again.status, 200);
    assert_eq!(again.body, b"done");
}

#[test]
fn test_long_poll_receives_result() {
    let server = start_default_server();
    let task_id = submit(server.addr(), b"slow", "text/plain");

    let start = Instant::now();
    let response = get(server.addr(), &format!("/result/{}?wait=5000", task_id));

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"done");
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_long_poll_is_capped_by_max_wait() {
    let server = start_server(Config {
        port: 0,
        max_wait_ms: 50,
        ..Config::default()
    });
    let task_id = submit(server.addr(), b"slow", "text/plain");

    let start = Instant::now();
    let response = get(server.addr(), &format!("/result/{}?wait=60000", task_id));

    assert_eq!(response.status, 202);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_binary_payload_round_trip() {
    let server = start_default_server();
    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let task_id = submit(server.addr(), &payload, "application/x-blob");

    let response = poll_until_ready(server.addr(), &task_id);
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("application/x-blob"));
    assert_eq!(response.body, payload);
}

#[test]
fn test_forget_result() {
    let server = start_default_server();
    let task_id = submit(server.addr(), b"hello", "text/plain");
    assert_eq!(poll_until_ready(server.addr(), &task_id).status, 200);

    let delete = format!("DELETE /result/{} HTTP/1.0\r\n\r\n", task_id);
    assert_eq!(send_raw(server.addr(), delete.as_bytes()).status, 204);
    assert_eq!(send_raw(server.addr(), delete.as_bytes()).status, 404);
    assert_eq!(get(server.addr(), &format!("/result/{}", task_id)).status, 202);
}

#[test]
fn test_stats_endpoint() {
    let server = start_default_server();
    let task_id = submit(server.addr(), b"hello", "text/plain");
    poll_until_ready(server.addr(), &task_id);

    let stats = get(server.addr(), "/stats").json();
    assert_eq!(stats["submitted"], 1);
    assert_eq!(stats["completed"], 1);
}

#[test]
fn test_concurrent_submissions() {
    let server = start_default_server();
    let addr = server.addr();

    let clients: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let body = format!("payload-{}", i);
                let task_id = submit(addr, body.as_bytes(), "text/plain");
                let response = poll_until_ready(addr, &task_id);
                (task_id, body, response)
            })
        })
        .collect();

    let mut ids = Vec::new();
    for client in clients {
        let (task_id, body, response) = client.join().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, body.as_bytes());
        ids.push(task_id);
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[test]
fn test_wrong_method_and_unknown_route() {
    let server = start_default_server();

    let response = get(server.addr(), "/process");
    assert_eq!(response.status, 405);
    assert!(response.header("Allow").unwrap().contains("POST"));

    let response = get(server.addr(), "/nope");
    assert_eq!(response.status, 404);
}

#[test]
fn test_bad_request() {
    let server = start_default_server();

    let response = send_raw(server.addr(), b"garbage\r\n\r\n");
    assert_eq!(response.status, 400);
    assert_eq!(response.header("Connection"), Some("close"));
}

#[test]
fn test_payload_too_large() {
    let server = start_server(Config {
        port: 0,
        max_payload_bytes: 16,
        ..Config::default()
    });

    let response = send_raw(
        server.addr(),
        b"POST /process HTTP/1.0\r\nContent-Length: 1000\r\n\r\n",
    );
    assert_eq!(response.status, 413);
}

#[test]
fn test_common_headers() {
    let server = start_default_server();
    let response = get(server.addr(), "/stats");

    assert_eq!(response.header("Connection"), Some("close"));
    assert!(response.header("Server").is_some());
    assert!(response.header("X-Request-Id").is_some());
    assert_eq!(
        response.header("Content-Length"),
        Some(response.body.len().to_string().as_str())
    );
}
