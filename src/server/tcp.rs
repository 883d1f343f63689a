//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del servidor TCP que maneja múltiples conexiones
//! simultáneas usando threads. Cada conexión se procesa en su propio thread
//! y atiende exactamente un request (HTTP/1.0, `Connection: close`).

use crate::config::Config;
use crate::error::ServerError;
use crate::http::request::{find_subsequence, HEADER_TERMINATOR};
use crate::http::{Request, Response, StatusCode};
use crate::router::{add_common_headers, Router};
use crate::tasks::handlers::{self, TaskApi};
use crate::tasks::TaskService;
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Tamaño del buffer de lectura del socket
const READ_CHUNK: usize = 8192;

/// Límite para la request line más los headers
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Límites aplicados a cada conexión
#[derive(Debug, Clone, Copy)]
struct ConnectionLimits {
    read_timeout: Duration,
    write_timeout: Duration,
    max_payload: usize,
}

/// Lo que comparten todos los threads de conexión
struct ConnectionContext {
    router: Router<TaskApi>,
    api: TaskApi,
    limits: ConnectionLimits,
}

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error("connection closed before sending a request")]
    Closed,

    #[error("request headers exceed {0} bytes")]
    HeadersTooLarge(usize),

    #[error("payload of {length} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { length: usize, limit: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    listener: TcpListener,
    context: Arc<ConnectionContext>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Hace bind a `config.address()`. Un fallo aquí es fatal para el arranque.
    pub fn bind(config: &Config, service: Arc<TaskService>) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        let context = ConnectionContext {
            router: handlers::routes(),
            api: TaskApi::new(service, config.max_wait()),
            limits: ConnectionLimits {
                read_timeout: config.read_timeout(),
                write_timeout: config.write_timeout(),
                max_payload: config.max_payload_bytes,
            },
        };

        Ok(Self {
            listener,
            context: Arc::new(context),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Acepta conexiones hasta que se pida el shutdown. Bloquea el thread.
    pub fn run(self) -> Result<(), ServerError> {
        let local_addr = self.local_addr()?;
        tracing::info!(%local_addr, "server listening (one thread per connection)");

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let context = Arc::clone(&self.context);
                    let spawned = thread::Builder::new()
                        .name("http-conn".to_string())
                        .spawn(move || handle_connection(stream, &context));

                    if let Err(e) = spawned {
                        tracing::error!(error = %e, "failed to spawn connection thread");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                }
            }
        }

        tracing::info!(%local_addr, "server stopped");
        Ok(())
    }

    /// Corre el servidor en un thread propio y retorna un handle para detenerlo
    pub fn spawn(self) -> Result<ServerHandle, ServerError> {
        let local_addr = self.local_addr()?;
        let shutdown = Arc::clone(&self.shutdown);

        let handle = thread::Builder::new()
            .name("http-acceptor".to_string())
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            local_addr,
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle de un servidor corriendo en background. Drop lo detiene.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<(), ServerError>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Detiene el loop de accept y espera al thread
    ///
    /// Las conexiones en curso terminan por su cuenta.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.shutdown.store(true, Ordering::SeqCst);

        // Despertar al accept bloqueado
        let _ = TcpStream::connect(wake_address(self.local_addr));

        match handle.join() {
            Ok(Err(e)) => tracing::error!(error = %e, "server exited with error"),
            Err(_) => tracing::error!("server thread panicked"),
            Ok(Ok(())) => {}
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// No se puede conectar a 0.0.0.0; se usa loopback con el mismo puerto
fn wake_address(mut addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        if addr.is_ipv4() {
            addr.set_ip(Ipv4Addr::LOCALHOST.into());
        } else {
            addr.set_ip(Ipv6Addr::LOCALHOST.into());
        }
    }
    addr
}

fn handle_connection(mut stream: TcpStream, context: &ConnectionContext) {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    if let Err(e) = configure_stream(&stream, &context.limits) {
        tracing::warn!(%peer, error = %e, "failed to configure socket timeouts");
        return;
    }

    let (mut response, method, path) = match read_request(&mut stream, context.limits.max_payload) {
        Ok(raw) => match Request::parse(&raw) {
            Ok(request) => {
                let response = context.router.route(&request, &context.api);
                (response, request.method().as_str(), request.path().to_string())
            }
            Err(e) => {
                tracing::debug!(%peer, error = %e, "unparsable request");
                let response = Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e));
                (response, "-", "-".to_string())
            }
        },
        Err(ReadError::Closed) => {
            tracing::debug!(%peer, "connection closed without a request");
            return;
        }
        Err(e @ ReadError::PayloadTooLarge { .. }) => {
            (Response::error(StatusCode::PayloadTooLarge, &e.to_string()), "-", "-".to_string())
        }
        Err(e @ ReadError::HeadersTooLarge(_)) => {
            (Response::error(StatusCode::BadRequest, &e.to_string()), "-", "-".to_string())
        }
        Err(ReadError::Io(e)) => {
            tracing::debug!(%peer, error = %e, "failed to read request");
            return;
        }
    };

    add_common_headers(&mut response);
    response.add_header("X-Request-Id", &request_id);

    let written = stream
        .write_all(&response.to_bytes())
        .and_then(|_| stream.flush());

    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    match written {
        Ok(()) => tracing::info!(
            request_id = %request_id,
            %peer,
            method,
            path = %path,
            status = response.status().as_u16(),
            latency_ms,
            "request served"
        ),
        Err(e) => tracing::warn!(
            request_id = %request_id,
            %peer,
            error = %e,
            "failed to write response"
        ),
    }
}

fn configure_stream(stream: &TcpStream, limits: &ConnectionLimits) -> io::Result<()> {
    stream.set_read_timeout(Some(limits.read_timeout))?;
    stream.set_write_timeout(Some(limits.write_timeout))?;
    Ok(())
}

/// Lee los headers completos y luego `Content-Length` bytes de body
///
/// Si la conexión se corta antes, retorna lo que llegó y el parser decide.
fn read_request(stream: &mut impl Read, max_payload: usize) -> Result<Vec<u8>, ReadError> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let header_end = loop {
        if let Some(pos) = find_subsequence(&buffer, HEADER_TERMINATOR) {
            break pos;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Err(ReadError::HeadersTooLarge(MAX_HEADER_BYTES));
        }

        let n = stream.read(&mut chunk)?;
        if n == 0 {
            if buffer.is_empty() {
                return Err(ReadError::Closed);
            }
            return Ok(buffer);
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let content_length = declared_content_length(&buffer[..header_end]).unwrap_or(0);
    if content_length > max_payload {
        return Err(ReadError::PayloadTooLarge {
            length: content_length,
            limit: max_payload,
        });
    }

    let total = header_end + HEADER_TERMINATOR.len() + content_length;
    buffer.reserve(total.saturating_sub(buffer.len()));

    while buffer.len() < total {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    Ok(buffer)
}

/// `Content-Length` de la cabecera cruda; `None` si falta o no es numérico
fn declared_content_length(head: &[u8]) -> Option<usize> {
    let head = std::str::from_utf8(head).ok()?;

    head.split("\r\n").skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}
