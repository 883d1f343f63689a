//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea método + path a un handler.
//!
//! ```text
//! Request → Router → Handler(request, params, state) → Response
//! ```
//!
//! Los patrones admiten segmentos `:nombre` que capturan un segmento del
//! path (ej: `/result/:id`). Si el path coincide pero el método no, se
//! responde 405; si nada coincide, 404.

use crate::http::{Method, Request, Response, StatusCode};
use std::collections::HashMap;

/// Valor del header `Server`
pub const SERVER_NAME: &str = "task-relay/0.1";

/// Segmentos capturados por el patrón de la ruta
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|s| s.as_str())
    }
}

/// Un handler recibe el request, los parámetros del path y el estado compartido
pub type Handler<S> = fn(&Request, &PathParams, &S) -> Response;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route<S> {
    method: Method,
    segments: Vec<Segment>,
    handler: Handler<S>,
}

impl<S> Route<S> {
    /// Retorna los parámetros si el path coincide con el patrón
    fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = split_path(path).collect();

        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        Some(PathParams(params))
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Router que mapea rutas a handlers sobre un estado `S`
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta
    ///
    /// ```
    /// use task_relay::router::{PathParams, Router};
    /// use task_relay::http::{Method, Request, Response, StatusCode};
    ///
    /// fn echo_id(_req: &Request, params: &PathParams, _state: &()) -> Response {
    ///     Response::text(StatusCode::Ok, params.get("id").unwrap_or(""))
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/echo/:id", echo_id);
    ///
    /// let request = Request::parse(b"GET /echo/42 HTTP/1.0\r\n\r\n").unwrap();
    /// assert_eq!(router.route(&request, &()).body(), b"42");
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler<S>) {
        let segments = split_path(pattern)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        self.routes.push(Route {
            method,
            segments,
            handler,
        });
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let path = request.path();
        let mut allowed = Vec::new();

        for route in &self.routes {
            let Some(params) = route.matches(path) else {
                continue;
            };

            if route.method == request.method() {
                let mut response = (route.handler)(request, &params, state);
                add_common_headers(&mut response);
                return response;
            }

            allowed.push(route.method.as_str());
        }

        let mut response = if allowed.is_empty() {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        } else {
            Response::error(
                StatusCode::MethodNotAllowed,
                &format!("Method {} not allowed on {}", request.method().as_str(), path),
            )
            .with_header("Allow", &allowed.join(", "))
        };
        add_common_headers(&mut response);
        response
    }
}

/// Headers comunes a todas las respuestas, ruteadas o no
pub fn add_common_headers(response: &mut Response) {
    response.add_header("Server", SERVER_NAME);
    response.add_header("Connection", "close");
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}
