//! # Handlers HTTP para Tareas
//! src/tasks/handlers.rs
//!
//! Endpoints:
//! - `POST /process` - Enviar un trabajo
//! - `GET /result/:id` - Consultar el resultado (`?wait=MS` para esperar)
//! - `DELETE /result/:id` - Liberar un resultado
//! - `GET /stats` - Contadores del registro

use crate::http::{Method, Request, Response, StatusCode};
use crate::router::{PathParams, Router};
use crate::tasks::{parse_metadata, ResultStatus, TaskId, TaskResult, TaskService};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Content-type cuando el procesador no indicó ninguno
const DEFAULT_RESULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Estado compartido por los handlers de tareas
pub struct TaskApi {
    service: Arc<TaskService>,

    /// Tope para `?wait=MS`
    max_wait: Duration,
}

impl TaskApi {
    pub fn new(service: Arc<TaskService>, max_wait: Duration) -> Self {
        Self { service, max_wait }
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }
}

/// Router con todas las rutas de tareas
pub fn routes() -> Router<TaskApi> {
    let mut router = Router::new();
    router.register(Method::POST, "/process", submit_handler);
    router.register(Method::GET, "/result/:id", result_handler);
    router.register(Method::DELETE, "/result/:id", forget_handler);
    router.register(Method::GET, "/stats", stats_handler);
    router
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    task_id: TaskId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessingResponse<'a> {
    task_id: &'a str,
    status: &'static str,
}

/// Handler para `POST /process`
///
/// Acepta el body como bytes opacos. `Content-Type` se guarda como tag y
/// `X-Metadata` (objeto JSON) como metadata; si no parsea, se ignora.
///
/// # Ejemplo de response
/// ```json
/// {"taskId": "6f1c...-..."}
/// ```
pub fn submit_handler(req: &Request, _params: &PathParams, api: &TaskApi) -> Response {
    let content_type = req.header("Content-Type").unwrap_or_default().to_string();
    let metadata = parse_metadata(req.header("X-Metadata"));

    let task_id = api
        .service
        .submit(req.body().to_vec(), content_type, metadata);

    Response::json(StatusCode::Ok, &SubmitResponse { task_id })
}

/// Handler para `GET /result/:id`
///
/// - 200 con el payload y su content-type si terminó bien
/// - 500 con la descripción del error si falló
/// - 202 `{"taskId": ..., "status": "processing"}` si no hay resultado,
///   incluyendo ids desconocidos o que no son UUID
pub fn result_handler(req: &Request, params: &PathParams, api: &TaskApi) -> Response {
    let raw_id = params.get("id").unwrap_or_default();

    let Ok(id) = raw_id.parse::<TaskId>() else {
        return processing_response(raw_id);
    };

    let status = match requested_wait(req, api.max_wait) {
        Some(wait) => api.service.wait_result(&id, wait),
        None => api.service.get_result(&id),
    };

    match status {
        ResultStatus::Ready(result) => ready_response(&result),
        ResultStatus::NotReady => processing_response(raw_id),
    }
}

/// Handler para `DELETE /result/:id`
pub fn forget_handler(_req: &Request, params: &PathParams, api: &TaskApi) -> Response {
    let raw_id = params.get("id").unwrap_or_default();

    match raw_id.parse::<TaskId>() {
        Ok(id) if api.service.forget(&id) => Response::new(StatusCode::NoContent),
        _ => Response::error(StatusCode::NotFound, &format!("No stored result for {}", raw_id)),
    }
}

/// Handler para `GET /stats`
pub fn stats_handler(_req: &Request, _params: &PathParams, api: &TaskApi) -> Response {
    Response::json(StatusCode::Ok, &api.service.stats())
}

/// `?wait=MS` acotado a `max_wait`; `None` si no vino o no es numérico
fn requested_wait(req: &Request, max_wait: Duration) -> Option<Duration> {
    let millis: u64 = req.query_param("wait")?.parse().ok()?;
    Some(Duration::from_millis(millis).min(max_wait))
}

fn ready_response(result: &TaskResult) -> Response {
    if !result.success {
        return Response::text(StatusCode::InternalServerError, result.error_message());
    }

    let content_type = if result.content_type.is_empty() {
        DEFAULT_RESULT_CONTENT_TYPE
    } else {
        result.content_type.as_str()
    };

    Response::bytes(StatusCode::Ok, content_type, result.payload.clone())
}

fn processing_response(raw_id: &str) -> Response {
    Response::json(
        StatusCode::Accepted,
        &ProcessingResponse {
            task_id: raw_id,
            status: "processing",
        },
    )
}
