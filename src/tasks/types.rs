//! # Tipos y Estructuras para el Sistema de Tareas
//! src/tasks/types.rs
//!
//! Define los datos que viajan entre el handler de envío, el procesador
//! externo y el registro de resultados.

use crate::tasks::TaskId;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Metadatos arbitrarios clave-valor asociados a un envío
pub type Metadata = Map<String, Value>;

/// Parsea el header `X-Metadata`.
///
/// Cualquier cosa que no sea un objeto JSON se ignora y se usa
/// metadata vacía.
pub fn parse_metadata(raw: Option<&str>) -> Metadata {
    let Some(raw) = raw else {
        return Metadata::new();
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(kind = %json_kind(&other), "X-Metadata is not a JSON object, ignoring");
            Metadata::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "malformed X-Metadata, ignoring");
            Metadata::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Trabajo pendiente entregado al procesador externo.
///
/// Se construye en el envío y se consume al procesarse; el registro
/// nunca lo guarda.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTask {
    pub id: TaskId,
    pub payload: Vec<u8>,
    pub content_type: String,
    pub metadata: Metadata,
}

impl PendingTask {
    pub fn new(id: TaskId, payload: Vec<u8>, content_type: String, metadata: Metadata) -> Self {
        Self {
            id,
            payload,
            content_type,
            metadata,
        }
    }
}

/// Resultado de procesar una tarea
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub id: TaskId,
    pub payload: Vec<u8>,
    pub content_type: String,
    pub success: bool,
    /// Descripción legible del fallo (solo si `success == false`)
    pub error: Option<String>,
}

impl TaskResult {
    /// Resultado exitoso con payload y content-type
    pub fn success(id: TaskId, payload: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
            content_type: content_type.into(),
            success: true,
            error: None,
        }
    }

    /// Resultado fallido con descripción del error
    pub fn failure(id: TaskId, error: impl Into<String>) -> Self {
        Self {
            id,
            payload: Vec::new(),
            content_type: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }

    /// Mensaje de error, o uno genérico si el procesador no dio ninguno
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }
}

/// Observación puntual del estado de una tarea
#[derive(Debug, Clone, PartialEq)]
pub enum ResultStatus {
    /// Hay resultado (exitoso o fallido)
    Ready(Arc<TaskResult>),

    /// Todavía en proceso, o id desconocido (no se distinguen)
    NotReady,
}

impl ResultStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ResultStatus::Ready(_))
    }
}
