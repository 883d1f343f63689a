//! # Errores del Servidor
//! src/error.rs
//!
//! Tipos de error compartidos por el servidor, el registro de tareas
//! y el parser HTTP.

use crate::tasks::TaskId;

/// Errores de arranque y operación del servidor
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No se pudo hacer bind al puerto (fatal en el arranque)
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuración con valores inválidos
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errores del registro de tareas
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Ya existe un resultado para ese id; nunca se sobrescribe
    #[error("task {0} already has a completed result")]
    AlreadyCompleted(TaskId),
}

/// Errores que pueden ocurrir durante el parsing de un request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,

    /// Request incompleto o truncado
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Método HTTP no soportado
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Versión HTTP incorrecta
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Content-Length no numérico
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),
}
