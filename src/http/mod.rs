//! # Módulo HTTP
//!
//! Implementación mínima de HTTP/1.0 escrita a mano:
//!
//! - Parsing de requests (con body binario)
//! - Construcción de responses
//! - Códigos de estado
//!
//! Cada conexión atiende un único request y se cierra
//! (`Connection: close`).

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;
