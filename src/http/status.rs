//! # Códigos de Estado HTTP
//!
//! Los códigos que usa el servidor:
//!
//! - **2xx**: 200 (resultado listo / envío aceptado), 202 (en proceso),
//!   204 (resultado liberado)
//! - **4xx**: 400, 404, 405, 413
//! - **5xx**: 500 (la tarea falló)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,

    /// 202 Accepted - La tarea sigue en proceso, reintentar más tarde
    Accepted = 202,

    /// 204 No Content
    NoContent = 204,

    /// 400 Bad Request - Request malformado
    BadRequest = 400,

    /// 404 Not Found
    NotFound = 404,

    /// 405 Method Not Allowed - La ruta existe pero no con ese método
    MethodNotAllowed = 405,

    /// 413 Payload Too Large - El body supera el máximo configurado
    PayloadTooLarge = 413,

    /// 500 Internal Server Error - La tarea terminó con error
    InternalServerError = 500,
}

impl StatusCode {
    /// ```
    /// use task_relay::http::StatusCode;
    /// assert_eq!(StatusCode::Accepted.as_u16(), 202);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Accepted => "Accepted",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
