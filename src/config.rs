//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI con fallback a variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./task_relay --port 8080 \
//!   --workers 4 \
//!   --retention-secs 3600 \
//!   --max-wait-ms 30000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 WORKERS=8 ./task_relay
//! ```

use crate::error::ServerError;
use clap::Parser;
use std::time::Duration;

/// Configuración del servidor de tareas
#[derive(Debug, Clone, Parser)]
#[command(name = "task_relay")]
#[command(about = "Servidor HTTP/1.0 que procesa trabajos largos y entrega el resultado por polling")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = puerto efímero)
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Procesamiento ===
    /// Número de workers que procesan trabajos
    #[arg(long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Duración del trabajo simulado en milisegundos
    #[arg(long = "simulate-ms", default_value = "2000", env = "SIMULATE_MS")]
    pub simulate_ms: u64,

    // === Retención ===
    /// Segundos que se conserva un resultado completado
    #[arg(long = "retention-secs", default_value = "3600", env = "RETENTION_SECS")]
    pub retention_secs: u64,

    /// Cada cuántos segundos se buscan resultados vencidos
    #[arg(long = "sweep-interval-secs", default_value = "60", env = "SWEEP_INTERVAL_SECS")]
    pub sweep_interval_secs: u64,

    // === Conexiones ===
    /// Timeout de lectura del socket en milisegundos
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Timeout de escritura del socket en milisegundos
    #[arg(long = "write-timeout-ms", default_value = "5000", env = "WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: u64,

    /// Tamaño máximo del body de un request
    #[arg(long = "max-payload-bytes", default_value = "52428800", env = "MAX_PAYLOAD_BYTES")]
    pub max_payload_bytes: usize,

    /// Tope para `GET /result/:id?wait=MS`
    #[arg(long = "max-wait-ms", default_value = "30000", env = "MAX_WAIT_MS")]
    pub max_wait_ms: u64,
}

impl Config {
    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use task_relay::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn simulate_delay(&self) -> Duration {
        Duration::from_millis(self.simulate_ms)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ServerError> {
        let invalid = |msg: &str| Err(ServerError::InvalidConfig(msg.to_string()));

        if self.host.trim().is_empty() {
            return invalid("host must not be empty");
        }
        if self.workers == 0 {
            return invalid("workers must be >= 1");
        }
        if self.retention_secs == 0 {
            return invalid("retention must be > 0 seconds");
        }
        if self.sweep_interval_secs == 0 {
            return invalid("sweep interval must be > 0 seconds");
        }
        // Un timeout de 0 en el socket es rechazado por std::net
        if self.read_timeout_ms == 0 {
            return invalid("read timeout must be > 0");
        }
        if self.write_timeout_ms == 0 {
            return invalid("write timeout must be > 0");
        }
        if self.max_payload_bytes == 0 {
            return invalid("max payload must be >= 1 byte");
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            workers = self.workers,
            simulate_ms = self.simulate_ms,
            "server configuration"
        );
        tracing::info!(
            retention_secs = self.retention_secs,
            sweep_interval_secs = self.sweep_interval_secs,
            max_wait_ms = self.max_wait_ms,
            max_payload_bytes = self.max_payload_bytes,
            read_timeout_ms = self.read_timeout_ms,
            write_timeout_ms = self.write_timeout_ms,
            "retention and connection limits"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            workers: 4,
            simulate_ms: 2_000,
            retention_secs: 3_600,
            sweep_interval_secs: 60,
            read_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
            max_payload_bytes: 50 * 1024 * 1024,
            max_wait_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_payload_bytes, 52_428_800);
        assert_eq!(config.retention(), Duration::from_secs(3600));
    }

    #[test]
    fn test_address_custom() {
        let config = Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..Config::default()
        };
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_port_zero_is_valid() {
        let config = Config {
            port: 0,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_workers() {
        let config = Config {
            workers: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_validate_invalid_retention() {
        let config = Config {
            retention_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("retention"));

        let config = Config {
            sweep_interval_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("sweep"));
    }

    #[test]
    fn test_validate_invalid_timeouts() {
        let config = Config {
            read_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("read timeout"));

        let config = Config {
            write_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("write timeout"));
    }

    #[test]
    fn test_validate_empty_host() {
        let config = Config {
            host: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_from_args() {
        let config = Config::parse_from([
            "task_relay",
            "--port",
            "9090",
            "--workers",
            "2",
            "--max-wait-ms",
            "100",
        ]);
        assert_eq!(config.port, 9090);
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_wait(), Duration::from_millis(100));
    }

    #[test]
    fn test_defaults_match_cli_defaults() {
        let parsed = Config::parse_from(["task_relay"]);
        let default = Config::default();

        // Las variables de entorno pueden alterar el parseo; solo comparar si no hay
        if std::env::var("HTTP_PORT").is_err() && std::env::var("WORKERS").is_err() {
            assert_eq!(parsed.port, default.port);
            assert_eq!(parsed.workers, default.workers);
            assert_eq!(parsed.max_payload_bytes, default.max_payload_bytes);
        }
    }
}
