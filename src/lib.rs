//! # Task Relay
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que recibe trabajos largos, los procesa fuera de banda
//! y entrega el resultado cuando el cliente lo consulta.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y construcción de mensajes HTTP/1.0
//! - `router`: Enrutamiento de peticiones a handlers
//! - `server`: Servidor TCP, un thread por conexión
//! - `tasks`: Registro de resultados, waiters y servicio de tareas
//! - `workers`: Cola y pool de workers que ejecutan los trabajos
//! - `processor`: El trabajo en sí (simulado por defecto)
//! - `config`: Configuración por CLI y variables de entorno
//! - `error`: Tipos de error compartidos
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use std::sync::Arc;
//! use task_relay::config::Config;
//! use task_relay::processor::SimulatedProcessor;
//! use task_relay::server::Server;
//! use task_relay::tasks::TaskService;
//!
//! let config = Config::default();
//! let processor = Arc::new(SimulatedProcessor::new(config.simulate_delay()));
//! let (service, _pool) = TaskService::with_worker_pool(config.workers, processor).unwrap();
//!
//! let server = Server::bind(&config, Arc::new(service)).unwrap();
//! server.run().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod processor;
pub mod router;
pub mod server;
pub mod tasks;
pub mod workers;
