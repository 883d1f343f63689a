//! # Sistema de Tareas
//! src/tasks/mod.rs
//!
//! Flujo de un trabajo:
//!
//! ```text
//! POST /process → TaskService::submit → Handoff (workers)
//!                        │                     │
//!                        ▼                     ▼
//!                  taskId al cliente     Processor::process
//!                                              │
//!                                              ▼
//! GET /result/:id ← TaskRegistry ← CompletionNotifier::on_complete
//! ```
//!
//! El registro guarda cada resultado una sola vez y entrega directamente a
//! los clientes que estaban esperando (`?wait=MS`).

pub mod handlers;
pub mod id;
pub mod notifier;
pub mod reaper;
pub mod registry;
pub mod service;
pub mod types;
pub mod waiter;

pub use handlers::TaskApi;
pub use id::TaskId;
pub use notifier::CompletionNotifier;
pub use reaper::Reaper;
pub use registry::{RegistryStats, TaskRegistry};
pub use service::{ServiceStats, TaskService};
pub use types::{parse_metadata, Metadata, PendingTask, ResultStatus, TaskResult};
pub use waiter::{waiter, Waiter, WaiterReceiver, WaiterToken};
