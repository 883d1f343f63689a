//! # Pool de Workers
//! src/workers/mod.rs
//!
//! Desacopla el envío del procesamiento: el handler de envío deja la
//! tarea en una cola FIFO y vuelve de inmediato; N threads la consumen,
//! ejecutan el procesador y avisan al notificador.

pub mod pool;
pub mod queue;

pub use pool::WorkerPool;
pub use queue::TaskQueue;

use crate::tasks::PendingTask;

/// Punto de entrega fire-and-forget hacia el procesamiento
pub trait Handoff: Send + Sync {
    /// Entrega la tarea sin esperar a que se procese
    fn hand_off(&self, task: PendingTask);
}
