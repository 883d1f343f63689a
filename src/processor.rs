//! # Procesador Externo
//! src/processor.rs
//!
//! Contrato del trabajo real que se ejecuta sobre cada tarea. El servidor
//! no sabe qué hace el procesador: le entrega un `PendingTask` y espera un
//! `TaskResult` con el mismo id.
//!
//! Un procesador debe capturar sus propios fallos y devolverlos como
//! `TaskResult::failure`. Si aun así hace panic, el worker lo convierte
//! en un resultado fallido.

use crate::tasks::{PendingTask, TaskResult};
use std::thread;
use std::time::Duration;

/// Trabajo a ejecutar sobre una tarea
pub trait Processor: Send + Sync {
    fn process(&self, task: PendingTask) -> TaskResult;
}

/// Procesador de demostración: simula trabajo durmiendo un rato
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    delay: Duration,
}

impl SimulatedProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Processor for SimulatedProcessor {
    fn process(&self, task: PendingTask) -> TaskResult {
        tracing::debug!(
            task_id = %task.id,
            content_type = %task.content_type,
            payload_bytes = task.payload.len(),
            "simulating work"
        );

        thread::sleep(self.delay);

        TaskResult::success(task.id, br#"{"processed": true}"#.to_vec(), "application/json")
    }
}

/// Adapta una closure como procesador
pub struct FnProcessor<F>(F);

impl<F> FnProcessor<F>
where
    F: Fn(PendingTask) -> TaskResult + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Processor for FnProcessor<F>
where
    F: Fn(PendingTask) -> TaskResult + Send + Sync,
{
    fn process(&self, task: PendingTask) -> TaskResult {
        (self.0)(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Metadata, TaskId};

    fn task(payload: &[u8]) -> PendingTask {
        PendingTask::new(TaskId::new(), payload.to_vec(), "text/plain".to_string(), Metadata::new())
    }

    #[test]
    fn test_simulated_processor() {
        let processor = SimulatedProcessor::new(Duration::from_millis(1));
        let pending = task(b"hello");
        let id = pending.id;

        let result = processor.process(pending);
        assert_eq!(result.id, id);
        assert!(result.success);
        assert_eq!(result.content_type, "application/json");
        assert_eq!(result.payload, br#"{"processed": true}"#);
    }

    #[test]
    fn test_fn_processor() {
        let processor = FnProcessor::new(|task: PendingTask| {
            let mut upper = task.payload.clone();
            upper.make_ascii_uppercase();
            TaskResult::success(task.id, upper, task.content_type)
        });

        let result = processor.process(task(b"hello"));
        assert_eq!(result.payload, b"HELLO");
        assert_eq!(result.content_type, "text/plain");
    }
}
