//! # Notificador de Completación
//! src/tasks/notifier.rs
//!
//! Lo invoca el procesador (a través del worker) exactamente una vez por
//! tarea. Guarda el resultado y, si había clientes bloqueados esperando,
//! se los entrega directamente fuera del lock del registro.

use crate::tasks::registry::TaskRegistry;
use crate::tasks::TaskResult;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    registry: Arc<TaskRegistry>,
}

impl CompletionNotifier {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    /// Registra el resultado final de una tarea.
    ///
    /// Retorna cuántos waiters recibieron la entrega directa. Una segunda
    /// completación del mismo id se descarta (el primer resultado queda).
    pub fn on_complete(&self, result: TaskResult) -> usize {
        let id = result.id;
        let success = result.success;

        let completion = match self.registry.complete(result) {
            Ok(completion) => completion,
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "duplicate completion ignored");
                return 0;
            }
        };

        if success {
            tracing::info!(task_id = %id, "task completed");
        } else {
            tracing::info!(task_id = %id, error = %completion.result.error_message(), "task failed");
        }

        let mut delivered = 0;
        for waiter in completion.waiters {
            if waiter.deliver(Arc::clone(&completion.result)) {
                delivered += 1;
            }
        }

        if delivered > 0 {
            tracing::debug!(task_id = %id, delivered, "result pushed to waiting clients");
        }

        delivered
    }
}
