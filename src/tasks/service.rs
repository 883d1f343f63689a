//! # Servicio de Tareas
//! src/tasks/service.rs
//!
//! Reúne las operaciones que usan los handlers HTTP:
//!
//! - `submit`: registra el trabajo, lo entrega al procesamiento y retorna
//!   el id de inmediato
//! - `get_result`: observación puntual, nunca bloquea
//! - `wait_result`: igual que `get_result`, pero si no hay resultado
//!   registra un waiter y mantiene al cliente esperando un tiempo acotado
//! - `forget`: libera el resultado guardado

use crate::processor::Processor;
use crate::tasks::registry::{Registration, TaskRegistry};
use crate::tasks::waiter::waiter;
use crate::tasks::{CompletionNotifier, Metadata, PendingTask, ResultStatus, TaskId};
use crate::workers::{Handoff, WorkerPool};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Contadores expuestos en `/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub submitted: u64,
    pub completed: usize,
    pub waiters: usize,
    pub evicted: u64,
}

pub struct TaskService {
    registry: Arc<TaskRegistry>,
    handoff: Arc<dyn Handoff>,
    submitted: AtomicU64,
}

impl TaskService {
    pub fn new(registry: Arc<TaskRegistry>, handoff: Arc<dyn Handoff>) -> Self {
        Self {
            registry,
            handoff,
            submitted: AtomicU64::new(0),
        }
    }

    /// Arma el servicio completo: registro, notificador y pool de workers
    pub fn with_worker_pool(
        workers: usize,
        processor: Arc<dyn Processor>,
    ) -> std::io::Result<(Self, Arc<WorkerPool>)> {
        let registry = Arc::new(TaskRegistry::new());
        let notifier = CompletionNotifier::new(Arc::clone(&registry));
        let pool = Arc::new(WorkerPool::start(workers, processor, notifier)?);
        let service = Self::new(registry, Arc::clone(&pool) as Arc<dyn Handoff>);

        Ok((service, pool))
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Acepta un trabajo y retorna su id sin esperar al procesamiento
    pub fn submit(&self, payload: Vec<u8>, content_type: String, metadata: Metadata) -> TaskId {
        let id = TaskId::new();

        tracing::info!(
            task_id = %id,
            content_type = %content_type,
            payload_bytes = payload.len(),
            metadata_keys = metadata.len(),
            "task submitted"
        );

        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.handoff
            .hand_off(PendingTask::new(id, payload, content_type, metadata));

        id
    }

    /// Consulta el resultado sin bloquear
    pub fn get_result(&self, id: &TaskId) -> ResultStatus {
        match self.registry.get_completed(id) {
            Some(result) => ResultStatus::Ready(result),
            None => ResultStatus::NotReady,
        }
    }

    /// Consulta el resultado esperando como máximo `timeout` a que llegue
    pub fn wait_result(&self, id: &TaskId, timeout: Duration) -> ResultStatus {
        if let ResultStatus::Ready(result) = self.get_result(id) {
            return ResultStatus::Ready(result);
        }

        if timeout.is_zero() {
            return ResultStatus::NotReady;
        }

        let (w, receiver) = waiter();
        if let Registration::AlreadyCompleted(result) = self.registry.register_waiter(*id, w) {
            return ResultStatus::Ready(result);
        }

        tracing::debug!(task_id = %id, timeout_ms = timeout.as_millis() as u64, "client waiting for result");

        if let Some(result) = receiver.wait_timeout(timeout) {
            return ResultStatus::Ready(result);
        }

        if self.registry.withdraw_waiter(id, receiver.token()) {
            return ResultStatus::NotReady;
        }

        // El notificador ya desenganchó el waiter: el resultado está
        // guardado aunque la entrega todavía no haya llegado al canal.
        match receiver.try_take().or_else(|| self.registry.get_completed(id)) {
            Some(result) => ResultStatus::Ready(result),
            None => ResultStatus::NotReady,
        }
    }

    /// Libera el resultado de una tarea. Retorna `true` si existía.
    pub fn forget(&self, id: &TaskId) -> bool {
        let removed = self.registry.forget(id).is_some();
        if removed {
            tracing::debug!(task_id = %id, "result forgotten");
        }
        removed
    }

    pub fn stats(&self) -> ServiceStats {
        let registry = self.registry.stats();
        ServiceStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: registry.completed,
            waiters: registry.waiters,
            evicted: registry.evicted,
        }
    }
}
