//! # Workers de Procesamiento
//! src/workers/pool.rs
//!
//! Cada worker toma tareas de la cola, ejecuta el procesador fuera de
//! cualquier lock y llama al notificador exactamente una vez por tarea,
//! incluso si el procesador hace panic.

use crate::processor::Processor;
use crate::tasks::{CompletionNotifier, PendingTask, TaskResult};
use crate::workers::{Handoff, TaskQueue};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Pool fijo de threads que procesan tareas
pub struct WorkerPool {
    queue: TaskQueue,
    notifier: CompletionNotifier,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Inicia `workers` threads que consumen la cola
    pub fn start(
        workers: usize,
        processor: Arc<dyn Processor>,
        notifier: CompletionNotifier,
    ) -> std::io::Result<Self> {
        let queue = TaskQueue::new();
        let mut handles = Vec::with_capacity(workers);

        for i in 0..workers {
            let name = format!("worker-{}", i);
            let queue = queue.clone();
            let processor = Arc::clone(&processor);
            let notifier = notifier.clone();

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, queue, processor, notifier))?;
            handles.push(handle);
        }

        Ok(Self {
            queue,
            notifier,
            handles: Mutex::new(handles),
        })
    }

    /// Loop principal del worker
    fn worker_loop(
        name: String,
        queue: TaskQueue,
        processor: Arc<dyn Processor>,
        notifier: CompletionNotifier,
    ) {
        tracing::debug!(worker = %name, "worker started");

        while let Some(task) = queue.dequeue() {
            let id = task.id;
            let start = Instant::now();
            tracing::debug!(worker = %name, task_id = %id, "worker picked up task");

            let result = Self::run_processor(processor.as_ref(), task);

            tracing::debug!(
                worker = %name,
                task_id = %id,
                success = result.success,
                latency_ms = start.elapsed().as_millis() as u64,
                "processing finished"
            );

            notifier.on_complete(result);
        }

        tracing::debug!(worker = %name, "worker stopped");
    }

    /// Ejecuta el procesador garantizando un resultado para el id correcto
    fn run_processor(processor: &dyn Processor, task: PendingTask) -> TaskResult {
        let id = task.id;

        let mut result = match panic::catch_unwind(AssertUnwindSafe(|| processor.process(task))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(task_id = %id, panic = %message, "processor panicked");
                return TaskResult::failure(id, format!("processor panicked: {}", message));
            }
        };

        if result.id != id {
            tracing::warn!(
                task_id = %id,
                returned_id = %result.id,
                "processor returned a result for another id, rebinding"
            );
            result.id = id;
        }

        result
    }

    /// Tareas esperando un worker libre
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Cierra la cola y espera a que los workers terminen lo pendiente
    pub fn shutdown(&self) {
        self.queue.close();

        let handles = {
            let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *handles)
        };

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked during shutdown");
            }
        }
    }
}

impl Handoff for WorkerPool {
    fn hand_off(&self, task: PendingTask) {
        let id = task.id;
        match self.queue.enqueue(task) {
            Ok(()) => tracing::debug!(task_id = %id, queued = self.queue.len(), "task handed off to workers"),
            Err(task) => {
                // La tarea igual necesita un resultado
                tracing::warn!(task_id = %task.id, "worker pool is shut down, failing task");
                self.notifier
                    .on_complete(TaskResult::failure(task.id, "server is shutting down"));
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue.close();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
