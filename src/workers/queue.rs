//! # Cola FIFO de Tareas
//! src/workers/queue.rs
//!
//! Cola thread-safe sin límite de capacidad. Los workers bloquean en
//! `dequeue` hasta que llega una tarea o la cola se cierra.

use crate::tasks::PendingTask;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<PendingTask>,
    closed: bool,
}

/// Cola compartida (los clones apuntan a la misma cola)
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    state: Arc<Mutex<QueueState>>,

    /// Condvar para notificar cuando hay nuevas tareas o se cierra
    condvar: Arc<Condvar>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola una tarea.
    ///
    /// Si la cola está cerrada devuelve la tarea sin encolar.
    pub fn enqueue(&self, task: PendingTask) -> Result<(), PendingTask> {
        let mut state = self.lock();

        if state.closed {
            return Err(task);
        }

        state.items.push_back(task);
        self.condvar.notify_one();

        Ok(())
    }

    /// Desencola la tarea más antigua.
    ///
    /// Bloquea hasta que haya una. Retorna `None` cuando la cola está
    /// cerrada y vacía.
    pub fn dequeue(&self) -> Option<PendingTask> {
        let mut state = self.lock();

        loop {
            if let Some(task) = state.items.pop_front() {
                return Some(task);
            }

            if state.closed {
                return None;
            }

            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_dequeue(&self) -> Option<PendingTask> {
        self.lock().items.pop_front()
    }

    /// Cierra la cola: no acepta más tareas y despierta a todos los workers
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Metadata, TaskId};
    use std::thread;
    use std::time::Duration;

    fn task(n: u8) -> PendingTask {
        PendingTask::new(TaskId::new(), vec![n], String::new(), Metadata::new())
    }

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new();
        queue.enqueue(task(1)).unwrap();
        queue.enqueue(task(2)).unwrap();
        queue.enqueue(task(3)).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_dequeue().unwrap().payload, vec![1]);
        assert_eq!(queue.try_dequeue().unwrap().payload, vec![2]);
        assert_eq!(queue.try_dequeue().unwrap().payload, vec![3]);
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_closed_queue_rejects() {
        let queue = TaskQueue::new();
        queue.close();

        let rejected = queue.enqueue(task(7)).unwrap_err();
        assert_eq!(rejected.payload, vec![7]);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_close_drains_then_stops() {
        let queue = TaskQueue::new();
        queue.enqueue(task(1)).unwrap();
        queue.close();

        assert!(queue.dequeue().is_some());
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_dequeue_blocks_until_enqueue() {
        let queue = TaskQueue::new();
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.dequeue())
        };

        thread::sleep(Duration::from_millis(20));
        queue.enqueue(task(9)).unwrap();

        assert_eq!(consumer.join().unwrap().unwrap().payload, vec![9]);
    }

    #[test]
    fn test_close_wakes_blocked_workers() {
        let queue = TaskQueue::new();
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || queue.dequeue())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.close();

        for consumer in consumers {
            assert!(consumer.join().unwrap().is_none());
        }
    }
}
