//! # Registro Central de Tareas
//! src/tasks/registry.rs
//!
//! Guarda dos tablas detrás de un único `Mutex`:
//!
//! - `completed`: id → resultado final (nunca se sobrescribe)
//! - `waiters`: id → clientes bloqueados esperando ese resultado
//!
//! Un solo lock hace que `complete` (guardar + desenganchar waiters) sea
//! atómico frente a `register_waiter` y `get_completed`: un cliente que
//! consulta mientras la tarea termina o ve el resultado completo, o queda
//! registrado y recibe la entrega directa. Nunca ambas cosas a medias.
//!
//! Ninguna operación hace I/O con el lock tomado; la entrega a los waiters
//! la hace quien llama a `complete`, ya fuera del lock.

use crate::error::RegistryError;
use crate::tasks::waiter::{Waiter, WaiterToken};
use crate::tasks::{TaskId, TaskResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Resultado almacenado junto con el instante en que se completó
#[derive(Debug)]
struct CompletedEntry {
    result: Arc<TaskResult>,
    completed_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryState {
    completed: HashMap<TaskId, CompletedEntry>,
    waiters: HashMap<TaskId, Vec<Waiter>>,
    evicted_total: u64,
}

/// Resultado de intentar registrar un waiter
#[derive(Debug)]
pub enum Registration {
    /// El waiter quedó registrado y recibirá la entrega directa
    Registered,

    /// La tarea ya estaba completa; el waiter se descartó
    AlreadyCompleted(Arc<TaskResult>),
}

/// Resultado de `complete`: el valor guardado y los waiters desenganchados
#[derive(Debug)]
pub struct Completion {
    pub result: Arc<TaskResult>,
    pub waiters: Vec<Waiter>,
}

/// Estadísticas de una foto del registro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub completed: usize,
    pub waiters: usize,
    pub evicted: u64,
}

/// Registro thread-safe compartido por los handlers y el notificador
#[derive(Debug, Default)]
pub struct TaskRegistry {
    state: Mutex<RegistryState>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Un panic en otro thread no invalida las tablas: cada operación
    // deja el estado consistente antes de soltar el lock.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un waiter para `id`.
    ///
    /// El chequeo de "ya completado" y el registro ocurren bajo el mismo
    /// lock, así que no hay carrera con `complete`.
    pub fn register_waiter(&self, id: TaskId, waiter: Waiter) -> Registration {
        let mut state = self.lock();

        if let Some(entry) = state.completed.get(&id) {
            return Registration::AlreadyCompleted(Arc::clone(&entry.result));
        }

        state.waiters.entry(id).or_default().push(waiter);
        Registration::Registered
    }

    /// Retira un waiter que dejó de esperar (timeout del cliente).
    ///
    /// Retorna `false` si ya no estaba: o fue entregado o nunca existió.
    pub fn withdraw_waiter(&self, id: &TaskId, token: WaiterToken) -> bool {
        let mut state = self.lock();

        let Some(waiters) = state.waiters.get_mut(id) else {
            return false;
        };

        let before = waiters.len();
        waiters.retain(|w| w.token() != token);
        let removed = waiters.len() < before;

        if waiters.is_empty() {
            state.waiters.remove(id);
        }

        removed
    }

    /// Guarda el resultado final y desengancha los waiters de esa tarea.
    ///
    /// Un id que ya tiene resultado no se sobrescribe.
    pub fn complete(&self, result: TaskResult) -> Result<Completion, RegistryError> {
        let id = result.id;
        let mut state = self.lock();

        if state.completed.contains_key(&id) {
            return Err(RegistryError::AlreadyCompleted(id));
        }

        let result = Arc::new(result);
        state.completed.insert(
            id,
            CompletedEntry {
                result: Arc::clone(&result),
                completed_at: Instant::now(),
            },
        );
        let waiters = state.waiters.remove(&id).unwrap_or_default();

        Ok(Completion { result, waiters })
    }

    /// Consulta sin bloquear. `None` tanto para "pendiente" como para
    /// "id desconocido".
    pub fn get_completed(&self, id: &TaskId) -> Option<Arc<TaskResult>> {
        let state = self.lock();
        state.completed.get(id).map(|entry| Arc::clone(&entry.result))
    }

    /// Elimina el resultado de una tarea
    pub fn forget(&self, id: &TaskId) -> Option<Arc<TaskResult>> {
        let mut state = self.lock();
        let removed = state.completed.remove(id).map(|entry| entry.result);
        if removed.is_some() {
            state.evicted_total += 1;
        }
        removed
    }

    /// Elimina los resultados completados hace más de `retention`.
    ///
    /// Retorna cuántos se eliminaron.
    pub fn evict_expired(&self, retention: Duration) -> usize {
        let Some(cutoff) = Instant::now().checked_sub(retention) else {
            // El proceso lleva vivo menos que la ventana de retención
            return 0;
        };

        let mut state = self.lock();
        let before = state.completed.len();
        state.completed.retain(|_, entry| entry.completed_at > cutoff);
        let removed = before - state.completed.len();
        state.evicted_total += removed as u64;

        removed
    }

    /// Obtiene estadísticas del registro
    pub fn stats(&self) -> RegistryStats {
        let state = self.lock();
        RegistryStats {
            completed: state.completed.len(),
            waiters: state.waiters.values().map(Vec::len).sum(),
            evicted: state.evicted_total,
        }
    }
}
