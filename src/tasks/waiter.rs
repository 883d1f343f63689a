//! # Waiters de Un Solo Uso
//! src/tasks/waiter.rs
//!
//! Un waiter representa a un cliente que mantiene la conexión abierta
//! esperando el resultado de una tarea. Es un canal one-shot: `deliver`
//! consume el `Waiter`, así que un mismo waiter no puede recibir dos veces.

use crate::tasks::TaskResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Duration;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identifica un waiter dentro del registro (para poder retirarlo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaiterToken(u64);

/// Extremo que el registro guarda y que recibe el resultado
#[derive(Debug)]
pub struct Waiter {
    token: WaiterToken,
    tx: SyncSender<Arc<TaskResult>>,
}

/// Extremo que conserva el thread de la conexión
#[derive(Debug)]
pub struct WaiterReceiver {
    token: WaiterToken,
    rx: Receiver<Arc<TaskResult>>,
}

/// Crea un par waiter/receptor
pub fn waiter() -> (Waiter, WaiterReceiver) {
    let token = WaiterToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
    // Capacidad 1: la entrega nunca bloquea al notificador
    let (tx, rx) = mpsc::sync_channel(1);
    (Waiter { token, tx }, WaiterReceiver { token, rx })
}

impl Waiter {
    pub fn token(&self) -> WaiterToken {
        self.token
    }

    /// Entrega el resultado. Retorna `false` si el receptor ya no existe
    /// (el cliente se cansó de esperar).
    pub fn deliver(self, result: Arc<TaskResult>) -> bool {
        match self.tx.try_send(result) {
            Ok(()) => true,
            Err(TrySendError::Disconnected(_)) => false,
            // Imposible con un único envío sobre capacidad 1
            Err(TrySendError::Full(_)) => false,
        }
    }
}

impl WaiterReceiver {
    pub fn token(&self) -> WaiterToken {
        self.token
    }

    /// Bloquea hasta recibir el resultado o agotar el timeout
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Arc<TaskResult>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Toma el resultado si ya fue entregado, sin bloquear
    pub fn try_take(&self) -> Option<Arc<TaskResult>> {
        self.rx.try_recv().ok()
    }
}
