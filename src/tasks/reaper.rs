//! # Limpieza de Resultados Antiguos
//! src/tasks/reaper.rs
//!
//! Thread de mantenimiento que cada `interval` elimina del registro los
//! resultados completados hace más de `retention`. Sin esto la memoria
//! crece con cada envío.

use crate::tasks::TaskRegistry;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

/// Handle del thread de limpieza. Se detiene con `stop` o al hacer drop.
pub struct Reaper {
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    pub fn start(
        registry: Arc<TaskRegistry>,
        retention: Duration,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let signal = Arc::new(StopSignal::default());

        let handle = {
            let signal = Arc::clone(&signal);
            thread::Builder::new()
                .name("reaper".to_string())
                .spawn(move || Self::reaper_loop(registry, retention, interval, signal))?
        };

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    fn reaper_loop(
        registry: Arc<TaskRegistry>,
        retention: Duration,
        interval: Duration,
        signal: Arc<StopSignal>,
    ) {
        let mut stopped = signal.stopped.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let (guard, _) = signal
                .condvar
                .wait_timeout_while(stopped, interval, |stopped| !*stopped)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;

            if *stopped {
                break;
            }

            let removed = registry.evict_expired(retention);
            if removed > 0 {
                tracing::info!(removed, retention_secs = retention.as_secs(), "evicted expired results");
            }
        }
    }

    /// Detiene el thread y espera a que termine
    pub fn stop(&mut self) {
        {
            let mut stopped = self.signal.stopped.lock().unwrap_or_else(PoisonError::into_inner);
            *stopped = true;
            self.signal.condvar.notify_all();
        }

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.stop();
    }
}
