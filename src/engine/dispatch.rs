//! Main-thread dispatch.
//!
//! The engine signals wakeups from its own threads. Those signals are turned
//! into [`MainTask`]s and queued for the host's main thread, which is the only
//! thread allowed to touch engine or surface state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::handle::EngineHandle;

/// Work that must run on the main thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainTask {
    /// Drive one engine processing iteration
    Tick,
}

/// Schedules work onto the host's main thread.
///
/// Implementations must never run the task inline; `dispatch` is called from
/// engine-internal threads.
pub trait MainDispatcher: Send + Sync {
    fn dispatch(&self, task: MainTask);
}

/// Sending half of a channel-backed main queue
#[derive(Clone)]
pub struct MainQueue {
    tx: Sender<MainTask>,
    tick_pending: Arc<AtomicBool>,
}

/// Receiving half, owned by the main loop
pub struct MainQueueReceiver {
    rx: Receiver<MainTask>,
    tick_pending: Arc<AtomicBool>,
}

/// Create a main queue pair
pub fn main_queue() -> (MainQueue, MainQueueReceiver) {
    let (tx, rx) = mpsc::channel();
    let tick_pending = Arc::new(AtomicBool::new(false));
    (
        MainQueue {
            tx,
            tick_pending: tick_pending.clone(),
        },
        MainQueueReceiver { rx, tick_pending },
    )
}

impl MainDispatcher for MainQueue {
    fn dispatch(&self, task: MainTask) {
        match task {
            MainTask::Tick => {
                // Coalesce: one queued tick drains everything pending.
                if self.tick_pending.swap(true, Ordering::AcqRel) {
                    return;
                }
                if self.tx.send(task).is_err() {
                    self.tick_pending.store(false, Ordering::Release);
                    trace!("main queue closed, dropping tick");
                }
            }
        }
    }
}

impl MainQueueReceiver {
    /// Run every queued task. Returns the number of tasks run.
    pub fn drain(&self, engine: &EngineHandle) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            self.run(engine, task);
            ran += 1;
        }
        ran
    }

    /// Block up to `timeout` for the next task, then drain the rest.
    pub fn pump(&self, engine: &EngineHandle, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                self.run(engine, task);
                1 + self.drain(engine)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn run(&self, engine: &EngineHandle, task: MainTask) {
        match task {
            MainTask::Tick => {
                self.tick_pending.store(false, Ordering::Release);
                engine.tick();
            }
        }
    }
}
