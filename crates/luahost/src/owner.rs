//! Interpreter owner thread.
//!
//! The owner is the only code path allowed to touch the interpreter. It is
//! spawned once per host, constructs the Lua state on its own thread (the
//! state never crosses a thread boundary — the crate does not enable mlua's
//! `send` feature, so the compiler enforces this), then executes submitted
//! operations strictly in arrival order until shut down.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use crossbeam::select;
use mlua::{Lua, LuaOptions, StdLib};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Options;

/// One queued unit of interpreter work. Each operation owns its result
/// sender; if the operation is dropped unexecuted (shutdown drained the
/// queue), the disconnect wakes the waiting caller.
pub(crate) type Operation = Box<dyn FnOnce(&Lua) + Send + 'static>;

/// Handle to the owner thread: the operation queue, the shutdown signal, and
/// the join handle.
pub(crate) struct Owner {
    operations: Sender<Operation>,
    shutdown: Sender<()>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Owner {
    /// Spawn the owner thread and synchronously initialize the interpreter.
    ///
    /// Does not return until the interpreter is fully constructed, so no
    /// operation can ever observe a half-initialized state. Initialization
    /// failure joins the thread and surfaces as [`Error::Init`].
    pub(crate) fn spawn(options: &Options) -> Result<Self> {
        let (op_tx, op_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let (ready_tx, ready_rx) = bounded::<std::result::Result<(), String>>(1);

        let memory_limit = options.memory_limit;
        let thread = thread::Builder::new()
            .name(options.thread_name.clone())
            .spawn(move || run_loop(op_rx, shutdown_rx, ready_tx, memory_limit))
            .map_err(|e| Error::Init(format!("failed to spawn owner thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                operations: op_tx,
                shutdown: shutdown_tx,
                thread: Mutex::new(Some(thread)),
            }),
            Ok(Err(message)) => {
                let _ = thread.join();
                Err(Error::Init(message))
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::Init("owner thread exited during startup".to_owned()))
            }
        }
    }

    /// Enqueue an operation for execution on the owner thread.
    pub(crate) fn submit(&self, operation: Operation) -> Result<()> {
        self.operations
            .send(operation)
            .map_err(|_| Error::Closed)
    }

    /// Signal shutdown and join the owner thread. Idempotent: only the call
    /// that takes the join handle does any work. The current operation (if
    /// any) completes; queued operations are dropped, which completes their
    /// callers with [`Error::Closed`].
    pub(crate) fn stop(&self) {
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            let _ = self.shutdown.try_send(());
            let _ = handle.join();
        }
    }
}

/// Owner thread main loop.
fn run_loop(
    operations: Receiver<Operation>,
    shutdown: Receiver<()>,
    ready: Sender<std::result::Result<(), String>>,
    memory_limit: Option<usize>,
) {
    let lua = match init_interpreter(memory_limit) {
        Ok(lua) => lua,
        Err(message) => {
            let _ = ready.send(Err(message));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    debug!("interpreter owner started");

    loop {
        select! {
            recv(operations) -> operation => match operation {
                Ok(operation) => operation(&lua),
                // Every submitter is gone
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }
    }

    debug!("interpreter owner stopping");
    // `lua` drops here, on the thread that created it
}

fn init_interpreter(memory_limit: Option<usize>) -> std::result::Result<Lua, String> {
    let lua = Lua::new_with(StdLib::ALL_SAFE, LuaOptions::default())
        .map_err(|e| e.to_string())?;
    if let Some(limit) = memory_limit {
        lua.set_memory_limit(limit).map_err(|e| e.to_string())?;
    }
    Ok(lua)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn operations_run_on_the_named_owner_thread() {
        let owner = Owner::spawn(&Options::default()).unwrap();
        let (tx, rx) = bounded(1);
        owner
            .submit(Box::new(move |_lua| {
                let name = thread::current().name().map(str::to_owned);
                let _ = tx.send(name);
            }))
            .unwrap();
        assert_eq!(rx.recv().unwrap().as_deref(), Some("luahost-owner"));
        owner.stop();
    }

    #[test]
    fn operations_execute_in_arrival_order() {
        let owner = Owner::spawn(&Options::default()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = bounded(1);
        for i in 0..100 {
            let seen = seen.clone();
            let done_tx = done_tx.clone();
            owner
                .submit(Box::new(move |_lua| {
                    seen.lock().push(i);
                    if i == 99 {
                        let _ = done_tx.send(());
                    }
                }))
                .unwrap();
        }
        done_rx.recv().unwrap();
        assert_eq!(*seen.lock(), (0..100).collect::<Vec<_>>());
        owner.stop();
    }

    #[test]
    fn stop_is_idempotent_and_rejects_later_submissions() {
        let owner = Owner::spawn(&Options::default()).unwrap();
        owner.stop();
        owner.stop();
        let outcome = owner.submit(Box::new(|_lua| {}));
        assert_eq!(outcome, Err(Error::Closed));
    }
}
