//! Public host facade.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::bounded;
use mlua::{Lua, MultiValue, Value};
use tracing::debug;

use luahost_types::HostValue;

use crate::bridge;
use crate::cancel::Cancellation;
use crate::error::{self, Error, Result};
use crate::owner::Owner;

/// Configuration for a [`LuaHost`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Name given to the owner thread.
    pub thread_name: String,
    /// Upper bound on interpreter heap usage, in bytes. `None` means
    /// unlimited. Scripts that exceed the bound fail with
    /// [`Error::Runtime`].
    pub memory_limit: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            thread_name: "luahost-owner".to_owned(),
            memory_limit: None,
        }
    }
}

/// A Lua interpreter owned by a dedicated thread, callable from any thread.
///
/// All calls are serialized: the owner thread executes one operation fully
/// before starting the next, in arrival order. Every call takes a
/// [`Cancellation`] bounding how long the caller will wait; see the crate
/// docs for the cooperative-cancellation contract.
///
/// Dropping the host shuts it down; [`close`](LuaHost::close) does the same
/// explicitly and reports double-closes as [`Error::Closed`].
pub struct LuaHost {
    owner: Owner,
    closed: AtomicBool,
}

impl LuaHost {
    /// Create a host with default [`Options`].
    ///
    /// The interpreter (including its standard libraries) is fully
    /// initialized before this returns; failure is [`Error::Init`].
    pub fn new() -> Result<Self> {
        Self::with_options(Options::default())
    }

    /// Create a host with the given options.
    pub fn with_options(options: Options) -> Result<Self> {
        Ok(Self {
            owner: Owner::spawn(&options)?,
            closed: AtomicBool::new(false),
        })
    }

    /// Execute a chunk of Lua code for its side effects.
    ///
    /// Returns [`Error::Syntax`] if the code does not parse and
    /// [`Error::Runtime`] if it raises; both leave the host usable.
    pub fn execute(&self, code: &str, cancel: &Cancellation) -> Result<()> {
        let code = code.to_owned();
        self.call(cancel, move |lua| {
            lua.load(code.as_str()).exec().map_err(error::from_lua)
        })
    }

    /// Execute a chunk of Lua code and collect everything it returns.
    ///
    /// A chunk with no `return` yields an empty vector; `return nil` yields
    /// one [`HostValue::Nil`] — the two are distinguishable.
    pub fn evaluate(&self, code: &str, cancel: &Cancellation) -> Result<Vec<HostValue>> {
        let code = code.to_owned();
        self.call(cancel, move |lua| {
            let values = lua
                .load(code.as_str())
                .eval::<MultiValue>()
                .map_err(error::from_lua)?;
            Ok(values.into_iter().map(bridge::host_value).collect())
        })
    }

    /// Read a global variable.
    ///
    /// An absent global reads as [`HostValue::Nil`], indistinguishable from
    /// a global explicitly set to nil — the interpreter itself cannot tell
    /// the two apart.
    pub fn get_global(&self, name: &str, cancel: &Cancellation) -> Result<HostValue> {
        let name = name.to_owned();
        self.call(cancel, move |lua| {
            let value: Value = lua
                .globals()
                .get(name.as_str())
                .map_err(error::from_lua)?;
            Ok(bridge::host_value(value))
        })
    }

    /// The interpreter's release string (e.g. `"Lua 5.4"`).
    pub fn version(&self, cancel: &Cancellation) -> Result<String> {
        match self.get_global("_VERSION", cancel)? {
            HostValue::String(version) => Ok(version),
            other => Err(Error::Runtime(format!(
                "unexpected _VERSION value: {}",
                other
            ))),
        }
    }

    /// Whether [`close`](LuaHost::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Shut the host down: stop accepting operations, let the current one
    /// (if any) finish, then destroy the interpreter.
    ///
    /// Queued operations that never ran complete their callers with
    /// [`Error::Closed`]. A second `close` returns [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::Closed);
        }
        self.owner.stop();
        debug!("lua host closed");
        Ok(())
    }

    /// Submit one operation and wait for its outcome under `cancel`.
    ///
    /// The closure runs on the owner thread. An expiry pre-check runs both
    /// here (before submission) and on the owner thread (before the
    /// interpreter is touched), so an already-cancelled call never executes
    /// interpreter code.
    fn call<T, F>(&self, cancel: &Cancellation, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Lua) -> Result<T> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        if cancel.is_expired() {
            return Err(cancel.expiry_error());
        }

        // Capacity 1: the owner's send never blocks, even if the caller has
        // already given up and will never read the slot
        let (result_tx, result_rx) = bounded(1);
        let pre_check = cancel.clone();
        self.owner.submit(Box::new(move |lua| {
            if pre_check.is_expired() {
                let _ = result_tx.send(Err(pre_check.expiry_error()));
                return;
            }
            let _ = result_tx.send(operation(lua));
        }))?;

        cancel.wait(result_rx)
    }
}

impl Drop for LuaHost {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.owner.stop();
        }
    }
}
