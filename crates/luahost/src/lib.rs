//! Thread-safe, cancellable embedding of a Lua interpreter.
//!
//! A Lua state is single-threaded: it has no internal locking and must never
//! be touched from two threads at once. This crate makes one usable from many
//! threads anyway by giving each [`LuaHost`] a dedicated owner thread that
//! holds the interpreter for its whole lifetime:
//! - Callers submit operations over a channel and block for the result.
//! - The owner executes operations one at a time, in arrival order.
//! - A caller-supplied [`Cancellation`] (deadline and/or [`CancelToken`])
//!   releases the caller early; the interpreter itself is never preempted.
//! - Results are copied out as [`HostValue`] — interpreter memory never
//!   crosses the boundary.
//!
//! # Example
//!
//! ```rust
//! use luahost::{Cancellation, HostValue, LuaHost};
//!
//! let host = LuaHost::new()?;
//! host.execute("answer = 6 * 7", &Cancellation::none())?;
//! let answer = host.get_global("answer", &Cancellation::none())?;
//! assert_eq!(answer, HostValue::Integer(42));
//! # Ok::<(), luahost::Error>(())
//! ```
//!
//! # Cancellation is cooperative
//!
//! A deadline that expires mid-script releases the *caller*, not the script:
//! the owner thread finishes the chunk and discards its result. A script that
//! must bound its own CPU time has to poll a clock itself (e.g. `os.clock`).

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod bridge;
mod cancel;
mod error;
mod host;
mod owner;

pub use cancel::{CancelToken, Cancellation};
pub use error::{Error, Result};
pub use host::{LuaHost, Options};
pub use luahost_types::HostValue;
