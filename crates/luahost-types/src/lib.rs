//! Host-side value types for Lua interpreter results.
//!
//! This crate provides the [`HostValue`] union that callers receive from an
//! embedded interpreter, without depending on the interpreter itself. Code
//! that only consumes results (serializers, assertions in tests, REPL
//! printers) can link this crate alone.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod value;

pub use value::HostValue;
