//! Error types for host calls.

/// Errors returned by [`LuaHost`](crate::LuaHost) calls.
///
/// Only [`Error::Init`] is fatal (no host is returned). Every other variant
/// leaves the host usable for subsequent calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Interpreter construction failed; no host was created.
    #[error("interpreter initialization failed: {0}")]
    Init(String),

    /// The submitted code failed to parse or load, with the interpreter's
    /// own diagnostic text.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The code loaded but raised an error during execution, with the
    /// interpreter's own diagnostic text.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The caller's deadline elapsed before a result was delivered. Work
    /// already started on the owner thread runs to completion and is
    /// discarded.
    #[error("deadline exceeded")]
    Timeout,

    /// The caller's cancel token fired before a result was delivered.
    #[error("call cancelled")]
    Cancelled,

    /// The host was already shut down when the call was made, or shut down
    /// before the queued operation could run.
    #[error("host is closed")]
    Closed,
}

impl Error {
    /// True for the caller-side cancellation class of errors
    /// ([`Error::Timeout`] and [`Error::Cancelled`]).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Timeout | Error::Cancelled)
    }
}

/// Result alias for host calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Map an interpreter error onto the host taxonomy, keeping the
/// interpreter's diagnostic text.
pub(crate) fn from_lua(err: mlua::Error) -> Error {
    match err {
        mlua::Error::SyntaxError { message, .. } => Error::Syntax(message),
        mlua::Error::RuntimeError(message) => Error::Runtime(message),
        mlua::Error::MemoryError(message) => Error::Runtime(message),
        other => Error::Runtime(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_class() {
        assert!(Error::Timeout.is_cancellation());
        assert!(Error::Cancelled.is_cancellation());
        assert!(!Error::Closed.is_cancellation());
        assert!(!Error::Runtime("boom".into()).is_cancellation());
    }

    #[test]
    fn lua_errors_keep_diagnostic_text() {
        let err = from_lua(mlua::Error::SyntaxError {
            message: "unexpected symbol near 'c'".into(),
            incomplete_input: false,
        });
        assert_eq!(err, Error::Syntax("unexpected symbol near 'c'".into()));

        let err = from_lua(mlua::Error::RuntimeError("attempt to call a nil value".into()));
        assert_eq!(
            err,
            Error::Runtime("attempt to call a nil value".into())
        );
    }
}
