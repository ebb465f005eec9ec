//! Error types for record construction, dispatch and the text codecs.
//!
//! Every failure surfaces synchronously as an [`Error`] carrying a human-readable
//! message that names the offending record, key or operation. Nothing is retried
//! internally.
//!
//! ## Error Categories
//!
//! [`Error::kind`] maps each variant onto a small taxonomy:
//!
//! - **MalformedInput**: odd-length key/value lists, unparsable markup, key-prefix collisions
//! - **NotFound**: missing records, variables or files
//! - **ChainLimitExceeded**: a prototype walk went past the configured depth cap
//! - **NoSuchOperation**: dispatch reached the end of the chain without a match
//! - **IoFailure**: file open/read/write failures
//!
//! ## Examples
//!
//! ```rust
//! use protogroup::{ErrorKind, Store};
//!
//! let mut store = Store::new();
//! let err = store.create_from_lists("app", &["a", "b"], &["1"]).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::MalformedInput);
//! assert!(err.to_string().contains("2 keys"));
//! ```

use std::fmt;
use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    NotFound,
    ChainLimitExceeded,
    NoSuchOperation,
    IoFailure,
    /// Raised by a user-supplied operation.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedInput => "malformed input",
            ErrorKind::NotFound => "not found",
            ErrorKind::ChainLimitExceeded => "chain limit exceeded",
            ErrorKind::NoSuchOperation => "no such operation",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Represents all possible errors raised by this crate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error on {path}: {msg}")]
    Io { path: String, msg: String },

    /// Syntax error in markup text with detailed context
    #[error("Syntax error at line {line}, column {col}:\n{context}\n{msg}{suggestion}")]
    Syntax {
        line: usize,
        col: usize,
        msg: String,
        context: String,
        suggestion: String,
    },

    /// Structurally invalid input that has no line information
    #[error("Malformed input: {0}")]
    Malformed(String),

    /// Key and value lists of different lengths
    #[error("Malformed input: {keys} keys but {values} values")]
    LengthMismatch { keys: usize, values: usize },

    /// A key that would be both a scalar and a branch
    #[error("Structural conflict at '{key}': {msg}")]
    Conflict { key: String, msg: String },

    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    #[error("Prototype chain of '{record}' exceeds depth {limit} while resolving '{operation}'")]
    ChainLimitExceeded {
        record: String,
        operation: String,
        limit: usize,
    },

    #[error("No operation '{operation}' on '{record}' and no parent to delegate to")]
    NoSuchOperation { record: String, operation: String },

    /// The nearest field with the operation's name holds data
    #[error("Field '{operation}' resolved for '{record}' holds data, not an operation")]
    NotCallable { record: String, operation: String },

    /// Custom error, usually raised by an operation body
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Returns the coarse category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } => ErrorKind::IoFailure,
            Error::Syntax { .. }
            | Error::Malformed(_)
            | Error::LengthMismatch { .. }
            | Error::Conflict { .. } => ErrorKind::MalformedInput,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::ChainLimitExceeded { .. } => ErrorKind::ChainLimitExceeded,
            Error::NoSuchOperation { .. } | Error::NotCallable { .. } => {
                ErrorKind::NoSuchOperation
            }
            Error::Custom(_) => ErrorKind::Other,
        }
    }

    /// Creates a syntax error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::Error;
    ///
    /// let err = Error::syntax(10, 5, "unexpected token");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
            context: String::new(),
            suggestion: String::new(),
        }
    }

    /// Creates a syntax error with the offending line and an optional suggestion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::Error;
    ///
    /// let err = Error::syntax_with_context(
    ///     3,
    ///     5,
    ///     "missing colon",
    ///     "name App",
    ///     Some("Did you mean 'name: App'?"),
    /// );
    /// assert!(err.to_string().contains("Help:"));
    /// ```
    pub fn syntax_with_context(
        line: usize,
        col: usize,
        msg: &str,
        context: &str,
        suggestion: Option<&str>,
    ) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
            context: context.to_string(),
            suggestion: suggestion
                .map(|s| format!("\nHelp: {}", s))
                .unwrap_or_default(),
        }
    }

    pub fn malformed<T: fmt::Display>(msg: T) -> Self {
        Error::Malformed(msg.to_string())
    }

    pub fn conflict(key: &str, msg: &str) -> Self {
        Error::Conflict {
            key: key.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a not-found error; `what` names the kind of thing looked up.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::{Error, ErrorKind};
    ///
    /// let err = Error::not_found("record", "db");
    /// assert_eq!(err.kind(), ErrorKind::NotFound);
    /// assert_eq!(err.to_string(), "record 'db' not found");
    /// ```
    pub fn not_found(what: &'static str, name: &str) -> Self {
        Error::NotFound {
            what,
            name: name.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(path: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Error::not_found("file", path);
        }
        Error::Io {
            path: path.to_string(),
            msg: err.to_string(),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Malformed(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
