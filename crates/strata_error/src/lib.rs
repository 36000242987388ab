use std::error::Error;
use std::fmt;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Error type used throughout the workspace.
///
/// Errors carry a message and optionally the error that caused them. There's
/// no variant enum; call sites are expected to produce messages that make
/// sense to a user without needing to match on an error kind.
#[derive(Debug)]
pub struct DbError {
    /// Message for this error.
    msg: String,
    /// Source of this error, if any.
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl DbError {
    pub fn new(msg: impl Into<String>) -> Self {
        DbError {
            msg: msg.into(),
            source: None,
        }
    }

    pub fn with_source(msg: impl Into<String>, source: Box<dyn Error + Send + Sync>) -> Self {
        DbError {
            msg: msg.into(),
            source: Some(source),
        }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)?;
        if let Some(source) = &self.source {
            write!(f, "\nError source: {source}")?;
        }
        Ok(())
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        DbError::with_source("IO error", Box::new(value))
    }
}

impl From<std::str::Utf8Error> for DbError {
    fn from(value: std::str::Utf8Error) -> Self {
        DbError::with_source("Invalid UTF-8", Box::new(value))
    }
}

/// Extension trait for adding context to errors from other libraries.
pub trait ResultExt<T, E> {
    /// Wrap an error with a static context message.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap an error with a lazily computed context message.
    fn context_fn<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(msg, Box::new(e))),
        }
    }

    fn context_fn<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(DbError::with_source(f(), Box::new(e))),
        }
    }
}

/// Extension trait for converting options into results with a useful error
/// message.
pub trait OptionExt<T> {
    /// Return an error with the given message if the option is `None`.
    fn required(self, msg: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, msg: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(DbError::new(msg)),
        }
    }
}
