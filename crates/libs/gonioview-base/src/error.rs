//! Error type for gonioview.

use std::{
    error::Error,
    fmt::{Debug, Display, Formatter},
};

/// Custom error type for gonioview.
#[derive(Debug)]
pub struct GonioError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl Display for GonioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let cause = match &self.source {
            Some(cause) => format!("{}", cause),
            None => String::from("None"),
        };
        write!(f, "Error: {}, caused by {}", self.message, cause)
    }
}

impl Error for GonioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

impl GonioError {
    /// Create a new GonioError.
    pub fn new<S>(message: S, source: Option<Box<dyn Error + Send + Sync>>) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            source,
        }
    }

    /// Creates a new GonioError from a std::io::Error.
    pub fn from_io_error<S>(err: std::io::Error, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(message, Some(Box::new(err)))
    }

    /// Returns the message of the error.
    pub fn message(&self) -> &str { &self.message }
}
