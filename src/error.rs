//! Unified error type.

use std::error::Error as StdError;
use std::fmt;

/// The error a middleware unit returns when it fails.
///
/// baton does not classify failures. Whatever a unit produced is boxed as-is
/// and travels back up the chain untouched: `Display` prints the unit's own
/// message, and [`Error::downcast_ref`] recovers the concrete type.
///
/// A short-circuit (a unit that never calls its continuation) is *not* an
/// error. It shows up as `Ok(false)` from
/// [`Pipeline::dispatch_with_status`](crate::Pipeline::dispatch_with_status).
#[derive(Debug)]
pub struct Error(Box<dyn StdError + Send + Sync + 'static>);

impl Error {
    /// Wraps any error value, or a plain message.
    ///
    /// ```rust
    /// let e = baton::Error::new("quota exceeded");
    /// assert_eq!(e.to_string(), "quota exceeded");
    /// ```
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }

    /// Returns the unit's original error if it is of type `T`.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns `true` if the unit's original error is of type `T`.
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Unwraps the boxed error the unit produced.
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// Transparent: Display already is the unit error, so report its cause.
impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(Box::new(e))
    }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for Error {
    fn from(e: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self(e)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Self(msg.into())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Self(msg.into())
    }
}
