//! Newtypes for values threaded between mutating calls, waiters, and
//! diagnosis so they are not passed around as bare strings.

use std::fmt;
use std::ops::Deref;

use uuid::Uuid;

/// Prefix applied to every generated operation token.
pub const TOKEN_PREFIX: &str = "stackwatch-";

/// Client-chosen idempotency token correlating one logical operation.
///
/// The backend echoes the token into every event it records for the
/// operation, which is what lets [`crate::events::correlate`] isolate them.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OperationToken(String);

impl OperationToken {
    /// Wraps an existing token, for example one read back from state.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a fresh, single-use token.
    ///
    /// Retried mutating calls must use a new token per attempt; reusing one
    /// makes the backend treat the retry as a duplicate of the failed call.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{TOKEN_PREFIX}{}", Uuid::new_v4().simple()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for OperationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OperationToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for OperationToken {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for OperationToken {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for OperationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
