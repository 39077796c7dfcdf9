use std::collections::TryReserveError;

use thiserror::Error;

use crate::numbers::AppendError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Empty, or contains something other than `0`-`9`, `*` and `#`.
    #[error("not a phone number: {0:?}")]
    InvalidNumber(String),

    /// A number cannot be forwarded to itself.
    #[error("cannot forward {0} to itself")]
    SelfForward(String),

    /// Allocation failed; the table is unchanged.
    #[error("out of memory: {0}")]
    Alloc(#[from] TryReserveError),
}

impl From<AppendError> for Error {
    fn from(e: AppendError) -> Self {
        Error::Alloc(e.source)
    }
}
