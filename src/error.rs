use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a lookup produced no record.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The key is outside the slot window; another source may own it.
    #[error("no slot record for this key")]
    NotFound,
    /// The key is valid but the record does not fit. Retry with `required` bytes.
    #[error("buffer too small: {required} bytes required, {available} available")]
    BufferTooSmall { required: usize, available: usize },
}

impl Error {
    /// Exact buffer size a retry needs, if this is a capacity failure.
    pub fn required_len(&self) -> Option<usize> {
        match *self {
            Error::NotFound => None,
            Error::BufferTooSmall { required, .. } => Some(required),
        }
    }
}
