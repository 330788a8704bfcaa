use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    InvalidConfig(String),
    InvalidData(String),
    /// A persisted weight file is smaller than the requested topology.
    ///
    /// The file was written for a different layer shape and must never be
    /// silently truncated or reinterpreted. There is no recovery path;
    /// callers are expected to abort with the diagnostic.
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
    /// A file open, resize, or mapping operation failed.
    ///
    /// Resource acquisition has no retry path in this crate; callers are
    /// expected to abort with the diagnostic.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::SizeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "weight file '{}' has invalid data size; expected: {expected}, given: {actual}",
                path.display()
            ),
            Error::Io { path, source } => write!(f, "weight file '{}': {source}", path.display()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
