//! Error conversion helpers for common I/O operations
//!
//! Provides extension traits for cleaner error handling with path context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Map a read failure to `SourceUnreadable`.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&input).or_unreadable(&input)?;
    /// ```
    fn or_unreadable(self, path: &Path) -> ApplicationResult<T>;

    /// Map a write failure to `DestinationWrite`.
    fn or_unwritable(self, path: &Path) -> ApplicationResult<T>;

    /// Add path context to any other I/O error.
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn or_unreadable(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn or_unwritable(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::DestinationWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}
