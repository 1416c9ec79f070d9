//! Handler (sink) implementations.

pub mod stream;
pub mod rotating;
pub mod buffer;
pub mod fingers_crossed;
pub mod null;
pub mod couchdb;

pub use stream::StreamHandler;
pub use rotating::RotatingFileHandler;
pub use buffer::BufferHandler;
pub use fingers_crossed::FingersCrossedHandler;
pub use null::NullHandler;
pub use test::TestHandler;
pub use couchdb::CouchDbHandler;

use logweave_types::{LogweaveError, Result};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Parse a `filePermission` value: an octal string (`"0640"`) or an integer.
pub(crate) fn parse_permission(target: &str, value: Option<serde_json::Value>) -> Result<Option<u32>> {
    let invalid = |reason: String| LogweaveError::InvalidParameter {
        parameter: "filePermission".to_string(),
        target: target.to_string(),
        reason,
    };

    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => u32::from_str_radix(s.trim_start_matches("0o"), 8)
            .map(Some)
            .map_err(|e| invalid(format!("'{}' is not an octal mode: {}", s, e))),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(format!("{} is not a file mode", n))),
        Some(other) => Err(invalid(format!("expected a mode, got {}", other))),
    }
}

/// A lazily opened append-only file shared by the file handlers.
#[derive(Debug)]
pub(crate) struct LazyFile {
    permission: Option<u32>,
    open: Mutex<Option<(PathBuf, File)>>,
}

impl LazyFile {
    pub(crate) fn new(permission: Option<u32>) -> Self {
        Self {
            permission,
            open: Mutex::new(None),
        }
    }

    /// Append a line to `path`, reopening if a different path was open.
    pub(crate) fn write(&self, path: &Path, line: &str) -> Result<bool> {
        let mut guard = self.open.lock();
        let reopened = !matches!(&*guard, Some((open_path, _)) if open_path == path);
        if reopened {
            *guard = Some((path.to_path_buf(), self.open_file(path)?));
        }
        if let Some((_, file)) = guard.as_mut() {
            file.write_all(line.as_bytes())?;
        }
        Ok(reopened)
    }

    pub(crate) fn flush(&self) -> Result<()> {
        if let Some((_, file)) = self.open.lock().as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    fn open_file(&self, path: &Path) -> Result<File> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                LogweaveError::Sink(format!("Cannot create log directory {}: {}", dir.display(), e))
            })?;
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);

        #[cfg(unix)]
        if let Some(mode) = self.permission {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        options.open(path).map_err(|e| {
            LogweaveError::Sink(format!("Cannot open log file {}: {}", path.display(), e))
        })
    }
}
