//! TLS key-log sink
//!
//! A plain text file receiving TLS secrets in the NSS key log format, so that
//! captured traffic can be decrypted. Both TLS stacks write through the same
//! sink: OpenSSL hands over ready-made lines, rustls hands over the parts.

use super::config::TlsError;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key-log file shared by the HTTP/2 and HTTP/3 drivers
pub struct KeyLogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl KeyLogSink {
    /// Create (or truncate) the key-log file
    pub fn create(path: impl AsRef<Path>) -> Result<Arc<Self>, TlsError> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options.open(path)?;
        Ok(Arc::new(KeyLogSink {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        }))
    }

    /// Path of the key-log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one key-log line
    ///
    /// Write failures are logged and otherwise ignored; losing secrets must
    /// not fail the request.
    pub fn write_line(&self, line: &str) {
        let Ok(mut file) = self.file.lock() else {
            tracing::warn!(path = %self.path.display(), "key log lock poisoned");
            return;
        };
        if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write key log");
        }
    }
}

impl fmt::Debug for KeyLogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLogSink").field("path", &self.path).finish()
    }
}

impl rustls::KeyLog for KeyLogSink {
    fn log(&self, label: &str, client_random: &[u8], secret: &[u8]) {
        self.write_line(&format!("{} {} {}", label, hex(client_random), hex(secret)));
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
