//! Address of the remote shutdown endpoint.

use std::fmt;

/// Well-known name of the default endpoint.
const DEFAULT_NAME: &str = "graceful-shutdown";

/// Local IPC address: a Unix socket path, or a Windows named pipe name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Wraps an address as-is.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// `\\.\pipe\graceful-shutdown` on Windows, `$TMPDIR/graceful-shutdown.sock` elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self(format!(r"\\.\pipe\{DEFAULT_NAME}"))
        } else {
            let path = std::env::temp_dir().join(format!("{DEFAULT_NAME}.sock"));
            Self(path.to_string_lossy().into_owned())
        }
    }

    /// Address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}
