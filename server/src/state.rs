//! Startup configuration for the HTTP server.
//!
//! Everything the router needs is decided once at startup and passed into
//! [`build_router`](crate::build_router). Requests share no mutable state:
//! each one builds its own pipeline and model.

use std::net::SocketAddr;

/// Default listen host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 100;

/// Server infrastructure settings.
///
/// # Fields
///
/// * `host` - Interface to bind
/// * `port` - Port to bind
/// * `allowed_origins` - CORS origins; empty or `"*"` allows any origin
/// * `max_upload_bytes` - Largest accepted request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Set the upload limit from a megabyte count.
    pub fn with_max_upload_mb(mut self, megabytes: usize) -> Self {
        self.max_upload_bytes = megabytes.saturating_mul(1024 * 1024);
        self
    }

    /// True when every origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }

    /// `host:port` as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
