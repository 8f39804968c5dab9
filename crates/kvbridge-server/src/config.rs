//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};

/// Default listening port
pub const DEFAULT_PORT: u16 = 47168;

/// Default number of entries per browse page
pub const DEFAULT_PAGE_SIZE: usize = 40;

/// Configuration for the bridge server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: SocketAddr,

    /// Browse limit applied when a request gives none
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listening address
    pub fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Set the default browse page size (zero keeps the current value)
    pub fn page_size(mut self, page_size: usize) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }
}
