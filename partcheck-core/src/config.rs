//! Server settings shared by the host and the binaries that fill them.

use crate::validate::DetailMode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Parse JSON request bodies. Off means `body` stays absent and body validation answers 500.
    pub json_body: bool,
    pub detail_mode: DetailMode,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            json_body: true,
            detail_mode: DetailMode::First,
        }
    }
}
