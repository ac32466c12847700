use std::env;

pub const DEFAULT_CDP_PORT: u16 = 9222;
pub const DEFAULT_CDP_HOST: &str = "127.0.0.1";

/// Chrome DevTools endpoint for the web adapter.
#[derive(Debug, Clone)]
pub struct CdpConfig {
    pub host: String,
    pub port: u16,
}

impl CdpConfig {
    /// Read `CUP_CDP_HOST` / `CUP_CDP_PORT`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self {
            host: env::var("CUP_CDP_HOST").unwrap_or_else(|_| DEFAULT_CDP_HOST.to_string()),
            port: env::var("CUP_CDP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_CDP_PORT),
        }
    }

    /// The HTTP endpoint that reports the browser's WebSocket debugger URL.
    pub fn version_url(&self) -> String {
        format!("http://{}:{}/json/version", self.host, self.port)
    }
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CDP_HOST.to_string(),
            port: DEFAULT_CDP_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_url() {
        let config = CdpConfig {
            host: "localhost".to_string(),
            port: 9333,
        };
        assert_eq!(config.version_url(), "http://localhost:9333/json/version");
    }
}
