use serde::{Deserialize, Serialize};

pub const DEFAULT_TIME_URL: &str = "http://127.0.0.1:8000/datetime";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Registry server host.
    pub server: String,
    /// Registry server port.
    pub port: u16,
    /// URL of the timestamp web service.
    pub time_url: String,
}

impl Config {
    pub fn registry_addr(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_string(),
            port: 8080,
            time_url: DEFAULT_TIME_URL.to_string(),
        }
    }
}
