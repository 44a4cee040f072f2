use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_DATABASE: &str = "loyalty.db";
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Process configuration for the loyalty server.
///
/// Every key is optional in the JSON file; missing keys take the defaults
/// below. Command-line flags in the binary override file values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// SQLite path, or ":memory:" for a throwaway database.
    pub database: String,
    pub seed_demo_data: bool,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            seed_demo_data: false,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load from a JSON file.
    /// In tests, use ServerConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// In-memory database, ephemeral port, no demo data.
    pub fn default_test() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            database: ":memory:".to_string(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == ":memory:"
    }
}
