use std::env;
use std::path::PathBuf;

use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a valid port number, got {value:?}")]
    InvalidPort { key: &'static str, value: String },
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    /// Handed to clients as `transactionData.rpcUrl`.
    pub rpc_url: String,
    pub static_dir: PathBuf,
    pub contracts_dir: PathBuf,
    pub contract_artifact: PathBuf,
    pub deployment_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_owned(),
            port: 8000,
            mongodb_uri: "mongodb://127.0.0.1:27017".to_owned(),
            mongodb_database: "bvote".to_owned(),
            rpc_url: "http://127.0.0.1:8545".to_owned(),
            static_dir: PathBuf::from("static"),
            contracts_dir: PathBuf::from("static/contracts"),
            contract_artifact: PathBuf::from("static/contracts/BVote.sol/BVote.json"),
            deployment_file: PathBuf::from("deployment.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup("PORT") {
            config.port = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { key: "PORT", value })?;
        }

        let text = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };
        text("BIND_ADDRESS", &mut config.bind_address);
        text("MONGODB_URI", &mut config.mongodb_uri);
        text("MONGODB_DATABASE", &mut config.mongodb_database);
        text("RPC_URL", &mut config.rpc_url);

        let path = |key: &str, target: &mut PathBuf| {
            if let Some(value) = lookup(key) {
                *target = PathBuf::from(value);
            }
        };
        path("STATIC_DIR", &mut config.static_dir);
        path("CONTRACTS_DIR", &mut config.contracts_dir);
        path("CONTRACT_ARTIFACT", &mut config.contract_artifact);
        path("DEPLOYMENT_FILE", &mut config.deployment_file);

        info!(
            "Configured for {}:{}, rpc {}",
            config.bind_address, config.port, config.rpc_url
        );

        Ok(config)
    }
}
