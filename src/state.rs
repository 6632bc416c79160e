use std::sync::Arc;

use log::info;
use serde_json::Value;

use crate::artifacts::{load_contract_abi, load_deployment, ArtifactError};
use crate::config::Config;
use crate::models::DeploymentDescriptor;
use crate::store::VoterStore;

/// Shared by every worker. Nothing in here changes after startup.
pub struct AppState {
    pub config: Config,
    pub deployment: DeploymentDescriptor,
    pub contract_abi: Value,
    pub store: Arc<dyn VoterStore>,
}

impl AppState {
    pub fn load(config: Config, store: Arc<dyn VoterStore>) -> Result<Self, ArtifactError> {
        let deployment = load_deployment(&config.deployment_file)?;
        let contract_abi = load_contract_abi(&config.contract_artifact)?;

        info!(
            "Contract at {} on {} ({} abi entries)",
            deployment.address,
            deployment.network,
            contract_abi.as_array().map_or(0, Vec::len)
        );

        Ok(Self {
            config,
            deployment,
            contract_abi,
            store,
        })
    }
}
