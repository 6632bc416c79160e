//! Admin panel actions.
//!
//! These run as the node's first unlocked account, not as a relayer. There is
//! no server-side check here; whether the account may call `setAdmin` or
//! `setRelayer` is decided by the contract.

use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::types::{Address, TxHash};
use log::info;

use crate::client::api::ApiClient;
use crate::client::contract::{parse_address, provider, Party, Sender, VotingContract};
use crate::client::render::Tally;
use crate::client::ClientError;
use crate::hashing::credential_hash;

/// Chain id of the local development node the contract is deployed to.
pub const LOCAL_CHAIN_ID: u64 = 1337;

pub struct AdminClient<P = Http> {
    contract: VotingContract<P>,
    account: Sender,
}

impl AdminClient {
    pub async fn connect(api: &ApiClient, rpc_url: &str) -> Result<Self, ClientError> {
        Self::with_provider(api, provider(rpc_url)?).await
    }
}

impl<P: JsonRpcClient> AdminClient<P> {
    pub async fn with_provider(api: &ApiClient, provider: Provider<P>) -> Result<Self, ClientError> {
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?
            .low_u64();
        if chain_id != LOCAL_CHAIN_ID {
            return Err(ClientError::WrongNetwork {
                expected: LOCAL_CHAIN_ID,
                actual: chain_id,
            });
        }

        let abi = api.contract_abi().await?;
        info!("Contract ABI loaded");
        let deployment = api.deployment().await?;
        info!("Deployment info loaded: {} on {}", deployment.address, deployment.network);

        let accounts = provider
            .get_accounts()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let account = *accounts.first().ok_or(ClientError::NoAccount)?;
        info!("Connected account: {account:?}");

        let address = parse_address(&deployment.address)?;
        Ok(Self {
            contract: VotingContract::new(provider, address, abi),
            account: Sender::account(account),
        })
    }

    pub async fn register_party(&self, number: u64, name: &str) -> Result<TxHash, ClientError> {
        self.contract.register_party(number, name, &self.account).await
    }

    /// Registers a voter directly, hashing the credentials locally.
    pub async fn register_voter(
        &self,
        voter_id: &str,
        password: &str,
        constituency: u64,
    ) -> Result<TxHash, ClientError> {
        self.contract
            .register_voter(
                credential_hash(voter_id),
                credential_hash(password),
                constituency,
                &self.account,
            )
            .await
    }

    pub async fn set_admin(&self, admin: Address) -> Result<TxHash, ClientError> {
        self.contract.set_admin(admin, &self.account).await
    }

    pub async fn set_relayer(&self, constituency: u64, relayer: Address) -> Result<TxHash, ClientError> {
        self.contract.set_relayer(constituency, relayer, &self.account).await
    }

    /// Every party with its overall vote count.
    pub async fn results(&self) -> Result<Vec<Party>, ClientError> {
        self.contract.parties().await
    }

    /// Votes for one party in each of constituencies `1..=constituencies`.
    ///
    /// Without an explicit count the party count is used, as the deployed
    /// contract numbers constituencies and parties from the same range.
    pub async fn party_votes_by_constituency(
        &self,
        party: u64,
        constituencies: Option<u64>,
    ) -> Result<Tally, ClientError> {
        let count = match constituencies {
            Some(count) => count,
            None => self.contract.num_parties().await?,
        };

        let mut rows = Vec::new();
        for constituency in 1..=count {
            let votes = self.contract.party_votes_in(constituency, party).await?;
            rows.push((constituency.to_string(), votes.to_string()));
        }

        Ok(Tally {
            key_heading: "Constituency",
            rows,
        })
    }

    /// Votes for every party within one constituency.
    pub async fn votes_by_constituency(&self, constituency: u64) -> Result<Tally, ClientError> {
        let count = self.contract.num_parties().await?;

        let mut rows = Vec::new();
        for number in 1..=count {
            let party = self.contract.party(number).await?;
            let votes = self.contract.party_votes_in(constituency, number).await?;
            rows.push((party.name, votes.to_string()));
        }

        Ok(Tally {
            key_heading: "Party",
            rows,
        })
    }
}
