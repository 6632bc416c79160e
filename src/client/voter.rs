//! Voter-side flows: register, log in, vote, log out.
//!
//! Every contract write goes out from the constituency relayer the API
//! server picked for this voter.

use ethers::providers::{Http, JsonRpcClient, Provider};
use ethers::types::H256;
use log::{error, info};

use crate::client::api::ApiClient;
use crate::client::contract::{provider, Sender, VotingContract};
use crate::client::render::{Banner, View};
use crate::client::ClientError;
use crate::hashing::credential_hash;
use crate::models::{ResolvedCall, VoterDetails};

type Connector<P> = Box<dyn Fn(&str) -> Result<Provider<P>, ClientError> + Send + Sync>;

pub struct VoterClient<P = Http> {
    api: ApiClient,
    connect: Connector<P>,
}

pub enum LoginOutcome<P = Http> {
    Failed(View),
    LoggedIn { session: Session<P>, view: View },
}

impl<P> LoginOutcome<P> {
    pub fn view(&self) -> &View {
        match self {
            LoginOutcome::Failed(view) | LoginOutcome::LoggedIn { view, .. } => view,
        }
    }
}

impl VoterClient {
    pub fn new(api: ApiClient) -> Self {
        Self::with_connector(api, provider)
    }
}

impl<P: JsonRpcClient> VoterClient<P> {
    /// `connect` opens the node at the RPC URL the API server hands out.
    pub fn with_connector<F>(api: ApiClient, connect: F) -> Self
    where
        F: Fn(&str) -> Result<Provider<P>, ClientError> + Send + Sync + 'static,
    {
        Self {
            api,
            connect: Box::new(connect),
        }
    }

    fn contract(&self, resolved: &ResolvedCall) -> Result<VotingContract<P>, ClientError> {
        let provider = (self.connect)(&resolved.transaction_data.rpc_url)?;
        VotingContract::from_resolved(resolved, provider)
    }

    pub async fn register_voter(
        &self,
        voter_id: &str,
        password: &str,
        constituency: i64,
    ) -> Result<View, ClientError> {
        let resolved = match self.api.register(voter_id, constituency).await {
            Ok(resolved) => resolved,
            Err(ClientError::NotFound(reason)) => {
                info!("Registration lookup failed for {voter_id}: {reason}");
                return Ok(View::info(Banner::failure("Voter not found!"), None));
            }
            Err(err) => return Err(err),
        };

        let contract = self.contract(&resolved)?;
        let relayer = Sender::relayer(&resolved.transaction_data)?;
        let on_chain_constituency = u64::try_from(resolved.voter_details.constituency)
            .map_err(|_| ClientError::MalformedResponse("negative constituency".to_owned()))?;

        let sent = contract
            .register_voter(
                credential_hash(voter_id),
                credential_hash(password),
                on_chain_constituency,
                &relayer,
            )
            .await;

        match sent {
            Ok(tx) => {
                info!("Voter registration successful: {tx:?}");
                Ok(View::info(
                    Banner::success("Voter registration successful!"),
                    Some(resolved.voter_details),
                ))
            }
            Err(err @ ClientError::ContractRejection { .. }) => {
                error!("Error registering voter: {err}");
                Ok(View::info(Banner::failure("Voter already registered!"), None))
            }
            Err(err) => Err(err),
        }
    }

    /// Resolves a voter without touching the contract.
    pub async fn session(&self, voter_id: &str) -> Result<Session<P>, ClientError> {
        let resolved = self.api.login(voter_id).await?;

        Ok(Session {
            voter_id: voter_id.to_owned(),
            contract: self.contract(&resolved)?,
            relayer: Sender::relayer(&resolved.transaction_data)?,
            details: resolved.voter_details,
        })
    }

    pub async fn login_voter(
        &self,
        voter_id: &str,
        password: &str,
    ) -> Result<LoginOutcome<P>, ClientError> {
        let session = match self.session(voter_id).await {
            Ok(session) => session,
            Err(ClientError::NotFound(reason)) => {
                info!("Login lookup failed for {voter_id}: {reason}");
                return Ok(LoginOutcome::Failed(View::info(
                    Banner::failure("Voter not found!"),
                    None,
                )));
            }
            Err(err) => return Err(err),
        };

        match session.login(password).await {
            Ok(()) => {}
            Err(err @ ClientError::ContractRejection { .. }) => {
                error!("Error logging in voter: {err}");
                return Ok(LoginOutcome::Failed(View::info(
                    Banner::failure("Voter login failed!"),
                    None,
                )));
            }
            Err(err) => return Err(err),
        }

        let record = session.contract.voter_record(session.id_hash()).await?;
        let view = if record.has_voted {
            session.voted_details(record.party_voted).await?
        } else {
            session.voting_interface().await?
        };

        Ok(LoginOutcome::LoggedIn { session, view })
    }
}

/// A voter resolved by the API server, bound to their relayer.
pub struct Session<P = Http> {
    voter_id: String,
    details: VoterDetails,
    contract: VotingContract<P>,
    relayer: Sender,
}

impl<P: JsonRpcClient> Session<P> {
    pub fn details(&self) -> &VoterDetails {
        &self.details
    }

    fn id_hash(&self) -> H256 {
        credential_hash(&self.voter_id)
    }

    pub async fn login(&self, password: &str) -> Result<(), ClientError> {
        let tx = self
            .contract
            .login(self.id_hash(), credential_hash(password), &self.relayer)
            .await?;
        info!("Voter login successful: {tx:?}");
        Ok(())
    }

    /// The ballot: voter details plus every registered party.
    pub async fn voting_interface(&self) -> Result<View, ClientError> {
        let parties = self.contract.parties().await?;
        Ok(View::Ballot {
            details: self.details.clone(),
            parties,
        })
    }

    pub async fn vote(&self, party_number: u64) -> Result<View, ClientError> {
        let tx = self
            .contract
            .vote(party_number, self.id_hash(), &self.relayer)
            .await?;
        info!("Vote successful: {tx:?}");

        self.voted_details(party_number).await
    }

    pub async fn voted_details(&self, party_number: u64) -> Result<View, ClientError> {
        let party = self.contract.party(party_number).await?;
        Ok(View::Voted {
            details: self.details.clone(),
            party_name: party.name,
        })
    }

    pub async fn logout(&self) -> Result<View, ClientError> {
        let tx = self.contract.logout(self.id_hash(), &self.relayer).await?;
        info!("Logout successful: {tx:?}");

        Ok(View::info(Banner::success("Logged out successfully"), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::contract::hash_token;
    use crate::client::testing::{address, serve_api, Chain, ScriptedNode, RELAYER_ACCOUNT};
    use crate::resolver::tests::{relayer, voter};
    use crate::store::MemoryStore;
    use ethers::abi::Token;
    use ethers::types::U256;

    fn registered_store() -> MemoryStore {
        MemoryStore::default()
            .with_voter(voter("V1", 5))
            .with_relayer(relayer(5, RELAYER_ACCOUNT))
    }

    fn client(api: ApiClient, node: &ScriptedNode) -> VoterClient<ScriptedNode> {
        let node = node.clone();
        VoterClient::with_connector(api, move |_| Ok(node.provider()))
    }

    fn parties() -> Vec<String> {
        vec!["Blue".to_owned(), "Green".to_owned()]
    }

    fn failure(message: &str) -> View {
        View::info(Banner::failure(message), None)
    }

    #[actix_web::test]
    async fn register_unknown_voter_shows_not_found() {
        let node = ScriptedNode::new(Chain::default());
        let voters = client(serve_api(MemoryStore::default()).await, &node);

        let view = voters.register_voter("ghost", "pw", 5).await.unwrap();

        assert_eq!(view, failure("Voter not found!"));
        assert!(node.sent().is_empty());
    }

    #[actix_web::test]
    async fn register_sends_hashes_from_relayer() {
        let node = ScriptedNode::new(Chain::default());
        let voters = client(serve_api(registered_store()).await, &node);

        let view = voters.register_voter("V1", "secret", 5).await.unwrap();

        match &view {
            View::VoterInfo { banner, details } => {
                assert_eq!(banner, &Banner::success("Voter registration successful!"));
                assert_eq!(details.as_ref().unwrap().voter_id, "V1");
            }
            other => panic!("unexpected view {other:?}"),
        }

        let sent = node.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "registerVoter");
        assert_eq!(sent[0].from, address(RELAYER_ACCOUNT));
        assert_eq!(sent[0].gas, Some(U256::from(200_000u64)));
        assert_eq!(sent[0].gas_price, Some(U256::exp10(10)));
        assert_eq!(
            sent[0].args,
            vec![
                hash_token(credential_hash("V1")),
                hash_token(credential_hash("secret")),
                Token::Uint(5u64.into()),
            ]
        );
    }

    #[actix_web::test]
    async fn register_rejection_shows_already_registered() {
        let node = ScriptedNode::new(Chain {
            rejected: vec!["registerVoter"],
            ..Chain::default()
        });
        let voters = client(serve_api(registered_store()).await, &node);

        let view = voters.register_voter("V1", "secret", 5).await.unwrap();

        assert_eq!(view, failure("Voter already registered!"));
    }

    #[actix_web::test]
    async fn login_unknown_voter_shows_not_found() {
        let node = ScriptedNode::new(Chain::default());
        let voters = client(serve_api(registered_store()).await, &node);

        let outcome = voters.login_voter("ghost", "pw").await.unwrap();

        assert!(matches!(outcome, LoginOutcome::Failed(_)));
        assert_eq!(outcome.view(), &failure("Voter not found!"));
    }

    #[actix_web::test]
    async fn login_rejection_shows_login_failed() {
        let node = ScriptedNode::new(Chain {
            rejected: vec!["login"],
            ..Chain::default()
        });
        let voters = client(serve_api(registered_store()).await, &node);

        let outcome = voters.login_voter("V1", "wrong").await.unwrap();

        assert!(matches!(outcome, LoginOutcome::Failed(_)));
        assert_eq!(outcome.view(), &failure("Voter login failed!"));
    }

    #[actix_web::test]
    async fn login_before_voting_shows_ballot() {
        let node = ScriptedNode::new(Chain {
            parties: parties(),
            ..Chain::default()
        });
        let voters = client(serve_api(registered_store()).await, &node);

        let outcome = voters.login_voter("V1", "secret").await.unwrap();

        match outcome.view() {
            View::Ballot { details, parties } => {
                assert_eq!(details.constituency, 5);
                let names: Vec<_> = parties.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, ["Blue", "Green"]);
            }
            other => panic!("expected a ballot, got {other:?}"),
        }
        assert_eq!(outcome.view().banner(), Banner::success("Logged In"));

        let sent = node.sent();
        assert_eq!(sent[0].method, "login");
        assert_eq!(sent[0].from, address(RELAYER_ACCOUNT));
    }

    #[actix_web::test]
    async fn login_after_voting_shows_choice() {
        let node = ScriptedNode::new(Chain {
            parties: parties(),
            has_voted: true,
            party_voted: 2,
            ..Chain::default()
        });
        let voters = client(serve_api(registered_store()).await, &node);

        let outcome = voters.login_voter("V1", "secret").await.unwrap();

        match outcome.view() {
            View::Voted { party_name, .. } => assert_eq!(party_name, "Green"),
            other => panic!("expected the voted summary, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn vote_names_the_chosen_party() {
        let node = ScriptedNode::new(Chain {
            parties: parties(),
            ..Chain::default()
        });
        let voters = client(serve_api(registered_store()).await, &node);

        let session = match voters.login_voter("V1", "secret").await.unwrap() {
            LoginOutcome::LoggedIn { session, .. } => session,
            LoginOutcome::Failed(view) => panic!("login failed: {view:?}"),
        };
        let view = session.vote(1).await.unwrap();

        assert_eq!(view.banner(), Banner::success("Vote successful!"));
        assert!(view.to_string().ends_with("You voted for Blue\n"));

        let vote = node.sent().pop().unwrap();
        assert_eq!(vote.method, "vote");
        assert_eq!(
            vote.args,
            vec![Token::Uint(1u64.into()), hash_token(credential_hash("V1"))]
        );
    }

    #[actix_web::test]
    async fn logout_needs_no_password() {
        let node = ScriptedNode::new(Chain::default());
        let voters = client(serve_api(registered_store()).await, &node);

        let session = voters.session("V1").await.unwrap();
        assert!(node.sent().is_empty());

        let view = session.logout().await.unwrap();

        assert_eq!(view, View::info(Banner::success("Logged out successfully"), None));
        assert_eq!(node.sent()[0].method, "logout");
    }
}
