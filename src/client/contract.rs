//! JSON-RPC access to the deployed BVote contract.
//!
//! Calls are encoded against whatever ABI the caller hands in (normally the
//! one the API server returned) and return values are read back by output
//! name, so a redeployed contract with reordered struct fields still reads
//! correctly.

use std::time::Duration;

use ethers::abi::{Abi, Param, Token};
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, TransactionRequest, TxHash, H256, U256, U64,
};
use log::debug;

use crate::client::ClientError;
use crate::models::{ResolvedCall, TransactionParameters};

// Local dev chains mine instantly; the provider default of several seconds
// only slows every write down.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Who a transaction is sent from, and what it may spend.
#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub from: Address,
    pub gas: Option<U256>,
    pub gas_price: Option<U256>,
}

impl Sender {
    /// The constituency relayer, with the gas settings the API server chose.
    pub fn relayer(params: &TransactionParameters) -> Result<Self, ClientError> {
        let from = parse_address(&params.relayer_address)?;
        let gas_price = U256::from_dec_str(&params.gas_price).map_err(|_| {
            ClientError::MalformedResponse(format!("gas price {:?}", params.gas_price))
        })?;

        Ok(Self {
            from,
            gas: Some(U256::from(params.gas_limit)),
            gas_price: Some(gas_price),
        })
    }

    /// An unlocked node account; the node picks gas.
    pub fn account(from: Address) -> Self {
        Self {
            from,
            gas: None,
            gas_price: None,
        }
    }
}

pub fn parse_address(text: &str) -> Result<Address, ClientError> {
    text.trim()
        .parse()
        .map_err(|_| ClientError::MalformedResponse(format!("invalid address {text:?}")))
}

/// Decoded outputs of a contract read, addressable by output name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Token)>,
}

impl Record {
    pub fn new(params: &[Param], tokens: Vec<Token>) -> Self {
        let fields = params
            .iter()
            .map(|p| p.name.clone())
            .zip(tokens)
            .collect();
        Self { fields }
    }

    fn field(&self, name: &str) -> Result<&Token, ClientError> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, token)| token)
            .ok_or_else(|| ClientError::Abi(format!("no output named {name}")))
    }

    fn first(&self) -> Result<&Token, ClientError> {
        self.fields
            .first()
            .map(|(_, token)| token)
            .ok_or_else(|| ClientError::Abi("call returned nothing".to_owned()))
    }

    pub fn uint(&self, name: &str) -> Result<U256, ClientError> {
        as_uint(name, self.field(name)?)
    }

    pub fn first_uint(&self) -> Result<U256, ClientError> {
        as_uint("return value", self.first()?)
    }

    pub fn text(&self, name: &str) -> Result<String, ClientError> {
        match self.field(name)? {
            Token::String(value) => Ok(value.clone()),
            other => Err(mismatch(name, "string", other)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, ClientError> {
        match self.field(name)? {
            Token::Bool(value) => Ok(*value),
            other => Err(mismatch(name, "bool", other)),
        }
    }
}

fn as_uint(name: &str, token: &Token) -> Result<U256, ClientError> {
    match token {
        Token::Uint(value) | Token::Int(value) => Ok(*value),
        other => Err(mismatch(name, "uint", other)),
    }
}

fn mismatch(name: &str, expected: &str, got: &Token) -> ClientError {
    ClientError::Abi(format!("{name}: expected {expected}, got {got:?}"))
}

pub fn to_u64(value: U256) -> Result<u64, ClientError> {
    if value > U256::from(u64::MAX) {
        return Err(ClientError::Abi(format!("{value} does not fit in u64")));
    }
    Ok(value.low_u64())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub number: u64,
    pub name: String,
    pub vote_count: U256,
}

impl Party {
    fn from_record(requested: u64, record: &Record) -> Result<Self, ClientError> {
        let number = match record.uint("partyNumber") {
            Ok(value) => to_u64(value)?,
            Err(_) => requested,
        };

        Ok(Self {
            number,
            name: record.text("name")?,
            vote_count: record.uint("voteCount").unwrap_or_default(),
        })
    }
}

/// The on-chain state of one voter, as far as the client cares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoterRecord {
    pub has_voted: bool,
    pub party_voted: u64,
}

pub struct VotingContract<P = Http> {
    provider: Provider<P>,
    address: Address,
    abi: Abi,
}

impl<P: JsonRpcClient> VotingContract<P> {
    pub fn new(provider: Provider<P>, address: Address, abi: Abi) -> Self {
        Self {
            provider,
            address,
            abi,
        }
    }

    /// The contract an API server response points at, reached through `provider`.
    pub fn from_resolved(call: &ResolvedCall, provider: Provider<P>) -> Result<Self, ClientError> {
        let abi: Abi = serde_json::from_value(call.contract_abi.clone())
            .map_err(|e| ClientError::Abi(e.to_string()))?;
        Ok(Self::new(provider, parse_address(&call.contract_address)?, abi))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Read-only call.
    pub async fn call(&self, method: &str, args: &[Token]) -> Result<Record, ClientError> {
        let function = self.abi.function(method)?;
        let data = function.encode_input(args)?;

        let tx: TypedTransaction = TransactionRequest::new().to(self.address).data(data).into();
        let output = self
            .provider
            .call(&tx, None)
            .await
            .map_err(|e| ClientError::from_provider(method, e))?;

        let tokens = function.decode_output(&output)?;
        Ok(Record::new(&function.outputs, tokens))
    }

    /// State-changing call; waits for the receipt.
    pub async fn send(
        &self,
        method: &str,
        args: &[Token],
        sender: &Sender,
    ) -> Result<TxHash, ClientError> {
        let function = self.abi.function(method)?;
        let data = function.encode_input(args)?;

        let mut tx = TransactionRequest::new()
            .from(sender.from)
            .to(self.address)
            .data(data);
        if let Some(gas) = sender.gas {
            tx = tx.gas(gas);
        }
        if let Some(gas_price) = sender.gas_price {
            tx = tx.gas_price(gas_price);
        }

        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(|e| ClientError::from_provider(method, e))?;
        let receipt = pending
            .await
            .map_err(|e| ClientError::from_provider(method, e))?
            .ok_or_else(|| ClientError::Network(format!("{method} transaction was dropped")))?;

        if receipt.status == Some(U64::zero()) {
            return Err(ClientError::ContractRejection {
                method: method.to_owned(),
                reason: "transaction reverted".to_owned(),
            });
        }

        debug!("{method} mined in {:?}", receipt.transaction_hash);
        Ok(receipt.transaction_hash)
    }

    pub async fn num_parties(&self) -> Result<u64, ClientError> {
        to_u64(self.call("numParties", &[]).await?.first_uint()?)
    }

    pub async fn party(&self, number: u64) -> Result<Party, ClientError> {
        let record = self.call("partyList", &[Token::Uint(number.into())]).await?;
        Party::from_record(number, &record)
    }

    /// Reads every party in order, one call at a time.
    pub async fn parties(&self) -> Result<Vec<Party>, ClientError> {
        let count = self.num_parties().await?;
        let mut parties = Vec::new();
        for number in 1..=count {
            parties.push(self.party(number).await?);
        }
        Ok(parties)
    }

    pub async fn voter_record(&self, id_hash: H256) -> Result<VoterRecord, ClientError> {
        let record = self.call("voters", &[hash_token(id_hash)]).await?;
        Ok(VoterRecord {
            has_voted: record.flag("hasVoted")?,
            party_voted: to_u64(record.uint("partyVoted")?)?,
        })
    }

    pub async fn party_votes_in(&self, constituency: u64, party: u64) -> Result<U256, ClientError> {
        self.call(
            "getPartyVoteCountByConstituency",
            &[Token::Uint(constituency.into()), Token::Uint(party.into())],
        )
        .await?
        .first_uint()
    }

    pub async fn register_voter(
        &self,
        id_hash: H256,
        password_hash: H256,
        constituency: u64,
        sender: &Sender,
    ) -> Result<TxHash, ClientError> {
        let args = [
            hash_token(id_hash),
            hash_token(password_hash),
            Token::Uint(constituency.into()),
        ];
        self.send("registerVoter", &args, sender).await
    }

    pub async fn login(
        &self,
        id_hash: H256,
        password_hash: H256,
        sender: &Sender,
    ) -> Result<TxHash, ClientError> {
        let args = [hash_token(id_hash), hash_token(password_hash)];
        self.send("login", &args, sender).await
    }

    pub async fn vote(&self, party: u64, id_hash: H256, sender: &Sender) -> Result<TxHash, ClientError> {
        let args = [Token::Uint(party.into()), hash_token(id_hash)];
        self.send("vote", &args, sender).await
    }

    pub async fn logout(&self, id_hash: H256, sender: &Sender) -> Result<TxHash, ClientError> {
        self.send("logout", &[hash_token(id_hash)], sender).await
    }

    pub async fn register_party(
        &self,
        number: u64,
        name: &str,
        sender: &Sender,
    ) -> Result<TxHash, ClientError> {
        let args = [Token::Uint(number.into()), Token::String(name.to_owned())];
        self.send("registerParty", &args, sender).await
    }

    pub async fn set_admin(&self, admin: Address, sender: &Sender) -> Result<TxHash, ClientError> {
        self.send("setAdmin", &[Token::Address(admin)], sender).await
    }

    pub async fn set_relayer(
        &self,
        constituency: u64,
        relayer: Address,
        sender: &Sender,
    ) -> Result<TxHash, ClientError> {
        let args = [Token::Uint(constituency.into()), Token::Address(relayer)];
        self.send("setRelayer", &args, sender).await
    }
}

pub fn provider(rpc_url: &str) -> Result<Provider<Http>, ClientError> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .map_err(|e| ClientError::Network(format!("invalid rpc url {rpc_url}: {e}")))?;
    Ok(provider.interval(RECEIPT_POLL_INTERVAL))
}

pub(crate) fn hash_token(hash: H256) -> Token {
    Token::FixedBytes(hash.as_bytes().to_vec())
}
