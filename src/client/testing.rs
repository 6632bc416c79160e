//! A scripted JSON-RPC node and a live API server for exercising the client
//! flows end to end.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use async_trait::async_trait;
use ethers::abi::{encode, Abi, Function, Token};
use ethers::providers::{JsonRpcClient, JsonRpcError, Provider, ProviderError, RpcError};
use ethers::types::{Address, Transaction, TransactionReceipt, H256, U256, U64};
use ethers::utils::hex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::artifacts::load_contract_abi;
use crate::client::ApiClient;
use crate::resolver::tests::test_state;
use crate::routes;
use crate::store::MemoryStore;

pub const ADMIN_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const RELAYER_ACCOUNT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

pub fn address(text: &str) -> Address {
    text.parse().unwrap()
}

pub fn bvote_abi() -> Abi {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/static/contracts/BVote.sol/BVote.json");
    serde_json::from_value(load_contract_abi(std::path::Path::new(path)).unwrap()).unwrap()
}

/// Contract state the node answers reads from.
#[derive(Debug, Default)]
pub struct Chain {
    pub chain_id: u64,
    /// Party names; party `n` is at index `n - 1`.
    pub parties: Vec<String>,
    /// Votes keyed by `(constituency, party)`.
    pub votes: HashMap<(u64, u64), u64>,
    pub has_voted: bool,
    pub party_voted: u64,
    /// Methods whose transactions the node refuses.
    pub rejected: Vec<&'static str>,
}

/// A contract write the node accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SentCall {
    pub method: String,
    pub from: Address,
    pub gas: Option<U256>,
    pub gas_price: Option<U256>,
    pub args: Vec<Token>,
}

#[derive(Debug, Error)]
#[error("{}", .0.message)]
pub struct NodeError(JsonRpcError);

impl NodeError {
    pub fn reverted(message: &str) -> Self {
        NodeError(JsonRpcError {
            code: -32000,
            message: message.to_owned(),
            data: None,
        })
    }
}

impl RpcError for NodeError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        Some(&self.0)
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        None
    }
}

impl From<NodeError> for ProviderError {
    fn from(err: NodeError) -> Self {
        ProviderError::JsonRpcClientError(Box::new(err))
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedNode {
    abi: Abi,
    chain: Arc<Mutex<Chain>>,
    sent: Arc<Mutex<Vec<SentCall>>>,
}

impl ScriptedNode {
    pub fn new(chain: Chain) -> Self {
        Self {
            abi: bvote_abi(),
            chain: Arc::new(Mutex::new(chain)),
            sent: Arc::default(),
        }
    }

    pub fn provider(&self) -> Provider<ScriptedNode> {
        Provider::new(self.clone()).interval(Duration::from_millis(5))
    }

    pub fn sent(&self) -> Vec<SentCall> {
        self.sent.lock().unwrap().clone()
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, NodeError> {
        let value = match method {
            "eth_chainId" => json!(U256::from(self.chain.lock().unwrap().chain_id)),
            "eth_accounts" => json!([address(ADMIN_ACCOUNT)]),
            "eth_gasPrice" => json!(U256::exp10(9)),
            "eth_estimateGas" => json!(U256::from(90_000u64)),
            "eth_blockNumber" => json!(U64::from(1u64)),
            "eth_call" => {
                let (function, args) = self.decode(&params[0]);
                let output = encode(&self.read(&function.name, &args));
                json!(format!("0x{}", hex::encode(output)))
            }
            "eth_sendTransaction" => return self.accept(&params[0]),
            "eth_getTransactionByHash" => {
                let tx = Transaction {
                    hash: serde_json::from_value(params[0].clone()).unwrap(),
                    block_number: Some(U64::from(1u64)),
                    ..Default::default()
                };
                serde_json::to_value(tx).unwrap()
            }
            "eth_getTransactionReceipt" => {
                let receipt = TransactionReceipt {
                    transaction_hash: serde_json::from_value(params[0].clone()).unwrap(),
                    block_number: Some(U64::from(1u64)),
                    status: Some(U64::from(1u64)),
                    ..Default::default()
                };
                serde_json::to_value(receipt).unwrap()
            }
            other => panic!("unexpected rpc method {other}"),
        };
        Ok(value)
    }

    fn decode(&self, tx: &Value) -> (Function, Vec<Token>) {
        let data = tx
            .get("data")
            .or_else(|| tx.get("input"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let bytes = hex::decode(data.trim_start_matches("0x")).unwrap();

        let function = self
            .abi
            .functions()
            .find(|f| bytes.len() >= 4 && f.short_signature()[..] == bytes[..4])
            .unwrap_or_else(|| panic!("no function for call data {data}"))
            .clone();
        let args = function.decode_input(&bytes[4..]).unwrap();
        (function, args)
    }

    fn read(&self, method: &str, args: &[Token]) -> Vec<Token> {
        let chain = self.chain.lock().unwrap();
        match method {
            "numParties" => vec![Token::Uint(chain.parties.len().into())],
            "partyList" => {
                let number = uint(&args[0]);
                let name = number
                    .checked_sub(1)
                    .and_then(|index| chain.parties.get(index as usize))
                    .cloned()
                    .unwrap_or_default();
                let total: u64 = chain
                    .votes
                    .iter()
                    .filter(|((_, party), _)| *party == number)
                    .map(|(_, votes)| votes)
                    .sum();
                vec![
                    Token::Uint(number.into()),
                    Token::String(name),
                    Token::Uint(total.into()),
                ]
            }
            "voters" => vec![
                Token::FixedBytes(vec![0; 32]),
                Token::Uint(U256::one()),
                Token::Bool(true),
                Token::Bool(true),
                Token::Bool(chain.has_voted),
                Token::Uint(chain.party_voted.into()),
            ],
            "getPartyVoteCountByConstituency" => {
                let key = (uint(&args[0]), uint(&args[1]));
                let votes = chain.votes.get(&key).copied().unwrap_or(0);
                vec![Token::Uint(votes.into())]
            }
            other => panic!("unexpected contract read {other}"),
        }
    }

    fn accept(&self, tx: &Value) -> Result<Value, NodeError> {
        let (function, args) = self.decode(tx);

        let refused = self
            .chain
            .lock()
            .unwrap()
            .rejected
            .iter()
            .any(|method| *method == function.name);
        if refused {
            return Err(NodeError::reverted(&format!(
                "execution reverted: {} refused",
                function.name
            )));
        }

        let quantity = |key: &str| {
            tx.get(key)
                .map(|value| serde_json::from_value::<U256>(value.clone()).unwrap())
        };
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentCall {
            method: function.name.clone(),
            from: serde_json::from_value(tx["from"].clone()).unwrap(),
            gas: quantity("gas"),
            gas_price: quantity("gasPrice"),
            args,
        });

        Ok(json!(H256::from_low_u64_be(sent.len() as u64)))
    }
}

fn uint(token: &Token) -> u64 {
    match token {
        Token::Uint(value) => value.as_u64(),
        other => panic!("expected uint, got {other:?}"),
    }
}

#[async_trait]
impl JsonRpcClient for ScriptedNode {
    type Error = NodeError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, NodeError>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params).unwrap();
        let result = self.answer(method, &params)?;
        Ok(serde_json::from_value(result).unwrap())
    }
}

/// Serves the API on an ephemeral port, with the shipped contract ABI.
pub async fn serve_api(store: MemoryStore) -> ApiClient {
    let mut state = test_state(store);
    state.contract_abi = load_contract_abi(&state.config.contract_artifact).unwrap();
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, &state.config))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();

    let address = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    ApiClient::new(&format!("http://{address}"))
}
