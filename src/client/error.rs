use ethers::providers::{ProviderError, RpcError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The API server has no matching voter or relayer.
    #[error("{0}")]
    NotFound(String),

    /// The node answered, but the contract refused the call.
    #[error("{method} rejected: {reason}")]
    ContractRejection { method: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("abi error: {0}")]
    Abi(String),

    #[error("connected to chain {actual}, expected {expected}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("no account connected")]
    NoAccount,

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Splits provider failures into contract rejections (the node returned a
    /// JSON-RPC error) and everything else.
    pub fn from_provider(method: &str, err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(response) => ClientError::ContractRejection {
                method: method.to_owned(),
                reason: response.message.clone(),
            },
            None => ClientError::Network(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<ethers::abi::Error> for ClientError {
    fn from(err: ethers::abi::Error) -> Self {
        ClientError::Abi(err.to_string())
    }
}
