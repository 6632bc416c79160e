//! HTTP calls to the bvote API server.

use ethers::abi::Abi;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::client::ClientError;
use crate::models::{DeploymentDescriptor, ErrorBody, LoginRequest, RegisterRequest, ResolvedCall};

pub const ARTIFACT_PATH: &str = "/contracts/BVote.sol/BVote.json";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, voter_id: &str, constituency: i64) -> Result<ResolvedCall, ClientError> {
        let body = RegisterRequest {
            voter_id: voter_id.to_owned(),
            constituency,
        };
        self.post("/api/register", &body).await
    }

    pub async fn login(&self, voter_id: &str) -> Result<ResolvedCall, ClientError> {
        let body = LoginRequest {
            voter_id: voter_id.to_owned(),
        };
        self.post("/api/login", &body).await
    }

    pub async fn deployment(&self) -> Result<DeploymentDescriptor, ClientError> {
        let response = self.http.get(self.url("/deployment.json")).send().await?;
        Ok(checked(response).await?.json().await?)
    }

    /// Fetches the compiled artifact and parses its ABI.
    pub async fn contract_abi(&self) -> Result<Abi, ClientError> {
        let response = self.http.get(self.url(ARTIFACT_PATH)).send().await?;
        let artifact: Value = checked(response).await?.json().await?;
        abi_from_artifact(artifact)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ResolvedCall, ClientError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Ok(checked(response).await?.json().await?)
    }
}

async fn checked(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());

    if status == StatusCode::NOT_FOUND {
        ClientError::NotFound(message)
    } else {
        ClientError::Network(format!("server responded {status}: {message}"))
    }
}

fn abi_from_artifact(mut artifact: Value) -> Result<Abi, ClientError> {
    let abi = artifact
        .get_mut("abi")
        .map(Value::take)
        .ok_or_else(|| ClientError::MalformedResponse("artifact has no abi".to_owned()))?;
    serde_json::from_value(abi).map_err(|e| ClientError::Abi(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_found_keeps_server_message() {
        let err = status_error(StatusCode::NOT_FOUND, r#"{"error":"Relayer not found"}"#);
        assert!(matches!(err, ClientError::NotFound(ref m) if m == "Relayer not found"));
    }

    #[test]
    fn server_fault_is_network_error() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert!(matches!(err, ClientError::Network(ref m) if m.contains("500")));
    }

    #[test]
    fn reads_abi_out_of_artifact() {
        let artifact = json!({
            "contractName": "BVote",
            "abi": [{
                "type": "function",
                "name": "numParties",
                "inputs": [],
                "outputs": [{"name": "", "type": "uint256", "internalType": "uint256"}],
                "stateMutability": "view"
            }]
        });

        let abi = abi_from_artifact(artifact).unwrap();
        assert!(abi.function("numParties").is_ok());
        assert!(abi_from_artifact(json!({"contractName": "BVote"})).is_err());
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.url("/api/login"), "http://localhost:8000/api/login");
    }
}
