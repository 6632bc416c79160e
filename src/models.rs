use ethers::types::U256;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Gas limit handed to clients for every contract call.
pub const GAS_LIMIT: u64 = 200_000;

/// Gas price handed to clients, in gwei.
pub const GAS_PRICE_GWEI: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "voterId")]
    pub voter_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "whole_number")]
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub constituency_name: String,
    #[serde(deserialize_with = "whole_number")]
    pub constituency: i64,
    #[serde(rename = "isRegistered", default)]
    pub is_registered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relayer {
    #[serde(deserialize_with = "whole_number")]
    pub constituency: i64,
    #[serde(rename = "relayerAddress")]
    pub relayer_address: String,
    #[serde(rename = "relayerPrivateKey", default)]
    pub relayer_private_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParameters {
    pub rpc_url: String,
    pub relayer_address: String,
    pub gas_limit: u64,
    /// Wei, as a decimal string.
    pub gas_price: String,
}

impl TransactionParameters {
    pub fn for_relayer(rpc_url: &str, relayer: &Relayer) -> Self {
        let gas_price = U256::from(GAS_PRICE_GWEI) * U256::exp10(9);

        Self {
            rpc_url: rpc_url.to_owned(),
            relayer_address: relayer.relayer_address.clone(),
            gas_limit: GAS_LIMIT,
            gas_price: gas_price.to_string(),
        }
    }
}

/// What a client gets to see of a voter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterDetails {
    #[serde(rename = "voterId")]
    pub voter_id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub constituency_name: String,
    pub constituency: i64,
}

impl From<&Voter> for VoterDetails {
    fn from(voter: &Voter) -> Self {
        Self {
            voter_id: voter.voter_id.clone(),
            name: voter.name.clone(),
            age: voter.age,
            gender: voter.gender.clone(),
            constituency_name: voter.constituency_name.clone(),
            constituency: voter.constituency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    pub address: String,
    pub network: String,
}

/// Everything a client needs to drive the contract on behalf of one voter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCall {
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    #[serde(rename = "contractABI")]
    pub contract_abi: Value,
    #[serde(rename = "transactionData")]
    pub transaction_data: TransactionParameters,
    #[serde(rename = "Voterdetails")]
    pub voter_details: VoterDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "voterId", deserialize_with = "id_text")]
    pub voter_id: String,
    #[serde(deserialize_with = "constituency_number")]
    pub constituency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "voterId", deserialize_with = "id_text")]
    pub voter_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A scalar as it may arrive from a form post or an older store document.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    fn whole(self) -> Result<i64, String> {
        match self {
            Loose::Integer(number) => Ok(number),
            Loose::Float(number)
                if number.fract() == 0.0 && number.abs() <= i64::MAX as f64 =>
            {
                Ok(number as i64)
            }
            Loose::Float(number) => Err(format!("{number} is not a whole number")),
            Loose::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("{text:?} is not a number")),
        }
    }

    fn into_text(self) -> String {
        match self {
            Loose::Integer(number) => number.to_string(),
            Loose::Float(number) => number.to_string(),
            Loose::Text(text) => text,
        }
    }
}

// Documents written by the mongo shell or mongoimport store numbers as doubles.
fn whole_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let number = Loose::deserialize(deserializer)?
        .whole()
        .map_err(de::Error::custom)?;
    T::try_from(number).map_err(|_| de::Error::custom(format!("{number} is out of range")))
}

// Form posts send the constituency as text.
fn constituency_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Loose::deserialize(deserializer)?
        .whole()
        .map_err(|reason| de::Error::custom(format!("constituency must be a number: {reason}")))
}

// Voter ids are text in the store; a numeric id is looked up as its digits.
fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Loose::deserialize(deserializer)?.into_text())
}
