//! Client side of bvote: talks to the API server and drives the contract.

pub mod admin;
pub mod api;
pub mod contract;
pub mod error;
pub mod render;
pub mod voter;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::AdminClient;
pub use api::ApiClient;
pub use contract::{Party, Sender, VotingContract};
pub use error::ClientError;
pub use render::{Banner, Tally, Tone, View};
pub use voter::{LoginOutcome, Session, VoterClient};
