//! Turns a voter id into the parameters a client needs to call the contract.
//!
//! The relayer is always looked up from the constituency on the stored voter
//! record, never from anything the client sent.

use crate::error::ApiError;
use crate::models::{ResolvedCall, TransactionParameters, Voter, VoterDetails};
use crate::state::AppState;

pub async fn resolve_registration(
    state: &AppState,
    voter_id: &str,
    constituency: i64,
) -> Result<ResolvedCall, ApiError> {
    let voter = state
        .store
        .find_voter(voter_id, Some(constituency))
        .await?
        .ok_or(ApiError::VoterNotFound)?;

    resolve_for(state, &voter).await
}

pub async fn resolve_login(state: &AppState, voter_id: &str) -> Result<ResolvedCall, ApiError> {
    let voter = state
        .store
        .find_voter(voter_id, None)
        .await?
        .ok_or(ApiError::VoterNotFound)?;

    resolve_for(state, &voter).await
}

async fn resolve_for(state: &AppState, voter: &Voter) -> Result<ResolvedCall, ApiError> {
    let relayer = state
        .store
        .find_relayer(voter.constituency)
        .await?
        .ok_or(ApiError::RelayerNotFound)?;

    Ok(ResolvedCall {
        contract_address: state.deployment.address.clone(),
        contract_abi: state.contract_abi.clone(),
        transaction_data: TransactionParameters::for_relayer(&state.config.rpc_url, &relayer),
        voter_details: VoterDetails::from(voter),
    })
}
