use std::borrow::Cow;

use ethers::types::H256;
use ethers::utils::{hex, keccak256};

/// Keccak-256 commitment of a voter id or password, as stored on chain.
///
/// Text is hashed as UTF-8, except `0x`/`0X`-prefixed hex which is hashed as
/// the bytes it encodes. Odd-length hex is left-padded with a zero nibble.
/// Web3 clients hash input the same way, so both sides agree on the same
/// credential.
pub fn credential_hash(input: &str) -> H256 {
    H256::from(keccak256(credential_bytes(input)))
}

fn credential_bytes(input: &str) -> Cow<'_, [u8]> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"));

    if let Some(digits) = digits {
        let decoded = if digits.len() % 2 == 0 {
            hex::decode(digits)
        } else {
            hex::decode(format!("0{digits}"))
        };
        if let Ok(bytes) = decoded {
            return Cow::Owned(bytes);
        }
    }
    Cow::Borrowed(input.as_bytes())
}
