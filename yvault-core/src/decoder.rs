//! Turns raw vault logs into typed events.

use crate::chain::RawLog;
use crate::chain::bindings::{IYieldVault, VaultEventSignature};
use crate::entities::EventKind;
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log has no topics")]
    NoTopics,

    #[error("unknown event topic {0}")]
    UnknownTopic(B256),

    /// Topic count, indexed arguments or data do not match the event ABI.
    #[error("{event} does not match its ABI: {source}")]
    Abi {
        event: &'static str,
        #[source]
        source: alloy::sol_types::Error,
    },
}

/// The accounting content of a Deposit or Withdraw log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedVaultEvent {
    pub kind: EventKind,
    /// Share owner.
    pub owner: Address,
    /// Underlying assets moved.
    pub amount: U256,
    pub shares: U256,
}

impl From<VaultEventSignature> for EventKind {
    fn from(value: VaultEventSignature) -> Self {
        match value {
            VaultEventSignature::Deposit => EventKind::Deposit,
            VaultEventSignature::Withdraw => EventKind::Withdraw,
        }
    }
}

fn decode<E: SolEvent>(log: &RawLog) -> Result<E, DecodeError> {
    E::decode_log(&log.inner)
        .map(|decoded| decoded.data)
        .map_err(|source| DecodeError::Abi {
            event: E::SIGNATURE,
            source,
        })
}

pub fn decode_log(log: &RawLog) -> Result<DecodedVaultEvent, DecodeError> {
    let topic0 = log.topics().first().ok_or(DecodeError::NoTopics)?;
    let signature =
        VaultEventSignature::from_topic(topic0).ok_or(DecodeError::UnknownTopic(*topic0))?;

    let (owner, amount, shares) = match signature {
        VaultEventSignature::Deposit => {
            let event = decode::<IYieldVault::Deposit>(log)?;
            (event.owner, event.assets, event.shares)
        }
        VaultEventSignature::Withdraw => {
            let event = decode::<IYieldVault::Withdraw>(log)?;
            (event.owner, event.assets, event.shares)
        }
    };

    Ok(DecodedVaultEvent {
        kind: signature.into(),
        owner,
        amount,
        shares,
    })
}
