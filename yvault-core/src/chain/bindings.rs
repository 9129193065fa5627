//! Solidity bindings for the vault contract.

use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    /// The ERC-4626 accounting events plus the owner-only admin functions.
    #[derive(Debug, PartialEq, Eq)]
    interface IYieldVault {
        event Deposit(address indexed sender, address indexed owner, uint256 assets, uint256 shares);
        event Withdraw(
            address indexed sender,
            address indexed receiver,
            address indexed owner,
            uint256 assets,
            uint256 shares
        );

        function pause() external;
        function unpause() external;
        function updateCap(uint256 newCap) external;
        function simulateYield(uint256 amount) external;
    }
}

/// The vault events the indexer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultEventSignature {
    Deposit,
    Withdraw,
}

impl VaultEventSignature {
    pub const ALL: [VaultEventSignature; 2] =
        [VaultEventSignature::Deposit, VaultEventSignature::Withdraw];

    /// Canonical Solidity signature.
    pub fn signature(&self) -> &'static str {
        match self {
            VaultEventSignature::Deposit => IYieldVault::Deposit::SIGNATURE,
            VaultEventSignature::Withdraw => IYieldVault::Withdraw::SIGNATURE,
        }
    }

    /// topic0 of the event.
    pub fn topic(&self) -> B256 {
        match self {
            VaultEventSignature::Deposit => IYieldVault::Deposit::SIGNATURE_HASH,
            VaultEventSignature::Withdraw => IYieldVault::Withdraw::SIGNATURE_HASH,
        }
    }

    pub fn from_topic(topic: &B256) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|signature| signature.topic() == *topic)
    }
}
