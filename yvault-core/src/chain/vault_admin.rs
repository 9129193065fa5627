//! Owner-only vault transactions issued on behalf of the admin API.
//!
//! These are isolated writes to the chain; they never touch the ledger. The
//! indexer observes their effects (if any) through the normal event flow.

use super::ChainError;
use super::bindings::IYieldVault;
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// An admin call on the vault contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCall {
    Pause,
    Unpause,
    /// Set a new deposit cap, in asset base units.
    UpdateCap(U256),
    /// Push `amount` of yield into the vault (test deployments only).
    SimulateYield(U256),
}

impl VaultCall {
    pub fn signature(&self) -> &'static str {
        match self {
            VaultCall::Pause => IYieldVault::pauseCall::SIGNATURE,
            VaultCall::Unpause => IYieldVault::unpauseCall::SIGNATURE,
            VaultCall::UpdateCap(_) => IYieldVault::updateCapCall::SIGNATURE,
            VaultCall::SimulateYield(_) => IYieldVault::simulateYieldCall::SIGNATURE,
        }
    }

    /// ABI-encoded calldata.
    pub fn calldata(&self) -> Vec<u8> {
        match self {
            VaultCall::Pause => IYieldVault::pauseCall {}.abi_encode(),
            VaultCall::Unpause => IYieldVault::unpauseCall {}.abi_encode(),
            VaultCall::UpdateCap(new_cap) => {
                IYieldVault::updateCapCall { newCap: *new_cap }.abi_encode()
            }
            VaultCall::SimulateYield(amount) => {
                IYieldVault::simulateYieldCall { amount: *amount }.abi_encode()
            }
        }
    }
}

/// Signs [`VaultCall`]s with the admin key and waits until they are mined.
pub struct VaultAdmin {
    /// Wallet-backed provider; `None` when no admin key is configured.
    provider: Option<DynProvider>,
    admin_address: Option<Address>,
    vault_address: Address,
    receipt_timeout: Duration,
}

impl VaultAdmin {
    pub fn new(
        rpc_url: Url,
        vault_address: Address,
        signer: Option<PrivateKeySigner>,
        receipt_timeout: Duration,
    ) -> Self {
        let admin_address = signer.as_ref().map(|signer| signer.address());
        let provider = signer.map(|signer| {
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(rpc_url)
                .erased()
        });
        Self {
            provider,
            admin_address,
            vault_address,
            receipt_timeout,
        }
    }

    /// Address the admin transactions are sent from.
    pub fn admin_address(&self) -> Option<Address> {
        self.admin_address
    }

    /// Submit `call` and return its transaction hash once mined successfully.
    pub async fn execute(&self, call: VaultCall) -> Result<TxHash, ChainError> {
        let provider = self.provider.as_ref().ok_or(ChainError::NoAdminAccount)?;
        let request = TransactionRequest::default()
            .with_to(self.vault_address)
            .with_input(call.calldata());

        let pending = provider.send_transaction(request).await?;
        let tx_hash = *pending.tx_hash();
        info!(call = call.signature(), tx_hash = %tx_hash, "Admin transaction submitted");

        let receipt = tokio::time::timeout(self.receipt_timeout, pending.get_receipt())
            .await
            .map_err(|_| ChainError::ReceiptTimeout(tx_hash))??;
        if !receipt.status() {
            warn!(call = call.signature(), tx_hash = %tx_hash, "Admin transaction reverted");
            return Err(ChainError::Reverted(tx_hash));
        }

        info!(call = call.signature(), tx_hash = %tx_hash, "Admin transaction mined");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, keccak256};

    const VAULT: Address = address!("00000000000000000000000000000000000000aa");
    // Well-known development key (anvil account 0).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_pause_calldata() {
        assert_eq!(VaultCall::Pause.calldata(), vec![0x84, 0x56, 0xcb, 0x59]);
        assert_eq!(VaultCall::Unpause.calldata(), vec![0x3f, 0x4b, 0xa8, 0x3a]);
    }

    #[test]
    fn test_update_cap_calldata() {
        let calldata = VaultCall::UpdateCap(U256::from(255u32)).calldata();
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(&calldata[..4], &keccak256("updateCap(uint256)")[..4]);
        assert_eq!(&calldata[4..35], &[0u8; 31]);
        assert_eq!(calldata[35], 0xff);
    }

    #[test]
    fn test_admin_address_comes_from_key() {
        let signer: PrivateKeySigner = DEV_KEY.parse().unwrap();
        let admin = VaultAdmin::new(
            "http://127.0.0.1:1".parse().unwrap(),
            VAULT,
            Some(signer),
            Duration::from_secs(1),
        );
        assert_eq!(
            admin.admin_address(),
            Some(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"))
        );
    }

    #[tokio::test]
    async fn test_execute_requires_admin_key() {
        let admin = VaultAdmin::new(
            "http://127.0.0.1:1".parse().unwrap(),
            VAULT,
            None,
            Duration::from_secs(1),
        );
        let result = admin.execute(VaultCall::Pause).await;
        assert!(matches!(result, Err(ChainError::NoAdminAccount)));
    }
}
