use async_trait::async_trait;

use crate::{
    errors::{ChainError, PriceProviderError},
    models::{Decimal, PriceSource, TransactionReceipt, TransactionRequest},
    Address, Bytes, TxHash,
};

/// Read/write access to the chain, owned by the caller.
///
/// Implementations hold the signer and are responsible for nonce management, gas pricing and any
/// retry policy. The engine performs each call at most once per operation and never caches or
/// mutates signer state.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Executes a read-only call against the latest block and returns the raw return data.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Signs and broadcasts a transaction from the signer account.
    ///
    /// Once this returns the transaction is in the network and cannot be withdrawn.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError>;

    /// Waits until the transaction is mined with at least `confirmations` confirmations.
    ///
    /// A reverted transaction is returned as a receipt with a `Reverted` status, not as an error.
    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<TransactionReceipt, ChainError>;

    /// Address of the account that signs transactions.
    async fn signer_address(&self) -> Result<Address, ChainError>;
}

/// A single source for the fiat price of the chain's base asset.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait FiatPriceProvider: Send + Sync {
    /// Which tier of the provider chain this provider represents.
    fn source(&self) -> PriceSource;

    /// Returns the current fiat price of one whole unit of the base asset.
    async fn quote_fiat_price(&self) -> Result<Decimal, PriceProviderError>;
}
