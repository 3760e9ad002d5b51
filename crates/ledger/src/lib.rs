use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    amount::Amount,
    domain::{Address, ContractVariant, LedgerCapabilities, WorkOrder, WorkOrderId},
    protocol::LedgerMutation,
};
use thiserror::Error;
use tracing::{info, warn};

pub mod abi;
pub mod contract;
pub mod rpc;

pub use contract::ContractLedger;
pub use rpc::JsonRpcClient;

/// EIP-1193 code a wallet returns when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger transport failure: {0}")]
    Transport(String),
    #[error("ledger rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("request rejected by user: {0}")]
    UserRejected(String),
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },
    #[error("could not decode ledger response: {0}")]
    Decode(String),
    #[error("{method} is not supported by this contract")]
    Unsupported { method: &'static str },
    #[error("no account available from the wallet")]
    NoAccount,
}

impl From<reqwest::Error> for LedgerError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait LedgerReader: Send + Sync {
    fn capabilities(&self) -> LedgerCapabilities;
    async fn available_tokens(&self) -> LedgerResult<Amount>;
    async fn reserve_balance(&self) -> LedgerResult<Amount>;
    async fn payment_token_balance(&self) -> LedgerResult<Amount>;
    async fn redemption_fee_percent(&self) -> LedgerResult<u64>;
    /// Next id to be assigned, i.e. the number of orders ever created.
    async fn work_order_count(&self) -> LedgerResult<u64>;
    async fn work_order(&self, id: WorkOrderId) -> LedgerResult<WorkOrder>;
    async fn owner(&self) -> LedgerResult<Address>;
}

#[async_trait]
pub trait LedgerWriter: Send + Sync {
    async fn submit(&self, mutation: &LedgerMutation) -> LedgerResult<TxHash>;
    async fn await_confirmation(&self, tx_hash: &TxHash) -> LedgerResult<Confirmation>;
}

#[async_trait]
impl<T: LedgerReader + ?Sized> LedgerReader for Arc<T> {
    fn capabilities(&self) -> LedgerCapabilities {
        (**self).capabilities()
    }

    async fn available_tokens(&self) -> LedgerResult<Amount> {
        (**self).available_tokens().await
    }

    async fn reserve_balance(&self) -> LedgerResult<Amount> {
        (**self).reserve_balance().await
    }

    async fn payment_token_balance(&self) -> LedgerResult<Amount> {
        (**self).payment_token_balance().await
    }

    async fn redemption_fee_percent(&self) -> LedgerResult<u64> {
        (**self).redemption_fee_percent().await
    }

    async fn work_order_count(&self) -> LedgerResult<u64> {
        (**self).work_order_count().await
    }

    async fn work_order(&self, id: WorkOrderId) -> LedgerResult<WorkOrder> {
        (**self).work_order(id).await
    }

    async fn owner(&self) -> LedgerResult<Address> {
        (**self).owner().await
    }
}

#[async_trait]
impl<T: LedgerWriter + ?Sized> LedgerWriter for Arc<T> {
    async fn submit(&self, mutation: &LedgerMutation) -> LedgerResult<TxHash> {
        (**self).submit(mutation).await
    }

    async fn await_confirmation(&self, tx_hash: &TxHash) -> LedgerResult<Confirmation> {
        (**self).await_confirmation(tx_hash).await
    }
}

pub trait Ledger: LedgerReader + LedgerWriter {}

impl<T: LedgerReader + LedgerWriter> Ledger for T {}

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub rpc_url: String,
    pub contract_address: Address,
    pub variant: ContractVariant,
    pub account: Option<Address>,
    pub confirmation_poll: Duration,
}

pub struct LedgerConnection {
    pub ledger: Arc<dyn Ledger>,
    pub account: Address,
    pub owner: Option<Address>,
    pub capabilities: LedgerCapabilities,
}

/// Resolves the account, probes the owner query once and binds the contract.
pub async fn connect(options: ConnectOptions) -> LedgerResult<LedgerConnection> {
    let rpc = JsonRpcClient::new(options.rpc_url.clone());
    let account = match options.account {
        Some(account) => account,
        None => rpc
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(LedgerError::NoAccount)?,
    };

    let probe = ContractLedger::new(
        rpc.clone(),
        options.contract_address,
        account,
        LedgerCapabilities::new(options.variant, true),
        options.confirmation_poll,
    );
    let owner = match probe.owner().await {
        Ok(owner) => Some(owner),
        Err(err) => {
            warn!("ledger: owner query unavailable, administrator detection disabled: {err}");
            None
        }
    };

    let capabilities = LedgerCapabilities::new(options.variant, owner.is_some());
    info!(
        "ledger: connected account={} contract={} variant={:?} owner_query={}",
        account, options.contract_address, capabilities.variant, capabilities.owner_query
    );

    Ok(LedgerConnection {
        ledger: Arc::new(probe.with_capabilities(capabilities)),
        account,
        owner,
        capabilities,
    })
}
