use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use ledger::{Confirmation, LedgerError, LedgerReader, LedgerResult, LedgerWriter, TxHash};
use shared::{
    amount::Amount,
    domain::{
        Address, ContractVariant, LedgerCapabilities, WorkOrder, WorkOrderId, WorkOrderStatus,
    },
    error::QueryName,
    protocol::LedgerMutation,
};
use tokio::sync::Mutex;

pub fn work_order(id: u64, yield_units: u64, status: WorkOrderStatus) -> WorkOrder {
    WorkOrder {
        id: WorkOrderId(id),
        description: format!("work order {id}"),
        equipment: None,
        yield_amount: Amount::from_units(yield_units),
        reserve_amount: Some(Amount::ZERO),
        tokens_issued: Some(Amount::ZERO),
        status,
        created_at: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehavior {
    Confirm,
    DeclineSubmit,
    RevertOnConfirm,
    NetworkDown,
}

pub struct FakeLedgerState {
    pub orders: Vec<WorkOrder>,
    pub available_tokens: Amount,
    pub reserve_balance: Amount,
    pub payment_token_balance: Amount,
    pub redemption_fee_percent: u64,
    pub owner: Address,
    pub failing: HashSet<QueryName>,
    pub calls: HashMap<&'static str, usize>,
    pub submitted: Vec<LedgerMutation>,
    pub write_behavior: WriteBehavior,
    in_flight_order_reads: usize,
    pub max_in_flight_order_reads: usize,
}

/// In-memory ledger with injectable failures and call counting.
#[derive(Clone)]
pub struct FakeLedger {
    capabilities: LedgerCapabilities,
    pub state: Arc<Mutex<FakeLedgerState>>,
}

impl FakeLedger {
    pub fn new(orders: Vec<WorkOrder>) -> Arc<Self> {
        Arc::new(Self {
            capabilities: LedgerCapabilities::new(ContractVariant::ReserveBacked, true),
            state: Arc::new(Mutex::new(FakeLedgerState {
                orders,
                available_tokens: Amount::from_units(100),
                reserve_balance: Amount::from_units(50),
                payment_token_balance: Amount::from_units(10),
                redemption_fee_percent: 2,
                owner: Address([0xaa; 20]),
                failing: HashSet::new(),
                calls: HashMap::new(),
                submitted: Vec::new(),
                write_behavior: WriteBehavior::Confirm,
                in_flight_order_reads: 0,
                max_in_flight_order_reads: 0,
            })),
        })
    }

    pub async fn fail(&self, query: QueryName) {
        self.state.lock().await.failing.insert(query);
    }

    pub async fn heal(&self, query: QueryName) {
        self.state.lock().await.failing.remove(&query);
    }

    pub async fn set_write_behavior(&self, behavior: WriteBehavior) {
        self.state.lock().await.write_behavior = behavior;
    }

    pub async fn calls(&self, method: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .get(method)
            .copied()
            .unwrap_or_default()
    }

    pub async fn total_read_calls(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|(method, _)| !matches!(**method, "submit" | "await_confirmation"))
            .map(|(_, count)| *count)
            .sum()
    }

    async fn record(&self, method: &'static str, query: QueryName) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        *state.calls.entry(method).or_default() += 1;
        if state.failing.contains(&query) {
            return Err(LedgerError::Transport(format!("{query} unreachable")));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerReader for FakeLedger {
    fn capabilities(&self) -> LedgerCapabilities {
        self.capabilities
    }

    async fn available_tokens(&self) -> LedgerResult<Amount> {
        self.record("available_tokens", QueryName::AvailableTokens)
            .await?;
        Ok(self.state.lock().await.available_tokens)
    }

    async fn reserve_balance(&self) -> LedgerResult<Amount> {
        self.record("reserve_balance", QueryName::ReserveBalance)
            .await?;
        Ok(self.state.lock().await.reserve_balance)
    }

    async fn payment_token_balance(&self) -> LedgerResult<Amount> {
        self.record("payment_token_balance", QueryName::PaymentTokenBalance)
            .await?;
        Ok(self.state.lock().await.payment_token_balance)
    }

    async fn redemption_fee_percent(&self) -> LedgerResult<u64> {
        self.record("redemption_fee_percent", QueryName::RedemptionFee)
            .await?;
        Ok(self.state.lock().await.redemption_fee_percent)
    }

    async fn work_order_count(&self) -> LedgerResult<u64> {
        self.record("work_order_count", QueryName::WorkOrderCount)
            .await?;
        Ok(self.state.lock().await.orders.len() as u64)
    }

    async fn work_order(&self, id: WorkOrderId) -> LedgerResult<WorkOrder> {
        self.record("work_order", QueryName::WorkOrder(id.0)).await?;
        {
            let mut state = self.state.lock().await;
            state.in_flight_order_reads += 1;
            state.max_in_flight_order_reads = state
                .max_in_flight_order_reads
                .max(state.in_flight_order_reads);
        }
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.in_flight_order_reads -= 1;
        state
            .orders
            .get(id.0 as usize)
            .cloned()
            .ok_or_else(|| LedgerError::Decode(format!("no work order {id}")))
    }

    async fn owner(&self) -> LedgerResult<Address> {
        self.record("owner", QueryName::Owner).await?;
        Ok(self.state.lock().await.owner)
    }
}

#[async_trait]
impl LedgerWriter for FakeLedger {
    async fn submit(&self, mutation: &LedgerMutation) -> LedgerResult<TxHash> {
        let mut state = self.state.lock().await;
        *state.calls.entry("submit").or_default() += 1;
        match state.write_behavior {
            WriteBehavior::DeclineSubmit => {
                return Err(LedgerError::UserRejected("user denied".into()))
            }
            WriteBehavior::NetworkDown => {
                return Err(LedgerError::Transport("connection refused".into()))
            }
            WriteBehavior::Confirm | WriteBehavior::RevertOnConfirm => {}
        }
        state.submitted.push(mutation.clone());
        Ok(TxHash(format!("0x{:02x}", state.submitted.len())))
    }

    async fn await_confirmation(&self, tx_hash: &TxHash) -> LedgerResult<Confirmation> {
        let mut state = self.state.lock().await;
        *state.calls.entry("await_confirmation").or_default() += 1;
        if state.write_behavior == WriteBehavior::RevertOnConfirm {
            return Err(LedgerError::Reverted {
                tx_hash: tx_hash.clone(),
            });
        }

        // Apply the effect only once the write is confirmed.
        if let Some(mutation) = state.submitted.last().cloned() {
            match mutation {
                LedgerMutation::Cancel { work_order_id } => {
                    if let Some(order) = state.orders.get_mut(work_order_id.0 as usize) {
                        order.status = WorkOrderStatus::Cancelled;
                    }
                }
                LedgerMutation::Mint {
                    yield_amount,
                    description,
                    ..
                } => {
                    let id = state.orders.len() as u64;
                    let mut order = work_order(id, 0, WorkOrderStatus::Open);
                    order.yield_amount = yield_amount;
                    order.description = description;
                    state.orders.push(order);
                }
                LedgerMutation::Buy { amount } => {
                    state.available_tokens = Amount::from_raw(
                        state.available_tokens.raw().saturating_sub(amount.raw()),
                    );
                }
                LedgerMutation::SetFee { percent } => state.redemption_fee_percent = percent,
                LedgerMutation::Redeem { .. } | LedgerMutation::WithdrawFees => {}
            }
        }

        Ok(Confirmation {
            tx_hash: tx_hash.clone(),
            block_number: Some(1),
        })
    }
}
