use std::sync::Arc;

use ledger::{LedgerError, LedgerReader};
use shared::{
    domain::{LedgerStats, WorkOrder, WorkOrderId},
    error::{QueryName, ReadFailure},
};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsReadout {
    pub values: LedgerStats,
    pub failures: Vec<ReadFailure>,
}

impl StatsReadout {
    /// Fresh values where available, last-good values for everything else.
    pub fn merge_over(&self, prior: &LedgerStats) -> LedgerStats {
        LedgerStats {
            available_tokens: self.values.available_tokens.or(prior.available_tokens),
            reserve_balance: self.values.reserve_balance.or(prior.reserve_balance),
            payment_token_balance: self
                .values
                .payment_token_balance
                .or(prior.payment_token_balance),
            redemption_fee_percent: self
                .values
                .redemption_fee_percent
                .or(prior.redemption_fee_percent),
        }
    }
}

fn read_failure(query: QueryName, err: LedgerError) -> ReadFailure {
    warn!("sync: read of {query} failed: {err}");
    ReadFailure::new(query, err.to_string())
}

fn keep<T>(
    result: Result<T, LedgerError>,
    query: QueryName,
    failures: &mut Vec<ReadFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            failures.push(read_failure(query, err));
            None
        }
    }
}

#[derive(Clone)]
pub struct ChainReader {
    ledger: Arc<dyn LedgerReader>,
}

impl ChainReader {
    pub fn new(ledger: Arc<dyn LedgerReader>) -> Self {
        Self { ledger }
    }

    pub async fn read_stats(&self) -> StatsReadout {
        let reserve_supported = self.ledger.capabilities().reserve_fund();
        let reserve = async {
            if reserve_supported {
                Some(self.ledger.reserve_balance().await)
            } else {
                None
            }
        };

        let (available, reserve, payment, fee) = futures::join!(
            self.ledger.available_tokens(),
            reserve,
            self.ledger.payment_token_balance(),
            self.ledger.redemption_fee_percent(),
        );

        let mut failures = Vec::new();
        let values = LedgerStats {
            available_tokens: keep(available, QueryName::AvailableTokens, &mut failures),
            reserve_balance: reserve
                .and_then(|result| keep(result, QueryName::ReserveBalance, &mut failures)),
            payment_token_balance: keep(payment, QueryName::PaymentTokenBalance, &mut failures),
            redemption_fee_percent: keep(fee, QueryName::RedemptionFee, &mut failures),
        };
        StatsReadout { values, failures }
    }

    /// Reads the reported count, then every order by index. All or nothing.
    pub async fn read_work_orders(&self) -> Result<Vec<WorkOrder>, ReadFailure> {
        let count = self
            .ledger
            .work_order_count()
            .await
            .map_err(|err| read_failure(QueryName::WorkOrderCount, err))?;

        let mut orders = Vec::new();
        for index in 0..count {
            let order = self
                .ledger
                .work_order(WorkOrderId(index))
                .await
                .map_err(|err| read_failure(QueryName::WorkOrder(index), err))?;
            orders.push(order);
        }
        Ok(orders)
    }
}
