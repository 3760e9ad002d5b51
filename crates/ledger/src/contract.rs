use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    amount::Amount,
    domain::{
        Address, ContractVariant, EquipmentDetails, LedgerCapabilities, WorkOrder, WorkOrderId,
        WorkOrderStatus,
    },
    protocol::LedgerMutation,
};
use tracing::{debug, info};

use crate::{
    abi::{CallEncoder, ReturnDecoder},
    rpc::JsonRpcClient,
    Confirmation, LedgerError, LedgerReader, LedgerResult, LedgerWriter, TxHash,
};

pub mod sig {
    pub const BUY_TOKENS: &str = "buyTokens(uint256)";
    pub const REDEEM_TOKENS: &str = "redeemTokens(uint256)";
    pub const AVAILABLE_TOKENS: &str = "availableTokens()";
    pub const TOTAL_RESERVE_FUND: &str = "totalReserveFund()";
    pub const PAYMENT_TOKEN_BALANCE: &str = "contractPaymentTokenBalance()";
    pub const REDEMPTION_FEE: &str = "redemptionFeePercentage()";
    pub const MINT_RESERVE: &str = "mintFromWorkOrder(uint256,string)";
    pub const MINT_EQUIPMENT: &str = "mintFromWorkOrder(uint256,string,string,uint256,string)";
    pub const CANCEL_WORK_ORDER: &str = "cancelWorkOrder(uint256)";
    pub const WITHDRAW_FEES: &str = "withdrawFees()";
    pub const SET_REDEMPTION_FEE: &str = "setRedemptionFee(uint256)";
    pub const WORK_ORDERS: &str = "workOrders(uint256)";
    pub const NEXT_WORK_ORDER_ID: &str = "nextWorkOrderId()";
    pub const OWNER: &str = "owner()";
}

pub struct ContractLedger {
    rpc: JsonRpcClient,
    contract: Address,
    account: Address,
    capabilities: LedgerCapabilities,
    confirmation_poll: Duration,
}

impl ContractLedger {
    pub fn new(
        rpc: JsonRpcClient,
        contract: Address,
        account: Address,
        capabilities: LedgerCapabilities,
        confirmation_poll: Duration,
    ) -> Self {
        Self {
            rpc,
            contract,
            account,
            capabilities,
            confirmation_poll,
        }
    }

    pub fn with_capabilities(mut self, capabilities: LedgerCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    async fn call(&self, data: Vec<u8>) -> LedgerResult<Vec<u8>> {
        self.rpc.call(self.account, self.contract, &data).await
    }

    async fn call_uint(&self, signature: &str) -> LedgerResult<Amount> {
        let out = self.call(CallEncoder::new(signature).finish()).await?;
        Ok(Amount::from_raw(ReturnDecoder::new(&out).uint(0)?))
    }

    fn encode_mutation(&self, mutation: &LedgerMutation) -> LedgerResult<Vec<u8>> {
        Ok(match mutation {
            LedgerMutation::Buy { amount } => CallEncoder::new(sig::BUY_TOKENS).uint(amount.raw()),
            LedgerMutation::Redeem { amount } => {
                CallEncoder::new(sig::REDEEM_TOKENS).uint(amount.raw())
            }
            LedgerMutation::Mint {
                yield_amount,
                description,
                equipment,
            } => match (self.capabilities.variant, equipment) {
                (ContractVariant::ReserveBacked, None) => CallEncoder::new(sig::MINT_RESERVE)
                    .uint(yield_amount.raw())
                    .string(description),
                (ContractVariant::Equipment, Some(equipment)) => {
                    CallEncoder::new(sig::MINT_EQUIPMENT)
                        .uint(yield_amount.raw())
                        .string(&equipment.model)
                        .string(&equipment.serial)
                        .uint64(equipment.tonnage)
                        .string(description)
                }
                (ContractVariant::ReserveBacked, Some(_)) => {
                    return Err(LedgerError::Unsupported {
                        method: "mint with equipment details",
                    })
                }
                (ContractVariant::Equipment, None) => {
                    return Err(LedgerError::Unsupported {
                        method: "mint without equipment details",
                    })
                }
            },
            LedgerMutation::Cancel { work_order_id } => {
                CallEncoder::new(sig::CANCEL_WORK_ORDER).uint64(work_order_id.0)
            }
            LedgerMutation::WithdrawFees => CallEncoder::new(sig::WITHDRAW_FEES),
            LedgerMutation::SetFee { percent } => {
                CallEncoder::new(sig::SET_REDEMPTION_FEE).uint64(*percent)
            }
        }
        .finish())
    }
}

pub fn decode_work_order(variant: ContractVariant, data: &[u8]) -> LedgerResult<WorkOrder> {
    let out = ReturnDecoder::new(data);
    match variant {
        // (id, grossYield, reserveAmount, tokensIssued, isActive, isPaid, description, createdAt)
        ContractVariant::ReserveBacked => {
            let created_secs = out.uint64(7)?;
            let created_at = i64::try_from(created_secs)
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .ok_or_else(|| LedgerError::Decode(format!("invalid createdAt {created_secs}")))?;
            Ok(WorkOrder {
                id: WorkOrderId(out.uint64(0)?),
                description: out.string(6)?,
                equipment: None,
                yield_amount: Amount::from_raw(out.uint(1)?),
                reserve_amount: Some(Amount::from_raw(out.uint(2)?)),
                tokens_issued: Some(Amount::from_raw(out.uint(3)?)),
                status: WorkOrderStatus::from_flags(out.bool(4)?, out.bool(5)?),
                created_at: Some(created_at),
            })
        }
        // (id, model, serialNumber, tonnage, yieldAmount, isActive, isPaid, description)
        ContractVariant::Equipment => Ok(WorkOrder {
            id: WorkOrderId(out.uint64(0)?),
            description: out.string(7)?,
            equipment: Some(EquipmentDetails {
                model: out.string(1)?,
                serial: out.string(2)?,
                tonnage: out.uint64(3)?,
            }),
            yield_amount: Amount::from_raw(out.uint(4)?),
            reserve_amount: None,
            tokens_issued: None,
            status: WorkOrderStatus::from_flags(out.bool(5)?, out.bool(6)?),
            created_at: None,
        }),
    }
}

#[async_trait]
impl LedgerReader for ContractLedger {
    fn capabilities(&self) -> LedgerCapabilities {
        self.capabilities
    }

    async fn available_tokens(&self) -> LedgerResult<Amount> {
        self.call_uint(sig::AVAILABLE_TOKENS).await
    }

    async fn reserve_balance(&self) -> LedgerResult<Amount> {
        if !self.capabilities.reserve_fund() {
            return Err(LedgerError::Unsupported {
                method: sig::TOTAL_RESERVE_FUND,
            });
        }
        self.call_uint(sig::TOTAL_RESERVE_FUND).await
    }

    async fn payment_token_balance(&self) -> LedgerResult<Amount> {
        self.call_uint(sig::PAYMENT_TOKEN_BALANCE).await
    }

    async fn redemption_fee_percent(&self) -> LedgerResult<u64> {
        let out = self.call(CallEncoder::new(sig::REDEMPTION_FEE).finish()).await?;
        ReturnDecoder::new(&out).uint64(0)
    }

    async fn work_order_count(&self) -> LedgerResult<u64> {
        let out = self
            .call(CallEncoder::new(sig::NEXT_WORK_ORDER_ID).finish())
            .await?;
        ReturnDecoder::new(&out).uint64(0)
    }

    async fn work_order(&self, id: WorkOrderId) -> LedgerResult<WorkOrder> {
        let out = self
            .call(CallEncoder::new(sig::WORK_ORDERS).uint64(id.0).finish())
            .await?;
        decode_work_order(self.capabilities.variant, &out)
    }

    async fn owner(&self) -> LedgerResult<Address> {
        if !self.capabilities.owner_query {
            return Err(LedgerError::Unsupported { method: sig::OWNER });
        }
        let out = self.call(CallEncoder::new(sig::OWNER).finish()).await?;
        ReturnDecoder::new(&out).address(0)
    }
}

#[async_trait]
impl LedgerWriter for ContractLedger {
    async fn submit(&self, mutation: &LedgerMutation) -> LedgerResult<TxHash> {
        let data = self.encode_mutation(mutation)?;
        let tx_hash = self
            .rpc
            .send_transaction(self.account, self.contract, &data)
            .await?;
        info!("ledger: submitted {} tx={tx_hash}", mutation.kind());
        Ok(tx_hash)
    }

    async fn await_confirmation(&self, tx_hash: &TxHash) -> LedgerResult<Confirmation> {
        loop {
            match self.rpc.transaction_receipt(tx_hash).await? {
                Some(receipt) if receipt.succeeded() => {
                    return Ok(Confirmation {
                        tx_hash: tx_hash.clone(),
                        block_number: receipt.block_number(),
                    });
                }
                Some(_) => {
                    return Err(LedgerError::Reverted {
                        tx_hash: tx_hash.clone(),
                    });
                }
                None => {
                    debug!(tx = %tx_hash, "receipt pending");
                    tokio::time::sleep(self.confirmation_poll).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/contract_tests.rs"]
mod tests;
