use std::sync::Arc;

use ledger::{Confirmation, LedgerError, LedgerWriter};
use shared::{
    error::{MutationFailure, RejectionReason, ValidationFailure},
    protocol::{MutationKind, MutationRequest},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::sync::{RefreshError, RefreshReport, SyncController};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("invalid {kind} input: {source}")]
    Validation {
        kind: MutationKind,
        #[source]
        source: ValidationFailure,
    },
    #[error(transparent)]
    Failed(#[from] MutationFailure),
}

impl MutationError {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Validation { kind, .. } => *kind,
            Self::Failed(failure) => failure.kind,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub kind: MutationKind,
    pub confirmation: Confirmation,
    pub refresh: Result<RefreshReport, RefreshError>,
}

fn classify(kind: MutationKind, err: LedgerError) -> MutationFailure {
    let reason = match &err {
        LedgerError::UserRejected(_) => RejectionReason::UserDeclined,
        LedgerError::Reverted { .. } => RejectionReason::Reverted,
        LedgerError::Rpc { message, .. } if message.to_ascii_lowercase().contains("revert") => {
            RejectionReason::Reverted
        }
        LedgerError::Transport(_) => RejectionReason::Network,
        LedgerError::Unsupported { .. } => RejectionReason::Unsupported,
        LedgerError::Rpc { .. } | LedgerError::Decode(_) | LedgerError::NoAccount => {
            RejectionReason::Rejected
        }
    };
    MutationFailure::new(kind, reason, err.to_string())
}

/// Administrative kinds are passed through like any other; the ledger decides
/// whether the caller may perform them.
pub struct MutationGateway {
    writer: Arc<dyn LedgerWriter>,
    sync: Arc<SyncController>,
}

impl MutationGateway {
    pub fn new(writer: Arc<dyn LedgerWriter>, sync: Arc<SyncController>) -> Self {
        Self { writer, sync }
    }

    pub async fn execute(
        &self,
        request: &MutationRequest,
    ) -> Result<MutationOutcome, MutationError> {
        let kind = request.kind();
        let mutation = request
            .validate()
            .map_err(|source| MutationError::Validation { kind, source })?;

        let tx_hash = self.writer.submit(&mutation).await.map_err(|err| {
            warn!("mutation: {kind} submission rejected: {err}");
            classify(kind, err)
        })?;

        let confirmation = self
            .writer
            .await_confirmation(&tx_hash)
            .await
            .map_err(|err| {
                warn!("mutation: {kind} tx={tx_hash} not confirmed: {err}");
                classify(kind, err)
            })?;
        info!(
            "mutation: {kind} confirmed tx={} block={:?}",
            confirmation.tx_hash, confirmation.block_number
        );

        let refresh = self.sync.refresh_all().await;
        Ok(MutationOutcome {
            kind,
            confirmation,
            refresh,
        })
    }
}

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod tests;
