use std::sync::Arc;

use ledger::{Ledger, LedgerConnection, LedgerReader, LedgerWriter};
use shared::domain::LedgerCapabilities;

pub mod chain_reader;
pub mod filter;
pub mod mutation;
pub mod session;
pub mod sync;
pub mod view_model;
pub mod view_state;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use chain_reader::{ChainReader, StatsReadout};
pub use filter::{Aggregates, FilterCriteria};
pub use mutation::{MutationError, MutationGateway, MutationOutcome};
pub use session::AccountSession;
pub use sync::{RefreshError, RefreshReport, SyncController, SyncEvent};
pub use view_model::{build_view, DashboardView};
pub use view_state::ViewState;

pub struct DashboardContext {
    ledger: Arc<dyn Ledger>,
    session: AccountSession,
    capabilities: LedgerCapabilities,
    sync: Arc<SyncController>,
}

impl DashboardContext {
    pub fn new(ledger: Arc<dyn Ledger>, session: AccountSession) -> Self {
        let capabilities = ledger.capabilities();
        let reader: Arc<dyn LedgerReader> = Arc::new(Arc::clone(&ledger));
        Self {
            sync: SyncController::new(reader),
            ledger,
            session,
            capabilities,
        }
    }

    pub fn from_connection(connection: LedgerConnection) -> Self {
        let session = AccountSession::new(connection.account, connection.owner);
        Self::new(connection.ledger, session)
    }

    pub fn session(&self) -> &AccountSession {
        &self.session
    }

    pub fn capabilities(&self) -> LedgerCapabilities {
        self.capabilities
    }

    pub fn sync(&self) -> Arc<SyncController> {
        Arc::clone(&self.sync)
    }

    pub fn mutation_gateway(&self) -> MutationGateway {
        let writer: Arc<dyn LedgerWriter> = Arc::new(Arc::clone(&self.ledger));
        MutationGateway::new(writer, self.sync())
    }
}
