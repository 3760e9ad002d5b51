use serde::Serialize;
use shared::domain::Address;

/// The connected wallet. Lives only as long as the connection; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountSession {
    pub address: Address,
    pub is_administrator: bool,
}

impl AccountSession {
    pub fn new(address: Address, owner: Option<Address>) -> Self {
        Self {
            address,
            is_administrator: owner == Some(address),
        }
    }
}
