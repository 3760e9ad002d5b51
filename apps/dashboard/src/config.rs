use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use ledger::ConnectOptions;
use shared::domain::{Address, ContractVariant};

pub const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: String,
    pub variant: String,
    pub account: Option<String>,
    pub confirmation_poll_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            contract_address: "0x97500Ac1B27931b0a36fe4713B6Af455F5308545".into(),
            variant: "reserve".into(),
            account: None,
            confirmation_poll_ms: 1000,
        }
    }
}

fn table_value(table: &toml::Table, key: &str) -> Option<String> {
    match table.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        _ => None,
    }
}

/// Defaults, then the config file if present, then environment variables.
pub fn load_settings(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<toml::Table>() {
            Ok(file_cfg) => {
                if let Some(v) = table_value(&file_cfg, "rpc_url") {
                    settings.rpc_url = v;
                }
                if let Some(v) = table_value(&file_cfg, "contract_address") {
                    settings.contract_address = v;
                }
                if let Some(v) = table_value(&file_cfg, "variant") {
                    settings.variant = v;
                }
                if let Some(v) = table_value(&file_cfg, "account") {
                    settings.account = Some(v);
                }
                if let Some(v) = table_value(&file_cfg, "confirmation_poll_ms") {
                    if let Ok(parsed) = v.parse() {
                        settings.confirmation_poll_ms = parsed;
                    }
                }
            }
            Err(err) => {
                tracing::warn!("config: ignoring unparsable {}: {err}", path.display());
            }
        }
    }

    if let Some(v) = env("DASHBOARD_RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = env("APP__RPC_URL") {
        settings.rpc_url = v;
    }

    if let Some(v) = env("DASHBOARD_CONTRACT") {
        settings.contract_address = v;
    }
    if let Some(v) = env("APP__CONTRACT_ADDRESS") {
        settings.contract_address = v;
    }

    if let Some(v) = env("DASHBOARD_VARIANT") {
        settings.variant = v;
    }
    if let Some(v) = env("APP__VARIANT") {
        settings.variant = v;
    }

    if let Some(v) = env("DASHBOARD_ACCOUNT") {
        settings.account = Some(v);
    }
    if let Some(v) = env("APP__ACCOUNT") {
        settings.account = Some(v);
    }

    if let Some(v) = env("APP__CONFIRMATION_POLL_MS") {
        if let Ok(parsed) = v.parse() {
            settings.confirmation_poll_ms = parsed;
        }
    }

    settings
}

impl Settings {
    pub fn connect_options(&self) -> anyhow::Result<ConnectOptions> {
        let rpc_url = url::Url::parse(&self.rpc_url)
            .with_context(|| format!("invalid rpc url '{}'", self.rpc_url))?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(anyhow!("rpc url must start with http:// or https://"));
        }

        let contract_address: Address = self
            .contract_address
            .parse()
            .with_context(|| format!("invalid contract address '{}'", self.contract_address))?;
        let variant: ContractVariant = self.variant.parse().map_err(|err: String| anyhow!(err))?;
        let account = self
            .account
            .as_deref()
            .map(|raw| {
                raw.parse::<Address>()
                    .with_context(|| format!("invalid account address '{raw}'"))
            })
            .transpose()?;

        Ok(ConnectOptions {
            rpc_url: rpc_url.to_string(),
            contract_address,
            variant,
            account,
            confirmation_poll: Duration::from_millis(self.confirmation_poll_ms.max(1)),
        })
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
