use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use dashboard_core::{
    build_view, DashboardContext, FilterCriteria, MutationError, RefreshError, RefreshReport,
};
use shared::protocol::{EquipmentInput, MutationRequest};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(about = "Work-order ledger dashboard")]
struct Cli {
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract: Option<String>,
    /// `reserve` (v1) or `equipment` (v2)
    #[arg(long)]
    variant: Option<String>,
    #[arg(long)]
    account: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    unpaid_only: bool,
}

impl From<&FilterArgs> for FilterCriteria {
    fn from(args: &FilterArgs) -> Self {
        Self {
            search: args.search.clone(),
            unpaid_only: args.unpaid_only,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh once and print the dashboard.
    Show {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Refresh on a timer until interrupted.
    Watch {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 15)]
        interval_secs: u64,
    },
    Buy {
        amount: String,
    },
    Redeem {
        amount: String,
    },
    Mint {
        yield_amount: String,
        description: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        serial: Option<String>,
        #[arg(long)]
        tonnage: Option<String>,
    },
    Cancel {
        work_order_id: String,
    },
    WithdrawFees,
    SetFee {
        percent: String,
    },
}

impl Command {
    fn mutation(&self) -> Option<MutationRequest> {
        Some(match self {
            Self::Show { .. } | Self::Watch { .. } => return None,
            Self::Buy { amount } => MutationRequest::Buy {
                amount: amount.clone(),
            },
            Self::Redeem { amount } => MutationRequest::Redeem {
                amount: amount.clone(),
            },
            Self::Mint {
                yield_amount,
                description,
                model,
                serial,
                tonnage,
            } => {
                let equipment = (model.is_some() || serial.is_some() || tonnage.is_some())
                    .then(|| EquipmentInput {
                        model: model.clone().unwrap_or_default(),
                        serial: serial.clone().unwrap_or_default(),
                        tonnage: tonnage.clone().unwrap_or_default(),
                    });
                MutationRequest::Mint {
                    yield_amount: yield_amount.clone(),
                    description: description.clone(),
                    equipment,
                }
            }
            Self::Cancel { work_order_id } => MutationRequest::Cancel {
                work_order_id: work_order_id.clone(),
            },
            Self::WithdrawFees => MutationRequest::WithdrawFees,
            Self::SetFee { percent } => MutationRequest::SetFee {
                percent: percent.clone(),
            },
        })
    }
}

fn report_refresh(result: &std::result::Result<RefreshReport, RefreshError>) {
    match result {
        Ok(report) => {
            for failure in &report.failures {
                eprintln!("warning: {failure} (showing last known value)");
            }
        }
        Err(err) => eprintln!("error: {err} (showing previous data)"),
    }
}

async fn print_dashboard(context: &DashboardContext, json: bool) -> Result<()> {
    let snapshot = context.sync().snapshot().await;
    let view = build_view(&snapshot, Some(context.session()));
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::render(&view, context.capabilities().variant));
    }
    Ok(())
}

async fn watch(context: &DashboardContext, filter: FilterCriteria, every: Duration) -> Result<()> {
    let sync = context.sync();
    sync.apply_filter(filter).await;
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                report_refresh(&sync.refresh_all().await);
                print_dashboard(context, false).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("watch: interrupted");
                return Ok(());
            }
        }
    }
}

async fn run_mutation(context: &DashboardContext, request: &MutationRequest) -> Result<()> {
    let kind = request.kind();
    if kind.is_administrative() && !context.session().is_administrator {
        warn!("{kind} is an administrative action; the ledger may reject it for this account");
    }
    match context.mutation_gateway().execute(request).await {
        Ok(outcome) => {
            println!("{kind} confirmed in tx {}", outcome.confirmation.tx_hash);
            report_refresh(&outcome.refresh);
            print_dashboard(context, false).await
        }
        Err(MutationError::Validation { source, .. }) => {
            Err(anyhow!("invalid input for {kind}: {source}"))
        }
        Err(err) => Err(err).context("mutation was not applied"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(&cli.config, |key| std::env::var(key).ok());
    if let Some(v) = cli.rpc_url.clone() {
        settings.rpc_url = v;
    }
    if let Some(v) = cli.contract.clone() {
        settings.contract_address = v;
    }
    if let Some(v) = cli.variant.clone() {
        settings.variant = v;
    }
    if let Some(v) = cli.account.clone() {
        settings.account = Some(v);
    }

    let options = settings.connect_options()?;
    let connection = ledger::connect(options)
        .await
        .with_context(|| format!("failed to connect to ledger at {}", settings.rpc_url))?;
    let context = DashboardContext::from_connection(connection);

    match &cli.command {
        Command::Show { filter, json } => {
            let sync = context.sync();
            sync.apply_filter(filter.into()).await;
            report_refresh(&sync.refresh_all().await);
            print_dashboard(&context, *json).await
        }
        Command::Watch {
            filter,
            interval_secs,
        } => {
            watch(
                &context,
                filter.into(),
                Duration::from_secs((*interval_secs).max(1)),
            )
            .await
        }
        command => match command.mutation() {
            Some(request) => run_mutation(&context, &request).await,
            None => Ok(()),
        },
    }
}
