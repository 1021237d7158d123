use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use aw_config::AlertingConfig;
use aw_runtime::RunPlan;
use aw_runtime::signal::wait_for_signal;
use aw_runtime::tracing_init::init_tracing;

#[derive(Parser)]
#[command(name = "aw-alerting", about = "Report-driven account alerting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured alert once
    Run {
        /// Path to alerting.toml
        #[arg(short, long)]
        config: PathBuf,
        /// Account id file, replacing `accounts_file` from the config
        #[arg(short, long)]
        accounts: Option<PathBuf>,
        /// Force debug-level logging
        #[arg(long)]
        debug: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            accounts,
            debug,
        } => {
            let config_path = config
                .canonicalize()
                .map_err(|e| anyhow::anyhow!("config path '{}': {e}", config.display()))?;
            let mut alerting = AlertingConfig::load(&config_path)?;
            if debug {
                alerting.logging = alerting.logging.with_debug();
            }

            let _guard = init_tracing(&alerting.logging, &alerting.base_dir)?;

            let plan = RunPlan::bootstrap(&alerting, accounts.as_deref())
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let signals = tokio::spawn(wait_for_signal(plan.cancel_token()));
            let result = plan.run().await;
            signals.abort();

            let summary = result.map_err(|e| anyhow::anyhow!("{e}"))?;
            for alert in &summary.alerts {
                tracing::info!(
                    domain = "sys",
                    alert = %alert.name,
                    reports = alert.reports,
                    rows = alert.rows,
                    download_failures = alert.download_failures,
                    failed_actions = alert.failed_actions.len(),
                    "alert summary"
                );
            }
        }
    }

    Ok(())
}
