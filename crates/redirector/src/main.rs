//! Redirector host
//!
//! Loads a configuration, installs its redirections into a fresh registry and
//! runs the configured probes headlessly, reporting each outcome and the
//! final registry statistics.

mod cli;
mod config;
mod logging;
mod probe;
mod rules;

use anyhow::{anyhow, Result};
use cli::CliArgs;
use config::AppConfig;
use probe::ProbeReport;
use redirection_system::RedirectionRegistry;
use std::sync::Arc;
use tracing::{error, info};

/// Loaded configuration and the registry built from it.
pub struct Application {
    config: AppConfig,
    registry: Arc<RedirectionRegistry>,
}

impl Application {
    pub async fn new(args: CliArgs) -> Result<Self> {
        // Load configuration first (before logging setup)
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;

        logging::setup_logging(&config.logging)?;
        info!("Config: {}", args.config_path.display());

        let registry = rules::build_registry(&config)?;
        Ok(Self { config, registry })
    }

    /// Runs every probe; returns the reports and the final statistics.
    pub fn run(&self) -> Result<Vec<ProbeReport>> {
        info!("Running {} probes", self.config.probes.len());
        let reports = probe::run_probes(&self.registry, &self.config.probes);

        let stats = self.registry.stats();
        info!(
            "Registry stats: {} handlers, {} invocations ({} redirected, {} fallbacks), {} handler failures, {} synthesis failures",
            stats.registered_handlers,
            stats.invocations,
            stats.redirected,
            stats.fallbacks,
            stats.handler_failures,
            stats.synthesis_failures
        );

        let summary = serde_json::json!({
            "probes": &reports,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(reports)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let app = match Application::new(args).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to start redirector: {e:?}");
            std::process::exit(1);
        }
    };

    let reports = app.run()?;
    let failed = reports.iter().filter(|report| !report.is_ok()).count();
    if failed > 0 {
        error!("{} of {} probes failed", failed, reports.len());
        std::process::exit(2);
    }

    info!("All probes completed");
    Ok(())
}
