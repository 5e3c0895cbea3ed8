use clap::Parser;
use netbox_sync::utils::error::SyncError;
use netbox_sync::utils::{logger, validation::Validate};
use netbox_sync::{CliConfig, SyncRunner};

fn report_failure(context: &str, e: &SyncError) {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting netbox-sync ({} job)", config.job);
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        report_failure("Configuration validation failed", &e);
        std::process::exit(1);
    }

    let runner = match SyncRunner::from_config(&config) {
        Ok(runner) => runner,
        Err(e) => {
            report_failure("Could not prepare the run", &e);
            std::process::exit(e.severity().exit_code());
        }
    };
    if runner.is_offline() {
        tracing::info!("🔍 Offline run: no NetBox or device is contacted");
    }

    match runner.run(config.job).await {
        Ok(report) => {
            println!("✅ {} sync completed", report.job);
            println!("  Devices processed: {}", report.devices_processed);
            for (kind, count) in report.counts() {
                println!("  {:?}: {}", kind, count);
            }
            if !report.devices_failed.is_empty() {
                println!("  ⚠️ Failed devices: {}", report.devices_failed.join(", "));
                std::process::exit(2);
            }
        }
        Err(e) => {
            report_failure(&format!("{} sync failed", config.job), &e);
            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}
