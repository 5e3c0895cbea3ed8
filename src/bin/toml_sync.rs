use clap::Parser;
use netbox_sync::core::ConfigProvider;
use netbox_sync::utils::{logger, validation::Validate};
use netbox_sync::{Job, SyncRunner, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-sync")]
#[command(about = "Run netbox-sync jobs from a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "netbox-sync.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Run only this job instead of the configured list
    #[arg(long, value_enum)]
    only: Option<Job>,

    /// Show what would run without contacting anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based netbox-sync");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let jobs: Vec<Job> = match args.only {
        Some(job) => vec![job],
        None => config.jobs().to_vec(),
    };

    display_config_summary(&config, &jobs);

    if args.dry_run {
        println!("🔍 Dry run: nothing was contacted or changed.");
        return Ok(());
    }

    let runner = match SyncRunner::from_config(&config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let mut had_failures = false;
    for job in jobs {
        match runner.run(job).await {
            Ok(report) => {
                println!(
                    "✅ {}: {} device(s), {} notification(s)",
                    job,
                    report.devices_processed,
                    report.notifications.len()
                );
                if !report.devices_failed.is_empty() {
                    println!("  ⚠️ Failed devices: {}", report.devices_failed.join(", "));
                    had_failures = true;
                }
            }
            Err(e) => {
                tracing::error!(
                    "❌ {} sync failed: {} (Category: {:?}, Severity: {:?})",
                    job,
                    e,
                    e.category(),
                    e.severity()
                );
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

                // Later jobs depend on earlier ones, so stop here.
                std::process::exit(e.severity().exit_code());
            }
        }
    }

    if had_failures {
        std::process::exit(2);
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, jobs: &[Job]) {
    let jobs: Vec<String> = jobs.iter().map(Job::to_string).collect();

    println!("📋 Configuration Summary:");
    match (config.inventory_file(), config.live_state_file()) {
        (Some(inventory), Some(live)) => {
            println!("  Inventory: {} (offline)", inventory);
            println!("  Live state: {} (offline)", live);
        }
        (inventory, live) => {
            println!("  NetBox: {}", config.netbox_url());
            println!("  Inventory: {}", inventory.unwrap_or("NetBox"));
            println!("  Live state: {}", live.unwrap_or("NAPALM via NetBox"));
        }
    }
    println!("  Devices: {}", config.device_pattern());
    println!("  Ignored interfaces: {}", config.ignore_interfaces());
    println!("  Jobs: {}", jobs.join(", "));
    println!("  Keep going: {}", config.keep_going());
    if let Some(path) = config.output_path() {
        println!("  Reports: {} ({})", path, config.report_formats().join(", "));
    }
    println!();
}
