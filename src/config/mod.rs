pub mod toml_config;

use crate::core::ConfigProvider;
use crate::core::report::REPORT_FORMATS;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_choices, validate_non_empty_string, validate_path, validate_range, validate_regex,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_DEVICE_PATTERN: &str = r"(r6|v22)-leaf((1\d*|[2-9])|1)";
pub const DEFAULT_IGNORE_INTERFACES: &str = "Vlan.*";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Job {
    /// Create interfaces and sync descriptions from `get_interfaces`
    Interfaces,
    /// Sync cables from `get_lldp_neighbors`
    Cables,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Interfaces => f.write_str("interfaces"),
            Job::Cables => f.write_str("cables"),
        }
    }
}

/// Checks shared by every configuration source.
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    let needs_netbox = config.inventory_file().is_none() || config.live_state_file().is_none();
    if needs_netbox {
        validate_url("netbox.url", config.netbox_url())?;
    }

    validate_non_empty_string("selection.devices", config.device_pattern())?;
    validate_regex("selection.devices", config.device_pattern())?;
    if !config.ignore_interfaces().is_empty() {
        validate_regex("interfaces.ignore", config.ignore_interfaces())?;
    }

    validate_range("netbox.timeout_seconds", config.timeout_seconds(), 1, 600)?;
    validate_choices("report.formats", config.report_formats(), &REPORT_FORMATS)?;

    if let Some(path) = config.output_path() {
        validate_path("report.output_path", path)?;
    }
    if let Some(path) = config.live_state_file() {
        validate_path("run.live_state_file", path)?;
    }
    if let Some(path) = config.inventory_file() {
        validate_path("run.inventory_file", path)?;
    }

    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, clap::Parser)]
#[command(name = "netbox-sync")]
#[command(about = "Reconcile NetBox interfaces and cables against live device state")]
pub struct CliConfig {
    /// Which reconciliation to run
    #[arg(value_enum)]
    pub job: Job,

    #[arg(long, env = "NETBOX_URL", default_value = "http://localhost:8000")]
    pub netbox_url: String,

    #[arg(long, env = "NETBOX_TOKEN", hide_env_values = true)]
    pub netbox_token: Option<String>,

    /// Regex selecting the devices to sync
    #[arg(long, default_value = DEFAULT_DEVICE_PATTERN)]
    pub devices: String,

    /// Regex of interface names to leave alone (empty to ignore none)
    #[arg(long, default_value = DEFAULT_IGNORE_INTERFACES)]
    pub ignore_interfaces: String,

    #[arg(long, help = "Report neighbors whose device or interface is not in NetBox")]
    pub show_missing: bool,

    #[arg(long, help = "Store 'None', 'Unspecified' and empty MAC addresses as no MAC")]
    pub normalize_mac: bool,

    #[arg(long, help = "Continue with the next device when one device fails")]
    pub keep_going: bool,

    /// Replay captured getter output instead of querying devices
    #[arg(long)]
    pub live_state_file: Option<String>,

    /// Run against a JSON inventory seed instead of NetBox
    #[arg(long)]
    pub inventory_file: Option<String>,

    /// Directory for run reports
    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, value_delimiter = ',', default_value = "csv,json")]
    pub report_formats: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn netbox_url(&self) -> &str {
        &self.netbox_url
    }

    fn netbox_token(&self) -> Option<&str> {
        self.netbox_token.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn device_pattern(&self) -> &str {
        &self.devices
    }

    fn ignore_interfaces(&self) -> &str {
        &self.ignore_interfaces
    }

    fn show_missing(&self) -> bool {
        self.show_missing
    }

    fn normalize_mac(&self) -> bool {
        self.normalize_mac
    }

    fn keep_going(&self) -> bool {
        self.keep_going
    }

    fn output_path(&self) -> Option<&str> {
        self.output_path.as_deref()
    }

    fn report_formats(&self) -> &[String] {
        &self.report_formats
    }

    fn live_state_file(&self) -> Option<&str> {
        self.live_state_file.as_deref()
    }

    fn inventory_file(&self) -> Option<&str> {
        self.inventory_file.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}
