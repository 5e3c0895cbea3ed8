use crate::config::{
    validate_provider, Job, DEFAULT_DEVICE_PATTERN, DEFAULT_IGNORE_INTERFACES,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{validate_regex, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub netbox: NetBoxConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub interfaces: InterfacesConfig,
    #[serde(default)]
    pub cables: CablesConfig,
    #[serde(default)]
    pub run: RunConfig,
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetBoxConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub devices: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            devices: DEFAULT_DEVICE_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfacesConfig {
    #[serde(default = "default_ignore")]
    pub ignore: String,
    #[serde(default)]
    pub normalize_mac: bool,
}

fn default_ignore() -> String {
    DEFAULT_IGNORE_INTERFACES.to_string()
}

impl Default for InterfacesConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            normalize_mac: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CablesConfig {
    #[serde(default)]
    pub show_missing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Jobs in execution order.
    #[serde(default = "default_jobs")]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub keep_going: bool,
    pub live_state_file: Option<String>,
    pub inventory_file: Option<String>,
}

fn default_jobs() -> Vec<Job> {
    vec![Job::Interfaces, Job::Cables]
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            keep_going: false,
            live_state_file: None,
            inventory_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

fn default_formats() -> Vec<String> {
    vec!["csv".to_string(), "json".to_string()]
}

impl TomlConfig {
    /// Loads a TOML file, substituting `${VAR}` references first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let pattern = validate_regex("env_substitution", r"\$\{([^}]+)\}")?;
        Ok(pattern
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string())
    }

    pub fn jobs(&self) -> &[Job] {
        &self.run.jobs
    }
}

impl ConfigProvider for TomlConfig {
    fn netbox_url(&self) -> &str {
        &self.netbox.url
    }

    fn netbox_token(&self) -> Option<&str> {
        self.netbox.token.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.netbox.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn device_pattern(&self) -> &str {
        &self.selection.devices
    }

    fn ignore_interfaces(&self) -> &str {
        &self.interfaces.ignore
    }

    fn show_missing(&self) -> bool {
        self.cables.show_missing
    }

    fn normalize_mac(&self) -> bool {
        self.interfaces.normalize_mac
    }

    fn keep_going(&self) -> bool {
        self.run.keep_going
    }

    fn output_path(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.output_path.as_str())
    }

    fn report_formats(&self) -> &[String] {
        self.report.as_ref().map(|r| r.formats.as_slice()).unwrap_or(&[])
    }

    fn live_state_file(&self) -> Option<&str> {
        self.run.live_state_file.as_deref()
    }

    fn inventory_file(&self) -> Option<&str> {
        self.run.inventory_file.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if self.run.jobs.is_empty() {
            return Err(SyncError::InvalidConfigValueError {
                field: "run.jobs".to_string(),
                value: "[]".to_string(),
                reason: "At least one job is required".to_string(),
            });
        }
        validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let toml_content = r#"
[netbox]
url = "https://netbox.example.com"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.device_pattern(), DEFAULT_DEVICE_PATTERN);
        assert_eq!(config.ignore_interfaces(), "Vlan.*");
        assert_eq!(config.jobs(), &[Job::Interfaces, Job::Cables]);
        assert_eq!(config.timeout_seconds(), 30);
        assert!(config.output_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[netbox]
url = "https://netbox.example.com"
token = "abc"
timeout_seconds = 90

[selection]
devices = "^dc1-leaf"

[interfaces]
ignore = ""
normalize_mac = true

[cables]
show_missing = true

[run]
jobs = ["cables"]
keep_going = true

[report]
output_path = "./reports"
formats = ["json"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.netbox_token(), Some("abc"));
        assert_eq!(config.timeout_seconds(), 90);
        assert_eq!(config.ignore_interfaces(), "");
        assert!(config.normalize_mac());
        assert!(config.show_missing());
        assert!(config.keep_going());
        assert_eq!(config.jobs(), &[Job::Cables]);
        assert_eq!(config.report_formats(), &["json".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("NETBOX_SYNC_TEST_TOKEN", "from-env");

        let toml_content = r#"
[netbox]
url = "https://netbox.example.com"
token = "${NETBOX_SYNC_TEST_TOKEN}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.netbox_token(), Some("from-env"));

        std::env::remove_var("NETBOX_SYNC_TEST_TOKEN");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[netbox]
url = "invalid-url"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[netbox]
url = "https://netbox.example.com"

[run]
jobs = []
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_job_fails_to_parse() {
        let toml_content = r#"
[netbox]
url = "https://netbox.example.com"

[run]
jobs = ["vlans"]
"#;
        assert!(TomlConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[netbox]
url = "https://netbox.example.com"

[selection]
devices = "leaf"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.device_pattern(), "leaf");
    }
}
