//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Header carrying the tenant identifier on every provisioning API call.
pub const TENANT_HEADER: &str = "X-TenantID";

/// Header carrying the organisation name on every provisioning API call.
pub const ORGANIZATION_HEADER: &str = "Organization-Name";

/// Resolved settings for the provisioning API under test, merged from
/// defaults, `mcn-conform.toml`, and `MCN_*` environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "MCN",
    discovery(
        app_name = "mcn-conform",
        env_var = "MCN_CONFIG_PATH",
        config_file_name = "mcn-conform.toml",
        dotfile_name = ".mcn-conform.toml",
        project_file_name = "mcn-conform.toml"
    )
)]
pub struct HarnessConfig {
    /// Base URL of the provisioning API (for example `http://localhost:8081`).
    pub base_url: String,
    /// Tenant identifier sent in the `X-TenantID` header.
    pub tenant_id: String,
    /// Organisation name sent in the `Organization-Name` header.
    pub organization_name: String,
    /// Cloud account identifier used when a field table leaves it blank.
    #[ortho_config(default = 1)]
    pub cloud_account_id: i64,
    /// Cloud provider written into generated payloads.
    #[ortho_config(default = "aws".to_owned())]
    pub cloud_provider: String,
    /// Region written into generated payloads and reused for deletion.
    #[ortho_config(default = "us-east-1".to_owned())]
    pub cloud_region: String,
    /// Path used to create a VPC.
    #[ortho_config(default = "/cloud/vpc".to_owned())]
    pub vpc_create_path: String,
    /// Path template used to delete a VPC; `{id}` is replaced by the VPC id.
    #[ortho_config(default = "/cloud/vpc/{id}".to_owned())]
    pub vpc_delete_path: String,
    /// Path used to create a subnet.
    #[ortho_config(default = "/cloud/create-subnet".to_owned())]
    pub subnet_create_path: String,
    /// Path template used to delete a subnet; `{id}` is replaced by the id.
    #[ortho_config(default = "/cloud/subnet/{id}".to_owned())]
    pub subnet_delete_path: String,
    /// Path probed before scenarios run. Absence on the server is tolerated.
    #[ortho_config(default = "/health".to_owned())]
    pub health_path: String,
    /// TCP connect timeout in seconds.
    #[ortho_config(default = 10)]
    pub connect_timeout_secs: u64,
    /// Response timeout in seconds.
    #[ortho_config(default = 120)]
    pub read_timeout_secs: u64,
    /// Total attempts per request, including the first.
    #[ortho_config(default = 2)]
    pub max_attempts: u32,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl HarnessConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to mcn-conform.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("mcn-conform")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// the configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when a numeric setting is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.base_url,
            &FieldMetadata::new("provisioning API base URL", "MCN_BASE_URL", "base_url"),
        )?;
        Self::require_field(
            &self.tenant_id,
            &FieldMetadata::new("tenant identifier", "MCN_TENANT_ID", "tenant_id"),
        )?;
        Self::require_field(
            &self.organization_name,
            &FieldMetadata::new(
                "organisation name",
                "MCN_ORGANIZATION_NAME",
                "organization_name",
            ),
        )?;
        Self::require_field(
            &self.cloud_provider,
            &FieldMetadata::new("cloud provider", "MCN_CLOUD_PROVIDER", "cloud_provider"),
        )?;
        Self::require_field(
            &self.cloud_region,
            &FieldMetadata::new("cloud region", "MCN_CLOUD_REGION", "cloud_region"),
        )?;
        for (value, env_var, toml_key) in [
            (&self.vpc_create_path, "MCN_VPC_CREATE_PATH", "vpc_create_path"),
            (&self.vpc_delete_path, "MCN_VPC_DELETE_PATH", "vpc_delete_path"),
            (
                &self.subnet_create_path,
                "MCN_SUBNET_CREATE_PATH",
                "subnet_create_path",
            ),
            (
                &self.subnet_delete_path,
                "MCN_SUBNET_DELETE_PATH",
                "subnet_delete_path",
            ),
        ] {
            Self::require_field(
                value,
                &FieldMetadata::new("endpoint path", env_var, toml_key),
            )?;
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid(String::from(
                "max_attempts must be at least 1 (MCN_MAX_ATTEMPTS)",
            )));
        }
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "timeouts must be at least one second (MCN_CONNECT_TIMEOUT_SECS, MCN_READ_TIMEOUT_SECS)",
            )));
        }
        Ok(())
    }

    /// Joins the base URL and a path, tolerating a trailing or missing slash.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Default headers sent with every provisioning API call.
    #[must_use]
    pub fn default_headers(&self) -> Vec<(String, String)> {
        vec![
            (String::from("Accept"), String::from("application/json")),
            (String::from("Content-Type"), String::from("application/json")),
            (String::from(TENANT_HEADER), self.tenant_id.clone()),
            (
                String::from(ORGANIZATION_HEADER),
                self.organization_name.clone(),
            ),
        ]
    }

    /// TCP connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Response timeout as a [`Duration`].
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configured value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
