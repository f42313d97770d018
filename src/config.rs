use aws_config::{BehaviorVersion, SdkConfig};
use aws_types::region::Region;
use std::str::FromStr;
use url::Url;

pub const CONTROL_DATABASE: &str = "data_control";
pub const DEFAULT_SKIP_TABLES: &str = "a_client_contract_reference_delete";

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidVariable(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunctionKind {
    ConfigPopulator,
    ActiveTableStart,
}

impl FromStr for FunctionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "config-populator" => Ok(FunctionKind::ConfigPopulator),
            "active-table-start" => Ok(FunctionKind::ActiveTableStart),
            other => Err(ConfigError::InvalidVariable(format!(
                "Unrecognized function kind: {}",
                other
            ))),
        }
    }
}

/// The environment this deployment runs in. The name keys the
/// `environments` map of a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub enum DeploymentEnvironment {
    Production,
    NonProduction,
    Other(String),
}

impl DeploymentEnvironment {
    pub fn parse(name: &str) -> DeploymentEnvironment {
        match name.trim() {
            "prod" => DeploymentEnvironment::Production,
            "non-prod" => DeploymentEnvironment::NonProduction,
            other => DeploymentEnvironment::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DeploymentEnvironment::Production => "prod",
            DeploymentEnvironment::NonProduction => "non-prod",
            DeploymentEnvironment::Other(name) => name.as_str(),
        }
    }

    /// Tag used in the change-audit staging bucket name.
    pub fn changeaudit_tag(&self) -> &'static str {
        match self {
            DeploymentEnvironment::Production => "prd",
            DeploymentEnvironment::NonProduction => "dev",
            DeploymentEnvironment::Other(_) => "pre-prod",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub function_kind: FunctionKind,
    pub environment: DeploymentEnvironment,
    pub aws_region: String,
    pub aws_account_id: Option<String>,
    pub query_output_location: Option<String>,
    pub alert_webhook_url: Option<Url>,
    pub skip_sources: Vec<String>,
    pub skip_tables: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(format!("Env var {} undefined.", name)))
        };
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let alert_webhook_url = match optional("ENV_ALERT_WEBHOOK_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidVariable(format!(
                    "ENV_ALERT_WEBHOOK_URL may not be a valid url:\n{:?}",
                    e
                ))
            })?),
            None => None,
        };
        let config = Config {
            function_kind: required("ENV_FUNCTION_KIND")?.parse()?,
            environment: DeploymentEnvironment::parse(&required("ENV_DEPLOYMENT_ENVIRONMENT")?),
            aws_region: required("ENV_AWS_REGION")?,
            aws_account_id: optional("ENV_AWS_ACCOUNT_ID"),
            query_output_location: optional("ENV_QUERY_OUTPUT_LOCATION"),
            alert_webhook_url,
            skip_sources: split_list(&optional("ENV_ACTIVATION_SKIP_SOURCES").unwrap_or_default()),
            skip_tables: split_list(
                &optional("ENV_ACTIVATION_SKIP_TABLES")
                    .unwrap_or_else(|| DEFAULT_SKIP_TABLES.to_string()),
            ),
        };
        match config.function_kind {
            FunctionKind::ConfigPopulator => {
                config.query_output_location()?;
            }
            FunctionKind::ActiveTableStart => {
                config.account_id()?;
            }
        }
        Ok(config)
    }

    pub async fn load_sdk_config(&self) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.aws_region.clone()))
            .load()
            .await
    }

    pub fn account_id(&self) -> Result<&str, ConfigError> {
        self.aws_account_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVariable("Env var ENV_AWS_ACCOUNT_ID undefined.".to_string()))
    }

    /// Result-spool location handed to the query engine with every statement.
    pub fn query_output_location(&self) -> Result<String, ConfigError> {
        if let Some(location) = &self.query_output_location {
            return Ok(location.to_string());
        }
        let account_id = self.account_id()?;
        Ok(format!(
            "s3://aws-athena-query-results-{}-{}/",
            account_id, self.aws_region
        ))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
