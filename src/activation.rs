mod remote;

use crate::alerting::Alerter;
use crate::config::Config;
use crate::entities::TableProcessedNotice;
use crate::events::{parse_table_processed_notice, HandlerResponse};
use regex::Regex;
use remote::start_execution;
use serde_json::json;
use std::future::Future;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{event, Level};
use uuid::Uuid;

const MAX_EXECUTION_TABLE_NAME_CHARS: usize = 60;

#[derive(Debug)]
pub enum ActivationError {
    SourceTableMismatch(String),
    NameFormatFailure(String),
    ConfigurationError(String),
    StartExecutionError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRequest {
    pub state_machine_arn: String,
    pub execution_name: String,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivationDecision {
    Skip(String),
    Start(ActivationRequest),
}

/// `a_<table>` for a `<source>_<table>` notice.
pub fn derive_active_table_name(notice: &TableProcessedNotice) -> Result<String, ActivationError> {
    let source = &notice.source_system_name;
    if !notice.table_name.contains(source.as_str()) {
        return Err(ActivationError::SourceTableMismatch(format!(
            "The source system name '{}' doesn't match what's found in the table name: {}.",
            source, notice.table_name
        )));
    }
    let pattern = Regex::new(&format!(r"{}_(\w+)", regex::escape(source))).map_err(|e| {
        ActivationError::SourceTableMismatch(format!("Invalid table pattern:\n{:?}", e))
    })?;
    match pattern
        .captures(&notice.table_name)
        .and_then(|captures| captures.get(1))
    {
        Some(table) => Ok(format!("a_{}", table.as_str())),
        None => Err(ActivationError::SourceTableMismatch(format!(
            "No matching table_name found for {} in {}.",
            source, notice.table_name
        ))),
    }
}

pub fn execution_name(
    active_table_name: &str,
    started_at: OffsetDateTime,
    unique_id: &Uuid,
) -> Result<String, ActivationError> {
    let table_part: String = active_table_name
        .chars()
        .take(MAX_EXECUTION_TABLE_NAME_CHARS)
        .collect();
    let date_suffix = started_at
        .format(format_description!("[year][month][day][hour]"))
        .map_err(|e| {
            ActivationError::NameFormatFailure(format!(
                "Failed to format execution date suffix:\n{:?}",
                e
            ))
        })?;
    let unique_part: String = unique_id.simple().to_string().chars().take(10).collect();
    Ok(format!("{}_{}_{}", table_part, date_suffix, unique_part))
}

pub fn plan_activation(
    notice: &TableProcessedNotice,
    config: &Config,
    started_at: OffsetDateTime,
    unique_id: &Uuid,
) -> Result<ActivationDecision, ActivationError> {
    let active_table_name = derive_active_table_name(notice)?;
    event!(Level::INFO, "Active table name: {}", &active_table_name);
    if config.skip_tables.iter().any(|name| *name == active_table_name) {
        return Ok(ActivationDecision::Skip(format!(
            "Skipping StepFunction execution for {}.",
            active_table_name
        )));
    }
    if config
        .skip_sources
        .iter()
        .any(|name| *name == notice.source_system_name)
    {
        return Ok(ActivationDecision::Skip(format!(
            "StepFunction execution skipped for source_system_name '{}'.",
            notice.source_system_name
        )));
    }
    let account_id = config
        .account_id()
        .map_err(|e| ActivationError::ConfigurationError(format!("{:?}", e)))?;
    let state_machine_arn = format!(
        "arn:aws:states:{}:{}:stateMachine:sf-{}-active-tables-{}",
        config.aws_region, account_id, notice.environment, notice.source_system_name
    );
    let input = json!({
        "event": [
            {
                "Result": {
                    "job_name": format!("CDC_{}", notice.source_system_name),
                    "execution_env": notice.environment,
                    "execution_table_names": [active_table_name]
                }
            }
        ]
    });
    Ok(ActivationDecision::Start(ActivationRequest {
        state_machine_arn,
        execution_name: execution_name(&active_table_name, started_at, unique_id)?,
        input: input.to_string(),
    }))
}

async fn activate_with<F, FutF>(
    message: &str,
    config: &Config,
    started_at: OffsetDateTime,
    unique_id: &Uuid,
    start_fn: F,
) -> Result<HandlerResponse, ActivationError>
where
    F: Fn(ActivationRequest) -> FutF,
    FutF: Future<Output = Result<String, ActivationError>>,
{
    let notice = match parse_table_processed_notice(message) {
        Ok(notice) => notice,
        Err(e) => {
            event!(Level::ERROR, "{:?}", e);
            return Ok(HandlerResponse::new(
                400,
                "Unable to extract message components from SNS message.",
            ));
        }
    };
    event!(
        Level::INFO,
        "Source system {}, table {}, environment {}.",
        &notice.source_system_name,
        &notice.table_name,
        &notice.environment
    );
    match plan_activation(&notice, config, started_at, unique_id) {
        Ok(ActivationDecision::Skip(reason)) => {
            event!(Level::INFO, "{}", &reason);
            Ok(HandlerResponse::new(200, reason))
        }
        Ok(ActivationDecision::Start(request)) => {
            event!(
                Level::INFO,
                "Starting {} as {} with input {}",
                &request.state_machine_arn,
                &request.execution_name,
                &request.input
            );
            let execution_arn = start_fn(request).await?;
            event!(Level::INFO, "Started execution {}", execution_arn);
            Ok(HandlerResponse::new(200, "Lambda function executed successfully"))
        }
        Err(ActivationError::SourceTableMismatch(reason)) => {
            event!(Level::ERROR, "{}", &reason);
            Ok(HandlerResponse::new(400, reason))
        }
        Err(e) => Err(e),
    }
}

/// Starts the active table state machine for a processed-table notice.
pub async fn activate_active_table(
    message: &str,
    config: &Config,
    alerter: &Alerter,
) -> HandlerResponse {
    let sdk_config = config.load_sdk_config().await;
    let client = aws_sdk_sfn::Client::new(&sdk_config);
    let start_fn = |request: ActivationRequest| {
        let client = &client;
        async move { start_execution(&request, client).await }
    };
    let result = activate_with(
        message,
        config,
        OffsetDateTime::now_utc(),
        &Uuid::new_v4(),
        start_fn,
    )
    .await;
    match result {
        Ok(response) => response,
        Err(e) => {
            let mssg = format!("{:?}", e);
            event!(Level::ERROR, "Error: {}", &mssg);
            alerter.send_failure_notification(&mssg).await;
            HandlerResponse::new(
                500,
                "Lambda function encountered an error, please check the logs.",
            )
        }
    }
}
