mod defaults;
mod document;
mod orchestration;
mod querying;
mod retrying;
mod sql;
mod statements;

use crate::alerting::Alerter;
use crate::config::{Config, CONTROL_DATABASE};
use crate::entities::DocumentLocation;
use document::remote::fetch_document_bytes;
use document::{parse_document, select_environment};
use orchestration::run_statement_set;
pub use orchestration::PopulationReport;
use querying::{run_statement_remotely, QueryTarget};
pub use retrying::GuardOutcome;
use retrying::{run_guarded, RetryPolicy};
use sql::Statement;
use statements::{synthesize_statements, SynthesisContext};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{event, Level};

#[derive(Debug)]
pub enum ProcessingError {
    MalformedDocument(String),
    DocumentFetchFailure(String),
    StatementSynthesisFailure(String),
    QuerySubmissionFailure(String),
    QueryStatusFetchFailure(String),
    QueryFailed(String),
    StageFailed(String),
    TimeoutRisk(String),
    ConfigurationError(String),
}

struct Clients {
    s3: aws_sdk_s3::Client,
    athena: aws_sdk_athena::Client,
}

async fn _attempt_population(
    location: &DocumentLocation,
    config: &Config,
    clients: &Clients,
    target: &QueryTarget,
) -> Result<PopulationReport, ProcessingError> {
    let content = fetch_document_bytes(location, &clients.s3).await?;
    event!(Level::INFO, "Processing the JSON content received.");
    let document = parse_document(&content)?;
    let env_config = select_environment(&document, &config.environment)?;
    let context = SynthesisContext {
        source_name: &document.source_name,
        environment: &config.environment,
        inserted_at: OffsetDateTime::now_utc(),
    };
    let statement_set = synthesize_statements(env_config, &context)?;
    let run_query_fn = |statement: Statement| async move {
        run_statement_remotely(statement, target, &clients.athena).await
    };
    run_statement_set(&statement_set, run_query_fn).await
}

/// Reads the configuration document at `location` and rewrites the control
/// tables from it, retrying the whole sequence on failure.
pub async fn populate_config_tables<R>(
    location: &DocumentLocation,
    config: &Config,
    alerter: &Alerter,
    remaining_time_fn: R,
) -> Result<GuardOutcome<PopulationReport>, ProcessingError>
where
    R: Fn() -> Duration,
{
    let output_location = config
        .query_output_location()
        .map_err(|e| ProcessingError::ConfigurationError(format!("{:?}", e)))?;
    let target = QueryTarget {
        database: CONTROL_DATABASE.to_string(),
        output_location,
    };
    let sdk_config = config.load_sdk_config().await;
    let clients = Clients {
        s3: aws_sdk_s3::Client::new(&sdk_config),
        athena: aws_sdk_athena::Client::new(&sdk_config),
    };
    let attempt_fn = |attempt: u32| {
        let clients = &clients;
        let target = &target;
        async move {
            event!(
                Level::INFO,
                "Populating config tables from s3://{}/{} (attempt {}).",
                &location.bucket,
                &location.key,
                attempt
            );
            _attempt_population(location, config, clients, target).await
        }
    };
    let sleep_fn = |duration: Duration| tokio::time::sleep(duration);
    let notify_fn =
        |message: String| async move { alerter.send_failure_notification(&message).await };
    run_guarded(
        &RetryPolicy::default(),
        attempt_fn,
        sleep_fn,
        remaining_time_fn,
        notify_fn,
    )
    .await
}
