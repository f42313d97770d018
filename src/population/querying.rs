pub mod remote;
#[cfg(test)]
mod test_querying;

use super::sql::Statement;
use super::ProcessingError;
use std::future::Future;
use std::time::Duration;
use tracing::{event, Level};

/// Fixed interval between status polls of a submitted run.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus {
    Queued,
    Running,
    Succeeded,
    Failed(Option<String>),
    Cancelled,
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryStatus::Succeeded | QueryStatus::Failed(_) | QueryStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    pub id: String,
    pub status: QueryStatus,
}

/// Everything the query engine needs besides the statement text.
#[derive(Debug, Clone)]
pub struct QueryTarget {
    pub database: String,
    pub output_location: String,
}

async fn await_terminal_status<F, FutF, G, FutG>(
    run_id: &str,
    fetch_status_fn: F,
    sleep_fn: G,
) -> Result<QueryStatus, ProcessingError>
where
    F: Fn(String) -> FutF,
    FutF: Future<Output = Result<QueryStatus, ProcessingError>>,
    G: Fn(Duration) -> FutG,
    FutG: Future<Output = ()>,
{
    loop {
        let status = fetch_status_fn(run_id.to_string()).await?;
        if status.is_terminal() {
            return Ok(status);
        }
        event!(Level::INFO, "Query {} is {:?}, polling again.", run_id, status);
        sleep_fn(POLL_INTERVAL).await;
    }
}

/// Submits one statement and blocks until the run is terminal. A run that
/// never gets an id, fails or is cancelled is an error.
pub async fn execute_query<S, FutS, F, FutF, G, FutG>(
    statement: &Statement,
    submit_fn: S,
    fetch_status_fn: F,
    sleep_fn: G,
) -> Result<QueryRun, ProcessingError>
where
    S: Fn(String) -> FutS,
    FutS: Future<Output = Result<Option<String>, ProcessingError>>,
    F: Fn(String) -> FutF,
    FutF: Future<Output = Result<QueryStatus, ProcessingError>>,
    G: Fn(Duration) -> FutG,
    FutG: Future<Output = ()>,
{
    let query_text = statement.render();
    let run_id = match submit_fn(query_text).await? {
        Some(run_id) if !run_id.is_empty() => run_id,
        _ => {
            return Err(ProcessingError::QuerySubmissionFailure(format!(
                "Query engine returned no run id for statement: {}",
                statement.shape()
            )))
        }
    };
    event!(
        Level::INFO,
        "Submitted query {} with {} bound values.",
        &run_id,
        statement.values().len()
    );
    match await_terminal_status(&run_id, fetch_status_fn, sleep_fn).await? {
        QueryStatus::Succeeded => {
            event!(Level::INFO, "Query SUCCEEDED: {}", &run_id);
            Ok(QueryRun {
                id: run_id,
                status: QueryStatus::Succeeded,
            })
        }
        QueryStatus::Failed(reason) => Err(ProcessingError::QueryFailed(format!(
            "Query {} failed with status: FAILED\n{}",
            run_id,
            reason.unwrap_or_default()
        ))),
        status => Err(ProcessingError::QueryFailed(format!(
            "Query {} failed with status: {:?}",
            run_id, status
        ))),
    }
}

/// Runs statements against the query engine over the wire.
pub async fn run_statement_remotely(
    statement: Statement,
    target: &QueryTarget,
    client: &aws_sdk_athena::Client,
) -> Result<QueryRun, ProcessingError> {
    let submit_fn = |query_text: String| async move {
        remote::start_query_execution(&query_text, target, client).await
    };
    let fetch_status_fn =
        |run_id: String| async move { remote::fetch_query_status(&run_id, client).await };
    let sleep_fn = |duration: Duration| tokio::time::sleep(duration);
    execute_query(&statement, submit_fn, fetch_status_fn, sleep_fn).await
}
