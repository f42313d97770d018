use super::{ProcessingError, QueryStatus, QueryTarget};
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};

pub async fn start_query_execution(
    query_text: &str,
    target: &QueryTarget,
    client: &aws_sdk_athena::Client,
) -> Result<Option<String>, ProcessingError> {
    let result_future = client
        .start_query_execution()
        .query_string(query_text)
        .query_execution_context(
            QueryExecutionContext::builder()
                .database(&target.database)
                .build(),
        )
        .result_configuration(
            ResultConfiguration::builder()
                .output_location(&target.output_location)
                .build(),
        )
        .send();
    match result_future.await {
        Ok(response) => Ok(response.query_execution_id().map(String::from)),
        Err(error) => Err(ProcessingError::QuerySubmissionFailure(format!(
            "Failed to start query execution.\n{:?}",
            error
        ))),
    }
}

pub async fn fetch_query_status(
    run_id: &str,
    client: &aws_sdk_athena::Client,
) -> Result<QueryStatus, ProcessingError> {
    let response_future = client
        .get_query_execution()
        .query_execution_id(run_id)
        .send();
    let response = response_future.await.map_err(|error| {
        ProcessingError::QueryStatusFetchFailure(format!(
            "Failed to fetch status of query {}.\n{:?}",
            run_id, error
        ))
    })?;
    let status = response
        .query_execution()
        .and_then(|execution| execution.status());
    match status.and_then(|status| status.state()) {
        Some(QueryExecutionState::Queued) => Ok(QueryStatus::Queued),
        Some(QueryExecutionState::Running) => Ok(QueryStatus::Running),
        Some(QueryExecutionState::Succeeded) => Ok(QueryStatus::Succeeded),
        Some(QueryExecutionState::Cancelled) => Ok(QueryStatus::Cancelled),
        Some(QueryExecutionState::Failed) => Ok(QueryStatus::Failed(
            status
                .and_then(|status| status.state_change_reason())
                .map(String::from),
        )),
        other => Err(ProcessingError::QueryStatusFetchFailure(format!(
            "Unrecognized state for query {}: {:?}",
            run_id, other
        ))),
    }
}
