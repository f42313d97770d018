use super::{ActivationError, ActivationRequest};

pub async fn start_execution(
    request: &ActivationRequest,
    client: &aws_sdk_sfn::Client,
) -> Result<String, ActivationError> {
    let result_future = client
        .start_execution()
        .state_machine_arn(&request.state_machine_arn)
        .name(&request.execution_name)
        .input(&request.input)
        .send();
    match result_future.await {
        Ok(response) => Ok(response.execution_arn().to_string()),
        Err(error) => Err(ActivationError::StartExecutionError(format!(
            "Failed to start execution of {}.\n{:?}",
            &request.state_machine_arn, error
        ))),
    }
}
