use super::ProcessingError;
use crate::entities::DocumentLocation;

pub async fn fetch_document_bytes(
    location: &DocumentLocation,
    client: &aws_sdk_s3::Client,
) -> Result<Vec<u8>, ProcessingError> {
    let response = client
        .get_object()
        .bucket(&location.bucket)
        .key(&location.key)
        .send()
        .await
        .map_err(|e| {
            ProcessingError::DocumentFetchFailure(format!(
                "Failed to read s3://{}/{}:\n{:?}",
                location.bucket, location.key, e
            ))
        })?;
    let body = response.body.collect().await.map_err(|e| {
        ProcessingError::DocumentFetchFailure(format!(
            "Failed to read body of s3://{}/{}:\n{:?}",
            location.bucket, location.key, e
        ))
    })?;
    Ok(body.into_bytes().to_vec())
}
