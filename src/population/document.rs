pub mod remote;

use super::ProcessingError;
use crate::config::DeploymentEnvironment;
use crate::entities::{ConfigDocument, EnvironmentConfig};

pub fn parse_document(content: &[u8]) -> Result<ConfigDocument, ProcessingError> {
    serde_json::from_slice::<ConfigDocument>(content).map_err(|e| {
        ProcessingError::MalformedDocument(format!(
            "Failed to deserialize configuration document:\n{:?}",
            e
        ))
    })
}

pub fn select_environment<'a>(
    document: &'a ConfigDocument,
    environment: &DeploymentEnvironment,
) -> Result<&'a EnvironmentConfig, ProcessingError> {
    document
        .environments
        .get(environment.name())
        .ok_or_else(|| {
            ProcessingError::MalformedDocument(format!(
                "Configuration document for {} has no {} environment.",
                document.source_name,
                environment.name()
            ))
        })
}
