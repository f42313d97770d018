use crate::entities::{DocumentLocation, TableProcessedNotice};
use aws_lambda_events::event::s3::S3Event;
use aws_lambda_events::event::sns::SnsEvent;
use regex::Regex;
use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::form_urlencoded;

#[derive(Debug)]
pub enum EventProcessingError {
    EventValidationError(String),
    MessageFormatError(String),
}

/// Status payload returned by every handler.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn new<T: Into<String>>(status_code: u16, body: T) -> HandlerResponse {
        HandlerResponse {
            status_code,
            body: body.into(),
        }
    }
}

/// Keys in storage notifications arrive form-urlencoded.
pub fn decode_object_key(key: &str) -> String {
    match form_urlencoded::parse(key.as_bytes()).next() {
        Some((decoded, _)) => decoded.into_owned(),
        None => String::from(key),
    }
}

pub fn extract_document_location(event: &S3Event) -> Result<DocumentLocation, EventProcessingError> {
    let record = event.records.first().ok_or_else(|| {
        EventProcessingError::EventValidationError(String::from("S3 event carries no records."))
    })?;
    let bucket = record.s3.bucket.name.as_deref().unwrap_or_default();
    let key = record.s3.object.key.as_deref().unwrap_or_default();
    if bucket.is_empty() || key.is_empty() {
        return Err(EventProcessingError::EventValidationError(String::from(
            "S3 event record is missing the bucket name or object key.",
        )));
    }
    Ok(DocumentLocation {
        bucket: bucket.to_string(),
        key: decode_object_key(key),
    })
}

pub fn extract_sns_message(event: &SnsEvent) -> Result<String, EventProcessingError> {
    match event.records.first() {
        Some(record) => Ok(record.sns.message.to_string()),
        None => Err(EventProcessingError::EventValidationError(String::from(
            "SNS event carries no records.",
        ))),
    }
}

pub fn parse_table_processed_notice(
    message: &str,
) -> Result<TableProcessedNotice, EventProcessingError> {
    let pattern = Regex::new(r"^(.*?) table processed: (.*?) in (.*?)$").map_err(|e| {
        EventProcessingError::MessageFormatError(format!("Invalid notice pattern:\n{:?}", e))
    })?;
    let captures = pattern.captures(message.trim()).ok_or_else(|| {
        EventProcessingError::MessageFormatError(String::from(
            "Unable to extract message components from SNS message.",
        ))
    })?;
    let group = |i: usize| {
        captures
            .get(i)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };
    Ok(TableProcessedNotice {
        source_system_name: group(1),
        table_name: group(2),
        environment: group(3),
    })
}

/// Time left before `deadline_ms` (milliseconds since the epoch).
pub fn remaining_until(deadline_ms: u64) -> Duration {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);
    Duration::from_millis(deadline_ms.saturating_sub(now_ms))
}
