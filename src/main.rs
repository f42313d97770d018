pub mod activation;
pub mod alerting;
pub mod config;
pub mod entities;
pub mod events;
pub mod population;

use activation::activate_active_table;
use alerting::Alerter;
use aws_lambda_events::event::s3::S3Event;
use aws_lambda_events::event::sns::SnsEvent;
use config::{Config, FunctionKind};
use entities::DocumentLocation;
use events::{extract_document_location, extract_sns_message, remaining_until, HandlerResponse};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use population::{populate_config_tables, GuardOutcome};
use reqwest::Client;
use simple_error::simple_error;
use std::future::Future;
use tracing::{event, Level};

async fn _document_location<N, FutN>(payload: &S3Event, notify_fn: N) -> Result<DocumentLocation, Error>
where
    N: Fn(String) -> FutN,
    FutN: Future<Output = ()>,
{
    match extract_document_location(payload) {
        Ok(location) => Ok(location),
        Err(e) => {
            let mssg = format!("{:?}", e);
            event!(Level::ERROR, "{}", &mssg);
            notify_fn(mssg.clone()).await;
            Err(simple_error!(mssg).into())
        }
    }
}

pub async fn populate_handler(
    event: LambdaEvent<S3Event>,
    config: &Config,
    client: &Client,
) -> Result<HandlerResponse, Error> {
    event!(Level::INFO, "The config populator function has started.");
    let alerter = Alerter::new(
        config.alert_webhook_url.clone(),
        &event.context.env_config.function_name,
        client.clone(),
    );
    let notify_fn = |mssg: String| {
        let alerter = &alerter;
        async move { alerter.send_failure_notification(&mssg).await }
    };
    let location = _document_location(&event.payload, notify_fn).await?;
    event!(
        Level::INFO,
        "Bucket name: {}, File key: {}",
        &location.bucket,
        &location.key
    );
    let deadline = event.context.deadline;
    let remaining_time_fn = || remaining_until(deadline);
    let outcome = populate_config_tables(&location, config, &alerter, remaining_time_fn)
        .await
        .map_err(|e| Box::new(simple_error!(format!("{:?}", e))))?;
    match outcome {
        GuardOutcome::Completed { value, attempts } => {
            event!(
                Level::INFO,
                "Processing completed after {} attempt(s): {} deletes, generic insert {}, active insert {}.",
                attempts,
                value.delete_runs.len(),
                value.generic_insert_run.is_some(),
                value.active_insert_run.is_some()
            );
            Ok(HandlerResponse::new(200, "Processing completed successfully."))
        }
        GuardOutcome::Exhausted {
            attempts,
            last_error,
        } => Ok(HandlerResponse::new(
            500,
            format!(
                "Lambda processing failed after {} retries. Error: {}",
                attempts, last_error
            ),
        )),
    }
}

pub async fn activation_handler(
    event: LambdaEvent<SnsEvent>,
    config: &Config,
    client: &Client,
) -> Result<HandlerResponse, Error> {
    let alerter = Alerter::new(
        config.alert_webhook_url.clone(),
        &event.context.env_config.function_name,
        client.clone(),
    );
    let message = match extract_sns_message(&event.payload) {
        Ok(message) => message,
        Err(e) => {
            let mssg = format!("{:?}", e);
            alerter.send_failure_notification(&mssg).await;
            return Err(Box::new(simple_error!(mssg)));
        }
    };
    event!(
        Level::INFO,
        "SNS message received --> {}",
        &message
    );
    Ok(activate_active_table(&message, config, &alerter).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();
    let config = Config::from_env().map_err(|e| Box::new(simple_error!(format!("{:?}", e))))?;
    event!(
        Level::INFO,
        "Running {:?} in the {} environment.",
        config.function_kind,
        config.environment.name()
    );
    let client = Client::new();
    let (config, client) = (&config, &client);
    match config.function_kind {
        FunctionKind::ConfigPopulator => {
            run(service_fn(move |event: LambdaEvent<S3Event>| async move {
                populate_handler(event, config, client).await
            }))
            .await
        }
        FunctionKind::ActiveTableStart => {
            run(service_fn(move |event: LambdaEvent<SnsEvent>| async move {
                activation_handler(event, config, client).await
            }))
            .await
        }
    }
}
