
use super::ProcessingError;
use std::future::Future;
use std::time::Duration;
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_wait: Duration,
    /// Below this much remaining execution time no attempt is started.
    pub timeout_margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_wait: Duration::from_secs(10),
            timeout_margin: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Wait before the retry that follows `failed_attempts` failures.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        self.base_wait * 2u32.saturating_pow(failed_attempts)
    }
}

#[derive(Debug, PartialEq)]
pub enum GuardOutcome<T> {
    Completed { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: String },
}

/// Runs `attempt_fn` from scratch until it succeeds or the attempts run out.
/// Exhaustion is reported through `notify_fn` and returned as an outcome;
/// a timeout risk is reported and returned as an error without retrying.
pub async fn run_guarded<T, A, FutA, S, FutS, R, N, FutN>(
    policy: &RetryPolicy,
    attempt_fn: A,
    sleep_fn: S,
    remaining_time_fn: R,
    notify_fn: N,
) -> Result<GuardOutcome<T>, ProcessingError>
where
    A: Fn(u32) -> FutA,
    FutA: Future<Output = Result<T, ProcessingError>>,
    S: Fn(Duration) -> FutS,
    FutS: Future<Output = ()>,
    R: Fn() -> Duration,
    N: Fn(String) -> FutN,
    FutN: Future<Output = ()>,
{
    let mut failed_attempts = 0;
    loop {
        let remaining = remaining_time_fn();
        if remaining < policy.timeout_margin {
            let mssg = format!(
                "Approaching timeout. Remaining time: {}ms.",
                remaining.as_millis()
            );
            event!(Level::WARN, "{}", mssg);
            notify_fn(String::from(
                "Lambda function is approaching its timeout limit.",
            ))
            .await;
            return Err(ProcessingError::TimeoutRisk(mssg));
        }
        match attempt_fn(failed_attempts + 1).await {
            Ok(value) => {
                return Ok(GuardOutcome::Completed {
                    value,
                    attempts: failed_attempts + 1,
                })
            }
            Err(error) => {
                failed_attempts += 1;
                event!(Level::ERROR, "Error during processing: {:?}", error);
                if failed_attempts < policy.max_attempts {
                    let wait = policy.backoff(failed_attempts);
                    event!(
                        Level::INFO,
                        "Retrying {}/{} after waiting {} seconds...",
                        failed_attempts,
                        policy.max_attempts,
                        wait.as_secs()
                    );
                    sleep_fn(wait).await;
                } else {
                    event!(Level::ERROR, "Max retries reached. Processing failed.");
                    let last_error = format!("{:?}", error);
                    notify_fn(format!(
                        "Processing failed after {} attempts.\n{}",
                        failed_attempts, last_error
                    ))
                    .await;
                    return Ok(GuardOutcome::Exhausted {
                        attempts: failed_attempts,
                        last_error,
                    });
                }
            }
        }
    }
}
