use super::*;
use crate::population::sql::{SqlValue, Statement};
use std::cell::RefCell;
use tokio_test::{assert_err, assert_ok};

fn delete_statement() -> Statement {
    Statement::delete_where("data_control.t", "source_system_name", SqlValue::text("crm"))
}

#[tokio::test]
async fn execute_query_test_polls_until_succeeded() {
    let run_id = format!("run{}", rand::random::<u32>());
    let submitted = RefCell::new(vec![]);
    let statuses = RefCell::new(vec![
        QueryStatus::Succeeded,
        QueryStatus::Running,
        QueryStatus::Queued,
    ]);
    let sleeps = RefCell::new(vec![]);
    let submit_fn = |query_text: String| {
        submitted.borrow_mut().push(query_text);
        let run_id = run_id.clone();
        async move { Ok(Some(run_id)) }
    };
    let fetch_status_fn = |id: String| {
        assert_eq!(id, run_id);
        let status = statuses.borrow_mut().pop().unwrap();
        async move { Ok(status) }
    };
    let sleep_fn = |duration: Duration| {
        sleeps.borrow_mut().push(duration);
        async {}
    };
    let result = execute_query(&delete_statement(), submit_fn, fetch_status_fn, sleep_fn).await;
    let query_run = assert_ok!(result);
    assert_eq!(query_run.id, run_id);
    assert_eq!(query_run.status, QueryStatus::Succeeded);
    assert_eq!(
        submitted.borrow().as_slice(),
        &["DELETE FROM data_control.t WHERE source_system_name = 'crm';".to_string()]
    );
    assert_eq!(sleeps.borrow().as_slice(), &[POLL_INTERVAL, POLL_INTERVAL]);
}

#[tokio::test]
async fn execute_query_test_missing_run_id() {
    let polled = RefCell::new(false);
    let submit_fn = |_query_text: String| async { Ok(None) };
    let fetch_status_fn = |_id: String| {
        *polled.borrow_mut() = true;
        async { Ok(QueryStatus::Succeeded) }
    };
    let result = execute_query(&delete_statement(), submit_fn, fetch_status_fn, |_| async {}).await;
    match assert_err!(result) {
        ProcessingError::QuerySubmissionFailure(_) => {}
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!*polled.borrow());
}

#[tokio::test]
async fn execute_query_test_failed_run_is_an_error() {
    let submit_fn = |_query_text: String| async { Ok(Some(String::from("run-1"))) };
    let fetch_status_fn = |_id: String| async {
        Ok(QueryStatus::Failed(Some(String::from("TABLE_NOT_FOUND"))))
    };
    let result = execute_query(&delete_statement(), submit_fn, fetch_status_fn, |_| async {}).await;
    match assert_err!(result) {
        ProcessingError::QueryFailed(message) => {
            assert!(message.contains("run-1"));
            assert!(message.contains("TABLE_NOT_FOUND"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn execute_query_test_cancelled_run_is_an_error() {
    let submit_fn = |_query_text: String| async { Ok(Some(String::from("run-2"))) };
    let fetch_status_fn = |_id: String| async { Ok(QueryStatus::Cancelled) };
    let result = execute_query(&delete_statement(), submit_fn, fetch_status_fn, |_| async {}).await;
    assert!(matches!(result, Err(ProcessingError::QueryFailed(_))));
}

#[tokio::test]
async fn execute_query_test_status_fetch_error_propagates() {
    let submit_fn = |_query_text: String| async { Ok(Some(String::from("run-3"))) };
    let fetch_status_fn = |_id: String| async {
        Err(ProcessingError::QueryStatusFetchFailure(String::from("throttled")))
    };
    let result = execute_query(&delete_statement(), submit_fn, fetch_status_fn, |_| async {}).await;
    assert!(matches!(
        result,
        Err(ProcessingError::QueryStatusFetchFailure(_))
    ));
}

#[test]
fn test_terminal_statuses() {
    assert!(QueryStatus::Succeeded.is_terminal());
    assert!(QueryStatus::Failed(None).is_terminal());
    assert!(QueryStatus::Cancelled.is_terminal());
    assert!(!QueryStatus::Queued.is_terminal());
    assert!(!QueryStatus::Running.is_terminal());
}
