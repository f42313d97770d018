
use super::querying::QueryRun;
use super::sql::Statement;
use super::statements::StatementSet;
use super::ProcessingError;
use std::future::Future;
use tracing::{event, Level};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopulationStage {
    Started,
    Deleting,
    InsertingGeneric,
    InsertingActive,
    Done,
    Failed,
}

impl PopulationStage {
    fn next(self) -> PopulationStage {
        match self {
            PopulationStage::Started => PopulationStage::Deleting,
            PopulationStage::Deleting => PopulationStage::InsertingGeneric,
            PopulationStage::InsertingGeneric => PopulationStage::InsertingActive,
            PopulationStage::InsertingActive => PopulationStage::Done,
            PopulationStage::Done => PopulationStage::Done,
            PopulationStage::Failed => PopulationStage::Failed,
        }
    }
}

/// Stages passed through and the runs executed on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationReport {
    pub stages: Vec<PopulationStage>,
    pub delete_runs: Vec<QueryRun>,
    pub generic_insert_run: Option<QueryRun>,
    pub active_insert_run: Option<QueryRun>,
}

impl PopulationReport {
    fn new() -> PopulationReport {
        PopulationReport {
            stages: vec![PopulationStage::Started],
            delete_runs: vec![],
            generic_insert_run: None,
            active_insert_run: None,
        }
    }

    fn stage(&self) -> PopulationStage {
        *self.stages.last().unwrap_or(&PopulationStage::Started)
    }

    fn advance(&mut self) -> PopulationStage {
        let next = self.stage().next();
        event!(Level::INFO, "Population stage {:?} -> {:?}.", self.stage(), next);
        self.stages.push(next);
        next
    }
}

async fn _run_step<F, FutF>(
    statement: Statement,
    stage: PopulationStage,
    run_query_fn: &F,
) -> Result<QueryRun, ProcessingError>
where
    F: Fn(Statement) -> FutF,
    FutF: Future<Output = Result<QueryRun, ProcessingError>>,
{
    run_query_fn(statement).await.map_err(|e| {
        event!(
            Level::ERROR,
            "Population stage {:?} -> {:?}: {:?}",
            stage,
            PopulationStage::Failed,
            e
        );
        ProcessingError::StageFailed(format!("{:?}: {:?}", stage, e))
    })
}

/// Deletes first, then the generic file load insert, then the active table
/// insert. Each statement completes before the next starts and the first
/// failure aborts the rest. Empty steps pass straight through.
pub async fn run_statement_set<F, FutF>(
    statement_set: &StatementSet,
    run_query_fn: F,
) -> Result<PopulationReport, ProcessingError>
where
    F: Fn(Statement) -> FutF,
    FutF: Future<Output = Result<QueryRun, ProcessingError>>,
{
    let mut report = PopulationReport::new();

    let stage = report.advance();
    for statement in &statement_set.delete_statements {
        let query_run = _run_step(statement.clone(), stage, &run_query_fn).await?;
        event!(Level::INFO, "DELETE statement completed successfully: {}", statement.shape());
        report.delete_runs.push(query_run);
    }

    let stage = report.advance();
    if let Some(insert) = statement_set.generic_file_load_insert() {
        let query_run = _run_step(insert, stage, &run_query_fn).await?;
        event!(Level::INFO, "Generic file load INSERT completed successfully.");
        report.generic_insert_run = Some(query_run);
    }

    let stage = report.advance();
    if let Some(insert) = statement_set.active_table_insert() {
        let query_run = _run_step(insert, stage, &run_query_fn).await?;
        event!(Level::INFO, "Active table INSERT completed successfully.");
        report.active_insert_run = Some(query_run);
    }

    report.advance();
    Ok(report)
}
