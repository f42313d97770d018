#[cfg(test)]
mod test_statements;

use super::defaults::{
    resolve_global_active_table, resolve_global_ingestion, resolve_table, ResolvedGlobalActiveTable,
    ResolvedGlobalIngestion, ResolvedTable,
};
use super::sql::{SelectRow, SqlValue, Statement};
use super::ProcessingError;
use crate::config::{DeploymentEnvironment, CONTROL_DATABASE};
use crate::entities::EnvironmentConfig;
use time::macros::{format_description, offset};
use time::OffsetDateTime;
use tracing::{event, Level};

pub const GENERIC_FILE_LOADS_TABLE: &str = "edp_generic_file_loads";
pub const ACTIVE_TABLE_CONFIG_TABLE: &str = "active_table_job_config_attributes_iceberg";

const EXTERNAL_STORAGE_SCHEME: &str = "s3://";
const ACTIVE_LOCATION_TEMPLATE: &str = "s3://ct-ire-edp-${env-name}-${system-area}/${db_prefix}/${source_system_name}/${tgt_database_name}/${tgt_table_name}/";

pub fn qualified(table: &str) -> String {
    format!("{}.{}", CONTROL_DATABASE, table)
}

pub struct SynthesisContext<'a> {
    pub source_name: &'a str,
    pub environment: &'a DeploymentEnvironment,
    pub inserted_at: OffsetDateTime,
}

/// Statements for one environment of one configuration document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StatementSet {
    pub delete_statements: Vec<Statement>,
    pub generic_file_load_rows: Vec<Statement>,
    pub active_table_rows: Vec<Statement>,
    pub active_table_config_present: bool,
}

impl StatementSet {
    pub fn generic_file_load_insert(&self) -> Option<Statement> {
        Statement::insert_union_all(
            &qualified(GENERIC_FILE_LOADS_TABLE),
            &self.generic_file_load_rows,
        )
    }

    pub fn active_table_insert(&self) -> Option<Statement> {
        if !self.active_table_config_present {
            return None;
        }
        Statement::insert_union_all(&qualified(ACTIVE_TABLE_CONFIG_TABLE), &self.active_table_rows)
    }
}

pub fn synthesize_statements(
    env_config: &EnvironmentConfig,
    context: &SynthesisContext,
) -> Result<StatementSet, ProcessingError> {
    let global_ingestion = resolve_global_ingestion(&env_config.global_ingestion_config);
    let has_active_blocks = env_config
        .tables
        .iter()
        .any(|table| table.active_table_config.is_some());
    let global_active_table = match (&env_config.global_active_table_config, has_active_blocks) {
        (Some(global), true) => Some(resolve_global_active_table(global, context.source_name)),
        (None, true) => {
            return Err(ProcessingError::MalformedDocument(String::from(
                "Tables define active_table_config but global_active_table_config is missing.",
            )))
        }
        (_, false) => None,
    };
    let insert_datetime = _format_insert_datetime(context.inserted_at)?;

    let mut statement_set = StatementSet {
        active_table_config_present: global_active_table.is_some(),
        ..StatementSet::default()
    };
    statement_set.delete_statements.push(Statement::delete_where(
        &qualified(GENERIC_FILE_LOADS_TABLE),
        "source_system_name",
        SqlValue::text(context.source_name),
    ));
    if global_active_table.is_some() {
        statement_set.delete_statements.push(Statement::delete_where(
            &qualified(ACTIVE_TABLE_CONFIG_TABLE),
            "src_system_name",
            SqlValue::text(context.source_name),
        ));
    }

    for table in &env_config.tables {
        let table = resolve_table(table);
        statement_set.generic_file_load_rows.push(_generic_file_load_row(
            &table,
            &global_ingestion,
            context,
            &insert_datetime,
        )?);
        if let (Some(_), Some(global_active_table)) =
            (&table.active_table_config, &global_active_table)
        {
            statement_set.active_table_rows.push(_active_table_row(
                &table,
                &global_ingestion,
                global_active_table,
                context,
            )?);
        }
    }
    event!(
        Level::INFO,
        "Synthesized {} delete statements, {} generic file load rows and {} active table rows for {}.",
        statement_set.delete_statements.len(),
        statement_set.generic_file_load_rows.len(),
        statement_set.active_table_rows.len(),
        context.source_name
    );
    Ok(statement_set)
}

/// Full source path: absolute locations are kept, relative ones are joined
/// onto the configured bucket when there is one.
pub fn resolve_source_file_location(location: &str, bucket: &str) -> String {
    if location.starts_with(EXTERNAL_STORAGE_SCHEME) {
        location.to_string()
    } else if !bucket.is_empty() {
        let bucket = bucket
            .trim_start_matches(EXTERNAL_STORAGE_SCHEME)
            .trim_end_matches('/');
        format!(
            "{}{}/{}",
            EXTERNAL_STORAGE_SCHEME,
            bucket,
            location.trim_start_matches('/')
        )
    } else {
        location.to_string()
    }
}

pub fn generic_target_location(
    global_ingestion: &ResolvedGlobalIngestion,
    environment: &DeploymentEnvironment,
    source_name: &str,
    table_name: &str,
) -> String {
    match global_ingestion.target_s3_location.as_deref() {
        Some(custom_bucket) if !custom_bucket.is_empty() => format!(
            "s3://{}/changeaudit/{}/{}",
            custom_bucket, source_name, table_name
        ),
        _ => format!(
            "s3://ct-ire-edp-{}-datastaging-op/changeaudit/{}/{}",
            environment.changeaudit_tag(),
            source_name,
            table_name
        ),
    }
}

/// The `${...}` markers are resolved by the active-table workflow itself.
pub fn active_target_location(global_ingestion: &ResolvedGlobalIngestion) -> String {
    match global_ingestion.target_s3_location.as_deref() {
        Some(custom_bucket) if !custom_bucket.is_empty() => format!(
            "s3://{}/active/${{source_system_name}}/${{tgt_database_name}}/${{tgt_table_name}}/",
            custom_bucket
        ),
        _ => ACTIVE_LOCATION_TEMPLATE.to_string(),
    }
}

fn _format_insert_datetime(inserted_at: OffsetDateTime) -> Result<String, ProcessingError> {
    // SAST, no daylight saving
    inserted_at
        .to_offset(offset!(+2))
        .format(format_description!("[year]-[month]-[day]-[hour]-[minute]"))
        .map_err(|e| {
            ProcessingError::StatementSynthesisFailure(format!(
                "Failed to format insert datetime:\n{:?}",
                e
            ))
        })
}

fn _parse_worker_num(worker_num: &str, table_name: &str) -> Result<SqlValue, ProcessingError> {
    worker_num
        .trim()
        .parse::<i64>()
        .map(SqlValue::Integer)
        .map_err(|_| {
            ProcessingError::MalformedDocument(format!(
                "worker_num for table {} is not an integer: {}",
                table_name, worker_num
            ))
        })
}

fn _generic_file_load_row(
    table: &ResolvedTable,
    global_ingestion: &ResolvedGlobalIngestion,
    context: &SynthesisContext,
    insert_datetime: &str,
) -> Result<Statement, ProcessingError> {
    let ingestion = &table.ingestion_config;
    let source_name = context.source_name;
    let column_names = ingestion
        .source_file_column_names
        .first()
        .cloned()
        .unwrap_or_default();
    Ok(SelectRow::new()
        .text("source_file_name_pk", &table.table_name)
        .text("source_system_name", source_name)
        .text("source_file_type", &ingestion.source_file_type)
        .text(
            "source_file_location",
            resolve_source_file_location(
                &ingestion.source_file_location,
                &global_ingestion.source_file_bucket,
            ),
        )
        .text("source_file_name_wild_card", &ingestion.source_file_name_wild_card)
        .text("source_file_date_format", &ingestion.source_file_date_format)
        .text("source_file_extension", &ingestion.source_file_extension)
        .text("source_file_delimiter", &ingestion.source_file_delimiter)
        .text("source_file_header_row_exist", &ingestion.source_file_header_row_exist)
        .text("source_file_header_file_exist", &ingestion.source_file_header_file_exist)
        .text("source_file_column_names", column_names)
        .text("source_file_unique_key_cols", &ingestion.source_file_unique_key_cols)
        .text("load_frequency", &ingestion.load_frequency)
        .text("target_database", &global_ingestion.target_database)
        .text(
            "target_table_name",
            format!("{}_{}", source_name, table.table_name),
        )
        .text(
            "target_s3_location",
            generic_target_location(
                global_ingestion,
                context.environment,
                source_name,
                &table.table_name,
            ),
        )
        .text("truncate_table_flag", &global_ingestion.truncate_table_flag)
        .text("drop_table_flag", &global_ingestion.drop_table_flag)
        .text("enabled_flag", &ingestion.enabled_flag)
        .text("partition_columns", &ingestion.partition_columns)
        .text(
            "job_template_name",
            ingestion.job_template_name.as_deref().unwrap_or(" "),
        )
        .text(
            "soft_rule_template_name",
            &global_ingestion.soft_rule_template_name,
        )
        .text(
            "source_file_control_footer_exist",
            ingestion
                .source_file_control_footer_exist
                .as_deref()
                .unwrap_or(""),
        )
        .text("environment", context.environment.name())
        .text(
            "control_file_ind",
            ingestion.control_file_ind.as_deref().unwrap_or("N"),
        )
        .text("insert_datetime", insert_datetime)
        .text("worker_type", &ingestion.worker_type)
        .column(
            "worker_num",
            _parse_worker_num(&ingestion.worker_num, &table.table_name)?,
        )
        .column(
            "control_file_header_row_exist",
            SqlValue::nullable_text(ingestion.control_file_header_row_exist.as_deref()),
        )
        .column(
            "control_file_columns_names",
            SqlValue::nullable_text(ingestion.control_file_columns_names.as_deref()),
        )
        .build())
}

fn _active_table_row(
    table: &ResolvedTable,
    global_ingestion: &ResolvedGlobalIngestion,
    global_active_table: &ResolvedGlobalActiveTable,
    context: &SynthesisContext,
) -> Result<Statement, ProcessingError> {
    let active = match &table.active_table_config {
        Some(active) => active,
        None => {
            return Err(ProcessingError::StatementSynthesisFailure(format!(
                "Table {} has no active table config.",
                table.table_name
            )))
        }
    };
    Ok(SelectRow::new()
        .text("src_system_name", &global_active_table.src_system_name)
        .text("tgt_table_name", &active.tgt_table_name)
        .text("tgt_database_name", &global_active_table.tgt_database_name)
        .text("tgt_location", active_target_location(global_ingestion))
        .text("soft_rule_template_name", &active.soft_rule_template_name)
        .text("src_database_name", &global_active_table.src_database_name)
        .text(
            "src_table_name",
            format!("{}_{}", context.source_name, active.src_table_name),
        )
        .text("key_cols", &active.key_cols)
        .text("order_cols", &active.order_cols)
        .text("filter_condition", &active.filter_condition)
        .text("sort_order", &active.sort_order)
        .text("job_template_name", &global_active_table.job_template_name)
        .text("group_number", &active.group_number)
        .text("change_audit_flag", &active.change_audit_flag)
        .text("ignore_column", global_active_table.ignore_column.join(", "))
        .text("enabled_flag", &table.ingestion_config.enabled_flag)
        .text("contract_sync_flag", &global_active_table.contract_sync_flag)
        .text("incremental_column_name", &active.incremental_column_name)
        .text("order_cols_1", &active.order_cols_1)
        .text("order_cols_2", &active.order_cols_2)
        .text("worker_type", &active.worker_type)
        .column(
            "worker_num",
            _parse_worker_num(&active.worker_num, &table.table_name)?,
        )
        .build())
}
