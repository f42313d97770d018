
use crate::entities::{
    ActiveTableConfig, GlobalActiveTableConfig, GlobalIngestionConfig, IngestionConfig, Scalar,
    TableConfig,
};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedGlobalIngestion {
    pub truncate_table_flag: String,
    pub drop_table_flag: String,
    pub soft_rule_template_name: String,
    pub target_database: String,
    pub source_file_bucket: String,
    pub target_s3_location: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedGlobalActiveTable {
    pub src_system_name: String,
    pub tgt_database_name: String,
    pub src_database_name: String,
    pub contract_sync_flag: String,
    pub job_template_name: String,
    pub ignore_column: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub table_name: String,
    pub ingestion_config: ResolvedIngestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_table_config: Option<ResolvedActiveTable>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedIngestion {
    pub source_file_location: String,
    pub source_file_name_wild_card: String,
    pub source_file_column_names: Vec<String>,
    pub source_file_unique_key_cols: String,
    pub load_frequency: String,
    pub partition_columns: String,
    pub worker_type: String,
    pub worker_num: String,
    pub source_file_date_format: String,
    pub source_file_type: String,
    pub source_file_extension: String,
    pub source_file_delimiter: String,
    pub source_file_header_row_exist: String,
    pub source_file_header_file_exist: String,
    pub enabled_flag: String,
    pub job_template_name: Option<String>,
    pub source_file_control_footer_exist: Option<String>,
    pub control_file_ind: Option<String>,
    pub control_file_header_row_exist: Option<String>,
    pub control_file_columns_names: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResolvedActiveTable {
    pub tgt_table_name: String,
    pub src_table_name: String,
    pub group_number: String,
    pub incremental_column_name: String,
    pub change_audit_flag: String,
    pub soft_rule_template_name: String,
    pub key_cols: String,
    pub order_cols: String,
    pub filter_condition: String,
    pub sort_order: String,
    pub order_cols_1: String,
    pub order_cols_2: String,
    pub worker_type: String,
    pub worker_num: String,
}

fn or_default(value: &Option<Scalar>, default: &str) -> String {
    match value {
        Some(scalar) => scalar.as_str().to_string(),
        None => default.to_string(),
    }
}

fn text(value: &Scalar) -> String {
    value.as_str().to_string()
}

fn optional_text(value: &Option<Scalar>) -> Option<String> {
    value.as_ref().map(text)
}

pub fn resolve_global_ingestion(config: &GlobalIngestionConfig) -> ResolvedGlobalIngestion {
    ResolvedGlobalIngestion {
        truncate_table_flag: or_default(&config.truncate_table_flag, "Y"),
        drop_table_flag: or_default(&config.drop_table_flag, "N"),
        // not consumed downstream yet, carried through as empty
        soft_rule_template_name: or_default(&config.soft_rule_template_name, ""),
        target_database: or_default(&config.target_database, "changeaudit"),
        source_file_bucket: or_default(&config.source_file_bucket, ""),
        target_s3_location: optional_text(&config.target_s3_location),
    }
}

pub fn resolve_global_active_table(
    config: &GlobalActiveTableConfig,
    source_name: &str,
) -> ResolvedGlobalActiveTable {
    ResolvedGlobalActiveTable {
        src_system_name: or_default(&config.src_system_name, source_name),
        tgt_database_name: or_default(&config.tgt_database_name, &format!("{}_main", source_name)),
        src_database_name: or_default(&config.src_database_name, "changeaudit"),
        contract_sync_flag: or_default(&config.contract_sync_flag, "Y"),
        job_template_name: text(&config.job_template_name),
        ignore_column: config.ignore_column.clone(),
    }
}

pub fn resolve_table(table: &TableConfig) -> ResolvedTable {
    ResolvedTable {
        table_name: table.table_name.to_string(),
        ingestion_config: _resolve_ingestion(&table.ingestion_config),
        active_table_config: table
            .active_table_config
            .as_ref()
            .map(|active| _resolve_active_table(active, &table.table_name)),
    }
}

fn _resolve_ingestion(config: &IngestionConfig) -> ResolvedIngestion {
    ResolvedIngestion {
        source_file_location: config.source_file_location.to_string(),
        source_file_name_wild_card: text(&config.source_file_name_wild_card),
        source_file_column_names: config.source_file_column_names.clone(),
        source_file_unique_key_cols: text(&config.source_file_unique_key_cols),
        load_frequency: text(&config.load_frequency),
        partition_columns: text(&config.partition_columns),
        worker_type: text(&config.worker_type),
        worker_num: text(&config.worker_num),
        source_file_date_format: or_default(&config.source_file_date_format, "YYYYMMDD"),
        source_file_type: or_default(&config.source_file_type, "csv"),
        source_file_extension: or_default(&config.source_file_extension, ".csv"),
        source_file_delimiter: or_default(&config.source_file_delimiter, ";"),
        source_file_header_row_exist: or_default(&config.source_file_header_row_exist, "true"),
        source_file_header_file_exist: or_default(&config.source_file_header_file_exist, "N"),
        enabled_flag: or_default(&config.enabled_flag, "Y"),
        job_template_name: optional_text(&config.job_template_name),
        source_file_control_footer_exist: optional_text(&config.source_file_control_footer_exist),
        control_file_ind: optional_text(&config.control_file_ind),
        control_file_header_row_exist: optional_text(&config.control_file_header_row_exist),
        control_file_columns_names: optional_text(&config.control_file_columns_names),
    }
}

fn _resolve_active_table(config: &ActiveTableConfig, table_name: &str) -> ResolvedActiveTable {
    ResolvedActiveTable {
        tgt_table_name: or_default(&config.tgt_table_name, &format!("a_{}", table_name)),
        src_table_name: or_default(&config.src_table_name, table_name),
        group_number: or_default(&config.group_number, "1"),
        incremental_column_name: or_default(&config.incremental_column_name, ""),
        change_audit_flag: or_default(&config.change_audit_flag, "N"),
        soft_rule_template_name: text(&config.soft_rule_template_name),
        key_cols: text(&config.key_cols),
        order_cols: text(&config.order_cols),
        filter_condition: text(&config.filter_condition),
        sort_order: text(&config.sort_order),
        order_cols_1: text(&config.order_cols_1),
        order_cols_2: text(&config.order_cols_2),
        worker_type: text(&config.worker_type),
        worker_num: text(&config.worker_num),
    }
}
