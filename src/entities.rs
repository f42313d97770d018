use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A config value that may arrive as a JSON string, number or boolean.
/// All three are carried as text.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(from = "RawScalar", into = "String")]
pub struct Scalar(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl From<RawScalar> for Scalar {
    fn from(raw: RawScalar) -> Self {
        match raw {
            RawScalar::Text(text) => Scalar(text),
            RawScalar::Number(number) => Scalar(number.to_string()),
            RawScalar::Flag(flag) => Scalar(flag.to_string()),
        }
    }
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        scalar.0
    }
}

impl Scalar {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    pub source_name: String,
    pub environments: HashMap<String, EnvironmentConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub global_ingestion_config: GlobalIngestionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_active_table_config: Option<GlobalActiveTableConfig>,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct GlobalIngestionConfig {
    pub truncate_table_flag: Option<Scalar>,
    pub drop_table_flag: Option<Scalar>,
    pub soft_rule_template_name: Option<Scalar>,
    pub target_database: Option<Scalar>,
    pub source_file_bucket: Option<Scalar>,
    pub target_s3_location: Option<Scalar>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GlobalActiveTableConfig {
    pub src_system_name: Option<Scalar>,
    pub tgt_database_name: Option<Scalar>,
    pub src_database_name: Option<Scalar>,
    pub contract_sync_flag: Option<Scalar>,
    pub job_template_name: Scalar,
    #[serde(default)]
    pub ignore_column: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub table_name: String,
    pub ingestion_config: IngestionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_table_config: Option<ActiveTableConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct IngestionConfig {
    pub source_file_location: String,
    pub source_file_name_wild_card: Scalar,
    #[serde(default)]
    pub source_file_column_names: Vec<String>,
    pub source_file_unique_key_cols: Scalar,
    pub load_frequency: Scalar,
    pub partition_columns: Scalar,
    pub worker_type: Scalar,
    pub worker_num: Scalar,
    pub source_file_date_format: Option<Scalar>,
    pub source_file_type: Option<Scalar>,
    pub source_file_extension: Option<Scalar>,
    pub source_file_delimiter: Option<Scalar>,
    pub source_file_header_row_exist: Option<Scalar>,
    pub source_file_header_file_exist: Option<Scalar>,
    pub enabled_flag: Option<Scalar>,
    pub job_template_name: Option<Scalar>,
    pub source_file_control_footer_exist: Option<Scalar>,
    pub control_file_ind: Option<Scalar>,
    pub control_file_header_row_exist: Option<Scalar>,
    pub control_file_columns_names: Option<Scalar>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ActiveTableConfig {
    pub tgt_table_name: Option<Scalar>,
    pub src_table_name: Option<Scalar>,
    pub group_number: Option<Scalar>,
    pub incremental_column_name: Option<Scalar>,
    pub change_audit_flag: Option<Scalar>,
    pub soft_rule_template_name: Scalar,
    pub key_cols: Scalar,
    pub order_cols: Scalar,
    pub filter_condition: Scalar,
    pub sort_order: Scalar,
    pub order_cols_1: Scalar,
    pub order_cols_2: Scalar,
    pub worker_type: Scalar,
    pub worker_num: Scalar,
}

/// Payload of the `<source> table processed: <table> in <env>` notification
/// raised by the ingestion job.
#[derive(Debug, Clone, PartialEq)]
pub struct TableProcessedNotice {
    pub source_system_name: String,
    pub table_name: String,
    pub environment: String,
}

/// Location of a configuration document that landed in object storage.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLocation {
    pub bucket: String,
    pub key: String,
}
