use super::*;
use crate::entities::EnvironmentConfig;
use serde_json::{json, Value};
use time::macros::datetime;

fn ingestion_block(location: &str) -> Value {
    json!({
        "source_file_location": location,
        "source_file_name_wild_card": "extract_*",
        "source_file_column_names": ["id;name;updated_at"],
        "source_file_unique_key_cols": "id",
        "load_frequency": "daily",
        "partition_columns": "load_date",
        "worker_type": "G.1X",
        "worker_num": 2
    })
}

fn active_block() -> Value {
    json!({
        "soft_rule_template_name": "soft_rules",
        "key_cols": "id",
        "order_cols": "updated_at",
        "filter_condition": "status <> 'X'",
        "sort_order": "desc",
        "order_cols_1": "",
        "order_cols_2": "",
        "worker_type": "G.2X",
        "worker_num": "5"
    })
}

fn environment(value: Value) -> EnvironmentConfig {
    serde_json::from_value(value).unwrap()
}

fn context(environment: &DeploymentEnvironment) -> SynthesisContext<'_> {
    SynthesisContext {
        source_name: "crm",
        environment,
        inserted_at: datetime!(2024-01-15 22:30 UTC),
    }
}

fn value_of(statement: &Statement, column: &str) -> SqlValue {
    let projections: Vec<&str> = statement
        .shape()
        .trim_start_matches("SELECT ")
        .split(", ")
        .collect();
    let position = projections
        .iter()
        .position(|projection| *projection == format!("? AS {}", column))
        .unwrap();
    statement.values()[position].clone()
}

#[test]
fn test_resolve_source_file_location_absolute_is_unchanged() {
    let location = format!("s3://bucket{}/landing/orders/", rand::random::<u32>());
    assert_eq!(resolve_source_file_location(&location, "other-bucket"), location);
    assert_eq!(resolve_source_file_location(&location, ""), location);
}

#[test]
fn test_resolve_source_file_location_joins_bucket_once() {
    assert_eq!(
        resolve_source_file_location("landing/orders/", "landing-bucket"),
        "s3://landing-bucket/landing/orders/"
    );
    assert_eq!(
        resolve_source_file_location("/landing/orders/", "landing-bucket/"),
        "s3://landing-bucket/landing/orders/"
    );
    assert_eq!(
        resolve_source_file_location("landing/orders/", "s3://landing-bucket"),
        "s3://landing-bucket/landing/orders/"
    );
}

#[test]
fn test_resolve_source_file_location_no_bucket_keeps_raw() {
    assert_eq!(
        resolve_source_file_location("landing/orders/", ""),
        "landing/orders/"
    );
}

#[test]
fn test_generic_target_location_uses_environment_tag() {
    let global = resolve_global_ingestion(&Default::default());
    assert_eq!(
        generic_target_location(&global, &DeploymentEnvironment::parse("prod"), "crm", "orders"),
        "s3://ct-ire-edp-prd-datastaging-op/changeaudit/crm/orders"
    );
    assert_eq!(
        generic_target_location(&global, &DeploymentEnvironment::parse("non-prod"), "crm", "orders"),
        "s3://ct-ire-edp-dev-datastaging-op/changeaudit/crm/orders"
    );
    assert_eq!(
        generic_target_location(&global, &DeploymentEnvironment::parse("pre-prod"), "crm", "orders"),
        "s3://ct-ire-edp-pre-prod-datastaging-op/changeaudit/crm/orders"
    );
}

#[test]
fn test_target_locations_with_custom_bucket() {
    let global = resolve_global_ingestion(
        &serde_json::from_value(json!({ "target_s3_location": "custom-bucket" })).unwrap(),
    );
    assert_eq!(
        generic_target_location(&global, &DeploymentEnvironment::parse("prod"), "crm", "orders"),
        "s3://custom-bucket/changeaudit/crm/orders"
    );
    assert_eq!(
        active_target_location(&global),
        "s3://custom-bucket/active/${source_system_name}/${tgt_database_name}/${tgt_table_name}/"
    );
    let default_global = resolve_global_ingestion(&Default::default());
    assert_eq!(active_target_location(&default_global), ACTIVE_LOCATION_TEMPLATE);
}

#[test]
fn test_synthesize_two_tables_without_active_blocks() {
    let env_config = environment(json!({
        "global_ingestion_config": { "source_file_bucket": "landing-bucket" },
        "tables": [
            { "table_name": "orders", "ingestion_config": ingestion_block("landing/orders/") },
            { "table_name": "customers", "ingestion_config": ingestion_block("landing/customers/") }
        ]
    }));
    let prod = DeploymentEnvironment::parse("prod");
    let statement_set = synthesize_statements(&env_config, &context(&prod)).unwrap();
    assert_eq!(statement_set.delete_statements.len(), 1);
    assert_eq!(
        statement_set.delete_statements[0].render(),
        "DELETE FROM data_control.edp_generic_file_loads WHERE source_system_name = 'crm';"
    );
    assert_eq!(statement_set.generic_file_load_rows.len(), 2);
    assert!(statement_set.active_table_rows.is_empty());
    assert!(!statement_set.active_table_config_present);
    assert!(statement_set.active_table_insert().is_none());

    let orders = &statement_set.generic_file_load_rows[0];
    assert_eq!(value_of(orders, "source_file_name_pk"), SqlValue::text("orders"));
    assert_eq!(
        value_of(orders, "source_file_location"),
        SqlValue::text("s3://landing-bucket/landing/orders/")
    );
    assert_eq!(value_of(orders, "target_table_name"), SqlValue::text("crm_orders"));
    assert_eq!(
        value_of(orders, "source_file_column_names"),
        SqlValue::text("id;name;updated_at")
    );
    assert_eq!(value_of(orders, "environment"), SqlValue::text("prod"));
    assert_eq!(value_of(orders, "job_template_name"), SqlValue::text(" "));
    assert_eq!(value_of(orders, "control_file_ind"), SqlValue::text("N"));
    assert_eq!(value_of(orders, "insert_datetime"), SqlValue::text("2024-01-16-00-30"));
    assert_eq!(value_of(orders, "worker_num"), SqlValue::Integer(2));
    assert_eq!(value_of(orders, "control_file_header_row_exist"), SqlValue::Null);
    assert_eq!(value_of(orders, "control_file_columns_names"), SqlValue::Null);

    let customers = &statement_set.generic_file_load_rows[1];
    assert_eq!(value_of(customers, "source_file_name_pk"), SqlValue::text("customers"));

    let insert = statement_set.generic_file_load_insert().unwrap();
    assert!(insert
        .shape()
        .starts_with("INSERT INTO data_control.edp_generic_file_loads SELECT "));
    assert_eq!(insert.shape().matches(" UNION ALL ").count(), 1);
}

#[test]
fn test_synthesize_with_active_blocks() {
    let mut with_active = json!({ "table_name": "policies", "ingestion_config": ingestion_block("s3://raw/policies/") });
    with_active["active_table_config"] = active_block();
    let env_config = environment(json!({
        "global_ingestion_config": {},
        "global_active_table_config": {
            "job_template_name": "active_job",
            "ignore_column": ["load_date", "batch_id"]
        },
        "tables": [
            with_active,
            { "table_name": "claims", "ingestion_config": ingestion_block("landing/claims/") }
        ]
    }));
    let non_prod = DeploymentEnvironment::parse("non-prod");
    let statement_set = synthesize_statements(&env_config, &context(&non_prod)).unwrap();
    assert!(statement_set.active_table_config_present);
    assert_eq!(statement_set.delete_statements.len(), 2);
    assert_eq!(
        statement_set.delete_statements[1].render(),
        "DELETE FROM data_control.active_table_job_config_attributes_iceberg WHERE src_system_name = 'crm';"
    );
    assert_eq!(statement_set.generic_file_load_rows.len(), 2);
    assert_eq!(statement_set.active_table_rows.len(), 1);

    let active = &statement_set.active_table_rows[0];
    assert_eq!(value_of(active, "src_system_name"), SqlValue::text("crm"));
    assert_eq!(value_of(active, "tgt_table_name"), SqlValue::text("a_policies"));
    assert_eq!(value_of(active, "tgt_database_name"), SqlValue::text("crm_main"));
    assert_eq!(value_of(active, "src_table_name"), SqlValue::text("crm_policies"));
    assert_eq!(
        value_of(active, "ignore_column"),
        SqlValue::text("load_date, batch_id")
    );
    assert_eq!(value_of(active, "worker_num"), SqlValue::Integer(5));
    assert_eq!(
        value_of(active, "tgt_location"),
        SqlValue::text(ACTIVE_LOCATION_TEMPLATE)
    );
    assert!(active
        .render()
        .contains("'status <> ''X''' AS filter_condition"));
    assert!(statement_set.active_table_insert().is_some());
}

#[test]
fn test_synthesize_active_blocks_without_global_block_is_malformed() {
    let mut with_active = json!({ "table_name": "policies", "ingestion_config": ingestion_block("landing/policies/") });
    with_active["active_table_config"] = active_block();
    let env_config = environment(json!({
        "global_ingestion_config": {},
        "tables": [with_active]
    }));
    let prod = DeploymentEnvironment::parse("prod");
    let result = synthesize_statements(&env_config, &context(&prod));
    assert!(matches!(result, Err(ProcessingError::MalformedDocument(_))));
}

#[test]
fn test_synthesize_global_active_block_without_tables_is_ignored() {
    let env_config = environment(json!({
        "global_ingestion_config": {},
        "global_active_table_config": { "job_template_name": "active_job" },
        "tables": [
            { "table_name": "orders", "ingestion_config": ingestion_block("landing/orders/") }
        ]
    }));
    let prod = DeploymentEnvironment::parse("prod");
    let statement_set = synthesize_statements(&env_config, &context(&prod)).unwrap();
    assert_eq!(statement_set.delete_statements.len(), 1);
    assert!(!statement_set.active_table_config_present);
}

#[test]
fn test_synthesize_zero_tables() {
    let env_config = environment(json!({ "global_ingestion_config": {}, "tables": [] }));
    let prod = DeploymentEnvironment::parse("prod");
    let statement_set = synthesize_statements(&env_config, &context(&prod)).unwrap();
    assert_eq!(statement_set.delete_statements.len(), 1);
    assert!(statement_set.generic_file_load_rows.is_empty());
    assert!(statement_set.generic_file_load_insert().is_none());
    assert!(statement_set.active_table_insert().is_none());
}

#[test]
fn test_synthesize_rejects_non_integer_worker_num() {
    let mut ingestion = ingestion_block("landing/orders/");
    ingestion["worker_num"] = json!("two");
    let env_config = environment(json!({
        "global_ingestion_config": {},
        "tables": [{ "table_name": "orders", "ingestion_config": ingestion }]
    }));
    let prod = DeploymentEnvironment::parse("prod");
    let result = synthesize_statements(&env_config, &context(&prod));
    assert!(matches!(result, Err(ProcessingError::MalformedDocument(_))));
}
