// ==========================================
// ImportApi 端到端测试
// ==========================================
// 测试目标: SQLite 落库、身份开通外发箱、上传互斥与取消、模板
// ==========================================

mod helpers;

use bizops_import::api::{ApiError, ImportApi, ImportOverrides};
use bizops_import::config::ConfigManager;
use bizops_import::db::init_schema;
use bizops_import::domain::types::BusinessUnit;
use bizops_import::domain::upload::RowErrorKind;
use bizops_import::logging;
use bizops_import::repository::KpiRepositoryImpl;
use helpers::{MemoryStore, MockConfig, RecordingProvisioner};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use test_helpers::{
    count_rows, create_test_db, employee_csv_with_problems, kpi_csv, write_upload, KPI_HEADER,
};

fn mock_api(config: MockConfig, store: Arc<MemoryStore>) -> ImportApi {
    // KPI 仓储仅用于导出线上值，这里接一个内存库
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let kpi_repo = Arc::new(KpiRepositoryImpl::from_connection(Arc::new(Mutex::new(conn))));
    ImportApi::new(
        Arc::new(config),
        store,
        kpi_repo,
        Arc::new(RecordingProvisioner::new()),
    )
}

#[tokio::test]
async fn test_kpi_import_persists_and_rejects_reupload() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_upload(&dir, "kpi.csv", &kpi_csv());
    let api = ImportApi::open(&db_path).unwrap();

    let first = api
        .import_kpis(&file, BusinessUnit::Sales, ImportOverrides::default())
        .await
        .unwrap();
    assert_eq!(first.successful_imports, 3);
    assert_eq!(count_rows(&db_path, "kpi_metric"), 3);

    let second = api
        .import_kpis(&file, BusinessUnit::Sales, ImportOverrides::default())
        .await
        .unwrap();
    assert_eq!(second.successful_imports, 0);
    assert_eq!(second.failed_imports, 3);
    assert!(second.errors.iter().all(|e| e.kind == RowErrorKind::Duplicate));
    assert_eq!(count_rows(&db_path, "kpi_metric"), 3);

    // 历史最新在前
    let history = api.upload_history().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].upload_id, second.upload_id);
    assert_eq!(history[1].upload_id, first.upload_id);
}

#[tokio::test]
async fn test_employee_import_provisions_identities() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_upload(&dir, "employees.csv", &employee_csv_with_problems());
    let api = ImportApi::open(&db_path).unwrap();

    let summary = api
        .import_employees(&file, ImportOverrides::default())
        .await
        .unwrap();

    assert_eq!(summary.total_rows, 4);
    assert_eq!(summary.successful_imports, 2);
    assert_eq!(summary.errors[0].row_number, 3);
    assert_eq!(count_rows(&db_path, "employee"), 2);
    assert_eq!(count_rows(&db_path, "identity_account"), 2);
    assert_eq!(count_rows(&db_path, "credential_invite"), 2);
    assert!(summary.provisioning.iter().all(|p| p.is_complete()));

    let conn = Connection::open(&db_path).unwrap();
    let (role, manager_code, identity_id): (String, Option<String>, Option<String>) = conn
        .query_row(
            "SELECT e.role, e.manager_code, m.identity_id
             FROM employee e JOIN employee m ON m.employee_code = 'EMP010'
             WHERE e.employee_code = 'EMP012'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(role, "Director");
    assert_eq!(manager_code.as_deref(), Some("EMP010"));
    assert!(identity_id.is_some());
}

#[tokio::test]
async fn test_disabled_invites_skip_provisioning() {
    let (_db_file, db_path) = create_test_db().unwrap();
    ConfigManager::new(&db_path)
        .unwrap()
        .set_config_value("send_credential_invites", "false")
        .unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_upload(&dir, "employees.csv", &employee_csv_with_problems());
    let api = ImportApi::open(&db_path).unwrap();

    let summary = api
        .import_employees(&file, ImportOverrides::default())
        .await
        .unwrap();

    assert_eq!(summary.successful_imports, 2);
    assert_eq!(count_rows(&db_path, "identity_account"), 0);
    assert_eq!(count_rows(&db_path, "credential_invite"), 0);
    assert!(summary.provisioning.iter().all(|p| !p.identity_provisioned && p.error.is_none()));
}

#[tokio::test]
async fn test_schema_error_maps_to_api_error_without_history() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_upload(&dir, "kpi.csv", "Metric Name,Target\nRevenue,100\n");
    let api = ImportApi::open(&db_path).unwrap();

    let err = api
        .import_kpis(&file, BusinessUnit::Sales, ImportOverrides::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::SchemaError { .. }));
    assert_eq!(err.missing_columns(), &["Data Type".to_string()]);
    assert_eq!(count_rows(&db_path, "kpi_metric"), 0);
    assert!(api.upload_history().unwrap().is_empty());
    assert!(!api.is_upload_in_progress());
}

#[tokio::test]
async fn test_empty_path_is_invalid_input() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::open(&db_path).unwrap();

    let err = api
        .import_employees(Path::new(""), ImportOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_strict_override() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let file = write_upload(&dir, "kpi.csv", &kpi_csv());
    let api = ImportApi::open(&db_path).unwrap();

    let summary = api
        .import_kpis(&file, BusinessUnit::Finance, ImportOverrides::strict())
        .await
        .unwrap();
    assert_eq!(summary.successful_imports, 2);
    assert_eq!(summary.errors[0].kind, RowErrorKind::InvalidValue);
}

#[tokio::test]
async fn test_concurrent_upload_is_rejected_and_cancel_works() {
    logging::init_test();
    let dir = TempDir::new().unwrap();
    let mut lines = vec![KPI_HEADER.to_string()];
    for i in 1..=20 {
        lines.push(format!("Metric {},1,2,3,4,5,6,7,8,9,10,11,12,number,,", i));
    }
    let file = write_upload(&dir, "kpi.csv", &lines.join("\n"));
    let store = Arc::new(MemoryStore::slow(Duration::from_millis(50)));
    let api = Arc::new(mock_api(MockConfig::default(), store.clone()));

    let running = {
        let api = api.clone();
        let file = file.clone();
        tokio::spawn(async move {
            api.import_kpis(&file, BusinessUnit::Sales, ImportOverrides::default())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(api.is_upload_in_progress());
    let err = api
        .import_kpis(&file, BusinessUnit::Sales, ImportOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::UploadInProgress));

    assert!(api.cancel_current_upload().unwrap());
    let summary = running.await.unwrap().unwrap();
    assert!(summary.cancelled);
    assert!(summary.successful_imports < 20);
    assert_eq!(summary.successful_imports + summary.failed_imports, 20);
    assert_eq!(store.record_count(), summary.successful_imports);

    assert!(!api.is_upload_in_progress());
    assert!(!api.cancel_current_upload().unwrap());
    assert_eq!(api.upload_history().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_respects_configured_limit() {
    let dir = TempDir::new().unwrap();
    let file = write_upload(&dir, "kpi.csv", &kpi_csv());
    let api = mock_api(MockConfig::with_history_limit(1), Arc::new(MemoryStore::new()));

    api.import_kpis(&file, BusinessUnit::Sales, ImportOverrides::default())
        .await
        .unwrap();
    let latest = api
        .import_kpis(&file, BusinessUnit::Hr, ImportOverrides::default())
        .await
        .unwrap();

    let history = api.upload_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].upload_id, latest.upload_id);
}

#[tokio::test]
async fn test_generated_templates_are_importable() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let dir = TempDir::new().unwrap();
    let api = ImportApi::open(&db_path).unwrap();

    let kpi_template = dir.path().join("kpi_template.xlsx");
    let rows = api
        .generate_kpi_template(&kpi_template, BusinessUnit::Operations, false)
        .await
        .unwrap();
    assert_eq!(rows, BusinessUnit::Operations.sample_metrics().len());

    let summary = api
        .import_kpis(&kpi_template, BusinessUnit::Operations, ImportOverrides::strict())
        .await
        .unwrap();
    assert_eq!(summary.successful_imports, rows);
    assert!(summary.errors.is_empty());

    // 导出线上值：行数等于已存指标数
    let live_template = dir.path().join("kpi_live.xlsx");
    let live_rows = api
        .generate_kpi_template(&live_template, BusinessUnit::Operations, true)
        .await
        .unwrap();
    assert_eq!(live_rows, rows);

    let employee_template = dir.path().join("employee_template.xlsx");
    api.generate_employee_template(&employee_template).unwrap();
    let summary = api
        .import_employees(&employee_template, ImportOverrides::default())
        .await
        .unwrap();
    assert_eq!(summary.successful_imports, 1);
    assert_eq!(count_rows(&db_path, "employee"), 1);
}
