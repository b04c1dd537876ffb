// ==========================================
// 经营看板数据导入系统 - 导入层
// ==========================================
// 职责: 表格文件 → 标准化记录 → 逐条落库 → 上传汇总
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods), CSV
// ==========================================

// 模块声明
pub mod cancel;
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod import_profile;
pub mod importer_trait;
pub mod result_reporter;
pub mod row_validator;
pub mod schema_detector;
pub mod template;
pub mod upload_pipeline;
pub mod upsert_dispatcher;

// 重导出核心类型
pub use cancel::CancelHandle;
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use import_profile::{EmployeeDefaults, EmployeeImportProfile, KpiImportProfile};
pub use result_reporter::{display_messages, summary_line, ResultReporter};
pub use row_validator::{RowValidator, WriteIntent};
pub use schema_detector::SchemaDetector;
pub use template::{generate_employee_template, generate_kpi_template};
pub use upload_pipeline::{PipelineOptions, UploadPipeline};
pub use upsert_dispatcher::{DispatchOutcome, UpsertDispatcher};

// 重导出 Trait 接口
pub use importer_trait::{FieldSpec, FileParser, ImportProfile, MonthSpan};
