// ==========================================
// 经营看板数据导入系统 - 核心库
// ==========================================
// 职责: KPI 指标与员工档案的表格导入
// 技术栈: Rust + SQLite + calamine/csv
// 流程: 解析 → 表头识别 → 行校验 → 规整 → 写入 → 汇总
// ==========================================

// 文案资源: locales/*.yml
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录、词表与上传结果
pub mod domain;

// 仓储层 - SQLite 读写
pub mod repository;

// 导入层 - 上传管道
pub mod importer;

// 身份开通 - 员工账号与邀请
pub mod identity;

// 配置层 - 导入开关与默认值
pub mod config;

// SQLite 连接与建表
pub mod db;

pub mod i18n;
pub mod logging;

// API 层 - 上传入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    BusinessUnit, DuplicatePolicy, MetricUnit, RecordKind, Role, ValidationMode,
};

// 领域实体
pub use domain::{
    Employee, EmployeeRecord, KpiMetric, KpiMetricRecord, RowErrorKind, UploadSummary,
    ValidationError,
};

// 导入管道
pub use importer::{CancelHandle, ImportError, UploadPipeline};

// API
pub use api::{ApiError, ImportApi, ImportOverrides};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "经营看板数据导入系统";
