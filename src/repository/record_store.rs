// ==========================================
// 经营看板数据导入系统 - 导入落库接口
// ==========================================
// 职责: 导入管道唯一依赖的存储接口（已知记录快照 + 新建/更新）
// 红线: 每条记录一次调用，不做批量、不做重试
// ==========================================

use crate::domain::types::{BusinessUnit, RecordKind};
use crate::domain::upload::NormalizedRecord;
use crate::repository::employee_repo::EmployeeRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kpi_repo::KpiRepository;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ==========================================
// StoreScope - 已知记录快照的范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    Kpi { business_unit: BusinessUnit }, // 同一事业部下的指标
    Employee,                            // 全部员工
}

impl StoreScope {
    pub fn kind(&self) -> RecordKind {
        match self {
            StoreScope::Kpi { .. } => RecordKind::KpiMetric,
            StoreScope::Employee => RecordKind::Employee,
        }
    }
}

// ==========================================
// KnownRecords - 已知记录快照（字段 → 取值集合）
// ==========================================
// 取值统一小写比较
// 次级唯一字段可记录归属的主标识，用于更新时识别占用他人取值
#[derive(Debug, Clone, Default)]
pub struct KnownRecords {
    values: HashMap<String, HashSet<String>>,
    owners: HashMap<(String, String), String>,
}

impl KnownRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, value: &str) {
        self.values
            .entry(field.to_string())
            .or_default()
            .insert(value.trim().to_lowercase());
    }

    /// 登记取值及其所属记录的主标识
    pub fn insert_owned(&mut self, field: &str, value: &str, owner: &str) {
        self.insert(field, value);
        self.owners.insert(
            (field.to_string(), value.trim().to_lowercase()),
            owner.trim().to_lowercase(),
        );
    }

    /// 取值所属记录的主标识（小写）；未登记归属时为 None
    pub fn owner(&self, field: &str, value: &str) -> Option<&str> {
        self.owners
            .get(&(field.to_string(), value.trim().to_lowercase()))
            .map(String::as_str)
    }

    pub fn extend<I, S>(&mut self, field: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.insert(field, value.as_ref());
        }
    }

    pub fn contains(&self, field: &str, value: &str) -> bool {
        self.values
            .get(field)
            .map(|set| set.contains(&value.trim().to_lowercase()))
            .unwrap_or(false)
    }

    pub fn len(&self, field: &str) -> usize {
        self.values.get(field).map(HashSet::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(HashSet::is_empty)
    }
}

// ==========================================
// RecordStore Trait
// ==========================================
// 实现者: SqliteRecordStore；测试中用记录型/失败型替身
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 读取已知记录快照（批次开始时调用一次）
    async fn load_known(&self, scope: StoreScope) -> RepositoryResult<KnownRecords>;

    /// 新建记录
    async fn create(&self, record: &NormalizedRecord) -> RepositoryResult<()>;

    /// 按标识更新记录
    async fn update(&self, record: &NormalizedRecord) -> RepositoryResult<()>;
}

/// KPI 快照中的字段键
pub const KPI_NAME_FIELD: &str = "metric_name";
/// 员工快照中的字段键
pub const EMPLOYEE_CODE_FIELD: &str = "employee_code";
pub const EMPLOYEE_EMAIL_FIELD: &str = "email";

// ==========================================
// SqliteRecordStore - 基于 KPI/员工仓储的实现
// ==========================================
pub struct SqliteRecordStore {
    kpi_repo: Arc<dyn KpiRepository>,
    employee_repo: Arc<dyn EmployeeRepository>,
}

impl SqliteRecordStore {
    pub fn new(kpi_repo: Arc<dyn KpiRepository>, employee_repo: Arc<dyn EmployeeRepository>) -> Self {
        Self {
            kpi_repo,
            employee_repo,
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn load_known(&self, scope: StoreScope) -> RepositoryResult<KnownRecords> {
        let mut known = KnownRecords::new();
        match scope {
            StoreScope::Kpi { business_unit } => {
                let metrics = self.kpi_repo.list_by_business_unit(business_unit).await?;
                known.extend(KPI_NAME_FIELD, metrics.iter().map(|m| m.record.name.as_str()));
            }
            StoreScope::Employee => {
                for (code, email) in self.employee_repo.list_code_emails().await? {
                    known.insert(EMPLOYEE_CODE_FIELD, &code);
                    known.insert_owned(EMPLOYEE_EMAIL_FIELD, &email, &code);
                }
            }
        }
        Ok(known)
    }

    async fn create(&self, record: &NormalizedRecord) -> RepositoryResult<()> {
        match record {
            NormalizedRecord::Kpi(metric) => {
                self.kpi_repo.insert_metric(metric).await?;
            }
            NormalizedRecord::Employee(employee) => {
                self.employee_repo.insert_employee(employee).await?;
            }
        }
        Ok(())
    }

    async fn update(&self, record: &NormalizedRecord) -> RepositoryResult<()> {
        match record {
            NormalizedRecord::Kpi(metric) => self.kpi_repo.update_metric(metric).await,
            NormalizedRecord::Employee(employee) => {
                self.employee_repo.update_employee(employee).await
            }
        }
    }
}

/// 把仓储错误归一成面向用户的行级描述
pub fn describe_write_error(err: &RepositoryError) -> String {
    match err {
        RepositoryError::UniqueConstraintViolation(_) => "记录已存在（唯一约束冲突）".to_string(),
        RepositoryError::NotFound { id, .. } => format!("待更新记录不存在: {}", id),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_records_case_insensitive() {
        let mut known = KnownRecords::new();
        assert!(known.is_empty());
        known.extend(EMPLOYEE_CODE_FIELD, ["EMP001", " emp002 "]);

        assert!(known.contains(EMPLOYEE_CODE_FIELD, "emp001"));
        assert!(known.contains(EMPLOYEE_CODE_FIELD, "EMP002"));
        assert!(!known.contains(EMPLOYEE_EMAIL_FIELD, "EMP001"));
        assert_eq!(known.len(EMPLOYEE_CODE_FIELD), 2);
        assert!(!known.is_empty());
    }

    #[test]
    fn test_known_records_owner() {
        let mut known = KnownRecords::new();
        known.insert_owned(EMPLOYEE_EMAIL_FIELD, "Jane@X.com", "EMP001");
        known.insert(EMPLOYEE_EMAIL_FIELD, "orphan@x.com");

        assert!(known.contains(EMPLOYEE_EMAIL_FIELD, "jane@x.com"));
        assert_eq!(known.owner(EMPLOYEE_EMAIL_FIELD, " JANE@x.com"), Some("emp001"));
        assert_eq!(known.owner(EMPLOYEE_EMAIL_FIELD, "orphan@x.com"), None);
        assert_eq!(known.owner(EMPLOYEE_CODE_FIELD, "jane@x.com"), None);
    }

    #[test]
    fn test_describe_write_error() {
        let msg = describe_write_error(&RepositoryError::UniqueConstraintViolation(
            "UNIQUE constraint failed".to_string(),
        ));
        assert!(msg.contains("唯一约束"));
    }
}
