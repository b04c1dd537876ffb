// ==========================================
// 内存记录存储 - 用于集成测试
// ==========================================
// 支持: 写入记录、指定标识写入失败、写入延迟、已知记录读取失败
// ==========================================

use async_trait::async_trait;
use bizops_import::domain::upload::NormalizedRecord;
use bizops_import::repository::{
    KnownRecords, RecordStore, RepositoryError, RepositoryResult, StoreScope,
    EMPLOYEE_CODE_FIELD, EMPLOYEE_EMAIL_FIELD, KPI_NAME_FIELD,
};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<NormalizedRecord>>,
    updates: Mutex<Vec<String>>,
    fail_on: HashSet<String>,
    write_delay: Option<Duration>,
    ack_delay: Option<Duration>,
    fail_load: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定标识（小写比较）的写入返回错误
    pub fn failing_on(identifiers: &[&str]) -> Self {
        Self {
            fail_on: identifiers.iter().map(|s| s.to_lowercase()).collect(),
            ..Self::default()
        }
    }

    /// 每次写入前等待
    pub fn slow(delay: Duration) -> Self {
        Self {
            write_delay: Some(delay),
            ..Self::default()
        }
    }

    /// 先落库，再等待后返回（模拟提交后确认较慢的存储）
    pub fn slow_ack(delay: Duration) -> Self {
        Self {
            ack_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<NormalizedRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn updated_identifiers(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }

    async fn before_write(&self, record: &NormalizedRecord) -> RepositoryResult<()> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.contains(&record.identifier().to_lowercase()) {
            return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
        }
        Ok(())
    }

    async fn after_write(&self) {
        if let Some(delay) = self.ack_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_known(&self, scope: StoreScope) -> RepositoryResult<KnownRecords> {
        if self.fail_load {
            return Err(RepositoryError::DatabaseConnectionError("store offline".to_string()));
        }
        let mut known = KnownRecords::new();
        for record in self.records.lock().unwrap().iter() {
            match (scope, record) {
                (StoreScope::Kpi { business_unit }, NormalizedRecord::Kpi(metric))
                    if metric.business_unit == business_unit =>
                {
                    known.insert(KPI_NAME_FIELD, &metric.name);
                }
                (StoreScope::Employee, NormalizedRecord::Employee(employee)) => {
                    known.insert(EMPLOYEE_CODE_FIELD, &employee.employee_code);
                    known.insert_owned(EMPLOYEE_EMAIL_FIELD, &employee.email, &employee.employee_code);
                }
                _ => {}
            }
        }
        Ok(known)
    }

    async fn create(&self, record: &NormalizedRecord) -> RepositoryResult<()> {
        self.before_write(record).await?;
        self.records.lock().unwrap().push(record.clone());
        self.after_write().await;
        Ok(())
    }

    async fn update(&self, record: &NormalizedRecord) -> RepositoryResult<()> {
        self.before_write(record).await?;
        let mut records = self.records.lock().unwrap();
        let key = record.identifier().to_lowercase();
        let slot = records
            .iter_mut()
            .find(|r| r.kind() == record.kind() && r.identifier().to_lowercase() == key)
            .ok_or_else(|| RepositoryError::NotFound {
                entity: record.kind().to_string(),
                id: record.identifier().to_string(),
            })?;
        *slot = record.clone();
        self.updates.lock().unwrap().push(record.identifier().to_string());
        Ok(())
    }
}
