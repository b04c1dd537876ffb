// ==========================================
// 经营看板数据导入系统 - KPI 指标 Repository 实现
// ==========================================
// 职责: 实现 KPI 指标数据访问（使用 rusqlite）
// 约束: 所有查询使用参数化
// ==========================================

use crate::domain::kpi::{KpiMetric, KpiMetricRecord, MONTHS_PER_YEAR};
use crate::domain::types::{BusinessUnit, MetricUnit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kpi_repo::KpiRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "metric_id, business_unit, name, monthly_values_json, target, \
                              unit, category, created_at, updated_at";

/// 指标名比较键（大小写不敏感）
pub(crate) fn metric_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ==========================================
// KpiRepositoryImpl
// ==========================================
pub struct KpiRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl KpiRepositoryImpl {
    /// 从共享连接创建（连接需已完成建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<(KpiMetric, String)> {
        let business_unit: String = row.get(1)?;
        let monthly_json: String = row.get(3)?;
        let unit: String = row.get(5)?;
        let metric = KpiMetric {
            metric_id: row.get(0)?,
            record: KpiMetricRecord {
                business_unit: BusinessUnit::from_vocab(&business_unit).unwrap_or_default(),
                name: row.get(2)?,
                monthly_values: [0.0; MONTHS_PER_YEAR],
                target: row.get(4)?,
                unit: MetricUnit::from_vocab(&unit).unwrap_or_default(),
                category: row.get(6)?,
            },
            created_at: row.get::<_, DateTime<Utc>>(7)?,
            updated_at: row.get::<_, DateTime<Utc>>(8)?,
        };
        Ok((metric, monthly_json))
    }

    fn decode_monthly(json: &str) -> RepositoryResult<[f64; MONTHS_PER_YEAR]> {
        let values: Vec<f64> =
            serde_json::from_str(json).map_err(|e| RepositoryError::FieldValueError {
                field: "monthly_values_json".to_string(),
                message: e.to_string(),
            })?;
        let mut monthly = [0.0; MONTHS_PER_YEAR];
        for (slot, value) in monthly.iter_mut().zip(values) {
            *slot = value;
        }
        Ok(monthly)
    }

    fn encode_monthly(values: &[f64; MONTHS_PER_YEAR]) -> RepositoryResult<String> {
        serde_json::to_string(&values.to_vec()).map_err(|e| RepositoryError::FieldValueError {
            field: "monthly_values_json".to_string(),
            message: e.to_string(),
        })
    }

    fn finish_row(raw: (KpiMetric, String)) -> RepositoryResult<KpiMetric> {
        let (mut metric, monthly_json) = raw;
        metric.record.monthly_values = Self::decode_monthly(&monthly_json)?;
        Ok(metric)
    }
}

#[async_trait]
impl KpiRepository for KpiRepositoryImpl {
    async fn insert_metric(&self, record: &KpiMetricRecord) -> RepositoryResult<String> {
        let conn = self.conn.lock()?;
        let metric_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO kpi_metric (
                metric_id, business_unit, name, name_key, monthly_values_json,
                target, unit, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                metric_id,
                record.business_unit.code(),
                record.name,
                metric_name_key(&record.name),
                Self::encode_monthly(&record.monthly_values)?,
                record.target,
                record.unit.as_str(),
                record.category,
                now,
                now,
            ],
        )?;

        Ok(metric_id)
    }

    async fn update_metric(&self, record: &KpiMetricRecord) -> RepositoryResult<()> {
        let conn = self.conn.lock()?;

        let affected = conn.execute(
            r#"
            UPDATE kpi_metric
            SET monthly_values_json = ?1, target = ?2, unit = ?3, category = ?4, updated_at = ?5
            WHERE business_unit = ?6 AND name_key = ?7
            "#,
            params![
                Self::encode_monthly(&record.monthly_values)?,
                record.target,
                record.unit.as_str(),
                record.category,
                Utc::now(),
                record.business_unit.code(),
                metric_name_key(&record.name),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "KpiMetric".to_string(),
                id: format!("{}/{}", record.business_unit, record.name),
            });
        }
        Ok(())
    }

    async fn find_metric(
        &self,
        business_unit: BusinessUnit,
        name: &str,
    ) -> RepositoryResult<Option<KpiMetric>> {
        let conn = self.conn.lock()?;
        let sql = format!(
            "SELECT {} FROM kpi_metric WHERE business_unit = ?1 AND name_key = ?2",
            SELECT_COLUMNS
        );

        let raw = conn
            .query_row(&sql, params![business_unit.code(), metric_name_key(name)], Self::map_row)
            .optional()?;

        raw.map(Self::finish_row).transpose()
    }

    async fn list_by_business_unit(
        &self,
        business_unit: BusinessUnit,
    ) -> RepositoryResult<Vec<KpiMetric>> {
        let conn = self.conn.lock()?;
        let sql = format!(
            "SELECT {} FROM kpi_metric WHERE business_unit = ?1 ORDER BY name_key",
            SELECT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![business_unit.code()], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::finish_row).collect()
    }

    async fn count_metrics(&self) -> RepositoryResult<usize> {
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM kpi_metric", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn create_repo() -> KpiRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        KpiRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn record(name: &str, jan: f64) -> KpiMetricRecord {
        let mut monthly_values = [0.0; MONTHS_PER_YEAR];
        monthly_values[0] = jan;
        KpiMetricRecord {
            business_unit: BusinessUnit::Sales,
            name: name.to_string(),
            monthly_values,
            target: Some(100.0),
            unit: MetricUnit::Currency,
            category: Some("Growth".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_case_insensitive() {
        let repo = create_repo();
        repo.insert_metric(&record("Revenue", 12.5)).await.unwrap();

        let found = repo
            .find_metric(BusinessUnit::Sales, "REVENUE")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.record.name, "Revenue");
        assert_eq!(found.record.monthly_values[0], 12.5);
        assert_eq!(found.record.unit, MetricUnit::Currency);

        assert!(repo
            .find_metric(BusinessUnit::Finance, "Revenue")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_violates_unique() {
        let repo = create_repo();
        repo.insert_metric(&record("Revenue", 1.0)).await.unwrap();
        let err = repo.insert_metric(&record("revenue", 2.0)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_metric_is_not_found() {
        let repo = create_repo();
        let err = repo.update_metric(&record("Revenue", 1.0)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));

        repo.insert_metric(&record("Revenue", 1.0)).await.unwrap();
        repo.update_metric(&record("Revenue", 9.0)).await.unwrap();
        let list = repo.list_by_business_unit(BusinessUnit::Sales).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].record.monthly_values[0], 9.0);
        assert_eq!(repo.count_metrics().await.unwrap(), 1);
    }
}
