// ==========================================
// 经营看板数据导入系统 - KPI 指标 Repository Trait
// ==========================================
// 职责: 定义 KPI 指标数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::kpi::{KpiMetric, KpiMetricRecord};
use crate::domain::types::BusinessUnit;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// KpiRepository Trait
// ==========================================
// 实现者: KpiRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait KpiRepository: Send + Sync {
    /// 新建指标
    ///
    /// # 返回
    /// - Ok(metric_id)
    /// - Err(UniqueConstraintViolation): 同事业部下已存在同名指标
    async fn insert_metric(&self, record: &KpiMetricRecord) -> RepositoryResult<String>;

    /// 按 (事业部, 指标名) 更新指标
    ///
    /// # 返回
    /// - Err(NotFound): 没有匹配的指标
    async fn update_metric(&self, record: &KpiMetricRecord) -> RepositoryResult<()>;

    /// 按 (事业部, 指标名) 查询（指标名大小写不敏感）
    async fn find_metric(
        &self,
        business_unit: BusinessUnit,
        name: &str,
    ) -> RepositoryResult<Option<KpiMetric>>;

    /// 列出事业部下全部指标（按名称排序）
    async fn list_by_business_unit(
        &self,
        business_unit: BusinessUnit,
    ) -> RepositoryResult<Vec<KpiMetric>>;

    /// 统计指标数量
    async fn count_metrics(&self) -> RepositoryResult<usize>;
}
