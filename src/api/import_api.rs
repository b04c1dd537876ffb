// ==========================================
// 经营看板数据导入系统 - 导入 API
// ==========================================
// 职责: 组装配置、仓储、身份开通与上传管道，对外提供导入入口
// 约束: 同一时刻只允许一个上传在处理（对应界面上禁用上传按钮）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_shared_connection;
use crate::domain::kpi::KpiMetricRecord;
use crate::domain::types::{BusinessUnit, DuplicatePolicy, ValidationMode};
use crate::domain::upload::{UploadHistory, UploadSummary};
use crate::identity::{DisabledProvisioner, IdentityProvisioner, OutboxProvisioner};
use crate::importer::{
    generate_employee_template, generate_kpi_template, CancelHandle, EmployeeDefaults,
    EmployeeImportProfile, FileParser, ImportProfile, KpiImportProfile, PipelineOptions,
    UniversalFileParser, UploadPipeline,
};
use crate::repository::{
    EmployeeRepository, EmployeeRepositoryImpl, KpiRepository, KpiRepositoryImpl, RecordStore,
    SqliteRecordStore,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

/// 单次上传对配置的临时覆盖（None 表示沿用配置）
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOverrides {
    pub mode: Option<ValidationMode>,
    pub duplicate_policy: Option<DuplicatePolicy>,
}

impl ImportOverrides {
    pub fn strict() -> Self {
        Self {
            mode: Some(ValidationMode::Strict),
            ..Self::default()
        }
    }
}

// ==========================================
// UploadSlot - 上传占位（析构时释放）
// ==========================================
struct UploadSlot<'a> {
    slot: &'a Mutex<Option<CancelHandle>>,
}

impl Drop for UploadSlot<'_> {
    fn drop(&mut self) {
        if let Ok(mut current) = self.slot.lock() {
            *current = None;
        }
    }
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    config: Arc<dyn ImportConfigReader>,
    store: Arc<dyn RecordStore>,
    kpi_repo: Arc<dyn KpiRepository>,
    provisioner: Arc<dyn IdentityProvisioner>,
    parser: Arc<dyn FileParser>,
    history: Mutex<UploadHistory>,
    in_flight: Mutex<Option<CancelHandle>>,
}

impl ImportApi {
    pub fn new(
        config: Arc<dyn ImportConfigReader>,
        store: Arc<dyn RecordStore>,
        kpi_repo: Arc<dyn KpiRepository>,
        provisioner: Arc<dyn IdentityProvisioner>,
    ) -> Self {
        Self {
            config,
            store,
            kpi_repo,
            provisioner,
            parser: Arc::new(UniversalFileParser),
            history: Mutex::new(UploadHistory::new(20)),
            in_flight: Mutex::new(None),
        }
    }

    /// 基于 SQLite 数据库组装全部依赖
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_shared_connection(db_path)
            .map_err(|e| ApiError::DatabaseUnavailable(e.to_string()))?;

        let kpi_repo: Arc<dyn KpiRepository> = Arc::new(KpiRepositoryImpl::from_connection(conn.clone()));
        let employee_repo: Arc<dyn EmployeeRepository> =
            Arc::new(EmployeeRepositoryImpl::from_connection(conn.clone()));
        let store = Arc::new(SqliteRecordStore::new(kpi_repo.clone(), employee_repo.clone()));
        let provisioner = Arc::new(OutboxProvisioner::new(conn.clone(), employee_repo));
        let config = Arc::new(ConfigManager::from_connection(conn)?);

        info!(db_path = %db_path, "导入 API 已初始化");
        Ok(Self::new(config, store, kpi_repo, provisioner))
    }

    fn lock_error(e: impl std::fmt::Display) -> ApiError {
        ApiError::InternalError(format!("锁获取失败: {}", e))
    }

    fn begin_upload(&self) -> ApiResult<(UploadSlot<'_>, CancelHandle)> {
        let mut current = self.in_flight.lock().map_err(Self::lock_error)?;
        if current.is_some() {
            warn!("拒绝并发上传");
            return Err(ApiError::UploadInProgress);
        }
        let handle = CancelHandle::new();
        *current = Some(handle.clone());
        Ok((
            UploadSlot {
                slot: &self.in_flight,
            },
            handle,
        ))
    }

    async fn resolve_options(&self, overrides: ImportOverrides) -> ApiResult<PipelineOptions> {
        let mode = match overrides.mode {
            Some(mode) => mode,
            None => self.config.get_validation_mode().await?,
        };
        let duplicate_policy = match overrides.duplicate_policy {
            Some(policy) => policy,
            None => self.config.get_duplicate_policy().await?,
        };
        Ok(PipelineOptions {
            mode,
            duplicate_policy,
        })
    }

    async fn pipeline(&self) -> ApiResult<UploadPipeline> {
        let provisioner: Arc<dyn IdentityProvisioner> =
            if self.config.get_send_credential_invites().await? {
                self.provisioner.clone()
            } else {
                Arc::new(DisabledProvisioner)
            };
        Ok(UploadPipeline::new(
            self.parser.clone(),
            self.store.clone(),
            provisioner,
        ))
    }

    async fn run_upload(
        &self,
        profile: &dyn ImportProfile,
        file_path: &Path,
        overrides: ImportOverrides,
    ) -> ApiResult<UploadSummary> {
        if file_path.as_os_str().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }
        let (_slot, cancel) = self.begin_upload()?;

        let options = self.resolve_options(overrides).await?;
        let pipeline = self.pipeline().await?;
        let summary = pipeline.run(profile, file_path, options, &cancel).await?;

        self.remember(summary.clone()).await?;
        Ok(summary)
    }

    async fn remember(&self, summary: UploadSummary) -> ApiResult<()> {
        let limit = self.config.get_history_limit().await?;
        let mut history = self.history.lock().map_err(Self::lock_error)?;
        if history.limit() != limit {
            history.set_limit(limit);
        }
        history.push(summary);
        Ok(())
    }

    /// 导入 KPI 指标（整个文件归属所选事业部）
    #[instrument(skip(self, file_path, overrides), fields(file = %file_path.display()))]
    pub async fn import_kpis(
        &self,
        file_path: &Path,
        business_unit: BusinessUnit,
        overrides: ImportOverrides,
    ) -> ApiResult<UploadSummary> {
        let profile = KpiImportProfile::new(business_unit);
        self.run_upload(&profile, file_path, overrides).await
    }

    /// 导入员工档案
    #[instrument(skip(self, file_path, overrides), fields(file = %file_path.display()))]
    pub async fn import_employees(
        &self,
        file_path: &Path,
        overrides: ImportOverrides,
    ) -> ApiResult<UploadSummary> {
        let defaults = EmployeeDefaults {
            role: self.config.get_default_role().await?,
            business_unit: self.config.get_default_business_unit().await?,
        };
        let profile = EmployeeImportProfile::new(defaults);
        self.run_upload(&profile, file_path, overrides).await
    }

    /// 请求取消正在处理的上传
    ///
    /// # 返回
    /// - true: 已发出取消信号
    /// - false: 当前没有上传在处理
    pub fn cancel_current_upload(&self) -> ApiResult<bool> {
        let current = self.in_flight.lock().map_err(Self::lock_error)?;
        match current.as_ref() {
            Some(handle) => {
                handle.cancel();
                info!("已请求取消当前上传");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_upload_in_progress(&self) -> bool {
        self.in_flight
            .lock()
            .map(|current| current.is_some())
            .unwrap_or(false)
    }

    /// 会话内上传历史（最新在前）
    pub fn upload_history(&self) -> ApiResult<Vec<UploadSummary>> {
        let history = self.history.lock().map_err(Self::lock_error)?;
        Ok(history.entries().cloned().collect())
    }

    /// 生成 KPI 模板
    ///
    /// # 参数
    /// - live: true 时导出该事业部当前指标值；无数据时仍生成占位行
    pub async fn generate_kpi_template(
        &self,
        output_path: &Path,
        business_unit: BusinessUnit,
        live: bool,
    ) -> ApiResult<usize> {
        let live_metrics: Vec<KpiMetricRecord> = if live {
            self.kpi_repo
                .list_by_business_unit(business_unit)
                .await?
                .into_iter()
                .map(|m| m.record)
                .collect()
        } else {
            Vec::new()
        };
        Ok(generate_kpi_template(output_path, business_unit, &live_metrics)?)
    }

    /// 生成员工模板
    pub fn generate_employee_template(&self, output_path: &Path) -> ApiResult<()> {
        Ok(generate_employee_template(output_path)?)
    }
}
