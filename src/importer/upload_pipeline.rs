// ==========================================
// 经营看板数据导入系统 - 上传管道
// ==========================================
// 流程: 文件解析 → 表头识别 → 逐行(校验 → 标准化 → 落库) → 汇总
// 红线:
// - 解析/表头错误在任何写入之前返回 Err
// - 已知记录快照在批次开始时读取一次
// - 行级问题只影响该行
// ==========================================

use crate::domain::types::{DuplicatePolicy, ValidationMode};
use crate::domain::upload::{AcceptedRow, UploadSummary};
use crate::identity::IdentityProvisioner;
use crate::importer::cancel::CancelHandle;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::importer::importer_trait::{FileParser, ImportProfile};
use crate::importer::result_reporter::ResultReporter;
use crate::importer::row_validator::{RowValidator, WriteIntent};
use crate::importer::schema_detector::SchemaDetector;
use crate::importer::upsert_dispatcher::{DispatchOutcome, UpsertDispatcher};
use crate::repository::record_store::RecordStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 单次上传的运行参数（来自配置）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub mode: ValidationMode,
    pub duplicate_policy: DuplicatePolicy,
}

pub struct UploadPipeline {
    parser: Arc<dyn FileParser>,
    store: Arc<dyn RecordStore>,
    dispatcher: UpsertDispatcher,
}

impl UploadPipeline {
    pub fn new(
        parser: Arc<dyn FileParser>,
        store: Arc<dyn RecordStore>,
        provisioner: Arc<dyn IdentityProvisioner>,
    ) -> Self {
        Self {
            parser,
            dispatcher: UpsertDispatcher::new(store.clone(), provisioner),
            store,
        }
    }

    /// 执行一次上传
    ///
    /// # 返回
    /// - Ok(UploadSummary): 批次已处理（可能含行级错误或被取消）
    /// - Err: ParseError / SchemaError / 已知记录读取失败，未发生任何写入
    #[instrument(skip(self, profile, file_path, cancel), fields(kind = %profile.kind(), file = %file_path.display()))]
    pub async fn run(
        &self,
        profile: &dyn ImportProfile,
        file_path: &Path,
        options: PipelineOptions,
        cancel: &CancelHandle,
    ) -> ImportResult<UploadSummary> {
        // === 阶段 1: 解析 + 表头识别（致命错误直接返回）===
        let sheet = self.parser.parse_rows(file_path)?;
        let layout = SchemaDetector::detect(profile, &sheet.header)?;
        let known = self.store.load_known(profile.store_scope()).await?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        let mut reporter = ResultReporter::new(profile.kind(), file_name);
        reporter.set_total_rows(sheet.rows.len());
        let mut validator = RowValidator::new(profile, known, options.duplicate_policy);
        let cleaner = DataCleaner::new(options.mode);

        info!(
            upload_id = %reporter.upload_id(),
            rows = sheet.rows.len(),
            mode = %options.mode,
            duplicate_policy = %options.duplicate_policy,
            "开始处理上传"
        );

        // === 阶段 2: 逐行处理（严格串行）===
        for row in &sheet.rows {
            let identifier = profile.identifier_of(row, &layout);

            if cancel.is_cancelled() {
                reporter.mark_cancelled();
                reporter.record_failure(UpsertDispatcher::cancelled_error(row.row_number, identifier));
                continue;
            }

            let intent = match validator.check(row, &layout) {
                Ok(intent) => intent,
                Err(e) => {
                    debug!(row_number = row.row_number, error = %e.message, "行校验未通过");
                    reporter.record_failure(e);
                    continue;
                }
            };

            let record = match profile.normalize(row, &layout, &cleaner) {
                Ok(record) => record,
                Err(mut e) => {
                    if e.identifier.is_none() {
                        e.identifier = identifier.map(str::to_string);
                    }
                    debug!(row_number = row.row_number, error = %e.message, "行标准化失败");
                    reporter.record_failure(e);
                    continue;
                }
            };
            validator.accept(row, &layout);

            let accepted = AcceptedRow {
                row_number: row.row_number,
                record,
                is_update: intent == WriteIntent::Update,
            };
            match self.dispatcher.dispatch(&accepted, cancel).await {
                DispatchOutcome::Created(provisioning) => {
                    reporter.record_success(WriteIntent::Create);
                    if let Some(outcome) = provisioning {
                        reporter.record_provisioning(outcome);
                    }
                }
                DispatchOutcome::Updated => reporter.record_success(WriteIntent::Update),
                DispatchOutcome::Failed(e) => reporter.record_failure(e),
                DispatchOutcome::Cancelled(e) => {
                    reporter.mark_cancelled();
                    reporter.record_failure(e);
                }
            }
        }

        // === 阶段 3: 汇总 ===
        let summary = reporter.finish();
        if summary.cancelled {
            warn!(upload_id = %summary.upload_id, successful = summary.successful_imports, "上传已取消");
        }
        info!(
            upload_id = %summary.upload_id,
            total = summary.total_rows,
            successful = summary.successful_imports,
            failed = summary.failed_imports,
            elapsed_ms = summary.elapsed_ms,
            "上传处理完成"
        );
        Ok(summary)
    }
}
