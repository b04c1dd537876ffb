// ==========================================
// 经营看板数据导入系统 - 上传结果汇总
// ==========================================
// 职责: 累计行数 / 成功 / 失败 / 错误明细，生成不可变的 UploadSummary
// 不变式: successful_imports + failed_imports == total_rows
// ==========================================

use crate::domain::types::RecordKind;
use crate::domain::upload::{ProvisioningOutcome, RowErrorKind, UploadSummary, ValidationError};
use crate::i18n::{t, t_with_args};
use crate::importer::row_validator::WriteIntent;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

pub struct ResultReporter {
    upload_id: String,
    kind: RecordKind,
    file_name: Option<String>,
    total_rows: usize,
    successful: usize,
    failed: usize,
    created: usize,
    updated: usize,
    errors: Vec<ValidationError>,
    provisioning: Vec<ProvisioningOutcome>,
    cancelled: bool,
    started_at: DateTime<Utc>,
}

impl ResultReporter {
    pub fn new(kind: RecordKind, file_name: Option<String>) -> Self {
        Self {
            upload_id: Uuid::new_v4().to_string(),
            kind,
            file_name,
            total_rows: 0,
            successful: 0,
            failed: 0,
            created: 0,
            updated: 0,
            errors: Vec::new(),
            provisioning: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
        }
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn set_total_rows(&mut self, total_rows: usize) {
        self.total_rows = total_rows;
    }

    pub fn record_success(&mut self, intent: WriteIntent) {
        self.successful += 1;
        match intent {
            WriteIntent::Create => self.created += 1,
            WriteIntent::Update => self.updated += 1,
        }
    }

    pub fn record_failure(&mut self, error: ValidationError) {
        self.failed += 1;
        self.errors.push(error);
    }

    pub fn record_provisioning(&mut self, outcome: ProvisioningOutcome) {
        self.provisioning.push(outcome);
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn finish(mut self) -> UploadSummary {
        if self.successful + self.failed != self.total_rows {
            warn!(
                upload_id = %self.upload_id,
                total_rows = self.total_rows,
                successful = self.successful,
                failed = self.failed,
                "行数统计不一致，按已处理行数修正"
            );
            self.total_rows = self.successful + self.failed;
        }

        // 稳定排序，同一行的多条错误保持产生顺序
        self.errors.sort_by_key(|e| e.row_number);
        let uploaded_at = Utc::now();

        UploadSummary {
            upload_id: self.upload_id,
            kind: self.kind,
            file_name: self.file_name,
            total_rows: self.total_rows,
            successful_imports: self.successful,
            failed_imports: self.failed,
            created: self.created,
            updated: self.updated,
            errors: self.errors,
            provisioning: self.provisioning,
            cancelled: self.cancelled,
            started_at: self.started_at,
            uploaded_at,
            elapsed_ms: (uploaded_at - self.started_at).num_milliseconds(),
        }
    }
}

fn kind_key(kind: RowErrorKind) -> &'static str {
    match kind {
        RowErrorKind::MissingField => "report.kind.missing_field",
        RowErrorKind::Duplicate => "report.kind.duplicate",
        RowErrorKind::InvalidValue => "report.kind.invalid_value",
        RowErrorKind::WriteFailed => "report.kind.write_failed",
        RowErrorKind::Cancelled => "report.kind.cancelled",
    }
}

/// 每条行级错误渲染为一行本地化提示，之后是开通失败的员工
///
/// 开通被停用（无错误信息）的行不提示
pub fn display_messages(summary: &UploadSummary) -> Vec<String> {
    let row_errors = summary.errors.iter().map(|e| {
        let row = e.row_number.to_string();
        let kind = t(kind_key(e.kind));
        t_with_args(
            "report.row_error",
            &[("row", row.as_str()), ("kind", kind.as_str()), ("message", e.message.as_str())],
        )
    });
    let provisioning = summary
        .provisioning
        .iter()
        .filter(|p| !p.is_complete())
        .filter_map(|p| {
            let message = p.error.as_deref()?;
            let row = p.row_number.to_string();
            Some(t_with_args(
                "report.provisioning_incomplete",
                &[("row", row.as_str()), ("code", p.employee_code.as_str()), ("message", message)],
            ))
        });
    row_errors.chain(provisioning).collect()
}

/// 汇总行
pub fn summary_line(summary: &UploadSummary) -> String {
    let key = if summary.cancelled {
        "report.summary_cancelled"
    } else {
        "report.summary"
    };
    let total = summary.total_rows.to_string();
    let success = summary.successful_imports.to_string();
    let failed = summary.failed_imports.to_string();
    t_with_args(
        key,
        &[("total", total.as_str()), ("success", success.as_str()), ("failed", failed.as_str())],
    )
}
