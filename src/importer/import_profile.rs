// ==========================================
// 经营看板数据导入系统 - 记录族导入画像
// ==========================================
// 职责: KPI 指标 / 员工档案 的字段词表与行标准化规则
// 字段键与 KnownRecords 的字段键保持一致（唯一性检查直接复用）
// ==========================================

use crate::domain::employee::EmployeeRecord;
use crate::domain::kpi::{KpiMetricRecord, MONTHS_PER_YEAR, MONTH_LABELS};
use crate::domain::types::{BusinessUnit, MetricUnit, RecordKind, Role};
use crate::domain::upload::{ColumnLayout, NormalizedRecord, RawRow, RowErrorKind, ValidationError};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::importer_trait::{FieldSpec, ImportProfile, MonthSpan};
use crate::repository::record_store::{
    StoreScope, EMPLOYEE_CODE_FIELD, EMPLOYEE_EMAIL_FIELD, KPI_NAME_FIELD,
};

// ==========================================
// KPI 指标画像
// ==========================================
pub const KPI_DATA_TYPE_FIELD: &str = "data_type";

const KPI_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        KPI_NAME_FIELD,
        "Metric Name",
        &["metric name", "kpi name", "metric", "kpi", "indicator", "name"],
    )
    .unique(),
    FieldSpec::required(KPI_DATA_TYPE_FIELD, "Data Type", &["data type", "type", "unit"])
        .blank_allowed(),
    FieldSpec::optional("target", "Target", &["target", "goal"]),
    FieldSpec::optional("category", "Category", &["category", "group"]),
];

/// 上传时选定事业部，整个文件的指标都归属该事业部
#[derive(Debug, Clone, Copy)]
pub struct KpiImportProfile {
    business_unit: BusinessUnit,
}

impl KpiImportProfile {
    pub fn new(business_unit: BusinessUnit) -> Self {
        Self { business_unit }
    }

    pub fn business_unit(&self) -> BusinessUnit {
        self.business_unit
    }
}

impl ImportProfile for KpiImportProfile {
    fn kind(&self) -> RecordKind {
        RecordKind::KpiMetric
    }

    fn fields(&self) -> &[FieldSpec] {
        KPI_FIELDS
    }

    fn month_span(&self) -> Option<MonthSpan> {
        Some(MonthSpan {
            start_field: KPI_NAME_FIELD,
            end_field: KPI_DATA_TYPE_FIELD,
        })
    }

    fn store_scope(&self) -> StoreScope {
        StoreScope::Kpi {
            business_unit: self.business_unit,
        }
    }

    fn normalize(
        &self,
        row: &RawRow,
        layout: &ColumnLayout,
        cleaner: &DataCleaner,
    ) -> Result<NormalizedRecord, ValidationError> {
        let row_number = row.row_number;

        // 未上传的月份保持 0
        let mut monthly_values = [0.0; MONTHS_PER_YEAR];
        for (slot, &column) in layout.month_columns().iter().enumerate().take(MONTHS_PER_YEAR) {
            monthly_values[slot] = cleaner.number(row_number, MONTH_LABELS[slot], row.cell(column))?;
        }

        let unit = cleaner.vocab(
            row_number,
            "Data Type",
            layout.cell(row, KPI_DATA_TYPE_FIELD),
            MetricUnit::from_vocab,
            MetricUnit::default(),
        )?;

        Ok(NormalizedRecord::Kpi(KpiMetricRecord {
            business_unit: self.business_unit,
            name: layout.cell(row, KPI_NAME_FIELD).unwrap_or_default().to_string(),
            monthly_values,
            target: cleaner.optional_number(row_number, "Target", layout.cell(row, "target"))?,
            unit,
            category: cleaner.normalize_null(layout.cell(row, "category")),
        }))
    }
}

// ==========================================
// 员工档案画像
// ==========================================
const EMPLOYEE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        EMPLOYEE_CODE_FIELD,
        "Employee_Code",
        &["employee code", "emp code", "employee id", "employee no", "staff code"],
    )
    .unique(),
    FieldSpec::required("first_name", "First_Name", &["first name", "firstname", "given name", "forename"]),
    FieldSpec::required("last_name", "Last_Name", &["last name", "lastname", "surname", "family name"]),
    // 先于 email 认领，避免 "Manager_Email" 被当成员工邮箱
    FieldSpec::optional("manager_email", "Manager_Email", &["manager email", "manager", "reports to"]),
    FieldSpec::required(EMPLOYEE_EMAIL_FIELD, "Email", &["email", "e mail", "mail"]).unique(),
    FieldSpec::optional("job_title", "Job_Title", &["job title", "title", "position", "designation"]),
    FieldSpec::optional("department", "Department", &["department", "dept"]),
    FieldSpec::optional(
        "business_unit",
        "Business_Unit_Code",
        &["business unit code", "business unit", "bu code"],
    ),
    FieldSpec::optional("hire_date", "Hire_Date", &["hire date", "joining date", "start date", "date of joining"]),
    FieldSpec::optional("role", "Role", &["role", "level", "grade"]),
    FieldSpec::optional("phone", "Phone", &["phone", "mobile", "contact number"]),
    FieldSpec::optional("location", "Location", &["location", "office", "city"]),
    FieldSpec::optional("is_active", "Is_Active", &["is active", "active", "status"]),
];

/// 员工导入的默认值（来自配置）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeDefaults {
    pub role: Role,
    pub business_unit: BusinessUnit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmployeeImportProfile {
    defaults: EmployeeDefaults,
}

impl EmployeeImportProfile {
    pub fn new(defaults: EmployeeDefaults) -> Self {
        Self { defaults }
    }
}

impl ImportProfile for EmployeeImportProfile {
    fn kind(&self) -> RecordKind {
        RecordKind::Employee
    }

    fn fields(&self) -> &[FieldSpec] {
        EMPLOYEE_FIELDS
    }

    fn store_scope(&self) -> StoreScope {
        StoreScope::Employee
    }

    fn normalize(
        &self,
        row: &RawRow,
        layout: &ColumnLayout,
        cleaner: &DataCleaner,
    ) -> Result<NormalizedRecord, ValidationError> {
        let row_number = row.row_number;
        let text = |field: &str| cleaner.normalize_null(layout.cell(row, field));

        let email = cleaner
            .email(layout.cell(row, EMPLOYEE_EMAIL_FIELD))
            .unwrap_or_default();
        if cleaner.is_strict() && !email.contains('@') {
            return Err(ValidationError::new(
                row_number,
                RowErrorKind::InvalidValue,
                format!("Email 取值非法: '{}'", email),
            )
            .with_field("Email"));
        }

        let business_unit = cleaner.vocab(
            row_number,
            "Business_Unit_Code",
            layout.cell(row, "business_unit"),
            BusinessUnit::from_vocab,
            self.defaults.business_unit,
        )?;
        let role = cleaner.vocab(
            row_number,
            "Role",
            layout.cell(row, "role"),
            Role::from_vocab,
            self.defaults.role,
        )?;
        let is_active = cleaner.active_flag(row_number, "Is_Active", layout.cell(row, "is_active"))?;

        Ok(NormalizedRecord::Employee(EmployeeRecord {
            employee_code: text(EMPLOYEE_CODE_FIELD).unwrap_or_default(),
            first_name: text("first_name").unwrap_or_default(),
            last_name: text("last_name").unwrap_or_default(),
            email,
            job_title: text("job_title"),
            department: text("department"),
            business_unit,
            manager_email: cleaner.email(layout.cell(row, "manager_email")),
            hire_date: text("hire_date"),
            role,
            is_active,
            phone: text("phone"),
            location: text("location"),
        }))
    }
}
