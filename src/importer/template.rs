// ==========================================
// 经营看板数据导入系统 - 导入模板生成
// ==========================================
// 职责: 生成可直接回传的 xlsx 模板（表头与导入识别规则一致）
// KPI: 有线上数据时导出当前值，否则按事业部示例指标生成全 0 占位行
// ==========================================

use crate::domain::kpi::{KpiMetricRecord, MONTHS_PER_YEAR, MONTH_LABELS};
use crate::domain::types::{BusinessUnit, MetricUnit};
use crate::importer::error::ImportResult;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::info;

pub const EMPLOYEE_TEMPLATE_HEADER: [&str; 13] = [
    "Employee_Code",
    "First_Name",
    "Last_Name",
    "Email",
    "Job_Title",
    "Department",
    "Business_Unit_Code",
    "Manager_Email",
    "Hire_Date",
    "Role",
    "Phone",
    "Location",
    "Is_Active",
];

const EMPLOYEE_SAMPLE_ROW: [&str; 13] = [
    "EMP001",
    "Jane",
    "Doe",
    "jane.doe@example.com",
    "Sales Manager",
    "Sales",
    "sales",
    "manager@example.com",
    "2024-01-15",
    "Manager",
    "+1-555-0100",
    "New York",
    "Yes",
];

/// KPI 模板表头: Metric Name | Jan..Dec | Data Type | Target | Category
pub fn kpi_template_header() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(MONTHS_PER_YEAR + 4);
    header.push("Metric Name");
    header.extend(MONTH_LABELS.iter().copied());
    header.extend(["Data Type", "Target", "Category"]);
    header
}

fn write_header(sheet: &mut Worksheet, header: &[&str]) -> ImportResult<()> {
    let bold = Format::new().set_bold();
    for (col, title) in header.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
        sheet.set_column_width(col as u16, (title.len().max(10) + 2) as f64)?;
    }
    Ok(())
}

/// 生成 KPI 模板
///
/// # 返回
/// - Ok(行数): 写入的数据行数（不含表头）
pub fn generate_kpi_template(
    path: &Path,
    business_unit: BusinessUnit,
    live_metrics: &[KpiMetricRecord],
) -> ImportResult<usize> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(format!("{} KPI", business_unit.code()))?;
    write_header(sheet, &kpi_template_header())?;

    let target_col = (MONTHS_PER_YEAR + 2) as u16;
    let rows = if live_metrics.is_empty() {
        for (idx, name) in business_unit.sample_metrics().iter().enumerate() {
            let row = (idx + 1) as u32;
            sheet.write_string(row, 0, *name)?;
            for month in 0..MONTHS_PER_YEAR {
                sheet.write_number(row, (month + 1) as u16, 0.0)?;
            }
            sheet.write_string(row, (MONTHS_PER_YEAR + 1) as u16, MetricUnit::Number.as_str())?;
            sheet.write_number(row, target_col, 0.0)?;
        }
        business_unit.sample_metrics().len()
    } else {
        for (idx, metric) in live_metrics.iter().enumerate() {
            let row = (idx + 1) as u32;
            sheet.write_string(row, 0, metric.name.as_str())?;
            for (month, value) in metric.monthly_values.iter().enumerate() {
                sheet.write_number(row, (month + 1) as u16, *value)?;
            }
            sheet.write_string(row, (MONTHS_PER_YEAR + 1) as u16, metric.unit.as_str())?;
            if let Some(target) = metric.target {
                sheet.write_number(row, target_col, target)?;
            }
            if let Some(category) = &metric.category {
                sheet.write_string(row, target_col + 1, category.as_str())?;
            }
        }
        live_metrics.len()
    };

    workbook.save(path)?;
    info!(path = %path.display(), business_unit = %business_unit, rows, live = !live_metrics.is_empty(), "KPI 模板已生成");
    Ok(rows)
}

/// 生成员工模板（表头 + 一行示例）
pub fn generate_employee_template(path: &Path) -> ImportResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Employees")?;
    write_header(sheet, &EMPLOYEE_TEMPLATE_HEADER)?;
    for (col, value) in EMPLOYEE_SAMPLE_ROW.iter().enumerate() {
        sheet.write_string(1, col as u16, *value)?;
    }
    workbook.save(path)?;
    info!(path = %path.display(), "员工模板已生成");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::UniversalFileParser;
    use crate::importer::import_profile::{EmployeeImportProfile, KpiImportProfile};
    use crate::importer::importer_trait::FileParser;
    use crate::importer::schema_detector::SchemaDetector;
    use tempfile::tempdir;

    #[test]
    fn test_placeholder_kpi_template_is_importable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hr_template.xlsx");

        let rows = generate_kpi_template(&path, BusinessUnit::Hr, &[]).unwrap();
        assert_eq!(rows, BusinessUnit::Hr.sample_metrics().len());

        let sheet = UniversalFileParser.parse_rows(&path).unwrap();
        let layout = SchemaDetector::detect(&KpiImportProfile::new(BusinessUnit::Hr), &sheet.header).unwrap();
        assert_eq!(layout.month_columns().len(), MONTHS_PER_YEAR);
        assert_eq!(sheet.rows[0].cell(0), Some("Headcount"));
        assert_eq!(sheet.rows[0].cell(1), Some("0"));
    }

    #[test]
    fn test_live_kpi_template_exports_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales_template.xlsx");
        let mut monthly_values = [0.0; MONTHS_PER_YEAR];
        monthly_values[0] = 1500.0;
        let metric = KpiMetricRecord {
            business_unit: BusinessUnit::Sales,
            name: "Revenue".to_string(),
            monthly_values,
            target: Some(20000.0),
            unit: MetricUnit::Currency,
            category: Some("Growth".to_string()),
        };

        assert_eq!(generate_kpi_template(&path, BusinessUnit::Sales, &[metric]).unwrap(), 1);
        let sheet = UniversalFileParser.parse_rows(&path).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].cell(1), Some("1500"));
        assert_eq!(sheet.rows[0].cell(13), Some("currency"));
        assert_eq!(sheet.rows[0].cell(15), Some("Growth"));
    }

    #[test]
    fn test_employee_template_header_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("employees.xlsx");
        generate_employee_template(&path).unwrap();

        let sheet = UniversalFileParser.parse_rows(&path).unwrap();
        let layout = SchemaDetector::detect(&EmployeeImportProfile::default(), &sheet.header).unwrap();
        assert_eq!(layout.index_of("business_unit"), Some(6));
        assert_eq!(layout.index_of("manager_email"), Some(7));
        assert_eq!(sheet.rows.len(), 1);
    }
}
