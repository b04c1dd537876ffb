// ==========================================
// 经营看板数据导入系统 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx/.xlsm/.xls/.xlsb) / OpenDocument (.ods)
// 约定: 首行为表头；全空行跳过但不改变后续行的显示行号
// ==========================================

use crate::domain::upload::{ParsedSheet, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const CSV_EXTENSIONS: &[&str] = &["csv"];
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_readable(path: &Path, accepted: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let ext = extension_of(path);
    if !accepted.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

/// 表头为空（或全空）视为空文件
fn finish_sheet(header: Option<Vec<String>>, rows: Vec<RawRow>) -> ImportResult<ParsedSheet> {
    match header {
        Some(header) if header.iter().any(|h| !h.is_empty()) => Ok(ParsedSheet { header, rows }),
        _ => Err(ImportError::EmptyFile),
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
// 引号内的逗号/换行按 RFC 4180 处理
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_readable(file_path, CSV_EXTENSIONS)?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (record_idx, result) in reader.records().enumerate() {
            let record = result?;
            // 行号取记录起始的物理行，空行被 csv 跳过时仍保持原位
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(record_idx + 1);
            let cells: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            if header.is_none() {
                let mut cells = cells;
                if let Some(first) = cells.first_mut() {
                    *first = first.trim_start_matches('\u{feff}').trim().to_string();
                }
                header = Some(cells);
                continue;
            }

            let row = RawRow::new(row_number, cells);
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        debug!(file = %file_path.display(), rows = rows.len(), "CSV 解析完成");
        finish_sheet(header, rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表
pub struct ExcelParser;

impl ExcelParser {
    /// 单元格 → 文本（整数值不带 ".0"，日期单元格输出 ISO 日期）
    fn render_cell(cell: &Data) -> String {
        match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.trim().to_string(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => Self::render_number(*f),
            Data::Bool(b) => b.to_string(),
            Data::DateTime(dt) => Self::render_serial_date(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
            Data::Error(e) => e.to_string(),
        }
    }

    fn render_number(value: f64) -> String {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            value.to_string()
        }
    }

    /// Excel 序列日期（1900 体系）→ ISO 文本
    ///
    /// 超出 chrono 可表示范围的序列值按普通数值输出
    fn render_serial_date(serial: f64) -> String {
        let seconds = (serial * 86_400.0).round() as i64;
        let datetime = NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .zip(Duration::try_seconds(seconds))
            .and_then(|(epoch, offset)| epoch.checked_add_signed(offset));
        let Some(datetime) = datetime else {
            debug!(serial, "日期序列值超出范围，按数值输出");
            return Self::render_number(serial);
        };
        if seconds % 86_400 == 0 {
            datetime.format("%Y-%m-%d").to_string()
        } else {
            datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_readable(file_path, WORKBOOK_EXTENSIONS)?;

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("工作簿中没有工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // 数据区可能不从 A1 开始，按绝对位置补齐行号与列偏移
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let pad = start_col as usize;

        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (idx, data_row) in range.rows().enumerate() {
            let mut cells = vec![String::new(); pad];
            cells.extend(data_row.iter().map(Self::render_cell));

            if header.is_none() {
                if cells.iter().all(|c| c.is_empty()) {
                    continue;
                }
                header = Some(cells);
                continue;
            }

            let row = RawRow::new(start_row as usize + idx + 1, cells);
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        debug!(file = %file_path.display(), sheet = %sheet_name, rows = rows.len(), "工作簿解析完成");
        finish_sheet(header, rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        let ext = extension_of(file_path);
        if CSV_EXTENSIONS.contains(&ext.as_str()) {
            CsvParser.parse_rows(file_path)
        } else if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            ExcelParser.parse_rows(file_path)
        } else if !file_path.exists() {
            Err(ImportError::FileNotFound(file_path.display().to_string()))
        } else {
            Err(ImportError::UnsupportedFormat(ext))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};
    use std::io::Write;
    use tempfile::{tempdir, Builder};

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_quoted_fields_and_bom() {
        let temp_file = csv_file(&[
            "\u{feff}Employee_Code,First_Name,Job_Title",
            "EMP001,Jane,\"Director, Sales\"",
        ]);

        let sheet = CsvParser.parse_rows(temp_file.path()).unwrap();
        assert_eq!(sheet.header[0], "Employee_Code");
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].row_number, 2);
        assert_eq!(sheet.rows[0].cell(2), Some("Director, Sales"));
    }

    #[test]
    fn test_csv_blank_rows_keep_numbering() {
        let temp_file = csv_file(&["Code,Name", "A,1", ",", "", "B,2"]);

        let sheet = CsvParser.parse_rows(temp_file.path()).unwrap();
        let numbers: Vec<usize> = sheet.rows.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![2, 5]);
    }

    #[test]
    fn test_csv_empty_file() {
        let temp_file = csv_file(&[]);
        let err = CsvParser.parse_rows(temp_file.path()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyFile));
    }

    #[test]
    fn test_file_not_found_and_unsupported() {
        let err = UniversalFileParser
            .parse_rows(Path::new("non_existent.csv"))
            .unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));

        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let err = UniversalFileParser.parse_rows(temp_file.path()).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_corrupt_workbook_is_parse_error() {
        let mut temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        writeln!(temp_file, "not a zip archive").unwrap();
        let err = UniversalFileParser.parse_rows(temp_file.path()).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_excel_first_sheet_numbers_rendered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kpi.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Metric Name").unwrap();
        sheet.write_string(0, 1, "Jan").unwrap();
        sheet.write_string(0, 2, "Data Type").unwrap();
        sheet.write_string(1, 0, "Revenue").unwrap();
        sheet.write_number(1, 1, 1200.0).unwrap();
        sheet.write_string(1, 2, "currency").unwrap();
        sheet.write_string(3, 0, "Win Rate").unwrap();
        sheet.write_number(3, 1, 0.25).unwrap();
        workbook.save(&path).unwrap();

        let sheet = UniversalFileParser.parse_rows(&path).unwrap();
        assert_eq!(sheet.header, vec!["Metric Name", "Jan", "Data Type"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].cell(1), Some("1200"));
        assert_eq!(sheet.rows[1].row_number, 4);
        assert_eq!(sheet.rows[1].cell(1), Some("0.25"));
    }

    #[test]
    fn test_excel_reads_only_first_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("employees.xlsx");

        let mut workbook = Workbook::new();
        let first = workbook.add_worksheet();
        first.set_name("Roster").unwrap();
        first.write_string(0, 0, "Employee_Code").unwrap();
        first.write_string(0, 1, "First_Name").unwrap();
        first.write_string(1, 0, "EMP001").unwrap();
        first.write_string(1, 1, "Ada").unwrap();

        let second = workbook.add_worksheet();
        second.set_name("Archive").unwrap();
        second.write_string(0, 0, "Metric Name").unwrap();
        second.write_string(0, 1, "Jan").unwrap();
        second.write_string(1, 0, "Revenue").unwrap();
        second.write_number(1, 1, 10.0).unwrap();
        second.write_string(2, 0, "Churn").unwrap();
        second.write_number(2, 1, 3.0).unwrap();
        workbook.save(&path).unwrap();

        let sheet = UniversalFileParser.parse_rows(&path).unwrap();
        assert_eq!(sheet.header, vec!["Employee_Code", "First_Name"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].cell(0), Some("EMP001"));
        assert!(sheet
            .rows
            .iter()
            .all(|r| r.cells.iter().all(|c| c != "Revenue" && c != "Churn")));
    }

    #[test]
    fn test_excel_out_of_range_date_serial_does_not_abort() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("employees.xlsx");

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Employee_Code").unwrap();
        sheet.write_string(0, 1, "Hire_Date").unwrap();
        sheet.write_string(1, 0, "EMP001").unwrap();
        sheet
            .write_number_with_format(1, 1, 100_000_000.0, &date_format)
            .unwrap();
        sheet.write_string(2, 0, "EMP002").unwrap();
        sheet
            .write_number_with_format(2, 1, 45352.0, &date_format)
            .unwrap();
        workbook.save(&path).unwrap();

        let sheet = UniversalFileParser.parse_rows(&path).unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].cell(1), Some("100000000"));
        assert_eq!(sheet.rows[1].cell(1), Some("2024-03-01"));
    }

    #[test]
    fn test_serial_date_rendering() {
        assert_eq!(ExcelParser::render_serial_date(45352.0), "2024-03-01");
        assert_eq!(ExcelParser::render_serial_date(100_000_000.0), "100000000");
        assert_eq!(
            ExcelParser::render_serial_date(1e300),
            ExcelParser::render_number(1e300)
        );
        assert_eq!(ExcelParser::render_serial_date(-1e18), "-1000000000000000000");
        assert_eq!(ExcelParser::render_number(3.0), "3");
        assert_eq!(ExcelParser::render_number(2.5), "2.5");
    }
}
