use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use crate::domain::entities::export::ExportColumn;
use crate::domain::entities::row::{CellValue, TableRow};

pub const SHEET_NAME: &str = "Data";

/// Single-sheet workbook: bold header row, typed cells, width hints.
pub fn write_xlsx<T: TableRow>(rows: &[T], columns: &[ExportColumn]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .context("failed to name worksheet")?;

    for (col, column) in columns.iter().enumerate() {
        let col = u16::try_from(col).context("too many columns for a worksheet")?;
        worksheet
            .set_column_width(col, column.width)
            .with_context(|| format!("failed to size column {}", column.id))?;
        worksheet
            .write_string_with_format(0, col, &column.label, &header)
            .with_context(|| format!("failed to write header {}", column.label))?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let line = u32::try_from(idx + 1).context("too many rows for a worksheet")?;
        for (col, column) in columns.iter().enumerate() {
            let col = col as u16;
            let written = match row.cell(&column.id) {
                CellValue::Empty => continue,
                CellValue::Text(value) => worksheet.write_string(line, col, value),
                CellValue::Integer(value) => worksheet.write_number(line, col, value as f64),
                CellValue::Number(value) => worksheet.write_number(line, col, value),
                CellValue::Bool(value) => worksheet.write_boolean(line, col, value),
            };
            written.with_context(|| format!("failed to write cell {line}:{}", column.id))?;
        }
    }

    workbook
        .save_to_buffer()
        .context("failed to serialize workbook")
}
