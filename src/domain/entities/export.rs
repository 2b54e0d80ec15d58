use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::entities::column::{apply_column_order, ColumnDescriptor};

pub const DEFAULT_EXPORT_WIDTH: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Excel => "Excel",
        }
    }
}

/// One exported column: source ID, header label and an Excel width hint in
/// characters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportColumn {
    pub id: String,
    pub label: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Caller-supplied header names and width hints keyed by column ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportMapping {
    pub entity_name: String,
    pub labels: BTreeMap<String, String>,
    pub widths: BTreeMap<String, f64>,
}

impl ExportMapping {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, column_id: &str, label: &str) -> Self {
        self.labels.insert(column_id.to_string(), label.to_string());
        self
    }

    pub fn width(mut self, column_id: &str, width: f64) -> Self {
        self.widths.insert(column_id.to_string(), width);
        self
    }
}

/// Columns that take part in an export: visible, in display order, without
/// the synthetic selection and action columns.
pub fn export_columns(
    columns: &[ColumnDescriptor],
    is_visible: impl Fn(&str) -> bool,
    order: &[String],
    mapping: &ExportMapping,
) -> Vec<ExportColumn> {
    apply_column_order(columns, order)
        .into_iter()
        .filter(|column| !column.is_synthetic() && is_visible(&column.id))
        .map(|column| ExportColumn {
            id: column.id.clone(),
            label: mapping
                .labels
                .get(&column.id)
                .cloned()
                .unwrap_or_else(|| column.label().to_string()),
            width: mapping
                .widths
                .get(&column.id)
                .copied()
                .unwrap_or(DEFAULT_EXPORT_WIDTH),
        })
        .collect()
}

/// `<entity>-export-<timestamp>.<ext>` with `:` and `.` in the timestamp
/// replaced so the name is valid on every filesystem.
pub fn export_file_name(entity_name: &str, format: ExportFormat, at: DateTime<Utc>) -> String {
    let entity = if entity_name.trim().is_empty() {
        "items"
    } else {
        entity_name.trim()
    };
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{entity}-export-{timestamp}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn export_columns_follow_visibility_and_order() {
        let columns = vec![
            ColumnDescriptor::select(),
            ColumnDescriptor::data("name", "Name"),
            ColumnDescriptor::data("email", "Email"),
            ColumnDescriptor::data("role", "Role"),
            ColumnDescriptor::actions(),
        ];
        let order = vec!["role".to_string(), "select".to_string(), "name".to_string()];
        let mapping = ExportMapping::new("employees")
            .label("role", "Job Title")
            .width("name", 30.0);

        let exported = export_columns(&columns, |id| id != "email", &order, &mapping);

        assert_eq!(
            exported,
            vec![
                ExportColumn {
                    id: "role".to_string(),
                    label: "Job Title".to_string(),
                    width: DEFAULT_EXPORT_WIDTH,
                },
                ExportColumn {
                    id: "name".to_string(),
                    label: "Name".to_string(),
                    width: 30.0,
                },
            ]
        );
    }

    #[test]
    fn file_name_uses_filesystem_safe_timestamp() {
        let at = Utc
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
            .single()
            .expect("valid timestamp");

        assert_eq!(
            export_file_name("employees", ExportFormat::Csv, at),
            "employees-export-2024-03-05T14-07-09-000Z.csv"
        );
        assert_eq!(
            export_file_name("", ExportFormat::Excel, at),
            "items-export-2024-03-05T14-07-09-000Z.xlsx"
        );
    }
}
