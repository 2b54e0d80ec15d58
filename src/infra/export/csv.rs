use anyhow::{Context, Result};

use crate::domain::entities::export::ExportColumn;
use crate::domain::entities::row::TableRow;

/// Header row from the column labels, then one record per row. The writer
/// quotes fields containing separators, quotes or line breaks.
pub fn write_csv<T: TableRow>(rows: &[T], columns: &[ExportColumn]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|column| column.label.as_str()))
        .context("failed to write csv header")?;

    for (idx, row) in rows.iter().enumerate() {
        let record: Vec<String> = columns
            .iter()
            .map(|column| row.cell(&column.id).display())
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("failed to write csv row {idx}"))?;
    }

    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv output: {}", err.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::row::{CellValue, RowId};

    struct Note {
        id: i64,
        body: Option<String>,
    }

    impl TableRow for Note {
        fn row_id(&self) -> RowId {
            RowId::from(self.id)
        }

        fn cell(&self, column_id: &str) -> CellValue {
            match column_id {
                "id" => self.id.into(),
                "body" => self.body.clone().into(),
                _ => CellValue::Empty,
            }
        }
    }

    fn columns() -> Vec<ExportColumn> {
        vec![
            ExportColumn {
                id: "id".to_string(),
                label: "ID".to_string(),
                width: 15.0,
            },
            ExportColumn {
                id: "body".to_string(),
                label: "Body".to_string(),
                width: 15.0,
            },
        ]
    }

    #[test]
    fn quotes_only_when_needed() {
        let rows = vec![
            Note {
                id: 1,
                body: Some("a,\"b\"".to_string()),
            },
            Note { id: 2, body: None },
            Note {
                id: 3,
                body: Some("plain".to_string()),
            },
        ];

        let bytes = write_csv(&rows, &columns()).expect("should write csv");
        let text = String::from_utf8(bytes).expect("should be utf-8");

        assert_eq!(text, "ID,Body\n1,\"a,\"\"b\"\"\"\n2,\n3,plain\n");
    }
}
