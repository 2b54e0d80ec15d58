use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::column::ColumnDescriptor;

pub const FALLBACK_COLUMN_WIDTH: f64 = 150.0;
pub const MIN_COLUMN_WIDTH: f64 = 40.0;

pub type ColumnSizing = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub sizing: ColumnSizing,
    pub order: Vec<String>,
}

/// Initial widths for a column set: the descriptor's hint, else a width
/// proportional to the header label, never narrower than the minimum.
pub fn default_sizing(columns: &[ColumnDescriptor]) -> ColumnSizing {
    columns
        .iter()
        .map(|column| {
            let width = column.default_width.unwrap_or_else(|| {
                let label_width = column.label().chars().count() as f64 * 9.0 + 32.0;
                label_width.max(FALLBACK_COLUMN_WIDTH)
            });
            (column.id.clone(), width.max(MIN_COLUMN_WIDTH))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizing_prefers_hints() {
        let columns = vec![
            ColumnDescriptor::select(),
            ColumnDescriptor::data("name", "Name").with_width(220.0),
            ColumnDescriptor::data("email", "Email"),
        ];

        let sizing = default_sizing(&columns);

        assert_eq!(sizing.get("select"), Some(&40.0));
        assert_eq!(sizing.get("name"), Some(&220.0));
        assert_eq!(sizing.get("email"), Some(&FALLBACK_COLUMN_WIDTH));
    }
}
