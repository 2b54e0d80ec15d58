/// Synthetic columns never reach an export and cannot be hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Data,
    Select,
    Actions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub id: String,
    pub header: Option<String>,
    pub kind: ColumnKind,
    pub default_width: Option<f64>,
    pub resizable: bool,
    pub hideable: bool,
    pub sortable: bool,
}

impl ColumnDescriptor {
    pub fn data(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: Some(header.into()),
            kind: ColumnKind::Data,
            default_width: None,
            resizable: true,
            hideable: true,
            sortable: true,
        }
    }

    pub fn select() -> Self {
        Self {
            id: "select".to_string(),
            header: None,
            kind: ColumnKind::Select,
            default_width: Some(40.0),
            resizable: false,
            hideable: false,
            sortable: false,
        }
    }

    pub fn actions() -> Self {
        Self {
            id: "actions".to_string(),
            header: None,
            kind: ColumnKind::Actions,
            default_width: Some(80.0),
            resizable: false,
            hideable: false,
            sortable: false,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.default_width = Some(width);
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn is_synthetic(&self) -> bool {
        !matches!(self.kind, ColumnKind::Data)
    }

    pub fn label(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }
}

/// Orders `columns` by a persisted order list. IDs missing from `order` keep
/// their relative position after the ordered ones.
pub fn apply_column_order<'a>(
    columns: &'a [ColumnDescriptor],
    order: &[String],
) -> Vec<&'a ColumnDescriptor> {
    let mut ordered: Vec<&ColumnDescriptor> = columns.iter().collect();
    if order.is_empty() {
        return ordered;
    }
    ordered.sort_by_key(|column| {
        order
            .iter()
            .position(|id| id == &column.id)
            .unwrap_or(usize::MAX)
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_columns_keep_position_after_ordered_ones() {
        let columns = vec![
            ColumnDescriptor::data("name", "Name"),
            ColumnDescriptor::data("email", "Email"),
            ColumnDescriptor::data("role", "Role"),
        ];
        let order = vec!["role".to_string(), "name".to_string()];

        let ids: Vec<&str> = apply_column_order(&columns, &order)
            .iter()
            .map(|c| c.id.as_str())
            .collect();

        assert_eq!(ids, vec!["role", "name", "email"]);
    }
}
