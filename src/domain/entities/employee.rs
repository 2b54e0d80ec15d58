use crate::domain::entities::column::ColumnDescriptor;
use crate::domain::entities::row::{CellValue, RowId, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeStatus::Active => "Active",
            EmployeeStatus::Inactive => "Inactive",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("inactive") {
            EmployeeStatus::Inactive
        } else {
            EmployeeStatus::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub join_date: String,
    pub efficiency: i64,
    pub monthly_salary: f64,
    pub status: EmployeeStatus,
    pub created_at: String,
}

impl TableRow for Employee {
    fn row_id(&self) -> RowId {
        RowId::from(self.id)
    }

    fn cell(&self, column_id: &str) -> CellValue {
        match column_id {
            "id" => self.id.into(),
            "employee_code" => self.employee_code.as_str().into(),
            "name" => self.name.as_str().into(),
            "email" => self.email.as_str().into(),
            "role" => self.role.as_str().into(),
            "join_date" => self.join_date.as_str().into(),
            "efficiency" => self.efficiency.into(),
            "monthly_salary" => self.monthly_salary.into(),
            "status" => self.status.as_str().into(),
            "created_at" => self.created_at.as_str().into(),
            _ => CellValue::Empty,
        }
    }
}

/// Columns of the employee directory screen, in default display order.
pub fn employee_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::select(),
        ColumnDescriptor::data("employee_code", "Employee ID").with_width(120.0),
        ColumnDescriptor::data("name", "Name").with_width(180.0),
        ColumnDescriptor::data("email", "Email").with_width(240.0),
        ColumnDescriptor::data("role", "Role").with_width(200.0),
        ColumnDescriptor::data("join_date", "Join Date").with_width(120.0),
        ColumnDescriptor::data("efficiency", "Efficiency (%)").with_width(110.0),
        ColumnDescriptor::data("monthly_salary", "Monthly Salary").with_width(140.0),
        ColumnDescriptor::data("status", "Status").with_width(100.0),
        ColumnDescriptor::actions(),
    ]
}
