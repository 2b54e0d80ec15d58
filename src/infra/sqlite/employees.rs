use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{params, params_from_iter, types::Value};

use crate::domain::entities::employee::{Employee, EmployeeStatus};
use crate::domain::entities::query::{FetchParams, PageResult, SortOrder};
use crate::domain::entities::row::RowId;
use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::ports::fetch::{FetchByIds, FetchError, PageSource};

const EMPLOYEE_COLUMNS: &str = "id, employee_code, name, email, role, join_date, efficiency, \
     monthly_salary, status, created_at";

const FILTER_CLAUSE: &str = "
    (?1 = '' OR name LIKE ?2 ESCAPE '\\' OR email LIKE ?2 ESCAPE '\\'
        OR employee_code LIKE ?2 ESCAPE '\\' OR role LIKE ?2 ESCAPE '\\')
    AND (?3 = '' OR join_date >= ?3)
    AND (?4 = '' OR join_date <= ?4)";

/// Maps a requested sort key onto a real column; unknown keys sort by
/// creation time.
pub fn sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "id" => "id",
        "employee_code" => "employee_code",
        "name" => "name",
        "email" => "email",
        "role" => "role",
        "join_date" => "join_date",
        "efficiency" => "efficiency",
        "monthly_salary" => "monthly_salary",
        "status" => "status",
        _ => "created_at",
    }
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn employee_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Employee> {
    let status: String = row.get(8)?;
    Ok(Employee {
        id: row.get(0)?,
        employee_code: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        join_date: row.get(5)?,
        efficiency: row.get(6)?,
        monthly_salary: row.get(7)?,
        status: EmployeeStatus::parse(&status),
        created_at: row.get(9)?,
    })
}

pub fn query_employees(db_path: &Path, fetch: &FetchParams) -> Result<(Vec<Employee>, u64)> {
    let conn = open_connection(db_path)?;
    let pattern = like_pattern(&fetch.search);

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM employee WHERE {FILTER_CLAUSE}"),
            params![fetch.search, pattern, fetch.from_date, fetch.to_date],
            |row| row.get(0),
        )
        .context("failed to count employees")?;

    let direction = match fetch.sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE {FILTER_CLAUSE}
         ORDER BY {column} {direction}, id {direction}
         LIMIT ?5 OFFSET ?6",
        column = sort_column(&fetch.sort_by),
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare employee page query")?;
    let rows = stmt
        .query_map(
            params![
                fetch.search,
                pattern,
                fetch.from_date,
                fetch.to_date,
                i64::from(fetch.limit),
                fetch.offset() as i64,
            ],
            employee_from_row,
        )
        .context("failed to query employee page")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read employee row")?;

    Ok((rows, total.max(0) as u64))
}

pub fn employees_by_ids(db_path: &Path, ids: &[i64]) -> Result<Vec<Employee>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let conn = open_connection(db_path)?;
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE id IN ({placeholders})");
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare employee lookup")?;
    let rows = stmt
        .query_map(
            params_from_iter(ids.iter().map(|id| Value::Integer(*id))),
            employee_from_row,
        )
        .context("failed to look up employees")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read employee row")?;
    Ok(rows)
}

const FIRST_NAMES: [&str; 12] = [
    "Ana", "Bram", "Chen", "Dara", "Emeka", "Fatima", "Goran", "Hana", "Ivo", "Jun", "Kiri",
    "Lena",
];
const LAST_NAMES: [&str; 10] = [
    "Okafor", "Silva", "Novak", "Tanaka", "Haddad", "Berg", "Moreau", "Kowal", "Reyes", "Iyer",
];
const ROLES: [&str; 6] = [
    "Software Engineer",
    "Product Manager",
    "Designer",
    "HR Specialist",
    "Accountant",
    "Support Lead",
];

/// Fills an empty directory with deterministic demo employees. Returns the
/// number of rows inserted (zero when the table already has data).
pub fn seed_demo_employees(db_path: &Path, count: usize) -> Result<usize> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;

    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM employee", [], |row| row.get(0))
        .context("failed to count employees")?;
    if existing > 0 {
        return Ok(0);
    }

    let first_join = NaiveDate::from_ymd_opt(2019, 1, 7).context("invalid seed date")?;
    let first_created: NaiveDateTime = first_join
        .and_hms_opt(9, 0, 0)
        .context("invalid seed time")?;

    let tx = conn.transaction().context("failed to start transaction")?;
    {
        let mut insert = tx
            .prepare(
                "INSERT INTO employee(employee_code, name, email, role, join_date, efficiency,
                     monthly_salary, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .context("failed to prepare employee insert")?;

        for idx in 0..count {
            let first = FIRST_NAMES[idx % FIRST_NAMES.len()];
            let last = LAST_NAMES[(idx / FIRST_NAMES.len()) % LAST_NAMES.len()];
            let join_date = first_join + Duration::days((idx as i64 * 37) % 2000);
            let created_at = first_created + Duration::hours(idx as i64 * 5);
            let status = if idx % 9 == 4 {
                EmployeeStatus::Inactive
            } else {
                EmployeeStatus::Active
            };

            insert
                .execute(params![
                    format!("EMP-{:04}", idx + 1),
                    format!("{first} {last}"),
                    format!(
                        "{}.{}{}@hrdesk.example",
                        first.to_lowercase(),
                        last.to_lowercase(),
                        idx
                    ),
                    ROLES[idx % ROLES.len()],
                    join_date.format("%Y-%m-%d").to_string(),
                    (55 + (idx * 7) % 45) as i64,
                    3200.0 + ((idx * 173) % 4800) as f64,
                    status.as_str(),
                    created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ])
                .with_context(|| format!("failed to insert employee {}", idx + 1))?;
        }
    }
    tx.commit().context("failed to commit seed transaction")?;

    log::info!("seeded {count} demo employees into {}", db_path.display());
    Ok(count)
}

/// Employee directory backed by the application database.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteEmployeeSource {
    pub db_path: PathBuf,
}

impl SqliteEmployeeSource {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        init_db(&db_path)?;
        Ok(Self { db_path })
    }
}

impl PageSource<Employee> for SqliteEmployeeSource {
    fn fetch_page(&self, params: &FetchParams) -> Result<PageResult<Employee>, FetchError> {
        let (rows, total) = query_employees(&self.db_path, params)
            .map_err(|err| FetchError::Source(format!("{err:#}")))?;
        Ok(PageResult::new(rows, params.page, params.limit, total))
    }
}

impl FetchByIds<Employee> for SqliteEmployeeSource {
    fn fetch_by_ids(&self, ids: &[RowId]) -> Result<Vec<Employee>, FetchError> {
        let numeric = ids
            .iter()
            .map(|id| {
                id.as_str()
                    .parse::<i64>()
                    .map_err(|_| FetchError::Decode(format!("not an employee id: {id}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        employees_by_ids(&self.db_path, &numeric)
            .map_err(|err| FetchError::Source(format!("{err:#}")))
    }
}
