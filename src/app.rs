use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dioxus::prelude::*;
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::config::AppConfig;
use crate::domain::entities::employee::{employee_columns, Employee};
use crate::domain::entities::export::ExportMapping;
use crate::domain::entities::row::TableRow;
use crate::infra::desktop::DownloadSink;
use crate::infra::location::HistoryLocation;
use crate::infra::sqlite::employees::{seed_demo_employees, SqliteEmployeeSource};
use crate::infra::sqlite::preferences::SqlitePreferenceStore;
use crate::ui::components::data_table::{DataTable, TableEvent};
use crate::ui::state::notice::SignalNotifier;
use crate::ui::state::table_shell::{TableConfig, TableShell};
use crate::usecase::ports::export::{ExportError, Notice};
use crate::usecase::ports::fetch::{FetchBoundary, FetchByIds, PageSource};
use crate::usecase::services::export_service::ExportService;
use crate::usecase::services::url_state::{BatchStatus, HistoryMode};

type EmployeeTable = Signal<TableShell<Employee>>;

#[derive(Clone)]
struct Services {
    source: Arc<SqliteEmployeeSource>,
    preferences: Arc<SqlitePreferenceStore>,
}

impl Services {
    fn open(config: &AppConfig) -> Result<Self> {
        config.ensure_dirs()?;
        let source = SqliteEmployeeSource::open(config.db_path.clone())?;
        seed_demo_employees(&config.db_path, config.seed_rows)?;
        let preferences = SqlitePreferenceStore::open(config.db_path.clone())?;
        Ok(Self {
            source: Arc::new(source),
            preferences: Arc::new(preferences),
        })
    }
}

pub fn employee_table_config() -> TableConfig {
    TableConfig {
        table_id: "employees".to_string(),
        history: HistoryMode::Push,
        enable_keyboard_navigation: true,
        enable_click_row_select: true,
        export_mapping: ExportMapping::new("employees")
            .label("employee_code", "Employee ID")
            .label("efficiency", "Efficiency (%)")
            .width("name", 24.0)
            .width("email", 32.0)
            .width("role", 22.0),
        ..TableConfig::default()
    }
}

/// Issues the fetch for the current state, if it changed since the last one.
fn start_fetch(mut table: EmployeeTable, source: Arc<SqliteEmployeeSource>) {
    let Some(ticket) = table.write().begin_fetch() else {
        return;
    };
    spawn(async move {
        let result = source.fetch_page(&ticket.params);
        let (outcome, status) = table.write().complete_fetch(ticket, result);
        log::debug!("fetch finished: {outcome:?}");
        if status.needs_flush() {
            schedule_flush(table, source);
        }
    });
}

/// Runs after the current handler so every write it queued lands in one
/// location update.
fn schedule_flush(mut table: EmployeeTable, source: Arc<SqliteEmployeeSource>) {
    spawn(async move {
        let changed = table.write().flush();
        if !changed.is_empty() {
            log::debug!("location keys changed: {}", changed.join(", "));
        }
        start_fetch(table, source);
    });
}

fn settle(status: BatchStatus, table: EmployeeTable, source: Arc<SqliteEmployeeSource>) {
    match status {
        BatchStatus::Scheduled => schedule_flush(table, source),
        BatchStatus::Coalesced => {}
        BatchStatus::Unchanged => start_fetch(table, source),
    }
}

fn confirm(title: &str, description: &str) -> bool {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::YesNo)
        .show()
        == MessageDialogResult::Yes
}

fn show_employee(employee: &Employee) {
    let description = format!(
        "{} ({})\n{}\n{}\nJoined {}\nEfficiency {}%\nSalary {:.2}\nStatus {}",
        employee.name,
        employee.employee_code,
        employee.email,
        employee.role,
        employee.join_date,
        employee.efficiency,
        employee.monthly_salary,
        employee.status.as_str(),
    );
    MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title(&employee.name)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

#[component]
pub fn App() -> Element {
    let config = use_hook(|| AppConfig::load().map_err(|err| format!("{err:#}")));
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to resolve the data directory: {err}" }
                }
            };
        }
    };
    let services = use_hook(|| Services::open(&config).map_err(|err| format!("{err:#}")));
    let services = match services {
        Ok(services) => services,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to open the employee database: {err}" }
                }
            };
        }
    };

    rsx! {
        EmployeeDirectory {
            export_dir: config.export_dir.display().to_string(),
            source: services.source.clone(),
            preferences: services.preferences.clone(),
        }
    }
}

#[component]
fn EmployeeDirectory(
    export_dir: String,
    source: Arc<SqliteEmployeeSource>,
    preferences: Arc<SqlitePreferenceStore>,
) -> Element {
    let notice = use_signal(|| None::<Notice>);
    let mut table: EmployeeTable = use_signal(|| {
        TableShell::new(
            employee_table_config(),
            employee_columns(),
            FetchBoundary::Imperative(source.clone()),
            Box::new(HistoryLocation::default()),
            preferences.clone(),
        )
    });
    let exporter = use_hook(|| {
        Rc::new(ExportService::new(
            Arc::new(DownloadSink::new(export_dir.clone().into()).with_dialog(true)),
            Arc::new(SignalNotifier::new(notice)),
        ))
    });

    let source_for_mount = source.clone();
    use_effect(move || start_fetch(table, source_for_mount.clone()));

    let exporting = exporter.is_busy();
    let exporter_for_events = exporter.clone();

    let on_event = move |event: TableEvent| {
        let source = source.clone();
        let status = match event {
            TableEvent::SearchInput(text) => {
                let ticket = table.write().search_input(&text, Instant::now());
                let delay = table.read().search_delay();
                spawn(async move {
                    tokio::time::sleep(delay).await;
                    let status = table.write().search_fire(ticket);
                    if status != BatchStatus::Unchanged {
                        settle(status, table, source);
                    }
                });
                return;
            }
            TableEvent::DateRange(range) => table.write().set_date_range(range),
            TableEvent::ToggleSort(column_id) => table.write().toggle_sort(&column_id),
            TableEvent::ToggleRow(id) => {
                table.write().toggle_row(id);
                return;
            }
            TableEvent::DeselectRow(id) => {
                table.write().deselect_row(&id);
                return;
            }
            TableEvent::ClickRow(index) => {
                table.write().click_row(index);
                return;
            }
            TableEvent::RowAction(id) => {
                let employee = table
                    .read()
                    .rows()
                    .iter()
                    .find(|row| row.row_id() == id)
                    .cloned();
                if let Some(employee) = employee {
                    show_employee(&employee);
                }
                return;
            }
            TableEvent::TogglePage => {
                table.write().toggle_page_selection();
                return;
            }
            TableEvent::ClearSelection => {
                table.write().clear_selection();
                return;
            }
            TableEvent::SetPage(page) => table.write().set_page(page),
            TableEvent::SetPageSize(page_size) => table.write().set_page_size(page_size),
            TableEvent::ToggleColumn(column_id, visible) => {
                table.write().set_column_visible(&column_id, visible)
            }
            TableEvent::MoveColumn(column_id, step) => {
                table.write().move_column(&column_id, step);
                return;
            }
            TableEvent::Resize(column_id, width) => {
                table.write().resize_column(&column_id, width);
                return;
            }
            TableEvent::ResetFilters => table.write().reset_filters(),
            TableEvent::ResetSizing => {
                if confirm("Reset column widths", "Restore the default column widths?") {
                    table.write().reset_sizing();
                }
                return;
            }
            TableEvent::ResetOrder => {
                if confirm("Reset column order", "Restore the default column order?") {
                    table.write().reset_order();
                }
                return;
            }
            TableEvent::Export(scope, format) => {
                let job = table.read().export_job();
                let exporter = exporter_for_events.clone();
                spawn(async move {
                    let by_ids: &dyn FetchByIds<Employee> = source.as_ref();
                    match exporter.export(scope, &job, Some(by_ids), format).await {
                        Ok(path) => log::info!("export saved to {}", path.display()),
                        Err(ExportError::Cancelled) => log::info!("export cancelled"),
                        Err(err) => log::warn!("export did not complete: {err}"),
                    }
                });
                return;
            }
            TableEvent::Key(key) => {
                table.write().key(&key);
                return;
            }
            TableEvent::FocusCell(focus) => {
                table.write().focus_cell(focus);
                return;
            }
            TableEvent::Back => {
                table.write().back();
                BatchStatus::Unchanged
            }
            TableEvent::Forward => {
                table.write().forward();
                BatchStatus::Unchanged
            }
            TableEvent::Retry => {
                table.write().invalidate();
                BatchStatus::Unchanged
            }
        };
        settle(status, table, source);
    };

    let view = table.read().view();

    rsx! {
        div {
            style: "padding: 16px; display: flex; flex-direction: column; gap: 12px;",
            h2 { style: "margin: 0;", "Employees" }
            DataTable {
                view,
                notice: notice(),
                busy: exporting,
                on_event,
            }
        }
    }
}
