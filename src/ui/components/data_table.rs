use dioxus::prelude::*;

use crate::domain::entities::column::ColumnKind;
use crate::domain::entities::export::ExportFormat;
use crate::domain::entities::query::{DateRange, SortOrder};
use crate::domain::entities::row::RowId;
use crate::domain::entities::selection::PageCheckState;
use crate::ui::state::keyboard::CellFocus;
use crate::ui::state::table_shell::{
    BodyView, FooterView, HeaderCell, TableView, ToolbarView,
};
use crate::usecase::ports::export::{Notice, NoticeStage};
use crate::usecase::services::export_service::ExportScope;

/// Everything the rendered table can ask its owner to do.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    SearchInput(String),
    DateRange(DateRange),
    ToggleSort(String),
    ToggleRow(RowId),
    DeselectRow(RowId),
    ClickRow(usize),
    RowAction(RowId),
    TogglePage,
    ClearSelection,
    SetPage(u32),
    SetPageSize(u32),
    ToggleColumn(String, bool),
    MoveColumn(String, isize),
    Resize(String, f64),
    ResetFilters,
    ResetSizing,
    ResetOrder,
    Export(ExportScope, ExportFormat),
    Key(String),
    FocusCell(CellFocus),
    Back,
    Forward,
    Retry,
}

const CELL_STYLE: &str = "border-bottom: 1px solid #e5e7eb; padding: 6px 10px; white-space: nowrap; overflow: hidden; text-overflow: ellipsis;";
const BUTTON_STYLE: &str = "border: 1px solid #bbb; background: #fff; padding: 4px 10px; border-radius: 6px; cursor: pointer;";

#[component]
pub fn DataTable(
    view: TableView,
    notice: Option<Notice>,
    busy: bool,
    on_event: EventHandler<TableEvent>,
) -> Element {
    // (column, pointer x at drag start, width at drag start)
    let mut dragging = use_signal(|| None::<(String, f64, f64)>);

    let size_class = view.size.class();
    let epoch = view.remeasure_epoch;

    rsx! {
        div {
            class: "data-table {size_class}",
            style: "display: flex; flex-direction: column; gap: 8px; font-family: sans-serif;",

            if let Some(notice) = notice {
                NoticeBanner { notice }
            }

            if let Some(toolbar) = view.toolbar.clone() {
                Toolbar { toolbar, busy, on_event }
            }

            if let Some(alert) = view.alert.clone() {
                div {
                    role: "alert",
                    style: "border: 1px solid #f5c2c7; background: #f8d7da; color: #842029; padding: 8px 12px; border-radius: 6px;",
                    "{alert}"
                    button {
                        style: "{BUTTON_STYLE} margin-left: 12px;",
                        onclick: move |_| on_event.call(TableEvent::Retry),
                        "Retry"
                    }
                }
            }

            div {
                "data-remeasure": "{epoch}",
                tabindex: "0",
                style: "overflow: auto; border: 1px solid #ddd; border-radius: 8px; outline: none;",
                onkeydown: move |event| {
                    let key = event.key().to_string();
                    if key.starts_with("Arrow") || key == "Home" || key == "End" {
                        event.prevent_default();
                    }
                    on_event.call(TableEvent::Key(key));
                },
                onmousemove: move |event| {
                    if let Some((column, start_x, start_width)) = dragging() {
                        let delta = event.client_coordinates().x - start_x;
                        on_event.call(TableEvent::Resize(column, start_width + delta));
                    }
                },
                onmouseup: move |_| dragging.set(None),
                onmouseleave: move |_| dragging.set(None),

                table {
                    style: "border-collapse: collapse; table-layout: fixed;",
                    thead {
                        tr {
                            for cell in view.header.clone() {
                                HeaderCellView {
                                    key: "{cell.id}",
                                    cell,
                                    page_check: view.page_check,
                                    dragging,
                                    on_event,
                                }
                            }
                        }
                    }
                    tbody {
                        {render_body(&view.body, &view.header, on_event)}
                    }
                }
            }

            if let Some(footer) = view.footer.clone() {
                Footer { footer, on_event }
            }
        }
    }
}

#[component]
fn NoticeBanner(notice: Notice) -> Element {
    let (background, border) = match notice.stage {
        NoticeStage::Preparing | NoticeStage::Processing => ("#eef2ff", "#c7d2fe"),
        NoticeStage::Success => ("#ecfdf5", "#a7f3d0"),
        NoticeStage::Failure => ("#fef2f2", "#fecaca"),
    };
    rsx! {
        div {
            style: "background: {background}; border: 1px solid {border}; padding: 8px 12px; border-radius: 6px;",
            strong { "{notice.title}" }
            span { style: "margin-left: 8px;", "{notice.description}" }
        }
    }
}

/// The date inputs show a local edit only while the applied range is still
/// the one it was made against; back/forward or a reset replaces it.
fn visible_range(draft: Option<&(DateRange, DateRange)>, applied: &DateRange) -> DateRange {
    match draft {
        Some((base, edited)) if base == applied => edited.clone(),
        _ => applied.clone(),
    }
}

#[component]
fn Toolbar(toolbar: ToolbarView, busy: bool, on_event: EventHandler<TableEvent>) -> Element {
    let applied = toolbar.date_range.clone().unwrap_or_default();
    // (range the edit was made against, edited range)
    let mut draft = use_signal(|| None::<(DateRange, DateRange)>);
    let mut settings_open = use_signal(|| false);
    let mut export_format = use_signal(|| ExportFormat::Csv);
    let range = visible_range(draft().as_ref(), &applied);
    let selected_count = toolbar.selected_count;
    let export_disabled = !toolbar.can_export || busy;

    rsx! {
        div {
            style: "display: flex; flex-wrap: wrap; align-items: center; gap: 8px;",

            button { style: BUTTON_STYLE, title: "Back", onclick: move |_| on_event.call(TableEvent::Back), "←" }
            button { style: BUTTON_STYLE, title: "Forward", onclick: move |_| on_event.call(TableEvent::Forward), "→" }

            if let Some(search) = toolbar.search.clone() {
                input {
                    r#type: "search",
                    placeholder: "Search...",
                    style: "padding: 4px 8px; min-width: 220px;",
                    value: "{search}",
                    oninput: move |event| on_event.call(TableEvent::SearchInput(event.value())),
                }
            }

            if toolbar.date_range.is_some() {
                input {
                    r#type: "date",
                    value: "{range.from_date}",
                    oninput: {
                        let (applied, range) = (applied.clone(), range.clone());
                        move |event: FormEvent| {
                            let next = DateRange { from_date: event.value(), ..range.clone() };
                            draft.set(Some((applied.clone(), next.clone())));
                            on_event.call(TableEvent::DateRange(next));
                        }
                    },
                }
                span { "to" }
                input {
                    r#type: "date",
                    value: "{range.to_date}",
                    oninput: {
                        let (applied, range) = (applied.clone(), range.clone());
                        move |event: FormEvent| {
                            let next = DateRange { to_date: event.value(), ..range.clone() };
                            draft.set(Some((applied.clone(), next.clone())));
                            on_event.call(TableEvent::DateRange(next));
                        }
                    },
                }
            }

            button {
                style: BUTTON_STYLE,
                onclick: move |_| {
                    draft.set(None);
                    on_event.call(TableEvent::ResetFilters);
                },
                "Reset filters"
            }

            if selected_count > 0 {
                span { "{selected_count} selected" }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| on_event.call(TableEvent::ClearSelection),
                    "Clear"
                }
            }

            div { style: "flex: 1;" }

            select {
                onchange: move |event| {
                    let format = if event.value() == "xlsx" { ExportFormat::Excel } else { ExportFormat::Csv };
                    export_format.set(format);
                },
                option { value: "csv", "CSV" }
                option { value: "xlsx", "Excel" }
            }
            button {
                style: BUTTON_STYLE,
                disabled: export_disabled,
                onclick: move |_| on_event.call(TableEvent::Export(ExportScope::CurrentPage, export_format())),
                "Export page"
            }
            button {
                style: BUTTON_STYLE,
                disabled: busy || selected_count == 0,
                onclick: move |_| on_event.call(TableEvent::Export(ExportScope::Selected, export_format())),
                "Export selected"
            }
            button {
                style: BUTTON_STYLE,
                disabled: export_disabled,
                onclick: move |_| on_event.call(TableEvent::Export(ExportScope::All, export_format())),
                "Export all"
            }

            div {
                style: "position: relative;",
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| settings_open.set(!settings_open()),
                    "Columns"
                }
                if settings_open() {
                    div {
                        style: "position: absolute; right: 0; top: 32px; min-width: 240px; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 10; padding: 6px;",
                        for toggle in toolbar.column_toggles.clone() {
                            div {
                                key: "{toggle.id}",
                                style: "display: flex; align-items: center; gap: 6px; padding: 4px;",
                                input {
                                    r#type: "checkbox",
                                    checked: toggle.visible,
                                    onclick: {
                                        let id = toggle.id.clone();
                                        move |_| on_event.call(TableEvent::ToggleColumn(id.clone(), !toggle.visible))
                                    },
                                }
                                span { style: "flex: 1;", "{toggle.label}" }
                                button {
                                    style: BUTTON_STYLE,
                                    onclick: {
                                        let id = toggle.id.clone();
                                        move |_| on_event.call(TableEvent::MoveColumn(id.clone(), -1))
                                    },
                                    "↑"
                                }
                                button {
                                    style: BUTTON_STYLE,
                                    onclick: {
                                        let id = toggle.id.clone();
                                        move |_| on_event.call(TableEvent::MoveColumn(id.clone(), 1))
                                    },
                                    "↓"
                                }
                            }
                        }
                        hr {}
                        button {
                            style: BUTTON_STYLE,
                            onclick: move |_| on_event.call(TableEvent::ResetSizing),
                            "Reset column widths"
                        }
                        button {
                            style: BUTTON_STYLE,
                            onclick: move |_| on_event.call(TableEvent::ResetOrder),
                            "Reset column order"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn HeaderCellView(
    cell: HeaderCell,
    page_check: PageCheckState,
    mut dragging: Signal<Option<(String, f64, f64)>>,
    on_event: EventHandler<TableEvent>,
) -> Element {
    let width = cell.width;
    let aria_checked = match page_check {
        PageCheckState::All => "true",
        PageCheckState::Some => "mixed",
        PageCheckState::None => "false",
    };
    let style = format!(
        "position: relative; width: {width}px; min-width: {width}px; text-align: left; padding: 8px 10px; background: #f9fafb; border-bottom: 1px solid #ddd; user-select: none;"
    );

    match cell.kind {
        ColumnKind::Select => rsx! {
            th {
                style: "{style}",
                input {
                    r#type: "checkbox",
                    checked: page_check == PageCheckState::All,
                    "aria-checked": "{aria_checked}",
                    onclick: move |_| on_event.call(TableEvent::TogglePage),
                }
            }
        },
        ColumnKind::Actions => rsx! {
            th { style: "{style}" }
        },
        ColumnKind::Data => {
            let indicator = match cell.sort {
                Some(SortOrder::Asc) => " ▲",
                Some(SortOrder::Desc) => " ▼",
                None => "",
            };
            let id = cell.id.clone();
            let resize_id = cell.id.clone();
            rsx! {
                th {
                    style: "{style}",
                    span {
                        style: if cell.sortable { "cursor: pointer;" } else { "" },
                        onclick: move |_| on_event.call(TableEvent::ToggleSort(id.clone())),
                        "{cell.label}{indicator}"
                    }
                    if cell.resizable {
                        div {
                            style: "position: absolute; right: 0; top: 0; bottom: 0; width: 6px; cursor: col-resize;",
                            onmousedown: move |event| {
                                event.stop_propagation();
                                let x = event.client_coordinates().x;
                                dragging.set(Some((resize_id.clone(), x, width)));
                            },
                        }
                    }
                }
            }
        }
    }
}

fn render_body(
    body: &BodyView,
    header: &[HeaderCell],
    on_event: EventHandler<TableEvent>,
) -> Element {
    let colspan = header.len().max(1);
    match body {
        BodyView::Skeleton { rows } => rsx! {
            for idx in 0..*rows {
                tr {
                    key: "skeleton-{idx}",
                    for col in 0..colspan {
                        td {
                            key: "{col}",
                            style: CELL_STYLE,
                            div { style: "height: 12px; background: #eee; border-radius: 4px;" }
                        }
                    }
                }
            }
        },
        BodyView::Empty => rsx! {
            tr {
                td {
                    colspan: "{colspan}",
                    style: "padding: 24px; text-align: center; color: #666;",
                    "No results."
                }
            }
        },
        BodyView::Rows(rows) => rsx! {
            for row in rows.clone() {
                tr {
                    key: "{row.id}",
                    style: if row.selected { "background: #eef2ff;" } else { "" },
                    onclick: move |_| on_event.call(TableEvent::ClickRow(row.index)),
                    for (col, (cell, value)) in header.iter().zip(row.cells.iter()).enumerate() {
                        {render_cell(cell.kind, value, &row.id, row.index, col, row.selected, row.focused_col == Some(col), on_event)}
                    }
                }
            }
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn render_cell(
    kind: ColumnKind,
    value: &str,
    id: &RowId,
    row: usize,
    col: usize,
    selected: bool,
    focused: bool,
    on_event: EventHandler<TableEvent>,
) -> Element {
    let outline = if focused { "outline: 2px solid #6366f1; outline-offset: -2px;" } else { "" };
    let focus = CellFocus { row, col };
    match kind {
        ColumnKind::Select => {
            let id = id.clone();
            rsx! {
                td {
                    key: "{col}",
                    style: "{CELL_STYLE} {outline}",
                    input {
                        r#type: "checkbox",
                        checked: selected,
                        onclick: move |event| {
                            event.stop_propagation();
                            let id = id.clone();
                            on_event.call(if selected { TableEvent::DeselectRow(id) } else { TableEvent::ToggleRow(id) });
                        },
                    }
                }
            }
        }
        ColumnKind::Actions => {
            let id = id.clone();
            rsx! {
                td {
                    key: "{col}",
                    style: "{CELL_STYLE} {outline}",
                    button {
                        style: BUTTON_STYLE,
                        onclick: move |event| {
                            event.stop_propagation();
                            on_event.call(TableEvent::RowAction(id.clone()));
                        },
                        "Details"
                    }
                }
            }
        }
        ColumnKind::Data => rsx! {
            td {
                key: "{col}",
                style: "{CELL_STYLE} {outline}",
                onmousedown: move |_| on_event.call(TableEvent::FocusCell(focus)),
                "{value}"
            }
        },
    }
}

#[component]
fn Footer(footer: FooterView, on_event: EventHandler<TableEvent>) -> Element {
    let page = footer.page;
    let total_pages = footer.total_pages.max(1);
    let total_items = footer.total_items;
    let page_size = footer.page_size;

    rsx! {
        div {
            style: "display: flex; align-items: center; gap: 8px; justify-content: flex-end;",
            span { "{total_items} rows" }
            span { "Rows per page" }
            select {
                value: "{page_size}",
                onchange: move |event| {
                    if let Ok(size) = event.value().parse::<u32>() {
                        on_event.call(TableEvent::SetPageSize(size));
                    }
                },
                for option_size in footer.page_size_options.clone() {
                    option {
                        key: "{option_size}",
                        value: "{option_size}",
                        selected: option_size == page_size,
                        "{option_size}"
                    }
                }
            }
            span { "Page {page} of {total_pages}" }
            button {
                style: BUTTON_STYLE,
                disabled: !footer.can_previous,
                onclick: move |_| on_event.call(TableEvent::SetPage(1)),
                "«"
            }
            button {
                style: BUTTON_STYLE,
                disabled: !footer.can_previous,
                onclick: move |_| on_event.call(TableEvent::SetPage(page.saturating_sub(1).max(1))),
                "‹"
            }
            button {
                style: BUTTON_STYLE,
                disabled: !footer.can_next,
                onclick: move |_| on_event.call(TableEvent::SetPage(page + 1)),
                "›"
            }
            button {
                style: BUTTON_STYLE,
                disabled: !footer.can_next,
                onclick: move |_| on_event.call(TableEvent::SetPage(total_pages)),
                "»"
            }
        }
    }
}
