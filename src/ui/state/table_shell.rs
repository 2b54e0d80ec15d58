use std::sync::Arc;
use std::time::Instant;

use crate::domain::entities::column::{apply_column_order, ColumnDescriptor, ColumnKind};
use crate::domain::entities::export::{export_columns, ExportColumn, ExportMapping};
use crate::domain::entities::layout::{ColumnLayout, ColumnSizing, FALLBACK_COLUMN_WIDTH};
use crate::domain::entities::query::{
    ColumnFilter, DateRange, FetchParams, PageResult, QueryState, SortOrder, PAGE_SIZE_OPTIONS,
};
use crate::domain::entities::row::{RowId, TableRow};
use crate::domain::entities::selection::{PageCheckState, SelectionSet};
use crate::ui::state::keyboard::{move_focus, CellFocus, KeyCommand};
use crate::usecase::ports::fetch::{FetchBoundary, FetchError};
use crate::usecase::ports::navigator::Navigator;
use crate::usecase::ports::storage::PreferenceStore;
use crate::usecase::services::debounce::{DebounceTicket, SearchDebouncer};
use crate::usecase::services::export_service::ExportJob;
use crate::usecase::services::layout_service::ColumnLayoutManager;
use crate::usecase::services::query_service::{
    FetchOutcome, FetchTicket, LoadState, QueryOrchestrator,
};
use crate::usecase::services::url_state::{keys, BatchStatus, HistoryMode, UrlStateStore};

pub const DEFAULT_TABLE_ID: &str = "data-table-default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableSize {
    Sm,
    #[default]
    Default,
    Lg,
}

impl TableSize {
    pub fn class(self) -> &'static str {
        match self {
            TableSize::Sm => "table-sm",
            TableSize::Default => "table-default",
            TableSize::Lg => "table-lg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub table_id: String,
    pub size: TableSize,
    pub page_size_options: Vec<u32>,
    pub export_mapping: ExportMapping,
    pub history: HistoryMode,
    pub enable_row_selection: bool,
    pub enable_keyboard_navigation: bool,
    pub enable_click_row_select: bool,
    pub enable_pagination: bool,
    pub enable_search: bool,
    pub enable_column_filters: bool,
    pub enable_date_filter: bool,
    pub enable_column_visibility: bool,
    pub enable_export: bool,
    pub enable_url_state: bool,
    pub enable_column_resizing: bool,
    pub enable_toolbar: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_id: DEFAULT_TABLE_ID.to_string(),
            size: TableSize::Default,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            export_mapping: ExportMapping::default(),
            history: HistoryMode::Replace,
            enable_row_selection: true,
            enable_keyboard_navigation: false,
            enable_click_row_select: false,
            enable_pagination: true,
            enable_search: true,
            enable_column_filters: false,
            enable_date_filter: true,
            enable_column_visibility: true,
            enable_export: true,
            enable_url_state: true,
            enable_column_resizing: true,
            enable_toolbar: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnToggle {
    pub id: String,
    pub label: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarView {
    pub search: Option<String>,
    pub date_range: Option<DateRange>,
    pub selected_count: usize,
    pub can_export: bool,
    pub column_toggles: Vec<ColumnToggle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub id: String,
    pub label: String,
    pub kind: ColumnKind,
    pub width: f64,
    pub sortable: bool,
    pub sort: Option<SortOrder>,
    pub resizable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: RowId,
    pub index: usize,
    pub selected: bool,
    pub cells: Vec<String>,
    pub focused_col: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyView {
    Skeleton { rows: u32 },
    Empty,
    Rows(Vec<RowView>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FooterView {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub page_size_options: Vec<u32>,
    pub can_previous: bool,
    pub can_next: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub size: TableSize,
    pub toolbar: Option<ToolbarView>,
    pub page_check: PageCheckState,
    pub header: Vec<HeaderCell>,
    pub body: BodyView,
    pub footer: Option<FooterView>,
    pub alert: Option<String>,
    pub remeasure_epoch: u64,
}

/// Headless data table: wires location state, selection, fetching, search
/// debounce and column layout together and derives what to render.
///
/// Methods returning `BatchStatus` queue location writes; when the status
/// asks for it the caller schedules one `flush` after the current handler.
pub struct TableShell<T> {
    config: TableConfig,
    columns: Vec<ColumnDescriptor>,
    url: UrlStateStore,
    selection: SelectionSet,
    query: QueryOrchestrator<T>,
    search: SearchDebouncer,
    layout: ColumnLayoutManager,
    sizing: ColumnSizing,
    order: Vec<String>,
    focus: Option<CellFocus>,
}

impl<T: TableRow + Clone> TableShell<T> {
    pub fn new(
        config: TableConfig,
        columns: Vec<ColumnDescriptor>,
        boundary: FetchBoundary<T>,
        navigator: Box<dyn Navigator>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let url = UrlStateStore::new(navigator)
            .with_history(config.history)
            .with_enabled(config.enable_url_state);
        let search = SearchDebouncer::new(&url.get_value(&keys::search()));
        let mut layout = ColumnLayoutManager::new(preferences);
        layout.initialize_defaults(&config.table_id, &columns);
        let ColumnLayout { sizing, order } = layout.layout(&config.table_id);

        Self {
            config,
            columns,
            url,
            selection: SelectionSet::new(),
            query: QueryOrchestrator::new(boundary),
            search,
            layout,
            sizing,
            order,
            focus: None,
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn state(&self) -> QueryState {
        self.url.query_state()
    }

    pub fn query_string(&self) -> String {
        self.url.query_string()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn rows(&self) -> &[T] {
        self.query.rows()
    }

    pub fn load_state(&self) -> &LoadState<T> {
        self.query.load_state()
    }

    pub fn focus(&self) -> Option<CellFocus> {
        self.focus
    }

    pub fn search_text(&self) -> &str {
        self.search.local()
    }

    pub fn search_delay(&self) -> std::time::Duration {
        self.search.delay()
    }

    // ---- location state ----

    /// Applies queued location writes. Keys changed by the flush are
    /// returned.
    pub fn flush(&mut self) -> Vec<String> {
        self.url.flush()
    }

    pub fn set_page(&mut self, page: u32) -> BatchStatus {
        self.url.set_value(&keys::page(), page.max(1))
    }

    pub fn next_page(&mut self) -> BatchStatus {
        let state = self.state();
        let total_pages = self
            .load_state()
            .data
            .as_ref()
            .map(|data| data.total_pages)
            .unwrap_or(0);
        if state.page >= total_pages {
            return BatchStatus::Unchanged;
        }
        self.set_page(state.page + 1)
    }

    pub fn previous_page(&mut self) -> BatchStatus {
        let page = self.state().page;
        if page <= 1 {
            return BatchStatus::Unchanged;
        }
        self.set_page(page - 1)
    }

    pub fn set_page_size(&mut self, page_size: u32) -> BatchStatus {
        self.url.set_value(&keys::page_size(), page_size.max(1))
    }

    /// Header click: the active column flips direction, another column
    /// starts ascending.
    pub fn toggle_sort(&mut self, column_id: &str) -> BatchStatus {
        let sortable = self
            .column(column_id)
            .is_some_and(|column| column.sortable);
        if !sortable {
            return BatchStatus::Unchanged;
        }
        let state = self.state();
        let order = if state.sort_by == column_id {
            state.sort_order.flipped()
        } else {
            SortOrder::Asc
        };
        self.url.set_sort(column_id, order)
    }

    pub fn set_sort(&mut self, sort_by: &str, sort_order: SortOrder) -> BatchStatus {
        self.url.set_sort(sort_by, sort_order)
    }

    /// Only complete or fully cleared ranges are written.
    pub fn set_date_range(&mut self, range: DateRange) -> BatchStatus {
        if !self.config.enable_date_filter || !(range.is_complete() || range.is_unbounded()) {
            return BatchStatus::Unchanged;
        }
        self.url.set_value(&keys::date_range(), range)
    }

    pub fn set_column_visible(&mut self, column_id: &str, visible: bool) -> BatchStatus {
        let hideable = self
            .column(column_id)
            .is_some_and(|column| column.hideable);
        if !hideable || !self.config.enable_column_visibility {
            return BatchStatus::Unchanged;
        }
        self.url.update_value(&keys::column_visibility(), |mut visibility| {
            if visible {
                visibility.remove(column_id);
            } else {
                visibility.insert(column_id.to_string(), false);
            }
            visibility
        })
    }

    pub fn set_column_filters(&mut self, filters: Vec<ColumnFilter>) -> BatchStatus {
        if !self.config.enable_column_filters {
            return BatchStatus::Unchanged;
        }
        self.url.set_value(&keys::column_filters(), filters)
    }

    /// Toolbar "reset filters": every location key back to its default.
    pub fn reset_filters(&mut self) -> BatchStatus {
        let status = self.url.reset();
        self.search.cancel();
        self.search.sync_external("");
        status
    }

    pub fn back(&mut self) -> Vec<String> {
        let changed = self.url.back();
        self.adopt_external(&changed);
        changed
    }

    pub fn forward(&mut self) -> Vec<String> {
        let changed = self.url.forward();
        self.adopt_external(&changed);
        changed
    }

    pub fn sync_location(&mut self, query: &str) -> Vec<String> {
        let changed = self.url.sync_location(query);
        self.adopt_external(&changed);
        changed
    }

    fn adopt_external(&mut self, changed: &[String]) {
        if changed.iter().any(|key| key == keys::SEARCH) {
            let search = self.url.get_value(&keys::search());
            self.search.sync_external(&search);
        }
    }

    // ---- search ----

    pub fn search_input(&mut self, text: &str, now: Instant) -> DebounceTicket {
        self.search.input(text, now)
    }

    /// Timer callback for `ticket`; commits only if no newer keystroke came.
    pub fn search_fire(&mut self, ticket: DebounceTicket) -> BatchStatus {
        match self.search.fire(ticket) {
            Some(term) => self.url.set_value(&keys::search(), term),
            None => BatchStatus::Unchanged,
        }
    }

    // ---- fetching ----

    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        let state = self.state();
        self.query.begin_fetch(&state)
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<PageResult<T>, FetchError>,
    ) -> (FetchOutcome, BatchStatus) {
        let outcome = self.query.complete_fetch(ticket, result);
        (outcome, self.heal_pagination(outcome))
    }

    /// One synchronous refresh through the configured boundary.
    pub fn refresh(&mut self) -> (Option<FetchOutcome>, BatchStatus) {
        let state = self.state();
        let outcome = self.query.refresh(&state);
        let status = outcome
            .map(|outcome| self.heal_pagination(outcome))
            .unwrap_or(BatchStatus::Unchanged);
        (outcome, status)
    }

    pub fn invalidate(&mut self) {
        self.query.invalidate();
    }

    pub fn fetch_params(&self) -> FetchParams {
        self.state().fetch_params()
    }

    fn heal_pagination(&mut self, outcome: FetchOutcome) -> BatchStatus {
        match outcome {
            FetchOutcome::Applied { reset_page: true } => {
                log::info!("page is past the end of the data, returning to page 1");
                self.url.set_value(&keys::page(), 1)
            }
            _ => BatchStatus::Unchanged,
        }
    }

    // ---- selection ----

    pub fn page_ids(&self) -> Vec<RowId> {
        self.query.rows().iter().map(TableRow::row_id).collect()
    }

    pub fn toggle_row(&mut self, id: RowId) -> bool {
        if !self.config.enable_row_selection {
            return false;
        }
        self.selection.toggle(id)
    }

    /// Row checkbox unticked; returns whether the row was selected.
    pub fn deselect_row(&mut self, id: &RowId) -> bool {
        self.selection.deselect(id)
    }

    /// Row click; only selects when click-to-select is on.
    pub fn click_row(&mut self, index: usize) -> bool {
        if !self.config.enable_click_row_select {
            return false;
        }
        match self.page_ids().get(index) {
            Some(id) => self.toggle_row(id.clone()),
            None => false,
        }
    }

    pub fn toggle_page_selection(&mut self) {
        if !self.config.enable_row_selection {
            return;
        }
        let page_ids = self.page_ids();
        self.selection.toggle_page(&page_ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ---- layout ----

    pub fn column_width(&self, column_id: &str) -> f64 {
        self.sizing
            .get(column_id)
            .copied()
            .unwrap_or(FALLBACK_COLUMN_WIDTH)
    }

    pub fn resize_column(&mut self, column_id: &str, width: f64) {
        let resizable = self
            .column(column_id)
            .is_some_and(|column| column.resizable);
        if !self.config.enable_column_resizing || !resizable {
            return;
        }
        self.layout
            .resize_column(&self.config.table_id, column_id, width);
        self.sizing = self.layout.get_sizing(&self.config.table_id);
    }

    pub fn move_column(&mut self, column_id: &str, step: isize) {
        self.layout
            .move_column(&self.config.table_id, &self.columns, column_id, step);
        self.order = self.layout.get_order(&self.config.table_id);
    }

    pub fn reset_sizing(&mut self) {
        self.layout.reset_sizing(&self.config.table_id);
        self.sizing = self
            .layout
            .initialize_defaults(&self.config.table_id, &self.columns);
    }

    pub fn reset_order(&mut self) {
        self.layout.reset_order(&self.config.table_id);
        self.order.clear();
    }

    // ---- keyboard ----

    pub fn key(&mut self, key: &str) -> bool {
        if !self.config.enable_keyboard_navigation {
            return false;
        }
        let Some(command) = KeyCommand::from_key(key) else {
            return false;
        };
        let rows = self.query.rows().len();
        let cols = self.visible_columns().len();
        self.focus = move_focus(self.focus, command, rows, cols);
        true
    }

    pub fn focus_cell(&mut self, focus: CellFocus) {
        if self.config.enable_keyboard_navigation {
            self.focus = Some(focus);
        }
    }

    // ---- export ----

    pub fn export_columns(&self) -> Vec<ExportColumn> {
        let state = self.state();
        export_columns(
            &self.columns,
            |id| state.is_column_visible(id),
            &self.order,
            &self.config.export_mapping,
        )
    }

    /// Snapshot of what an export of this table needs right now.
    pub fn export_job(&self) -> ExportJob<T> {
        ExportJob {
            page_rows: self.query.rows().to_vec(),
            selection: self.selection.clone(),
            state: self.state(),
            source: self.query.source(),
            columns: self.export_columns(),
            entity_name: self.config.export_mapping.entity_name.clone(),
        }
    }

    // ---- view ----

    fn column(&self, column_id: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    /// Columns on screen, in display order.
    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor> {
        let state = self.state();
        apply_column_order(&self.columns, &self.order)
            .into_iter()
            .filter(|column| match column.kind {
                ColumnKind::Select => self.config.enable_row_selection,
                ColumnKind::Actions => true,
                ColumnKind::Data => !column.hideable || state.is_column_visible(&column.id),
            })
            .collect()
    }

    pub fn view(&self) -> TableView {
        let state = self.state();
        let load = self.query.load_state();
        let visible = self.visible_columns();
        let page_ids = self.page_ids();

        let header = visible
            .iter()
            .map(|column| HeaderCell {
                id: column.id.clone(),
                label: column.header.clone().unwrap_or_default(),
                kind: column.kind,
                width: self.column_width(&column.id),
                sortable: column.sortable,
                sort: (column.sortable && state.sort_by == column.id).then_some(state.sort_order),
                resizable: self.config.enable_column_resizing && column.resizable,
            })
            .collect();

        let body = match &load.data {
            None if load.is_loading => BodyView::Skeleton {
                rows: state.page_size,
            },
            Some(data) if !data.rows.is_empty() => {
                let selected = self.selection.row_selection_for_page(&page_ids);
                BodyView::Rows(
                    data.rows
                        .iter()
                        .enumerate()
                        .map(|(index, row)| RowView {
                            id: row.row_id(),
                            index,
                            selected: selected.get(&index).copied().unwrap_or(false),
                            cells: visible
                                .iter()
                                .map(|column| match column.kind {
                                    ColumnKind::Data => row.cell(&column.id).display(),
                                    _ => String::new(),
                                })
                                .collect(),
                            focused_col: self
                                .focus
                                .filter(|focus| focus.row == index)
                                .map(|focus| focus.col),
                        })
                        .collect(),
                )
            }
            _ => BodyView::Empty,
        };

        let toolbar = self.config.enable_toolbar.then(|| ToolbarView {
            search: self
                .config
                .enable_search
                .then(|| self.search.local().to_string()),
            date_range: self
                .config
                .enable_date_filter
                .then(|| state.date_range.clone()),
            selected_count: self.selection.len(),
            can_export: self.config.enable_export && !page_ids.is_empty(),
            column_toggles: if self.config.enable_column_visibility {
                self.columns
                    .iter()
                    .filter(|column| column.hideable)
                    .map(|column| ColumnToggle {
                        id: column.id.clone(),
                        label: column.label().to_string(),
                        visible: state.is_column_visible(&column.id),
                    })
                    .collect()
            } else {
                Vec::new()
            },
        });

        let footer = self.config.enable_pagination.then(|| {
            let (total_pages, total_items) = load
                .data
                .as_ref()
                .map(|data| (data.total_pages, data.total_items))
                .unwrap_or((0, 0));
            FooterView {
                page: state.page,
                page_size: state.page_size,
                total_pages,
                total_items,
                page_size_options: self.config.page_size_options.clone(),
                can_previous: state.page > 1,
                can_next: state.page < total_pages,
            }
        });

        TableView {
            size: self.config.size,
            toolbar,
            page_check: self.selection.page_check_state(&page_ids),
            header,
            body,
            footer,
            alert: load.error.as_ref().map(ToString::to_string),
            remeasure_epoch: self.layout.remeasure_epoch(),
        }
    }
}
