use std::cell::Cell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::entities::export::{export_file_name, ExportColumn, ExportFile, ExportFormat};
use crate::domain::entities::query::{FetchParams, QueryState, SortOrder};
use crate::domain::entities::row::{RowId, TableRow};
use crate::domain::entities::selection::SelectionSet;
use crate::infra::export::csv::write_csv;
use crate::infra::export::xlsx::write_xlsx;
use crate::usecase::ports::export::{ExportError, FileSink, Notice, NoticeStage, Notifier};
use crate::usecase::ports::fetch::{FetchByIds, FetchError, PageSource};

/// Page size used when walking every page for an "export all".
pub const EXPORT_ALL_PAGE_SIZE: u32 = 100;

/// Pause after posting a progress notice so the view can paint it.
pub const NOTICE_FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    CurrentPage,
    Selected,
    All,
}

/// Everything an export needs, copied out of the table so nothing stays
/// borrowed while the export runs.
pub struct ExportJob<T> {
    pub page_rows: Vec<T>,
    pub selection: SelectionSet,
    pub state: QueryState,
    pub source: Option<Arc<dyn PageSource<T>>>,
    pub columns: Vec<ExportColumn>,
    pub entity_name: String,
}

async fn paint_notice() {
    tokio::time::sleep(NOTICE_FRAME).await;
}

/// Builds the file for `rows`. An empty row set is an error and produces
/// nothing.
pub fn export_rows<T: TableRow>(
    rows: &[T],
    columns: &[ExportColumn],
    format: ExportFormat,
    entity_name: &str,
    at: DateTime<Utc>,
) -> Result<ExportFile, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let bytes = match format {
        ExportFormat::Csv => {
            write_csv(rows, columns).map_err(|err| ExportError::Csv(format!("{err:#}")))?
        }
        ExportFormat::Excel => {
            write_xlsx(rows, columns).map_err(|err| ExportError::Xlsx(format!("{err:#}")))?
        }
    };

    Ok(ExportFile {
        file_name: export_file_name(entity_name, format, at),
        mime_type: format.mime_type(),
        bytes,
    })
}

/// Orders rows the way the server would for the active sort.
pub fn sort_rows<T: TableRow>(rows: &mut [T], sort_by: &str, sort_order: SortOrder) {
    rows.sort_by(|a, b| {
        let ordering = a.cell(sort_by).compare(&b.cell(sort_by));
        match sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Walks every page of `source` for the current filters.
pub fn collect_all_pages<T>(
    source: &dyn PageSource<T>,
    state: &QueryState,
) -> Result<Vec<T>, FetchError> {
    let base = FetchParams {
        page: 1,
        limit: EXPORT_ALL_PAGE_SIZE,
        ..state.fetch_params()
    };

    let mut rows = Vec::new();
    let mut page = 1;
    loop {
        let result = source.fetch_page(&FetchParams {
            page,
            ..base.clone()
        })?;
        let fetched = result.rows.len();
        rows.extend(result.rows);
        if page >= result.total_pages || fetched == 0 {
            break;
        }
        page += 1;
    }
    Ok(rows)
}

pub struct ExportService {
    sink: Arc<dyn FileSink>,
    notifier: Arc<dyn Notifier>,
    clock: fn() -> DateTime<Utc>,
    busy: Cell<bool>,
}

impl ExportService {
    pub fn new(sink: Arc<dyn FileSink>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            sink,
            notifier,
            clock: Utc::now,
            busy: Cell::new(false),
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Claims the busy flag and posts the "preparing" notice. A second
    /// export while one is running is rejected.
    pub fn start(&self) -> Result<(), ExportError> {
        if self.busy.replace(true) {
            log::warn!("export requested while another export is running");
            return Err(ExportError::Busy);
        }
        self.notifier.notify(Notice::new(
            NoticeStage::Preparing,
            "Preparing export",
            "Collecting rows to export...",
        ));
        Ok(())
    }

    fn processing(&self, rows: usize, format: ExportFormat) {
        self.notifier.notify(Notice::new(
            NoticeStage::Processing,
            "Processing export",
            format!("Generating {} file for {rows} rows...", format.label()),
        ));
    }

    /// Generates and saves the file, posts the terminal notice and releases
    /// the busy flag whatever the result.
    fn complete<T: TableRow>(
        &self,
        rows: Result<Vec<T>, ExportError>,
        columns: &[ExportColumn],
        format: ExportFormat,
        entity_name: &str,
    ) -> Result<PathBuf, ExportError> {
        let result = rows.and_then(|rows| {
            let file = export_rows(&rows, columns, format, entity_name, (self.clock)())?;
            self.sink.save(&file)
        });
        self.busy.set(false);

        match &result {
            Ok(path) => {
                log::info!("exported {} to {}", format.label(), path.display());
                self.notifier.notify(Notice::new(
                    NoticeStage::Success,
                    "Export complete",
                    format!("Saved {}", path.display()),
                ));
            }
            Err(err) => {
                log::error!("export failed: {err}");
                self.notifier.notify(Notice::new(
                    NoticeStage::Failure,
                    "Export failed",
                    err.to_string(),
                ));
            }
        }
        result
    }

    async fn run<T: TableRow>(
        &self,
        job: &ExportJob<T>,
        format: ExportFormat,
        collect: impl FnOnce(&ExportJob<T>) -> Result<Vec<T>, ExportError>,
    ) -> Result<PathBuf, ExportError> {
        self.start()?;
        paint_notice().await;

        let rows = collect(job);
        if let Ok(rows) = &rows {
            self.processing(rows.len(), format);
            paint_notice().await;
        }
        self.complete(rows, &job.columns, format, &job.entity_name)
    }

    pub async fn export<T: TableRow + Clone>(
        &self,
        scope: ExportScope,
        job: &ExportJob<T>,
        by_ids: Option<&dyn FetchByIds<T>>,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        match scope {
            ExportScope::CurrentPage => self.export_current_page(job, format).await,
            ExportScope::Selected => self.export_selected(job, by_ids, format).await,
            ExportScope::All => self.export_all(job, format).await,
        }
    }

    pub async fn export_current_page<T: TableRow + Clone>(
        &self,
        job: &ExportJob<T>,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        self.run(job, format, |job| Ok(job.page_rows.clone())).await
    }

    /// Exports every selected row, including rows on other pages when a
    /// by-ID boundary can materialize them.
    pub async fn export_selected<T: TableRow + Clone>(
        &self,
        job: &ExportJob<T>,
        by_ids: Option<&dyn FetchByIds<T>>,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        self.run(job, format, |job| {
            Ok(selected_rows(
                &job.page_rows,
                &job.selection,
                by_ids,
                (job.state.sort_by.as_str(), job.state.sort_order),
            ))
        })
        .await
    }

    /// Walks every page of the job's source under its filters.
    pub async fn export_all<T: TableRow>(
        &self,
        job: &ExportJob<T>,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        self.run(job, format, |job| match &job.source {
            Some(source) => collect_all_pages(source.as_ref(), &job.state)
                .map_err(|err| ExportError::Source(err.to_string())),
            None => Err(ExportError::Source(
                "export all needs a page source".to_string(),
            )),
        })
        .await
    }
}

/// Selected rows for export. Off-page IDs are fetched through `by_ids`; if
/// that fails, only the selected rows of the current page are used.
pub fn selected_rows<T: TableRow + Clone>(
    page_rows: &[T],
    selection: &SelectionSet,
    by_ids: Option<&dyn FetchByIds<T>>,
    (sort_by, sort_order): (&str, SortOrder),
) -> Vec<T> {
    let mut rows: Vec<T> = page_rows
        .iter()
        .filter(|row| selection.contains(&row.row_id()))
        .cloned()
        .collect();

    let on_page: BTreeSet<RowId> = rows.iter().map(TableRow::row_id).collect();
    let missing: Vec<RowId> = selection
        .selected()
        .iter()
        .filter(|id| !on_page.contains(*id))
        .cloned()
        .collect();

    if !missing.is_empty() {
        match by_ids {
            Some(source) => match source.fetch_by_ids(&missing) {
                Ok(fetched) => rows.extend(fetched.into_iter().filter(|row| {
                    let id = row.row_id();
                    selection.contains(&id) && !on_page.contains(&id)
                })),
                Err(err) => {
                    log::warn!("failed to fetch selected rows, exporting current page only: {err}");
                }
            },
            None => log::warn!(
                "{} selected rows are not on this page and cannot be fetched",
                missing.len()
            ),
        }
    }

    sort_rows(&mut rows, sort_by, sort_order);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::TimeZone;

    use crate::domain::entities::query::PageResult;
    use crate::domain::entities::row::CellValue;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        id: i64,
        name: String,
    }

    impl TableRow for Person {
        fn row_id(&self) -> RowId {
            RowId::from(self.id)
        }

        fn cell(&self, column_id: &str) -> CellValue {
            match column_id {
                "id" => self.id.into(),
                "name" => self.name.as_str().into(),
                _ => CellValue::Empty,
            }
        }
    }

    fn person(id: i64) -> Person {
        Person {
            id,
            name: format!("person {id}"),
        }
    }

    fn columns() -> Vec<ExportColumn> {
        vec![ExportColumn {
            id: "name".to_string(),
            label: "Name".to_string(),
            width: 20.0,
        }]
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp")
    }

    #[derive(Default)]
    struct RecordingSink {
        files: RefCell<Vec<ExportFile>>,
    }

    impl FileSink for RecordingSink {
        fn save(&self, file: &ExportFile) -> Result<PathBuf, ExportError> {
            self.files.borrow_mut().push(file.clone());
            Ok(PathBuf::from("/downloads").join(&file.file_name))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: RefCell<Vec<Notice>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.borrow_mut().push(notice);
        }
    }

    struct Directory;

    impl FetchByIds<Person> for Directory {
        fn fetch_by_ids(&self, ids: &[RowId]) -> Result<Vec<Person>, FetchError> {
            Ok(ids
                .iter()
                .filter_map(|id| id.as_str().parse().ok())
                .map(person)
                .collect())
        }
    }

    struct Offline;

    impl FetchByIds<Person> for Offline {
        fn fetch_by_ids(&self, _ids: &[RowId]) -> Result<Vec<Person>, FetchError> {
            Err(FetchError::Source("offline".to_string()))
        }
    }

    impl PageSource<Person> for Offline {
        fn fetch_page(&self, _params: &FetchParams) -> Result<PageResult<Person>, FetchError> {
            Err(FetchError::Source("timeout".to_string()))
        }
    }

    fn job(page_rows: Vec<Person>) -> ExportJob<Person> {
        ExportJob {
            page_rows,
            selection: SelectionSet::new(),
            state: QueryState::default(),
            source: None,
            columns: columns(),
            entity_name: "people".to_string(),
        }
    }

    impl PageSource<Person> for Directory {
        fn fetch_page(&self, params: &FetchParams) -> Result<PageResult<Person>, FetchError> {
            let start = i64::from(params.page - 1) * i64::from(params.limit);
            let rows = (start..(start + i64::from(params.limit)).min(250))
                .map(person)
                .collect();
            Ok(PageResult::new(rows, params.page, params.limit, 250))
        }
    }

    fn service() -> (ExportService, Arc<RecordingSink>, Arc<RecordingNotifier>) {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service =
            ExportService::new(sink.clone(), notifier.clone()).with_clock(fixed_clock);
        (service, sink, notifier)
    }

    #[tokio::test]
    async fn empty_export_fails_without_a_file() {
        let (service, sink, notifier) = service();

        let result = service
            .export_current_page(&job(Vec::new()), ExportFormat::Csv)
            .await;

        assert_eq!(result, Err(ExportError::Empty));
        assert!(sink.files.borrow().is_empty());
        assert!(!service.is_busy());
        let notices = notifier.notices.borrow();
        assert_eq!(notices.last().map(|n| n.stage), Some(NoticeStage::Failure));
    }

    #[tokio::test]
    async fn notices_progress_to_success() {
        let (service, sink, notifier) = service();

        let path = service
            .export_current_page(&job(vec![person(1)]), ExportFormat::Csv)
            .await
            .expect("should export");

        assert_eq!(
            path,
            PathBuf::from("/downloads/people-export-2024-01-02T03-04-05-000Z.csv")
        );
        let stages: Vec<NoticeStage> = notifier.notices.borrow().iter().map(|n| n.stage).collect();
        assert_eq!(
            stages,
            vec![
                NoticeStage::Preparing,
                NoticeStage::Processing,
                NoticeStage::Success
            ]
        );
        let files = sink.files.borrow();
        assert_eq!(files[0].mime_type, "text/csv");
        assert_eq!(files[0].bytes, b"Name\nperson 1\n".to_vec());
    }

    #[tokio::test]
    async fn busy_flag_is_held_while_the_export_runs() {
        let (service, _sink, notifier) = service();
        let job = job(vec![person(1)]);

        let running = service.export_current_page(&job, ExportFormat::Csv);
        let observed = async {
            tokio::time::sleep(NOTICE_FRAME / 2).await;
            let busy = service.is_busy();
            let stage = notifier.notices.borrow().last().map(|n| n.stage);
            (busy, stage)
        };
        let (result, (busy, stage)) = tokio::join!(running, observed);

        assert!(result.is_ok());
        assert!(busy, "busy flag should be visible mid-export");
        assert_ne!(stage, Some(NoticeStage::Success));
        assert!(!service.is_busy());
    }

    #[tokio::test]
    async fn second_export_while_busy_is_rejected() {
        let (service, _sink, _notifier) = service();

        service.start().expect("should claim busy flag");
        let second = service
            .export_current_page(&job(vec![person(1)]), ExportFormat::Csv)
            .await;

        assert_eq!(second, Err(ExportError::Busy));
        assert!(service.is_busy());
    }

    #[test]
    fn selected_rows_include_other_pages_in_sort_order() {
        let mut selection = SelectionSet::new();
        for id in [1, 2, 15] {
            selection.select(RowId::from(id));
        }
        let page_two: Vec<Person> = (10..20).map(person).collect();

        let directory: &dyn FetchByIds<Person> = &Directory;

        let rows = selected_rows(&page_two, &selection, Some(directory), ("id", SortOrder::Desc));

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![15, 2, 1]);
    }

    #[test]
    fn by_id_failure_falls_back_to_current_page() {
        let mut selection = SelectionSet::new();
        selection.select(RowId::from(1));
        selection.select(RowId::from(12));
        let page_two: Vec<Person> = (10..20).map(person).collect();

        let offline: &dyn FetchByIds<Person> = &Offline;

        let rows = selected_rows(&page_two, &selection, Some(offline), ("id", SortOrder::Asc));

        assert_eq!(rows, vec![person(12)]);
    }

    #[tokio::test]
    async fn export_all_walks_every_page() {
        let (service, sink, _notifier) = service();
        let job = ExportJob {
            source: Some(Arc::new(Directory)),
            ..job(Vec::new())
        };

        service
            .export(ExportScope::All, &job, None, ExportFormat::Csv)
            .await
            .expect("should export all");

        let files = sink.files.borrow();
        let text = String::from_utf8(files[0].bytes.clone()).expect("should be utf-8");
        assert_eq!(text.lines().count(), 251);
    }

    #[tokio::test]
    async fn source_failure_clears_busy_flag() {
        let (service, _sink, notifier) = service();
        let job = ExportJob {
            source: Some(Arc::new(Offline)),
            ..job(Vec::new())
        };

        let result = service.export_all(&job, ExportFormat::Excel).await;

        assert!(matches!(result, Err(ExportError::Source(_))));
        assert!(!service.is_busy());
        assert_eq!(
            notifier.notices.borrow().last().map(|n| n.stage),
            Some(NoticeStage::Failure)
        );
    }
}
