use std::sync::Arc;

use crate::domain::entities::query::{FetchParams, PageResult, QueryState};
use crate::domain::entities::row::{RowId, TableRow};
use crate::usecase::ports::fetch::{FetchBoundary, FetchError, PageSource, QuerySnapshot};

/// One issued fetch. Only the most recently issued ticket may update the
/// table; anything older is discarded on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub params: FetchParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// New data is on screen. `reset_page` asks the caller to return to page
    /// 1 because the requested page is past the end.
    Applied { reset_page: bool },
    /// The error is surfaced; the previous rows stay visible.
    Failed,
    /// A newer fetch was issued before this one completed.
    Stale,
    /// Reactive query still loading.
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadState<T> {
    pub data: Option<PageResult<T>>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: true,
            error: None,
        }
    }
}

pub struct QueryOrchestrator<T> {
    boundary: FetchBoundary<T>,
    load: LoadState<T>,
    next_seq: u64,
    latest_seq: Option<u64>,
    last_params: Option<FetchParams>,
}

impl<T: Clone> QueryOrchestrator<T> {
    pub fn new(boundary: FetchBoundary<T>) -> Self {
        Self {
            boundary,
            load: LoadState::default(),
            next_seq: 0,
            latest_seq: None,
            last_params: None,
        }
    }

    pub fn is_query_hook(&self) -> bool {
        self.boundary.is_query_hook()
    }

    /// The imperative source, when the table was built with one.
    pub fn source(&self) -> Option<Arc<dyn PageSource<T>>> {
        match &self.boundary {
            FetchBoundary::Imperative(source) => Some(source.clone()),
            FetchBoundary::Reactive(_) => None,
        }
    }

    pub fn load_state(&self) -> &LoadState<T> {
        &self.load
    }

    pub fn rows(&self) -> &[T] {
        self.load
            .data
            .as_ref()
            .map(|page| page.rows.as_slice())
            .unwrap_or(&[])
    }

    /// Forces the next `begin_fetch` to issue even if parameters are equal.
    pub fn invalidate(&mut self) {
        self.last_params = None;
    }

    /// Issues a ticket when the fetch-relevant parameters changed since the
    /// last issued fetch.
    pub fn begin_fetch(&mut self, state: &QueryState) -> Option<FetchTicket> {
        let params = state.fetch_params();
        if self.last_params.as_ref() == Some(&params) {
            return None;
        }

        self.next_seq += 1;
        self.latest_seq = Some(self.next_seq);
        self.last_params = Some(params.clone());
        self.load.is_loading = true;
        log::debug!("fetch #{} issued: {:?}", self.next_seq, params);

        Some(FetchTicket {
            seq: self.next_seq,
            params,
        })
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<PageResult<T>, FetchError>,
    ) -> FetchOutcome {
        if self.latest_seq != Some(ticket.seq) {
            log::debug!(
                "discarding fetch #{} (latest is {:?})",
                ticket.seq,
                self.latest_seq
            );
            return FetchOutcome::Stale;
        }

        self.load.is_loading = false;
        match result {
            Ok(page) => {
                let reset_page = page_past_end(ticket.params.page, page.total_pages);
                self.load.data = Some(page);
                self.load.error = None;
                FetchOutcome::Applied { reset_page }
            }
            Err(err) => {
                log::error!("error fetching data: {err}");
                self.load.error = Some(err);
                // a failed query stays eligible for the next begin_fetch
                self.last_params = None;
                FetchOutcome::Failed
            }
        }
    }

    /// Copies a reactive query's flags into the load state.
    pub fn mirror(&mut self, snapshot: QuerySnapshot<T>, requested_page: u32) -> FetchOutcome {
        self.load.is_loading = snapshot.is_loading;

        if snapshot.is_error {
            let err = snapshot
                .error
                .unwrap_or_else(|| FetchError::Source("unknown error".to_string()));
            log::error!("error fetching data: {err}");
            self.load.error = Some(err);
            self.last_params = None;
            return FetchOutcome::Failed;
        }

        match snapshot.data {
            Some(page) if snapshot.is_success => {
                let reset_page = page_past_end(requested_page, page.total_pages);
                self.load.data = Some(page);
                self.load.error = None;
                FetchOutcome::Applied { reset_page }
            }
            _ => FetchOutcome::Pending,
        }
    }

    /// Runs one synchronous refresh through whichever boundary the table uses.
    /// Returns `None` when nothing relevant changed for an imperative source.
    pub fn refresh(&mut self, state: &QueryState) -> Option<FetchOutcome> {
        match self.boundary.clone() {
            FetchBoundary::Imperative(source) => {
                let ticket = self.begin_fetch(state)?;
                let result = source.fetch_page(&ticket.params);
                Some(self.complete_fetch(ticket, result))
            }
            FetchBoundary::Reactive(query) => {
                let params = state.fetch_params();
                let snapshot = query.query(&params);
                Some(self.mirror(snapshot, params.page))
            }
        }
    }
}

impl<T: Clone + TableRow> QueryOrchestrator<T> {
    pub fn page_ids(&self) -> Vec<RowId> {
        self.rows().iter().map(TableRow::row_id).collect()
    }
}

fn page_past_end(page: u32, total_pages: u32) -> bool {
    total_pages > 0 && page > total_pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::domain::entities::row::CellValue;
    use crate::usecase::ports::fetch::ReactiveQuery;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(i64);

    impl TableRow for Item {
        fn row_id(&self) -> RowId {
            RowId::from(self.0)
        }

        fn cell(&self, _column_id: &str) -> CellValue {
            CellValue::Integer(self.0)
        }
    }

    #[derive(Default)]
    struct RecordingSource {
        calls: RefCell<Vec<FetchParams>>,
        total_items: u64,
        fail: bool,
    }

    impl PageSource<Item> for RecordingSource {
        fn fetch_page(&self, params: &FetchParams) -> Result<PageResult<Item>, FetchError> {
            self.calls.borrow_mut().push(params.clone());
            if self.fail {
                return Err(FetchError::Source("offline".to_string()));
            }
            let start = i64::from(params.page - 1) * i64::from(params.limit);
            let rows = (start..start + i64::from(params.limit))
                .take_while(|id| (*id as u64) < self.total_items)
                .map(Item)
                .collect();
            Ok(PageResult::new(rows, params.page, params.limit, self.total_items))
        }
    }

    fn page(rows: Vec<Item>, page_no: u32, total_items: u64) -> PageResult<Item> {
        PageResult::new(rows, page_no, 10, total_items)
    }

    #[test]
    fn issues_exactly_one_fetch_per_dependency_change() {
        let source = Arc::new(RecordingSource {
            total_items: 35,
            ..RecordingSource::default()
        });
        let mut orchestrator = QueryOrchestrator::new(FetchBoundary::Imperative(source.clone()));
        let mut state = QueryState::default();

        assert!(orchestrator.refresh(&state).is_some());
        assert!(orchestrator.refresh(&state).is_none());

        state.column_visibility.insert("email".to_string(), false);
        assert!(orchestrator.refresh(&state).is_none());

        state.page = 2;
        assert!(orchestrator.refresh(&state).is_some());

        assert_eq!(source.calls.borrow().len(), 2);
        assert_eq!(orchestrator.page_ids().first(), Some(&RowId::from(10)));
    }

    #[test]
    fn search_is_sanitized_before_reaching_the_source() {
        let source = Arc::new(RecordingSource::default());
        let mut orchestrator = QueryOrchestrator::new(FetchBoundary::Imperative(source.clone()));
        let state = QueryState {
            search: "  John  Doe<script>".to_string(),
            ..QueryState::default()
        };

        orchestrator.refresh(&state);

        assert_eq!(source.calls.borrow()[0].search, "John Doe");
    }

    #[test]
    fn out_of_order_completion_is_discarded() {
        let source = Arc::new(RecordingSource::default());
        let mut orchestrator = QueryOrchestrator::new(FetchBoundary::Imperative(source));
        let mut state = QueryState::default();

        let first = orchestrator.begin_fetch(&state).expect("first ticket");
        state.page = 2;
        let second = orchestrator.begin_fetch(&state).expect("second ticket");

        let newer = orchestrator.complete_fetch(second, Ok(page(vec![Item(20)], 2, 30)));
        let older = orchestrator.complete_fetch(first, Ok(page(vec![Item(1)], 1, 30)));

        assert_eq!(newer, FetchOutcome::Applied { reset_page: false });
        assert_eq!(older, FetchOutcome::Stale);
        assert_eq!(orchestrator.rows(), &[Item(20)]);
    }

    #[test]
    fn failure_keeps_previous_rows() {
        let mut orchestrator =
            QueryOrchestrator::new(FetchBoundary::Imperative(Arc::new(RecordingSource::default())));
        let mut state = QueryState::default();

        let ticket = orchestrator.begin_fetch(&state).expect("ticket");
        orchestrator.complete_fetch(ticket, Ok(page(vec![Item(1), Item(2)], 1, 2)));

        state.search = "zzz".to_string();
        let ticket = orchestrator.begin_fetch(&state).expect("ticket");
        let outcome =
            orchestrator.complete_fetch(ticket, Err(FetchError::Source("timeout".to_string())));

        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(orchestrator.rows(), &[Item(1), Item(2)]);
        assert!(orchestrator.load_state().error.is_some());
        assert!(!orchestrator.load_state().is_loading);
    }

    struct FlakySource {
        calls: RefCell<u32>,
    }

    impl PageSource<Item> for FlakySource {
        fn fetch_page(&self, params: &FetchParams) -> Result<PageResult<Item>, FetchError> {
            *self.calls.borrow_mut() += 1;
            if *self.calls.borrow() == 1 {
                return Err(FetchError::Source("transient".to_string()));
            }
            Ok(PageResult::new(vec![Item(1)], params.page, params.limit, 1))
        }
    }

    #[test]
    fn same_query_is_issued_again_after_a_failure() {
        let source = Arc::new(FlakySource {
            calls: RefCell::new(0),
        });
        let mut orchestrator = QueryOrchestrator::new(FetchBoundary::Imperative(source.clone()));
        let state = QueryState::default();

        assert_eq!(orchestrator.refresh(&state), Some(FetchOutcome::Failed));
        let retry = orchestrator.refresh(&state);

        assert_eq!(retry, Some(FetchOutcome::Applied { reset_page: false }));
        assert_eq!(*source.calls.borrow(), 2);
        assert!(orchestrator.load_state().error.is_none());
        assert_eq!(orchestrator.rows(), &[Item(1)]);
        assert!(orchestrator.refresh(&state).is_none(), "success is cached again");
    }

    #[test]
    fn page_past_the_end_requests_reset() {
        let source = Arc::new(RecordingSource {
            total_items: 25,
            ..RecordingSource::default()
        });
        let mut orchestrator = QueryOrchestrator::new(FetchBoundary::Imperative(source));
        let state = QueryState {
            page: 5,
            ..QueryState::default()
        };

        let outcome = orchestrator.refresh(&state);

        assert_eq!(outcome, Some(FetchOutcome::Applied { reset_page: true }));
    }

    #[test]
    fn failed_source_surfaces_error() {
        let source = Arc::new(RecordingSource {
            fail: true,
            ..RecordingSource::default()
        });
        let mut orchestrator = QueryOrchestrator::new(FetchBoundary::Imperative(source));

        let outcome = orchestrator.refresh(&QueryState::default());

        assert_eq!(outcome, Some(FetchOutcome::Failed));
        assert_eq!(
            orchestrator.load_state().error,
            Some(FetchError::Source("offline".to_string()))
        );
    }

    struct ScriptedQuery {
        snapshots: RefCell<Vec<QuerySnapshot<Item>>>,
    }

    impl ReactiveQuery<Item> for ScriptedQuery {
        fn query(&self, _params: &FetchParams) -> QuerySnapshot<Item> {
            let mut snapshots = self.snapshots.borrow_mut();
            if snapshots.len() > 1 {
                snapshots.remove(0)
            } else {
                snapshots[0].clone()
            }
        }
    }

    #[test]
    fn reactive_query_flags_are_mirrored() {
        let query = Arc::new(ScriptedQuery {
            snapshots: RefCell::new(vec![
                QuerySnapshot::loading(),
                QuerySnapshot::success(page(vec![Item(3)], 1, 1)),
                QuerySnapshot::failure(FetchError::Decode("bad json".to_string())),
            ]),
        });
        let mut orchestrator = QueryOrchestrator::new(FetchBoundary::Reactive(query));
        let state = QueryState::default();
        assert!(orchestrator.is_query_hook());

        assert_eq!(orchestrator.refresh(&state), Some(FetchOutcome::Pending));
        assert!(orchestrator.load_state().is_loading);

        assert_eq!(
            orchestrator.refresh(&state),
            Some(FetchOutcome::Applied { reset_page: false })
        );
        assert_eq!(orchestrator.rows(), &[Item(3)]);

        assert_eq!(orchestrator.refresh(&state), Some(FetchOutcome::Failed));
        assert_eq!(orchestrator.rows(), &[Item(3)]);
    }
}
