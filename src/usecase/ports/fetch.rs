use std::sync::Arc;

use thiserror::Error;

use crate::domain::entities::query::{FetchParams, PageResult};
use crate::domain::entities::row::RowId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("failed to load data: {0}")]
    Source(String),
    #[error("failed to decode data: {0}")]
    Decode(String),
}

/// Imperative fetch boundary, invoked once per dependency change.
pub trait PageSource<T> {
    fn fetch_page(&self, params: &FetchParams) -> Result<PageResult<T>, FetchError>;
}

/// Materializes full records for IDs that are not on the rendered page.
pub trait FetchByIds<T> {
    fn fetch_by_ids(&self, ids: &[RowId]) -> Result<Vec<T>, FetchError>;
}

/// Status flags of a reactive query, mirrored into the table's load state.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<T> {
    pub is_loading: bool,
    pub is_success: bool,
    pub is_error: bool,
    pub data: Option<PageResult<T>>,
    pub error: Option<FetchError>,
}

impl<T> QuerySnapshot<T> {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            is_success: false,
            is_error: false,
            data: None,
            error: None,
        }
    }

    pub fn success(data: PageResult<T>) -> Self {
        Self {
            is_loading: false,
            is_success: true,
            is_error: false,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: FetchError) -> Self {
        Self {
            is_loading: false,
            is_success: false,
            is_error: true,
            data: None,
            error: Some(error),
        }
    }
}

/// Pull-style boundary polled while the table renders.
pub trait ReactiveQuery<T> {
    fn query(&self, params: &FetchParams) -> QuerySnapshot<T>;
}

pub enum FetchBoundary<T> {
    Imperative(Arc<dyn PageSource<T>>),
    Reactive(Arc<dyn ReactiveQuery<T>>),
}

impl<T> FetchBoundary<T> {
    pub fn is_query_hook(&self) -> bool {
        matches!(self, FetchBoundary::Reactive(_))
    }
}

impl<T> Clone for FetchBoundary<T> {
    fn clone(&self) -> Self {
        match self {
            FetchBoundary::Imperative(source) => FetchBoundary::Imperative(source.clone()),
            FetchBoundary::Reactive(query) => FetchBoundary::Reactive(query.clone()),
        }
    }
}
