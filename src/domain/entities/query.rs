use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::search::preprocess_search;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SORT_BY: &str = "created_at";
pub const PAGE_SIZE_OPTIONS: [u32; 5] = [10, 20, 30, 40, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Inclusive `YYYY-MM-DD` bounds; both empty means "no date filter".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from_date: String,
    pub to_date: String,
}

impl DateRange {
    pub fn new(from_date: impl Into<String>, to_date: impl Into<String>) -> Self {
        Self {
            from_date: from_date.into(),
            to_date: to_date.into(),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from_date.is_empty() && self.to_date.is_empty()
    }

    /// A range read back from a location is only trusted when both ends are
    /// real calendar dates.
    pub fn is_complete(&self) -> bool {
        is_valid_date(&self.from_date) && is_valid_date(&self.to_date)
    }
}

pub fn is_valid_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: String,
    pub value: serde_json::Value,
}

/// Everything needed to reproduce one fetch plus the view-only keys that
/// travel with it in the location.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    pub date_range: DateRange,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub column_visibility: BTreeMap<String, bool>,
    pub column_filters: Vec<ColumnFilter>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            date_range: DateRange::default(),
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_order: SortOrder::Desc,
            column_visibility: BTreeMap::new(),
            column_filters: Vec::new(),
        }
    }
}

impl QueryState {
    pub fn fetch_params(&self) -> FetchParams {
        FetchParams {
            page: self.page.max(1),
            limit: self.page_size.max(1),
            search: preprocess_search(&self.search),
            from_date: self.date_range.from_date.clone(),
            to_date: self.date_range.to_date.clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
        }
    }

    pub fn is_column_visible(&self, column_id: &str) -> bool {
        self.column_visibility
            .get(column_id)
            .copied()
            .unwrap_or(true)
    }
}

/// Wire-level parameters handed to a fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub from_date: String,
    pub to_date: String,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl FetchParams {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl<T> PageResult<T> {
    pub fn new(rows: Vec<T>, page: u32, page_size: u32, total_items: u64) -> Self {
        Self {
            rows,
            page,
            page_size,
            total_pages: total_pages(total_items, page_size),
            total_items,
        }
    }
}

pub fn total_pages(total_items: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_items.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
