use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::form_urlencoded;

use crate::domain::entities::query::{
    ColumnFilter, DateRange, QueryState, SortOrder, DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
    DEFAULT_SORT_BY,
};
use crate::usecase::ports::navigator::Navigator;

/// Conversion between a typed value and its query-string form.
///
/// `decode` never fails: malformed input yields the key's default.
pub trait UrlCodec: Clone + PartialEq {
    fn encode(&self) -> String;
    fn decode(raw: &str, default: &Self) -> Self;
}

impl UrlCodec for u32 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str, default: &Self) -> Self {
        raw.trim().parse().unwrap_or(*default)
    }
}

impl UrlCodec for i64 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str, default: &Self) -> Self {
        raw.trim().parse().unwrap_or(*default)
    }
}

impl UrlCodec for bool {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str, _default: &Self) -> Self {
        raw == "true"
    }
}

impl UrlCodec for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(raw: &str, _default: &Self) -> Self {
        raw.to_string()
    }
}

impl UrlCodec for SortOrder {
    fn encode(&self) -> String {
        self.as_str().to_string()
    }

    fn decode(raw: &str, default: &Self) -> Self {
        SortOrder::parse(raw).unwrap_or(*default)
    }
}

impl UrlCodec for DateRange {
    fn encode(&self) -> String {
        encode_json(self)
    }

    fn decode(raw: &str, default: &Self) -> Self {
        let range: DateRange = decode_json(raw, default);
        if range.is_complete() {
            range
        } else {
            log::warn!("ignoring incomplete dateRange in location: {raw}");
            default.clone()
        }
    }
}

impl UrlCodec for BTreeMap<String, bool> {
    fn encode(&self) -> String {
        encode_json(self)
    }

    fn decode(raw: &str, default: &Self) -> Self {
        decode_json(raw, default)
    }
}

impl UrlCodec for Vec<ColumnFilter> {
    fn encode(&self) -> String {
        encode_json(self)
    }

    fn decode(raw: &str, default: &Self) -> Self {
        decode_json(raw, default)
    }
}

fn encode_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn decode_json<T: DeserializeOwned + Clone>(raw: &str, default: &T) -> T {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("failed to parse json location value {raw:?}: {err}");
            default.clone()
        }
    }
}

/// A named location parameter with its default value.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlKey<T> {
    pub name: &'static str,
    pub default: T,
}

impl<T: UrlCodec> UrlKey<T> {
    pub fn new(name: &'static str, default: T) -> Self {
        Self { name, default }
    }
}

pub mod keys {
    use super::*;

    pub const PAGE: &str = "page";
    pub const PAGE_SIZE: &str = "pageSize";
    pub const SEARCH: &str = "search";
    pub const DATE_RANGE: &str = "dateRange";
    pub const SORT_BY: &str = "sortBy";
    pub const SORT_ORDER: &str = "sortOrder";
    pub const COLUMN_VISIBILITY: &str = "columnVisibility";
    pub const COLUMN_FILTERS: &str = "columnFilters";

    pub fn page() -> UrlKey<u32> {
        UrlKey::new(PAGE, DEFAULT_PAGE)
    }

    pub fn page_size() -> UrlKey<u32> {
        UrlKey::new(PAGE_SIZE, DEFAULT_PAGE_SIZE)
    }

    pub fn search() -> UrlKey<String> {
        UrlKey::new(SEARCH, String::new())
    }

    pub fn date_range() -> UrlKey<DateRange> {
        UrlKey::new(DATE_RANGE, DateRange::default())
    }

    pub fn sort_by() -> UrlKey<String> {
        UrlKey::new(SORT_BY, DEFAULT_SORT_BY.to_string())
    }

    pub fn sort_order() -> UrlKey<SortOrder> {
        UrlKey::new(SORT_ORDER, SortOrder::Desc)
    }

    pub fn column_visibility() -> UrlKey<BTreeMap<String, bool>> {
        UrlKey::new(COLUMN_VISIBILITY, BTreeMap::new())
    }

    pub fn column_filters() -> UrlKey<Vec<ColumnFilter>> {
        UrlKey::new(COLUMN_FILTERS, Vec::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Replace,
    Push,
}

/// Result of a write, telling the caller whether it must schedule a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// The value already matched; nothing was queued.
    Unchanged,
    /// First write of a new batch; the caller schedules exactly one flush.
    Scheduled,
    /// Folded into a batch that already has a flush scheduled.
    Coalesced,
}

impl BatchStatus {
    pub fn needs_flush(self) -> bool {
        matches!(self, BatchStatus::Scheduled)
    }
}

/// Owner of the location-backed table state.
///
/// Writes accumulate in a pending map and reach the navigator in one call on
/// `flush`, so writers of independent keys never race each other.
pub struct UrlStateStore {
    navigator: Box<dyn Navigator>,
    params: BTreeMap<String, String>,
    pending: BTreeMap<String, Option<String>>,
    linked_resets: Vec<(&'static str, &'static str)>,
    history: HistoryMode,
    enabled: bool,
}

impl UrlStateStore {
    /// Builds a store seeded from the navigator's current location. Writing
    /// `pageSize` resets `page`.
    pub fn new(navigator: Box<dyn Navigator>) -> Self {
        let params = parse_query(&navigator.location());
        Self {
            navigator,
            params,
            pending: BTreeMap::new(),
            linked_resets: vec![(keys::PAGE_SIZE, keys::PAGE)],
            history: HistoryMode::Replace,
            enabled: true,
        }
    }

    pub fn with_history(mut self, history: HistoryMode) -> Self {
        self.history = history;
        self
    }

    /// A disabled store keeps state in memory and never touches the navigator.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        if !enabled {
            self.params.clear();
        }
        self
    }

    pub fn get_value<T: UrlCodec>(&self, key: &UrlKey<T>) -> T {
        if let Some(pending) = self.pending.get(key.name) {
            return match pending {
                Some(raw) => T::decode(raw, &key.default),
                None => key.default.clone(),
            };
        }
        match self.params.get(key.name) {
            Some(raw) => T::decode(raw, &key.default),
            None => key.default.clone(),
        }
    }

    pub fn set_value<T: UrlCodec>(&mut self, key: &UrlKey<T>, value: T) -> BatchStatus {
        if self.get_value(key) == value {
            return BatchStatus::Unchanged;
        }

        let batch_open = !self.pending.is_empty();
        let encoded = if value == key.default {
            None
        } else {
            Some(value.encode())
        };
        self.pending.insert(key.name.to_string(), encoded);

        for (trigger, dependent) in &self.linked_resets {
            if *trigger == key.name {
                self.pending.insert((*dependent).to_string(), None);
            }
        }

        if batch_open {
            BatchStatus::Coalesced
        } else {
            BatchStatus::Scheduled
        }
    }

    pub fn update_value<T: UrlCodec>(
        &mut self,
        key: &UrlKey<T>,
        update: impl FnOnce(T) -> T,
    ) -> BatchStatus {
        let next = update(self.get_value(key));
        self.set_value(key, next)
    }

    /// Writes both sort keys in the same batch so no location ever shows a
    /// new column with a stale direction.
    pub fn set_sort(&mut self, sort_by: &str, sort_order: SortOrder) -> BatchStatus {
        let first = self.set_value(&keys::sort_by(), sort_by.to_string());
        let second = self.set_value(&keys::sort_order(), sort_order);
        combine(first, second)
    }

    /// Queues removal of every key, returning the table to its defaults.
    pub fn reset(&mut self) -> BatchStatus {
        let batch_open = !self.pending.is_empty();
        let names: BTreeSet<String> = self
            .params
            .keys()
            .chain(self.pending.keys())
            .cloned()
            .collect();
        if names.is_empty() {
            return BatchStatus::Unchanged;
        }
        for name in names {
            self.pending.insert(name, None);
        }
        if batch_open {
            BatchStatus::Coalesced
        } else {
            BatchStatus::Scheduled
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Applies the pending batch in one navigation and returns the keys whose
    /// stored value changed.
    pub fn flush(&mut self) -> Vec<String> {
        if self.pending.is_empty() {
            return Vec::new();
        }

        let mut next = self.params.clone();
        for (name, value) in std::mem::take(&mut self.pending) {
            match value {
                Some(raw) => {
                    next.insert(name, raw);
                }
                None => {
                    next.remove(&name);
                }
            }
        }

        let changed = changed_keys(&self.params, &next);
        self.params = next;
        if changed.is_empty() || !self.enabled {
            return changed;
        }

        let query = encode_query(&self.params);
        log::debug!("location update: ?{query}");
        match self.history {
            HistoryMode::Replace => self.navigator.replace(&query),
            HistoryMode::Push => self.navigator.push(&query),
        }
        changed
    }

    /// Adopts a location that changed outside the store (back/forward).
    ///
    /// A location equal to what the store already holds is its own echo and
    /// is ignored. Keys with an unflushed local write keep the local value and
    /// are not reported.
    pub fn sync_location(&mut self, query: &str) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }
        let incoming = parse_query(query);
        if incoming == self.params {
            return Vec::new();
        }

        let changed = changed_keys(&self.params, &incoming);
        self.params = incoming;
        changed
            .into_iter()
            .filter(|name| !self.pending.contains_key(name))
            .collect()
    }

    pub fn back(&mut self) -> Vec<String> {
        match self.navigator.back() {
            Some(query) => self.sync_location(&query),
            None => Vec::new(),
        }
    }

    pub fn forward(&mut self) -> Vec<String> {
        match self.navigator.forward() {
            Some(query) => self.sync_location(&query),
            None => Vec::new(),
        }
    }

    /// Query string as last flushed.
    pub fn query_string(&self) -> String {
        encode_query(&self.params)
    }

    pub fn query_state(&self) -> QueryState {
        QueryState {
            page: self.get_value(&keys::page()).max(1),
            page_size: self.get_value(&keys::page_size()).max(1),
            search: self.get_value(&keys::search()),
            date_range: self.get_value(&keys::date_range()),
            sort_by: self.get_value(&keys::sort_by()),
            sort_order: self.get_value(&keys::sort_order()),
            column_visibility: self.get_value(&keys::column_visibility()),
            column_filters: self.get_value(&keys::column_filters()),
        }
    }
}

fn combine(first: BatchStatus, second: BatchStatus) -> BatchStatus {
    match (first, second) {
        (BatchStatus::Scheduled, _) | (_, BatchStatus::Scheduled) => BatchStatus::Scheduled,
        (BatchStatus::Coalesced, _) | (_, BatchStatus::Coalesced) => BatchStatus::Coalesced,
        _ => BatchStatus::Unchanged,
    }
}

fn changed_keys(before: &BTreeMap<String, String>, after: &BTreeMap<String, String>) -> Vec<String> {
    before
        .keys()
        .chain(after.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|name| before.get(*name) != after.get(*name))
        .cloned()
        .collect()
}

pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    let query = query.trim_start_matches('?');
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

pub fn encode_query(params: &BTreeMap<String, String>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}
