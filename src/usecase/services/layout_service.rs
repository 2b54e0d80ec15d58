use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::entities::column::{apply_column_order, ColumnDescriptor};
use crate::domain::entities::layout::{
    default_sizing, ColumnLayout, ColumnSizing, MIN_COLUMN_WIDTH,
};
use crate::usecase::ports::storage::{PreferenceStore, StorageError};

pub fn sizing_key(table_id: &str) -> String {
    format!("columnSizing-{table_id}")
}

pub fn order_key(table_id: &str) -> String {
    format!("columnOrder-{table_id}")
}

/// Column sizing and order per table, kept in durable storage. A failing
/// store degrades to the in-memory copy.
pub struct ColumnLayoutManager {
    store: Arc<dyn PreferenceStore>,
    sizing: BTreeMap<String, ColumnSizing>,
    order: BTreeMap<String, Vec<String>>,
    remeasure_epoch: u64,
}

impl ColumnLayoutManager {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            sizing: BTreeMap::new(),
            order: BTreeMap::new(),
            remeasure_epoch: 0,
        }
    }

    /// Bumped on every reset; the view re-measures when it changes.
    pub fn remeasure_epoch(&self) -> u64 {
        self.remeasure_epoch
    }

    pub fn layout(&mut self, table_id: &str) -> ColumnLayout {
        ColumnLayout {
            sizing: self.get_sizing(table_id),
            order: self.get_order(table_id),
        }
    }

    pub fn get_sizing(&mut self, table_id: &str) -> ColumnSizing {
        if let Some(sizing) = self.sizing.get(table_id) {
            return sizing.clone();
        }
        let sizing: ColumnSizing = self.load(&sizing_key(table_id)).unwrap_or_default();
        self.sizing.insert(table_id.to_string(), sizing.clone());
        sizing
    }

    pub fn set_sizing(&mut self, table_id: &str, sizing: ColumnSizing) {
        self.save(&sizing_key(table_id), &sizing);
        self.sizing.insert(table_id.to_string(), sizing);
    }

    pub fn resize_column(&mut self, table_id: &str, column_id: &str, width: f64) {
        let mut sizing = self.get_sizing(table_id);
        sizing.insert(column_id.to_string(), width.max(MIN_COLUMN_WIDTH));
        self.set_sizing(table_id, sizing);
    }

    pub fn reset_sizing(&mut self, table_id: &str) {
        self.sizing.remove(table_id);
        self.remove(&sizing_key(table_id));
        self.remeasure_epoch += 1;
    }

    /// Fills in widths derived from the descriptors when nothing is stored
    /// for the table. Existing sizing is left alone.
    pub fn initialize_defaults(
        &mut self,
        table_id: &str,
        columns: &[ColumnDescriptor],
    ) -> ColumnSizing {
        let current = self.get_sizing(table_id);
        if !current.is_empty() {
            return current;
        }
        let defaults = default_sizing(columns);
        log::debug!("initialized {} column widths for {table_id}", defaults.len());
        self.sizing.insert(table_id.to_string(), defaults.clone());
        defaults
    }

    pub fn get_order(&mut self, table_id: &str) -> Vec<String> {
        if let Some(order) = self.order.get(table_id) {
            return order.clone();
        }
        let order: Vec<String> = self.load(&order_key(table_id)).unwrap_or_default();
        self.order.insert(table_id.to_string(), order.clone());
        order
    }

    pub fn set_order(&mut self, table_id: &str, order: Vec<String>) {
        self.save(&order_key(table_id), &order);
        self.order.insert(table_id.to_string(), order);
    }

    /// Moves `column_id` one slot left (`-1`) or right (`1`) within the
    /// effective order of `columns`.
    pub fn move_column(
        &mut self,
        table_id: &str,
        columns: &[ColumnDescriptor],
        column_id: &str,
        step: isize,
    ) {
        let stored = self.get_order(table_id);
        let mut order: Vec<String> = apply_column_order(columns, &stored)
            .into_iter()
            .map(|column| column.id.clone())
            .collect();
        let Some(index) = order.iter().position(|id| id == column_id) else {
            return;
        };
        let target = index as isize + step;
        if target < 0 || target as usize >= order.len() {
            return;
        }
        order.swap(index, target as usize);
        self.set_order(table_id, order);
    }

    pub fn reset_order(&mut self, table_id: &str) {
        self.order.remove(table_id);
        self.remove(&order_key(table_id));
        self.remeasure_epoch += 1;
    }

    fn load<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                log::warn!("failed to read {key}: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{}", StorageError::Corrupt(format!("{key}: {err}")));
                None
            }
        }
    }

    fn save<V: Serialize>(&self, key: &str, value: &V) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("failed to encode {key}: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(key, &raw) {
            log::warn!("failed to persist {key}: {err}");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            log::warn!("failed to clear {key}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MapStore {
        values: RefCell<BTreeMap<String, String>>,
    }

    impl PreferenceStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.values.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.values
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.values.borrow_mut().remove(key);
            Ok(())
        }
    }

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::select(),
            ColumnDescriptor::data("name", "Name"),
            ColumnDescriptor::data("email", "Email"),
        ]
    }

    #[test]
    fn tables_do_not_share_preferences() {
        let store = Arc::new(MapStore::default());
        let mut manager = ColumnLayoutManager::new(store.clone());

        manager.resize_column("employees", "name", 300.0);
        manager.set_order("payslips", vec!["email".to_string()]);

        assert_eq!(manager.get_sizing("employees").get("name"), Some(&300.0));
        assert!(manager.get_sizing("payslips").is_empty());
        assert!(manager.get_order("employees").is_empty());
        assert!(store.values.borrow().contains_key("columnSizing-employees"));
        assert!(store.values.borrow().contains_key("columnOrder-payslips"));

        let mut reloaded = ColumnLayoutManager::new(store);
        let payslips = reloaded.layout("payslips");
        assert_eq!(payslips.order, vec!["email".to_string()]);
        assert!(payslips.sizing.is_empty());
    }

    #[test]
    fn defaults_are_computed_once_until_reset() {
        let store = Arc::new(MapStore::default());
        let mut manager = ColumnLayoutManager::new(store.clone());

        let first = manager.initialize_defaults("employees", &columns());
        manager.resize_column("employees", "email", 260.0);
        let second = manager.initialize_defaults("employees", &columns());

        assert_eq!(first.get("email"), Some(&150.0));
        assert_eq!(second.get("email"), Some(&260.0));

        manager.reset_sizing("employees");
        assert_eq!(manager.remeasure_epoch(), 1);
        assert!(!store.values.borrow().contains_key("columnSizing-employees"));
        let third = manager.initialize_defaults("employees", &columns());
        assert_eq!(third.get("email"), Some(&150.0));
    }

    #[test]
    fn move_column_swaps_neighbours() {
        let mut manager = ColumnLayoutManager::new(Arc::new(MapStore::default()));

        manager.move_column("employees", &columns(), "email", -1);
        manager.move_column("employees", &columns(), "select", -1);

        assert_eq!(
            manager.get_order("employees"),
            vec!["select".to_string(), "email".to_string(), "name".to_string()]
        );

        manager.reset_order("employees");
        assert!(manager.get_order("employees").is_empty());
    }

    #[test]
    fn broken_storage_falls_back_to_memory() {
        let mut manager = ColumnLayoutManager::new(Arc::new(BrokenStore));

        manager.resize_column("employees", "name", 10.0);

        assert_eq!(
            manager.get_sizing("employees").get("name"),
            Some(&MIN_COLUMN_WIDTH)
        );
        manager.reset_sizing("employees");
        assert!(manager.get_sizing("employees").is_empty());
    }

    #[test]
    fn corrupt_entry_is_ignored() {
        let store = Arc::new(MapStore::default());
        store
            .set("columnOrder-employees", "{not json")
            .expect("should write raw value");
        let mut manager = ColumnLayoutManager::new(store);

        assert!(manager.get_order("employees").is_empty());
    }
}
