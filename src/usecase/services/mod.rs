pub mod debounce;
pub mod export_service;
pub mod layout_service;
pub mod query_service;
pub mod url_state;
