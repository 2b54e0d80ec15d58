pub mod employees;
pub mod preferences;
pub mod schema;
