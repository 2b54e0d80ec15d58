pub mod column;
pub mod employee;
pub mod export;
pub mod layout;
pub mod query;
pub mod row;
pub mod selection;
