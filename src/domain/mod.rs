pub mod entities;
pub mod search;
