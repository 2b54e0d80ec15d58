pub mod desktop;
pub mod export;
pub mod location;
pub mod memory;
pub mod sqlite;
