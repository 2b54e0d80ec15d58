pub mod keyboard;
pub mod notice;
pub mod table_shell;
