pub mod export;
pub mod fetch;
pub mod navigator;
pub mod storage;
