use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entities::export::ExportFile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("no data available to export")]
    Empty,
    #[error("an export is already running")]
    Busy,
    #[error("failed to build csv: {0}")]
    Csv(String),
    #[error("failed to build excel workbook: {0}")]
    Xlsx(String),
    #[error("failed to collect rows: {0}")]
    Source(String),
    #[error("failed to save export: {0}")]
    Sink(String),
    #[error("export cancelled")]
    Cancelled,
}

/// Where a finished export file goes (download folder, save dialog, memory).
pub trait FileSink {
    fn save(&self, file: &ExportFile) -> Result<PathBuf, ExportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStage {
    Preparing,
    Processing,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub stage: NoticeStage,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(stage: NoticeStage, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stage,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.stage, NoticeStage::Success | NoticeStage::Failure)
    }
}

/// Single-slot notification channel: each notice replaces the previous one.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}
