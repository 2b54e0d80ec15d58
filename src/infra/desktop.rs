use std::path::PathBuf;

use anyhow::Context;
use rfd::FileDialog;

use crate::domain::entities::export::ExportFile;
use crate::usecase::ports::export::{ExportError, FileSink};

/// Writes exports into a folder, optionally asking for the target path with
/// a native save dialog first.
pub struct DownloadSink {
    pub dir: PathBuf,
    pub ask: bool,
}

impl DownloadSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, ask: false }
    }

    pub fn with_dialog(mut self, ask: bool) -> Self {
        self.ask = ask;
        self
    }

    fn target(&self, file: &ExportFile) -> Result<PathBuf, ExportError> {
        if !self.ask {
            return Ok(self.dir.join(&file.file_name));
        }
        let extension = file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        FileDialog::new()
            .set_directory(&self.dir)
            .set_file_name(&file.file_name)
            .add_filter(extension.to_uppercase(), &[extension])
            .save_file()
            .ok_or(ExportError::Cancelled)
    }
}

impl FileSink for DownloadSink {
    fn save(&self, file: &ExportFile) -> Result<PathBuf, ExportError> {
        let path = self.target(file)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create export dir: {}", parent.display()))
                .map_err(|err| ExportError::Sink(format!("{err:#}")))?;
        }
        std::fs::write(&path, &file.bytes)
            .with_context(|| format!("failed to write export: {}", path.display()))
            .map_err(|err| ExportError::Sink(format!("{err:#}")))?;
        Ok(path)
    }
}
