use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::{ProjectDirs, UserDirs};
use log::LevelFilter;

pub const LOG_LEVEL_ENV: &str = "HRDESK_LOG";
pub const DEMO_EMPLOYEES: usize = 240;

/// Filesystem layout and runtime switches of the desktop app.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub webview_dir: PathBuf,
    pub export_dir: PathBuf,
    pub log_level: LevelFilter,
    pub seed_rows: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "hrdesk", "hrdesk")
            .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
        let export_dir = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| project_dirs.data_local_dir().join("exports"));

        Ok(Self::with_dirs(
            project_dirs.data_local_dir(),
            project_dirs.cache_dir(),
            export_dir,
            std::env::var(LOG_LEVEL_ENV).ok().as_deref(),
        ))
    }

    pub fn with_dirs(
        data_dir: &Path,
        cache_dir: &Path,
        export_dir: PathBuf,
        log_level: Option<&str>,
    ) -> Self {
        Self {
            db_path: data_dir.join("hrdesk.sqlite"),
            log_path: cache_dir.join("hrdesk.log"),
            webview_dir: data_dir.join("webview2"),
            export_dir,
            log_level: parse_level(log_level),
            seed_rows: DEMO_EMPLOYEES,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.db_path.parent(),
            self.log_path.parent(),
            Some(self.webview_dir.as_path()),
        ]
        .into_iter()
        .flatten()
        {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create dir: {}", dir.display()))?;
        }
        Ok(())
    }
}

/// `HRDESK_LOG=debug` and friends; anything unparsable means `info`.
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_falls_back_to_info() {
        assert_eq!(parse_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(parse_level(Some(" WARN ")), LevelFilter::Warn);
        assert_eq!(parse_level(Some("loud")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }

    #[test]
    fn paths_hang_off_the_project_dirs() {
        let config = AppConfig::with_dirs(
            Path::new("/data"),
            Path::new("/cache"),
            PathBuf::from("/downloads"),
            None,
        );

        assert_eq!(config.db_path, PathBuf::from("/data/hrdesk.sqlite"));
        assert_eq!(config.log_path, PathBuf::from("/cache/hrdesk.log"));
        assert_eq!(config.webview_dir, PathBuf::from("/data/webview2"));
    }
}
