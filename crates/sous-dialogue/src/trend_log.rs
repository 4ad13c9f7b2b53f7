//! Audit log of trend searches: one JSON file per pipeline run.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sous_ai::SearchResult;

/// What a trend run saw and produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub country: String,
    pub queries: Vec<String>,
    pub results: Vec<SearchResult>,
    pub summary: String,
}

/// Writes trend records under a directory.
///
/// Files are named `trend_<country>_<YYYYmmdd_HHMMSS>.json`. Two runs for the
/// same country in the same second overwrite each other.
#[derive(Debug, Clone)]
pub struct TrendLogger {
    dir: PathBuf,
}

impl TrendLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write a record, returning the file path.
    pub fn write(&self, record: &TrendRecord) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .dir
            .join(format!("trend_{}_{}.json", record.country, stamp));

        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, record)?;
        writer.flush()?;

        Ok(path)
    }

    /// Write a record, logging instead of failing.
    pub fn log(&self, record: &TrendRecord) -> Option<PathBuf> {
        match self.write(record) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "trend log saved");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.dir.display(), "failed to write trend log");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TrendRecord {
        TrendRecord {
            country: "일본".into(),
            queries: vec!["抹茶 トレンド".into()],
            results: vec![SearchResult {
                title: Some("抹茶ブーム".into()),
                link: Some("https://example.com".into()),
                snippet: None,
                date: None,
            }],
            summary: "말차 인기".into(),
        }
    }

    #[test]
    fn test_write_creates_dir_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = TrendLogger::new(tmp.path().join("logs"));

        let path = logger.write(&record()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("trend_일본_"));
        assert!(name.ends_with(".json"));

        let text = fs::read_to_string(&path).unwrap();
        // Non-ASCII text is kept as is
        assert!(text.contains("抹茶ブーム"));
        assert!(text.contains("말차 인기"));

        let back: TrendRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record());
    }

    #[test]
    fn test_log_swallows_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let logger = TrendLogger::new(&blocker);
        assert!(logger.log(&record()).is_none());
    }
}
