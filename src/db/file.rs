use std::ffi::OsString;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::db::cache::{CacheRecord, CacheStore};
use crate::error::{AppError, AppResult};

/// Writes `contents` to a sibling temp file, then renames it over `path`
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Cache store keeping one JSON file per record in a directory
///
/// Records survive restarts, which is what lets the offline tier answer
/// from a previous session.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

#[async_trait::async_trait]
impl CacheStore for FileStore {
    async fn load(&self, key: &str) -> AppResult<Option<CacheRecord>> {
        let contents = match tokio::fs::read(self.record_path(key)).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: CacheRecord = serde_json::from_slice(&contents)?;
        if record.key != key {
            return Err(AppError::Internal(format!(
                "Cache file for {} holds record {}",
                key, record.key
            )));
        }
        Ok(Some(record))
    }

    async fn save(&self, record: CacheRecord) {
        let contents = match serde_json::to_vec(&record) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let path = self.record_path(&record.key);
        let result = tokio::task::spawn_blocking(move || write_atomic(&path, &contents)).await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, key = %record.key, "Failed to write cache file"),
            Err(e) => tracing::error!(error = %e, key = %record.key, "Cache write task failed"),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
