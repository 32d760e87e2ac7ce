//! Request-scoped scratch files
//!
//! Every request that stages data for the conversion engine gets its own
//! [`RequestScratch`]: all paths it allocates embed a fresh random token,
//! so concurrent requests can share one scratch directory without ever
//! colliding. Releasing the scope (by value, so it can only happen once)
//! removes every allocated path and sweeps the directory for any
//! engine-produced file carrying the token.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

/// Where scratch files live. Injected so tests can point requests at an
/// isolated directory.
#[derive(Debug, Clone)]
pub struct ScratchConfig {
    root: PathBuf,
}

impl ScratchConfig {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The operating system's temp directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }
}

/// Scratch file scope for one request.
pub struct RequestScratch {
    root: PathBuf,
    token: String,
    allocated: Vec<PathBuf>,
}

impl RequestScratch {
    pub fn new(config: &ScratchConfig) -> Self {
        Self {
            root: config.root.clone(),
            token: Uuid::new_v4().simple().to_string(),
            allocated: Vec::new(),
        }
    }

    /// Reserve a unique path like `{label}-{token}.{ext}`. The file is not
    /// created; the path is recorded for release.
    pub fn allocate(&mut self, label: &str, ext: &str) -> PathBuf {
        let path = self.root.join(format!("{}-{}.{}", label, self.token, ext));
        self.allocated.push(path.clone());
        path
    }

    /// Output pattern for multi-file engine runs; `%d` is replaced by the
    /// engine with the 1-based page index.
    pub fn output_pattern(&self, ext: &str) -> PathBuf {
        self.root.join(format!("output-{}-%d.{}", self.token, ext))
    }

    pub async fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(path, bytes).await
    }

    pub async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    /// Files produced under [`output_pattern`](Self::output_pattern),
    /// sorted by the page index embedded in their names. The engine may
    /// produce any number of them, so this scans rather than guessing.
    pub async fn numbered_outputs(&self, ext: &str) -> std::io::Result<Vec<PathBuf>> {
        let prefix = format!("output-{}-", self.token);
        let suffix = format!(".{}", ext);

        let mut found: Vec<(u32, PathBuf)> = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
            else {
                continue;
            };
            if let Ok(index) = stem.parse::<u32>() {
                found.push((index, entry.path()));
            }
        }

        found.sort_by_key(|(index, _)| *index);
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete everything this scope owns. Consumes the scope, so cleanup
    /// runs exactly once per request; already-missing files are fine.
    pub async fn release(self) {
        for path in &self.allocated {
            remove_quietly(path).await;
        }

        // The engine can emit more files than were allocated (one per
        // page); sweep anything else carrying this scope's token.
        let Ok(mut entries) = tokio::fs::read_dir(&self.root).await else {
            warn!(root = %self.root.display(), "could not sweep scratch directory");
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().contains(&self.token) {
                remove_quietly(&entry.path()).await;
            }
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), "failed to remove scratch file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> ScratchConfig {
        ScratchConfig::new(dir.path().to_path_buf())
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut scratch = RequestScratch::new(&config(&dir));

        let path = scratch.allocate("input", "pdf");
        scratch.write(&path, b"hello").await.unwrap();
        assert_eq!(scratch.read(&path).await.unwrap(), b"hello");

        scratch.release().await;
    }

    #[tokio::test]
    async fn distinct_scopes_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = RequestScratch::new(&config(&dir));
        let mut b = RequestScratch::new(&config(&dir));

        assert_ne!(a.allocate("input", "pdf"), b.allocate("input", "pdf"));

        a.release().await;
        b.release().await;
    }

    #[tokio::test]
    async fn release_removes_allocated_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut scratch = RequestScratch::new(&config(&dir));

        let path = scratch.allocate("input", "pdf");
        scratch.write(&path, b"data").await.unwrap();
        scratch.release().await;

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn release_sweeps_engine_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = RequestScratch::new(&config(&dir));

        // Simulate files the engine produced from the output pattern.
        for page in 1..=3 {
            let name = scratch
                .output_pattern("jpg")
                .to_string_lossy()
                .replace("%d", &page.to_string());
            std::fs::write(name, b"jpeg").unwrap();
        }

        scratch.release().await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn release_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut scratch = RequestScratch::new(&config(&dir));

        // Allocated but never written.
        scratch.allocate("input", "pdf");
        scratch.release().await;
    }

    #[tokio::test]
    async fn numbered_outputs_sort_by_page_index() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = RequestScratch::new(&config(&dir));

        for page in [10, 2, 1] {
            let name = scratch
                .output_pattern("jpg")
                .to_string_lossy()
                .replace("%d", &page.to_string());
            std::fs::write(name, b"jpeg").unwrap();
        }

        let outputs = scratch.numbered_outputs("jpg").await.unwrap();
        let names: Vec<String> = outputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names[0].ends_with("-1.jpg"));
        assert!(names[1].ends_with("-2.jpg"));
        assert!(names[2].ends_with("-10.jpg"));

        scratch.release().await;
    }

    #[tokio::test]
    async fn other_scopes_outputs_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = RequestScratch::new(&config(&dir));
        let other = RequestScratch::new(&config(&dir));

        let name = other
            .output_pattern("jpg")
            .to_string_lossy()
            .replace("%d", "1");
        std::fs::write(&name, b"jpeg").unwrap();

        assert!(scratch.numbered_outputs("jpg").await.unwrap().is_empty());

        scratch.release().await;
        other.release().await;
    }
}
