//! File and directory drivers
//!
//! One catalog file goes through: load its cache, collect texts, translate,
//! rewrite the tree, write the target file, save the cache. Directories are
//! a loop over their `.json` files where one bad file does not stop the rest.

use crate::batch::{BatchTranslator, SessionStats};
use crate::cache::CacheStore;
use crate::mt::error::{MtError, MtResult};
use crate::walker::{collect, rewrite};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Serialize a catalog the way it is committed: 2-space indentation,
/// non-ASCII and HTML characters written as-is, no trailing newline.
pub fn to_catalog_json(value: &Value) -> MtResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| MtError::ParseError(format!("Failed to serialize JSON: {}", e)))
}

/// `.json` files directly inside `dir`, sorted by name
pub fn list_catalog_files(dir: &Path) -> MtResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        MtError::IoError(format!("Failed to read directory '{}': {}", dir.display(), e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Outcome of a directory run
#[derive(Debug, Default)]
pub struct DirectorySummary {
    /// Target files written
    pub written: Vec<PathBuf>,
    /// Source files that failed, with the reason
    pub failed: Vec<(PathBuf, MtError)>,
}

pub struct Orchestrator {
    batch: BatchTranslator,
    store: CacheStore,
}

impl Orchestrator {
    pub fn new(batch: BatchTranslator) -> Self {
        let store = CacheStore::new(batch.config().cache_dir.clone());
        Self { batch, store }
    }

    pub fn stats(&self) -> SessionStats {
        self.batch.stats()
    }

    pub fn cache_store(&self) -> &CacheStore {
        &self.store
    }

    /// Translate one catalog into `target_dir`, returning the written path
    pub async fn process_file(
        &mut self,
        source_file: &Path,
        target_dir: &Path,
        target_lang: &str,
    ) -> MtResult<PathBuf> {
        let file_name = source_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                MtError::IoError(format!("Invalid file name: {}", source_file.display()))
            })?;
        info!("Processing {}", file_name);

        let mut file_cache = self.store.load(target_dir, &file_name);

        let content = fs::read_to_string(source_file).map_err(|e| {
            MtError::IoError(format!(
                "Failed to read file '{}': {}",
                source_file.display(),
                e
            ))
        })?;
        let source: Value = serde_json::from_str(&content).map_err(|e| {
            MtError::ParseError(format!(
                "Failed to parse JSON from '{}': {}",
                source_file.display(),
                e
            ))
        })?;

        let texts: Vec<String> = collect(&source).into_iter().collect();
        let translations = self
            .batch
            .translate_batch(&texts, target_lang, &mut file_cache)
            .await?;

        let translated = rewrite(&source, &translations);
        let output = to_catalog_json(&translated)?;

        fs::create_dir_all(target_dir).map_err(|e| {
            MtError::IoError(format!(
                "Failed to create directory '{}': {}",
                target_dir.display(),
                e
            ))
        })?;

        let target_file = target_dir.join(&file_name);
        fs::write(&target_file, output).map_err(|e| {
            MtError::IoError(format!(
                "Failed to write file '{}': {}",
                target_file.display(),
                e
            ))
        })?;
        info!("Saved {}", target_file.display());

        if let Err(e) = self.store.save(target_dir, &file_name, &file_cache) {
            warn!("Failed to save cache for {}: {}", file_name, e);
        }

        Ok(target_file)
    }

    /// Translate every `.json` catalog in `source_dir`
    ///
    /// Only an unreadable `source_dir` is an error; per-file failures are
    /// logged and collected in the summary.
    pub async fn process_directory(
        &mut self,
        source_dir: &Path,
        target_dir: &Path,
        target_lang: &str,
    ) -> MtResult<DirectorySummary> {
        let files = list_catalog_files(source_dir)?;
        info!("Found {} catalog files in {}", files.len(), source_dir.display());

        let mut summary = DirectorySummary::default();
        for file in files {
            match self.process_file(&file, target_dir, target_lang).await {
                Ok(written) => summary.written.push(written),
                Err(e) => {
                    error!("Failed to translate {}: {}", file.display(), e);
                    summary.failed.push((file, e));
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::mt::mock::{MockMode, MockTranslator};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        mock: MockTranslator,
    }

    impl Fixture {
        fn new(mode: MockMode) -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                mock: MockTranslator::new(mode),
            }
        }

        fn source_dir(&self) -> PathBuf {
            self.dir.path().join("messages").join("en")
        }

        fn target_dir(&self) -> PathBuf {
            self.dir.path().join("messages").join("it")
        }

        fn write_source(&self, name: &str, content: &str) -> PathBuf {
            fs::create_dir_all(self.source_dir()).unwrap();
            let path = self.source_dir().join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn orchestrator(&self) -> Orchestrator {
            let config = SessionConfig::default().with_cache_dir(self.dir.path().join("cache"));
            Orchestrator::new(BatchTranslator::new(
                Box::new(self.mock.clone()),
                Vec::new(),
                config,
            ))
        }
    }

    // ========== Serialization Tests ==========

    #[test]
    fn test_catalog_json_formatting() {
        let value = json!({"b": {"c": "<b>Café</b> & 日本"}, "a": [1, 2]});
        let output = to_catalog_json(&value).unwrap();
        assert_eq!(
            output,
            "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": {\n    \"c\": \"<b>Café</b> & 日本\"\n  }\n}"
        );
    }

    // ========== File Tests ==========

    #[tokio::test]
    async fn test_process_file_writes_translation_and_cache() {
        let fixture = Fixture::new(MockMode::Suffix);
        let source = fixture.write_source("common.json", r#"{"save": "Save", "n": 3}"#);
        let mut orchestrator = fixture.orchestrator();

        let written = orchestrator
            .process_file(&source, &fixture.target_dir(), "IT")
            .await
            .unwrap();

        assert_eq!(written, fixture.target_dir().join("common.json"));
        let output: Value = serde_json::from_str(&fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(output, json!({"save": "Save_IT", "n": 3}));

        let cache = orchestrator
            .cache_store()
            .load(&fixture.target_dir(), "common.json");
        assert_eq!(cache.entries["Save"].translation, "Save_IT");
    }

    #[tokio::test]
    async fn test_unwritable_cache_keeps_translation() {
        let fixture = Fixture::new(MockMode::Suffix);
        let source = fixture.write_source("common.json", r#"{"save": "Save"}"#);
        // A plain file where the cache root directory should be
        fs::write(fixture.dir.path().join("cache"), "not a directory").unwrap();
        let mut orchestrator = fixture.orchestrator();

        let written = orchestrator
            .process_file(&source, &fixture.target_dir(), "IT")
            .await
            .unwrap();

        let output: Value = serde_json::from_str(&fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(output, json!({"save": "Save_IT"}));
        assert!(
            orchestrator
                .cache_store()
                .load(&fixture.target_dir(), "common.json")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_process_file_invalid_json_is_parse_error() {
        let fixture = Fixture::new(MockMode::Suffix);
        let source = fixture.write_source("broken.json", "{ nope");
        let mut orchestrator = fixture.orchestrator();

        let result = orchestrator
            .process_file(&source, &fixture.target_dir(), "IT")
            .await;
        assert!(matches!(result, Err(MtError::ParseError(_))));
        assert!(!fixture.target_dir().join("broken.json").exists());
    }

    #[tokio::test]
    async fn test_process_file_missing_source_is_io_error() {
        let fixture = Fixture::new(MockMode::Suffix);
        let mut orchestrator = fixture.orchestrator();

        let result = orchestrator
            .process_file(
                &fixture.source_dir().join("absent.json"),
                &fixture.target_dir(),
                "IT",
            )
            .await;
        assert!(matches!(result, Err(MtError::IoError(_))));
    }

    #[tokio::test]
    async fn test_backend_failure_writes_nothing() {
        let fixture = Fixture::new(MockMode::Error("down".to_string()));
        let source = fixture.write_source("common.json", r#"{"save": "Save"}"#);
        let mut orchestrator = fixture.orchestrator();

        let result = orchestrator
            .process_file(&source, &fixture.target_dir(), "IT")
            .await;
        assert!(matches!(result, Err(MtError::TranslationError(_))));
        assert!(!fixture.target_dir().join("common.json").exists());
    }

    // ========== Directory Tests ==========

    #[tokio::test]
    async fn test_directory_continues_after_failure() {
        let fixture = Fixture::new(MockMode::Suffix);
        fixture.write_source("a.json", r#"{"x": "Hello"}"#);
        fixture.write_source("b.json", "not json");
        fixture.write_source("c.json", r#"{"y": "World"}"#);
        fixture.write_source("notes.txt", "ignored");
        let mut orchestrator = fixture.orchestrator();

        let summary = orchestrator
            .process_directory(&fixture.source_dir(), &fixture.target_dir(), "IT")
            .await
            .unwrap();

        assert_eq!(
            summary.written,
            vec![
                fixture.target_dir().join("a.json"),
                fixture.target_dir().join("c.json")
            ]
        );
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, fixture.source_dir().join("b.json"));
        assert!(!fixture.target_dir().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_source_directory_is_error() {
        let fixture = Fixture::new(MockMode::Suffix);
        let mut orchestrator = fixture.orchestrator();

        let result = orchestrator
            .process_directory(&fixture.source_dir(), &fixture.target_dir(), "IT")
            .await;
        assert!(matches!(result, Err(MtError::IoError(_))));
    }
}
