//! Artifact sinks - where generated record descriptions end up
//!
//! The directory sink lays artifacts out as `<root>/<package>/<file_stem>.json`
//! with a `catalog.json` index at the root. Package directories are owned by
//! the sink: a `.json` file there that the catalog no longer lists is removed
//! on write and reported by `--check`. The stream sink writes every artifact
//! to one writer, stdout by default.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cfnbind_core::{Catalog, CatalogIndex, RecordArtifact};
use log::debug;
use thiserror::Error;

/// File name of the catalog index inside an output directory
pub const INDEX_FILE: &str = "catalog.json";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SinkError {
    fn io(path: &Path, e: io::Error) -> Self {
        SinkError::Io(format!("{}: {}", path.display(), e))
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(e: serde_json::Error) -> Self {
        SinkError::Serialization(e.to_string())
    }
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Receives the serialized description of every generated type
pub trait ArtifactSink {
    fn write_record(&mut self, record: &RecordArtifact) -> SinkResult<()>;

    fn write_index(&mut self, index: &CatalogIndex) -> SinkResult<()>;
}

/// Hand every record, then the index, to a sink. Returns the record count.
pub fn write_catalog(sink: &mut dyn ArtifactSink, catalog: &Catalog) -> SinkResult<usize> {
    let mut count = 0;
    for record in catalog.records() {
        sink.write_record(record)?;
        count += 1;
    }
    sink.write_index(&catalog.index())?;
    Ok(count)
}

/// An artifact whose generated content differs from what is on disk
#[derive(Debug, Clone, PartialEq)]
pub struct StaleArtifact {
    pub path: PathBuf,
    /// `None` when the file does not exist yet
    pub existing: Option<String>,
    /// `None` when the file is no longer generated and should be removed
    pub generated: Option<String>,
}

impl StaleArtifact {
    pub fn is_orphan(&self) -> bool {
        self.generated.is_none()
    }
}

/// Writes artifacts below a root directory
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, record: &RecordArtifact) -> PathBuf {
        self.root.join(&record.package).join(format!("{}.json", record.file_stem))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Compare a catalog against the directory without writing anything
    pub fn stale_artifacts(&self, catalog: &Catalog) -> SinkResult<Vec<StaleArtifact>> {
        let mut expected = Vec::with_capacity(catalog.len() + 1);
        for record in catalog.records() {
            expected.push((self.record_path(record), record.to_json()?));
        }
        expected.push((self.index_path(), catalog.index().to_json()?));

        let mut stale = Vec::new();
        for (path, generated) in expected {
            let existing = read_existing(&path)?;
            if existing.as_deref() != Some(generated.as_str()) {
                stale.push(StaleArtifact {
                    path,
                    existing,
                    generated: Some(generated),
                });
            }
        }
        for path in self.orphans(&catalog.index())? {
            let existing = read_existing(&path)?;
            stale.push(StaleArtifact {
                path,
                existing,
                generated: None,
            });
        }
        Ok(stale)
    }

    /// `.json` files in package directories that the index does not list
    pub fn orphans(&self, index: &CatalogIndex) -> SinkResult<Vec<PathBuf>> {
        let expected: HashSet<PathBuf> = index
            .entries
            .iter()
            .map(|entry| self.root.join(&entry.path))
            .collect();

        let mut orphans = Vec::new();
        for package in list_dir(&self.root)? {
            if !package.is_dir() {
                continue;
            }
            for path in list_dir(&package)? {
                let is_json = path.extension().is_some_and(|ext| ext == "json");
                if is_json && path.is_file() && !expected.contains(&path) {
                    orphans.push(path);
                }
            }
        }
        orphans.sort();
        Ok(orphans)
    }

    fn write_file(&self, path: &Path, content: &str) -> SinkResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| SinkError::io(path, e))
    }
}

/// Entries of a directory; empty if it does not exist
fn list_dir(dir: &Path) -> SinkResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SinkError::io(dir, e)),
    };
    entries
        .map(|entry| entry.map(|e| e.path()).map_err(|e| SinkError::io(dir, e)))
        .collect()
}

fn read_existing(path: &Path) -> SinkResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SinkError::io(path, e)),
    }
}

impl ArtifactSink for DirectorySink {
    fn write_record(&mut self, record: &RecordArtifact) -> SinkResult<()> {
        let path = self.record_path(record);
        self.write_file(&path, &record.to_json()?)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn write_index(&mut self, index: &CatalogIndex) -> SinkResult<()> {
        self.write_file(&self.index_path(), &index.to_json()?)?;
        for path in self.orphans(index)? {
            fs::remove_file(&path).map_err(|e| SinkError::io(&path, e))?;
            debug!("Removed {}", path.display());
        }
        Ok(())
    }
}

/// Writes every artifact to a single stream
pub struct StreamSink<W: Write> {
    out: W,
}

impl StreamSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StreamSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, content: &str) -> SinkResult<()> {
        self.out
            .write_all(content.as_bytes())
            .map_err(|e| SinkError::Io(e.to_string()))
    }
}

impl<W: Write> ArtifactSink for StreamSink<W> {
    fn write_record(&mut self, record: &RecordArtifact) -> SinkResult<()> {
        self.emit(&record.to_json()?)
    }

    fn write_index(&mut self, _index: &CatalogIndex) -> SinkResult<()> {
        // The index only locates files; a stream has none
        self.out.flush().map_err(|e| SinkError::Io(e.to_string()))
    }
}
