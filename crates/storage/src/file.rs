//! Crash-safe file-backed store.
//!
//! One `<trace_id>.json` file per trace under a root directory. `save`
//! serializes to a named temporary file in the same directory, syncs it, and
//! atomically renames it over the destination, so a reader never observes a
//! partially written trace. `load` re-runs the graph's structural validation
//! and reports corrupt data on any mismatch.

use crate::{check_finalized, codec, TraceStore};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use traceloom_core::{Error, Result, TraceGraph, TraceId};

/// File-per-trace storage backend.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Storage(format!("create {}: {e}", dir.display())))?;
        Ok(FileStore { dir })
    }

    /// The directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, trace_id: TraceId) -> PathBuf {
        self.dir.join(format!("{trace_id}.json"))
    }
}

impl TraceStore for FileStore {
    fn save(&self, graph: &TraceGraph) -> Result<()> {
        check_finalized(graph)?;
        let payload = codec::to_json(graph);
        let dest = self.path_for(graph.trace_id());

        // Temp file lives in the destination directory so the final rename
        // stays on one filesystem and is atomic.
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::Storage(format!("create temp file in {}: {e}", self.dir.display())))?;
        tmp.write_all(payload.as_bytes())
            .map_err(|e| Error::Storage(format!("write {}: {e}", dest.display())))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::Storage(format!("sync {}: {e}", dest.display())))?;
        tmp.persist(&dest)
            .map_err(|e| Error::Storage(format!("persist {}: {e}", dest.display())))?;

        tracing::debug!(trace_id = %graph.trace_id(), path = %dest.display(), "trace persisted");
        Ok(())
    }

    fn load(&self, trace_id: TraceId) -> Result<TraceGraph> {
        let path = self.path_for(trace_id);
        let payload = match fs::read_to_string(&path) {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::trace_not_found(trace_id));
            }
            Err(e) => return Err(Error::Storage(format!("read {}: {e}", path.display()))),
        };
        let graph = codec::from_json(&payload)?;
        if graph.trace_id() != trace_id {
            return Err(Error::CorruptData(format!(
                "file {} contains trace {}",
                path.display(),
                graph.trace_id()
            )));
        }
        Ok(graph)
    }

    fn list_ids(&self) -> Result<Vec<TraceId>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| Error::Storage(format!("read dir {}: {e}", self.dir.display())))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Storage(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(id) = stem.parse::<TraceId>() {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
