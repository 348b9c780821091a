//! Persistence of created measurement ids across invocations.
//!
//! Each terminal session gets its own file with one measurement id per line.
//! Ids are appended with a single write so concurrent invocations in the same
//! terminal never interleave partial lines.

use crate::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const SESSION_FILE: &str = "measurements";

pub trait SessionStore: Send + Sync {
    /// Append a newly created measurement id.
    fn append_id(&self, id: &str) -> Result<()>;

    /// All persisted ids, oldest first. A missing record is an empty history.
    fn load_ids(&self) -> Result<Vec<String>>;
}

/// File-backed session store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store ids in the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store scoped to the calling terminal session.
    ///
    /// The directory is keyed by the parent process id (the shell), under
    /// `base_dir` or the system temp directory.
    pub fn for_terminal_session(base_dir: Option<&Path>) -> Self {
        let base = base_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        let dir = base.join(format!("probe_{}", session_key()));
        Self::new(dir.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn append_id(&self, id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format!("{}\n", id).as_bytes())?;

        debug!(target: "probe::store", "Saved measurement {} to {}", id, self.path.display());
        Ok(())
    }

    fn load_ids(&self) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(unix)]
fn session_key() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn session_key() -> u32 {
    std::process::id()
}
