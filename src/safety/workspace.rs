/// Run-scoped workspace directories.
/// One directory per compile/execute operation; removed on every exit path.
use crate::config::types::{Result, TransboxError};
use crate::core::types::RunWorkspace;
use crate::safety::safe_cleanup;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Exclusively owned directory for one operation's files
pub struct Workspace {
    /// Unique run ID
    run_id: String,
    /// Directory all workspaces live under
    base_dir: PathBuf,
    /// Run-specific workspace directory
    run_dir: PathBuf,
    /// Source file path (if written)
    source_file: Option<PathBuf>,
    /// Artifact path (if reserved)
    artifact_file: Option<PathBuf>,
    cleaned: bool,
}

impl Workspace {
    /// Create new workspace for a run
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        let run_id = Uuid::new_v4().to_string();
        let run_dir = base_dir.join(&run_id);

        fs::create_dir_all(&run_dir).map_err(|e| {
            TransboxError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create workspace directory {}: {}",
                    run_dir.display(),
                    e
                ),
            ))
        })?;
        log::debug!("Created workspace {}", run_dir.display());

        Ok(Self {
            run_id,
            base_dir,
            run_dir,
            source_file: None,
            artifact_file: None,
            cleaned: false,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write (or overwrite) the source file under `file_name`
    pub fn write_source(&mut self, file_name: &str, content: &str) -> Result<PathBuf> {
        let source_path = self.run_dir.join(file_name);

        fs::write(&source_path, content).map_err(|e| {
            TransboxError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to write source file {}: {}",
                    source_path.display(),
                    e
                ),
            ))
        })?;

        self.source_file = Some(source_path.clone());
        Ok(source_path)
    }

    /// Reserve the artifact path; the compiler creates the file
    pub fn reserve_artifact(&mut self, file_name: &str) -> PathBuf {
        let artifact_path = self.run_dir.join(file_name);
        self.artifact_file = Some(artifact_path.clone());
        artifact_path
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    pub fn artifact_file(&self) -> Option<&Path> {
        self.artifact_file.as_deref()
    }

    /// Adapter view of this workspace's paths
    pub fn layout(&self, source_name: &str, artifact_name: &str) -> RunWorkspace {
        RunWorkspace {
            workdir: self.run_dir.clone(),
            source: self.run_dir.join(source_name),
            artifact: self.run_dir.join(artifact_name),
        }
    }

    /// Remove the run directory (idempotent)
    pub fn cleanup(&mut self) -> Result<()> {
        if self.cleaned {
            return Ok(());
        }
        safe_cleanup::remove_tree_within(&self.base_dir, &self.run_dir)?;
        self.cleaned = true;
        self.source_file = None;
        self.artifact_file = None;
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            log::warn!(
                "Failed to remove workspace {}: {}",
                self.run_dir.display(),
                e
            );
        }
    }
}

/// Creates workspaces under one base directory
#[derive(Clone, Debug)]
pub struct WorkspaceManager {
    base_dir: PathBuf,
}

impl WorkspaceManager {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir).map_err(|e| {
            TransboxError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create workspace base directory {}: {}",
                    base_dir.display(),
                    e
                ),
            ))
        })?;

        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn create_workspace(&self) -> Result<Workspace> {
        Workspace::new(self.base_dir.clone())
    }

    /// Remove workspaces left behind by crashed runs, older than `max_age`
    pub fn cleanup_old_workspaces(&self, max_age: std::time::Duration) -> Result<usize> {
        let mut cleaned = 0;
        let now = std::time::SystemTime::now();

        if !self.base_dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&self.base_dir).map_err(|e| {
            TransboxError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to read workspace directory {}: {}",
                    self.base_dir.display(),
                    e
                ),
            ))
        })?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            let metadata = match fs::symlink_metadata(&path) {
                Ok(m) if m.is_dir() => m,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Failed to get metadata for {}: {}", path.display(), e);
                    continue;
                }
            };

            let age = match metadata.modified().ok().and_then(|m| now.duration_since(m).ok()) {
                Some(age) => age,
                None => continue,
            };

            if age >= max_age {
                log::info!("Cleaning up stale workspace: {}", path.display());
                match safe_cleanup::remove_tree_within(&self.base_dir, &path) {
                    Ok(()) => cleaned += 1,
                    Err(e) => log::warn!("Failed to remove stale workspace {}: {}", path.display(), e),
                }
            }
        }

        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn manager(name: &str) -> WorkspaceManager {
        let dir = std::env::temp_dir().join(format!("transbox_ws_{}_{}", name, Uuid::new_v4()));
        WorkspaceManager::new(dir).unwrap()
    }

    #[test]
    fn test_workspace_creation() {
        let manager = manager("create");
        let mut workspace = manager.create_workspace().unwrap();
        let run_dir = workspace.run_dir().to_path_buf();
        assert!(run_dir.exists());
        assert!(run_dir.starts_with(manager.base_dir()));

        workspace.cleanup().unwrap();
        assert!(!run_dir.exists());
        workspace.cleanup().unwrap();

        let _ = fs::remove_dir_all(manager.base_dir());
    }

    #[test]
    fn test_workspace_files_removed_on_drop() {
        let manager = manager("drop");
        let source;
        let run_dir;
        {
            let mut workspace = manager.create_workspace().unwrap();
            source = workspace.write_source("main.cpp", "int main() {}").unwrap();
            let artifact = workspace.reserve_artifact("a.out");
            assert_eq!(artifact.file_name().unwrap(), "a.out");
            assert_eq!(workspace.source_file(), Some(source.as_path()));
            run_dir = workspace.run_dir().to_path_buf();
            assert!(source.exists());
        }
        assert!(!source.exists());
        assert!(!run_dir.exists());

        let _ = fs::remove_dir_all(manager.base_dir());
    }

    #[test]
    fn test_workspaces_do_not_collide() {
        let manager = manager("unique");
        let a = manager.create_workspace().unwrap();
        let b = manager.create_workspace().unwrap();
        assert_ne!(a.run_id(), b.run_id());
        assert_ne!(a.run_dir(), b.run_dir());
        drop(a);
        drop(b);
        let _ = fs::remove_dir_all(manager.base_dir());
    }

    #[test]
    fn test_cleanup_old_workspaces() {
        let manager = manager("stale");
        let stale = manager.base_dir().join("left-behind");
        fs::create_dir_all(stale.join("nested")).unwrap();
        fs::write(stale.join("nested/a.out"), b"").unwrap();

        let cleaned = manager.cleanup_old_workspaces(Duration::from_secs(0)).unwrap();
        assert_eq!(cleaned, 1);
        assert!(!stale.exists());

        let _ = fs::remove_dir_all(manager.base_dir());
    }
}
