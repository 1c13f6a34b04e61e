//! # File I/O Module
//!
//! Project and report files with safety features:
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **File locking**: keep two runs from writing the same project
//! - **Version validation**: refuse files written by a newer schema
//!
//! ## File Format
//!
//! Projects are saved as `.gwp` (Groundwork project) files containing JSON.
//! Lock files use the `.gwp.lock` extension and record who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cost_core::file_io::{load_project, save_project, FileLock};
//! use std::path::Path;
//!
//! let path = Path::new("prairie_ridge.gwp");
//! let lock = FileLock::acquire(path, "estimator@company.com")?;
//!
//! let mut project = load_project(path)?;
//! project.touch();
//! save_project(&project, path)?;
//!
//! // Lock is released when dropped
//! drop(lock);
//! # Ok::<(), cost_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Locks older than this are taken over whoever holds them.
const STALE_LOCK_HOURS: i64 = 24;

/// Who holds a project; stored as JSON in `<project>.gwp.lock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockHolder {
    /// User identifier (email or username)
    pub user_id: String,
    pub host: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockHolder {
    fn current(user_id: String) -> Self {
        LockHolder {
            user_id,
            host: host_name(),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Left behind by an exited process on this host, or older than a day.
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        if now - self.locked_at > Duration::hours(STALE_LOCK_HOURS) {
            return true;
        }
        self.host == host_name() && !process_alive(self.pid)
    }

    fn locked_error(&self, path: &Path) -> CalcError {
        CalcError::file_locked(
            path.display().to_string(),
            format!("{}@{} (pid {})", self.user_id, self.host, self.pid),
            self.locked_at.to_rfc3339(),
        )
    }
}

fn host_name() -> String {
    ["HOSTNAME", "HOST", "COMPUTERNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// Without /proc only the age rule can free a lock.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Holder recorded in an existing lock file, if there is a readable one.
fn recorded_holder(lock_path: &Path) -> Option<LockHolder> {
    let contents = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Exclusive hold on a project file for the length of a run.
///
/// Combines an OS-level lock (fs2) on the lock file with the
/// [`LockHolder`] written into it. Dropping the guard removes the file.
#[derive(Debug)]
pub struct FileLock {
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _file: File,
    pub holder: LockHolder,
}

impl FileLock {
    /// Lock a project file for `user_id`.
    ///
    /// A stale lock is taken over with a warning.
    ///
    /// # Errors
    ///
    /// * `FileLocked` - a live holder (possibly this process) has the project
    /// * `FileError` - the lock file cannot be created or written
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let lock_error =
            |op: &str, e: std::io::Error| CalcError::file_error(op, lock_path.display().to_string(), e.to_string());

        match recorded_holder(&lock_path) {
            Some(existing) if !existing.is_stale(Utc::now()) => return Err(existing.locked_error(path)),
            Some(existing) => {
                warn!(path = %path.display(), holder = %existing.user_id, "taking over stale lock");
            }
            None => {}
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| lock_error("create lock", e))?;

        // Truncate only once the OS lock is ours.
        file.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;
        file.set_len(0).map_err(|e| lock_error("truncate lock", e))?;

        let holder = LockHolder::current(user_id.into());
        let json = serde_json::to_vec_pretty(&holder).map_err(|e| CalcError::SerializationError {
            reason: e.to_string(),
        })?;
        file.write_all(&json).map_err(|e| lock_error("write lock", e))?;
        file.sync_all().map_err(|e| lock_error("sync lock", e))?;

        debug!(path = %path.display(), user = %holder.user_id, "lock acquired");

        Ok(FileLock {
            lock_path,
            _file: file,
            holder,
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `project.gwp` -> `project.gwp.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    suffixed_path(project_path, "lock")
}

/// Append `suffix` to the file's extension (or use it as the extension).
fn suffixed_path(path: &Path, suffix: &str) -> PathBuf {
    let mut out = path.to_path_buf();
    let extension = path
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    out.set_extension(extension);
    out
}

fn read_to_string(path: &Path, operation: &str) -> CalcResult<String> {
    let mut file =
        File::open(path).map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// Serialize `value` as pretty JSON and write it atomically.
///
/// Writes `<path>.tmp`, syncs it, then renames it over `path`, so readers
/// never see a half-written file.
pub fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = suffixed_path(path, "tmp");

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .sync_all()
        .map_err(|e| CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), bytes = json.len(), "file written");
    Ok(())
}

/// Save a project with atomic write semantics.
pub fn save_project(project: &Project, path: &Path) -> CalcResult<()> {
    write_json_atomic(project, path)
}

/// Load a project from a `.gwp` file.
///
/// # Errors
///
/// * `FileError` - I/O error
/// * `SerializationError` - invalid JSON or a malformed table row
/// * `VersionMismatch` - file written by an incompatible schema
///
/// # Example
///
/// ```rust,no_run
/// use cost_core::file_io::load_project;
/// use std::path::Path;
///
/// let project = load_project(Path::new("prairie_ridge.gwp"))?;
/// println!("Loaded project: {}", project.meta.name);
/// # Ok::<(), cost_core::errors::CalcError>(())
/// ```
pub fn load_project(path: &Path) -> CalcResult<Project> {
    let contents = read_to_string(path, "read")?;

    let project: Project = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&project.meta.version)?;

    debug!(path = %path.display(), project = project.name(), "project loaded");
    Ok(project)
}

/// Check a file's schema version against [`SCHEMA_VERSION`].
///
/// Major versions must match. While the schema is 0.x, a file with a newer
/// minor version is rejected too.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file = Version::parse(file_version).map_err(|_| mismatch())?;
    let current = Version::parse(SCHEMA_VERSION).map_err(|_| mismatch())?;

    if file.major != current.major {
        return Err(mismatch());
    }
    if current.major == 0 && file.minor > current.minor {
        return Err(mismatch());
    }
    Ok(())
}
