//! Asynchronous sprite export
//!
//! [`Sprite::export`](crate::sprite::Sprite::export) opens the destination
//! file up front and hands it to a short-lived thread that waits for the
//! combine worker and writes the encoded sheet. The returned
//! [`ExportHandle`] carries the destination path immediately and is joined
//! with [`ExportHandle::wait`] for the write result.

use crate::combine::CombineResults;
use crate::error::{ExportError, SpriteError};
use crate::sync::lock;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// What a finished export did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The sheet was written to disk
    Written { bytes: usize },
    /// The file already existed and was left untouched
    Skipped,
}

/// One-shot completion slot shared by a handle and its sprite.
#[derive(Debug, Default)]
pub(crate) struct ExportTask {
    result: Mutex<Option<Result<ExportOutcome, ExportError>>>,
    done: Condvar,
}

impl ExportTask {
    fn finished(result: Result<ExportOutcome, ExportError>) -> Arc<Self> {
        Arc::new(Self { result: Mutex::new(Some(result)), done: Condvar::new() })
    }

    fn complete(&self, result: Result<ExportOutcome, ExportError>) {
        *lock(&self.result) = Some(result);
        self.done.notify_all();
    }

    pub(crate) fn wait(&self) -> Result<ExportOutcome, ExportError> {
        let guard = lock(&self.result);
        let guard = self
            .done
            .wait_while(guard, |result| result.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard.clone().unwrap_or(Err(ExportError::WorkerStopped))
    }

    fn wait_timeout(&self, timeout: Duration) -> Result<ExportOutcome, ExportError> {
        let guard = lock(&self.result);
        let (guard, _) = self
            .done
            .wait_timeout_while(guard, timeout, |result| result.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard.clone().unwrap_or(Err(ExportError::TimedOut))
    }

    fn is_finished(&self) -> bool {
        lock(&self.result).is_some()
    }
}

/// A submitted export.
///
/// Dropping the handle does not cancel the write; the owning sprite still
/// reports its outcome from [`Sprite::wait`](crate::sprite::Sprite::wait).
#[derive(Debug, Clone)]
#[must_use = "an export's write errors are only reported by wait()"]
pub struct ExportHandle {
    path: PathBuf,
    task: Arc<ExportTask>,
}

impl ExportHandle {
    /// Path the sheet is (or will be) written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the sheet has been written.
    pub fn wait(&self) -> Result<ExportOutcome, ExportError> {
        self.task.wait()
    }

    /// Block for at most `timeout`; returns [`ExportError::TimedOut`] if the
    /// write has not finished by then.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<ExportOutcome, ExportError> {
        self.task.wait_timeout(timeout)
    }

    /// Whether the export has completed, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub(crate) fn task(&self) -> Arc<ExportTask> {
        Arc::clone(&self.task)
    }
}

/// Open `target` for writing, creating its directory first.
///
/// Returns `Ok(None)` when the file already exists.
pub(crate) fn open_target(target: &Path) -> Result<Option<File>, SpriteError> {
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|source| SpriteError::CreateDir { path: dir.to_path_buf(), source })?;
    }

    match File::options().write(true).create_new(true).open(target) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(source) => Err(SpriteError::CreateFile { path: target.to_path_buf(), source }),
    }
}

/// Handle for an export that needed no work.
pub(crate) fn skipped(target: PathBuf) -> ExportHandle {
    ExportHandle { path: target, task: ExportTask::finished(Ok(ExportOutcome::Skipped)) }
}

/// Start a thread that writes the sheet for `generation` into `file`.
pub(crate) fn spawn_write(
    file: File,
    target: PathBuf,
    results: Arc<CombineResults>,
    generation: u64,
    writes: Arc<AtomicUsize>,
) -> Result<ExportHandle, SpriteError> {
    let task = Arc::new(ExportTask::default());
    let worker_task = Arc::clone(&task);
    let path = target.clone();

    thread::Builder::new()
        .name("sprite-export".to_string())
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                write_sheet(file, &path, &results, generation, &writes)
            }))
            .unwrap_or(Err(ExportError::Panicked));

            if let Err(e) = &result {
                warn!("failed to export sprite {}: {}", path.display(), e);
                // Remove the partial file so the next export retries
                let _ = fs::remove_file(&path);
            }
            worker_task.complete(result);
        })
        .map_err(|source| SpriteError::Io { path: target.clone(), source })?;

    Ok(ExportHandle { path: target, task })
}

fn write_sheet(
    file: File,
    path: &Path,
    results: &CombineResults,
    generation: u64,
    writes: &AtomicUsize,
) -> Result<ExportOutcome, ExportError> {
    let sheet = results.wait_for(generation)?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(&sheet)
        .and_then(|_| writer.flush())
        .map_err(|e| ExportError::Write { path: path.to_path_buf(), source: Arc::new(e) })?;

    if sheet.is_empty() {
        return Err(ExportError::EmptyWrite { path: path.to_path_buf() });
    }

    writes.fetch_add(1, Ordering::SeqCst);
    info!(path = %path.display(), bytes = sheet.len(), "created sprite");
    Ok(ExportOutcome::Written { bytes: sheet.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_target_creates_directory() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("nested/img/abc123.png");
        let file = open_target(&target).unwrap();
        assert!(file.is_some());
        assert!(target.exists());
    }

    #[test]
    fn test_open_target_existing_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("abc123.png");
        fs::write(&target, b"already here").unwrap();
        assert!(open_target(&target).unwrap().is_none());
        assert_eq!(fs::read(&target).unwrap(), b"already here");
    }

    #[test]
    fn test_open_target_directory_failure() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let err = open_target(&blocker.join("sub/out.png")).unwrap_err();
        assert!(matches!(err, SpriteError::CreateDir { .. }));
    }

    #[test]
    fn test_skipped_handle_is_finished() {
        let handle = skipped(PathBuf::from("img/abc123.png"));
        assert!(handle.is_finished());
        assert_eq!(handle.path(), Path::new("img/abc123.png"));
        assert_eq!(handle.wait().unwrap(), ExportOutcome::Skipped);
    }

    #[test]
    fn test_wait_timeout_on_pending_task() {
        let handle =
            ExportHandle { path: PathBuf::from("x.png"), task: Arc::new(ExportTask::default()) };
        assert!(!handle.is_finished());
        let err = handle.wait_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, ExportError::TimedOut));
    }

    #[test]
    fn test_completed_task_seen_by_every_waiter() {
        let task = Arc::new(ExportTask::default());
        let handle = ExportHandle { path: PathBuf::from("x.png"), task: Arc::clone(&task) };
        let copy = handle.clone();
        task.complete(Err(ExportError::EmptyWrite { path: PathBuf::from("x.png") }));
        assert!(matches!(handle.wait(), Err(ExportError::EmptyWrite { .. })));
        assert!(matches!(copy.wait(), Err(ExportError::EmptyWrite { .. })));
    }

    #[test]
    fn test_superseded_write_removes_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("abc123.png");
        let file = open_target(&target).unwrap().unwrap();

        let results = Arc::new(CombineResults::default());
        results.publish(1, Ok(Arc::new(vec![1])));
        results.publish(2, Ok(Arc::new(vec![2])));

        let writes = Arc::new(AtomicUsize::new(0));
        let handle =
            spawn_write(file, target.clone(), results, 1, Arc::clone(&writes)).unwrap();

        let err = handle.wait().unwrap_err();
        assert!(matches!(err, ExportError::Superseded { generation: 1 }));
        assert!(!target.exists());
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }
}
