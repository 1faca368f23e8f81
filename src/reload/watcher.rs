//! Polling file change detection.
//!
//! # Responsibilities
//! - Capture a baseline of one path's metadata (a missing file is a valid baseline)
//! - Re-read the metadata every poll interval
//! - Return on the first difference, cleanly, so the enclosing set reloads
//!
//! # Design Decisions
//! - Polling, not OS notifications
//! - Modification times compare at one-second resolution
//! - The watcher never reports an error; changes are a completion, not a fault

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::BoxFuture;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::reload::tasks::{run_set, ErrorSender, ErrorStream, Task};

/// The parts of a file's metadata that count as a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Modification time, unix seconds.
    pub modified: i64,
    pub mode: u32,
    pub size: u64,
}

impl From<&std::fs::Metadata> for FileMeta {
    fn from(meta: &std::fs::Metadata) -> Self {
        Self {
            modified: meta.modified().map(unix_secs).unwrap_or(0),
            mode: mode_bits(meta),
            size: meta.len(),
        }
    }
}

fn unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[cfg(unix)]
fn mode_bits(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn mode_bits(meta: &std::fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

/// Result of one metadata read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub error: Option<String>,
    pub meta: Option<FileMeta>,
}

impl Snapshot {
    pub async fn capture(path: &Path) -> Self {
        Self::from_result(tokio::fs::metadata(path).await)
    }

    /// Blocking [`Snapshot::capture`], for callers already off the runtime.
    pub fn read(path: &Path) -> Self {
        Self::from_result(std::fs::metadata(path))
    }

    fn from_result(result: std::io::Result<std::fs::Metadata>) -> Self {
        match result {
            Ok(meta) => Self::present(FileMeta::from(&meta)),
            Err(e) => Self::missing(e.to_string()),
        }
    }

    pub fn present(meta: FileMeta) -> Self {
        Self {
            error: None,
            meta: Some(meta),
        }
    }

    pub fn missing(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            meta: None,
        }
    }
}

/// The first difference found between a baseline and a fresh read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The baseline read failed and the new one succeeded: the file appeared.
    ErrorCleared { was: String },
    ErrorChanged { was: String, now: String },
    Disappeared { error: String },
    Modified { was: i64, now: i64 },
    Mode { was: u32, now: u32 },
    Size { was: u64, now: u64 },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::ErrorCleared { was } => write!(f, "error disappeared (was: {was})"),
            Change::ErrorChanged { was, now } => {
                write!(f, "error changed (was: {was}; became: {now})")
            }
            Change::Disappeared { error } => write!(f, "file info disappeared ({error})"),
            Change::Modified { was, now } => {
                write!(f, "mod time changed (was: {was}; became: {now})")
            }
            Change::Mode { was, now } => write!(f, "mode changed (was: {was:o}; became: {now:o})"),
            Change::Size { was, now } => write!(f, "size changed (was: {was}; became: {now})"),
        }
    }
}

/// Compare a fresh read against the baseline, in a fixed order.
pub fn detect_change(baseline: &Snapshot, current: &Snapshot) -> Option<Change> {
    if let Some(was) = &baseline.error {
        match &current.error {
            None => return Some(Change::ErrorCleared { was: was.clone() }),
            Some(now) if now != was => {
                return Some(Change::ErrorChanged {
                    was: was.clone(),
                    now: now.clone(),
                })
            }
            Some(_) => {}
        }
    }

    let was = baseline.meta?;
    let Some(now) = current.meta else {
        return Some(Change::Disappeared {
            error: current.error.clone().unwrap_or_default(),
        });
    };

    if now.modified != was.modified {
        return Some(Change::Modified {
            was: was.modified,
            now: now.modified,
        });
    }
    if now.mode != was.mode {
        return Some(Change::Mode {
            was: was.mode,
            now: now.mode,
        });
    }
    if now.size != was.size {
        return Some(Change::Size {
            was: was.size,
            now: now.size,
        });
    }
    None
}

/// Watches one path for change.
#[derive(Debug)]
pub struct FileWatcher {
    path: PathBuf,
    baseline: Snapshot,
    interval: Duration,
}

impl FileWatcher {
    /// Capture the baseline now; polling starts when the watcher runs.
    pub async fn start(path: impl Into<PathBuf>, interval: Duration) -> Self {
        let path = path.into();
        let baseline = Snapshot::capture(&path).await;
        Self::with_baseline(path, baseline, interval)
    }

    /// Watch against a baseline taken earlier, before the file was read.
    pub fn with_baseline(path: impl Into<PathBuf>, baseline: Snapshot, interval: Duration) -> Self {
        let path = path.into();
        tracing::debug!(path = %path.display(), exists = baseline.meta.is_some(), "Watching file");
        Self {
            path,
            baseline,
            interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn baseline(&self) -> &Snapshot {
        &self.baseline
    }

    /// Poll until the file changes (`Some`) or `scope` is cancelled (`None`).
    pub async fn watch(self, scope: CancellationToken) -> Option<Change> {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = scope.cancelled() => return None,
                _ = ticker.tick() => {
                    let current = Snapshot::capture(&self.path).await;
                    if let Some(change) = detect_change(&self.baseline, &current) {
                        tracing::info!(path = %self.path.display(), change = %change, "Watched file changed");
                        return Some(change);
                    }
                }
            }
        }
    }
}

impl Task for FileWatcher {
    fn name(&self) -> String {
        format!("watch {}", self.path.display())
    }

    fn run(self: Box<Self>, scope: CancellationToken, errors: ErrorSender) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            // The set's stream stays open while this sender lives.
            let _errors = errors;
            self.watch(scope).await;
        })
    }
}

/// Watch a single path as its own task set.
pub async fn watch(path: impl Into<PathBuf>, interval: Duration, scope: &CancellationToken) -> ErrorStream {
    let watcher = FileWatcher::start(path, interval).await;
    run_set(scope, vec![Box::new(watcher)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tokio::time::timeout;

    const POLL: Duration = Duration::from_millis(20);

    fn meta(modified: i64, mode: u32, size: u64) -> Snapshot {
        Snapshot::present(FileMeta {
            modified,
            mode,
            size,
        })
    }

    #[test]
    fn identical_snapshots_do_not_change() {
        assert_eq!(detect_change(&meta(1, 0o644, 10), &meta(1, 0o644, 10)), None);
        let gone = Snapshot::missing("No such file or directory (os error 2)");
        assert_eq!(detect_change(&gone, &gone.clone()), None);
    }

    #[test]
    fn detects_each_dimension() {
        let base = meta(100, 0o644, 10);
        let missing = Snapshot::missing("not found");

        assert_eq!(
            detect_change(&missing, &base),
            Some(Change::ErrorCleared { was: "not found".into() })
        );
        assert_eq!(
            detect_change(&missing, &Snapshot::missing("permission denied")),
            Some(Change::ErrorChanged {
                was: "not found".into(),
                now: "permission denied".into()
            })
        );
        assert_eq!(
            detect_change(&base, &missing),
            Some(Change::Disappeared { error: "not found".into() })
        );
        assert_eq!(
            detect_change(&base, &meta(101, 0o644, 10)),
            Some(Change::Modified { was: 100, now: 101 })
        );
        assert_eq!(
            detect_change(&base, &meta(100, 0o600, 10)),
            Some(Change::Mode { was: 0o644, now: 0o600 })
        );
        assert_eq!(
            detect_change(&base, &meta(100, 0o644, 11)),
            Some(Change::Size { was: 10, now: 11 })
        );
    }

    #[test]
    fn first_mismatch_wins() {
        let change = detect_change(&meta(1, 0o644, 10), &meta(2, 0o600, 20));
        assert_eq!(change, Some(Change::Modified { was: 1, now: 2 }));
    }

    #[test]
    fn change_messages_name_both_values() {
        let msg = Change::Size { was: 3, now: 4 }.to_string();
        assert_eq!(msg, "size changed (was: 3; became: 4)");
        let msg = Change::Mode { was: 0o644, now: 0o600 }.to_string();
        assert_eq!(msg, "mode changed (was: 644; became: 600)");
    }

    async fn expect_change(watcher: FileWatcher) -> Change {
        timeout(Duration::from_secs(2), watcher.watch(CancellationToken::new()))
            .await
            .expect("watcher did not notice the change")
            .expect("watcher was cancelled")
    }

    #[tokio::test]
    async fn notices_file_appearing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Procfile");
        let watcher = FileWatcher::start(&path, POLL).await;
        assert!(watcher.baseline().error.is_some());

        fs::write(&path, "web: serve").unwrap();
        assert!(matches!(expect_change(watcher).await, Change::ErrorCleared { .. }));
    }

    #[tokio::test]
    async fn notices_file_disappearing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<html></html>").unwrap();
        let watcher = FileWatcher::start(&path, POLL).await;

        fs::remove_file(&path).unwrap();
        assert!(matches!(expect_change(watcher).await, Change::Disappeared { .. }));
    }

    #[tokio::test]
    async fn notices_size_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "a").unwrap();
        let watcher = FileWatcher::start(&path, POLL).await;

        let before = fs::metadata(&path).unwrap().modified().unwrap();
        fs::write(&path, "abc").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(before)
            .unwrap();

        assert_eq!(expect_change(watcher).await, Change::Size { was: 1, now: 3 });
    }

    #[tokio::test]
    async fn notices_mod_time_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "same").unwrap();
        let watcher = FileWatcher::start(&path, POLL).await;

        let later = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert!(matches!(expect_change(watcher).await, Change::Modified { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn notices_mode_change() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "same").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        let watcher = FileWatcher::start(&path, POLL).await;

        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        assert!(matches!(expect_change(watcher).await, Change::Mode { .. }));
    }

    #[tokio::test]
    async fn earlier_baseline_catches_edit_made_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "v1").unwrap();
        let baseline = Snapshot::read(&path);

        fs::write(&path, "version two").unwrap();
        let watcher = FileWatcher::with_baseline(&path, baseline, POLL);
        let change = expect_change(watcher).await;
        assert!(matches!(change, Change::Size { was: 2, now: 11 } | Change::Modified { .. }));
    }

    #[tokio::test]
    async fn quiet_file_keeps_watching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "same").unwrap();
        let watcher = FileWatcher::start(&path, POLL).await;

        let outcome = timeout(POLL * 10, watcher.watch(CancellationToken::new())).await;
        assert!(outcome.is_err(), "watcher exited without a change");
    }

    #[tokio::test]
    async fn cancellation_closes_stream_without_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "same").unwrap();
        let scope = CancellationToken::new();
        let mut stream = watch(&path, Duration::from_secs(1), &scope).await;
        assert!(timeout(Duration::from_millis(100), stream.recv()).await.is_err());

        scope.cancel();
        let closed = timeout(Duration::from_millis(500), stream.recv()).await.unwrap();
        assert_eq!(closed, None);
    }

    #[tokio::test]
    async fn stream_stays_open_until_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "x").unwrap();
        let mut stream = watch(&path, POLL, &CancellationToken::new()).await;

        let quiet = timeout(POLL * 10, stream.recv()).await;
        assert!(quiet.is_err(), "stream closed without a change");

        fs::write(&path, "xyz").unwrap();
        let closed = timeout(Duration::from_secs(2), stream.recv()).await.unwrap();
        assert_eq!(closed, None);
    }

    #[tokio::test]
    async fn disappearance_closes_stream_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "x").unwrap();
        let mut stream = watch(&path, POLL, &CancellationToken::new()).await;
        assert!(timeout(POLL * 5, stream.recv()).await.is_err());

        fs::remove_file(&path).unwrap();
        let closed = timeout(Duration::from_secs(2), stream.recv()).await.unwrap();
        assert_eq!(closed, None);
    }
}
