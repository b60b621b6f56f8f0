//! Log file tailer.
//!
//! Polls the client log directory (waking early on `notify` events), follows
//! the newest log file and streams complete lines to a callback. Lines are
//! delivered in file order; a line the client has only partly written is
//! held back until its newline arrives. Every log file is one client run,
//! so switching to a new file is reported to an optional callback, after
//! the last lines of the previous file and before the first of the new one.

use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Callback invoked with new log lines.
pub type OnLinesFn = Box<dyn Fn(Vec<String>) + Send + Sync + 'static>;

/// Callback invoked when the watcher starts following a log file.
pub type OnFileFn = Box<dyn Fn(&Path) + Send + Sync + 'static>;

/// Interval between attempts to open a log file that does not exist yet.
const OPEN_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Tailing behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailOptions {
    /// Replay the content already in the log found at startup, so a session
    /// in progress is reconstructed. Files created later are always read
    /// from the start.
    pub from_start: bool,
    /// How often the directory and the current file are polled.
    pub poll_interval: Duration,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            from_start: true,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Watches the client log directory and streams new lines.
pub struct LogTailer {
    inner: Arc<Mutex<TailerState>>,
}

struct TailerState {
    /// Callback for new lines.
    on_lines: OnLinesFn,
    on_file: Option<OnFileFn>,
    options: TailOptions,
    /// Cancellation token of the running watch or tail, if any.
    cancel: Option<CancellationToken>,
}

impl LogTailer {
    /// Creates a new log tailer with the given line callback.
    pub fn new(on_lines: OnLinesFn, options: TailOptions) -> Self {
        Self::build(on_lines, None, options)
    }

    /// Creates a log tailer that also reports each log file the watcher
    /// switches to.
    pub fn with_file_callback(
        on_lines: OnLinesFn,
        on_file: OnFileFn,
        options: TailOptions,
    ) -> Self {
        Self::build(on_lines, Some(on_file), options)
    }

    fn build(on_lines: OnLinesFn, on_file: Option<OnFileFn>, options: TailOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TailerState {
                on_lines,
                on_file,
                options,
                cancel: None,
            })),
        }
    }

    /// Starts tailing one specific log file.
    ///
    /// Any previous watch or tail is stopped first.
    pub async fn start_tail(&self, log_path: PathBuf) {
        let mut state = self.inner.lock().await;
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
            tracing::debug!("stopped previous tail");
        }

        let cancel = CancellationToken::new();
        state.cancel = Some(cancel.clone());
        let from_start = state.options.from_start;
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            tail_file(&log_path, from_start, cancel, inner).await;
        });

        tracing::info!("started tailing log file");
    }

    /// Starts watching the log directory for the newest client log.
    ///
    /// When a newer file appears the previous tail reads its file one last
    /// time and stops, then the new file is tailed from its start.
    /// Cancelled by `stop()`.
    pub async fn start_watch(&self, log_dir: PathBuf) {
        let mut state = self.inner.lock().await;
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
            tracing::debug!("stopped previous watcher");
        }

        let cancel = CancellationToken::new();
        state.cancel = Some(cancel.clone());
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            watch_and_tail(log_dir, cancel, inner).await;
        });

        tracing::info!("started log watcher");
    }

    /// Stops the running watch or tail.
    pub async fn stop(&self) {
        let mut state = self.inner.lock().await;
        if let Some(cancel) = state.cancel.take() {
            cancel.cancel();
            tracing::info!("stopped log tailer");
        }
    }

    /// Returns whether a watch or tail is running.
    pub async fn is_running(&self) -> bool {
        self.inner
            .lock()
            .await
            .cancel
            .as_ref()
            .is_some_and(|c| !c.is_cancelled())
    }
}

/// Watches the log directory and tails the newest client log.
async fn watch_and_tail(
    log_dir: PathBuf,
    cancel: CancellationToken,
    inner: Arc<Mutex<TailerState>>,
) {
    let options = inner.lock().await.options;
    let (wake_tx, mut wake_rx) = mpsc::unbounded_channel::<()>();

    // Polling alone still works when the directory cannot be watched (it
    // may not exist until the client first runs).
    let _watcher = match notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        if let Ok(event) = result {
            if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                let _ = wake_tx.send(());
            }
        }
    }) {
        Ok(mut watcher) => match watcher.watch(&log_dir, RecursiveMode::NonRecursive) {
            Ok(()) => Some(watcher),
            Err(e) => {
                tracing::debug!(dir = %log_dir.display(), error = %e, "directory watch unavailable, polling only");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to create directory watcher, polling only");
            None
        }
    };

    let mut current_file: Option<PathBuf> = None;
    let mut tail_task: Option<(CancellationToken, JoinHandle<()>)> = None;
    let mut first_scan = true;
    let mut poll_interval = tokio::time::interval(options.poll_interval);
    poll_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = poll_interval.tick() => {}
            Some(()) = wake_rx.recv() => {}
        }

        let latest =
            find_latest_log(&log_dir).filter(|path| current_file.as_ref() != Some(path));
        if let Some(path) = latest {
            // The old tail flushes what it has not delivered yet before the
            // new file is announced.
            finish_tail(tail_task.take()).await;

            tracing::info!(file = %path.display(), "new log file detected, starting tail");
            if let Some(on_file) = &inner.lock().await.on_file {
                on_file(&path);
            }

            // Only the file already present at startup may be skipped;
            // a file created while watching belongs to a new client run.
            let from_start = !first_scan || options.from_start;
            let child_cancel = cancel.child_token();
            let task_cancel = child_cancel.clone();
            let inner2 = Arc::clone(&inner);
            let path2 = path.clone();

            let task = tokio::spawn(async move {
                tail_file(&path2, from_start, task_cancel, inner2).await;
            });
            tail_task = Some((child_cancel, task));
            current_file = Some(path);
        }
        first_scan = false;
    }

    finish_tail(tail_task.take()).await;
}

/// Cancels a running file tail and waits for its final read.
async fn finish_tail(tail: Option<(CancellationToken, JoinHandle<()>)>) {
    if let Some((cancel, task)) = tail {
        cancel.cancel();
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "log tail task failed");
        }
    }
}

/// Tails a single log file and emits complete lines.
async fn tail_file(
    path: &Path,
    from_start: bool,
    cancel: CancellationToken,
    inner: Arc<Mutex<TailerState>>,
) {
    let options = inner.lock().await.options;

    // Wait for the file to appear (the client may not have created it yet).
    let file = loop {
        if cancel.is_cancelled() {
            return;
        }
        match std::fs::File::open(path) {
            Ok(f) => break f,
            Err(_) => {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(OPEN_RETRY_INTERVAL) => {}
                }
            }
        }
    };

    let mut reader = BufReader::new(file);
    if !from_start && reader.seek(SeekFrom::End(0)).is_err() {
        tracing::warn!(file = %path.display(), "failed to seek to end of log file");
    }

    let mut partial = Vec::new();
    let mut poll_interval = tokio::time::interval(options.poll_interval);
    poll_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let cancelled = tokio::select! {
            _ = cancel.cancelled() => true,
            _ = poll_interval.tick() => false,
        };

        // A cancelled tail still delivers what was written since the last
        // poll.
        let lines = read_new_lines(&mut reader, &mut partial);
        if !lines.is_empty() {
            let state = inner.lock().await;
            (state.on_lines)(lines);
        }

        if cancelled {
            break;
        }
    }
}

/// Reads all complete lines written since the last read.
///
/// An unterminated trailing line is kept in `partial` and completed by a
/// later call. Blank lines are skipped and invalid UTF-8 is replaced.
fn read_new_lines<R: BufRead>(reader: &mut R, partial: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();

    loop {
        match reader.read_until(b'\n', partial) {
            Ok(0) => break,
            Ok(_) => {
                if partial.last() != Some(&b'\n') {
                    // EOF in the middle of a line.
                    break;
                }
                let text = String::from_utf8_lossy(partial);
                let text = text.trim_end_matches(['\r', '\n']);
                if !text.trim().is_empty() {
                    lines.push(text.to_string());
                }
                partial.clear();
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading log file");
                break;
            }
        }
    }

    lines
}

/// Whether a file name looks like a client (player) log.
pub fn is_client_log(name: &str) -> bool {
    name.ends_with(".log") && name.contains("Player")
}

/// Finds the most recently modified client log in the log directory.
pub fn find_latest_log(log_dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(log_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| entry.file_name().to_str().is_some_and(is_client_log))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .max()
        .map(|(_, path)| path)
}
