//! Application orchestrator: wires the log tailer, the session state machine
//! and the presence tracker together.

use std::path::{Path, PathBuf};

use bloxpresence_game_log::LogTailer;
use bloxpresence_presence::{PresenceTracker, TracingPublisher};
use bloxpresence_session::{MessageParser, PresenceSink, SessionStateMachine};
use tokio::sync::mpsc;

use crate::config::Config;

/// Tailer output, in the order the tailer produced it.
#[derive(Debug)]
enum LogFeed {
    Lines(Vec<String>),
    /// The tailer switched to another log file, i.e. a new client run.
    NewFile(PathBuf),
}

/// Runs the daemon until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel::<LogFeed>();

    // -- Log tailer --
    let lines_tx = feed_tx.clone();
    let tailer = LogTailer::with_file_callback(
        Box::new(move |lines: Vec<String>| {
            if lines_tx.send(LogFeed::Lines(lines)).is_err() {
                tracing::debug!("log feed receiver dropped");
            }
        }),
        Box::new(move |path: &Path| {
            if feed_tx.send(LogFeed::NewFile(path.to_path_buf())).is_err() {
                tracing::debug!("log feed receiver dropped");
            }
        }),
        config.tail_options(),
    );

    // -- Session tracking --
    // This task is the only owner of the machine, so lines are applied
    // strictly in the order the tailer read them.
    let tracker = PresenceTracker::new(TracingPublisher::new(), config.presence_options());
    let mut machine = SessionStateMachine::new(tracker);

    tailer.start_watch(config.log_dir.clone()).await;
    tracing::info!("ready");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            feed = feed_rx.recv() => match feed {
                Some(feed) => apply_feed(&mut machine, feed),
                None => break,
            },
            _ = &mut shutdown => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
        }
    }

    // -- Graceful shutdown --
    tailer.stop().await;
    while let Ok(feed) = feed_rx.try_recv() {
        apply_feed(&mut machine, feed);
    }
    end_session(&mut machine);

    tracing::info!(
        published = machine.sink().publisher().published(),
        "presence tracking stopped"
    );
    Ok(())
}

fn apply_feed<S: PresenceSink, P: MessageParser>(
    machine: &mut SessionStateMachine<S, P>,
    feed: LogFeed,
) {
    match feed {
        LogFeed::Lines(lines) => process_lines(machine, &lines),
        LogFeed::NewFile(path) => {
            tracing::info!(file = %path.display(), "following new client log");
            end_session(machine);
        }
    }
}

/// Applies a batch of lines, logging and skipping lines that fail.
fn process_lines<S: PresenceSink, P: MessageParser>(
    machine: &mut SessionStateMachine<S, P>,
    lines: &[String],
) {
    for line in lines {
        if let Err(e) = machine.handle_line(line) {
            tracing::warn!(error = %e, "failed to handle log line");
        }
    }
}

/// Ends the tracked session, clearing any presence it left behind.
fn end_session<S: PresenceSink, P: MessageParser>(machine: &mut SessionStateMachine<S, P>) {
    if let Err(e) = machine.reset() {
        tracing::warn!(error = %e, "failed to clear presence");
    }
}
