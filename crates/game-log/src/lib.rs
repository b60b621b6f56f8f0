//! Client log discovery and tailing.
//!
//! The client writes one log file per run into a log directory. The tailer
//! follows the newest file, switches when a new run starts, and streams
//! complete lines to a callback in file order.

mod tailer;

pub use tailer::{LogTailer, OnFileFn, OnLinesFn, TailOptions, find_latest_log, is_client_log};
