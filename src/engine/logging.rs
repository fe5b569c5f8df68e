use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};

use crate::util::parse_bool_str;

const DEFAULT_STREAM_LOG_PATH: &str = "/tmp/ponder-stream.log";
const DEBUG_STREAM_ENV: &str = "PONDER_DEBUG_STREAM";
const STREAM_LOG_PATH_ENV: &str = "PONDER_STREAM_LOG_PATH";

pub fn stream_debug_enabled() -> bool {
    std::env::var(DEBUG_STREAM_ENV)
        .ok()
        .and_then(|v| parse_bool_str(&v))
        .unwrap_or(false)
}

pub fn emit_stream_chunk(model: &str, chunk: &str) {
    let message = format!(
        "PONDER_STREAM DEBUG chunk model={model} bytes={}\n{chunk}\n",
        chunk.len()
    );
    emit_log_message(&message);
}

pub fn emit_stream_close(model: &str, summary: &str) {
    let message = format!("PONDER_STREAM DEBUG close model={model} {summary}\n");
    emit_log_message(&message);
}

fn emit_log_message(message: &str) {
    if let Some(path) = resolve_log_path() {
        if append_log_file(&path, message).is_ok() {
            return;
        }
    }

    eprintln!("{message}");
}

fn resolve_log_path() -> Option<String> {
    std::env::var(STREAM_LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_STREAM_LOG_PATH.to_string())
            } else {
                None
            }
        })
}

fn append_log_file(path: &str, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(message.as_bytes())
}
