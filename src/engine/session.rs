use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::logging;
use super::models::model_identifier;
use super::spawn::{spawn_process, EngineProcess};
use crate::config::{Config, SpawnEnv};

pub const CANCELLED_SENTINEL: &str = "[cancelled]";

/// Events delivered on the session's single-consumer channel. `Started`
/// fires once the process is up and the prompt has been handed off; chunks
/// arrive in stream order; `Complete` fires exactly once per started
/// session, on every path including spawn failure and cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    Chunk(String),
    Complete(String),
}

/// One streaming inference turn: spawns `<engine> run <model>`, writes the
/// prompt to stdin, closes stdin, and forwards decoded stdout chunks until
/// the process exits.
pub struct StreamSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamSession {
    pub fn start(
        config: &Config,
        model_selector: &str,
        prompt: String,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let engine_bin = config.engine_bin.clone();
        let env = config.spawn_env();
        let identifier = model_identifier(model_selector).to_string();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let completion =
                run_stream(&engine_bin, &identifier, &prompt, &env, &events_tx, &task_cancel).await;
            if logging::stream_debug_enabled() {
                logging::emit_stream_close(&identifier, &format!("bytes={}", completion.len()));
            }
            let _ = events_tx.send(SessionEvent::Complete(completion));
        });

        Self { cancel, task }
    }

    /// Kill the subprocess and stop the reader. Completion still fires
    /// exactly once, carrying the cancelled sentinel.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Drive one spawned process to completion and return the completion text.
/// Every failure converges here into an error-sentinel string; partial
/// output received before a failure is kept, not discarded.
async fn run_stream(
    engine_bin: &str,
    identifier: &str,
    prompt: &str,
    env: &SpawnEnv,
    events_tx: &mpsc::UnboundedSender<SessionEvent>,
    cancel: &CancellationToken,
) -> String {
    let mut process = match spawn_process(engine_bin, &["run", identifier], env) {
        Ok(process) => process,
        Err(error) => return format!("[error] {error}"),
    };

    if let Err(error) = write_prompt(&mut process, prompt).await {
        let _ = process.child.start_kill();
        let _ = process.child.wait().await;
        return format!("[error] failed to send prompt: {error}");
    }
    let _ = events_tx.send(SessionEvent::Started);

    let mut received = String::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = process.child.start_kill();
                let _ = process.child.wait().await;
                if received.is_empty() {
                    return CANCELLED_SENTINEL.to_string();
                }
                received.push_str("\n\n");
                received.push_str(CANCELLED_SENTINEL);
                return received;
            }
            next = process.stdout.next() => match next {
                Some(Ok(bytes)) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    if logging::stream_debug_enabled() {
                        logging::emit_stream_chunk(identifier, &text);
                    }
                    received.push_str(&text);
                    let _ = events_tx.send(SessionEvent::Chunk(text));
                }
                Some(Err(error)) => {
                    let _ = process.child.start_kill();
                    let _ = process.child.wait().await;
                    if received.is_empty() {
                        return format!("[error] engine stream failed: {error}");
                    }
                    received.push_str(&format!("\n[error] engine stream failed: {error}"));
                    return received;
                }
                None => break,
            }
        }
    }

    match process.child.wait().await {
        Ok(status) if !status.success() && received.trim().is_empty() => {
            format!("[error] '{engine_bin} run {identifier}' exited with {status}")
        }
        Err(error) if received.trim().is_empty() => format!("[error] {error}"),
        _ => received,
    }
}

/// Write `prompt + "\n"` and close stdin. The engine reads exactly one
/// prompt per invocation and needs end-of-input before it will respond.
async fn write_prompt(process: &mut EngineProcess, prompt: &str) -> std::io::Result<()> {
    if let Some(mut stdin) = process.stdin.take() {
        stdin.write_all(prompt.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.shutdown().await?;
    }
    Ok(())
}
