use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::error::EngineError;
use super::models::{model_identifier, parse_model_list, ModelEntry};
use super::spawn::spawn_process;
use crate::config::Config;

/// Run a process to completion under the fixed spawn environment and return
/// its decoded stdout. Decoding is lossy: invalid bytes become replacement
/// characters, never an error. A non-zero exit is only an error when the
/// process produced no output; partial output wins otherwise.
pub async fn run_capture(
    program: &str,
    args: &[&str],
    input: Option<&str>,
    config: &Config,
) -> Result<String, EngineError> {
    let env = config.spawn_env();
    let mut process = spawn_process(program, args, &env)?;

    let stdin = process.stdin.take();
    if let (Some(mut stdin), Some(text)) = (stdin, input) {
        stdin.write_all(text.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.shutdown().await?;
    }

    let mut captured = String::new();
    while let Some(chunk) = process.stdout.next().await {
        let bytes = chunk?;
        captured.push_str(&String::from_utf8_lossy(&bytes));
    }

    let status = process.child.wait().await?;
    if !status.success() && captured.trim().is_empty() {
        return Err(EngineError::Exit { status });
    }

    Ok(captured)
}

/// True when the engine binary resolves on the configured search path.
/// Spawn failures (resolver missing, permission denied) mean "not installed",
/// never an error.
pub async fn engine_installed(config: &Config) -> bool {
    let args = [config.engine_bin.as_str()];
    match run_capture(&config.resolver_bin, &args, None, config).await {
        Ok(output) => !output.trim().is_empty(),
        Err(_) => false,
    }
}

/// Enumerate installed models via the engine's `list` subcommand.
pub async fn list_models(config: &Config) -> Result<Vec<ModelEntry>, EngineError> {
    let raw = run_capture(&config.engine_bin, &["list"], None, config).await?;
    Ok(parse_model_list(&raw))
}

/// Non-streaming send: run the model to completion and return the whole
/// response at once. Streaming callers use `StreamSession` instead.
pub async fn send_once(
    config: &Config,
    model_selector: &str,
    prompt: &str,
) -> Result<String, EngineError> {
    let identifier = model_identifier(model_selector);
    let args = ["run", identifier];
    run_capture(&config.engine_bin, &args, Some(prompt), config).await
}
