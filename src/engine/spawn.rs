use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::process::Stdio;
use tokio::process::{Child, ChildStdin, Command};
use tokio_util::io::ReaderStream;

use super::error::EngineError;
use crate::config::SpawnEnv;

pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// A spawned engine process: piped stdin for the prompt, stdout exposed as a
/// chunk stream, stderr discarded (the engine writes progress spinners there).
pub struct EngineProcess {
    pub child: Child,
    pub stdin: Option<ChildStdin>,
    pub stdout: ByteStream,
}

/// Spawn `program` with a fixed environment built from `SpawnEnv` alone.
/// The caller's environment is never inherited, so spawns behave the same
/// regardless of the context the application was launched from.
pub fn spawn_process(
    program: &str,
    args: &[&str],
    env: &SpawnEnv,
) -> Result<EngineProcess, EngineError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env_clear()
        .env("PATH", &env.path)
        .env("HOME", &env.home)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take().ok_or_else(|| EngineError::Spawn {
        program: program.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "child stdout was not piped"),
    })?;

    Ok(EngineProcess {
        child,
        stdin,
        stdout: Box::pin(ReaderStream::new(stdout)),
    })
}
