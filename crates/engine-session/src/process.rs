//! Engine process transport (async I/O).
//!
//! The session never touches stdin/stdout directly. It talks to a pair of
//! channels; for a real engine a writer task and a reader task bridge those
//! channels to the child process.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::EngineError;
use crate::uci::{parse_line, EngineCommand, EngineEvent};

/// Session side of the transport.
#[derive(Debug)]
pub struct EngineChannels {
    pub commands: mpsc::UnboundedSender<EngineCommand>,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
}

/// Engine side of the transport. Dropping `events` signals that the engine
/// has gone away.
#[derive(Debug)]
pub struct EngineEndpoint {
    pub commands: mpsc::UnboundedReceiver<EngineCommand>,
    pub events: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineChannels {
    pub fn pair() -> (EngineChannels, EngineEndpoint) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            EngineChannels {
                commands: cmd_tx,
                events: event_rx,
            },
            EngineEndpoint {
                commands: cmd_rx,
                events: event_tx,
            },
        )
    }
}

/// A spawned UCI engine process.
pub struct EngineProcess {
    process: Child,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl EngineProcess {
    /// Spawn the engine binary and wire its stdio to a fresh channel pair.
    pub fn spawn(path: &str) -> Result<(Self, EngineChannels), EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{path}: {e}")))?;

        let mut stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("stdout not captured".into()))?;

        let (channels, endpoint) = EngineChannels::pair();
        let EngineEndpoint {
            commands: mut command_rx,
            events: event_tx,
        } = endpoint;

        let writer = tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                let line = cmd.to_string();
                debug!(cmd = %line, "SF <");
                if let Err(e) = stdin.write_all(format!("{line}\n").as_bytes()).await {
                    error!(error = %e, "Failed to write to engine");
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    error!(error = %e, "Failed to flush engine stdin");
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            let mut stdout = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match stdout.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(line = trimmed, "SF >");
                        if event_tx.send(parse_line(trimmed)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read from engine");
                        break;
                    }
                }
            }
            // event_tx drops here, which the session sees as the engine exiting
        });

        Ok((
            Self {
                process,
                writer,
                reader,
            },
            channels,
        ))
    }

    /// Wait for the process to exit, killing it if it outlives `grace`.
    pub async fn wait(&mut self, grace: Duration) -> Result<(), EngineError> {
        match tokio::time::timeout(grace, self.process.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(?status, "Engine exited");
            }
            Err(_) => {
                debug!("Engine ignored quit, killing");
                self.process.kill().await?;
            }
        }
        self.writer.abort();
        self.reader.abort();
        Ok(())
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
        self.writer.abort();
        self.reader.abort();
    }
}
