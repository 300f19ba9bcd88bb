//! Analysis session actor.
//!
//! The session owns the engine's command/event channels from a single task.
//! Callers talk to it through [`AnalysisSession`], which hands out one
//! [`AnalysisHandle`] per request. A handle yields throttled progress and
//! exactly one terminal [`AnalysisEvent::Finished`].
//!
//! Output of a stopped search is told apart from the current one by counting
//! `go` commands that have not yet produced a `bestmove`: engine output only
//! belongs to the newest search when exactly one search is outstanding.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::analysis::{white_to_move, EngineAnalysis, ProgressPolicy};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::process::{EngineChannels, EngineProcess};
use crate::uci::{EngineCommand, EngineEvent};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub init_timeout: Duration,
    pub analysis_timeout: Duration,
    pub progress: ProgressPolicy,
    /// `setoption` pairs sent between `uciok` and `isready`.
    pub options: Vec<(String, String)>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            init_timeout: Duration::from_secs(10),
            analysis_timeout: Duration::from_secs(10),
            progress: ProgressPolicy::default(),
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Initializing,
    Ready,
    Crashed,
    Closed,
}

/// How an analysis request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The engine reported `bestmove` for this search.
    Complete,
    /// The bounded wait ran out; the analysis is the deepest seen.
    TimedOut,
    /// A newer request replaced this one.
    Superseded,
    /// Explicitly stopped.
    Cancelled,
    /// No ready engine; the analysis is neutral.
    Unavailable,
    /// The engine process went away mid-search.
    Crashed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub analysis: EngineAnalysis,
    pub completion: Completion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    Progress(EngineAnalysis),
    Finished(AnalysisOutcome),
}

/// Subscription to one analysis request.
#[derive(Debug)]
pub struct AnalysisHandle {
    id: u64,
    fen: String,
    events: mpsc::UnboundedReceiver<AnalysisEvent>,
    outcome: Option<AnalysisOutcome>,
}

impl AnalysisHandle {
    fn new(id: u64, fen: &str, events: mpsc::UnboundedReceiver<AnalysisEvent>) -> Self {
        Self {
            id,
            fen: fen.to_string(),
            events,
            outcome: None,
        }
    }

    /// A handle that has already finished with a neutral analysis.
    fn resolved(id: u64, fen: &str, completion: Completion) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(AnalysisEvent::Finished(AnalysisOutcome {
            analysis: EngineAnalysis::empty(fen),
            completion,
        }));
        Self::new(id, fen, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// Terminal outcome, once [`AnalysisEvent::Finished`] has been received.
    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Next event for this request, or `None` after the terminal one.
    ///
    /// Cancel-safe, so it can sit in a `select!` arm.
    pub async fn next(&mut self) -> Option<AnalysisEvent> {
        if self.outcome.is_some() {
            return None;
        }
        let outcome = match self.events.recv().await {
            Some(AnalysisEvent::Progress(analysis)) => {
                return Some(AnalysisEvent::Progress(analysis));
            }
            Some(AnalysisEvent::Finished(outcome)) => outcome,
            // session dropped without answering
            None => AnalysisOutcome {
                analysis: EngineAnalysis::empty(&self.fen),
                completion: Completion::Unavailable,
            },
        };
        self.outcome = Some(outcome.clone());
        Some(AnalysisEvent::Finished(outcome))
    }

    /// Skip progress and wait for the terminal outcome.
    pub async fn wait(mut self) -> AnalysisOutcome {
        while let Some(event) = self.next().await {
            if let AnalysisEvent::Finished(outcome) = event {
                return outcome;
            }
        }
        match self.outcome {
            Some(outcome) => outcome,
            None => AnalysisOutcome {
                analysis: EngineAnalysis::empty(&self.fen),
                completion: Completion::Unavailable,
            },
        }
    }
}

/// An explicitly owned connection to one engine instance.
pub struct AnalysisSession {
    requests: mpsc::UnboundedSender<Request>,
    status: watch::Receiver<EngineStatus>,
    init_timeout: Duration,
    next_id: u64,
    actor: JoinHandle<()>,
    process: Option<EngineProcess>,
}

impl AnalysisSession {
    /// Start the configured engine binary and wait for its handshake.
    pub async fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let (process, channels) = EngineProcess::spawn(&config.stockfish_path)?;
        let mut session = Self::connect(channels, config.session_settings());
        session.process = Some(process);
        session.wait_ready().await?;
        info!(path = %config.stockfish_path, "Engine session started");
        Ok(session)
    }

    /// Drive an engine reachable through `channels`. The handshake runs in
    /// the background; see [`AnalysisSession::wait_ready`].
    pub fn connect(channels: EngineChannels, settings: SessionSettings) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(EngineStatus::Initializing);
        let init_timeout = settings.init_timeout;

        let actor = Actor {
            commands: channels.commands,
            events: channels.events,
            requests: request_rx,
            status: status_tx,
            settings,
            current: None,
            outstanding: 0,
            stop_pending: false,
        };

        Self {
            requests: request_tx,
            status: status_rx,
            init_timeout,
            next_id: 0,
            actor: tokio::spawn(actor.run()),
            process: None,
        }
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == EngineStatus::Ready
    }

    /// Wait until the handshake has finished one way or another.
    pub async fn wait_ready(&mut self) -> Result<(), EngineError> {
        let limit = self.init_timeout;
        let settled = timeout(
            limit,
            self.status.wait_for(|s| *s != EngineStatus::Initializing),
        )
        .await
        .map_err(|_| EngineError::Timeout(limit))?;

        match settled.map(|s| *s) {
            Ok(EngineStatus::Ready) => Ok(()),
            Ok(EngineStatus::Crashed) => Err(EngineError::Crashed),
            Ok(_) | Err(_) => Err(EngineError::Closed),
        }
    }

    /// Analyse `fen` to `depth`, superseding whatever was running.
    ///
    /// Without a ready engine the handle is already finished with
    /// [`Completion::Unavailable`] and a neutral analysis.
    pub fn analyze(&mut self, fen: &str, depth: u32) -> AnalysisHandle {
        self.next_id += 1;
        let id = self.next_id;

        if !self.is_ready() {
            debug!(id, status = ?self.status(), "Engine not ready, returning neutral analysis");
            return AnalysisHandle::resolved(id, fen, Completion::Unavailable);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let job = Job {
            id,
            depth: depth.max(1),
            white_to_move: white_to_move(fen),
            analysis: EngineAnalysis::empty(fen),
            last_notified: 0,
            deadline: None,
            events: tx,
        };

        if self.requests.send(Request::Analyze(job)).is_err() {
            return AnalysisHandle::resolved(id, fen, Completion::Unavailable);
        }
        AnalysisHandle::new(id, fen, rx)
    }

    /// Cancel the in-flight analysis, if any.
    pub fn stop(&self) {
        let _ = self.requests.send(Request::Stop);
    }

    /// Send `quit` and reap the engine process.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        let Self {
            requests,
            mut actor,
            process,
            ..
        } = self;

        let _ = requests.send(Request::Shutdown);
        drop(requests);

        if timeout(SHUTDOWN_GRACE, &mut actor).await.is_err() {
            warn!("Analysis actor did not stop in time");
            actor.abort();
        }

        if let Some(mut process) = process {
            process.wait(SHUTDOWN_GRACE).await?;
        }
        Ok(())
    }
}

enum Request {
    Analyze(Job),
    Stop,
    Shutdown,
}

struct Job {
    id: u64,
    depth: u32,
    white_to_move: bool,
    analysis: EngineAnalysis,
    last_notified: u32,
    deadline: Option<Instant>,
    events: mpsc::UnboundedSender<AnalysisEvent>,
}

impl Job {
    fn finish(self, completion: Completion) {
        debug!(
            id = self.id,
            ?completion,
            depth = self.analysis.depth,
            "Analysis finished"
        );
        // the caller may have dropped its handle
        let _ = self.events.send(AnalysisEvent::Finished(AnalysisOutcome {
            analysis: self.analysis,
            completion,
        }));
    }
}

struct Actor {
    commands: mpsc::UnboundedSender<EngineCommand>,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    requests: mpsc::UnboundedReceiver<Request>,
    status: watch::Sender<EngineStatus>,
    settings: SessionSettings,
    current: Option<Job>,
    /// `go` commands sent without a matching `bestmove` yet.
    outstanding: u32,
    /// A `stop` has been sent for the newest outstanding search.
    stop_pending: bool,
}

impl Actor {
    async fn run(mut self) {
        match timeout(self.settings.init_timeout, self.handshake()).await {
            Ok(Ok(())) => {
                info!("Engine ready");
                self.status.send_replace(EngineStatus::Ready);
            }
            Ok(Err(e)) => {
                error!(error = %e, "Engine handshake failed");
                self.status.send_replace(EngineStatus::Crashed);
                return;
            }
            Err(_) => {
                error!(timeout = ?self.settings.init_timeout, "Engine handshake timed out");
                self.status.send_replace(EngineStatus::Crashed);
                return;
            }
        }

        loop {
            let deadline = self.current.as_ref().and_then(|job| job.deadline);

            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(Request::Analyze(job)) => self.start(job),
                    Some(Request::Stop) => self.cancel(Completion::Cancelled),
                    Some(Request::Shutdown) | None => break,
                },
                event = self.events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => {
                        error!("Engine process exited unexpectedly");
                        self.status.send_replace(EngineStatus::Crashed);
                        if let Some(job) = self.current.take() {
                            job.finish(Completion::Crashed);
                        }
                        return;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    warn!(
                        timeout = ?self.settings.analysis_timeout,
                        "Analysis timed out, returning partial result"
                    );
                    self.cancel(Completion::TimedOut);
                }
            }
        }

        self.cancel(Completion::Cancelled);
        self.send(EngineCommand::Quit);
        self.status.send_replace(EngineStatus::Closed);
        debug!("Analysis session closed");
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.try_send(EngineCommand::Uci)?;
        self.wait_for_event(|e| matches!(e, EngineEvent::UciOk)).await?;

        for (name, value) in self.settings.options.clone() {
            self.try_send(EngineCommand::SetOption { name, value })?;
        }

        self.try_send(EngineCommand::IsReady)?;
        self.wait_for_event(|e| matches!(e, EngineEvent::ReadyOk)).await
    }

    async fn wait_for_event(
        &mut self,
        wanted: fn(&EngineEvent) -> bool,
    ) -> Result<(), EngineError> {
        loop {
            match self.events.recv().await {
                Some(event) if wanted(&event) => return Ok(()),
                Some(_) => continue,
                None => return Err(EngineError::Crashed),
            }
        }
    }

    fn try_send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands.send(command).map_err(|_| EngineError::Closed)
    }

    fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            debug!("Engine command channel closed");
        }
    }

    fn start(&mut self, mut job: Job) {
        if let Some(previous) = self.current.take() {
            previous.finish(Completion::Superseded);
        }

        if self.outstanding > 0 && !self.stop_pending {
            self.send(EngineCommand::Stop);
        }

        debug!(id = job.id, fen = %job.analysis.fen, depth = job.depth, "Starting analysis");
        self.send(EngineCommand::PositionFen(job.analysis.fen.clone()));
        self.send(EngineCommand::GoDepth(job.depth));
        self.outstanding += 1;
        self.stop_pending = false;

        job.deadline = Some(Instant::now() + self.settings.analysis_timeout);
        self.current = Some(job);
    }

    fn cancel(&mut self, completion: Completion) {
        let Some(job) = self.current.take() else {
            return;
        };
        if self.outstanding > 0 && !self.stop_pending {
            self.send(EngineCommand::Stop);
            self.stop_pending = true;
        }
        job.finish(completion);
    }

    fn on_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Info(info) => {
                if self.outstanding != 1 {
                    return;
                }
                let Some(job) = self.current.as_mut() else {
                    return;
                };
                if !job.analysis.apply_info(&info, job.white_to_move) {
                    return;
                }
                let depth = job.analysis.depth;
                if self.settings.progress.should_notify(depth, job.last_notified) {
                    job.last_notified = depth;
                    let _ = job
                        .events
                        .send(AnalysisEvent::Progress(job.analysis.clone()));
                }
            }
            EngineEvent::BestMove { best, .. } => {
                let current_search = self.outstanding == 1;
                self.outstanding = self.outstanding.saturating_sub(1);
                if self.outstanding == 0 {
                    self.stop_pending = false;
                }

                if !current_search {
                    debug!(?best, "Discarding bestmove from a stopped search");
                    return;
                }
                if let Some(mut job) = self.current.take() {
                    if let Some(best) = best {
                        job.analysis.best_move = best;
                    }
                    job.finish(Completion::Complete);
                }
            }
            other => debug!(?other, "Ignoring engine event"),
        }
    }
}
