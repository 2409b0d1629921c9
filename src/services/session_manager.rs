//! Batch analysis sessions.
//!
//! A session drives a bounded rayon pool from a `spawn_blocking` task. Workers
//! pull positions from a shared queue and append to a shared sink; progress is
//! pollable at any time and a stop request keeps every completed result.

use crate::neural::NeuralEvaluator;
use crate::quality::aggregator::{analyze_position, AnalysisConfig};
use crate::search::CancelToken;
use crate::services::batch::{BatchPosition, BatchRequest, PositionResult};
use crate::{AnalyzerError, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

// ============================================================================
// SESSION STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    Running,
    Completed,
    Stopped,
    Failed,
}

impl SessionStatus {
    fn as_u8(self) -> u8 {
        match self {
            SessionStatus::Running => 0,
            SessionStatus::Completed => 1,
            SessionStatus::Stopped => 2,
            SessionStatus::Failed => 3,
        }
    }

    fn from_u8(value: u8) -> SessionStatus {
        match value {
            0 => SessionStatus::Running,
            1 => SessionStatus::Completed,
            2 => SessionStatus::Stopped,
            _ => SessionStatus::Failed,
        }
    }

    pub fn is_finished(self) -> bool {
        self != SessionStatus::Running
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionProgress {
    pub session_id: Uuid,
    pub positions_done: usize,
    pub positions_total: usize,
    pub elapsed_ms: u64,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
}

/// Shared between the registry and the session's workers.
struct SessionShared {
    total: usize,
    done: AtomicUsize,
    status: AtomicU8,
    /// Elapsed time frozen at the end of the run; 0 while running.
    finished_ms: AtomicU64,
    cancel: CancelToken,
    results: Mutex<Vec<PositionResult>>,
}

impl SessionShared {
    fn status(&self) -> SessionStatus {
        SessionStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, status: SessionStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }

    /// Appends a result and counts it under the same lock, so `done` always
    /// equals the number of stored results.
    fn record(&self, result: PositionResult) {
        match self.results.lock() {
            Ok(mut results) => {
                results.push(result);
                self.done.fetch_add(1, Ordering::SeqCst);
            }
            Err(poisoned) => {
                let mut results = poisoned.into_inner();
                results.push(result);
                self.done.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

struct BatchSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    start: Instant,
    total: usize,
    shared: Arc<SessionShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BatchSession {
    fn progress(&self) -> SessionProgress {
        let status = self.shared.status();
        let elapsed_ms = if status.is_finished() {
            self.shared.finished_ms.load(Ordering::SeqCst)
        } else {
            self.start.elapsed().as_millis() as u64
        };
        SessionProgress {
            session_id: self.id,
            positions_done: self.shared.done.load(Ordering::SeqCst),
            positions_total: self.total,
            elapsed_ms,
            status,
            started_at: self.started_at,
        }
    }

    fn take_handle(&self) -> Option<JoinHandle<()>> {
        match self.handle.lock() {
            Ok(mut handle) => handle.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

// ============================================================================
// SESSION MANAGER
// ============================================================================

/// Registry of batch sessions. Cheap to clone; clones share the registry.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<BatchSession>>>>,
    evaluator: Option<Arc<NeuralEvaluator>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions share `evaluator` for the positional term and neural rollouts.
    pub fn with_evaluator(evaluator: Arc<NeuralEvaluator>) -> Self {
        Self {
            sessions: Arc::default(),
            evaluator: Some(evaluator),
        }
    }

    /// Starts a batch with the preset of the request's mode.
    pub async fn start_batch(&self, request: BatchRequest) -> Result<Uuid> {
        let config = request.mode.config();
        self.start_batch_with_config(request, config).await
    }

    pub async fn start_batch_with_config(
        &self,
        request: BatchRequest,
        config: AnalysisConfig,
    ) -> Result<Uuid> {
        let positions = request.resolve_positions()?;
        let workers = request
            .max_workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);
        let id = Uuid::new_v4();
        let shared = Arc::new(SessionShared {
            total: positions.len(),
            done: AtomicUsize::new(0),
            status: AtomicU8::new(SessionStatus::Running.as_u8()),
            finished_ms: AtomicU64::new(0),
            cancel: CancelToken::new(),
            results: Mutex::new(Vec::with_capacity(positions.len())),
        });
        let start = Instant::now();
        info!(
            "🚀 Session {} started: {} positions, mode {}, {} workers",
            id,
            positions.len(),
            request.mode,
            workers
        );

        let session = Arc::new(BatchSession {
            id,
            started_at: Utc::now(),
            start,
            total: positions.len(),
            shared: Arc::clone(&shared),
            handle: Mutex::new(None),
        });

        let evaluator = self.evaluator.clone();
        let handle = tokio::task::spawn_blocking(move || {
            run_batch(id, positions, config, evaluator, workers, &shared);
            shared
                .finished_ms
                .store(start.elapsed().as_millis().max(1) as u64, Ordering::SeqCst);
            let final_status = if shared.status() == SessionStatus::Failed {
                SessionStatus::Failed
            } else if shared.cancel.is_cancelled()
                && shared.done.load(Ordering::SeqCst) < shared.total
            {
                SessionStatus::Stopped
            } else {
                SessionStatus::Completed
            };
            shared.set_status(final_status);
            info!("🏁 Session {} finished: {:?}", id, final_status);
        });
        if let Ok(mut slot) = session.handle.lock() {
            *slot = Some(handle);
        }

        self.sessions.write().await.insert(id, session);
        Ok(id)
    }

    pub async fn progress(&self, id: Uuid) -> Option<SessionProgress> {
        self.sessions.read().await.get(&id).map(|s| s.progress())
    }

    pub async fn list(&self) -> Vec<SessionProgress> {
        let mut all: Vec<SessionProgress> =
            self.sessions.read().await.values().map(|s| s.progress()).collect();
        all.sort_by_key(|p| p.started_at);
        all
    }

    /// Requests a stop and waits for the workers to drain. Completed results
    /// are kept.
    pub async fn stop(&self, id: Uuid) -> Result<SessionProgress> {
        let session = self.session(id).await?;
        info!("🛑 Stopping session {}", id);
        session.shared.cancel.cancel();
        self.join(&session).await;
        Ok(session.progress())
    }

    /// Waits for the session to finish on its own.
    pub async fn wait(&self, id: Uuid) -> Result<SessionProgress> {
        let session = self.session(id).await?;
        self.join(&session).await;
        Ok(session.progress())
    }

    /// Results recorded so far, in completion order.
    pub async fn results(&self, id: Uuid) -> Result<Vec<PositionResult>> {
        let session = self.session(id).await?;
        let results = match session.shared.results.lock() {
            Ok(results) => results.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Ok(results)
    }

    /// Forgets a finished session.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let session = self.session(id).await?;
        if !session.shared.status().is_finished() {
            return Err(AnalyzerError::InvalidRequest(format!(
                "session {} is still running",
                id
            )));
        }
        self.sessions.write().await.remove(&id);
        Ok(())
    }

    async fn session(&self, id: Uuid) -> Result<Arc<BatchSession>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AnalyzerError::InvalidRequest(format!("unknown session {}", id)))
    }

    async fn join(&self, session: &BatchSession) {
        if let Some(handle) = session.take_handle() {
            if let Err(e) = handle.await {
                error!("❌ Session {} driver panicked: {}", session.id, e);
                session.shared.set_status(SessionStatus::Failed);
            }
        }
        // Another caller may own the handle; wait for the status to settle.
        while !session.shared.status().is_finished() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

// ============================================================================
// WORKER POOL
// ============================================================================

fn run_batch(
    id: Uuid,
    positions: Vec<BatchPosition>,
    config: AnalysisConfig,
    evaluator: Option<Arc<NeuralEvaluator>>,
    workers: usize,
    shared: &SessionShared,
) {
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Session {}: cannot build worker pool: {}", id, e);
            shared.set_status(SessionStatus::Failed);
            return;
        }
    };
    let queue: Mutex<VecDeque<(usize, BatchPosition)>> =
        Mutex::new(positions.into_iter().enumerate().collect());

    pool.scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|_| worker_loop(&queue, &config, evaluator.clone(), shared));
        }
    });
}

fn next_position(queue: &Mutex<VecDeque<(usize, BatchPosition)>>) -> Option<(usize, BatchPosition)> {
    match queue.lock() {
        Ok(mut queue) => queue.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

fn worker_loop(
    queue: &Mutex<VecDeque<(usize, BatchPosition)>>,
    config: &AnalysisConfig,
    evaluator: Option<Arc<NeuralEvaluator>>,
    shared: &SessionShared,
) {
    while !shared.cancel.is_cancelled() {
        let Some((index, entry)) = next_position(queue) else {
            break;
        };
        let outcome = match &entry.position {
            Ok(position) => analyze_position(
                position,
                position.current_player(),
                config,
                evaluator.clone(),
                &shared.cancel,
            )
            .map_err(|e| e.to_string()),
            Err(reason) => Err(reason.clone()),
        };
        // An analysis cut short by a stop is not a completed result.
        if entry.position.is_ok() && shared.cancel.is_cancelled() {
            break;
        }
        let position_key = entry.key;
        let result = match outcome {
            Ok(response) => PositionResult {
                index,
                position_key,
                response: Some(response),
                error: None,
                finished_at: Utc::now(),
            },
            Err(reason) => {
                let failure = AnalyzerError::BatchWorkerFailure {
                    position_key: position_key.clone(),
                    reason,
                };
                warn!("⚠️ {}", failure);
                PositionResult {
                    index,
                    position_key,
                    response: None,
                    error: Some(failure.to_string()),
                    finished_at: Utc::now(),
                }
            }
        };
        shared.record(result);
    }
}
