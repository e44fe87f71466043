//! The aggregation actor. One tokio task owns every open
//! `TaskAggregationState`; registration, signature submission, timeouts, and
//! status queries all arrive as commands on a single channel, so state
//! transitions for one task index are linearizable while distinct indices
//! interleave freely. Completed attestations leave on an unbounded FIFO
//! channel consumed by the on-chain responder.

use crate::state::{AggregationStatus, TaskAggregationState};
use attestor_crypto::BlsScheme;
use attestor_types::{
    AggregatedAttestation, AttestorError, G1Point, OperatorId, OperatorInfo, Result, Task,
    TaskIndex,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

enum Command {
    Register {
        task: Task,
        expected_signers: Vec<OperatorInfo>,
        reply: oneshot::Sender<Result<()>>,
    },
    Submit {
        task_index: TaskIndex,
        operator_id: OperatorId,
        point: G1Point,
        metadata_url: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Timeout {
        task_index: TaskIndex,
    },
    Status {
        task_index: TaskIndex,
        reply: oneshot::Sender<Option<AggregationStatus>>,
    },
}

/// Cloneable handle to the scheduler actor.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Open aggregation tracking for a task. `DuplicateTask` if the index is
    /// already open or has already settled (finalized or timed out).
    pub async fn register_task(
        &self,
        task: Task,
        expected_signers: Vec<OperatorInfo>,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Register {
            task,
            expected_signers,
            reply,
        })?;
        rx.await
            .map_err(|_| AttestorError::Aggregation("scheduler stopped".to_string()))?
    }

    /// Record one operator's partial signature and re-evaluate quorum.
    pub async fn submit_partial_signature(
        &self,
        task_index: TaskIndex,
        operator_id: OperatorId,
        point: G1Point,
        metadata_url: String,
    ) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit {
            task_index,
            operator_id,
            point,
            metadata_url,
            reply,
        })?;
        rx.await
            .map_err(|_| AttestorError::Aggregation("scheduler stopped".to_string()))?
    }

    /// Last known status for a task index; `None` if never registered.
    pub async fn status(&self, task_index: TaskIndex) -> Option<AggregationStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { task_index, reply }).ok()?;
        rx.await.ok().flatten()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| AttestorError::Aggregation("scheduler stopped".to_string()))
    }
}

pub struct AggregationScheduler {
    scheme: Arc<dyn BlsScheme>,
    open: HashMap<TaskIndex, TaskAggregationState>,
    /// Settled indices and how they settled; registration against any of
    /// these is a duplicate, submission is unknown-task.
    closed: HashMap<TaskIndex, AggregationStatus>,
    attestation_tx: mpsc::UnboundedSender<AggregatedAttestation>,
    command_tx: mpsc::UnboundedSender<Command>,
    command_rx: mpsc::UnboundedReceiver<Command>,
}

impl AggregationScheduler {
    /// Spawn the actor. Returns the command handle, the attestation stream,
    /// and the actor's join handle.
    pub fn spawn(
        scheme: Arc<dyn BlsScheme>,
    ) -> (
        SchedulerHandle,
        mpsc::UnboundedReceiver<AggregatedAttestation>,
        JoinHandle<()>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (attestation_tx, attestation_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            scheme,
            open: HashMap::new(),
            closed: HashMap::new(),
            attestation_tx,
            command_tx: command_tx.clone(),
            command_rx,
        };
        let handle = SchedulerHandle { tx: command_tx };
        let join = tokio::spawn(scheduler.run());
        (handle, attestation_rx, join)
    }

    async fn run(mut self) {
        while let Some(command) = self.command_rx.recv().await {
            match command {
                Command::Register {
                    task,
                    expected_signers,
                    reply,
                } => {
                    let _ = reply.send(self.handle_register(task, expected_signers));
                }
                Command::Submit {
                    task_index,
                    operator_id,
                    point,
                    metadata_url,
                    reply,
                } => {
                    let _ = reply.send(self.handle_submit(task_index, operator_id, point, &metadata_url));
                }
                Command::Timeout { task_index } => self.handle_timeout(task_index),
                Command::Status { task_index, reply } => {
                    let status = self
                        .open
                        .get(&task_index)
                        .map(|s| s.status())
                        .or_else(|| self.closed.get(&task_index).copied());
                    let _ = reply.send(status);
                }
            }
        }
        debug!("Aggregation scheduler stopped");
    }

    fn handle_register(&mut self, task: Task, expected_signers: Vec<OperatorInfo>) -> Result<()> {
        let index = task.index;
        if self.open.contains_key(&index) || self.closed.contains_key(&index) {
            return Err(AttestorError::DuplicateTask(index));
        }

        let state = TaskAggregationState::new(task, expected_signers, Instant::now())?;
        let timeout = Duration::from_millis(state.task().timeout_ms);
        info!(
            task_index = index,
            quorums = ?state.task().quorum_numbers,
            timeout_ms = state.task().timeout_ms,
            "Task registered for aggregation"
        );
        self.open.insert(index, state);

        // Arm the deadline. The timer only sends a command; the decision of
        // whether the task is still open happens here, serialized.
        let tx = self.command_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx.send(Command::Timeout { task_index: index });
        });
        Ok(())
    }

    fn handle_submit(
        &mut self,
        task_index: TaskIndex,
        operator_id: OperatorId,
        point: G1Point,
        metadata_url: &str,
    ) -> Result<()> {
        let state = self
            .open
            .get_mut(&task_index)
            .ok_or(AttestorError::UnknownTask(task_index))?;

        // A mismatched metadata URL digests to a different message than the
        // one this task's signatures must cover.
        if metadata_url != state.task().metadata_url {
            return Err(AttestorError::MalformedSubmission(format!(
                "metadata_url does not match task {}",
                task_index
            )));
        }

        let satisfied = state.record_signature(operator_id, point)?;
        debug!(
            task_index,
            operator_id = %operator_id,
            signatures = state.signature_count(),
            "Partial signature recorded"
        );

        if satisfied {
            self.finalize(task_index);
        }
        Ok(())
    }

    /// Open → Finalized: build and emit the attestation exactly once, then
    /// retire the index so late traffic fails with `UnknownTask`.
    fn finalize(&mut self, task_index: TaskIndex) {
        let built = match self.open.get_mut(&task_index) {
            Some(state) => state.build_attestation(self.scheme.as_ref()),
            None => return,
        };
        match built {
            Ok(attestation) => {
                info!(
                    task_index,
                    non_signers = attestation.non_signer_info.non_signer_pubkeys.len(),
                    "Quorum reached, attestation emitted"
                );
                self.open.remove(&task_index);
                self.closed.insert(task_index, AggregationStatus::Finalized);
                let _ = self.attestation_tx.send(attestation);
            }
            Err(e) => {
                warn!(task_index, error = %e, "Attestation build failed, task stays open");
                if let Some(state) = self.open.get_mut(&task_index) {
                    state.reopen();
                }
            }
        }
    }

    fn handle_timeout(&mut self, task_index: TaskIndex) {
        let signatures = match self.open.get_mut(&task_index) {
            Some(state) => {
                state.mark_timed_out();
                state.signature_count()
            }
            None => return,
        };
        self.open.remove(&task_index);
        self.closed.insert(task_index, AggregationStatus::TimedOut);
        warn!(
            task_index,
            signatures, "Task deadline elapsed before quorum, no attestation"
        );
    }
}
