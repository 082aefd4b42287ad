//! Pipeline progress events.
//!
//! Emits [`PipelineEvent`]s via a [`tokio::sync::broadcast`] channel so that
//! observers such as the CLI progress printer can follow a run without
//! reaching into the engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use swarm_types::{RunStatus, StageName};

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    RunStarted {
        run_id: String,
        stage_count: usize,
    },
    StageStarted {
        stage: StageName,
        agent: String,
    },
    StageCompleted {
        stage: StageName,
        output_len: usize,
        duration_ms: u64,
    },
    StageFailed {
        stage: StageName,
        error: String,
    },
    ArtifactWritten {
        path: PathBuf,
    },
    BuildFinished {
        passed: bool,
    },
    RunFinished {
        run_id: String,
        status: RunStatus,
        duration_ms: u64,
    },
}

/// Event emitter wrapping a broadcast sender.
#[derive(Clone)]
pub struct EventEmitter {
    sender: tokio::sync::broadcast::Sender<PipelineEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// If there are no active receivers the event is silently dropped.
    pub fn emit(&self, event: PipelineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
