//! Shared test doubles for the integration suite.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prose_cascade::services::knowledge::{KnowledgeError, VectorStore};
use prose_cascade::KnowledgeChunk;
use prose_cascade_llm::{BackendKind, GenerateRequest, LlmError, LlmResult, ModelBackend};

/// What a scripted backend does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(&'static str),
    Fail(LlmError),
    /// Never answers; the caller's deadline must fire
    Hang,
}

/// Backend that plays back a script. The last step repeats.
pub struct ScriptedBackend {
    name: String,
    kind: BackendKind,
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    timeouts: Mutex<Vec<Duration>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(name: &str, steps: Vec<Step>) -> Arc<Self> {
        Self::with_kind(name, BackendKind::Local, steps)
    }

    pub fn with_kind(name: &str, kind: BackendKind, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            timeouts: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps
                .front()
                .cloned()
                .unwrap_or(Step::Fail(LlmError::EmptyResponse))
        }
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "scripted"
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn generate(&self, request: &GenerateRequest, timeout: Duration) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.timeouts.lock().unwrap().push(timeout);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match self.next_step() {
            Step::Reply(text) => Ok(text.to_string()),
            Step::Fail(err) => Err(err),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

pub fn transport_error() -> LlmError {
    LlmError::Transport {
        message: "connection reset".to_string(),
    }
}

/// Store returning fixed chunks and counting queries.
pub struct FixedStore {
    chunks: Vec<KnowledgeChunk>,
    queries: AtomicUsize,
}

impl FixedStore {
    pub fn new(chunks: Vec<KnowledgeChunk>) -> Arc<Self> {
        Arc::new(Self {
            chunks,
            queries: AtomicUsize::new(0),
        })
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for FixedStore {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn query(&self, _text: &str, top_k: usize) -> Result<Vec<KnowledgeChunk>, KnowledgeError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}
