//! In-memory fakes shared by the unit tests in this crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use futures_util::stream;

use promptgate_types::error::StorageError;
use promptgate_types::llm::{CompletionRequest, LlmError, StreamEvent};
use promptgate_types::model::TokenEncoding;
use promptgate_types::usage::{ModelUsage, UsageRecord, UsageTotals};

use crate::llm::provider::{CompletionProvider, EventStream};
use crate::tokenizer::Tokenizer;
use crate::usage::repository::UsageRepository;

/// Counts whitespace-delimited words as tokens, ignoring the encoding.
/// Framing markers like `<|user|>` cost one token each.
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn count(&self, _encoding: TokenEncoding, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// In-memory usage repository with switchable failure injection.
#[derive(Default)]
pub struct MemoryUsageRepository {
    records: Mutex<Vec<UsageRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<UsageRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl UsageRepository for MemoryUsageRepository {
    async fn insert(&self, record: &UsageRecord) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Query("injected write failure".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn sum_between(
        &self,
        user_id: &str,
        model_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<UsageTotals, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Query("injected read failure".to_string()));
        }
        let records = self.records.lock().unwrap();
        let mut totals = UsageTotals::default();
        for r in records.iter().filter(|r| {
            r.user_id == user_id && r.model_id == model_id && r.recorded_at > from && r.recorded_at < to
        }) {
            totals.prompt_tokens += u64::from(r.counts.prompt_tokens);
            totals.completion_tokens += u64::from(r.counts.completion_tokens);
            totals.total_tokens += u64::from(r.counts.total_tokens);
        }
        Ok(totals)
    }

    async fn sum_by_model(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ModelUsage>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Query("injected read failure".to_string()));
        }
        let records = self.records.lock().unwrap();
        let mut by_model: Vec<ModelUsage> = Vec::new();
        for r in records.iter().filter(|r| {
            r.user_id == user_id && r.recorded_at > from && r.recorded_at < to
        }) {
            let entry = match by_model.iter_mut().find(|m| m.model_id == r.model_id) {
                Some(entry) => entry,
                None => {
                    by_model.push(ModelUsage {
                        model_id: r.model_id.clone(),
                        totals: UsageTotals::default(),
                    });
                    by_model.last_mut().unwrap()
                }
            };
            entry.totals.prompt_tokens += u64::from(r.counts.prompt_tokens);
            entry.totals.completion_tokens += u64::from(r.counts.completion_tokens);
            entry.totals.total_tokens += u64::from(r.counts.total_tokens);
        }
        Ok(by_model)
    }
}

/// Provider that replays a scripted event sequence once.
pub struct ScriptedProvider {
    events: Mutex<Option<Vec<Result<StreamEvent, LlmError>>>>,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(events: Vec<Result<StreamEvent, LlmError>>) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            last_request: Mutex::new(None),
        }
    }

    /// Convenience: a provider that streams text chunks then `Done`.
    pub fn with_text_chunks(chunks: &[&str]) -> Self {
        let mut events: Vec<Result<StreamEvent, LlmError>> = vec![Ok(StreamEvent::Connected)];
        for chunk in chunks {
            events.push(Ok(StreamEvent::TextDelta {
                text: (*chunk).to_string(),
            }));
        }
        events.push(Ok(StreamEvent::Done));
        Self::new(events)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        *self.last_request.lock().unwrap() = Some(request);
        let events = self.events.lock().unwrap().take().unwrap_or_default();
        Box::pin(stream::iter(events))
    }
}
