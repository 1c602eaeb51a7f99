//! Tap-while-forwarding usage relay.
//!
//! A transform stage between the provider's event stream and the caller's
//! sink. Every event is forwarded verbatim and immediately; text deltas
//! are additionally appended to an in-memory accumulator. When the
//! provider signals end-of-stream, the completion token count is computed
//! by tokenizing the full accumulated text in one pass (per-chunk counts
//! would double-count tokens split across chunk boundaries) and one
//! usage record is appended to the ledger. The record is committed before
//! the terminal event is forwarded: a consumer that stops polling the
//! moment it sees end-of-stream is still accounted.
//!
//! Finalization runs at most once. If the stream errors, or the caller
//! drops the stream before completion (client disconnect), no usage
//! record is written for the aborted attempt -- partial usage is not
//! accounted.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tracing::error;

use promptgate_types::llm::{LlmError, StreamEvent};
use promptgate_types::model::TokenEncoding;
use promptgate_types::usage::{OperationKind, UsageCounts};

use crate::llm::provider::EventStream;
use crate::tokenizer::Tokenizer;
use crate::usage::ledger::UsageLedger;
use crate::usage::repository::UsageRepository;

/// Everything the relay needs to commit usage after the stream ends.
pub struct RelayContext<R: UsageRepository, T: Tokenizer> {
    pub ledger: Arc<UsageLedger<R>>,
    pub tokenizer: Arc<T>,
    pub encoding: TokenEncoding,
    pub user_id: String,
    pub model_id: String,
    /// Known before the call, from the fitter.
    pub prompt_tokens: u32,
}

/// Wrap a provider stream so that usage is committed once on completion.
///
/// Forwarding is transparent to backpressure: one event in, one event
/// out, no buffering beyond the text accumulator needed for counting.
pub fn tap_usage<R, T>(
    upstream: EventStream,
    ctx: RelayContext<R, T>,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>
where
    R: UsageRepository + 'static,
    T: Tokenizer + 'static,
{
    Box::pin(async_stream::stream! {
        let mut accumulated = String::new();
        let mut failed = false;
        let mut terminated = false;
        let mut upstream = std::pin::pin!(upstream);

        while let Some(item) = upstream.next().await {
            match item {
                Ok(StreamEvent::TextDelta { text }) => {
                    accumulated.push_str(&text);
                    yield Ok(StreamEvent::TextDelta { text });
                }
                // Deferred: the terminal event is forwarded only after
                // the usage record is committed. Consumers are free to
                // stop polling once they see it.
                Ok(StreamEvent::Done) => {
                    terminated = true;
                    break;
                }
                Ok(other) => {
                    yield Ok(other);
                }
                Err(e) => {
                    failed = true;
                    yield Err(e);
                    break;
                }
            }
        }

        if !failed {
            let completion_tokens =
                ctx.tokenizer.count(ctx.encoding, &accumulated) as u32;
            let counts = UsageCounts::new(ctx.prompt_tokens, completion_tokens);

            // A write failure here is a billing-integrity loss, not a
            // request failure: the response has already been streamed.
            if let Err(e) = ctx
                .ledger
                .record(&ctx.user_id, &ctx.model_id, OperationKind::Chat, counts)
                .await
            {
                error!(
                    user_id = %ctx.user_id,
                    model_id = %ctx.model_id,
                    total_tokens = counts.total_tokens,
                    "usage record lost after completed stream: {e}"
                );
            }

            if terminated {
                yield Ok(StreamEvent::Done);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryUsageRepository, WordTokenizer};
    use futures_util::stream;
    use promptgate_types::config::QuotaWindow;

    fn context(
        repo_holder: &mut Option<Arc<UsageLedger<MemoryUsageRepository>>>,
        prompt_tokens: u32,
    ) -> RelayContext<MemoryUsageRepository, WordTokenizer> {
        let ledger = Arc::new(UsageLedger::new(MemoryUsageRepository::new()));
        *repo_holder = Some(ledger.clone());
        RelayContext {
            ledger,
            tokenizer: Arc::new(WordTokenizer),
            encoding: TokenEncoding::Cl100kBase,
            user_id: "u-1".to_string(),
            model_id: "gpt-4o".to_string(),
            prompt_tokens,
        }
    }

    fn text_events(chunks: &[&str]) -> EventStream {
        let mut events: Vec<Result<StreamEvent, LlmError>> = vec![Ok(StreamEvent::Connected)];
        for c in chunks {
            events.push(Ok(StreamEvent::TextDelta { text: (*c).to_string() }));
        }
        events.push(Ok(StreamEvent::Done));
        Box::pin(stream::iter(events))
    }

    #[tokio::test]
    async fn forwards_chunks_verbatim_and_counts_once() {
        // "Hel" + "lo wor" + "ld" decode to "Hello world" = 2 tokens as
        // one decode; summing per-chunk word counts would give 4.
        let mut ledger = None;
        let ctx = context(&mut ledger, 30);
        let relayed = tap_usage(text_events(&["Hel", "lo wor", "ld"]), ctx);

        let events: Vec<_> = relayed.collect().await;
        let texts: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::TextDelta { text }) => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Hel", "lo wor", "ld"]);
        assert!(matches!(events.last(), Some(Ok(StreamEvent::Done))));

        let totals = ledger
            .unwrap()
            .sum_window("u-1", "gpt-4o", &QuotaWindow::RollingHours(1))
            .await
            .unwrap();
        assert_eq!(totals.prompt_tokens, 30);
        assert_eq!(totals.completion_tokens, 2);
        assert_eq!(totals.total_tokens, 32);
    }

    #[tokio::test]
    async fn records_exactly_one_usage_record() {
        let mut ledger = None;
        let ctx = context(&mut ledger, 10);
        let relayed = tap_usage(text_events(&["one", " two"]), ctx);
        let _events: Vec<_> = relayed.collect().await;

        let totals = ledger
            .unwrap()
            .sum_window("u-1", "gpt-4o", &QuotaWindow::RollingHours(1))
            .await
            .unwrap();
        // One record: prompt 10 + completion 2.
        assert_eq!(totals.prompt_tokens, 10);
        assert_eq!(totals.total_tokens, 12);
    }

    #[tokio::test]
    async fn consumer_that_stops_polling_at_done_is_still_billed() {
        // The SSE handler breaks out of its forwarding loop the moment
        // it sees the terminal event and never polls again, so the
        // commit must land before that event is yielded.
        let mut ledger = None;
        let ctx = context(&mut ledger, 10);
        let mut relayed = tap_usage(text_events(&["Hello", " world"]), ctx);

        while let Some(event) = relayed.next().await {
            if matches!(event, Ok(StreamEvent::Done)) {
                break;
            }
        }
        drop(relayed);

        let totals = ledger
            .unwrap()
            .sum_window("u-1", "gpt-4o", &QuotaWindow::RollingHours(1))
            .await
            .unwrap();
        assert_eq!(totals.prompt_tokens, 10);
        assert_eq!(totals.completion_tokens, 2);
        assert_eq!(totals.total_tokens, 12);
    }

    #[tokio::test]
    async fn stream_error_writes_no_record() {
        let mut ledger = None;
        let ctx = context(&mut ledger, 10);
        let events: Vec<Result<StreamEvent, LlmError>> = vec![
            Ok(StreamEvent::Connected),
            Ok(StreamEvent::TextDelta { text: "partial".to_string() }),
            Err(LlmError::Stream("connection reset".to_string())),
        ];
        let relayed = tap_usage(Box::pin(stream::iter(events)), ctx);

        let collected: Vec<_> = relayed.collect().await;
        assert!(matches!(collected.last(), Some(Err(LlmError::Stream(_)))));

        let totals = ledger
            .unwrap()
            .sum_window("u-1", "gpt-4o", &QuotaWindow::RollingHours(1))
            .await
            .unwrap();
        assert_eq!(totals.total_tokens, 0);
    }

    #[tokio::test]
    async fn dropped_stream_writes_no_record() {
        // Client disconnect: poll one chunk, then drop the stream.
        let mut ledger = None;
        let ctx = context(&mut ledger, 10);
        let mut relayed = tap_usage(text_events(&["Hel", "lo"]), ctx);

        let first = relayed.next().await;
        assert!(matches!(first, Some(Ok(StreamEvent::Connected))));
        drop(relayed);

        let totals = ledger
            .unwrap()
            .sum_window("u-1", "gpt-4o", &QuotaWindow::RollingHours(1))
            .await
            .unwrap();
        assert_eq!(totals.total_tokens, 0);
    }

    #[tokio::test]
    async fn ledger_write_failure_does_not_surface_to_stream() {
        let repo = MemoryUsageRepository::new();
        repo.fail_writes(true);
        let ledger = Arc::new(UsageLedger::new(repo));
        let ctx = RelayContext {
            ledger,
            tokenizer: Arc::new(WordTokenizer),
            encoding: TokenEncoding::Cl100kBase,
            user_id: "u-1".to_string(),
            model_id: "gpt-4o".to_string(),
            prompt_tokens: 5,
        };
        let relayed = tap_usage(text_events(&["ok"]), ctx);

        // All events still arrive despite the failed commit.
        let events: Vec<_> = relayed.collect().await;
        assert!(events.iter().all(|e| e.is_ok()));
        assert!(matches!(events.last(), Some(Ok(StreamEvent::Done))));
    }
}
