use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{
    config::RefreshConfig,
    persist::{PuzzleSink, StoreError, StoreResult},
    puzzle::{DecodeError, PuzzleKey, PuzzleRecord},
    types::{Cell, Difficulty},
};

use super::events::{FeedEntry, FeedEvent, RefreshEvent};

/// Errors returned by [`RefreshHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The listener task has stopped.
    #[error("refresh listener is not running")]
    ChannelClosed,
    /// The store rejected the replacement.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The blocking replace task panicked or was cancelled.
    #[error("join error: {0}")]
    Join(String),
}

/// Puzzles that decoded plus the entries that did not.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    /// Successfully decoded puzzles, in feed order.
    pub puzzles: Vec<PuzzleRecord>,
    /// Index and reason for every skipped entry. A count shortfall is one
    /// [`DecodeError::MissingEntries`] at the index of the first absent entry.
    pub failures: Vec<(usize, DecodeError)>,
    /// Declared entries that did not make it into `puzzles`.
    pub skipped: usize,
}

/// Summary of one applied batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Puzzles now in the catalog.
    pub stored: usize,
    /// Declared entries dropped for failing to decode or being absent.
    pub skipped: usize,
}

/// Decodes entries `0..count`, skipping (and logging) any that fail.
///
/// Entries past `count` are ignored. Declared entries the payload lacks are
/// reported once, as a single shortfall.
pub fn decode_batch(event: &FeedEvent) -> DecodedBatch {
    let mut batch = DecodedBatch::default();
    let declared = event.declared_count();
    let present = declared.min(event.entries.len());
    for (index, entry) in event.entries[..present].iter().enumerate() {
        match decode_entry(index, entry) {
            Ok(rec) => batch.puzzles.push(rec),
            Err(err) => {
                warn!(index, %err, "skipping undecodable feed entry");
                batch.failures.push((index, err));
                batch.skipped += 1;
            }
        }
    }
    if declared > present {
        let err = DecodeError::MissingEntries { declared, present };
        warn!(%err, "feed batch is short");
        batch.failures.push((present, err));
        batch.skipped = batch.skipped.saturating_add(declared - present);
    }
    batch
}

fn decode_entry(index: usize, entry: &FeedEntry) -> Result<PuzzleRecord, DecodeError> {
    let key = match entry.key.as_ref().ok_or(DecodeError::MissingKey { index })? {
        Value::String(text) => PuzzleKey::from_json(text)?,
        other => PuzzleKey::try_from(serde_json::from_value::<Vec<Cell>>(other.clone())?)?,
    };
    let difficulty = entry
        .difficulty
        .as_deref()
        .ok_or(DecodeError::MissingDifficulty { index })?
        .parse::<Difficulty>()?;
    Ok(PuzzleRecord::new(key, difficulty))
}

/// Decodes `event` and replaces the catalog with whatever decoded.
///
/// A batch with no valid count, or where nothing decodes, empties the catalog.
pub fn apply_feed_event<S: PuzzleSink + ?Sized>(
    sink: &S,
    event: &FeedEvent,
) -> StoreResult<RefreshOutcome> {
    let batch = decode_batch(event);
    sink.replace_all(&batch.puzzles)?;
    Ok(RefreshOutcome {
        stored: batch.puzzles.len(),
        skipped: batch.skipped,
    })
}

enum Command {
    Batch {
        event: FeedEvent,
        resp: Option<oneshot::Sender<Result<RefreshOutcome, RefreshError>>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Producer-side handle to a running refresh listener.
#[derive(Clone)]
pub struct RefreshHandle {
    feed_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<RefreshEvent>,
}

/// Spawns the listener task on the current tokio runtime.
///
/// Batches are applied one at a time in arrival order. Batches sent before
/// the task first runs wait in the queue; none are redelivered.
pub fn spawn_refresh_listener<S>(sink: S, config: RefreshConfig) -> RefreshHandle
where
    S: PuzzleSink + 'static,
{
    let (feed_tx, mut feed_rx) = mpsc::channel::<Command>(config.feed_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<RefreshEvent>(config.event_capacity.max(1));

    let sink = Arc::new(sink);
    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        while let Some(cmd) = feed_rx.recv().await {
            match cmd {
                Command::Batch { event, resp } => {
                    let out = run_refresh(Arc::clone(&sink), event, &events_tx_loop).await;
                    if let Some(resp) = resp {
                        let _ = resp.send(out);
                    }
                }
                Command::Shutdown { resp } => {
                    let _ = resp.send(());
                    break;
                }
            }
        }
        debug!("refresh listener stopped");
    });

    RefreshHandle { feed_tx, events_tx }
}

impl RefreshHandle {
    /// Receives an event for every batch applied after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events_tx.subscribe()
    }

    /// Queues a batch without waiting for it to be applied.
    pub async fn deliver(&self, event: FeedEvent) -> Result<(), RefreshError> {
        self.feed_tx
            .send(Command::Batch { event, resp: None })
            .await
            .map_err(|_| RefreshError::ChannelClosed)
    }

    /// Queues a batch from a thread outside the runtime.
    ///
    /// Panics if called from within an async context, as
    /// [`mpsc::Sender::blocking_send`] does.
    pub fn blocking_deliver(&self, event: FeedEvent) -> Result<(), RefreshError> {
        self.feed_tx
            .blocking_send(Command::Batch { event, resp: None })
            .map_err(|_| RefreshError::ChannelClosed)
    }

    /// Queues a batch and waits until it has been applied.
    pub async fn refresh(&self, event: FeedEvent) -> Result<RefreshOutcome, RefreshError> {
        let (tx, rx) = oneshot::channel();
        self.feed_tx
            .send(Command::Batch {
                event,
                resp: Some(tx),
            })
            .await
            .map_err(|_| RefreshError::ChannelClosed)?;
        rx.await.map_err(|_| RefreshError::ChannelClosed)?
    }

    /// Stops the listener after the batches already queued.
    pub async fn shutdown(&self) -> Result<(), RefreshError> {
        let (tx, rx) = oneshot::channel();
        self.feed_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RefreshError::ChannelClosed)?;
        rx.await.map_err(|_| RefreshError::ChannelClosed)
    }
}

async fn run_refresh<S>(
    sink: Arc<S>,
    event: FeedEvent,
    events_tx: &broadcast::Sender<RefreshEvent>,
) -> Result<RefreshOutcome, RefreshError>
where
    S: PuzzleSink + 'static,
{
    let result = tokio::task::spawn_blocking(move || apply_feed_event(&*sink, &event))
        .await
        .map_err(|e| RefreshError::Join(e.to_string()))
        .and_then(|r| r.map_err(RefreshError::from));

    match &result {
        Ok(outcome) => {
            info!(stored = outcome.stored, skipped = outcome.skipped, "applied puzzle batch");
            let _ = events_tx.send(RefreshEvent::CatalogReplaced {
                stored: outcome.stored,
                skipped: outcome.skipped,
            });
        }
        Err(err) => {
            warn!(%err, "puzzle batch not applied");
            let _ = events_tx.send(RefreshEvent::ReplaceFailed {
                reason: err.to_string(),
            });
        }
    }
    result
}
