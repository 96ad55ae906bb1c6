//! Bounded-parallel batch conversion.

use crate::engine::{ConversionEngine, Direction};
use crate::error::ConvertError;
use recast_core::{Record, Value};
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-call batch parameters.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Items per chunk; a chunk is the unit of admission
    pub chunk_size: usize,

    /// Upper bound on concurrently running chunk tasks
    pub max_workers: usize,

    /// Optional deadline governing the whole call
    pub deadline: Option<Duration>,
}

impl BatchOptions {
    /// Create options with the given chunking and worker bound.
    pub fn new(chunk_size: usize, max_workers: usize) -> Self {
        Self {
            chunk_size,
            max_workers,
            deadline: None,
        }
    }

    /// Attach a deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::new(128, 4)
    }
}

/// Result of converting one batch item.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    /// The item's position in the input sequence
    pub index: usize,

    /// The converted record, or why this item failed
    pub result: Result<Value, ConvertError>,
}

impl ItemOutcome {
    /// Whether the item converted successfully.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate result of a batch call.
///
/// `results` always has exactly one entry per input item, at the item's
/// original index, regardless of chunk completion order. A batch with failed
/// items is not an error; callers inspect the counts.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Per-item results, `results[i].index == i`
    pub results: Vec<ItemOutcome>,

    /// Number of successfully converted items
    pub succeeded: usize,

    /// Number of failed items (including deadline-exceeded)
    pub failed: usize,

    /// Wall-clock duration of the call
    pub elapsed: Duration,
}

/// Converts record sequences with bounded parallelism and partial-failure
/// tolerance.
pub struct BatchScheduler {
    engine: Arc<ConversionEngine>,
}

impl BatchScheduler {
    /// Create a scheduler over a shared engine.
    pub fn new(engine: Arc<ConversionEngine>) -> Self {
        Self { engine }
    }

    /// Convert every record in `items` into a fresh `dest_type` record.
    ///
    /// The input is partitioned into contiguous, order-preserving chunks of
    /// `chunk_size` items. Chunk tasks pass an admission gate bounding
    /// concurrency at `max_workers`; each admitted task converts its items
    /// sequentially, recording per-item outcomes without stopping at the
    /// first failure. When the deadline expires, admitted tasks finish their
    /// current item and mark the remainder deadline-exceeded; unadmitted
    /// tasks mark their whole chunk without starting.
    ///
    /// A non-sequence input is a structural error and fails the call before
    /// any worker starts; everything else yields a [`BatchOutcome`].
    pub async fn execute(
        &self,
        direction: Direction,
        dest_type: &str,
        items: &Value,
        opts: &BatchOptions,
    ) -> Result<BatchOutcome, ConvertError> {
        let started = Instant::now();

        let items = match items {
            Value::List(items) => items,
            other => {
                return Err(ConvertError::NotASequence {
                    actual: other.kind(),
                })
            }
        };

        let total = items.len();
        if total == 0 {
            return Ok(BatchOutcome {
                results: Vec::new(),
                succeeded: 0,
                failed: 0,
                elapsed: started.elapsed(),
            });
        }

        let chunk_size = opts.chunk_size.max(1);
        let max_workers = opts.max_workers.max(1);
        let chunk_count = total.div_ceil(chunk_size);

        debug!(
            total,
            chunk_count,
            max_workers,
            deadline = ?opts.deadline,
            "starting batch conversion"
        );

        let items = Arc::new(items.clone());
        let gate = Arc::new(Semaphore::new(max_workers));
        let cancel = CancellationToken::new();

        if let Some(deadline) = opts.deadline {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                cancel.cancel();
            });
        }

        let mut handles: Vec<(Range<usize>, JoinHandle<Vec<ItemOutcome>>)> =
            Vec::with_capacity(chunk_count);
        for chunk_index in 0..chunk_count {
            let range = chunk_index * chunk_size..((chunk_index + 1) * chunk_size).min(total);
            let task = run_chunk(
                Arc::clone(&self.engine),
                direction,
                dest_type.to_string(),
                Arc::clone(&items),
                range.clone(),
                Arc::clone(&gate),
                cancel.clone(),
            );
            handles.push((range, tokio::spawn(task)));
        }

        // Pre-sized result array; every outcome lands at its original index.
        let mut slots: Vec<Option<ItemOutcome>> = Vec::new();
        slots.resize_with(total, || None);

        for (range, handle) in handles {
            match handle.await {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        let index = outcome.index;
                        slots[index] = Some(outcome);
                    }
                }
                Err(join_error) => {
                    warn!(
                        start = range.start,
                        end = range.end,
                        error = %join_error,
                        "batch chunk task aborted"
                    );
                    for index in range {
                        slots[index] = Some(ItemOutcome {
                            index,
                            result: Err(ConvertError::TaskFailed(join_error.to_string())),
                        });
                    }
                }
            }
        }

        let results: Vec<ItemOutcome> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or(ItemOutcome {
                    index,
                    result: Err(ConvertError::TaskFailed("result never recorded".into())),
                })
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = total - succeeded;
        let elapsed = started.elapsed();

        if cancel.is_cancelled() && opts.deadline.is_some() {
            warn!(total, succeeded, failed, "batch deadline expired");
        }
        debug!(total, succeeded, failed, ?elapsed, "batch conversion finished");

        Ok(BatchOutcome {
            results,
            succeeded,
            failed,
            elapsed,
        })
    }
}

/// Convert one chunk's items sequentially, after passing the admission gate.
async fn run_chunk(
    engine: Arc<ConversionEngine>,
    direction: Direction,
    dest_type: String,
    items: Arc<Vec<Value>>,
    range: Range<usize>,
    gate: Arc<Semaphore>,
    cancel: CancellationToken,
) -> Vec<ItemOutcome> {
    let mut outcomes = Vec::with_capacity(range.len());

    let permit = tokio::select! {
        _ = cancel.cancelled() => None,
        permit = gate.acquire_owned() => permit.ok(),
    };
    let Some(_permit) = permit else {
        // Never admitted: the whole chunk is deadline-exceeded.
        for index in range {
            outcomes.push(ItemOutcome {
                index,
                result: Err(ConvertError::DeadlineExceeded),
            });
        }
        return outcomes;
    };

    for index in range {
        if cancel.is_cancelled() {
            outcomes.push(ItemOutcome {
                index,
                result: Err(ConvertError::DeadlineExceeded),
            });
            continue;
        }

        let mut dst = Value::Record(Record::new(dest_type.as_str()));
        let result = engine
            .convert(direction, &items[index], &mut dst)
            .map(|()| dst);
        outcomes.push(ItemOutcome { index, result });
    }

    outcomes
}
