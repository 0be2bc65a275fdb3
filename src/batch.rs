//! Bounded-concurrency batch conversion.
//!
//! A batch runs the conversion pipeline over every item with one shared set
//! of options. Exactly `workers` threads pull indices from a shared atomic
//! cursor until it runs past the end of the list, so no index is ever claimed
//! twice and completion order across workers is unspecified.
//!
//! ```text
//! cursor ──fetch_add──▶ worker 1 ─┐
//!        ──fetch_add──▶ worker 2 ─┼─▶ convert_item ─▶ progress n/total
//!        ──fetch_add──▶ worker N ─┘
//! ```
//!
//! Item failures are recorded on the item and never fail the batch. The only
//! batch-level error is failing to start the worker threads.
//!
//! Progress is published as [`BatchEvent`]s over an optional channel. The
//! completed counter is bumped and its event sent under one lock, so
//! receivers see `completed` rise by exactly one per event.

use crate::convert::{ConversionItem, ItemId, ItemStatus, convert_item};
use crate::imaging::{ConversionOptions, ImageBackend};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Upper bound on concurrent conversions.
pub const MAX_CONCURRENCY: usize = 6;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to start batch workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Progress notification emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Started {
        total: usize,
        workers: usize,
    },
    ItemFinished {
        /// Position of the item in the batch.
        index: usize,
        id: ItemId,
        name: String,
        status: ItemStatus,
        error: Option<String>,
        completed: usize,
        total: usize,
    },
    Finished(BatchSummary),
}

/// Terminal tally of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    pub workers: usize,
}

/// Concurrency level for a parallelism hint: one unit of headroom, at least
/// one worker, at most [`MAX_CONCURRENCY`].
pub fn concurrency_for(hint: usize) -> usize {
    hint.saturating_sub(1).clamp(1, MAX_CONCURRENCY)
}

/// Available hardware parallelism, or 1 when it cannot be determined.
pub fn available_parallelism_hint() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

struct Progress {
    completed: usize,
    events: Option<Sender<BatchEvent>>,
}

impl Progress {
    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening
            let _ = tx.send(event);
        }
    }
}

/// Convert every item in `items` with `options` using `workers` threads.
///
/// Returns once every item is `done` or `error`. `workers` is clamped to
/// `1..=`[`MAX_CONCURRENCY`].
pub fn run_batch(
    backend: &impl ImageBackend,
    items: &mut [ConversionItem],
    options: &ConversionOptions,
    workers: usize,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError> {
    let total = items.len();
    let workers = workers.clamp(1, MAX_CONCURRENCY);
    let progress = Mutex::new(Progress {
        completed: 0,
        events,
    });

    info!(total, workers, format = %options.format, "starting batch");
    lock(&progress).emit(BatchEvent::Started { total, workers });

    if total > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("reframe-worker-{i}"))
            .build()?;

        let slots: Vec<Mutex<&mut ConversionItem>> = items.iter_mut().map(Mutex::new).collect();
        let cursor = AtomicUsize::new(0);

        pool.scope(|scope| {
            for worker in 0..workers {
                let (slots, cursor, progress) = (&slots, &cursor, &progress);
                scope.spawn(move |_| {
                    run_worker(worker, backend, slots, cursor, options, progress)
                });
            }
        });
    }

    let summary = BatchSummary {
        total,
        done: count(items, ItemStatus::Done),
        failed: count(items, ItemStatus::Error),
        workers,
    };
    info!(
        total = summary.total,
        done = summary.done,
        failed = summary.failed,
        "batch finished"
    );
    lock(&progress).emit(BatchEvent::Finished(summary));
    Ok(summary)
}

fn run_worker(
    worker: usize,
    backend: &impl ImageBackend,
    slots: &[Mutex<&mut ConversionItem>],
    cursor: &AtomicUsize,
    options: &ConversionOptions,
    progress: &Mutex<Progress>,
) {
    loop {
        let index = cursor.fetch_add(1, Ordering::SeqCst);
        let Some(slot) = slots.get(index) else {
            debug!(worker, "cursor exhausted");
            return;
        };

        let mut item = lock(slot);
        let status = convert_item(backend, &mut **item, options);

        let mut progress = lock(progress);
        progress.completed += 1;
        let completed = progress.completed;
        debug!(worker, index, completed, total = slots.len(), ?status, "item finished");
        progress.emit(BatchEvent::ItemFinished {
            index,
            id: item.id(),
            name: item.source().name.clone(),
            status,
            error: item.error().map(str::to_string),
            completed,
            total: slots.len(),
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn count(items: &[ConversionItem], status: ItemStatus) -> usize {
    items.iter().filter(|i| i.status() == status).count()
}
