//! Fixed-size worker pool fed through a bounded queue.
//!
//! ```text
//! [Dispatcher] --bounded(W)--> [Worker 0..W] --> Mutex<Vec<R>>
//! splits work     backpressure   run `work`      first finisher
//! into batches                   per batch       appends first
//! ```

use std::sync::Mutex;
use std::thread;

use anyhow::{Result, bail};
use crossbeam_channel::bounded;
use tracing::{debug, warn};

/// Sizes of the batches covering `total` units, the last one possibly short.
pub fn batch_sizes(total: usize, batch_size: usize) -> impl Iterator<Item = usize> {
    let batch_size = batch_size.max(1);
    (0..total.div_ceil(batch_size)).map(move |i| batch_size.min(total - i * batch_size))
}

/// Run `work` over every batch on `workers` threads and collect the outputs.
///
/// A batch whose `work` returns an error is logged and dropped; the other
/// batches still run. Output order is whatever order the workers finish in.
/// Returns only after every worker has exited.
pub fn run_batches<B, R, F>(
    batches: impl IntoIterator<Item = B>,
    workers: usize,
    work: F,
) -> Result<Vec<R>>
where
    B: Send,
    R: Send,
    F: Fn(B) -> Result<R> + Sync,
{
    let workers = workers.max(1);
    let (batch_tx, batch_rx) = bounded::<B>(workers);
    let results = Mutex::new(Vec::new());
    let work = &work;
    let results_ref = &results;

    let dispatched = thread::scope(|scope| {
        for worker in 0..workers {
            let batch_rx = batch_rx.clone();
            scope.spawn(move || {
                let mut done = 0usize;
                for batch in batch_rx.iter() {
                    match work(batch) {
                        Ok(out) => {
                            results_ref
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .push(out);
                            done += 1;
                        }
                        Err(e) => warn!(worker, "Batch failed, skipping: {:#}", e),
                    }
                }
                debug!(worker, batches = done, "Worker drained queue");
            });
        }
        drop(batch_rx);

        // Blocks while all workers are busy and the queue is full.
        for batch in batches {
            if batch_tx.send(batch).is_err() {
                return false;
            }
        }
        drop(batch_tx);
        true
    });

    if !dispatched {
        bail!("Worker pool shut down before all batches were dispatched");
    }

    Ok(results.into_inner().unwrap_or_else(|e| e.into_inner()))
}
