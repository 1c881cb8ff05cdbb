//! Fixed-size worker pool fed by a bounded work queue.
//!
//! One producer runs on the calling thread and pushes items into a bounded channel; a dedicated
//! rayon pool drains it. Each worker folds its results into a local vector and the vectors are
//! concatenated once the channel is closed and empty, so workers never share mutable state.

use std::sync::mpsc::{self, Receiver, SyncSender};

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use thiserror::Error;
use tracing::debug;

/// Worker pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The rayon thread pool could not be started.
    #[error("failed to start worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Sending half of the work queue, handed to the producer.
///
/// Dropping it closes the queue.
#[derive(Debug)]
pub struct Feeder<T> {
    tx: SyncSender<T>,
}

impl<T> Feeder<T> {
    /// Enqueue one item, blocking while the queue is full.
    ///
    /// Returns `false` once the workers have stopped, after which the producer should stop too.
    pub fn push(&self, item: T) -> bool {
        self.tx.send(item).is_ok()
    }
}

/// Fixed-size pool of worker threads.
#[derive(Debug)]
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
    capacity: usize,
}

impl WorkerPool {
    /// Start `workers` threads with a queue holding at most `capacity` pending items.
    ///
    /// Both values are clamped to at least one.
    pub fn new(workers: usize, capacity: usize) -> Result<Self, PoolError> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("inkpress-worker-{i}"))
            .build()?;

        Ok(Self {
            pool,
            workers,
            capacity: capacity.max(1),
        })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `produce` on the calling thread while the pool applies `work` to every queued item.
    ///
    /// `work` returns `Ok(None)` for items that yield nothing. Returns once the producer has
    /// finished and every queued item is processed. The first worker error stops the pool: queued
    /// items are dropped unprocessed and the producer sees `push` return `false`. A producer
    /// error takes precedence over a worker error.
    pub fn run<T, R, E, P, W>(&self, produce: P, work: W) -> Result<Vec<R>, E>
    where
        T: Send,
        R: Send,
        E: Send,
        P: FnOnce(Feeder<T>) -> Result<(), E>,
        W: Fn(T) -> Result<Option<R>, E> + Sync,
    {
        let (tx, rx) = mpsc::sync_channel::<T>(self.capacity);

        std::thread::scope(|scope| {
            let consumer = scope.spawn(|| self.pool.install(|| drain(rx, &work)));

            let produced = produce(Feeder { tx });
            debug!(ok = produced.is_ok(), "producer finished, queue closed");

            let consumed = match consumer.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };

            produced?;
            consumed
        })
    }
}

fn drain<T, R, E, W>(rx: Receiver<T>, work: &W) -> Result<Vec<R>, E>
where
    T: Send,
    R: Send,
    E: Send,
    W: Fn(T) -> Result<Option<R>, E> + Sync,
{
    rx.into_iter()
        .par_bridge()
        .try_fold(Vec::new, |mut local: Vec<R>, item: T| -> Result<Vec<R>, E> {
            if let Some(result) = work(item)? {
                local.push(result);
            }
            Ok(local)
        })
        .try_reduce(Vec::new, |mut left: Vec<R>, right: Vec<R>| {
            left.extend(right);
            Ok(left)
        })
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn test_processes_every_item() {
        let pool = WorkerPool::new(4, 2).unwrap();

        let mut results: Vec<u32> = pool
            .run(
                |feeder| {
                    for i in 0..100u32 {
                        assert!(feeder.push(i));
                    }
                    Ok::<_, String>(())
                },
                |i| Ok(Some(i * 2)),
            )
            .unwrap();

        results.sort_unstable();
        assert_eq!(results, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_none_results_are_skipped() {
        let pool = WorkerPool::new(2, 8).unwrap();

        let results: Vec<u32> = pool
            .run(
                |feeder| {
                    for i in 0..10u32 {
                        feeder.push(i);
                    }
                    Ok::<_, String>(())
                },
                |i| Ok(if i % 2 == 0 { Some(i) } else { None }),
            )
            .unwrap();

        let set: HashSet<_> = results.into_iter().collect();
        assert_eq!(set, HashSet::from([0, 2, 4, 6, 8]));
    }

    #[test]
    fn test_single_worker_matches_many() {
        let collect = |workers| {
            let pool = WorkerPool::new(workers, 1).unwrap();
            let mut out: Vec<u32> = pool
                .run(
                    |feeder| {
                        for i in 0..50u32 {
                            feeder.push(i);
                        }
                        Ok::<_, ()>(())
                    },
                    |i| Ok(Some(i)),
                )
                .unwrap();
            out.sort_unstable();
            out
        };

        assert_eq!(collect(1), collect(8));
    }

    #[test]
    fn test_worker_error_stops_producer() {
        let pool = WorkerPool::new(2, 1).unwrap();
        let processed = AtomicUsize::new(0);

        let result: Result<Vec<u32>, String> = pool.run(
            |feeder| {
                for i in 0..10_000u32 {
                    if !feeder.push(i) {
                        break;
                    }
                }
                Ok(())
            },
            |i| {
                processed.fetch_add(1, Ordering::SeqCst);
                if i == 3 {
                    Err(format!("item {i} failed"))
                } else {
                    Ok(Some(i))
                }
            },
        );

        assert_eq!(result.unwrap_err(), "item 3 failed");
        assert!(processed.load(Ordering::SeqCst) < 10_000);
    }

    #[test]
    fn test_producer_error_wins() {
        let pool = WorkerPool::new(2, 4).unwrap();

        let result: Result<Vec<u32>, String> = pool.run(
            |feeder| {
                feeder.push(1);
                Err("walk failed".to_string())
            },
            |i| Ok(Some(i)),
        );

        assert_eq!(result.unwrap_err(), "walk failed");
    }

    #[test]
    fn test_sizes_are_clamped() {
        let pool = WorkerPool::new(0, 0).unwrap();
        assert_eq!(pool.workers(), 1);

        let results: Vec<u8> = pool
            .run(
                |feeder| {
                    feeder.push(7u8);
                    Ok::<_, ()>(())
                },
                |i| Ok(Some(i)),
            )
            .unwrap();
        assert_eq!(results, vec![7]);
    }
}
