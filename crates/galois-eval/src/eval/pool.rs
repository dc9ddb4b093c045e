use anyhow::{Context, Result};
use rayon::prelude::*;

/// Runs batches of jobs, returning results in input order.
///
/// With more than one worker the jobs run on a dedicated rayon pool of exactly
/// `workers` threads, built once and reused by every batch. Nested batches
/// (queries inside a dataset job) run on their own pool, so the two worker
/// counts stay independent. A single worker runs jobs on the calling thread.
#[derive(Debug)]
pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    pub fn new(workers: usize, name: &'static str) -> Result<Self> {
        if workers <= 1 {
            return Ok(Self { pool: None });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |index| format!("galois-{name}-{index}"))
            .build()
            .with_context(|| format!("failed to build {name} worker pool"))?;
        Ok(Self { pool: Some(pool) })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, rayon::ThreadPool::current_num_threads)
    }

    pub fn run<T, R, F>(&self, items: Vec<T>, job: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        match &self.pool {
            Some(pool) if items.len() > 1 => {
                pool.install(|| items.into_par_iter().map(job).collect())
            }
            _ => items.into_iter().map(job).collect(),
        }
    }
}
