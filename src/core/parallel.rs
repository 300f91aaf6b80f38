use std::sync::atomic::{AtomicU32, Ordering};
use anyhow::{Context, Result};
use log::debug;
use parking_lot::{Mutex, MutexGuard};
use rayon::prelude::*;
use crate::core::pbrt::Float;

/// How `parallel_for` splits an index range between workers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// One contiguous chunk of `ceil(n / threads)` indices per job.
    Static,
    /// One index per job; idle workers steal the remaining indices.
    Dynamic
}

pub fn num_system_threads() -> usize {
    num_cpus::get()
}

/// Fixed-size worker pool executing synchronous index-range loops.
///
/// Every call blocks until all indices have run. A panic raised for any index
/// is re-raised in the caller once the loop has stopped.
pub struct ParallelScheduler {
    pool    : rayon::ThreadPool,
    nthreads: usize
}

impl ParallelScheduler {
    /// Creates a pool with `nthreads` workers, or one per hardware thread if 0.
    pub fn new(nthreads: usize) -> Result<Self> {
        let nthreads = match nthreads {
            0 => num_system_threads(),
            n => n
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nthreads)
            .thread_name(|i| format!("render-worker-{}", i))
            .build()
            .with_context(|| format!("Failed to start {} worker threads", nthreads))?;
        debug!("Started scheduler with {} worker threads", nthreads);

        Ok(Self { pool, nthreads })
    }

    pub fn num_threads(&self) -> usize {
        self.nthreads
    }

    /// Stable id in `0..num_threads()` of the calling worker. The driver thread,
    /// which only runs while no loop is in flight, reports 0.
    pub fn thread_id(&self) -> usize {
        self.pool.current_thread_index().unwrap_or(0)
    }

    fn chunk_size(&self, n: usize) -> usize {
        ((n + self.nthreads - 1) / self.nthreads).max(1)
    }

    pub fn parallel_for<F>(&self, start: usize, end: usize, schedule: Schedule, func: F)
    where F: Fn(usize) + Sync + Send
    {
        if end <= start { return; }
        let n = end - start;

        self.pool.install(|| match schedule {
            Schedule::Static => {
                let chunk = self.chunk_size(n);
                let nchunks = (n + chunk - 1) / chunk;

                (0..nchunks).into_par_iter().with_max_len(1).for_each(|c| {
                    let lo = start + c * chunk;
                    let hi = (lo + chunk).min(end);
                    (lo..hi).for_each(&func);
                });
            }
            Schedule::Dynamic => {
                (start..end).into_par_iter().with_max_len(1).for_each(&func);
            }
        });
    }

    /// Like `parallel_for` but collects one result per index, in index order.
    pub fn parallel_map<R, F>(&self, start: usize, end: usize, schedule: Schedule, func: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send
    {
        if end <= start { return Vec::new(); }
        let n = end - start;

        self.pool.install(|| match schedule {
            Schedule::Static => {
                let chunk = self.chunk_size(n);
                let nchunks = (n + chunk - 1) / chunk;
                let chunks: Vec<Vec<R>> = (0..nchunks)
                    .into_par_iter()
                    .with_max_len(1)
                    .map(|c| {
                        let lo = start + c * chunk;
                        let hi = (lo + chunk).min(end);
                        (lo..hi).map(&func).collect()
                    })
                    .collect();

                chunks.into_iter().flatten().collect()
            }
            Schedule::Dynamic => {
                (start..end).into_par_iter().with_max_len(1).map(&func).collect()
            }
        })
    }

    /// Runs `func(index, &mut items[index])` for every element; each element is
    /// touched by exactly one worker.
    pub fn parallel_for_mut<T, F>(&self, items: &mut [T], schedule: Schedule, func: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send
    {
        if items.is_empty() { return; }
        let chunk = match schedule {
            Schedule::Static => self.chunk_size(items.len()),
            Schedule::Dynamic => 1
        };

        self.pool.install(|| {
            items.par_chunks_mut(chunk).enumerate().for_each(|(c, slice)| {
                for (j, item) in slice.iter_mut().enumerate() {
                    func(c * chunk + j, item);
                }
            });
        });
    }
}

/// One value per worker thread, indexed by `ParallelScheduler::thread_id`.
///
/// Slots are only ever taken by their own worker, so the locks are never
/// contended.
pub struct PerThread<T> {
    slots: Vec<Mutex<T>>
}

impl<T> PerThread<T> {
    pub fn new<F: FnMut(usize) -> T>(scheduler: &ParallelScheduler, mut init: F) -> Self {
        Self { slots: (0..scheduler.num_threads()).map(|i| Mutex::new(init(i))).collect() }
    }

    pub fn get(&self, scheduler: &ParallelScheduler) -> MutexGuard<'_, T> {
        self.slots[scheduler.thread_id()].lock()
    }

    /// Driver-side access between loops.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|m| m.get_mut())
    }
}

/// f32 with lock-free accumulation.
#[derive(Debug)]
pub struct AtomicFloat {
    bits: AtomicU32
}

impl AtomicFloat {
    pub fn new(v: Float) -> Self {
        Self { bits: AtomicU32::new(v.to_bits()) }
    }

    pub fn load(&self) -> Float {
        Float::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn store(&self, v: Float) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn add(&self, v: Float) {
        let mut old = self.bits.load(Ordering::Relaxed);

        loop {
            let new = (Float::from_bits(old) + v).to_bits();

            match self.bits.compare_exchange_weak(old, new, Ordering::SeqCst, Ordering::Relaxed) {
                Ok(_) => break,
                Err(x) => old = x
            }
        }
    }
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicFloat {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn atomic_float_accumulates() {
        let scheduler = ParallelScheduler::new(4).unwrap();
        let sum = AtomicFloat::default();

        scheduler.parallel_for(0, 1000, Schedule::Dynamic, |_| sum.add(0.5));

        assert_eq!(sum.load(), 500.0);
    }

    #[test]
    fn thread_ids_are_in_range() {
        let scheduler = ParallelScheduler::new(3).unwrap();
        let bad = AtomicUsize::new(0);

        scheduler.parallel_for(0, 300, Schedule::Dynamic, |_| {
            if scheduler.thread_id() >= 3 {
                bad.fetch_add(1, Ordering::Relaxed);
            }
        });

        assert_eq!(bad.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn map_keeps_index_order() {
        let scheduler = ParallelScheduler::new(4).unwrap();

        for schedule in [Schedule::Static, Schedule::Dynamic].iter() {
            let v = scheduler.parallel_map(3, 103, *schedule, |i| i * 2);
            assert_eq!(v, (3..103).map(|i| i * 2).collect::<Vec<_>>());
        }
    }

    #[test]
    fn for_mut_visits_each_item() {
        let scheduler = ParallelScheduler::new(4).unwrap();
        let mut items = vec![0usize; 37];

        scheduler.parallel_for_mut(&mut items, Schedule::Static, |i, v| *v += i + 1);

        assert!(items.iter().enumerate().all(|(i, v)| *v == i + 1));
    }
}
