
#[cfg(test)]
mod parallel_for {
    use vcm_rust::core::parallel::{ParallelScheduler, PerThread, Schedule};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn check_coverage(scheduler: &ParallelScheduler, n: usize, schedule: Schedule) {
        let counts: Vec<AtomicUsize> = (0..n).map(|_| AtomicUsize::new(0)).collect();

        scheduler.parallel_for(0, n, schedule, |i| {
            counts[i].fetch_add(1, Ordering::Relaxed);
        });

        for (i, c) in counts.iter().enumerate() {
            assert_eq!(c.load(Ordering::Relaxed), 1, "index {} of {} with {:?}", i, n, schedule);
        }
    }

    #[test]
    fn every_index_runs_exactly_once() {
        let scheduler = ParallelScheduler::new(3).unwrap();

        // 1000 is not a multiple of 3
        for n in [0usize, 1, 1000, 999, 7].iter() {
            check_coverage(&scheduler, *n, Schedule::Static);
            check_coverage(&scheduler, *n, Schedule::Dynamic);
        }
    }

    #[test]
    fn offset_ranges() {
        let scheduler = ParallelScheduler::new(4).unwrap();
        let sum = AtomicUsize::new(0);

        scheduler.parallel_for(10, 20, Schedule::Static, |i| { sum.fetch_add(i, Ordering::Relaxed); });
        assert_eq!(sum.load(Ordering::Relaxed), (10..20).sum());

        // Empty and reversed ranges do nothing
        scheduler.parallel_for(5, 5, Schedule::Dynamic, |_| panic!("no index expected"));
        scheduler.parallel_for(6, 5, Schedule::Static, |_| panic!("no index expected"));
    }

    #[test]
    #[should_panic]
    fn panics_reach_the_caller() {
        let scheduler = ParallelScheduler::new(2).unwrap();

        scheduler.parallel_for(0, 100, Schedule::Dynamic, |i| {
            if i == 57 { panic!("failed at {}", i); }
        });
    }

    #[test]
    fn per_thread_slots_are_private() {
        let scheduler = ParallelScheduler::new(4).unwrap();
        let mut counters = PerThread::new(&scheduler, |_| 0usize);

        scheduler.parallel_for(0, 500, Schedule::Dynamic, |_| {
            *counters.get(&scheduler) += 1;
        });

        assert_eq!(counters.iter_mut().map(|c| *c).sum::<usize>(), 500);
    }

    #[test]
    fn zero_threads_means_detect() {
        let scheduler = ParallelScheduler::new(0).unwrap();

        assert!(scheduler.num_threads() >= 1);
    }
}
