use std::collections::BTreeMap;
use std::sync::Mutex;
use lazy_static::lazy_static;
use log::info;
use state::Storage;

type StatsCallbackFn = Box<dyn Fn(&mut StatsAccumulator) + Send>;

lazy_static! {
    static ref FUNCS: Storage<Mutex<Vec<StatsCallbackFn>>> = Storage::new();
    static ref STATS_ACCUMULATOR: Storage<Mutex<StatsAccumulator>> = Storage::new();
}

/// Declares a module `$f` holding a process-wide event counter.
#[macro_export]
macro_rules! stat_counter {
    ($title:expr, $f:ident) => {
        pub mod $f {
            use std::sync::atomic::{AtomicU64, Ordering};
            use $crate::core::stats::{StatsRegisterer, StatsAccumulator};

            static VALUE: AtomicU64 = AtomicU64::new(0);

            pub fn init() {
                StatsRegisterer::register(report);
            }

            pub fn inc() {
                VALUE.fetch_add(1, Ordering::Relaxed);
            }

            pub fn add(v: u64) {
                VALUE.fetch_add(v, Ordering::Relaxed);
            }

            fn report(accum: &mut StatsAccumulator) {
                accum.report_counter($title, VALUE.swap(0, Ordering::Relaxed));
            }
        }
    }
}

/// Declares a module `$f` tracking how often an event happens out of a total.
#[macro_export]
macro_rules! stat_percent {
    ($title:expr, $f:ident) => {
        pub mod $f {
            use std::sync::atomic::{AtomicU64, Ordering};
            use $crate::core::stats::{StatsRegisterer, StatsAccumulator};

            static NUM: AtomicU64 = AtomicU64::new(0);
            static DENOM: AtomicU64 = AtomicU64::new(0);

            pub fn init() {
                StatsRegisterer::register(report);
            }

            pub fn inc_num() {
                NUM.fetch_add(1, Ordering::Relaxed);
            }

            pub fn inc_den() {
                DENOM.fetch_add(1, Ordering::Relaxed);
            }

            fn report(accum: &mut StatsAccumulator) {
                accum.report_percentage(
                    $title,
                    NUM.swap(0, Ordering::Relaxed),
                    DENOM.swap(0, Ordering::Relaxed));
            }
        }
    }
}

/// Declares a module `$f` recording sum, count, min and max of integer samples.
#[macro_export]
macro_rules! stat_int_distribution {
    ($title:expr, $f:ident) => {
        pub mod $f {
            use std::sync::atomic::{AtomicU64, Ordering};
            use $crate::core::stats::{StatsRegisterer, StatsAccumulator};

            static SUM: AtomicU64 = AtomicU64::new(0);
            static COUNT: AtomicU64 = AtomicU64::new(0);
            static MIN: AtomicU64 = AtomicU64::new(u64::MAX);
            static MAX: AtomicU64 = AtomicU64::new(0);

            pub fn init() {
                StatsRegisterer::register(report);
            }

            pub fn report_value(value: u64) {
                SUM.fetch_add(value, Ordering::Relaxed);
                COUNT.fetch_add(1, Ordering::Relaxed);
                MIN.fetch_min(value, Ordering::Relaxed);
                MAX.fetch_max(value, Ordering::Relaxed);
            }

            fn report(accum: &mut StatsAccumulator) {
                accum.report_int_distribution(
                    $title,
                    SUM.swap(0, Ordering::Relaxed),
                    COUNT.swap(0, Ordering::Relaxed),
                    MIN.swap(u64::MAX, Ordering::Relaxed),
                    MAX.swap(0, Ordering::Relaxed));
            }
        }
    }
}

pub struct StatsRegisterer;

impl StatsRegisterer {
    pub fn register<F: 'static + Fn(&mut StatsAccumulator) + Send>(func: F) {
        if let Some(funcs) = FUNCS.try_get() {
            if let Ok(mut funcs) = funcs.lock() {
                funcs.push(Box::new(func));
            }
        }
    }

    fn call_callbacks(accum: &mut StatsAccumulator) {
        if let Some(funcs) = FUNCS.try_get() {
            if let Ok(funcs) = funcs.lock() {
                funcs.iter().for_each(|f| f(accum));
            }
        }
    }
}

#[derive(Default, Debug)]
pub struct StatsAccumulator {
    counters            : BTreeMap<String, u64>,
    int_distributions   : BTreeMap<String, (u64, u64, u64, u64)>,
    percentages         : BTreeMap<String, (u64, u64)>
}

impl StatsAccumulator {
    pub fn report_counter(&mut self, name: &str, val: u64) {
        *self.counters.entry(name.to_owned()).or_insert(0) += val;
    }

    pub fn report_int_distribution(&mut self, name: &str, sum: u64, count: u64, min: u64, max: u64) {
        let d = self.int_distributions.entry(name.to_owned()).or_insert((0, 0, u64::MAX, 0));
        d.0 += sum;
        d.1 += count;
        d.2 = d.2.min(min);
        d.3 = d.3.max(max);
    }

    pub fn report_percentage(&mut self, name: &str, num: u64, denom: u64) {
        let p = self.percentages.entry(name.to_owned()).or_insert((0, 0));
        p.0 += num;
        p.1 += denom;
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    /// Emits every statistic through the logger.
    pub fn print(&self) {
        info!("Statistics:");

        for (name, v) in self.counters.iter() {
            info!("    {:<52}{:>12}", name, v);
        }

        for (name, (sum, count, min, max)) in self.int_distributions.iter() {
            if *count == 0 { continue; }
            let avg = *sum as f64 / *count as f64;
            info!("    {:<52}{:>12.3} avg [range {} - {}]", name, avg, min, max);
        }

        for (name, (num, denom)) in self.percentages.iter() {
            if *denom == 0 { continue; }
            let pct = 100.0 * *num as f64 / *denom as f64;
            info!("    {:<52}{:>12} / {:>12} ({:.2}%)", name, num, denom, pct);
        }
    }

    pub fn clear(&mut self) {
        self.counters.clear();
        self.int_distributions.clear();
        self.percentages.clear();
    }
}

pub fn init_stats() {
    STATS_ACCUMULATOR.set(Mutex::new(StatsAccumulator::default()));
    FUNCS.set(Mutex::new(Vec::new()));
}

/// Moves the current counter values into the accumulator and resets them.
pub fn report_stats() {
    if let Some(acc) = STATS_ACCUMULATOR.try_get() {
        if let Ok(mut acc) = acc.lock() {
            StatsRegisterer::call_callbacks(&mut acc);
        }
    }
}

pub fn print_stats() {
    if let Some(acc) = STATS_ACCUMULATOR.try_get() {
        if let Ok(acc) = acc.lock() {
            acc.print();
        }
    }
}

pub fn clear_stats() {
    if let Some(acc) = STATS_ACCUMULATOR.try_get() {
        if let Ok(mut acc) = acc.lock() {
            acc.clear();
        }
    }
}
