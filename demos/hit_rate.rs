//! Hit-rate comparison: cairn's policies vs Moka vs QuickCache.
//!
//! Replays one Zipf(s=1.0) access trace against each cache.  Misses go
//! through cairn's loader, so every cairn run also exercises the load path.
//!
//! Run with:
//!     cargo run --example hit_rate --release

use cairn::CacheBuilder;
use moka::sync::Cache as MokaCache;
use quick_cache::sync::Cache as QuickCache;
use std::time::{Duration, Instant};

/// Cache capacity (number of unique entries each cache may hold).
const CAP: usize = 10_000;
/// Key universe size.  CAP is 10 % of POOL → moderately hard workload.
const POOL: usize = 100_000;
/// Number of accesses in the trace.
const TRACE: usize = 500_000;

// ---------------------------------------------------------------------------
// Zipf(s=1.0) sampler
//
// Inverse-CDF: P(X ≤ k) ≈ ln(k) / ln(N), so k = N^u with u ~ Uniform(0, 1]
// gives P(X = k) ∝ 1/k.
// ---------------------------------------------------------------------------

struct Xorshift64(u64);

impl Xorshift64 {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Uniform float in (0, 1].
    fn uniform(&mut self) -> f64 {
        let bits = self.next() >> 11;
        (bits + 1) as f64 / (1u64 << 53) as f64
    }

    /// Zipf(s=1) sample in [0, pool).
    fn zipf(&mut self, pool: usize) -> usize {
        let k = (pool as f64).powf(self.uniform()) as usize;
        k.saturating_sub(1).min(pool - 1)
    }
}

fn generate_trace(seed: u64, pool: usize, len: usize) -> Vec<usize> {
    let mut rng = Xorshift64(seed);
    (0..len).map(|_| rng.zipf(pool)).collect()
}

// ---------------------------------------------------------------------------
// Per-cache runners
// ---------------------------------------------------------------------------

fn run_cairn(policy: &str, trace: &[usize]) -> (usize, Duration) {
    let builder = CacheBuilder::new(CAP as u64)
        .loader(|key: &usize| Ok::<_, std::convert::Infallible>(*key));
    let cache: cairn::Cache<usize, usize> = match policy {
        "lfu" => builder.lfu(),
        "arc" => builder.arc(),
        // Favour small keys, which Zipf makes hot.
        "scored" => builder.scored(|v: &usize| -(*v as i64), |_: &usize| 1u64),
        _ => builder.lru(),
    }
    .build();

    let start = Instant::now();
    for &key in trace {
        let _ = cache.get(&key);
    }
    (cache.hit_count() as usize, start.elapsed())
}

fn run_moka(trace: &[usize]) -> (usize, Duration) {
    let cache: MokaCache<usize, usize> = MokaCache::new(CAP as u64);
    let start = Instant::now();
    let mut hits = 0usize;
    for &key in trace {
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            cache.insert(key, key);
        }
    }
    (hits, start.elapsed())
}

fn run_quick_cache(trace: &[usize]) -> (usize, Duration) {
    let cache: QuickCache<usize, usize> = QuickCache::new(CAP);
    let start = Instant::now();
    let mut hits = 0usize;
    for &key in trace {
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            cache.insert(key, key);
        }
    }
    (hits, start.elapsed())
}

fn main() {
    println!("cairn hit-rate comparison");
    println!();
    println!("  Distribution : Zipf(s = 1.0)");
    println!("  Key universe : {POOL:>10} unique keys");
    println!(
        "  Capacity     : {CAP:>10} entries  ({:.0}% of universe)",
        CAP as f64 / POOL as f64 * 100.0
    );
    println!("  Trace length : {TRACE:>10} accesses");
    println!();
    let trace = generate_trace(0xDEAD_BEEF_1234_5678, POOL, TRACE);

    let col_cache = 14usize;
    let col_hits = 10usize;
    let col_rate = 10usize;
    let col_time = 12usize;

    println!(
        "{:<col_cache$} {:>col_hits$} {:>col_rate$} {:>col_time$}",
        "Cache", "Hits", "Hit Rate", "Time (ms)"
    );
    println!("{}", "─".repeat(col_cache + col_hits + col_rate + col_time + 3));

    let print_row = |name: &str, hits: usize, elapsed: Duration| {
        println!(
            "{:<col_cache$} {:>col_hits$} {:>9.2}% {:>col_time$}",
            name,
            hits,
            hits as f64 / TRACE as f64 * 100.0,
            elapsed.as_millis(),
        );
    };

    for policy in ["lru", "lfu", "arc", "scored"] {
        let (hits, elapsed) = run_cairn(policy, &trace);
        print_row(&format!("cairn/{policy}"), hits, elapsed);
    }

    let (hits, elapsed) = run_moka(&trace);
    print_row("Moka", hits, elapsed);

    let (hits, elapsed) = run_quick_cache(&trace);
    print_row("QuickCache", hits, elapsed);

    println!();
    println!("Hit rate is measured online: every cache starts cold and each");
    println!("miss populates the key.  Time includes the miss path.");
}
