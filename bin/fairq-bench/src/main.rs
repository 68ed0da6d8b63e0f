//! fairq workload bench
//!
//! Drives a [`Scheduler`] with a seeded synthetic workload (mixed
//! sequential / random I/O from several issuers, with merge probing and
//! admission backpressure) and reports per-issuer dispatch shares plus
//! the scheduler's own counters.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use fairq_sched::{
    Direction, InsertPosition, IssuerId, MergeOutcome, Request, SchedConfig, Scheduler, SectorRange,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "fairq-bench", about = "fairq scheduler workload bench")]
struct Args {
    /// Number of concurrent issuers
    #[arg(long, default_value_t = 8)]
    issuers: u64,

    /// Total I/O submissions to generate
    #[arg(long, default_value_t = 10_000)]
    requests: u64,

    /// Dispatch quantum
    #[arg(long, default_value_t = 4)]
    quantum: usize,

    /// Request pool capacity
    #[arg(long, default_value_t = 128)]
    capacity: usize,

    /// Probability that an issuer's next I/O continues sequentially
    #[arg(long, default_value_t = 0.6)]
    sequential: f64,

    /// Probability that a submission is a read
    #[arg(long, default_value_t = 0.7)]
    read_ratio: f64,

    /// Barrier insert every N submissions (0 disables)
    #[arg(long, default_value_t = 0)]
    barrier_every: u64,

    /// Workload RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Log level (trace / debug / info / warn / error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

// ── Workload ──────────────────────────────────────────────────────────────────

/// Seeded multi-issuer I/O generator
///
/// Each issuer keeps a cursor; a step either continues sequentially from
/// it (merge-friendly) or jumps to a random sector.
struct Workload {
    rng: StdRng,
    cursors: Vec<u64>,
    sequential: f64,
    read_ratio: f64,
}

impl Workload {
    fn new(seed: u64, issuers: u64, sequential: f64, read_ratio: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            cursors: vec![0; issuers as usize],
            sequential,
            read_ratio,
        }
    }

    fn next_io(&mut self) -> (IssuerId, SectorRange, Direction) {
        let issuer = self.rng.gen_range(0..self.cursors.len());
        let length = 8u32 << self.rng.gen_range(0..3u32);
        let start = if self.rng.gen_bool(self.sequential) {
            self.cursors[issuer]
        } else {
            // Spread random jumps per issuer so cross-issuer collisions
            // stay rare but possible
            self.rng.gen_range(0..1u64 << 20) * 8
        };
        self.cursors[issuer] = start + u64::from(length);
        let direction = if self.rng.gen_bool(self.read_ratio) {
            Direction::Read
        } else {
            Direction::Write
        };
        (IssuerId::new(issuer as u64), SectorRange::new(start, length), direction)
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Completion {
    requests: u64,
    sectors: u64,
}

fn record(completions: &mut HashMap<IssuerId, Completion>, request: &Request) {
    let entry = completions.entry(request.issuer).or_default();
    entry.requests += 1;
    entry.sectors += u64::from(request.range.length);
}

fn run(args: &Args) -> Result<()> {
    let config = SchedConfig {
        quantum: args.quantum,
        capacity: args.capacity,
        max_issuers: (args.issuers as usize).max(1),
        ..SchedConfig::default()
    };
    let mut sched = Scheduler::new(config).context("scheduler setup")?;
    let mut workload = Workload::new(args.seed, args.issuers, args.sequential, args.read_ratio);
    let mut completions: HashMap<IssuerId, Completion> = HashMap::new();

    let started = Instant::now();
    for submission in 1..=args.requests {
        let (issuer, range, direction) = workload.next_io();

        if args.barrier_every != 0 && submission % args.barrier_every == 0 {
            let id = loop {
                match sched.alloc_request(range, direction, issuer, submission) {
                    Ok(id) => break id,
                    Err(_) => match sched.dispatch_next() {
                        Some(done) => record(&mut completions, &done),
                        None => anyhow::bail!("pool exhausted while idle"),
                    },
                }
            };
            sched
                .insert(id, InsertPosition::Back)
                .context("barrier insert")?;
            continue;
        }

        // Merge-first: adjacent queued work absorbs the new I/O without
        // consuming a queue slot
        match sched.merge_attempt(range, direction, issuer) {
            MergeOutcome::BackMerge(survivor) | MergeOutcome::FrontMerge(survivor) => {
                if let Ok(absorbed) = sched.alloc_request(range, direction, issuer, submission) {
                    sched.commit_merge(survivor, absorbed);
                    continue;
                }
                // Pool full: fall through to the drain-and-insert path
            }
            MergeOutcome::NoMerge => {}
        }

        // Admission backpressure: dispatch until the issuer is under its
        // fair share again
        while !sched.admission_check(issuer, direction) {
            match sched.dispatch_next() {
                Some(done) => record(&mut completions, &done),
                None => break,
            }
        }

        let id = loop {
            match sched.alloc_request(range, direction, issuer, submission) {
                Ok(id) => break id,
                Err(err) => {
                    debug!(%err, "allocation backpressure");
                    match sched.dispatch_next() {
                        Some(done) => record(&mut completions, &done),
                        None => anyhow::bail!("pool exhausted while idle"),
                    }
                }
            }
        };
        sched.insert(id, InsertPosition::Sorted).context("insert")?;
    }

    while let Some(done) = sched.dispatch_next() {
        record(&mut completions, &done);
    }
    let elapsed = started.elapsed();
    anyhow::ensure!(sched.is_idle(), "scheduler not idle after drain");

    // ── Report ────────────────────────────────────────────────────────────────
    let stats = sched.stats();
    info!(
        submissions = args.requests,
        elapsed_ms = elapsed.as_millis() as u64,
        rate = format!("{:.0}/s", args.requests as f64 / elapsed.as_secs_f64()),
        "workload complete"
    );
    info!(%stats, "scheduler counters");

    let mut issuers: Vec<_> = completions.iter().collect();
    issuers.sort_by_key(|(issuer, _)| **issuer);
    for (issuer, completion) in issuers {
        info!(
            %issuer,
            requests = completion.requests,
            sectors = completion.sectors,
            "issuer share"
        );
    }
    let dispatched: u64 = completions.values().map(|c| c.requests).sum();
    let merged = stats.back_merges + stats.front_merges;
    info!(
        dispatched,
        merged,
        merge_ratio = format!("{:.1}%", 100.0 * merged as f64 / args.requests as f64),
        "summary"
    );
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        issuers = args.issuers,
        requests = args.requests,
        seed = args.seed,
        "starting fairq bench"
    );
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_is_deterministic() {
        let mut a = Workload::new(7, 4, 0.6, 0.7);
        let mut b = Workload::new(7, 4, 0.6, 0.7);
        for _ in 0..256 {
            assert_eq!(a.next_io(), b.next_io());
        }
    }

    #[test]
    fn test_sequential_workload_extends_cursor() {
        let mut workload = Workload::new(1, 1, 1.0, 1.0);
        let (_, first, _) = workload.next_io();
        let (_, second, _) = workload.next_io();
        assert_eq!(first.end(), second.start);
    }

    #[test]
    fn test_small_run_drains_clean() {
        let args = Args::parse_from([
            "fairq-bench",
            "--issuers",
            "4",
            "--requests",
            "500",
            "--capacity",
            "64",
            "--barrier-every",
            "100",
        ]);
        run(&args).unwrap();
    }
}
