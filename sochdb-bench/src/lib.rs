//! Shared types, corpus generation and latency recording for sochdb-bench.

pub mod report;
pub mod workloads;

use hdrhistogram::Histogram;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sochdb_similarity::{Entity, SimilarityEngine, SimilarityError};
use std::collections::HashMap;
use std::time::{Duration, Instant};

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] SimilarityError),

    #[error("Export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),
}

// ────────────────────────────────────────────────────────────────────────────────
// Data generator (deterministic via ChaCha8Rng)
// ────────────────────────────────────────────────────────────────────────────────

const SYSTEMS: &[&str] = &[
    "VPN client",
    "Outlook",
    "the payroll portal",
    "Jira",
    "the shared drive",
    "the badge reader",
    "Slack",
    "the build server",
    "the CRM",
    "the printer on floor three",
];

const SYMPTOMS: &[&str] = &[
    "disconnects every few minutes",
    "freezes when opening attachments",
    "rejects valid passwords",
    "shows a blank page after login",
    "is extremely slow since the last update",
    "crashes on startup",
    "returns a certificate warning",
    "loses unsaved changes",
];

const CONTEXTS: &[&str] = &[
    "This affects the whole finance team.",
    "It started after the weekend maintenance window.",
    "Restarting the machine did not help.",
    "The issue only happens on the office network.",
    "Colleagues on macOS see the same behaviour.",
    "We have a deadline on Friday so this is urgent.",
    "Logs are attached to the previous ticket.",
    "Clearing the cache fixed it for one day only.",
];

const FILLER_WORDS: &[&str] = &[
    "please", "again", "today", "urgently", "still", "also", "now", "really",
];

pub struct DataGen {
    rng: ChaCha8Rng,
}

impl DataGen {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Synthesise a support ticket of a few sentences.
    pub fn ticket(&mut self, id: u64) -> String {
        let system = SYSTEMS[self.rng.gen_range(0..SYSTEMS.len())];
        let symptom = SYMPTOMS[self.rng.gen_range(0..SYMPTOMS.len())];
        let mut text = format!("Ticket {:06}: {} {}.", id, system, symptom);
        for _ in 0..self.rng.gen_range(2..5) {
            text.push(' ');
            text.push_str(CONTEXTS[self.rng.gen_range(0..CONTEXTS.len())]);
        }
        text
    }

    /// Perturb a ticket: swap, insert or drop a handful of words.
    pub fn near_duplicate(&mut self, original: &str) -> String {
        let mut words: Vec<String> = original.split(' ').map(str::to_string).collect();
        for _ in 0..self.rng.gen_range(1..4) {
            let at = self.rng.gen_range(0..words.len());
            match self.rng.gen_range(0..3) {
                0 => {
                    words[at] = FILLER_WORDS[self.rng.gen_range(0..FILLER_WORDS.len())].to_string()
                }
                1 => words.insert(
                    at,
                    FILLER_WORDS[self.rng.gen_range(0..FILLER_WORDS.len())].to_string(),
                ),
                _ if words.len() > 1 => {
                    words.remove(at);
                }
                _ => {}
            }
        }
        words.join(" ")
    }

    /// Generate `size` random bytes.
    pub fn random_bytes(&mut self, size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; size];
        self.rng.fill_bytes(&mut buf);
        buf
    }

    /// Generate a range [0..n) in shuffled order.
    pub fn shuffled_indices(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);
        indices
    }

    /// Uniform index in `[0..n)`.
    pub fn pick(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Corpus with ground truth
// ────────────────────────────────────────────────────────────────────────────────

/// Ticket corpus in which some tickets are perturbed copies of others.
pub struct Corpus {
    pub tickets: Vec<Entity<String>>,
    /// Group id per ticket; tickets sharing an id are near-duplicates.
    pub groups: Vec<usize>,
}

impl Corpus {
    /// Build `n` tickets; each is a near-duplicate of an earlier ticket with
    /// probability `dup_rate`, which must lie in `[0, 1]`.
    pub fn generate(n: usize, dup_rate: f64, seed: u64) -> BenchResult<Self> {
        if !(0.0..=1.0).contains(&dup_rate) {
            return Err(BenchError::Config(format!(
                "dup_rate must be within [0, 1], got {}",
                dup_rate
            )));
        }

        let mut gen = DataGen::new(seed);
        let mut texts: Vec<String> = Vec::with_capacity(n);
        let mut groups = Vec::with_capacity(n);
        let mut next_group = 0;

        for i in 0..n {
            if i > 0 && gen.gen_bool(dup_rate) {
                let source = gen.pick(i);
                let text = gen.near_duplicate(&texts[source]);
                groups.push(groups[source]);
                texts.push(text);
            } else {
                texts.push(gen.ticket(i as u64));
                groups.push(next_group);
                next_group += 1;
            }
        }

        Ok(Self {
            tickets: texts.into_iter().map(Entity::from_text).collect(),
            groups,
        })
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Whether `i` and `j` belong to the same duplicate group.
    pub fn is_duplicate(&self, i: usize, j: usize) -> bool {
        self.groups[i] == self.groups[j]
    }

    /// Number of unordered duplicate pairs in the corpus.
    pub fn duplicate_pairs(&self) -> usize {
        let mut sizes: HashMap<usize, usize> = HashMap::new();
        for &g in &self.groups {
            *sizes.entry(g).or_default() += 1;
        }
        sizes.values().map(|&s| s * (s - 1) / 2).sum()
    }

    /// Fresh tickets with empty complexity caches.
    pub fn cold_copy(&self) -> Vec<Entity<String>> {
        self.tickets
            .iter()
            .map(|t| Entity::from_text(t.value().clone()))
            .collect()
    }

    /// The same corpus with empty caches, so each engine starts cold.
    pub fn fresh(&self) -> Corpus {
        Corpus {
            tickets: self.cold_copy(),
            groups: self.groups.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Latency recorder (HDR histogram)
// ────────────────────────────────────────────────────────────────────────────────

pub struct LatencyRecorder {
    hist: Histogram<u64>,
    total: Duration,
    ops: u64,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self {
            hist: Histogram::<u64>::new(3).expect("3 significant figures is a valid precision"),
            total: Duration::ZERO,
            ops: 0,
        }
    }

    /// Start a latency measurement.
    #[inline(always)]
    pub fn start(&self) -> Instant {
        Instant::now()
    }

    /// Record the elapsed time since `start`.
    #[inline(always)]
    pub fn record(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let nanos = elapsed.as_nanos() as u64;
        let _ = self.hist.record(nanos.max(1));
        self.total += elapsed;
        self.ops += 1;
    }

    /// Record `n` ops that collectively took `elapsed`.
    pub fn record_batch(&mut self, elapsed: Duration, n: u64) {
        let per_op = elapsed.as_nanos() as u64 / n.max(1);
        let _ = self.hist.record_n(per_op.max(1), n);
        self.total += elapsed;
        self.ops += n;
    }

    pub fn ops(&self) -> u64 {
        self.ops
    }

    pub fn total_secs(&self) -> f64 {
        self.total.as_secs_f64()
    }

    pub fn throughput(&self) -> f64 {
        if self.total.as_secs_f64() > 0.0 {
            self.ops as f64 / self.total.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Percentile in nanoseconds.
    pub fn percentile_ns(&self, p: f64) -> u64 {
        self.hist.value_at_percentile(p)
    }

    /// Percentile in microseconds.
    pub fn percentile_us(&self, p: f64) -> f64 {
        self.percentile_ns(p) as f64 / 1_000.0
    }

    /// Mean latency in microseconds.
    pub fn mean_us(&self) -> f64 {
        self.hist.mean() / 1_000.0
    }
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Benchmark output types
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct WorkloadResult {
    /// Engine configuration, e.g. `deflate/mcd`.
    pub config_name: String,
    pub workload: String,
    pub ops: u64,
    pub total_secs: f64,
    pub throughput: f64, // ops/sec
    pub p50_us: f64,
    pub p99_us: f64,
    pub p999_us: f64,
    pub mean_us: f64,
    pub extra: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchSuite {
    pub system_info: SystemInfo,
    pub results: Vec<WorkloadResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpus: usize,
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            timestamp: epoch_timestamp(),
        }
    }
}

fn epoch_timestamp() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}s-since-epoch", secs)
}

/// `backend/metric` label used in reports, from the compressor actually in use.
pub fn config_name(engine: &SimilarityEngine) -> String {
    format!("{}/{}", engine.backend_label(), engine.metric())
}

impl WorkloadResult {
    pub fn from_recorder(config_name: &str, workload: &str, rec: &LatencyRecorder) -> Self {
        Self {
            config_name: config_name.to_string(),
            workload: workload.to_string(),
            ops: rec.ops(),
            total_secs: rec.total_secs(),
            throughput: rec.throughput(),
            p50_us: rec.percentile_us(50.0),
            p99_us: rec.percentile_us(99.0),
            p999_us: rec.percentile_us(99.9),
            mean_us: rec.mean_us(),
            extra: HashMap::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, val: impl ToString) -> Self {
        self.extra.insert(key.to_string(), val.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_gen_is_deterministic() {
        let a = DataGen::new(7).ticket(1);
        let b = DataGen::new(7).ticket(1);
        assert_eq!(a, b);
        assert!(a.starts_with("Ticket 000001: "));
    }

    #[test]
    fn test_near_duplicate_stays_close() {
        let mut gen = DataGen::new(3);
        let original = gen.ticket(9);
        let copy = gen.near_duplicate(&original);
        let diff = original.split(' ').count() as isize - copy.split(' ').count() as isize;
        assert!(diff.abs() <= 3);
    }

    #[test]
    fn test_corpus_ground_truth() {
        let corpus = Corpus::generate(200, 0.3, 11).unwrap();
        assert_eq!(corpus.len(), 200);
        assert_eq!(corpus.groups.len(), 200);
        assert_eq!(corpus.groups[0], 0);
        assert!(corpus.duplicate_pairs() > 0);
        for i in 0..corpus.len() {
            assert!(corpus.is_duplicate(i, i));
        }
    }

    #[test]
    fn test_cold_copy_has_empty_caches() {
        let corpus = Corpus::generate(4, 0.0, 1).unwrap();
        let copy = corpus.cold_copy();
        assert_eq!(copy.len(), 4);
        assert!(copy.iter().all(|e| e.cached_backends().is_empty()));
        assert_eq!(copy[2].bytes(), corpus.tickets[2].bytes());
    }

    #[test]
    fn test_dup_rate_out_of_range() {
        for rate in [-0.1, 1.5, f64::NAN] {
            let err = Corpus::generate(10, rate, 1).err().unwrap();
            assert!(matches!(err, BenchError::Config(_)), "{}", rate);
        }
        assert_eq!(Corpus::generate(10, 1.0, 1).unwrap().len(), 10);
    }

    #[test]
    fn test_fresh_corpus_is_cold() {
        let corpus = Corpus::generate(6, 0.5, 2).unwrap();
        let engine = SimilarityEngine::new(Default::default()).unwrap();
        engine.warm(&corpus.tickets).unwrap();

        let fresh = corpus.fresh();
        assert_eq!(fresh.groups, corpus.groups);
        assert!(fresh.tickets.iter().all(|e| e.cached_backends().is_empty()));
        assert!(corpus.tickets.iter().all(|e| !e.cached_backends().is_empty()));
    }

    #[test]
    fn test_random_bytes() {
        let mut gen = DataGen::new(5);
        let a = gen.random_bytes(64);
        assert_eq!(a.len(), 64);
        assert_ne!(a, gen.random_bytes(64));
    }

    #[test]
    fn test_latency_recorder() {
        let mut rec = LatencyRecorder::new();
        rec.record_batch(Duration::from_micros(100), 10);
        assert_eq!(rec.ops(), 10);
        assert!(rec.percentile_us(50.0) > 9.0 && rec.percentile_us(50.0) < 11.0);
        assert!(rec.throughput() > 0.0);
    }
}
