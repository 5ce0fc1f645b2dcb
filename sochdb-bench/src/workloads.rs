//! Benchmark workload definitions.
//!
//! Each function takes an engine, a corpus and a config, runs the workload,
//! and returns a `WorkloadResult`.

use crate::{config_name, BenchResult, Corpus, DataGen, LatencyRecorder, WorkloadResult};
use sochdb_similarity::{Entity, SimilarityEngine};
use std::time::Instant;

// ────────────────────────────────────────────────────────────────────────────────
// Config
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub corpus_size: usize, // tickets in the search corpus
    pub dup_rate: f64,      // share of tickets that are perturbed copies
    pub queries: usize,     // queries per search workload
    pub pairs: usize,       // random pairs for the distance workload
    pub dedup_size: usize,  // tickets fed to all-pairs duplicate detection
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            corpus_size: 2_000,
            dup_rate: 0.2,
            queries: 50,
            pairs: 10_000,
            dedup_size: 300,
            seed: 42,
        }
    }
}

impl WorkloadConfig {
    /// Generate the corpus; fails on a `dup_rate` outside `[0, 1]`.
    pub fn corpus(&self) -> BenchResult<Corpus> {
        Corpus::generate(self.corpus_size, self.dup_rate, self.seed)
    }
}

fn label(engine: &SimilarityEngine) -> String {
    config_name(engine)
}

// ────────────────────────────────────────────────────────────────────────────────
// Complexity
// ────────────────────────────────────────────────────────────────────────────────

/// First-touch `get_complexity` on entities with empty caches.
pub fn cold_complexity(
    engine: &SimilarityEngine,
    corpus: &Corpus,
    _cfg: &WorkloadConfig,
) -> BenchResult<WorkloadResult> {
    let entities = corpus.cold_copy();
    let mut rec = LatencyRecorder::new();
    let mut total_raw = 0usize;
    let mut total_compressed = 0usize;

    for entity in &entities {
        let t = rec.start();
        let size = engine.get_complexity(entity)?;
        rec.record(t);
        total_raw += entity.len();
        total_compressed += size;
    }

    let ratio = if total_raw > 0 {
        total_compressed as f64 / total_raw as f64
    } else {
        0.0
    };

    Ok(
        WorkloadResult::from_recorder(&label(engine), "cold_complexity", &rec)
            .with_extra("compression_ratio", format!("{:.3}", ratio)),
    )
}

// ────────────────────────────────────────────────────────────────────────────────
// Distance
// ────────────────────────────────────────────────────────────────────────────────

/// `get_similarity` on random pairs; per-entity caches warm after first touch.
pub fn pairwise_distance(
    engine: &SimilarityEngine,
    corpus: &Corpus,
    cfg: &WorkloadConfig,
) -> BenchResult<WorkloadResult> {
    let n = corpus.len();
    let mut gen = DataGen::new(cfg.seed ^ 0x5eed);
    let mut rec = LatencyRecorder::new();
    if n == 0 {
        return Ok(WorkloadResult::from_recorder(&label(engine), "pairwise_distance", &rec));
    }

    let mut sum = 0.0;
    for _ in 0..cfg.pairs {
        let i = gen.pick(n);
        let j = gen.pick(n);
        let t = rec.start();
        let d = engine.get_similarity(&corpus.tickets[i], &corpus.tickets[j])?;
        rec.record(t);
        sum += d;
    }

    let mean = if cfg.pairs > 0 { sum / cfg.pairs as f64 } else { 0.0 };
    Ok(
        WorkloadResult::from_recorder(&label(engine), "pairwise_distance", &rec)
            .with_extra("mean_distance", format!("{:.4}", mean)),
    )
}

/// `get_similarity` between each ticket and a random blob of the same length.
pub fn random_blob_distance(
    engine: &SimilarityEngine,
    corpus: &Corpus,
    cfg: &WorkloadConfig,
) -> BenchResult<WorkloadResult> {
    let mut gen = DataGen::new(cfg.seed ^ 0xb10b);
    let mut rec = LatencyRecorder::new();
    let mut sum = 0.0;

    for ticket in &corpus.tickets {
        let blob = Entity::from_bytes(gen.random_bytes(ticket.len()));
        let t = rec.start();
        let d = engine.get_similarity(ticket, &blob)?;
        rec.record(t);
        sum += d;
    }

    let n = corpus.len();
    let mean = if n > 0 { sum / n as f64 } else { 0.0 };
    Ok(
        WorkloadResult::from_recorder(&label(engine), "random_blob_distance", &rec)
            .with_extra("mean_distance", format!("{:.4}", mean)),
    )
}

// ────────────────────────────────────────────────────────────────────────────────
// Search
// ────────────────────────────────────────────────────────────────────────────────

fn query_indices(corpus: &Corpus, cfg: &WorkloadConfig) -> Vec<usize> {
    let mut gen = DataGen::new(cfg.seed.wrapping_add(99));
    let mut indices = gen.shuffled_indices(corpus.len());
    indices.truncate(cfg.queries);
    indices
}

/// `find_similar` over the whole corpus, one query at a time.
pub fn sequential_search(
    engine: &SimilarityEngine,
    corpus: &Corpus,
    cfg: &WorkloadConfig,
) -> BenchResult<WorkloadResult> {
    engine.warm(&corpus.tickets)?;
    let mut rec = LatencyRecorder::new();
    let mut hits = 0usize;

    for q in query_indices(corpus, cfg) {
        let t = rec.start();
        let results = engine.find_similar(&corpus.tickets[q], &corpus.tickets)?;
        rec.record(t);
        hits += results.len();
    }

    Ok(
        WorkloadResult::from_recorder(&label(engine), "search_sequential", &rec)
            .with_extra("hits", hits),
    )
}

/// `find_similar_par` over the whole corpus, one query at a time.
pub fn parallel_search(
    engine: &SimilarityEngine,
    corpus: &Corpus,
    cfg: &WorkloadConfig,
) -> BenchResult<WorkloadResult> {
    engine.warm(&corpus.tickets)?;
    let mut rec = LatencyRecorder::new();
    let mut hits = 0usize;

    for q in query_indices(corpus, cfg) {
        let t = rec.start();
        let results = engine.find_similar_par(&corpus.tickets[q], &corpus.tickets)?;
        rec.record(t);
        hits += results.len();
    }

    Ok(
        WorkloadResult::from_recorder(&label(engine), "search_parallel", &rec)
            .with_extra("hits", hits),
    )
}

// ────────────────────────────────────────────────────────────────────────────────
// Duplicate detection quality
// ────────────────────────────────────────────────────────────────────────────────

/// Precision and recall of a set of predicted duplicate pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionQuality {
    pub predicted: usize,
    pub true_positives: usize,
    pub actual: usize,
}

impl DetectionQuality {
    pub fn precision(&self) -> f64 {
        if self.predicted == 0 {
            1.0
        } else {
            self.true_positives as f64 / self.predicted as f64
        }
    }

    pub fn recall(&self) -> f64 {
        if self.actual == 0 {
            1.0
        } else {
            self.true_positives as f64 / self.actual as f64
        }
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

/// All-pairs `find_duplicates` on a corpus prefix, scored against ground truth.
pub fn duplicate_detection(
    engine: &SimilarityEngine,
    corpus: &Corpus,
    cfg: &WorkloadConfig,
) -> BenchResult<WorkloadResult> {
    let n = cfg.dedup_size.min(corpus.len());
    let subset = Corpus {
        tickets: corpus.cold_copy().into_iter().take(n).collect(),
        groups: corpus.groups[..n].to_vec(),
    };

    let mut rec = LatencyRecorder::new();
    let started = Instant::now();
    let pairs = engine.find_duplicates(&subset.tickets)?;
    let comparisons = (n * (n + 1) / 2) as u64;
    rec.record_batch(started.elapsed(), comparisons.max(1));

    let quality = DetectionQuality {
        predicted: pairs.len(),
        true_positives: pairs
            .iter()
            .filter(|p| subset.is_duplicate(p.first, p.second))
            .count(),
        actual: subset.duplicate_pairs(),
    };

    tracing::info!(
        config = %label(engine),
        predicted = quality.predicted,
        actual = quality.actual,
        precision = quality.precision(),
        recall = quality.recall(),
        "duplicate detection scored"
    );

    Ok(
        WorkloadResult::from_recorder(&label(engine), "duplicate_detection", &rec)
            .with_extra("precision", format!("{:.3}", quality.precision()))
            .with_extra("recall", format!("{:.3}", quality.recall()))
            .with_extra("f1", format!("{:.3}", quality.f1())),
    )
}
