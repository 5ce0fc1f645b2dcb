// SPDX-License-Identifier: AGPL-3.0-or-later
// SochDB - LLM-Optimized Embedded Database
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Ranked Similarity Search
//!
//! Given a query entity and a candidate sequence, compute the distance to
//! every candidate, keep those strictly below the search threshold, and rank
//! them by ascending distance. Ties keep their input order (stable sort).
//!
//! ```text
//! candidates ──► distance(query, c) ──► keep d < threshold ──► stable sort ──► results
//! ```
//!
//! A failure on any candidate aborts the whole search; no partial ranking is
//! returned. The parallel variant warms the query's complexity caches before
//! fanning out over candidates, so worker threads only read the query state.
//!
//! [`pairwise`] computes the full distance matrix of a set of entities, from
//! which [`DistanceMatrix::similar_pairs`] extracts near-duplicate pairs.

use crate::complexity::ComplexityEstimator;
use crate::entity::Entity;
use crate::error::{check_threshold, Result};
use crate::metric::Metric;
use rayon::prelude::*;
use std::time::Instant;

/// Default cutoff for [`SimilaritySearch`].
pub const DEFAULT_SEARCH_THRESHOLD: f64 = 0.44;

/// One candidate that passed the search threshold.
#[derive(Debug)]
pub struct SimilarityMatch<'a, T> {
    pub distance: f64,
    /// Position of the candidate in the input sequence.
    pub index: usize,
    pub entity: &'a Entity<T>,
}

impl<T> Clone for SimilarityMatch<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SimilarityMatch<'_, T> {}

/// Ranked output of a search, most similar first.
#[derive(Debug)]
pub struct SimilarityResults<'a, T> {
    matches: Vec<SimilarityMatch<'a, T>>,
    threshold: f64,
    scanned: usize,
}

impl<'a, T> SimilarityResults<'a, T> {
    fn ranked(mut matches: Vec<SimilarityMatch<'a, T>>, threshold: f64, scanned: usize) -> Self {
        // `sort_by` is stable: equal distances keep input order.
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self {
            matches,
            threshold,
            scanned,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Threshold the search ran with.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of candidates compared.
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    /// Closest match.
    pub fn top(&self) -> Option<&SimilarityMatch<'a, T>> {
        self.matches.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimilarityMatch<'a, T>> {
        self.matches.iter()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.matches.iter().map(|m| m.distance).collect()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.matches.iter().map(|m| m.index).collect()
    }

    /// Matched entities in rank order.
    pub fn entities(&self) -> Vec<&'a Entity<T>> {
        self.matches.iter().map(|m| m.entity).collect()
    }

    pub fn into_vec(self) -> Vec<SimilarityMatch<'a, T>> {
        self.matches
    }
}

impl<'a, T> IntoIterator for SimilarityResults<'a, T> {
    type Item = SimilarityMatch<'a, T>;
    type IntoIter = std::vec::IntoIter<SimilarityMatch<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

/// Threshold-filtered ranked search over a candidate set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilaritySearch {
    threshold: f64,
}

impl Default for SimilaritySearch {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SEARCH_THRESHOLD,
        }
    }
}

impl SimilaritySearch {
    pub fn new(threshold: f64) -> Result<Self> {
        Ok(Self {
            threshold: check_threshold("search", threshold)?,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        self.threshold = check_threshold("search", threshold)?;
        Ok(())
    }

    /// Rank `candidates` against `query` using the configured threshold.
    pub fn search<'a, Q, T: 'a>(
        &self,
        metric: Metric,
        estimator: &ComplexityEstimator,
        query: &Entity<Q>,
        candidates: impl IntoIterator<Item = &'a Entity<T>>,
    ) -> Result<SimilarityResults<'a, T>> {
        run_search(self.threshold, metric, estimator, query, candidates)
    }

    /// Rank `candidates` against `query` with an explicit threshold.
    pub fn search_with_threshold<'a, Q, T: 'a>(
        &self,
        threshold: f64,
        metric: Metric,
        estimator: &ComplexityEstimator,
        query: &Entity<Q>,
        candidates: impl IntoIterator<Item = &'a Entity<T>>,
    ) -> Result<SimilarityResults<'a, T>> {
        let threshold = check_threshold("search", threshold)?;
        run_search(threshold, metric, estimator, query, candidates)
    }

    /// Data-parallel [`search`](Self::search). Produces identical results.
    pub fn search_par<'a, Q: Sync, T: Sync>(
        &self,
        metric: Metric,
        estimator: &ComplexityEstimator,
        query: &Entity<Q>,
        candidates: &'a [Entity<T>],
    ) -> Result<SimilarityResults<'a, T>> {
        let threshold = self.threshold;
        let started = Instant::now();

        estimator.warm(std::iter::once(query))?;

        let scored: Vec<Option<SimilarityMatch<'a, T>>> = candidates
            .par_iter()
            .enumerate()
            .map(|(index, entity)| -> Result<Option<SimilarityMatch<'a, T>>> {
                let distance = metric.distance(estimator, query, entity)?;
                Ok((distance < threshold).then_some(SimilarityMatch {
                    distance,
                    index,
                    entity,
                }))
            })
            .collect::<Result<_>>()?;

        let kept: Vec<_> = scored.into_iter().flatten().collect();
        let results = SimilarityResults::ranked(kept, threshold, candidates.len());

        tracing::debug!(
            metric = metric.name(),
            backend = estimator.label(),
            scanned = results.scanned(),
            kept = results.len(),
            threshold,
            elapsed_us = started.elapsed().as_micros() as u64,
            "parallel similarity search complete"
        );
        Ok(results)
    }
}

fn run_search<'a, Q, T: 'a>(
    threshold: f64,
    metric: Metric,
    estimator: &ComplexityEstimator,
    query: &Entity<Q>,
    candidates: impl IntoIterator<Item = &'a Entity<T>>,
) -> Result<SimilarityResults<'a, T>> {
    let started = Instant::now();
    let mut kept = Vec::new();
    let mut scanned = 0;

    for (index, entity) in candidates.into_iter().enumerate() {
        let distance = metric.distance(estimator, query, entity)?;
        if distance < threshold {
            kept.push(SimilarityMatch {
                distance,
                index,
                entity,
            });
        }
        scanned += 1;
    }

    let results = SimilarityResults::ranked(kept, threshold, scanned);
    tracing::debug!(
        metric = metric.name(),
        backend = estimator.label(),
        scanned,
        kept = results.len(),
        threshold,
        elapsed_us = started.elapsed().as_micros() as u64,
        "similarity search complete"
    );
    Ok(results)
}

/// A pair of entity positions and their distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicatePair {
    pub first: usize,
    pub second: usize,
    pub distance: f64,
}

/// Symmetric all-pairs distance matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    metric: Metric,
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Number of entities (rows).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.n && j < self.n {
            Some(self.values[i * self.n + j])
        } else {
            None
        }
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i < self.n {
            Some(&self.values[i * self.n..(i + 1) * self.n])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.n.max(1)).take(self.n)
    }

    /// Pairs `i < j` with distance `<= threshold`, closest first.
    pub fn similar_pairs(&self, threshold: f64) -> Vec<DuplicatePair> {
        let mut pairs = Vec::new();
        for first in 0..self.n {
            for second in (first + 1)..self.n {
                let distance = self.values[first * self.n + second];
                if distance <= threshold {
                    pairs.push(DuplicatePair {
                        first,
                        second,
                        distance,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        pairs
    }
}

/// Distances between every pair of `entities`.
///
/// Only the upper triangle (diagonal included) is computed; the lower
/// triangle mirrors it, since every metric here is symmetric.
pub fn pairwise<T>(
    metric: Metric,
    estimator: &ComplexityEstimator,
    entities: &[Entity<T>],
) -> Result<DistanceMatrix> {
    let n = entities.len();
    let started = Instant::now();
    let mut values = vec![0.0; n * n];

    for i in 0..n {
        for j in i..n {
            let d = metric.distance(estimator, &entities[i], &entities[j])?;
            values[i * n + j] = d;
            values[j * n + i] = d;
        }
    }

    tracing::debug!(
        metric = metric.name(),
        backend = estimator.label(),
        entities = n,
        elapsed_us = started.elapsed().as_micros() as u64,
        "pairwise distance matrix complete"
    );
    Ok(DistanceMatrix { metric, n, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::{Backend, Compressor};
    use std::sync::Arc;

    /// Compressed size equals the number of distinct bytes: cheap and fully
    /// predictable for ranking tests.
    struct DistinctBytes;

    impl Compressor for DistinctBytes {
        fn label(&self) -> &'static str {
            "distinct"
        }

        fn compressed_size(&self, data: &[u8]) -> Result<usize> {
            let mut seen = [false; 256];
            for &b in data {
                seen[b as usize] = true;
            }
            Ok(seen.iter().filter(|&&s| s).count())
        }
    }

    fn stub() -> ComplexityEstimator {
        ComplexityEstimator::new(Arc::new(DistinctBytes))
    }

    fn texts(items: &[&str]) -> Vec<Entity<String>> {
        items.iter().map(|s| Entity::from_text(*s)).collect()
    }

    #[test]
    fn test_empty_candidates() {
        let search = SimilaritySearch::default();
        let query = Entity::from_text("query");
        let none: Vec<Entity<String>> = Vec::new();
        let results = search.search(Metric::Mcd, &stub(), &query, &none).unwrap();
        assert!(results.is_empty());
        assert_eq!(results.scanned(), 0);
        assert!(results.top().is_none());
    }

    #[test]
    fn test_sorted_and_strictly_below_threshold() {
        let est = stub();
        let search = SimilaritySearch::new(0.5).unwrap();
        let query = Entity::from_text("abcd");
        // MCD under DistinctBytes: |distinct(q ∪ c) - max(distinct)| / max(distinct)
        let candidates = texts(&["abcdef", "abcd", "abcdefgh", "wxyz", "abce"]);

        let results = search
            .search(Metric::Mcd, &est, &query, &candidates)
            .unwrap();
        let distances = results.distances();

        assert!(distances.windows(2).all(|w| w[0] <= w[1]), "{:?}", distances);
        assert!(distances.iter().all(|&d| d < 0.5), "{:?}", distances);
        assert_eq!(results.top().map(|m| m.index), Some(1));
        assert_eq!(results.scanned(), 5);
        assert!(!results.indices().contains(&3), "unrelated must be filtered");
    }

    #[test]
    fn test_threshold_is_strict() {
        let est = stub();
        let query = Entity::from_text("ab");
        // distinct(ab ∪ abcd) = 4, max = 4 -> |4 - 2| / 4 = 0.5
        let candidates = texts(&["abcd"]);
        let search = SimilaritySearch::new(0.5).unwrap();
        let results = search
            .search(Metric::Mcd, &est, &query, &candidates)
            .unwrap();
        assert!(results.is_empty());

        let results = search
            .search_with_threshold(0.51, Metric::Mcd, &est, &query, &candidates)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.distances(), vec![0.5]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let est = stub();
        let query = Entity::from_text("abc");
        let candidates = texts(&["cab", "xyz", "bca", "abc"]);
        let results = SimilaritySearch::new(0.1)
            .unwrap()
            .search(Metric::Mcd, &est, &query, &candidates)
            .unwrap();
        assert_eq!(results.indices(), vec![0, 2, 3]);
    }

    #[test]
    fn test_query_in_candidates_is_zero() {
        let est = ComplexityEstimator::new(Backend::Deflate.compressor());
        let candidates = texts(&[
            "Email bounces with 550 mailbox unavailable",
            "Teams meeting audio echoes on Surface laptops",
        ]);
        let results = SimilaritySearch::default()
            .search(Metric::Mcd, &est, &candidates[1], &candidates)
            .unwrap();
        let top = results.top().unwrap();
        assert_eq!(top.index, 1);
        assert_eq!(top.distance, 0.0);
        assert!(std::ptr::eq(top.entity, &candidates[1]));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let est = ComplexityEstimator::new(Backend::Lz4.compressor());
        let query = Entity::from_text("VPN disconnects every ten minutes on home wifi");
        let candidates = texts(&[
            "VPN disconnects every ten minutes on home wifi",
            "VPN disconnects every fifteen minutes on home wifi",
            "Printer toner low on floor two",
            "Request new badge for contractor",
            "VPN drops every ten minutes on hotel wifi",
        ]);
        let search = SimilaritySearch::new(0.9).unwrap();

        for metric in Metric::ALL {
            let seq = search.search(metric, &est, &query, &candidates).unwrap();
            let par = search.search_par(metric, &est, &query, &candidates).unwrap();
            assert_eq!(seq.indices(), par.indices(), "{}", metric);
            assert_eq!(seq.distances(), par.distances(), "{}", metric);
        }
    }

    #[test]
    fn test_failure_is_atomic() {
        struct FailsOnLong;
        impl Compressor for FailsOnLong {
            fn label(&self) -> &'static str {
                "fails-on-long"
            }
            fn compressed_size(&self, data: &[u8]) -> Result<usize> {
                if data.len() > 10 {
                    Err(crate::error::SimilarityError::compression("fails-on-long", "too long"))
                } else {
                    Ok(data.len())
                }
            }
        }

        let est = ComplexityEstimator::new(Arc::new(FailsOnLong));
        let query = Entity::from_text("ab");
        let candidates = texts(&["ab", "abc", "this one is far too long"]);
        let result = SimilaritySearch::default().search(Metric::Ncd, &est, &query, &candidates);
        assert!(result.is_err());
    }

    #[test]
    fn test_pairwise_matrix() {
        let est = stub();
        let entities = texts(&["abc", "abcd", "xyz"]);
        let matrix = pairwise(Metric::Mcd, &est, &entities).unwrap();

        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), Some(0.0));
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert_eq!(matrix.get(3, 0), None);
        assert_eq!(matrix.row(1).map(|r| r.len()), Some(3));
        assert_eq!(matrix.rows().count(), 3);

        // |4 - 3| / 4 and the rest are far apart.
        let pairs = matrix.similar_pairs(0.3);
        assert_eq!(
            pairs,
            vec![DuplicatePair {
                first: 0,
                second: 1,
                distance: 0.25
            }]
        );
    }

    #[test]
    fn test_pairwise_empty() {
        let empty: Vec<Entity<String>> = Vec::new();
        let matrix = pairwise(Metric::Ncd, &stub(), &empty).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.rows().count(), 0);
        assert!(matrix.similar_pairs(1.0).is_empty());
    }
}
