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

//! # Similarity Engine
//!
//! The query surface over the estimator, metric, classifier and search.
//!
//! ```text
//! SimilarityEngine
//! ├── config: EngineConfig              (backend + metric, fixed at construction)
//! ├── estimator: ComplexityEstimator    (one compressor, shared by every call)
//! ├── classifier: SimilarityClassifier  (is_similar, distance <= 0.5)
//! └── search: SimilaritySearch          (find_similar, distance < 0.44)
//! ```
//!
//! The backend and the metric cannot change after construction, so every
//! distance an engine produces uses the same compressor for both operands
//! and the same formula. The two thresholds are independent and mutable.

use crate::classifier::SimilarityClassifier;
use crate::complexity::ComplexityEstimator;
use crate::compressor::{Backend, Compressor};
use crate::config::EngineConfig;
use crate::entity::Entity;
use crate::error::Result;
use crate::metric::{DistanceReport, Metric};
use crate::search::{self, DistanceMatrix, DuplicatePair, SimilarityResults, SimilaritySearch};
use std::sync::Arc;

/// Compression-based similarity engine.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    config: EngineConfig,
    /// `None` when built around a caller-supplied compressor.
    backend: Option<Backend>,
    estimator: ComplexityEstimator,
    classifier: SimilarityClassifier,
    search: SimilaritySearch,
}

impl SimilarityEngine {
    /// Build an engine with the compressor named by `config.backend`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::build(config, Some(config.backend), config.backend.compressor())
    }

    /// Build an engine around a caller-supplied compressor.
    ///
    /// `config.backend` is ignored; every size is measured through
    /// `compressor`, and [`backend`](Self::backend) reports `None`.
    pub fn with_compressor(config: EngineConfig, compressor: Arc<dyn Compressor>) -> Result<Self> {
        Self::build(config, None, compressor)
    }

    fn build(
        config: EngineConfig,
        backend: Option<Backend>,
        compressor: Arc<dyn Compressor>,
    ) -> Result<Self> {
        config.validate()?;
        let engine = Self {
            config,
            backend,
            estimator: ComplexityEstimator::new(compressor),
            classifier: SimilarityClassifier::new(config.classifier_threshold)?,
            search: SimilaritySearch::new(config.search_threshold)?,
        };

        tracing::info!(
            backend = engine.estimator.label(),
            metric = config.metric.name(),
            classifier_threshold = config.classifier_threshold,
            search_threshold = config.search_threshold,
            "Created SimilarityEngine"
        );
        Ok(engine)
    }

    /// Current configuration, thresholds included.
    ///
    /// For an engine built with [`with_compressor`](Self::with_compressor),
    /// `backend` is the value passed in, not the compressor in use; see
    /// [`backend_label`](Self::backend_label).
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            classifier_threshold: self.classifier.threshold(),
            search_threshold: self.search.threshold(),
            ..self.config
        }
    }

    /// Built-in backend in use, or `None` for a caller-supplied compressor.
    pub fn backend(&self) -> Option<Backend> {
        self.backend
    }

    /// Label of the compressor that measures every size.
    pub fn backend_label(&self) -> &'static str {
        self.estimator.label()
    }

    pub fn metric(&self) -> Metric {
        self.config.metric
    }

    pub fn estimator(&self) -> &ComplexityEstimator {
        &self.estimator
    }

    pub fn classifier_threshold(&self) -> f64 {
        self.classifier.threshold()
    }

    /// Change the `is_similar` cutoff. Cached complexities are unaffected.
    pub fn set_classifier_threshold(&mut self, threshold: f64) -> Result<()> {
        self.classifier.set_threshold(threshold)
    }

    pub fn search_threshold(&self) -> f64 {
        self.search.threshold()
    }

    /// Change the `find_similar` cutoff. Cached complexities are unaffected.
    pub fn set_search_threshold(&mut self, threshold: f64) -> Result<()> {
        self.search.set_threshold(threshold)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Compressed size of the entity, cached on first call.
    pub fn get_complexity<T>(&self, entity: &Entity<T>) -> Result<usize> {
        self.estimator.complexity(entity)
    }

    /// Precompute complexities for a batch of entities.
    pub fn warm<'a, T: 'a>(&self, entities: impl IntoIterator<Item = &'a Entity<T>>) -> Result<usize> {
        self.estimator.warm(entities)
    }

    /// Distance under the configured metric (0 = identical).
    pub fn get_similarity<T, U>(&self, a: &Entity<T>, b: &Entity<U>) -> Result<f64> {
        self.config.metric.distance(&self.estimator, a, b)
    }

    /// Distance plus the compressed sizes it came from.
    pub fn explain<T, U>(&self, a: &Entity<T>, b: &Entity<U>) -> Result<DistanceReport> {
        self.config.metric.explain(&self.estimator, a, b)
    }

    /// `true` when the distance is at most the classifier threshold.
    pub fn is_similar<T, U>(&self, a: &Entity<T>, b: &Entity<U>) -> Result<bool> {
        let distance = self.get_similarity(a, b)?;
        Ok(self.classifier.is_similar(distance))
    }

    /// Candidates strictly below the search threshold, closest first.
    pub fn find_similar<'a, Q, T: 'a>(
        &self,
        query: &Entity<Q>,
        candidates: impl IntoIterator<Item = &'a Entity<T>>,
    ) -> Result<SimilarityResults<'a, T>> {
        self.search
            .search(self.config.metric, &self.estimator, query, candidates)
    }

    /// [`find_similar`](Self::find_similar) with an explicit threshold.
    pub fn find_similar_with_threshold<'a, Q, T: 'a>(
        &self,
        query: &Entity<Q>,
        candidates: impl IntoIterator<Item = &'a Entity<T>>,
        threshold: f64,
    ) -> Result<SimilarityResults<'a, T>> {
        self.search.search_with_threshold(
            threshold,
            self.config.metric,
            &self.estimator,
            query,
            candidates,
        )
    }

    /// Ranked entities only, without distances.
    pub fn find_similar_entities<'a, Q, T: 'a>(
        &self,
        query: &Entity<Q>,
        candidates: impl IntoIterator<Item = &'a Entity<T>>,
    ) -> Result<Vec<&'a Entity<T>>> {
        Ok(self.find_similar(query, candidates)?.entities())
    }

    /// Parallel [`find_similar`](Self::find_similar) over a candidate slice.
    pub fn find_similar_par<'a, Q: Sync, T: Sync>(
        &self,
        query: &Entity<Q>,
        candidates: &'a [Entity<T>],
    ) -> Result<SimilarityResults<'a, T>> {
        self.search
            .search_par(self.config.metric, &self.estimator, query, candidates)
    }

    /// All-pairs distance matrix.
    pub fn pairwise<T>(&self, entities: &[Entity<T>]) -> Result<DistanceMatrix> {
        search::pairwise(self.config.metric, &self.estimator, entities)
    }

    /// Pairs classified similar by the classifier threshold, closest first.
    pub fn find_duplicates<T>(&self, entities: &[Entity<T>]) -> Result<Vec<DuplicatePair>> {
        let matrix = self.pairwise(entities)?;
        Ok(matrix.similar_pairs(self.classifier.threshold()))
    }
}
