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

//! Engine configuration.
//!
//! ```toml
//! backend = "deflate"          # deflate | zstd | lz4
//! metric = "mcd"               # ncd | mcd
//! classifier_threshold = 0.5   # is_similar: distance <= threshold
//! search_threshold = 0.44      # find_similar: distance < threshold
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use crate::classifier::DEFAULT_CLASSIFIER_THRESHOLD;
use crate::compressor::Backend;
use crate::error::{check_threshold, Result, SimilarityError};
use crate::metric::Metric;
use crate::search::DEFAULT_SEARCH_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a [`SimilarityEngine`](crate::SimilarityEngine).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Compressor backend. One per engine.
    pub backend: Backend,

    /// Distance formula. One per engine.
    pub metric: Metric,

    /// Cutoff for `is_similar` (inclusive).
    pub classifier_threshold: f64,

    /// Cutoff for `find_similar` (exclusive). Independent of the classifier.
    pub search_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            metric: Metric::default(),
            classifier_threshold: DEFAULT_CLASSIFIER_THRESHOLD,
            search_threshold: DEFAULT_SEARCH_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_classifier_threshold(mut self, threshold: f64) -> Self {
        self.classifier_threshold = threshold;
        self
    }

    pub fn with_search_threshold(mut self, threshold: f64) -> Self {
        self.search_threshold = threshold;
        self
    }

    /// Check both thresholds.
    pub fn validate(&self) -> Result<()> {
        check_threshold("classifier", self.classifier_threshold)?;
        check_threshold("search", self.search_threshold)?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SimilarityError::Config(format!("failed to parse engine TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SimilarityError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| SimilarityError::Config(format!("failed to write engine TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.backend, Backend::Deflate);
        assert_eq!(config.metric, Metric::Mcd);
        assert_eq!(config.classifier_threshold, 0.5);
        assert_eq!(config.search_threshold, 0.44);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
backend = "lz4"
metric = "ncd"
classifier_threshold = 0.35
search_threshold = 0.3
"#;
        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.backend, Backend::Lz4);
        assert_eq!(config.metric, Metric::Ncd);
        assert_eq!(config.classifier_threshold, 0.35);
        assert_eq!(config.search_threshold, 0.3);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("backend = \"zstd\"\n").unwrap();
        assert_eq!(config.backend, Backend::Zstd);
        assert_eq!(config.metric, Metric::Mcd);
        assert_eq!(config.search_threshold, DEFAULT_SEARCH_THRESHOLD);

        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_rejects_bad_input() {
        let err = EngineConfig::from_toml_str("backend = \"brotli\"\n").unwrap_err();
        assert!(matches!(err, SimilarityError::Config(_)));

        let err = EngineConfig::from_toml_str("unknown = 1\n").unwrap_err();
        assert!(matches!(err, SimilarityError::Config(_)));

        let err = EngineConfig::from_toml_str("search_threshold = -0.5\n").unwrap_err();
        assert!(matches!(
            err,
            SimilarityError::InvalidThreshold { name: "search", .. }
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default()
            .with_backend(Backend::Zstd)
            .with_metric(Metric::Ncd)
            .with_classifier_threshold(0.6);
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "metric = \"ncd\"").unwrap();
        writeln!(file, "classifier_threshold = 0.25").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.metric, Metric::Ncd);
        assert_eq!(config.classifier_threshold, 0.25);
        assert_eq!(config.backend, Backend::Deflate);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SimilarityError::Config(_)));
    }
}
