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

//! Threshold classifier: turns a distance into a similar / not-similar decision.

use crate::error::{check_threshold, Result};

/// Default cutoff for [`SimilarityClassifier`].
pub const DEFAULT_CLASSIFIER_THRESHOLD: f64 = 0.5;

/// Classifies a distance as similar when it is `<=` the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityClassifier {
    threshold: f64,
}

impl SimilarityClassifier {
    pub fn new(threshold: f64) -> Result<Self> {
        Ok(Self {
            threshold: check_threshold("classifier", threshold)?,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Replace the threshold. Affects only later classifications.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        self.threshold = check_threshold("classifier", threshold)?;
        Ok(())
    }

    #[inline]
    pub fn is_similar(&self, distance: f64) -> bool {
        distance <= self.threshold
    }
}

impl Default for SimilarityClassifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CLASSIFIER_THRESHOLD,
        }
    }
}
