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

//! # Compression Distance Metrics
//!
//! Two normalized dissimilarity scores built from compressed sizes, where
//! `C(·)` is the compressed size and `xy` is concatenation:
//!
//! ```text
//! NCD(x, y) = (C(xy) - min(C(x), C(y))) / max(C(x), C(y))
//!
//! MCD(x, y) = max(|C(xy) - C(xx)|, |C(xy) - C(yy)|) / max(C(xx), C(yy))
//! ```
//!
//! 0 means identical, larger means more different. NCD is roughly in
//! `[0, 1]` but may exceed 1 for inputs the compressor handles poorly; the
//! value is returned unclamped. MCD normalizes by the self-concatenated
//! sizes, which makes it less sensitive to a large difference in the raw
//! lengths of the two operands.
//!
//! A zero denominator (both operands compress to nothing) yields `0.0`.

use crate::complexity::ComplexityEstimator;
use crate::entity::Entity;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance formula used by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Normalized Compression Distance.
    Ncd,
    /// Maximum Compression Distance.
    #[default]
    Mcd,
}

/// Sizes and score behind one distance computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceReport {
    pub metric: Metric,
    pub score: f64,
    /// `C(x)` for NCD, `C(xx)` for MCD.
    pub size_x: usize,
    /// `C(y)` for NCD, `C(yy)` for MCD.
    pub size_y: usize,
    /// `C(xy)`. For byte-identical NCD operands this is `C(x)`, the
    /// joint size of an operand that adds no information.
    pub size_joint: usize,
    pub raw_len_x: usize,
    pub raw_len_y: usize,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Ncd, Metric::Mcd];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Ncd => "ncd",
            Metric::Mcd => "mcd",
        }
    }

    /// Distance between two entities.
    pub fn distance<T, U>(
        &self,
        estimator: &ComplexityEstimator,
        x: &Entity<T>,
        y: &Entity<U>,
    ) -> Result<f64> {
        self.explain(estimator, x, y).map(|report| report.score)
    }

    /// Distance between two entities, with the sizes it was derived from.
    pub fn explain<T, U>(
        &self,
        estimator: &ComplexityEstimator,
        x: &Entity<T>,
        y: &Entity<U>,
    ) -> Result<DistanceReport> {
        let (size_x, size_y, size_joint, score) = match self {
            Metric::Ncd => {
                let cx = estimator.complexity(x)?;
                let cy = estimator.complexity(y)?;
                if x.bytes() == y.bytes() {
                    // C(xx) - C(x) is compressor overhead, not information.
                    (cx, cy, cx, 0.0)
                } else {
                    let cxy = estimator.joint_complexity(x, y)?;
                    (cx, cy, cxy, ncd_from_sizes(cx, cy, cxy))
                }
            }
            Metric::Mcd => {
                let aa = estimator.doubled_complexity(x)?;
                let bb = estimator.doubled_complexity(y)?;
                let ab = estimator.joint_complexity(x, y)?;
                (aa, bb, ab, mcd_from_sizes(aa, bb, ab))
            }
        };

        tracing::trace!(
            metric = self.name(),
            size_x,
            size_y,
            size_joint,
            score,
            "computed distance"
        );

        Ok(DistanceReport {
            metric: *self,
            score,
            size_x,
            size_y,
            size_joint,
            raw_len_x: x.len(),
            raw_len_y: y.len(),
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// NCD from `C(x)`, `C(y)` and `C(xy)`. Unclamped.
pub fn ncd_from_sizes(cx: usize, cy: usize, cxy: usize) -> f64 {
    let lo = cx.min(cy) as f64;
    let hi = cx.max(cy) as f64;
    if hi == 0.0 {
        return 0.0;
    }
    (cxy as f64 - lo) / hi
}

/// MCD from `C(xx)`, `C(yy)` and `C(xy)`.
pub fn mcd_from_sizes(aa: usize, bb: usize, ab: usize) -> f64 {
    let denominator = aa.max(bb) as f64;
    if denominator == 0.0 {
        return 0.0;
    }
    let numerator = ab.abs_diff(aa).max(ab.abs_diff(bb)) as f64;
    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::{Backend, Compressor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingCompressor {
        calls: AtomicUsize,
    }

    impl Compressor for CountingCompressor {
        fn label(&self) -> &'static str {
            "counting"
        }

        fn compressed_size(&self, data: &[u8]) -> Result<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(data.len())
        }
    }

    fn deflate() -> ComplexityEstimator {
        ComplexityEstimator::new(Backend::Deflate.compressor())
    }

    #[test]
    fn test_ncd_formula() {
        // (15 - 10) / 20
        assert_eq!(ncd_from_sizes(10, 20, 15), 0.25);
        assert_eq!(ncd_from_sizes(20, 10, 15), 0.25);
        assert_eq!(ncd_from_sizes(0, 0, 0), 0.0);
    }

    #[test]
    fn test_ncd_unclamped_above_one() {
        // A joint size larger than both parts combined is passed through as-is.
        let score = ncd_from_sizes(10, 10, 25);
        assert_eq!(score, 1.5);
    }

    #[test]
    fn test_mcd_formula() {
        // max(|12 - 10|, |12 - 8|) / 10
        assert_eq!(mcd_from_sizes(10, 8, 12), 0.4);
        assert_eq!(mcd_from_sizes(8, 10, 12), 0.4);
        assert_eq!(mcd_from_sizes(0, 0, 0), 0.0);
        assert_eq!(mcd_from_sizes(7, 7, 7), 0.0);
    }

    #[test]
    fn test_identity() {
        let est = deflate();
        let x = Entity::from_text("Outlook crashes when opening shared calendar");
        for metric in Metric::ALL {
            assert_eq!(metric.distance(&est, &x, &x).unwrap(), 0.0, "{}", metric);
        }
    }

    #[test]
    fn test_symmetry() {
        let est = deflate();
        let x = Entity::from_text("Cannot map network drive after password change");
        let y = Entity::from_text("Monitor flickers when docked to the USB-C hub");
        for metric in Metric::ALL {
            let xy = metric.distance(&est, &x, &y).unwrap();
            let yx = metric.distance(&est, &y, &x).unwrap();
            assert_eq!(xy, yx, "{} must be symmetric", metric);
        }
    }

    #[test]
    fn test_near_copy_closer_than_unrelated() {
        let est = deflate();
        let x = Entity::from_text(
            "User reports that the shared printer on the third floor jams whenever \
             a double-sided job larger than twenty pages is sent from Word.",
        );
        let y = Entity::from_text(
            "User reports that the shared printer on the third floor jams whenever \
             a double-sided job larger than thirty pages is sent from Word.",
        );
        let z = Entity::from_text(
            "Request to provision a new mailbox and distribution list for the \
             incoming finance contractors starting next Monday morning.",
        );
        for metric in Metric::ALL {
            let near = metric.distance(&est, &x, &y).unwrap();
            let far = metric.distance(&est, &x, &z).unwrap();
            assert!(near < far, "{}: near {} should be < far {}", metric, near, far);
        }
    }

    #[test]
    fn test_explain_report() {
        let est = deflate();
        let x = Entity::from_text("disk full on build agent");
        let y = Entity::from_text("disk full on build agent 7");

        let report = Metric::Mcd.explain(&est, &x, &y).unwrap();
        assert_eq!(report.metric, Metric::Mcd);
        assert_eq!(report.size_x, est.doubled_complexity(&x).unwrap());
        assert_eq!(report.size_y, est.doubled_complexity(&y).unwrap());
        assert_eq!(report.size_joint, est.joint_complexity(&x, &y).unwrap());
        assert_eq!(report.raw_len_x, x.len());
        assert_eq!(
            report.score,
            mcd_from_sizes(report.size_x, report.size_y, report.size_joint)
        );

        let report = Metric::Ncd.explain(&est, &x, &y).unwrap();
        assert_eq!(report.size_x, est.complexity(&x).unwrap());
        assert_eq!(
            report.score,
            ncd_from_sizes(report.size_x, report.size_y, report.size_joint)
        );
    }

    #[test]
    fn test_ncd_identity_report_is_consistent() {
        let counter = Arc::new(CountingCompressor::default());
        let est = ComplexityEstimator::new(counter.clone());
        let x = Entity::from_text("VPN drops on hotel wifi");
        let y = Entity::from_text("VPN drops on hotel wifi");

        let report = Metric::Ncd.explain(&est, &x, &y).unwrap();
        assert_eq!(report.score, 0.0);
        assert_eq!(report.size_joint, report.size_x);
        assert_eq!(
            report.score,
            ncd_from_sizes(report.size_x, report.size_y, report.size_joint)
        );
        // One run per operand; no self-concatenation.
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::default(), Metric::Mcd);
        assert_eq!(Metric::Ncd.to_string(), "ncd");
        assert_eq!(Metric::Mcd.to_string(), "mcd");
    }
}
