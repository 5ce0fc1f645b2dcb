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

//! Error types for the similarity engine.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimilarityError>;

/// Errors raised by the similarity engine.
///
/// Two zero-sized operands are not an error: the distance formulas define
/// that case as distance `0.0`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimilarityError {
    /// The entity's byte form is absent or could not be produced.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The compressor backend failed while measuring a buffer.
    #[error("compression error ({backend}): {message}")]
    Compression {
        backend: &'static str,
        message: String,
    },

    /// A threshold was NaN, infinite or negative.
    #[error("invalid {name} threshold: {value} (must be finite and >= 0)")]
    InvalidThreshold { name: &'static str, value: f64 },

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl SimilarityError {
    pub(crate) fn compression(backend: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Compression {
            backend,
            message: err.to_string(),
        }
    }
}

/// Check that a threshold is usable for comparisons.
pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SimilarityError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_threshold() {
        assert_eq!(check_threshold("search", 0.44), Ok(0.44));
        assert_eq!(check_threshold("search", 0.0), Ok(0.0));
        assert!(check_threshold("search", -0.1).is_err());
        assert!(check_threshold("search", f64::NAN).is_err());
        assert!(check_threshold("search", f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = SimilarityError::compression("deflate", "broken pipe");
        assert_eq!(err.to_string(), "compression error (deflate): broken pipe");

        let err = SimilarityError::InvalidThreshold {
            name: "classifier",
            value: -1.0,
        };
        assert!(err.to_string().contains("classifier"));
    }
}
