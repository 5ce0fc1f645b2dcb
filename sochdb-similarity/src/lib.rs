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

//! # SochDB Similarity: Compression-Based Near-Duplicate Detection
//!
//! Estimates how similar two arbitrary byte strings are without parsing
//! them, using a general-purpose compressor as a proxy for Kolmogorov
//! complexity. Used to flag near-duplicate records (support tickets,
//! documents) and to rank a candidate set by similarity to a query.
//!
//! ## Data Flow
//!
//! ```text
//! value ──► Entity (bytes) ──► Compressor ──► C(x), C(xx)  (cached on entity)
//!                                   │
//!                                   └──► C(xy) ──► Metric (NCD | MCD) ──► distance
//!                                                                           │
//!                                       is_similar (<= 0.5) ◄───────────────┤
//!                                       find_similar (< 0.44, ranked) ◄─────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use sochdb_similarity::{Entity, EngineConfig, SimilarityEngine};
//!
//! let engine = SimilarityEngine::new(EngineConfig::default())?;
//! let report = "The VPN client disconnects every ten minutes while working from \
//!     home. Reconnecting works, but open remote desktop sessions are lost each time.";
//! let query = Entity::from_text(report);
//! let tickets = vec![
//!     Entity::from_text(report),
//!     Entity::from_text(
//!         "Please order a replacement monitor cable for desk 4B on the third floor. \
//!          The current one is frayed near the connector and the screen flickers.",
//!     ),
//! ];
//!
//! // Matches are ranked by distance; an identical ticket comes first at 0.
//! let similar = engine.find_similar(&query, &tickets)?;
//! assert_eq!(similar.top().map(|m| m.index), Some(0));
//! assert_eq!(similar.top().map(|m| m.distance), Some(0.0));
//! # Ok::<(), sochdb_similarity::SimilarityError>(())
//! ```
//!
//! ## Modules
//!
//! - [`compressor`]: Backend adapters reduced to `compressed_size`
//! - [`entity`]: Byte snapshots with write-once complexity caches
//! - [`complexity`]: Plain, self-concatenated and joint complexities
//! - [`metric`]: NCD and MCD
//! - [`classifier`]: Threshold decision
//! - [`search`]: Ranked search, pairwise matrix, duplicate pairs
//! - [`config`]: Engine configuration (TOML)
//! - [`engine`]: The query surface

pub mod classifier;
pub mod complexity;
pub mod compressor;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod metric;
pub mod search;

// Re-export primary types
pub use classifier::{SimilarityClassifier, DEFAULT_CLASSIFIER_THRESHOLD};
pub use complexity::ComplexityEstimator;
pub use compressor::{
    Backend, BackendTier, Compressor, DeflateCompressor, Lz4Compressor, ZstdCompressor,
};
pub use config::EngineConfig;
pub use engine::SimilarityEngine;
pub use entity::{Entity, Json, ToBytes};
pub use error::{Result, SimilarityError};
pub use metric::{mcd_from_sizes, ncd_from_sizes, DistanceReport, Metric};
pub use search::{
    DistanceMatrix, DuplicatePair, SimilarityMatch, SimilarityResults, SimilaritySearch,
    DEFAULT_SEARCH_THRESHOLD,
};
