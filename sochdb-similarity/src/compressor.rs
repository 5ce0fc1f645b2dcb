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

//! Compressor adapters.
//!
//! The engine only ever needs the *length* of a compressed buffer, so a
//! backend is reduced to a single capability: [`Compressor::compressed_size`].
//! Three backends are provided, in two tiers:
//!
//! | Backend   | Tier            | Codec                         |
//! |-----------|-----------------|-------------------------------|
//! | `Deflate` | general-purpose | zlib-framed DEFLATE, level 6  |
//! | `Zstd`    | general-purpose | Zstandard, level 3            |
//! | `Lz4`     | fast-block      | LZ4 block format (`lz4_flex`) |
//!
//! Levels are fixed. Every adapter is stateless: a fresh encoder is created
//! per call, so one adapter can be shared across threads freely.

use crate::error::{Result, SimilarityError};
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// DEFLATE level used by [`DeflateCompressor`].
pub const DEFLATE_LEVEL: u32 = 6;

/// Zstandard level used by [`ZstdCompressor`].
pub const ZSTD_LEVEL: i32 = 3;

/// A deterministic, lossless byte-stream compressor reduced to its output size.
///
/// Implementations must return the same size for the same input bytes on
/// every call and must not share mutable compression state between calls.
pub trait Compressor: Send + Sync {
    /// Short, stable name of the backend.
    ///
    /// Entity caches are tagged with this label, so two compressors that can
    /// produce different sizes for the same input must use different labels.
    fn label(&self) -> &'static str;

    /// Length in bytes of `data` after compression.
    fn compressed_size(&self, data: &[u8]) -> Result<usize>;
}

impl<C: Compressor + ?Sized> Compressor for Arc<C> {
    fn label(&self) -> &'static str {
        (**self).label()
    }

    fn compressed_size(&self, data: &[u8]) -> Result<usize> {
        (**self).compressed_size(data)
    }
}

/// Speed/quality tier of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendTier {
    /// Slower, better ratio.
    GeneralPurpose,
    /// Faster, weaker ratio.
    FastBlock,
}

/// Configurable compressor backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Deflate,
    Zstd,
    Lz4,
}

impl Backend {
    /// All backends, in display order.
    pub const ALL: [Backend; 3] = [Backend::Deflate, Backend::Zstd, Backend::Lz4];

    pub fn tier(&self) -> BackendTier {
        match self {
            Backend::Deflate | Backend::Zstd => BackendTier::GeneralPurpose,
            Backend::Lz4 => BackendTier::FastBlock,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::Deflate => DeflateCompressor::LABEL,
            Backend::Zstd => ZstdCompressor::LABEL,
            Backend::Lz4 => Lz4Compressor::LABEL,
        }
    }

    /// Build the adapter for this backend.
    pub fn compressor(&self) -> Arc<dyn Compressor> {
        match self {
            Backend::Deflate => Arc::new(DeflateCompressor),
            Backend::Zstd => Arc::new(ZstdCompressor),
            Backend::Lz4 => Arc::new(Lz4Compressor),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// zlib-framed DEFLATE via `flate2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeflateCompressor;

impl DeflateCompressor {
    pub const LABEL: &'static str = "deflate";
}

impl Compressor for DeflateCompressor {
    fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn compressed_size(&self, data: &[u8]) -> Result<usize> {
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(data.len() / 2 + 16),
            flate2::Compression::new(DEFLATE_LEVEL),
        );
        encoder
            .write_all(data)
            .map_err(|e| SimilarityError::compression(Self::LABEL, e))?;
        let compressed = encoder
            .finish()
            .map_err(|e| SimilarityError::compression(Self::LABEL, e))?;
        Ok(compressed.len())
    }
}

/// Zstandard at a fixed level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdCompressor;

impl ZstdCompressor {
    pub const LABEL: &'static str = "zstd";
}

impl Compressor for ZstdCompressor {
    fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn compressed_size(&self, data: &[u8]) -> Result<usize> {
        zstd::encode_all(data, ZSTD_LEVEL)
            .map(|compressed| compressed.len())
            .map_err(|e| SimilarityError::compression(Self::LABEL, e))
    }
}

/// LZ4 block compression via `lz4_flex` (no size prefix, no frame).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compressor;

impl Lz4Compressor {
    pub const LABEL: &'static str = "lz4";
}

impl Compressor for Lz4Compressor {
    fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn compressed_size(&self, data: &[u8]) -> Result<usize> {
        Ok(lz4_flex::block::compress(data).len())
    }
}
