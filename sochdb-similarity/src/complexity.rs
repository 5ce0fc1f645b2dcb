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

//! Complexity estimation.
//!
//! The complexity of an entity is the compressed size of its byte form, a
//! computable stand-in for Kolmogorov complexity. Plain and self-concatenated
//! complexities are cached on the entity (write-once per backend); joint
//! complexities of two entities are recomputed per pair.

use crate::compressor::Compressor;
use crate::entity::Entity;
use crate::error::Result;
use std::sync::Arc;

/// Computes and caches entity complexities through one compressor.
#[derive(Clone)]
pub struct ComplexityEstimator {
    compressor: Arc<dyn Compressor>,
}

impl ComplexityEstimator {
    pub fn new(compressor: Arc<dyn Compressor>) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &Arc<dyn Compressor> {
        &self.compressor
    }

    /// Label of the backing compressor.
    pub fn label(&self) -> &'static str {
        self.compressor.label()
    }

    /// Uncached compressed size of a raw buffer.
    pub fn compressed_size(&self, bytes: &[u8]) -> Result<usize> {
        self.compressor.compressed_size(bytes)
    }

    /// `C(x)`: compressed size of the entity's bytes.
    ///
    /// The compressor runs at most once per entity; later calls return the
    /// cached value unchanged.
    pub fn complexity<T>(&self, entity: &Entity<T>) -> Result<usize> {
        entity
            .complexity
            .get_or_try_init(self.label(), || self.compressed_size(entity.bytes()))
    }

    /// `C(xx)`: compressed size of the entity's bytes followed by themselves.
    pub fn doubled_complexity<T>(&self, entity: &Entity<T>) -> Result<usize> {
        entity.doubled.get_or_try_init(self.label(), || {
            let bytes = entity.bytes();
            let mut doubled = Vec::with_capacity(bytes.len() * 2);
            doubled.extend_from_slice(bytes);
            doubled.extend_from_slice(bytes);
            self.compressed_size(&doubled)
        })
    }

    /// `C(xy)`: compressed size of both byte forms concatenated.
    ///
    /// Operands are concatenated in lexicographic byte order, so
    /// `joint_complexity(x, y) == joint_complexity(y, x)`.
    pub fn joint_complexity<T, U>(&self, x: &Entity<T>, y: &Entity<U>) -> Result<usize> {
        let (first, second) = if x.bytes() <= y.bytes() {
            (x.bytes(), y.bytes())
        } else {
            (y.bytes(), x.bytes())
        };
        let mut joined = Vec::with_capacity(first.len() + second.len());
        joined.extend_from_slice(first);
        joined.extend_from_slice(second);
        self.compressed_size(&joined)
    }

    /// Fill the plain and doubled caches of every entity up front.
    ///
    /// Call before sharing entities across threads so the parallel phase
    /// only reads cached values.
    pub fn warm<'a, T: 'a>(&self, entities: impl IntoIterator<Item = &'a Entity<T>>) -> Result<usize> {
        let mut warmed = 0;
        for entity in entities {
            self.complexity(entity)?;
            self.doubled_complexity(entity)?;
            warmed += 1;
        }
        tracing::debug!(backend = self.label(), warmed, "warmed complexity caches");
        Ok(warmed)
    }
}

impl std::fmt::Debug for ComplexityEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplexityEstimator")
            .field("backend", &self.label())
            .finish()
    }
}
