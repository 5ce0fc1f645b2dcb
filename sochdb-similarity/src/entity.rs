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

//! Compressible entities.
//!
//! An [`Entity`] pairs a caller value with a byte snapshot taken once at
//! construction, plus two write-once complexity caches:
//!
//! - `C(x)`: compressed size of the bytes (used by NCD and search warm-up)
//! - `C(xx)`: compressed size of the bytes concatenated with themselves (MCD)
//!
//! Each cache holds one slot per compressor label. A backend only ever reads
//! the slot it filled, so one entity can be compared by several engines
//! without mixing backends, and every engine keeps its own warm cache.

use crate::error::{Result, SimilarityError};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Capability: produce the raw byte form of a value.
pub trait ToBytes {
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

impl ToBytes for [u8] {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl ToBytes for Vec<u8> {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }
}

impl ToBytes for str {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl ToBytes for String {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl<T: ToBytes + ?Sized> ToBytes for &T {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        (**self).to_bytes()
    }
}

impl<T: ToBytes> ToBytes for Option<T> {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Some(value) => value.to_bytes(),
            None => Err(SimilarityError::InvalidInput(
                "entity has no byte buffer".into(),
            )),
        }
    }
}

/// Record adapter: the byte form is the compact JSON encoding of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize> ToBytes for Json<T> {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0)
            .map_err(|e| SimilarityError::InvalidInput(format!("record serialization: {}", e)))
    }
}

/// Write-once compressed-size caches, one slot per compressor label.
#[derive(Default)]
pub(crate) struct ComplexityCell {
    slots: RwLock<Vec<(&'static str, Arc<OnceCell<usize>>)>>,
}

impl ComplexityCell {
    /// Slot for `label`, created empty on first request.
    fn slot(&self, label: &'static str) -> Arc<OnceCell<usize>> {
        if let Some((_, cell)) = self.slots.read().iter().find(|(owner, _)| *owner == label) {
            return Arc::clone(cell);
        }

        let mut slots = self.slots.write();
        if let Some((_, cell)) = slots.iter().find(|(owner, _)| *owner == label) {
            return Arc::clone(cell);
        }
        let cell = Arc::new(OnceCell::new());
        slots.push((label, Arc::clone(&cell)));
        cell
    }

    /// Cached size for `label`, or `None` when that backend has not filled it.
    pub(crate) fn get(&self, label: &str) -> Option<usize> {
        self.slots
            .read()
            .iter()
            .find(|(owner, _)| *owner == label)
            .and_then(|(_, cell)| cell.get().copied())
    }

    /// Return the cached size for `label`, computing and storing it on first use.
    ///
    /// Concurrent first calls for the same label block on one computation.
    /// The slot lock is released before `compute` runs.
    pub(crate) fn get_or_try_init<F>(&self, label: &'static str, compute: F) -> Result<usize>
    where
        F: FnOnce() -> Result<usize>,
    {
        self.slot(label).get_or_try_init(compute).copied()
    }

    /// Labels with a filled slot, in fill-request order.
    pub(crate) fn labels(&self) -> Vec<&'static str> {
        self.slots
            .read()
            .iter()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(owner, _)| *owner)
            .collect()
    }
}

impl Clone for ComplexityCell {
    /// Copies filled values into fresh slots; the clone never shares state.
    fn clone(&self) -> Self {
        let slots = self
            .slots
            .read()
            .iter()
            .filter_map(|(owner, cell)| {
                cell.get()
                    .map(|&size| (*owner, Arc::new(OnceCell::with_value(size))))
            })
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }
}

/// A value plus its immutable byte form and cached complexities.
pub struct Entity<T = ()> {
    value: T,
    bytes: Box<[u8]>,
    pub(crate) complexity: ComplexityCell,
    pub(crate) doubled: ComplexityCell,
}

impl<T: ToBytes> Entity<T> {
    /// Snapshot the byte form of `value`.
    ///
    /// Fails with [`SimilarityError::InvalidInput`] when the value cannot
    /// produce a byte buffer.
    pub fn new(value: T) -> Result<Self> {
        let bytes = value.to_bytes()?;
        Ok(Self::with_bytes(value, bytes))
    }
}

impl<T> Entity<T> {
    /// Pair `value` with an explicit byte form.
    pub fn with_bytes(value: T, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            value,
            bytes: bytes.into().into_boxed_slice(),
            complexity: ComplexityCell::default(),
            doubled: ComplexityCell::default(),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Cached `C(x)` under the compressor labelled `label`, if computed.
    pub fn cached_complexity(&self, label: &str) -> Option<usize> {
        self.complexity.get(label)
    }

    /// Labels of the backends that have cached `C(x)` for this entity.
    pub fn cached_backends(&self) -> Vec<&'static str> {
        self.complexity.labels()
    }
}

impl Entity<()> {
    /// Entity over raw bytes with no attached value.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_bytes((), bytes)
    }
}

impl Entity<String> {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let bytes = text.as_bytes().to_vec();
        Self::with_bytes(text, bytes)
    }
}

impl<T: Clone> Clone for Entity<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            bytes: self.bytes.clone(),
            complexity: self.complexity.clone(),
            doubled: self.doubled.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("value", &self.value)
            .field("len", &self.bytes.len())
            .field("cached_backends", &self.cached_backends())
            .finish()
    }
}
