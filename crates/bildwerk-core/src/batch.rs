// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered, capacity-bounded collection of images queued for PDF assembly.
//
// Items have no stable identity: the page order of the final document is the
// insertion order minus removals, so every mutation here must keep surviving
// items in their relative order.

use crate::error::{BildwerkError, Result};
use crate::types::ImageItem;

/// Default maximum number of images in one batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 100;

/// Ordered batch of pending images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCollection {
    items: Vec<ImageItem>,
    capacity: usize,
}

impl BatchCollection {
    /// Create an empty batch holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Append `items` in their given order.
    ///
    /// All-or-nothing: if the result would exceed the capacity the batch is
    /// left untouched. Returns the new length.
    pub fn append(&mut self, items: Vec<ImageItem>) -> Result<usize> {
        let incoming = items.len();
        if self.items.len() + incoming > self.capacity {
            return Err(BildwerkError::CapacityExceeded {
                current: self.items.len(),
                incoming,
                capacity: self.capacity,
            });
        }
        self.items.extend(items);
        Ok(self.items.len())
    }

    /// Remove the item at `index`, shifting later items down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<ImageItem> {
        if index >= self.items.len() {
            return Err(BildwerkError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_at(&self, index: usize) -> Option<&ImageItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageItem> {
        self.items.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many more items can be appended.
    pub fn remaining(&self) -> usize {
        self.capacity - self.items.len()
    }

    /// Copy of the current contents, detached from later mutations.
    ///
    /// Payloads are shared, so this is cheap even for large images.
    pub fn snapshot(&self) -> Vec<ImageItem> {
        self.items.clone()
    }

    /// Total encoded size of all queued images.
    pub fn total_bytes(&self) -> usize {
        self.items.iter().map(ImageItem::byte_len).sum()
    }
}

impl Default for BatchCollection {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_CAPACITY)
    }
}

impl<'a> IntoIterator for &'a BatchCollection {
    type Item = &'a ImageItem;
    type IntoIter = std::slice::Iter<'a, ImageItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
