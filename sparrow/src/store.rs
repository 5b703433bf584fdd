/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::graph::Dataset;
use log::debug;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A data-level update: removals applied before insertions, the whole
/// request one atomic unit relative to readers.
#[derive(Debug, Default, Clone)]
pub struct UpdateRequest {
    pub delete: Vec<(String, String, String)>,
    pub insert: Vec<(String, String, String)>,
}

impl UpdateRequest {
    pub fn deleting(mut self, s: &str, p: &str, o: &str) -> Self {
        self.delete.push((s.into(), p.into(), o.into()));
        self
    }

    pub fn inserting(mut self, s: &str, p: &str, o: &str) -> Self {
        self.insert.push((s.into(), p.into(), o.into()));
        self
    }
}

/// Shared handle on a dataset. Readers evaluate concurrently under the read
/// lock; a writer excludes all readers and other writers for the duration of
/// one update. Evaluating a query never mutates the index, so holding the
/// read guard for the whole evaluation is safe and cheap.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<RwLock<Dataset>>,
}

impl Store {
    pub fn new(dataset: Dataset) -> Self {
        Store {
            inner: Arc::new(RwLock::new(dataset)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Dataset> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Dataset> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply one update atomically: no reader observes the removals without
    /// the insertions.
    pub fn update(&self, request: &UpdateRequest) {
        let mut dataset = self.write();
        let mut removed = 0usize;
        for (s, p, o) in &request.delete {
            if dataset.default.remove_parts(s, p, o) {
                removed += 1;
            }
        }
        let mut inserted = 0usize;
        for (s, p, o) in &request.insert {
            if dataset.default.insert_parts(s, p, o) {
                inserted += 1;
            }
        }
        debug!("update applied: -{} +{}", removed, inserted);
    }
}
