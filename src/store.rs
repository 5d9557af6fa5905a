// src/store.rs

use crate::models::SegmentResult;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("segment {0} was inserted twice")]
    DuplicateSegment(usize),
    #[error("segment {0} is missing from the results store")]
    MissingSegment(usize),
}

/// Fetched segments keyed by index.
///
/// Workers insert concurrently in any order; the assembler drains the store
/// only once every segment has signaled completion.
#[derive(Debug, Default)]
pub struct ResultsStore {
    results: DashMap<usize, SegmentResult>,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(segments: usize) -> Self {
        Self { results: DashMap::with_capacity(segments) }
    }

    /// Inserts a result. Each index may be written exactly once.
    pub fn insert(&self, result: SegmentResult) -> Result<(), StoreError> {
        match self.results.entry(result.index) {
            Entry::Occupied(_) => Err(StoreError::DuplicateSegment(result.index)),
            Entry::Vacant(slot) => {
                slot.insert(result);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Drains results `0..segment_count` in index order.
    pub fn take_ordered(&self, segment_count: usize) -> Result<Vec<SegmentResult>, StoreError> {
        let mut ordered = Vec::with_capacity(segment_count);
        for index in 0..segment_count {
            let (_, result) = self
                .results
                .remove(&index)
                .ok_or(StoreError::MissingSegment(index))?;
            ordered.push(result);
        }
        Ok(ordered)
    }
}
