//! Bounded history windows
//!
//! Hosts keep one utilization window and one threshold window per resource
//! dimension. Windows are FIFO: once full, the oldest entry is evicted.

use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default utilization history length (samples per dimension)
pub const DEFAULT_UTILIZATION_HISTORY: usize = 30;

/// Default threshold history length (records per dimension)
pub const DEFAULT_THRESHOLD_HISTORY: usize = 1024;

/// Fixed-capacity, time-ordered window (oldest first)
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DetectorError::InvalidHistoryWindow);
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_THRESHOLD_HISTORY)),
            capacity,
        })
    }

    /// Append an entry, evicting the oldest one when the window is full
    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// Copy of the window contents, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

/// Threshold computed for a host during one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    /// Unix timestamp (milliseconds) of the evaluation
    pub timestamp_ms: i64,
    /// Threshold the requested utilization was compared against
    pub threshold: f64,
    /// Requested utilization at evaluation time
    pub utilization: f64,
}

impl ThresholdRecord {
    pub fn now(threshold: f64, utilization: f64) -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            threshold,
            utilization,
        }
    }
}
