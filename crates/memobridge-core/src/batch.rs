//! Concurrent fan-out over independent remote calls.
//!
//! Every member of a batch is created up front and polled together on the
//! caller's task; the batch completes only after every member has settled.
//! A failing member never cancels its siblings.

use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tracing::{trace, warn};

use crate::error::Error;

/// Aggregate outcome of one batch, keyed by target id.
///
/// Both sequences follow dispatch order, not completion order.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub succeeded: Vec<(i64, T)>,
    pub failed: Vec<(i64, Error)>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of dispatched members.
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when no member failed (an empty batch is complete).
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when some, but not all, members failed.
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() && !self.succeeded.is_empty()
    }

    pub fn succeeded_ids(&self) -> Vec<i64> {
        self.succeeded.iter().map(|(id, _)| *id).collect()
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            succeeded: self.succeeded_ids(),
            failed: self
                .failed
                .iter()
                .map(|(id, e)| (*id, e.to_string()))
                .collect(),
        }
    }
}

/// Serializable view of a [`BatchResult`] for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: Vec<i64>,
    pub failed: Vec<(i64, String)>,
}

/// Run every future concurrently and wait for all of them to settle.
pub async fn join_batch<I, F, T>(members: I) -> BatchResult<T>
where
    I: IntoIterator<Item = (i64, F)>,
    F: Future<Output = crate::Result<T>>,
{
    let (ids, futures): (Vec<i64>, Vec<F>) = members.into_iter().unzip();
    let outcomes = join_all(futures).await;

    let mut result = BatchResult::empty();
    for (id, outcome) in ids.into_iter().zip(outcomes) {
        match outcome {
            Ok(value) => {
                trace!(target_id = id, "Batch member succeeded");
                result.succeeded.push((id, value));
            }
            Err(e) => {
                warn!(target_id = id, error = %e, "Batch member failed");
                result.failed.push((id, e));
            }
        }
    }
    result
}
