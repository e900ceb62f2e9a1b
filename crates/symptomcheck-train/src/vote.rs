//! Plurality voting over per-model predictions.
//!
//! The most frequent value wins. When several values share the highest count
//! the smallest of them (by `Ord`) is chosen, so the outcome never depends on
//! the order the votes arrive in. For class codes this means the smallest
//! code; for decoded disease names it means the lexicographically smallest
//! name, which is the same class because codes follow sorted name order.

use crate::{TrainError, TrainResult};
use std::collections::BTreeMap;

/// Plurality vote with smallest-value tie-break.
pub fn plurality<T: Ord + Clone>(votes: &[T]) -> TrainResult<T> {
    let mut counts: BTreeMap<&T, usize> = BTreeMap::new();
    for vote in votes {
        *counts.entry(vote).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending order; keep the first maximum.
    let mut winner: Option<(&T, usize)> = None;
    for (value, count) in counts {
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((value, count));
        }
    }

    winner
        .map(|(value, _)| value.clone())
        .ok_or_else(|| TrainError::EmptyInput("No predictions to combine".to_string()))
}

/// Combine one class code per model into a single code.
pub fn combine(predictions: &[usize]) -> TrainResult<usize> {
    plurality(predictions)
}
