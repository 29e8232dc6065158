//! Ordered time series
//!
//! The plateau detector reads its window most-recent-first while the trend
//! estimator and forecaster read chronologically. The order is carried in the
//! type so a caller cannot hand one the other's input by accident.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Anything with a position in time
pub trait Timestamped {
    fn timestamp_ms(&self) -> i64;
}

/// Sort direction of an `Ordered` sequence
pub trait SortOrder {
    const NAME: &'static str;

    fn sort<T: Timestamped>(items: &mut [T]);
}

/// Oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chronological;

/// Newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MostRecentFirst;

impl SortOrder for Chronological {
    const NAME: &'static str = "chronological";

    fn sort<T: Timestamped>(items: &mut [T]) {
        items.sort_by_key(|i| i.timestamp_ms());
    }
}

impl SortOrder for MostRecentFirst {
    const NAME: &'static str = "most_recent_first";

    fn sort<T: Timestamped>(items: &mut [T]) {
        items.sort_by_key(|i| std::cmp::Reverse(i.timestamp_ms()));
    }
}

/// A sequence guaranteed to be sorted in order `O`.
///
/// Sorting is stable, so items sharing a timestamp keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<T, O> {
    items: Vec<T>,
    _order: PhantomData<O>,
}

impl<T: Timestamped, O: SortOrder> Ordered<T, O> {
    pub fn new(mut items: Vec<T>) -> Self {
        O::sort(&mut items);
        Self {
            items,
            _order: PhantomData,
        }
    }

    /// Re-sort into another order
    pub fn reorder<P: SortOrder>(self) -> Ordered<T, P> {
        Ordered::new(self.items)
    }
}

impl<T, O> Ordered<T, O> {
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T, O> Default for Ordered<T, O> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _order: PhantomData,
        }
    }
}

impl<'a, T, O> IntoIterator for &'a Ordered<T, O> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// One sample of a tracked metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Milliseconds since the Unix epoch
    pub ts: i64,
    pub value: f64,
}

impl TimePoint {
    pub fn new(ts: i64, value: f64) -> Self {
        Self { ts, value }
    }
}

impl Timestamped for TimePoint {
    fn timestamp_ms(&self) -> i64 {
        self.ts
    }
}

/// Chronological metric samples, the input of every trend consumer
pub type PerformanceSeries = Ordered<TimePoint, Chronological>;
