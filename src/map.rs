use std::{borrow::Borrow, fmt, slice};

use fxhash::FxHashMap;
use serde_json::{Map as JsonMap, Value};
use tracing::trace;

// === Meter ===

/// An insertion-ordered mapping from metric names to numeric counts.
///
/// Metrics keep the position of their first insertion: mutating an existing
/// metric never moves it, and both iteration and [`Meter::to_json`] follow
/// that order. A metric that was never stored reads as `0`.
///
/// Counts are `f64` because the canonical interchange format is JSON and any
/// JSON number must be representable.
#[derive(Clone, Default)]
pub struct Meter {
    entries: Vec<(String, f64)>,
    index: FxHashMap<String, usize>,
}

impl Meter {
    /// Creates an empty meter.
    pub fn new() -> Self {
        Self::default()
    }

    // === Mutators ===
    //
    // Every mutator validates its input and turns into a no-op returning 0
    // instead of failing: the empty metric name is never stored.

    /// Adds `amount` to the metric's count, materializing it at 0 first if
    /// absent. Returns the new count.
    pub fn add(&mut self, metric: &str, amount: f64) -> f64 {
        if metric.is_empty() {
            trace!("empty metric name, ignoring");
            return 0.0;
        }

        match self.index.get(metric) {
            Some(&slot) => {
                let count = &mut self.entries[slot].1;
                *count += amount;
                *count
            }
            None => {
                self.insert(metric, amount);
                amount
            }
        }
    }

    /// Adds 1 to the metric's count. Returns the new count.
    pub fn inc(&mut self, metric: &str) -> f64 {
        self.add(metric, 1.0)
    }

    /// Clamps the metric's count down to `value`: stores `value` if the
    /// metric is absent or its count exceeds `value`. Returns the stored
    /// count.
    pub fn min(&mut self, metric: &str, value: f64) -> f64 {
        if metric.is_empty() {
            trace!("empty metric name, ignoring");
            return 0.0;
        }

        match self.index.get(metric) {
            Some(&slot) => {
                let count = &mut self.entries[slot].1;
                if value < *count {
                    *count = value;
                }
                *count
            }
            None => {
                self.insert(metric, value);
                value
            }
        }
    }

    /// Clamps the metric's count up to `value`: stores `value` if the metric
    /// is absent or its count is below `value`. Returns the stored count.
    pub fn max(&mut self, metric: &str, value: f64) -> f64 {
        if metric.is_empty() {
            trace!("empty metric name, ignoring");
            return 0.0;
        }

        match self.index.get(metric) {
            Some(&slot) => {
                let count = &mut self.entries[slot].1;
                if value > *count {
                    *count = value;
                }
                *count
            }
            None => {
                self.insert(metric, value);
                value
            }
        }
    }

    /// Stores `value` directly, overwriting any previous count. Returns the
    /// stored value.
    pub fn set(&mut self, metric: &str, value: f64) -> f64 {
        if metric.is_empty() {
            trace!("empty metric name, ignoring");
            return 0.0;
        }

        match self.index.get(metric) {
            Some(&slot) => self.entries[slot].1 = value,
            None => self.insert(metric, value),
        }
        value
    }

    /// Resets the metric's count to 0, materializing it if absent.
    pub fn reset(&mut self, metric: &str) -> f64 {
        self.set(metric, 0.0)
    }

    /// Removes all metrics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    fn insert(&mut self, metric: &str, count: f64) {
        self.index.insert(metric.to_owned(), self.entries.len());
        self.entries.push((metric.to_owned(), count));
    }

    // === Queries ===

    /// Returns the metric's count, or 0 if it was never stored.
    pub fn get(&self, metric: &str) -> f64 {
        self.index
            .get(metric)
            .map_or(0.0, |&slot| self.entries[slot].1)
    }

    /// Returns the number of stored metrics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no metric is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over metric names in insertion order.
    pub fn metrics(&self) -> Metrics<'_> {
        Metrics(self.entries.iter())
    }

    /// Iterates over `(metric, count)` pairs in insertion order.
    pub fn entries(&self) -> Entries<'_> {
        Entries(self.entries.iter())
    }

    /// Collects `transform(metric, count)` for every entry, in insertion
    /// order.
    pub fn map_entries<T>(&self, mut transform: impl FnMut(&str, f64) -> T) -> Vec<T> {
        self.entries()
            .map(|(metric, count)| transform(metric, count))
            .collect()
    }

    // === Merging ===
    //
    // All merges are additive: duplicate names accumulate across sources
    // instead of overwriting.

    /// Adds every count of `other` into this meter, in `other`'s order.
    pub fn merge(&mut self, other: &Meter) {
        for (metric, count) in other {
            self.add(metric, count);
        }
    }

    /// Adds every entry of a key→count mapping (`BTreeMap`, `HashMap`, pair
    /// iterators) into this meter, in the mapping's iteration order.
    pub fn merge_from_map<I, K, V>(&mut self, source: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Borrow<f64>,
    {
        for (metric, count) in source {
            self.add(metric.as_ref(), *count.borrow());
        }
    }

    /// Adds every numeric member of a plain JSON object into this meter, in
    /// the object's own order. Non-numeric members contribute nothing.
    pub fn merge_from_object(&mut self, source: &JsonMap<String, Value>) {
        for (metric, value) in source {
            match value.as_f64() {
                Some(count) => {
                    self.add(metric, count);
                }
                None => trace!(%metric, "non-numeric count, skipping"),
            }
        }
    }
}

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

/// Meters are equal if they hold the same pairs in the same order.
impl PartialEq for Meter {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<'a> IntoIterator for &'a Meter {
    type IntoIter = Entries<'a>;
    type Item = (&'a str, f64);

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

// === Entries ===

/// Iterator over `(metric, count)` pairs in insertion order.
pub struct Entries<'a>(slice::Iter<'a, (String, f64)>);

impl<'a> Iterator for Entries<'a> {
    type Item = (&'a str, f64);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(metric, count)| (metric.as_str(), *count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Entries<'_> {}

// === Metrics ===

/// Iterator over metric names in insertion order.
pub struct Metrics<'a>(slice::Iter<'a, (String, f64)>);

impl<'a> Iterator for Metrics<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(metric, _)| metric.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for Metrics<'_> {}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn add_accumulates() {
        let mut meter = Meter::new();
        assert_eq!(meter.add("hits", 2.0), 2.0);
        assert_eq!(meter.add("hits", 3.0), 5.0);
        assert_eq!(meter.inc("hits"), 6.0);
        assert_eq!(meter.get("hits"), 6.0);
        assert_eq!(meter.len(), 1);
    }

    #[test]
    fn min_max_clamp() {
        let mut meter = Meter::new();

        // First use stores the value as-is, even a large one for `min`.
        assert_eq!(meter.min("floor", 10.0), 10.0);
        assert_eq!(meter.min("floor", 7.0), 7.0);
        assert_eq!(meter.min("floor", 9.0), 7.0);

        assert_eq!(meter.max("ceil", -5.0), -5.0);
        assert_eq!(meter.max("ceil", 3.0), 3.0);
        assert_eq!(meter.max("ceil", 1.0), 3.0);
    }

    #[test]
    fn min_max_idempotent_at_extremum() {
        let mut meter = Meter::new();
        meter.set("v", 4.0);
        for _ in 0..3 {
            assert_eq!(meter.min("v", 4.0), 4.0);
            assert_eq!(meter.min("v", 100.0), 4.0);
            assert_eq!(meter.max("v", 4.0), 4.0);
            assert_eq!(meter.max("v", -100.0), 4.0);
        }
    }

    #[test]
    fn set_overwrites_and_reset_zeroes() {
        let mut meter = Meter::new();
        meter.add("n", 41.0);
        assert_eq!(meter.set("n", 7.0), 7.0);
        assert_eq!(meter.get("n"), 7.0);
        assert_eq!(meter.reset("n"), 0.0);
        assert_eq!(meter.get("n"), 0.0);

        // `reset` materializes absent metrics, like `set`.
        meter.reset("other");
        assert_eq!(meter.len(), 2);
    }

    #[test]
    fn absent_metric_reads_as_zero() {
        let meter = Meter::new();
        assert_eq!(meter.get("nope"), 0.0);
        assert_eq!(meter.len(), 0);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut meter = Meter::new();
        assert_eq!(meter.add("", 5.0), 0.0);
        assert_eq!(meter.min("", 5.0), 0.0);
        assert_eq!(meter.max("", 5.0), 0.0);
        assert_eq!(meter.set("", 5.0), 0.0);
        assert_eq!(meter.get(""), 0.0);
        assert!(meter.is_empty());
    }

    #[test]
    fn insertion_order_survives_mutation() {
        let mut meter = Meter::new();
        meter.inc("b");
        meter.inc("a");
        meter.inc("c");
        meter.set("a", 10.0);
        meter.add("b", 1.0);

        let names: Vec<_> = meter.metrics().collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn clear_empties() {
        let mut meter = Meter::new();
        meter.inc("x");
        meter.inc("y");
        meter.clear();
        assert!(meter.is_empty());
        assert_eq!(meter.get("x"), 0.0);
    }

    #[test]
    fn map_entries_materializes_in_order() {
        let mut meter = Meter::new();
        meter.set("a", 1.0);
        meter.set("b", 2.0);

        let lines = meter.map_entries(|metric, count| format!("{metric}={count}"));
        assert_eq!(lines, ["a=1", "b=2"]);
    }

    #[test]
    fn merge_accumulates_duplicates() {
        let mut lhs = Meter::new();
        lhs.set("shared", 1.0);
        lhs.set("left", 10.0);

        let mut rhs = Meter::new();
        rhs.set("shared", 2.0);
        rhs.set("right", 20.0);

        lhs.merge(&rhs);
        assert_eq!(lhs.get("shared"), 3.0);
        assert_eq!(lhs.get("left"), 10.0);
        assert_eq!(lhs.get("right"), 20.0);

        // New metrics land after existing ones, in the source's order.
        let names: Vec<_> = lhs.metrics().collect();
        assert_eq!(names, ["shared", "left", "right"]);
    }

    #[test]
    fn merge_from_map_accepts_mappings() {
        let mut meter = Meter::new();
        meter.set("a", 1.0);

        let source = BTreeMap::from([("a".to_owned(), 2.0), ("b".to_owned(), 3.0)]);
        meter.merge_from_map(&source);

        assert_eq!(meter.get("a"), 3.0);
        assert_eq!(meter.get("b"), 3.0);
    }

    #[test]
    fn merge_from_object_skips_non_numeric() {
        let mut meter = Meter::new();
        let object = serde_json::json!({"ok": 2, "bad": "nope", "alsook": 0.5});

        meter.merge_from_object(object.as_object().unwrap());
        assert_eq!(meter.get("ok"), 2.0);
        assert_eq!(meter.get("alsook"), 0.5);
        assert_eq!(meter.len(), 2);
    }

    fn sample() -> impl Strategy<Value = Vec<(String, f64)>> {
        prop::collection::vec(("[a-e]{1,2}", -100i32..100), 0..16).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(metric, count)| (metric, f64::from(count)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn merge_totals_commute(lhs in sample(), rhs in sample()) {
            let mut a = Meter::new();
            a.merge_from_map(lhs.iter().map(|(m, c)| (m, c)));
            let mut b = Meter::new();
            b.merge_from_map(rhs.iter().map(|(m, c)| (m, c)));

            let (orig_a, orig_b) = (a.clone(), b.clone());
            a.merge(&orig_b);
            b.merge(&orig_a);

            for metric in orig_a.metrics().chain(orig_b.metrics()) {
                let total = orig_a.get(metric) + orig_b.get(metric);
                prop_assert_eq!(a.get(metric), total);
                prop_assert_eq!(b.get(metric), total);
            }
        }
    }
}
