use serde_json::{Map as JsonMap, Value};

use crate::{json::count_to_value, map::Meter};

// === Sort ===

/// Key ordering for [`Meter::as_object`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sort {
    /// Insertion order, as stored.
    #[default]
    Unsorted,
    /// Lexicographic by metric name.
    Metric,
    /// Numeric by count.
    Count,
}

impl Sort {
    /// Resolves a sort token: `k`/`key`/`keys`/`m`/`metric`/`metrics` sort by
    /// name, `c`/`count`/`counts`/`v`/`value`/`values` sort by count. Any
    /// other token means unsorted.
    pub fn from_token(token: &str) -> Self {
        match token {
            "k" | "key" | "keys" | "m" | "metric" | "metrics" => Self::Metric,
            "c" | "count" | "counts" | "v" | "value" | "values" => Self::Count,
            _ => Self::Unsorted,
        }
    }
}

// === ObjectOptions ===

/// Options for [`Meter::as_object`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectOptions {
    /// Key ordering of the produced object.
    pub sort: Sort,
    /// Reverses the chosen ordering. Has no effect when unsorted.
    pub desc: bool,
}

impl ObjectOptions {
    /// Sorts by metric name.
    pub fn by_metric() -> Self {
        Self {
            sort: Sort::Metric,
            ..Self::default()
        }
    }

    /// Sorts by count.
    pub fn by_count() -> Self {
        Self {
            sort: Sort::Count,
            ..Self::default()
        }
    }

    /// Reverses the ordering.
    pub fn desc(mut self) -> Self {
        self.desc = true;
        self
    }
}

impl Meter {
    /// Produces a plain `{metric: count}` object, re-inserted in the
    /// requested order so order-observing consumers (such as a JSON writer)
    /// see it. The sort is stable: tied counts keep their prior relative
    /// order.
    ///
    /// This view is for readability and sorting; only [`Meter::to_json`]
    /// guarantees an exact round-trip.
    pub fn as_object(&self, options: ObjectOptions) -> JsonMap<String, Value> {
        let mut pairs: Vec<(&str, f64)> = self.entries().collect();

        match options.sort {
            Sort::Unsorted => {}
            Sort::Metric if options.desc => pairs.sort_by(|(a, _), (b, _)| b.cmp(a)),
            Sort::Metric => pairs.sort_by(|(a, _), (b, _)| a.cmp(b)),
            Sort::Count if options.desc => pairs.sort_by(|(_, a), (_, b)| b.total_cmp(a)),
            Sort::Count => pairs.sort_by(|(_, a), (_, b)| a.total_cmp(b)),
        }

        pairs
            .into_iter()
            .map(|(metric, count)| (metric.to_owned(), count_to_value(count)))
            .collect()
    }
}
