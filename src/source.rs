use std::{borrow::Borrow, collections::BTreeMap};

use derive_more::From;
use serde_json::{Map as JsonMap, Value};

use crate::map::Meter;

// === Source ===

/// Every shape a [`Meter`] can be loaded from.
///
/// The `From` conversions let [`Meter::load`] take any of them directly,
/// making the accepted set explicit instead of sniffing one untyped argument.
#[derive(Debug, Clone, From)]
pub enum Source {
    /// A JSON text of either accepted shape; unparsable text loads nothing.
    Json(String),
    /// An already-parsed JSON value; an array wins over the object path.
    Value(Value),
    /// An ordered pair sequence, loaded directly with `set` semantics.
    Pairs(Vec<(String, f64)>),
    /// Another meter, merged additively into the new one (a copy).
    Meter(Meter),
    /// A key→count mapping, merged additively.
    Map(BTreeMap<String, f64>),
    /// A plain JSON object, merged additively in its own key order.
    Object(JsonMap<String, Value>),
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Self::Json(text.to_owned())
    }
}

impl Meter {
    /// Loads a meter from any accepted [`Source`] shape.
    ///
    /// ```
    /// use metermap::Meter;
    ///
    /// let meter = Meter::load(r#"[["hits",3]]"#);
    /// assert_eq!(meter.get("hits"), 3.0);
    /// ```
    pub fn load(source: impl Into<Source>) -> Self {
        match source.into() {
            Source::Json(text) => Self::from_json(&text),
            Source::Value(value) => Self::from_value(&value),
            Source::Pairs(pairs) => Self::from_pairs(pairs),
            Source::Meter(other) => other,
            Source::Map(map) => Self::from_map(map),
            Source::Object(object) => Self::from_object(&object),
        }
    }

    /// Loads an ordered pair sequence directly: later duplicates overwrite
    /// earlier ones, exactly as reloading a serialized form must.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut meter = Self::new();
        for (metric, count) in pairs {
            meter.set(metric.as_ref(), count);
        }
        meter
    }

    /// Loads a key→count mapping through the additive merge path.
    pub fn from_map<I, K, V>(source: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Borrow<f64>,
    {
        let mut meter = Self::new();
        meter.merge_from_map(source);
        meter
    }

    /// Loads a plain JSON object through the additive merge path.
    pub fn from_object(object: &JsonMap<String, Value>) -> Self {
        let mut meter = Self::new();
        meter.merge_from_object(object);
        meter
    }
}
