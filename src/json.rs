//! The canonical JSON form: an array of `[metric, count]` pairs in insertion
//! order. It is the only encoding that round-trips exactly, order included.
//! A plain `{metric: count}` object is also accepted on input, but merges
//! additively and carries only the object's own key order.

use std::fmt;

use serde::{
    de::{self, MapAccess, SeqAccess},
    ser::SerializeSeq,
    Deserialize, Serialize,
};
use serde_json::Value;
use tracing::trace;

use crate::map::Meter;

impl Meter {
    /// Loads a meter from a JSON text.
    ///
    /// A pair array is loaded directly (later duplicates overwrite); an
    /// object is merged additively. Unparsable text or any other JSON shape
    /// yields an empty meter, never an error.
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self::from_value(&value),
            Err(error) => {
                trace!(%error, "unparsable JSON, loading nothing");
                Self::new()
            }
        }
    }

    /// Loads a meter from an already-parsed JSON value, with the same
    /// dispatch as [`Meter::from_json`]. An array wins over the object path
    /// even though both are compound values.
    pub fn from_value(value: &Value) -> Self {
        let mut meter = Self::new();

        if let Some(pairs) = value.as_array() {
            for pair in pairs {
                match as_pair(pair) {
                    Some((metric, count)) => {
                        meter.set(metric, count);
                    }
                    None => trace!("malformed pair, skipping"),
                }
            }
        } else if let Some(object) = value.as_object() {
            meter.merge_from_object(object);
        } else if !value.is_null() {
            trace!("unsupported JSON shape, loading nothing");
        }

        meter
    }

    /// Encodes the meter as a JSON array of `[metric, count]` pairs in
    /// insertion order. Feeding the result back into [`Meter::from_json`]
    /// reproduces the meter exactly.
    pub fn to_json(&self) -> String {
        let pairs = self
            .entries()
            .map(|(metric, count)| Value::from(vec![Value::from(metric), count_to_value(count)]))
            .collect::<Vec<_>>();

        Value::from(pairs).to_string()
    }
}

fn as_pair(value: &Value) -> Option<(&str, f64)> {
    match value.as_array()?.as_slice() {
        [metric, count] => Some((metric.as_str()?, count.as_f64()?)),
        _ => None,
    }
}

/// Integral counts are encoded as JSON integers, so a meter fed from integer
/// counts serializes without a trailing `.0`.
pub(crate) fn count_to_value(count: f64) -> Value {
    const EXACT: f64 = (1i64 << 53) as f64;

    if count.fract() == 0.0 && count.abs() < EXACT {
        Value::from(count as i64)
    } else {
        Value::from(count)
    }
}

/// Serializes as the canonical pair array, so a meter embeds in larger serde
/// structures with the same shape `to_json` produces.
impl Serialize for Meter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (metric, count) in self.entries() {
            seq.serialize_element(&(metric, count_to_value(count)))?;
        }
        seq.end()
    }
}

/// Deserializes from either accepted shape. Unlike [`Meter::from_json`],
/// malformed data surfaces as a deserializer error here, since the caller
/// opted into serde's contract.
impl<'de> Deserialize<'de> for Meter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MeterVisitor;

        impl<'de> de::Visitor<'de> for MeterVisitor {
            type Value = Meter;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of [metric, count] pairs or a map of counts")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Meter, A::Error> {
                let mut meter = Meter::new();
                while let Some((metric, count)) = seq.next_element::<(String, f64)>()? {
                    meter.set(&metric, count);
                }
                Ok(meter)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Meter, A::Error> {
                let mut meter = Meter::new();
                while let Some((metric, count)) = map.next_entry::<String, f64>()? {
                    meter.add(&metric, count);
                }
                Ok(meter)
            }
        }

        deserializer.deserialize_any(MeterVisitor)
    }
}
