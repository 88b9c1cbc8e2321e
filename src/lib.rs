//! Insertion-ordered named counters.
//!
//! A [`Meter`] maps string metric names to numeric counts, remembering the
//! order in which metrics were first seen. It supports incrementing, min/max
//! clamping, absolute sets, additive merging from several source shapes and
//! a JSON pair-array encoding that round-trips exactly (order included).
//!
//! The type is deliberately permissive: malformed input is dropped instead of
//! reported, so no operation returns an error or panics. Dropped input is
//! visible at `TRACE` level for diagnostics.
//!
//! ```
//! use metermap::Meter;
//!
//! let mut meter = Meter::new();
//! meter.inc("requests");
//! meter.add("bytes_in", 512.0);
//! meter.max("peak_rss", 1024.0);
//!
//! let encoded = meter.to_json();
//! assert_eq!(encoded, r#"[["requests",1],["bytes_in",512],["peak_rss",1024]]"#);
//!
//! let restored = Meter::from_json(&encoded);
//! assert_eq!(restored.get("bytes_in"), 512.0);
//! assert_eq!(restored.len(), 3);
//! ```

#![warn(rust_2018_idioms, unreachable_pub, missing_docs)]

pub use self::{
    map::{Entries, Meter, Metrics},
    object::{ObjectOptions, Sort},
    source::Source,
};

mod json;
mod map;
mod object;
mod source;
