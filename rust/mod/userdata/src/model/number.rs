//! Serde helpers for the numeric progress fields.
//!
//! Game clients treat every number as a double. Integral values are written
//! without a fractional part, and integral doubles are accepted where a
//! count is stored.

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serializer};

/// Largest magnitude at which every integer is exactly representable.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

fn as_exact_integer(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT {
        Some(v as i64)
    } else {
        None
    }
}

pub fn serialize_number<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    match as_exact_integer(*v) {
        Some(i) => serializer.serialize_i64(i),
        None => serializer.serialize_f64(*v),
    }
}

pub fn serialize_opt_number<S: Serializer>(
    v: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match v {
        Some(v) => serialize_number(v, serializer),
        None => serializer.serialize_none(),
    }
}

fn to_count<E: de::Error>(v: f64) -> Result<u32, E> {
    if v.is_finite() && v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) {
        Ok(v as u32)
    } else {
        Err(E::invalid_value(
            Unexpected::Float(v),
            &"a non-negative whole number",
        ))
    }
}

/// Accepts `100` and `100.0`, rejects `100.5` and negatives.
pub fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    to_count(f64::deserialize(deserializer)?)
}

pub fn deserialize_opt_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    Option::<f64>::deserialize(deserializer)?
        .map(to_count)
        .transpose()
}
