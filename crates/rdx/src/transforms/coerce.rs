// ai
//! 🧪 Coercions: turning API soup into column types, one `Value` at a time.
//!
//! Every function here is total: it takes any [`Value`] and returns the column
//! type. Nothing here returns an error. A weird field shape is a data-quality
//! problem, and data-quality problems get coerced, not escalated.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// ✅ Truthiness, the way a dynamically typed API consumer would read it.
///
/// `null` is false, bools are themselves, numbers are true when non-zero,
/// strings/arrays/objects are true when non-empty.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// 📝 Text form of any value. A `null` author becomes `"None"`, bools become
/// `"True"`/`"False"`, numbers keep their JSON rendering.
pub(crate) fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        // -- arrays and objects get their compact JSON, no drama
        honestly_who_knows => honestly_who_knows.to_string(),
    }
}

/// 🔢 Integer form of any value. Floats truncate toward zero, numeric strings
/// parse, bools are 0/1, and anything else is 0 with a warning in the logs.
pub(crate) fn integer(field: &str, value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(truncate))
            .unwrap_or_default(),
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(truncate))
                .unwrap_or_else(|| {
                    warn!("⚠️ {field} = {s:?} is not a number, coercing to 0");
                    0
                })
        }
        other => {
            warn!("⚠️ {field} = {other} is not a number, coercing to 0");
            0
        }
    }
}

fn truncate(f: f64) -> i64 {
    if f.is_finite() {
        // -- `as` saturates at the i64 bounds, which is exactly what we want here
        f.trunc() as i64
    } else {
        0
    }
}

/// 🕰️ Epoch seconds (number or numeric string) to a UTC timestamp.
///
/// Fractional seconds survive to the nanosecond. `None` for anything that is
/// not a finite, in-range epoch.
pub(crate) fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::Number(n) => {
            if let Some(whole) = n.as_i64() {
                return DateTime::from_timestamp(whole, 0);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(whole) = trimmed.parse::<i64>() {
                return DateTime::from_timestamp(whole, 0);
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * NANOS_PER_SEC).round();
    // -- rounding 0.9999999999 up lands on a full second; carry it instead of overflowing nanos
    let (whole, nanos) = if nanos >= NANOS_PER_SEC {
        (whole + 1.0, 0.0)
    } else {
        (whole, nanos)
    };
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(whole as i64, nanos as u32)
}
