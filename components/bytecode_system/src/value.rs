//! Constant pool entries

use std::fmt;

use num_bigint::BigInt;
use serde::{Serialize, Serializer};

/// A literal stored in a function's constant pool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Number that does not fit `push_i32`
    Number(f64),
    /// BigInt literal such as `10n`
    BigInt(#[serde(serialize_with = "serialize_bigint")] BigInt),
    /// String literal or property key
    String(String),
    /// Regular expression literal
    RegExp {
        /// Source text between the slashes
        pattern: String,
        /// Flag characters after the closing slash
        flags: String,
    },
}

impl Value {
    /// Pool identity: numbers compare by bit pattern so `-0` and `NaN` get
    /// their own slots.
    pub(crate) fn same_constant(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::BigInt(n) => write!(f, "{}n", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::RegExp { pattern, flags } => write!(f, "/{}/{}", pattern, flags),
        }
    }
}

/// Formats a number the way a listing reader expects: integers without a
/// fractional part, other finite values in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        let mut buffer = ryu::Buffer::new();
        buffer.format_finite(n).to_string()
    }
}

fn serialize_bigint<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
