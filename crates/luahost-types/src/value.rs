//! HostValue — owned host-side representation of interpreter values.
//!
//! Values are copied out of the interpreter; nothing here aliases
//! interpreter-owned memory. The union is deliberately closed: interpreter
//! types with no host equivalent (functions, userdata, threads) arrive as
//! placeholder strings produced by the bridge, not as variants here.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An interpreter value copied into host-owned memory.
///
/// Tables come out in one of two shapes: a table whose keys are exactly the
/// integers `1..=N` converts to [`HostValue::Array`] in key order, every other
/// table converts to [`HostValue::Table`]. An empty table is an empty array.
///
/// `HostValue` implements `Eq` and `Hash` so that it can be used as a map key
/// (interpreter tables allow arbitrary keys). Floats compare and hash by bit
/// pattern, so `Integer(1)` and `Float(1.0)` are distinct keys — the same
/// distinction the interpreter itself maintains.
#[derive(Debug, Clone)]
pub enum HostValue {
    /// The interpreter's nil.
    Nil,
    /// A boolean.
    Boolean(bool),
    /// A number the interpreter reports as its integer subtype.
    Integer(i64),
    /// A number the interpreter reports as its float subtype.
    Float(f64),
    /// A string. Interpreter strings are byte strings; embedded NUL bytes are
    /// preserved, invalid UTF-8 is replaced during conversion.
    String(String),
    /// A table with dense integer keys `1..=N`, in key order.
    Array(Vec<HostValue>),
    /// Any other table, as an unordered key/value mapping.
    Table(HashMap<HostValue, HostValue>),
}

impl HostValue {
    /// Name of this value's shape, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "nil",
            HostValue::Boolean(_) => "boolean",
            HostValue::Integer(_) => "integer",
            HostValue::Float(_) => "float",
            HostValue::String(_) => "string",
            HostValue::Array(_) => "array",
            HostValue::Table(_) => "table",
        }
    }

    /// Check if this is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, HostValue::Nil)
    }

    /// Get as boolean if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            HostValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            HostValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as a string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the elements if this is an array.
    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the entries if this is a table.
    pub fn as_table(&self) -> Option<&HashMap<HostValue, HostValue>> {
        match self {
            HostValue::Table(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a table entry by key. Arrays are indexed by `Integer` keys
    /// `1..=N`, matching the interpreter's view of them.
    pub fn get(&self, key: &HostValue) -> Option<&HostValue> {
        match self {
            HostValue::Table(entries) => entries.get(key),
            HostValue::Array(items) => match key {
                HostValue::Integer(i) if *i >= 1 => items.get(*i as usize - 1),
                _ => None,
            },
            _ => None,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Nil, HostValue::Nil) => true,
            (HostValue::Boolean(a), HostValue::Boolean(b)) => a == b,
            (HostValue::Integer(a), HostValue::Integer(b)) => a == b,
            // Bit equality keeps Eq reflexive even for NaN
            (HostValue::Float(a), HostValue::Float(b)) => a.to_bits() == b.to_bits(),
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Table(a), HostValue::Table(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for HostValue {}

impl Hash for HostValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            HostValue::Nil => state.write_u8(0),
            HostValue::Boolean(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            HostValue::Integer(i) => {
                state.write_u8(2);
                i.hash(state);
            }
            HostValue::Float(f) => {
                state.write_u8(3);
                f.to_bits().hash(state);
            }
            HostValue::String(s) => {
                state.write_u8(4);
                s.hash(state);
            }
            HostValue::Array(items) => {
                state.write_u8(5);
                items.hash(state);
            }
            HostValue::Table(entries) => {
                // Order-independent: XOR of standalone per-entry hashes, so
                // map iteration order cannot leak into the hash
                state.write_u8(6);
                let mut acc: u64 = 0;
                for (key, value) in entries {
                    let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();
                    key.hash(&mut entry_hasher);
                    value.hash(&mut entry_hasher);
                    acc ^= entry_hasher.finish();
                }
                state.write_u64(acc);
            }
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Nil => write!(f, "nil"),
            HostValue::Boolean(b) => write!(f, "{}", b),
            HostValue::Integer(i) => write!(f, "{}", i),
            HostValue::Float(n) => {
                // Keep the float subtype visible: 10.0 renders as "10.0"
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            HostValue::String(s) => write!(f, "\"{}\"", s),
            HostValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            HostValue::Table(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Integer(i)
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::Array(items)
    }
}

impl From<HashMap<HostValue, HostValue>> for HostValue {
    fn from(entries: HashMap<HostValue, HostValue>) -> Self {
        HostValue::Table(entries)
    }
}
