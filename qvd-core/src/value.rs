//! # Symbol and Cell Values
//!
//! Every QVD field stores its distinct values once, in a symbol table, and
//! rows refer to them by position. A decoded symbol is one of five shapes:
//!
//! | Variant | Payload | Notes |
//! |---------|---------|-------|
//! | `Integer` | i64 | 4-byte integers widened |
//! | `Real` | f64 | IEEE-754 double |
//! | `Text` | String | |
//! | `DualInteger` | i64 + String | integer is canonical, text is display |
//! | `DualReal` | f64 + String | real is canonical, text is display |
//!
//! A cell is either one of those symbols or [`Value::Empty`].

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A decoded symbol-table entry. Immutable once decoded.
///
/// Equality compares reals by bit pattern, so two decodes of the same bytes
/// always compare equal (including NaN payloads).
#[derive(Debug, Clone)]
pub enum Symbol {
    Integer(i64),
    Real(f64),
    Text(String),
    DualInteger(i64, String),
    DualReal(f64, String),
}

impl Symbol {
    /// Short lowercase name of the variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::DualInteger(..) => "dual integer",
            Self::DualReal(..) => "dual real",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) | Self::DualInteger(v, _) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) | Self::DualInteger(v, _) => Some(*v as f64),
            Self::Real(v) | Self::DualReal(v, _) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Text value, or the display form of a dual
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::DualInteger(_, s) | Self::DualReal(_, s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text(_))
    }

    pub fn is_dual(&self) -> bool {
        matches!(self, Self::DualInteger(..) | Self::DualReal(..))
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::DualInteger(a, s), Self::DualInteger(b, t)) => a == b && s == t,
            (Self::DualReal(a, s), Self::DualReal(b, t)) => a.to_bits() == b.to_bits() && s == t,
            _ => false,
        }
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Text(s) | Self::DualInteger(_, s) | Self::DualReal(_, s) => f.write_str(s),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Real(v) => serializer.serialize_f64(*v),
            Self::Text(s) => serializer.serialize_str(s),
            Self::DualInteger(v, s) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("number", v)?;
                map.serialize_entry("text", s)?;
                map.end()
            }
            Self::DualReal(v, s) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("number", v)?;
                map.serialize_entry("text", s)?;
                map.end()
            }
        }
    }
}

/// One resolved cell: a symbol, or the explicit no-value marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    #[default]
    Empty,
    Symbol(Symbol),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(s) => Some(s),
            Self::Empty => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_symbol().and_then(Symbol::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_symbol().and_then(Symbol::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_symbol().and_then(Symbol::as_str)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Self::Symbol(s)
    }
}

/// Empty cells render as nothing
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Symbol(s) => fmt::Display::fmt(s, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Symbol(s) => s.serialize(serializer),
        }
    }
}
