//! The fixed field universe and typed field values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Every field a record may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    Description,
    UnitPrice,
    QtyInStock,
    TotalPrice,
    StockRemaining,
    TransactionType,
    Date,
}

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Id,
        Field::Description,
        Field::UnitPrice,
        Field::QtyInStock,
        Field::TotalPrice,
        Field::StockRemaining,
        Field::TransactionType,
        Field::Date,
    ];

    /// Persisted header name.
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Description => "description",
            Field::UnitPrice => "unitPrice",
            Field::QtyInStock => "qtyInStock",
            Field::TotalPrice => "totalPrice",
            Field::StockRemaining => "stockRemaining",
            Field::TransactionType => "transactionType",
            Field::Date => "date",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Id | Field::Description | Field::TransactionType | Field::Date => {
                FieldKind::Text
            }
            Field::QtyInStock | Field::StockRemaining => FieldKind::Integer,
            Field::UnitPrice | Field::TotalPrice => FieldKind::Float,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.kind() != FieldKind::Text
    }

    /// Changing this field requires `totalPrice` to be recomputed.
    pub fn affects_total(self) -> bool {
        matches!(self, Field::UnitPrice | Field::QtyInStock)
    }

    /// Parse a header row, failing fast on the first unrecognized name.
    pub fn parse_headers<H: AsRef<str>>(headers: &[H]) -> Result<Vec<Field>> {
        headers.iter().map(|h| h.as_ref().parse()).collect()
    }
}

impl FromStr for Field {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            // Document collections name their own identifier `_id`.
            "id" | "_id" => Ok(Field::Id),
            "description" => Ok(Field::Description),
            "unitPrice" => Ok(Field::UnitPrice),
            "qtyInStock" => Ok(Field::QtyInStock),
            "totalPrice" => Ok(Field::TotalPrice),
            "stockRemaining" => Ok(Field::StockRemaining),
            "transactionType" => Ok(Field::TransactionType),
            "date" => Ok(Field::Date),
            other => Err(StoreError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Convert the persisted string form of `field` into its typed value.
    pub fn parse(field: Field, raw: &str) -> Result<Value> {
        let malformed = || StoreError::MalformedValue {
            field,
            value: raw.to_string(),
        };
        match field.kind() {
            FieldKind::Text => Ok(Value::Text(raw.to_string())),
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| malformed()),
            FieldKind::Float => {
                let parsed = raw.trim().parse::<f64>().map_err(|_| malformed())?;
                if parsed.is_finite() {
                    Ok(Value::Float(parsed))
                } else {
                    Err(malformed())
                }
            }
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(v) => f.write_str(v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

/// Render a float with at least one fractional digit (`10.0`, `2.5`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
