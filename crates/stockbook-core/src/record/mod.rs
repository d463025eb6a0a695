//! Sparse, ordered-field records.
//!
//! A record carries any subset of the fixed field universe. The order in
//! which fields were defined is the order they serialize in, so a persisted
//! row parsed against its header reproduces the same row.

mod field;

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Result, StoreError};

pub use field::{format_float, Field, FieldKind, Value};

/// One row of a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    id: Option<String>,
    description: Option<String>,
    unit_price: Option<f64>,
    qty_in_stock: Option<i64>,
    total_price: Option<f64>,
    stock_remaining: Option<i64>,
    transaction_type: Option<String>,
    date: Option<String>,
    defined: Vec<Field>,
}

impl Record {
    /// Zip `values` with `headers` positionally.
    ///
    /// Headers beyond the last value stay undefined. `totalPrice` is derived
    /// when the row carries both `unitPrice` and `qtyInStock` but no total.
    ///
    /// # Errors
    ///
    /// - `UnknownField` for an unrecognized header name
    /// - `MalformedValue` when a value does not convert to its field's type
    /// - `RowTooLong` when there are more values than headers
    pub fn parse<V: AsRef<str>, H: AsRef<str>>(values: &[V], headers: &[H]) -> Result<Self> {
        let fields = Field::parse_headers(headers)?;
        Self::from_row(values, &fields)
    }

    /// Like [`Record::parse`] with an already validated header.
    pub fn from_row<V: AsRef<str>>(values: &[V], headers: &[Field]) -> Result<Self> {
        if values.len() > headers.len() {
            return Err(StoreError::RowTooLong {
                values: values.len(),
                headers: headers.len(),
            });
        }

        let mut record = Self::default();
        for (field, raw) in headers.iter().zip(values) {
            record.set(*field, Value::parse(*field, raw.as_ref())?)?;
        }
        record.derive_total_price();
        Ok(record)
    }

    /// Split a persisted line on commas and parse it against `headers`.
    pub fn parse_line(line: &str, headers: &[Field]) -> Result<Self> {
        let values: Vec<&str> = line.split(',').collect();
        Self::from_row(&values, headers)
    }

    /// Build a record from already typed values, in definition order.
    pub fn from_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Field, Value)>,
    {
        let mut record = Self::default();
        for (field, value) in values {
            record.set(field, value)?;
        }
        record.derive_total_price();
        Ok(record)
    }

    fn set(&mut self, field: Field, value: Value) -> Result<()> {
        let mismatch = |value: &Value| StoreError::MalformedValue {
            field,
            value: value.to_string(),
        };
        match (field, value) {
            (Field::Id, Value::Text(v)) => self.id = Some(v),
            (Field::Description, Value::Text(v)) => self.description = Some(v),
            (Field::TransactionType, Value::Text(v)) => self.transaction_type = Some(v),
            (Field::Date, Value::Text(v)) => self.date = Some(v),
            (Field::QtyInStock, Value::Integer(v)) => self.qty_in_stock = Some(v),
            (Field::StockRemaining, Value::Integer(v)) => self.stock_remaining = Some(v),
            (Field::UnitPrice, ref v @ (Value::Float(_) | Value::Integer(_))) => {
                self.unit_price = v.as_f64()
            }
            (Field::TotalPrice, ref v @ (Value::Float(_) | Value::Integer(_))) => {
                self.total_price = v.as_f64()
            }
            (_, other) => return Err(mismatch(&other)),
        }
        if !self.defined.contains(&field) {
            self.defined.push(field);
        }
        Ok(())
    }

    /// Set `totalPrice` to `unitPrice * qtyInStock` whenever both are defined.
    ///
    /// A supplied total is overwritten; `totalPrice` joins the defined set
    /// only if it was absent.
    fn derive_total_price(&mut self) {
        if let Some(total) = self.computed_total() {
            self.total_price = Some(total);
            if !self.defined.contains(&Field::TotalPrice) {
                self.defined.push(Field::TotalPrice);
            }
        }
    }

    fn computed_total(&self) -> Option<f64> {
        match (self.unit_price, self.qty_in_stock) {
            (Some(price), Some(qty)) => Some(price * qty as f64),
            _ => None,
        }
    }

    /// Typed accessor; `None` when the field is not defined on this record.
    pub fn get(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => self.id.clone().map(Value::Text),
            Field::Description => self.description.clone().map(Value::Text),
            Field::UnitPrice => self.unit_price.map(Value::Float),
            Field::QtyInStock => self.qty_in_stock.map(Value::Integer),
            Field::TotalPrice => self.total_price.map(Value::Float),
            Field::StockRemaining => self.stock_remaining.map(Value::Integer),
            Field::TransactionType => self.transaction_type.clone().map(Value::Text),
            Field::Date => self.date.clone().map(Value::Text),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn unit_price(&self) -> Option<f64> {
        self.unit_price
    }

    pub fn qty_in_stock(&self) -> Option<i64> {
        self.qty_in_stock
    }

    pub fn total_price(&self) -> Option<f64> {
        self.total_price
    }

    pub fn transaction_type(&self) -> Option<&str> {
        self.transaction_type.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Fields carried by this record, in serialization order.
    pub fn defined_fields(&self) -> &[Field] {
        &self.defined
    }

    pub fn is_defined(&self, field: Field) -> bool {
        self.defined.contains(&field)
    }

    /// Defined fields paired with their values, in serialization order.
    pub fn values(&self) -> impl Iterator<Item = (Field, Value)> + '_ {
        self.defined
            .iter()
            .filter_map(move |field| self.get(*field).map(|value| (*field, value)))
    }

    /// Persisted form: defined values joined with commas, no escaping.
    pub fn to_line(&self) -> String {
        self.values()
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// A new record with `field` replaced by the parsed `raw` value.
    ///
    /// The field is appended to the defined set if it was absent.
    pub fn with_value(&self, field: Field, raw: &str) -> Result<Self> {
        let mut next = self.clone();
        next.set(field, Value::parse(field, raw)?)?;
        Ok(next)
    }

    /// A new record whose `totalPrice` equals `unitPrice * qtyInStock`.
    pub fn with_recomputed_total(&self) -> Self {
        let mut next = self.clone();
        next.derive_total_price();
        next
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, value) in self.values() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", field, value)?;
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.defined.len()))?;
        for (field, value) in self.values() {
            map.serialize_entry(field.name(), &value)?;
        }
        map.end()
    }
}
