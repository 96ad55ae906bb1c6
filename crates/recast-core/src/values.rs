//! Value representations for the recast conversion engine.
//!
//! This module defines [`Value`], the dynamic value universe flowing through
//! conversions, and [`Record`], the dynamic record representation used for
//! both schema sides.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Dynamic value carried by a record field.
///
/// `Value` is the runtime counterpart of
/// [`FieldType`](crate::types::FieldType). A conversion reads `Value`s out of
/// a source record and writes coerced `Value`s into a destination record; the
/// coercion rules are keyed on the declared field types, not on the value
/// variant alone.
///
/// `Null` doubles as the "absent" marker for optional fields: an optional
/// field that was never set is either missing from the record map or mapped
/// to `Null`, and the two are treated identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null / absent value
    Null,

    /// Boolean value
    Bool(bool),

    /// 8-bit signed integer
    Int8(i8),

    /// 16-bit signed integer
    Int16(i16),

    /// 32-bit signed integer
    Int32(i32),

    /// 64-bit signed integer
    Int64(i64),

    /// 8-bit unsigned integer
    UInt8(u8),

    /// 16-bit unsigned integer
    UInt16(u16),

    /// 32-bit unsigned integer
    UInt32(u32),

    /// 64-bit unsigned integer
    UInt64(u64),

    /// 32-bit floating point
    Float32(f32),

    /// 64-bit floating point
    Float64(f64),

    /// UTF-8 string
    String(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// UUID value
    Uuid(Uuid),

    /// Timezone-aware instant (domain representation)
    Timestamp(DateTime<Utc>),

    /// Seconds + nanoseconds pair (transport representation)
    WireTimestamp {
        /// Seconds since the Unix epoch
        seconds: i64,
        /// Sub-second nanoseconds, `0..1_000_000_000`
        nanos: u32,
    },

    /// Ordered sequence of values
    List(Vec<Value>),

    /// Nested record
    Record(Record),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value's variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::UInt8(_) => "uint8",
            Self::UInt16(_) => "uint16",
            Self::UInt32(_) => "uint32",
            Self::UInt64(_) => "uint64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::WireTimestamp { .. } => "wire_timestamp",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an i64, widening smaller signed integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int8(i) => Some(*i as i64),
            Self::Int16(i) => Some(*i as i64),
            Self::Int32(i) => Some(*i as i64),
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a u64, widening smaller unsigned integers.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt8(i) => Some(*i as u64),
            Self::UInt16(i) => Some(*i as u64),
            Self::UInt32(i) => Some(*i as u64),
            Self::UInt64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(f) => Some(*f as f64),
            Self::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get this value as a UUID.
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            _ => None,
        }
    }

    /// Try to get this value as a timestamp.
    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Try to get this value as a list.
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get this value as a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(rec) => Some(rec),
            _ => None,
        }
    }

    /// Try to get this value as a mutable record.
    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Record(rec) => Some(rec),
            _ => None,
        }
    }

    /// Render this value as JSON, mostly for diagnostics and test fixtures.
    ///
    /// Lossy where JSON is: binary data becomes an array of numbers,
    /// timestamps become RFC 3339 strings, u64 values above `i64::MAX` keep
    /// their numeric form via `serde_json`'s arbitrary-precision numbers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int8(i) => serde_json::Value::from(*i),
            Self::Int16(i) => serde_json::Value::from(*i),
            Self::Int32(i) => serde_json::Value::from(*i),
            Self::Int64(i) => serde_json::Value::from(*i),
            Self::UInt8(i) => serde_json::Value::from(*i),
            Self::UInt16(i) => serde_json::Value::from(*i),
            Self::UInt32(i) => serde_json::Value::from(*i),
            Self::UInt64(i) => serde_json::Value::from(*i),
            Self::Float32(f) => serde_json::Value::from(*f),
            Self::Float64(f) => serde_json::Value::from(*f),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(b) => serde_json::Value::from(b.clone()),
            Self::Uuid(u) => serde_json::Value::String(u.to_string()),
            Self::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            Self::WireTimestamp { seconds, nanos } => serde_json::json!({
                "seconds": seconds,
                "nanos": nanos,
            }),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Record(rec) => {
                let mut map = serde_json::Map::new();
                for (name, value) in &rec.fields {
                    map.insert(name.clone(), value.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }
}

/// Dynamic record: a named bag of field values.
///
/// The record's `type_name` identifies its layout in the owning schema side.
/// Fields are stored by name; field ordering is a descriptor concern, not a
/// record concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Record type name, resolved against a schema side
    pub type_name: String,

    /// Field values (field name -> value)
    pub fields: HashMap<String, Value>,
}

impl Record {
    /// Create a new, empty record of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: HashMap::new(),
        }
    }

    /// Create a new record with a builder pattern.
    pub fn builder(type_name: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            type_name: type_name.into(),
            fields: HashMap::new(),
        }
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Whether a field is present and non-null.
    pub fn has(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|v| !v.is_null())
    }

    /// Number of stored fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no stored fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`Record`].
pub struct RecordBuilder {
    type_name: String,
    fields: HashMap<String, Value>,
}

impl RecordBuilder {
    /// Add a field to the record.
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Build the record.
    pub fn build(self) -> Record {
        Record {
            type_name: self.type_name,
            fields: self.fields,
        }
    }
}
