//! Field type universe for the recast conversion engine.
//!
//! This module defines [`FieldType`], the type vocabulary shared by both
//! schema sides (transport/wire and persistence/domain). Each side declares
//! its record layouts in terms of `FieldType`; the engine decides per field
//! pair which coercion rule applies.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Universal field type representation.
///
/// `FieldType` covers the scalar, temporal, and composite types that can
/// appear in either schema. Timestamps deliberately exist twice: the domain
/// side carries a timezone-aware instant ([`Timestamp`](FieldType::Timestamp))
/// while the wire side carries a seconds/nanos pair
/// ([`WireTimestamp`](FieldType::WireTimestamp)). Bridging the two is a
/// coercion-engine concern, gated by the conversion context.
///
/// # YAML Format
///
/// Simple types are written as strings:
/// ```yaml
/// type: int64
/// type: string
/// type: timestamp
/// ```
///
/// Composite types use object format:
/// ```yaml
/// type:
///   type: list
///   element: string
/// type:
///   type: record
///   name: Address
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Boolean value
    Bool,

    /// 8-bit signed integer
    Int8,

    /// 16-bit signed integer
    Int16,

    /// 32-bit signed integer
    Int32,

    /// 64-bit signed integer
    Int64,

    /// 8-bit unsigned integer
    UInt8,

    /// 16-bit unsigned integer
    UInt16,

    /// 32-bit unsigned integer
    UInt32,

    /// 64-bit unsigned integer
    UInt64,

    /// 32-bit IEEE 754 floating point
    Float32,

    /// 64-bit IEEE 754 floating point
    Float64,

    /// UTF-8 string
    String,

    /// Binary data
    Bytes,

    /// UUID (128-bit)
    Uuid,

    /// Timezone-aware instant (domain representation)
    Timestamp,

    /// Seconds + nanoseconds pair (transport representation)
    WireTimestamp,

    /// Ordered sequence of a single element type
    List {
        /// Element type
        element: Box<FieldType>,
    },

    /// Nested record, referenced by type name
    Record {
        /// Record type name, resolved against the owning schema side
        name: String,
    },
}

impl FieldType {
    /// Shorthand for a list of the given element type.
    pub fn list(element: FieldType) -> Self {
        Self::List {
            element: Box::new(element),
        }
    }

    /// Shorthand for a nested record reference.
    pub fn record(name: impl Into<String>) -> Self {
        Self::Record { name: name.into() }
    }

    /// Whether this type is a member of the integer family (signed or
    /// unsigned, any width).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    /// Whether this type is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int8 => write!(f, "int8"),
            Self::Int16 => write!(f, "int16"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::UInt8 => write!(f, "uint8"),
            Self::UInt16 => write!(f, "uint16"),
            Self::UInt32 => write!(f, "uint32"),
            Self::UInt64 => write!(f, "uint64"),
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::Uuid => write!(f, "uuid"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::WireTimestamp => write!(f, "wire_timestamp"),
            Self::List { element } => write!(f, "list<{element}>"),
            Self::Record { name } => write!(f, "record<{name}>"),
        }
    }
}

// Custom serialization/deserialization for FieldType.
// Supports both simple string format ("int64", "uuid") and object format
// ({"type": "list", "element": "string"}).

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            // Simple types - serialize as string
            Self::Bool => serializer.serialize_str("bool"),
            Self::Int8 => serializer.serialize_str("int8"),
            Self::Int16 => serializer.serialize_str("int16"),
            Self::Int32 => serializer.serialize_str("int32"),
            Self::Int64 => serializer.serialize_str("int64"),
            Self::UInt8 => serializer.serialize_str("uint8"),
            Self::UInt16 => serializer.serialize_str("uint16"),
            Self::UInt32 => serializer.serialize_str("uint32"),
            Self::UInt64 => serializer.serialize_str("uint64"),
            Self::Float32 => serializer.serialize_str("float32"),
            Self::Float64 => serializer.serialize_str("float64"),
            Self::String => serializer.serialize_str("string"),
            Self::Bytes => serializer.serialize_str("bytes"),
            Self::Uuid => serializer.serialize_str("uuid"),
            Self::Timestamp => serializer.serialize_str("timestamp"),
            Self::WireTimestamp => serializer.serialize_str("wire_timestamp"),

            // Composite types - serialize as map
            Self::List { element } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "list")?;
                map.serialize_entry("element", element)?;
                map.end()
            }
            Self::Record { name } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "record")?;
                map.serialize_entry("name", name)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, MapAccess, Visitor};

        struct FieldTypeVisitor;

        fn simple_type<E: Error>(value: &str) -> Result<FieldType, E> {
            match value {
                "bool" => Ok(FieldType::Bool),
                "int8" => Ok(FieldType::Int8),
                "int16" => Ok(FieldType::Int16),
                "int32" | "int" => Ok(FieldType::Int32),
                "int64" | "bigint" => Ok(FieldType::Int64),
                "uint8" => Ok(FieldType::UInt8),
                "uint16" => Ok(FieldType::UInt16),
                "uint32" => Ok(FieldType::UInt32),
                "uint64" => Ok(FieldType::UInt64),
                "float32" | "float" => Ok(FieldType::Float32),
                "float64" | "double" => Ok(FieldType::Float64),
                "string" | "text" => Ok(FieldType::String),
                "bytes" => Ok(FieldType::Bytes),
                "uuid" => Ok(FieldType::Uuid),
                "timestamp" => Ok(FieldType::Timestamp),
                "wire_timestamp" => Ok(FieldType::WireTimestamp),
                _ => Err(E::custom(format!("unknown simple type: {value}"))),
            }
        }

        impl<'de> Visitor<'de> for FieldTypeVisitor {
            type Value = FieldType;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or map representing a FieldType")
            }

            // Handle string format: "int64", "uuid", etc.
            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                simple_type(value)
            }

            // Handle map format: {"type": "list", "element": "string"}
            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut type_name: Option<String> = None;
                let mut fields: HashMap<String, serde_yaml::Value> = HashMap::new();

                while let Some(key) = map.next_key::<String>()? {
                    if key == "type" {
                        type_name = Some(map.next_value()?);
                    } else {
                        fields.insert(key, map.next_value()?);
                    }
                }

                let type_name = type_name.ok_or_else(|| M::Error::missing_field("type"))?;

                match type_name.as_str() {
                    "list" => {
                        let element: FieldType = get_field_required(&fields, "element")?;
                        Ok(FieldType::List {
                            element: Box::new(element),
                        })
                    }
                    "record" => {
                        let name: String = get_field_required(&fields, "name")?;
                        Ok(FieldType::Record { name })
                    }
                    // Simple types that might appear in map format
                    other => simple_type(other),
                }
            }
        }

        deserializer.deserialize_any(FieldTypeVisitor)
    }
}

// Helper for deserialization of composite-type parameters
fn get_field_required<T: for<'de> Deserialize<'de>, E: serde::de::Error>(
    fields: &HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Result<T, E> {
    let value = fields
        .get(key)
        .ok_or_else(|| E::custom(format!("missing field: {key}")))?;
    serde_yaml::from_value(value.clone()).map_err(|e| E::custom(format!("invalid {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_type_from_string() {
        let ty: FieldType = serde_yaml::from_str("int64").unwrap();
        assert_eq!(ty, FieldType::Int64);

        let ty: FieldType = serde_yaml::from_str("wire_timestamp").unwrap();
        assert_eq!(ty, FieldType::WireTimestamp);

        // Aliases
        let ty: FieldType = serde_yaml::from_str("text").unwrap();
        assert_eq!(ty, FieldType::String);
    }

    #[test]
    fn test_parse_list_type() {
        let yaml = r#"
type: list
element: string
"#;
        let ty: FieldType = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ty, FieldType::list(FieldType::String));
    }

    #[test]
    fn test_parse_nested_list_type() {
        let yaml = r#"
type: list
element:
  type: list
  element: int32
"#;
        let ty: FieldType = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ty, FieldType::list(FieldType::list(FieldType::Int32)));
    }

    #[test]
    fn test_parse_record_type() {
        let yaml = r#"
type: record
name: Address
"#;
        let ty: FieldType = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ty, FieldType::record("Address"));
    }

    #[test]
    fn test_roundtrip_serde() {
        let types = vec![
            FieldType::Bool,
            FieldType::UInt32,
            FieldType::Timestamp,
            FieldType::list(FieldType::record("Item")),
        ];
        for ty in types {
            let yaml = serde_yaml::to_string(&ty).unwrap();
            let parsed: FieldType = serde_yaml::from_str(&yaml).unwrap();
            assert_eq!(ty, parsed);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<FieldType, _> = serde_yaml::from_str("varint");
        assert!(result.is_err());
    }

    #[test]
    fn test_integer_family_predicate() {
        assert!(FieldType::Int8.is_integer());
        assert!(FieldType::UInt64.is_integer());
        assert!(!FieldType::Float32.is_integer());
        assert!(FieldType::Float64.is_float());
        assert!(!FieldType::String.is_integer());
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::Int32.to_string(), "int32");
        assert_eq!(
            FieldType::list(FieldType::String).to_string(),
            "list<string>"
        );
        assert_eq!(FieldType::record("Address").to_string(), "record<Address>");
    }
}
