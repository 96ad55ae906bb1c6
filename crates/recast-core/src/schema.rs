//! Schema descriptors for the recast conversion engine.
//!
//! A schema side (transport/wire or persistence/domain) is described by a set
//! of [`RecordDescriptor`]s, each an ordered field table. Descriptors are
//! obtained through the [`SchemaSource`] trait so the engine never depends on
//! where layouts come from; [`SchemaCatalog`] is the bundled source, built
//! programmatically or loaded from YAML.

use crate::types::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Error type for schema catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading a catalog file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Two records in one catalog share a type name
    #[error("Duplicate record type: {0}")]
    DuplicateRecord(String),

    /// Two fields in one record share a name
    #[error("Duplicate field '{field}' in record '{record}'")]
    DuplicateField { record: String, field: String },

    /// A nested record reference names a type the catalog does not define
    #[error("Field '{field}' in record '{record}' references unknown record '{referenced}'")]
    UnknownRecord {
        record: String,
        field: String,
        referenced: String,
    },
}

/// A single field in a record layout.
///
/// `position` is the field's index in declaration order. It is assigned when
/// the owning descriptor is built, never read from input.
///
/// `maps_to` is the declarative mapping annotation: it names the counterpart
/// field on the other schema side, and takes precedence over same-name
/// matching (but not over an explicit runtime override).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,

    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether this field may be absent
    #[serde(default)]
    pub optional: bool,

    /// Declared counterpart field name on the other schema side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_to: Option<String>,

    /// Index in declaration order (derived, not part of the input format)
    #[serde(skip)]
    pub position: usize,
}

impl FieldDescriptor {
    /// Create a new required field descriptor.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
            maps_to: None,
            position: 0,
        }
    }

    /// Create a new optional field descriptor.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            optional: true,
            ..Self::new(name, field_type)
        }
    }

    /// Attach a `maps_to` annotation.
    pub fn maps_to(mut self, counterpart: impl Into<String>) -> Self {
        self.maps_to = Some(counterpart.into());
        self
    }
}

/// Ordered field table for one record type.
///
/// Built once per type and treated as immutable afterwards; the engine caches
/// descriptors behind `Arc` and shares them across conversions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDescriptor {
    /// Record type name
    #[serde(rename = "name")]
    pub type_name: String,

    /// Field descriptors in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    /// Cached field lookup (not serialized)
    #[serde(skip)]
    field_map: HashMap<String, usize>,
}

impl RecordDescriptor {
    /// Create a new record descriptor, assigning field positions in
    /// declaration order.
    pub fn new(type_name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        let mut descriptor = Self {
            type_name: type_name.into(),
            fields,
            field_map: HashMap::new(),
        };
        descriptor.rebuild();
        descriptor
    }

    /// Create a descriptor with no fields.
    ///
    /// Used when an unknown or non-record type is requested: the engine
    /// degrades to converting nothing rather than failing.
    pub fn empty(type_name: impl Into<String>) -> Self {
        Self::new(type_name, Vec::new())
    }

    /// Assign positions and rebuild the field lookup map.
    pub(crate) fn rebuild(&mut self) {
        for (idx, field) in self.fields.iter_mut().enumerate() {
            field.position = idx;
        }
        self.field_map = self
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.name.clone(), idx))
            .collect();
    }

    /// Get a field descriptor by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_map.get(name).and_then(|&idx| self.fields.get(idx))
    }

    /// Get all field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the descriptor has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Introspection capability: yields the ordered field table for a concrete
/// record type.
///
/// This is the seam between the engine and whatever declares record layouts —
/// an in-memory catalog, generated code, or configuration. Returning `None`
/// for an unknown type is not an error; the caller degrades to a zero-field
/// descriptor.
pub trait SchemaSource: Send + Sync {
    /// Describe a record type, or `None` if the source does not know it.
    fn describe(&self, type_name: &str) -> Option<RecordDescriptor>;
}

fn default_version() -> u32 {
    1
}

/// In-memory schema catalog: the bundled [`SchemaSource`].
///
/// One catalog describes one schema side. Catalogs are loaded from YAML or
/// assembled programmatically:
///
/// ```yaml
/// version: 1
/// records:
///   - name: User
///     fields:
///       - name: id
///         type: int64
///       - name: tags
///         type:
///           type: list
///           element: string
///         optional: true
///         maps_to: labels
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaCatalog {
    /// Catalog format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Record descriptors
    pub records: Vec<RecordDescriptor>,

    /// Cached record lookup (not serialized)
    #[serde(skip)]
    record_map: HashMap<String, usize>,
}

impl SchemaCatalog {
    /// Create a catalog from a list of record descriptors.
    pub fn new(records: Vec<RecordDescriptor>) -> Result<Self, SchemaError> {
        let mut catalog = Self {
            version: default_version(),
            records,
            record_map: HashMap::new(),
        };
        catalog.rebuild()?;
        Ok(catalog)
    }

    /// Load a catalog from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a catalog from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let mut catalog: SchemaCatalog = serde_yaml::from_str(yaml)?;
        catalog.rebuild()?;
        Ok(catalog)
    }

    /// Rebuild lookup maps and field positions, rejecting duplicates.
    fn rebuild(&mut self) -> Result<(), SchemaError> {
        self.record_map.clear();
        for (idx, record) in self.records.iter_mut().enumerate() {
            record.rebuild();

            let mut seen = HashMap::new();
            for field in &record.fields {
                if seen.insert(field.name.as_str(), ()).is_some() {
                    return Err(SchemaError::DuplicateField {
                        record: record.type_name.clone(),
                        field: field.name.clone(),
                    });
                }
            }

            if self
                .record_map
                .insert(record.type_name.clone(), idx)
                .is_some()
            {
                return Err(SchemaError::DuplicateRecord(record.type_name.clone()));
            }
        }
        Ok(())
    }

    /// Add a record descriptor to the catalog.
    pub fn add_record(&mut self, record: RecordDescriptor) -> Result<(), SchemaError> {
        if self.record_map.contains_key(&record.type_name) {
            return Err(SchemaError::DuplicateRecord(record.type_name));
        }
        let idx = self.records.len();
        self.record_map.insert(record.type_name.clone(), idx);
        self.records.push(record);
        Ok(())
    }

    /// Get a record descriptor by type name.
    pub fn get(&self, type_name: &str) -> Option<&RecordDescriptor> {
        self.record_map
            .get(type_name)
            .and_then(|&idx| self.records.get(idx))
    }

    /// Get all record type names.
    pub fn record_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.type_name.as_str()).collect()
    }

    /// Check that every nested record reference resolves within the catalog.
    pub fn validate(&self) -> Result<(), SchemaError> {
        fn referenced_record(ty: &FieldType) -> Option<&str> {
            match ty {
                FieldType::Record { name } => Some(name),
                FieldType::List { element } => referenced_record(element),
                _ => None,
            }
        }

        for record in &self.records {
            for field in &record.fields {
                if let Some(referenced) = referenced_record(&field.field_type) {
                    if self.get(referenced).is_none() {
                        return Err(SchemaError::UnknownRecord {
                            record: record.type_name.clone(),
                            field: field.name.clone(),
                            referenced: referenced.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl SchemaSource for SchemaCatalog {
    fn describe(&self, type_name: &str) -> Option<RecordDescriptor> {
        self.get(type_name).cloned()
    }
}
