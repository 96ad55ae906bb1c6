//! Single-record conversion.

use crate::coerce::TypeCoercer;
use crate::context::ConversionContext;
use crate::error::ConvertError;
use crate::index::SchemaIndex;
use recast_core::{Record, Value};
use std::sync::Arc;
use tracing::trace;

/// Which schema side the source record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Transport record into persistence record
    WireToDomain,

    /// Persistence record into transport record
    DomainToWire,
}

/// Converts one record at a time against a shared [`ConversionContext`].
///
/// The engine is cheap to clone-by-`Arc` and safe for concurrent use across
/// disjoint value pairs: context caches warm up on first use and are
/// read-mostly afterwards.
pub struct ConversionEngine {
    ctx: Arc<ConversionContext>,
}

impl ConversionEngine {
    /// Create an engine over a shared context.
    pub fn new(ctx: Arc<ConversionContext>) -> Self {
        Self { ctx }
    }

    /// The engine's conversion context.
    pub fn context(&self) -> &ConversionContext {
        &self.ctx
    }

    /// Convert one record value into a destination record value.
    ///
    /// The source must be a record (optional presence is null-based, so a
    /// present optional source is the record itself; a null source is
    /// absent). The destination must be a record value whose `type_name`
    /// selects the destination layout. Both conditions are structural
    /// errors, not panics.
    ///
    /// Matched fields are applied in the cached correspondence order
    /// (destination declaration order). A field whose conversion fails aborts
    /// this record and surfaces the field name in the error; fields the
    /// mapper could not resolve are skipped silently.
    pub fn convert(
        &self,
        direction: Direction,
        src: &Value,
        dst: &mut Value,
    ) -> Result<(), ConvertError> {
        let src_rec = match src {
            Value::Null => return Err(ConvertError::MissingSource),
            Value::Record(rec) => rec,
            other => {
                return Err(ConvertError::NotARecord {
                    actual: other.kind(),
                })
            }
        };
        let dst_rec = match dst {
            Value::Record(rec) => rec,
            other => {
                return Err(ConvertError::InvalidDestination {
                    actual: other.kind(),
                })
            }
        };
        self.convert_record(direction, src_rec, dst_rec)
    }

    /// Convert a source record's matched fields into a destination record.
    pub(crate) fn convert_record(
        &self,
        direction: Direction,
        src: &Record,
        dst: &mut Record,
    ) -> Result<(), ConvertError> {
        let (src_index, dst_index) = self.indexes(direction);
        let src_desc = src_index.get_or_build(&src.type_name);
        let dst_desc = dst_index.get_or_build(&dst.type_name);
        let correspondences = self.ctx.correspondences(direction, &src_desc, &dst_desc);

        trace!(
            src_type = %src.type_name,
            dst_type = %dst.type_name,
            fields = correspondences.len(),
            "converting record"
        );

        let coercer = TypeCoercer::new(self, direction);
        for corr in correspondences.iter() {
            let value = match src.get(&corr.source) {
                Some(v) if !v.is_null() => v,
                // Absent source leaves the destination unset.
                _ => continue,
            };

            let src_field = &src_desc.fields[corr.source_pos];
            let dst_field = &dst_desc.fields[corr.dest_pos];
            let mut slot = dst.fields.remove(&corr.dest).unwrap_or(Value::Null);

            if let Some(transform) = self.ctx.transform(&corr.dest) {
                let produced = transform(value).map_err(|message| ConvertError::Transform {
                    field: corr.dest.clone(),
                    message,
                })?;
                coercer
                    .coerce_inferred(&produced, &dst_field.field_type, &mut slot)
                    .map_err(|e| e.in_field(corr.dest.clone()))?;
            } else {
                coercer
                    .coerce(value, &src_field.field_type, &dst_field.field_type, &mut slot)
                    .map_err(|e| e.in_field(corr.dest.clone()))?;
            }

            if !slot.is_null() {
                dst.set(corr.dest.clone(), slot);
            }
        }

        Ok(())
    }

    fn indexes(&self, direction: Direction) -> (&SchemaIndex, &SchemaIndex) {
        match direction {
            Direction::WireToDomain => (self.ctx.wire_index(), self.ctx.domain_index()),
            Direction::DomainToWire => (self.ctx.domain_index(), self.ctx.wire_index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_core::SchemaCatalog;

    const WIRE: &str = r#"
records:
  - name: WireUser
    fields:
      - name: id
        type: int64
      - name: name
        type: string
      - name: nested
        type:
          type: record
          name: WireNested
        optional: true

  - name: WireNested
    fields:
      - name: code
        type: int64
"#;

    const DOMAIN: &str = r#"
records:
  - name: User
    fields:
      - name: id
        type: int32
      - name: name
        type: string
      - name: nested
        type:
          type: record
          name: Nested
        optional: true

  - name: Nested
    fields:
      - name: code
        type: int32
      - name: note
        type: string
        optional: true
"#;

    fn engine() -> ConversionEngine {
        let wire = Arc::new(SchemaCatalog::from_yaml(WIRE).unwrap());
        let domain = Arc::new(SchemaCatalog::from_yaml(DOMAIN).unwrap());
        ConversionEngine::new(Arc::new(ConversionContext::new(wire, domain)))
    }

    #[test]
    fn test_convert_basic_record_with_absent_nested() {
        // {Id: int64 = 5, Name: "a", Nested: absent} into {Id: int32, ...}
        let engine = engine();
        let src = Value::Record(
            Record::builder("WireUser")
                .field("id", Value::Int64(5))
                .field("name", Value::String("a".into()))
                .build(),
        );
        let mut dst = Value::Record(Record::new("User"));

        engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap();

        let user = dst.as_record().unwrap();
        assert_eq!(user.get("id"), Some(&Value::Int32(5)));
        assert_eq!(user.get("name"), Some(&Value::String("a".into())));
        assert!(!user.has("nested"));
    }

    #[test]
    fn test_absent_source_is_structural_error() {
        let engine = engine();
        let mut dst = Value::Record(Record::new("User"));

        let err = engine
            .convert(Direction::WireToDomain, &Value::Null, &mut dst)
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingSource));
        assert!(err.is_structural());
    }

    #[test]
    fn test_non_record_source_is_structural_error() {
        let engine = engine();
        let mut dst = Value::Record(Record::new("User"));

        let err = engine
            .convert(Direction::WireToDomain, &Value::Int32(5), &mut dst)
            .unwrap_err();
        assert!(matches!(err, ConvertError::NotARecord { actual: "int32" }));
    }

    #[test]
    fn test_non_record_destination_is_structural_error() {
        let engine = engine();
        let src = Value::Record(Record::new("WireUser"));
        let mut dst = Value::Bool(false);

        let err = engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidDestination { actual: "bool" }
        ));
    }

    #[test]
    fn test_nested_record_conversion() {
        let engine = engine();
        let src = Value::Record(
            Record::builder("WireUser")
                .field("id", Value::Int64(1))
                .field("name", Value::String("n".into()))
                .field(
                    "nested",
                    Value::Record(
                        Record::builder("WireNested")
                            .field("code", Value::Int64(42))
                            .build(),
                    ),
                )
                .build(),
        );
        let mut dst = Value::Record(Record::new("User"));

        engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap();

        let nested = dst
            .as_record()
            .unwrap()
            .get("nested")
            .unwrap()
            .as_record()
            .unwrap();
        assert_eq!(nested.type_name, "Nested");
        assert_eq!(nested.get("code"), Some(&Value::Int32(42)));
    }

    #[test]
    fn test_nested_conversion_merges_into_existing_destination() {
        let engine = engine();
        let src = Value::Record(
            Record::builder("WireUser")
                .field(
                    "nested",
                    Value::Record(
                        Record::builder("WireNested")
                            .field("code", Value::Int64(7))
                            .build(),
                    ),
                )
                .build(),
        );

        // Destination already holds a Nested record with a populated field
        // the wire side does not know about.
        let mut dst = Value::Record(
            Record::builder("User")
                .field(
                    "nested",
                    Value::Record(
                        Record::builder("Nested")
                            .field("note", Value::String("keep me".into()))
                            .build(),
                    ),
                )
                .build(),
        );

        engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap();

        let nested = dst
            .as_record()
            .unwrap()
            .get("nested")
            .unwrap()
            .as_record()
            .unwrap();
        assert_eq!(nested.get("code"), Some(&Value::Int32(7)));
        assert_eq!(nested.get("note"), Some(&Value::String("keep me".into())));
    }

    #[test]
    fn test_field_error_names_destination_field() {
        let engine = engine();
        // id is int64 on the wire and int32 in the domain; a string value
        // has no applicable rule for that pair.
        let src = Value::Record(
            Record::builder("WireUser")
                .field("id", Value::String("not a number".into()))
                .build(),
        );
        let mut dst = Value::Record(Record::new("User"));

        let err = engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Field { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_round_trip_preserves_overlapping_fields() {
        let engine = engine();
        let src = Value::Record(
            Record::builder("WireUser")
                .field("id", Value::Int64(123))
                .field("name", Value::String("round".into()))
                .build(),
        );

        let mut domain = Value::Record(Record::new("User"));
        engine
            .convert(Direction::WireToDomain, &src, &mut domain)
            .unwrap();

        let mut back = Value::Record(Record::new("WireUser"));
        engine
            .convert(Direction::DomainToWire, &domain, &mut back)
            .unwrap();

        let rec = back.as_record().unwrap();
        assert_eq!(rec.get("id"), Some(&Value::Int64(123)));
        assert_eq!(rec.get("name"), Some(&Value::String("round".into())));
    }

    #[test]
    fn test_transform_replaces_builtin_coercion() {
        let engine = engine();
        engine
            .context()
            .register_transform("name", |v| match v.as_str() {
                Some(s) => Ok(Value::String(s.to_uppercase())),
                None => Err("expected a string".to_string()),
            });

        let src = Value::Record(
            Record::builder("WireUser")
                .field("name", Value::String("quiet".into()))
                .build(),
        );
        let mut dst = Value::Record(Record::new("User"));
        engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap();

        assert_eq!(
            dst.as_record().unwrap().get("name"),
            Some(&Value::String("QUIET".into()))
        );
    }

    #[test]
    fn test_transform_failure_reports_field() {
        let engine = engine();
        engine
            .context()
            .register_transform("name", |_| Err("nope".to_string()));

        let src = Value::Record(
            Record::builder("WireUser")
                .field("name", Value::String("x".into()))
                .build(),
        );
        let mut dst = Value::Record(Record::new("User"));

        let err = engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Transform { ref field, ref message } if field == "name" && message == "nope"
        ));
    }

    #[test]
    fn test_transform_output_coerced_to_destination_type() {
        let engine = engine();
        // Produces an int64; the destination declares int32.
        engine
            .context()
            .register_transform("id", |v| Ok(Value::Int64(v.as_i64().unwrap_or(0) + 1)));

        let src = Value::Record(
            Record::builder("WireUser")
                .field("id", Value::Int64(41))
                .build(),
        );
        let mut dst = Value::Record(Record::new("User"));
        engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap();

        assert_eq!(dst.as_record().unwrap().get("id"), Some(&Value::Int32(42)));
    }

    #[test]
    fn test_unknown_source_type_converts_nothing() {
        let engine = engine();
        let src = Value::Record(
            Record::builder("Mystery")
                .field("id", Value::Int64(5))
                .build(),
        );
        let mut dst = Value::Record(Record::new("User"));

        engine
            .convert(Direction::WireToDomain, &src, &mut dst)
            .unwrap();
        assert!(dst.as_record().unwrap().is_empty());
    }
}
