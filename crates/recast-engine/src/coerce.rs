//! Per-field value coercion rules.
//!
//! Given a matched field pair and a source value, [`TypeCoercer`] applies the
//! first applicable rule:
//!
//! 1. identical representation: direct copy (composite types containing
//!    record references always recurse instead, since a type name only has
//!    meaning within its own schema side);
//! 2. timestamp ↔ wire-timestamp bridging, when the context enables it;
//! 3. integer-family conversion: widening sign-extends, narrowing truncates,
//!    and signed↔unsigned reinterprets the bits with no range check (`as`
//!    cast semantics);
//! 4. convertible scalars: float widths, integer↔float, string↔bytes,
//!    uuid↔string;
//! 5. absent sources leave the destination unset (enforced by the engine
//!    before coercion is invoked);
//! 6. sequences: element-wise recursion into a newly allocated list of equal
//!    length, failing the whole field on the first bad element;
//! 7. nested records: recursion through the engine, merging into an existing
//!    destination record of the right type instead of reallocating.

use crate::engine::{ConversionEngine, Direction};
use crate::error::ConvertError;
use chrono::DateTime;
use recast_core::{FieldType, Record, Value};
use uuid::Uuid;

/// Applies the coercion rules for one engine + direction.
pub(crate) struct TypeCoercer<'a> {
    engine: &'a ConversionEngine,
    direction: Direction,
}

impl<'a> TypeCoercer<'a> {
    pub(crate) fn new(engine: &'a ConversionEngine, direction: Direction) -> Self {
        Self { engine, direction }
    }

    /// Coerce `src` (declared as `src_ty`) into `slot` (declared as
    /// `dst_ty`).
    ///
    /// `slot` holds the destination field's existing value, or `Null` when
    /// the field is unset. A null source leaves the slot untouched.
    pub(crate) fn coerce(
        &self,
        src: &Value,
        src_ty: &FieldType,
        dst_ty: &FieldType,
        slot: &mut Value,
    ) -> Result<(), ConvertError> {
        if src.is_null() {
            return Ok(());
        }

        // Rule 1: identical representation.
        if src_ty == dst_ty && !contains_record(src_ty) {
            *slot = src.clone();
            return Ok(());
        }

        // Rule 2: timestamp representation bridging.
        if matches!(
            (src_ty, dst_ty),
            (FieldType::Timestamp, FieldType::WireTimestamp)
                | (FieldType::WireTimestamp, FieldType::Timestamp)
        ) && self.engine.context().timestamp_coercion()
        {
            *slot = bridge_timestamp(src, dst_ty)?;
            return Ok(());
        }

        // Rules 3 and 4: numeric family and convertible scalars.
        if let Some(converted) = coerce_scalar(src, dst_ty)? {
            *slot = converted;
            return Ok(());
        }

        // Rule 6: sequences.
        if let (
            FieldType::List { element: src_elem },
            FieldType::List { element: dst_elem },
            Value::List(items),
        ) = (src_ty, dst_ty, src)
        {
            let mut converted = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let mut element = Value::Null;
                self.coerce(item, src_elem, dst_elem, &mut element)
                    .map_err(|e| e.at_element(index))?;
                converted.push(element);
            }
            *slot = Value::List(converted);
            return Ok(());
        }

        // Rule 7: nested records.
        if let (FieldType::Record { name }, Value::Record(rec)) = (dst_ty, src) {
            return self.coerce_record(rec, name, slot);
        }

        Err(ConvertError::incompatible(src.kind(), dst_ty))
    }

    /// Coerce a transform's output into the destination type.
    ///
    /// Transforms replace built-in coercion, so there is no declared source
    /// type; one pass runs against the type inferred from the produced value.
    pub(crate) fn coerce_inferred(
        &self,
        src: &Value,
        dst_ty: &FieldType,
        slot: &mut Value,
    ) -> Result<(), ConvertError> {
        let src_ty = value_type(src, dst_ty);
        self.coerce(src, &src_ty, dst_ty, slot)
    }

    fn coerce_record(
        &self,
        src: &Record,
        dst_type: &str,
        slot: &mut Value,
    ) -> Result<(), ConvertError> {
        match slot {
            // Present destination: recurse into the existing allocation.
            Value::Record(existing) if existing.type_name == dst_type => {
                self.engine.convert_record(self.direction, src, existing)
            }
            // Absent destination: allocate, then recurse.
            _ => {
                let mut fresh = Record::new(dst_type);
                self.engine.convert_record(self.direction, src, &mut fresh)?;
                *slot = Value::Record(fresh);
                Ok(())
            }
        }
    }
}

/// Whether a type contains a record reference anywhere.
fn contains_record(ty: &FieldType) -> bool {
    match ty {
        FieldType::Record { .. } => true,
        FieldType::List { element } => contains_record(element),
        _ => false,
    }
}

/// Infer a field type from a value, using the destination type as the hint
/// for cases the value alone cannot decide.
fn value_type(value: &Value, hint: &FieldType) -> FieldType {
    match value {
        Value::Null => hint.clone(),
        Value::Bool(_) => FieldType::Bool,
        Value::Int8(_) => FieldType::Int8,
        Value::Int16(_) => FieldType::Int16,
        Value::Int32(_) => FieldType::Int32,
        Value::Int64(_) => FieldType::Int64,
        Value::UInt8(_) => FieldType::UInt8,
        Value::UInt16(_) => FieldType::UInt16,
        Value::UInt32(_) => FieldType::UInt32,
        Value::UInt64(_) => FieldType::UInt64,
        Value::Float32(_) => FieldType::Float32,
        Value::Float64(_) => FieldType::Float64,
        Value::String(_) => FieldType::String,
        Value::Bytes(_) => FieldType::Bytes,
        Value::Uuid(_) => FieldType::Uuid,
        Value::Timestamp(_) => FieldType::Timestamp,
        Value::WireTimestamp { .. } => FieldType::WireTimestamp,
        Value::List(items) => {
            let element_hint = match hint {
                FieldType::List { element } => element,
                other => other,
            };
            let element = items
                .first()
                .map(|first| value_type(first, element_hint))
                .unwrap_or_else(|| element_hint.clone());
            FieldType::list(element)
        }
        Value::Record(rec) => FieldType::record(rec.type_name.clone()),
    }
}

/// Bridge between the two timestamp representations.
fn bridge_timestamp(src: &Value, dst_ty: &FieldType) -> Result<Value, ConvertError> {
    match (src, dst_ty) {
        (Value::Timestamp(ts), FieldType::WireTimestamp) => Ok(Value::WireTimestamp {
            seconds: ts.timestamp(),
            nanos: ts.timestamp_subsec_nanos(),
        }),
        (Value::WireTimestamp { seconds, nanos }, FieldType::Timestamp) => {
            DateTime::from_timestamp(*seconds, *nanos)
                .map(Value::Timestamp)
                .ok_or_else(|| {
                    ConvertError::incompatible(
                        format!("wire_timestamp({seconds}s, {nanos}ns)"),
                        FieldType::Timestamp,
                    )
                })
        }
        _ => Err(ConvertError::incompatible(src.kind(), dst_ty)),
    }
}

/// Rules 3 and 4: numeric family and convertible scalars.
///
/// `Ok(None)` means no scalar rule applies; `Err` means a rule applied and
/// failed (invalid UTF-8, unparsable UUID).
fn coerce_scalar(src: &Value, dst_ty: &FieldType) -> Result<Option<Value>, ConvertError> {
    // Integer family: widen, narrow, and reinterpret through a 64-bit
    // intermediate. Signed sources sign-extend, the destination cast
    // truncates; signed↔unsigned keeps the bits.
    if dst_ty.is_integer() {
        if let Some(bits) = int_bits(src) {
            return Ok(int_from_bits(bits, dst_ty));
        }
        if let Some(f) = src.as_f64() {
            return Ok(float_to_int(f, dst_ty));
        }
    }

    if dst_ty.is_float() {
        let numeric = src
            .as_f64()
            .or_else(|| src.as_i64().map(|i| i as f64))
            .or_else(|| src.as_u64().map(|u| u as f64));
        if let Some(f) = numeric {
            return Ok(Some(match dst_ty {
                FieldType::Float32 => Value::Float32(f as f32),
                _ => Value::Float64(f),
            }));
        }
    }

    match (src, dst_ty) {
        (Value::String(s), FieldType::Bytes) => Ok(Some(Value::Bytes(s.clone().into_bytes()))),
        (Value::Bytes(b), FieldType::String) => String::from_utf8(b.clone())
            .map(|s| Some(Value::String(s)))
            .map_err(|_| ConvertError::incompatible("non-utf8 bytes", FieldType::String)),
        (Value::Uuid(u), FieldType::String) => Ok(Some(Value::String(u.to_string()))),
        (Value::String(s), FieldType::Uuid) => Uuid::parse_str(s)
            .map(|u| Some(Value::Uuid(u)))
            .map_err(|_| ConvertError::incompatible(format!("string \"{s}\""), FieldType::Uuid)),
        _ => Ok(None),
    }
}

/// Extract an integer value as raw 64-bit content. Signed values
/// sign-extend, unsigned values zero-extend.
fn int_bits(value: &Value) -> Option<u64> {
    match value {
        Value::Int8(v) => Some(*v as i64 as u64),
        Value::Int16(v) => Some(*v as i64 as u64),
        Value::Int32(v) => Some(*v as i64 as u64),
        Value::Int64(v) => Some(*v as u64),
        Value::UInt8(v) => Some(*v as u64),
        Value::UInt16(v) => Some(*v as u64),
        Value::UInt32(v) => Some(*v as u64),
        Value::UInt64(v) => Some(*v),
        _ => None,
    }
}

/// Build an integer value of the destination width from raw 64-bit content.
fn int_from_bits(bits: u64, dst_ty: &FieldType) -> Option<Value> {
    match dst_ty {
        FieldType::Int8 => Some(Value::Int8(bits as i8)),
        FieldType::Int16 => Some(Value::Int16(bits as i16)),
        FieldType::Int32 => Some(Value::Int32(bits as i32)),
        FieldType::Int64 => Some(Value::Int64(bits as i64)),
        FieldType::UInt8 => Some(Value::UInt8(bits as u8)),
        FieldType::UInt16 => Some(Value::UInt16(bits as u16)),
        FieldType::UInt32 => Some(Value::UInt32(bits as u32)),
        FieldType::UInt64 => Some(Value::UInt64(bits)),
        _ => None,
    }
}

/// Float to integer, saturating at the destination bounds (`as` cast
/// semantics).
fn float_to_int(f: f64, dst_ty: &FieldType) -> Option<Value> {
    match dst_ty {
        FieldType::Int8 => Some(Value::Int8(f as i8)),
        FieldType::Int16 => Some(Value::Int16(f as i16)),
        FieldType::Int32 => Some(Value::Int32(f as i32)),
        FieldType::Int64 => Some(Value::Int64(f as i64)),
        FieldType::UInt8 => Some(Value::UInt8(f as u8)),
        FieldType::UInt16 => Some(Value::UInt16(f as u16)),
        FieldType::UInt32 => Some(Value::UInt32(f as u32)),
        FieldType::UInt64 => Some(Value::UInt64(f as u64)),
        _ => None,
    }
}
