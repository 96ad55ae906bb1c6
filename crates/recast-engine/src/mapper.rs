//! Field correspondence resolution between two record descriptors.

use recast_core::RecordDescriptor;
use tracing::debug;

/// How a correspondence was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrigin {
    /// Explicit runtime override registered on the context
    Override,

    /// Declarative `maps_to` annotation on a field declaration
    Annotation,

    /// Source and destination fields share a name
    NameMatch,
}

/// A resolved pairing between one source field and one destination field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCorrespondence {
    /// Source field name
    pub source: String,

    /// Source field position in its descriptor
    pub source_pos: usize,

    /// Destination field name
    pub dest: String,

    /// Destination field position in its descriptor
    pub dest_pos: usize,

    /// How the pairing was established
    pub origin: MatchOrigin,
}

/// Resolve the ordered correspondence set for a descriptor pair.
///
/// Destination fields are visited in declaration order, and for each the
/// first applicable rule wins:
///
/// 1. an explicit override `(source field, destination field)` — the most
///    recently registered override for a destination field wins;
/// 2. a `maps_to` annotation, on either side: the destination field may name
///    its source counterpart, or a source field may name this destination;
/// 3. a source field with the same name.
///
/// A rule whose named source field does not exist in the source descriptor is
/// ignored and resolution falls through to the next rule. Destination fields
/// no rule can resolve are omitted from the set.
pub(crate) fn resolve(
    src: &RecordDescriptor,
    dst: &RecordDescriptor,
    overrides: &[(String, String)],
) -> Vec<FieldCorrespondence> {
    let mut correspondences = Vec::with_capacity(dst.len());

    for dst_field in &dst.fields {
        let overridden = overrides
            .iter()
            .rev()
            .find(|(_, dest)| dest == &dst_field.name)
            .and_then(|(source, _)| src.field(source));

        let annotated = || {
            dst_field
                .maps_to
                .as_deref()
                .and_then(|name| src.field(name))
                .or_else(|| {
                    src.fields
                        .iter()
                        .find(|f| f.maps_to.as_deref() == Some(dst_field.name.as_str()))
                })
        };

        let (src_field, origin) = if let Some(found) = overridden {
            (found, MatchOrigin::Override)
        } else if let Some(found) = annotated() {
            (found, MatchOrigin::Annotation)
        } else if let Some(found) = src.field(&dst_field.name) {
            (found, MatchOrigin::NameMatch)
        } else {
            continue;
        };

        correspondences.push(FieldCorrespondence {
            source: src_field.name.clone(),
            source_pos: src_field.position,
            dest: dst_field.name.clone(),
            dest_pos: dst_field.position,
            origin,
        });
    }

    debug!(
        src = %src.type_name,
        dst = %dst.type_name,
        matched = correspondences.len(),
        of = dst.len(),
        "resolved field correspondences"
    );

    correspondences
}
