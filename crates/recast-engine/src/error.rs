//! Error types for record conversion.

/// Error type for single-record and batch conversion.
///
/// Two classes share this enum. Structural errors mean the call itself was
/// malformed (absent source, wrong outer shape) and no partial work happened.
/// Field-scoped errors abort one record's conversion and carry the field name
/// (and element index, for sequences) they occurred under; each nesting level
/// adds exactly one wrapper and otherwise passes the inner error through
/// unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvertError {
    /// Source value is null or missing
    #[error("source value is absent")]
    MissingSource,

    /// Source value has the wrong outer shape
    #[error("source is not a record (got {actual})")]
    NotARecord {
        /// Variant name of the offending value
        actual: &'static str,
    },

    /// Destination value is not a record
    #[error("destination is not a record value (got {actual})")]
    InvalidDestination {
        /// Variant name of the offending value
        actual: &'static str,
    },

    /// Batch input is not a list
    #[error("batch input is not a sequence (got {actual})")]
    NotASequence {
        /// Variant name of the offending value
        actual: &'static str,
    },

    /// A field's conversion failed
    #[error("field '{field}': {source}")]
    Field {
        /// Destination field name
        field: String,
        /// Underlying failure
        #[source]
        source: Box<ConvertError>,
    },

    /// A sequence element's conversion failed
    #[error("element {index}: {source}")]
    Element {
        /// Element index in the source sequence
        index: usize,
        /// Underlying failure
        #[source]
        source: Box<ConvertError>,
    },

    /// No coercion rule applies to the value/type pair
    #[error("no conversion from {from} to {to}")]
    Incompatible {
        /// Source value or type description
        from: String,
        /// Destination type description
        to: String,
    },

    /// A registered per-field transform failed
    #[error("transform for field '{field}' failed: {message}")]
    Transform {
        /// Destination field name the transform is registered under
        field: String,
        /// Transform-supplied failure description
        message: String,
    },

    /// Batch deadline expired before this item was attempted
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A batch worker task aborted
    #[error("conversion task aborted: {0}")]
    TaskFailed(String),
}

impl ConvertError {
    /// Whether this error is structural: the call was malformed and no
    /// conversion work was attempted.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingSource
                | Self::NotARecord { .. }
                | Self::InvalidDestination { .. }
                | Self::NotASequence { .. }
        )
    }

    /// Wrap an error with the destination field it occurred under.
    pub(crate) fn in_field(self, field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Wrap an error with the sequence element index it occurred under.
    pub(crate) fn at_element(self, index: usize) -> Self {
        Self::Element {
            index,
            source: Box::new(self),
        }
    }

    /// Build an `Incompatible` error from display-able endpoints.
    pub(crate) fn incompatible(from: impl ToString, to: impl ToString) -> Self {
        Self::Incompatible {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
