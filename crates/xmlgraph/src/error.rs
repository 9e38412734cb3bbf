//! Error types for object graph serialization and deserialization.
//!
//! Every failure surfaced by the engine is one [`XmlGraphError`]. The write
//! path reports anything that goes wrong during the walk as a single
//! [`XmlGraphError::MalformedDocument`] that carries the original cause; the
//! read path reports structural problems, reconstruction failures and value
//! conversion failures as distinct variants.
//!
//! | Variant | Raised by | Meaning |
//! |---------|-----------|---------|
//! | `MalformedDocument` | writer | any failure while walking the hierarchy |
//! | `UnsupportedDeserialization` | reader | document shape cannot be reconstructed |
//! | `Reconstruction` | reader | no constructor or factory matches the captured names |
//! | `Conversion` | reader | a captured string cannot become the target type |
//! | `Cycle` / `DepthExceeded` | builder | the object graph is self-referencing or too deep |

/// A value could not be converted from its XML text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {value:?} to `{target}`: {reason}")]
pub struct ConversionError {
    /// Type path of the requested target type.
    pub target: &'static str,
    /// The offending text.
    pub value: String,
    /// Why the conversion failed.
    pub reason: String,
}

impl ConversionError {
    /// Creates a conversion error for target type `T`.
    pub fn new<T: ?Sized>(value: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            target: std::any::type_name::<T>(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Error type for object graph (de)serialization.
#[derive(Debug, thiserror::Error)]
pub enum XmlGraphError {
    /// A failure occurred while writing the document.
    #[error("malformed document while writing `{root_type}` at `{path}` ({context}): {source}")]
    MalformedDocument {
        /// Type path of the value handed to the writer.
        root_type: &'static str,
        /// Member path of the node that failed, e.g. `Order.lines.Item[2]`.
        path: String,
        /// Call diagnostics (root name override, configuration).
        context: String,
        /// The original failure.
        #[source]
        source: Box<XmlGraphError>,
    },

    /// The document has a shape the reader cannot reconstruct.
    #[error("cannot deserialize `{type_name}`: {reason}")]
    UnsupportedDeserialization {
        /// Type path of the requested type.
        type_name: &'static str,
        /// Description of the unsupported shape.
        reason: String,
        /// Underlying failure, if any.
        #[source]
        source: Option<Box<XmlGraphError>>,
    },

    /// No constructor or static factory matches the captured names.
    #[error("no suitable constructor or factory for `{type_name}` matching [{}]", .captured.join(", "))]
    Reconstruction {
        /// Type path of the requested type.
        type_name: &'static str,
        /// Names captured from the document.
        captured: Vec<String>,
    },

    /// A captured value could not be converted to its member or parameter type.
    #[error("cannot convert `{name}`: {source}")]
    Conversion {
        /// Captured name (attribute, element or item position).
        name: String,
        /// The conversion failure.
        #[source]
        source: ConversionError,
    },

    /// The object graph references itself.
    #[error("cycle detected at `{path}` (value of type `{type_name}` is already being written)")]
    Cycle {
        /// Type path of the repeated value.
        type_name: &'static str,
        /// Member path where the cycle closed.
        path: String,
    },

    /// The object graph is nested deeper than the configured limit.
    #[error("object graph exceeds the maximum depth of {limit} at `{path}`")]
    DepthExceeded {
        /// Configured limit.
        limit: usize,
        /// Member path where the limit was hit.
        path: String,
    },

    /// XML syntax or writer error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute in the input document.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Unknown or malformed entity reference in the input document.
    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// IO error during serialization/deserialization
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Custom error message
    #[error("{0}")]
    Custom(String),
}

impl XmlGraphError {
    /// Creates an unsupported-deserialization error without an underlying cause.
    pub fn unsupported<T: ?Sized>(reason: impl Into<String>) -> Self {
        XmlGraphError::UnsupportedDeserialization {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Returns true for the read-path shape error.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, XmlGraphError::UnsupportedDeserialization { .. })
    }

    /// Returns true for write-path failures.
    pub fn is_malformed(&self) -> bool {
        matches!(self, XmlGraphError::MalformedDocument { .. })
    }
}

impl From<String> for XmlGraphError {
    fn from(msg: String) -> Self {
        XmlGraphError::Custom(msg)
    }
}

impl From<&str> for XmlGraphError {
    fn from(msg: &str) -> Self {
        XmlGraphError::Custom(msg.to_string())
    }
}

/// Result type alias for object graph operations
pub type Result<T> = std::result::Result<T, XmlGraphError>;
