use thiserror::Error;

/// Errors produced while turning declarations into a slot layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A field declaration that cannot be placed in storage
    #[error("Invalid field spec `{name}`: {reason}")]
    InvalidFieldSpec {
        /// Offending field name (may be empty)
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// A type that does not have a fixed in-place storage footprint
    #[error("Unsupported storage type `{ty}` for field `{name}`")]
    UnsupportedType {
        /// Field the type was declared for
        name: String,
        /// The type as written
        ty: String,
    },

    /// A storage-section statement that could not be parsed
    #[error("Malformed declaration: `{0}`")]
    MalformedDeclaration(String),
}

impl LayoutError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFieldSpec { name: name.to_string(), reason: reason.into() }
    }
}
