//! Lookup errors for element trees

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("There is no element with the tag \"{tag}\"")]
    NotFound { tag: String },
}

impl ElementError {
    pub fn not_found(tag: &str) -> Self {
        Self::NotFound {
            tag: tag.to_string(),
        }
    }

    /// The tag that was requested
    pub fn tag(&self) -> &str {
        match self {
            Self::NotFound { tag } => tag,
        }
    }
}
