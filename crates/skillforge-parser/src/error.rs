use thiserror::Error;

/// Hard parse failures (spec §4.1). Both kinds carry a human-readable
/// message; callers that need machine-matchable detail should match on
/// the variant, not parse the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed skill file: {0}")]
    MalformedFile(String),
    #[error("schema violation: {0}")]
    SchemaViolation(String),
}

/// Non-fatal findings attached to a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    ProgressiveDisclosure(String),
    CompatibilityShape(String),
    SecurityScan(String),
}

impl From<ParseError> for skillforge_core::SkillforgeError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::MalformedFile(msg) => skillforge_core::SkillforgeError::MalformedFile(msg),
            ParseError::SchemaViolation(msg) => skillforge_core::SkillforgeError::SchemaViolation(msg),
        }
    }
}
