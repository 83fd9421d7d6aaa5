//! Identifier validation for rename targets.

use tugstyle_core::error::ServiceError;

use crate::lexer::is_reserved;

/// Check that `name` can stand as a C# identifier.
pub fn validate_identifier(name: &str) -> Result<(), ServiceError> {
    let invalid = |reason: &str| ServiceError::InvalidIdentifier {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("identifier is empty"));
    };
    if !(first.is_alphabetic() || first == '_') {
        return Err(invalid("must start with a letter or underscore"));
    }
    if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || *c == '_')) {
        return Err(invalid(&format!("contains invalid character '{bad}'")));
    }
    if is_reserved(name) {
        return Err(invalid("is a reserved keyword"));
    }
    Ok(())
}
