//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::id::EntityId;

/// Validates that an identifier is 24 hexadecimal characters.
///
/// # Examples
///
/// ```ignore
/// validate_entity_id("65a1f0c2e4b0a1b2c3d4e5f6") // Ok
/// validate_entity_id("65a1f0c2")                 // Err - too short
/// validate_entity_id("65a1f0c2e4b0a1b2c3d4e5fz") // Err - not hex
/// ```
pub fn validate_entity_id(id: &str) -> Result<(), ValidationError> {
    EntityId::parse(id).map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("entity_id_format");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entity_id_valid() {
        assert!(validate_entity_id("65a1f0c2e4b0a1b2c3d4e5f6").is_ok());
        assert!(validate_entity_id("65A1F0C2E4B0A1B2C3D4E5F6").is_ok());
    }

    #[test]
    fn test_validate_entity_id_invalid() {
        assert!(validate_entity_id("65a1f0c2").is_err()); // too short
        assert!(validate_entity_id("65a1f0c2e4b0a1b2c3d4e5fz").is_err()); // invalid hex
        assert!(validate_entity_id("").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("ana").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
