//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! compartidas entre los request DTOs.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validar que un decimal sea no negativo (precio, distancia)
pub fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if clean_phone.len() < 10 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    // Formato básico: ABC-1234 o similar
    let clean_plate = value.replace([' ', '-', '_'], "");
    if clean_plate.len() < 5 || clean_plate.len() > 10 {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_negative_decimal() {
        assert!(validate_non_negative_decimal(&Decimal::from(450)).is_ok());
        assert!(validate_non_negative_decimal(&Decimal::ZERO).is_ok());
        assert!(validate_non_negative_decimal(&Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0917-123-4567").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("ABC-1234").is_ok());
        assert!(validate_license_plate("A").is_err());
        assert!(validate_license_plate("ABCDEFGHIJK").is_err());
    }
}
