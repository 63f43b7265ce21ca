//! Validation utilities for the Inverter Tracking Platform
//!
//! Includes Pakistan-specific phone validation for dealer and customer
//! contact fields.

// ============================================================================
// Identifier Validations
// ============================================================================

/// Validate a unit serial number: 4-30 characters, uppercase letters,
/// digits and dashes (e.g., "SN-001", "NX3K-2025-00042")
pub fn validate_serial_number(serial: &str) -> Result<(), &'static str> {
    if serial.len() < 4 {
        return Err("Serial number must be at least 4 characters");
    }
    if serial.len() > 30 {
        return Err("Serial number must be at most 30 characters");
    }
    if !serial
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Serial number must be uppercase alphanumeric with dashes only");
    }
    Ok(())
}

/// Validate a spare-part code: 2-20 uppercase alphanumeric/dash characters
pub fn validate_part_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 || code.len() > 20 {
        return Err("Part code must be 2-20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Part code must be uppercase alphanumeric with dashes only");
    }
    Ok(())
}

/// Format a year-scoped part dispatch number: PD-YYYY-NNNN
pub fn format_part_dispatch_number(year: i32, sequence: i64) -> String {
    format!("PD-{}-{:04}", year, sequence)
}

/// Validate a part dispatch number is in PD-YYYY-NNNN form
pub fn validate_part_dispatch_number(number: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = number.split('-').collect();

    if parts.len() != 3 {
        return Err("Dispatch number must be in format PD-YYYY-NNNN");
    }
    if parts[0] != "PD" {
        return Err("Dispatch number must start with 'PD'");
    }
    if parts[1].len() != 4 || !parts[1].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid year in dispatch number");
    }
    if parts[2].len() < 4 || !parts[2].chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid sequence number in dispatch number");
    }
    Ok(())
}

/// Validate a dispatch/transfer quantity is positive
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

// ============================================================================
// Pakistan-Specific Validations
// ============================================================================

/// Validate Pakistani phone number format
/// Accepts: 03001234567, 0300-1234567, +923001234567
pub fn validate_pk_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Local mobile: 11 digits starting with 03
    if digits.len() == 11 && digits.starts_with("03") {
        return Ok(());
    }
    // Without leading zero: 10 digits starting with 3
    if digits.len() == 10 && digits.starts_with('3') {
        return Ok(());
    }
    // International format with country code: 12 digits starting with 92
    if digits.len() == 12 && digits.starts_with("92") {
        return Ok(());
    }

    Err("Invalid Pakistani phone number format")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Identifier Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_serial_number_valid() {
        assert!(validate_serial_number("SN-001").is_ok());
        assert!(validate_serial_number("NX3K-2025-00042").is_ok());
        assert!(validate_serial_number("ABCD").is_ok());
    }

    #[test]
    fn test_validate_serial_number_invalid() {
        assert!(validate_serial_number("SN1").is_err()); // Too short
        assert!(validate_serial_number(&"A".repeat(31)).is_err()); // Too long
        assert!(validate_serial_number("sn-001").is_err()); // Lowercase
        assert!(validate_serial_number("SN_001").is_err()); // Underscore
    }

    #[test]
    fn test_validate_part_code_valid() {
        assert!(validate_part_code("P-10").is_ok());
        assert!(validate_part_code("IGBT-45A").is_ok());
    }

    #[test]
    fn test_validate_part_code_invalid() {
        assert!(validate_part_code("P").is_err()); // Too short
        assert!(validate_part_code(&"P".repeat(21)).is_err()); // Too long
        assert!(validate_part_code("p-10").is_err()); // Lowercase
    }

    #[test]
    fn test_format_part_dispatch_number() {
        assert_eq!(format_part_dispatch_number(2025, 1), "PD-2025-0001");
        assert_eq!(format_part_dispatch_number(2025, 42), "PD-2025-0042");
        assert_eq!(format_part_dispatch_number(2025, 10000), "PD-2025-10000");
    }

    #[test]
    fn test_validate_part_dispatch_number_valid() {
        assert!(validate_part_dispatch_number("PD-2025-0001").is_ok());
        assert!(validate_part_dispatch_number("PD-2024-9999").is_ok());
        assert!(validate_part_dispatch_number("PD-2025-10000").is_ok());
    }

    #[test]
    fn test_validate_part_dispatch_number_invalid() {
        assert!(validate_part_dispatch_number("PD-25-0001").is_err());
        assert!(validate_part_dispatch_number("XX-2025-0001").is_err());
        assert!(validate_part_dispatch_number("PD20250001").is_err());
        assert!(validate_part_dispatch_number("PD-2025-001").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(500).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.com.pk").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    // ========================================================================
    // Pakistan-Specific Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_pk_phone_valid() {
        // Standard mobile
        assert!(validate_pk_phone("03001234567").is_ok());
        // With dashes
        assert!(validate_pk_phone("0300-1234567").is_ok());
        // Without leading zero
        assert!(validate_pk_phone("3001234567").is_ok());
        // International format
        assert!(validate_pk_phone("+923001234567").is_ok());
        assert!(validate_pk_phone("923001234567").is_ok());
    }

    #[test]
    fn test_validate_pk_phone_invalid() {
        assert!(validate_pk_phone("12345").is_err());
        assert!(validate_pk_phone("0412345678901").is_err());
        assert!(validate_pk_phone("abcdefghijk").is_err());
    }
}
