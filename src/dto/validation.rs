//! Validation helpers for DTOs.

use validator::ValidationError;

/// Earliest year the generator accepts.
pub const MIN_TARGET_YEAR: i32 = 2020;
/// Latest year the generator accepts.
pub const MAX_TARGET_YEAR: i32 = 2100;

/// Validates that a schedule target year falls in the supported window.
///
/// # Examples
///
/// ```ignore
/// validate_target_year(2026) // Ok
/// validate_target_year(1999) // Err - before the supported window
/// validate_target_year(2150) // Err - after the supported window
/// ```
pub fn validate_target_year(year: i32) -> Result<(), ValidationError> {
    if !(MIN_TARGET_YEAR..=MAX_TARGET_YEAR).contains(&year) {
        let mut err = ValidationError::new("target_year_range");
        err.message = Some(
            format!("Target year must be between {MIN_TARGET_YEAR} and {MAX_TARGET_YEAR} (got {year})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}
