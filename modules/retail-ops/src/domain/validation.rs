use super::error::DomainError;

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_TEXT_LEN: usize = 2000;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Trimmed, non-empty, at most `max` characters.
///
/// # Errors
/// `Validation` on `field` otherwise.
pub fn required(field: &str, value: &str, max: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    bounded(field, value, max)?;
    Ok(value.to_owned())
}

/// Blank becomes `None`; otherwise trimmed and bounded.
///
/// # Errors
/// `Validation` on `field` when too long.
pub fn optional(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, DomainError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            bounded(field, v, max)?;
            Ok(Some(v.to_owned()))
        }
    }
}

fn bounded(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("exceeds maximum length of {max}"),
        ));
    }
    Ok(())
}

/// # Errors
/// `Validation` on `field` for negative values.
pub fn non_negative(field: &str, value: i64) -> Result<i64, DomainError> {
    if value < 0 {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(value)
}

/// # Errors
/// `Validation` outside `MIN_RATING..=MAX_RATING`.
pub fn rating(value: i32) -> Result<i32, DomainError> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(DomainError::validation(
            "rating",
            format!("must be between {MIN_RATING} and {MAX_RATING}"),
        ));
    }
    Ok(value)
}
