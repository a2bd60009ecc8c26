//! Validation Traits
//!
//! Common payload checks shared by the request types.

use chrono::Datelike;

use crate::error::{ApiError, ApiResult};

/// Earliest release year accepted for albums.
pub const MIN_RELEASE_YEAR: i32 = 1900;

/// Trait for validating non-empty strings.
///
/// # Example
/// ```ignore
/// use openmusic_api::validation::ValidateNonEmpty;
///
/// fn create_album(name: &str) -> ApiResult<()> {
///     name.validate_non_empty("name")?;
///     // ... rest of logic
/// }
/// ```
pub trait ValidateNonEmpty {
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is absent, empty or
    /// whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value is positive (> 0).
    fn validate_positive(&self, field_name: &str) -> ApiResult<()>;

    /// Validate that the value is within an inclusive range.
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

macro_rules! impl_validate_range {
    ($($t:ty),*) => {
        $(
            impl ValidateRange for $t {
                fn validate_positive(&self, field_name: &str) -> ApiResult<()> {
                    if *self <= 0 as $t {
                        return Err(ApiError::invalid_range(field_name, 1, <$t>::MAX));
                    }
                    Ok(())
                }

                fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()> {
                    if *self < min || *self > max {
                        return Err(ApiError::invalid_range(field_name, min, max));
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_range!(i32, i64);

/// Require a field and hand back its value.
pub fn required<T>(value: Option<T>, field_name: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::missing_field(field_name))
}

/// Album years run from [`MIN_RELEASE_YEAR`] to the current year.
pub fn validate_release_year(year: i32) -> ApiResult<()> {
    year.validate_range("year", MIN_RELEASE_YEAR, chrono::Utc::now().year())
}

/// Structural email check: one `@`, a non-empty local part, a dotted
/// domain and no whitespace.
pub fn validate_email(value: &str, field_name: &str) -> ApiResult<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::invalid_format(field_name, "email address"));
    }
    Ok(())
}
