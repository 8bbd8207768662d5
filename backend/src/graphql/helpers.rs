// Helper functions shared across GraphQL query/mutation modules.

use async_graphql::{ErrorExtensions, MaybeUndefined};
use chrono::{DateTime, Utc};

use crate::db::sqlite_helpers::{parse_id, str_to_datetime_opt};

fn coded(message: impl Into<String>, code: &'static str) -> async_graphql::Error {
    async_graphql::Error::new(message.into()).extend_with(|_, e| e.set("code", code))
}

pub(crate) fn forbidden(message: impl Into<String>) -> async_graphql::Error {
    coded(message, "FORBIDDEN")
}

pub(crate) fn not_found(what: &str, id: &str) -> async_graphql::Error {
    coded(format!("{} {} not found", what, id), "NOT_FOUND")
}

pub(crate) fn bad_input(message: impl Into<String>) -> async_graphql::Error {
    coded(message, "BAD_USER_INPUT")
}

/// Repository/database failures; logged with full detail
pub(crate) fn internal(e: anyhow::Error) -> async_graphql::Error {
    tracing::error!(error = ?e, "Resolver failed");
    async_graphql::Error::new(e.to_string())
}

/// Reject ids that are not UUIDs before they reach the database
pub(crate) fn validate_id(id: &str) -> async_graphql::Result<()> {
    parse_id(id).map(|_| ()).map_err(|e| bad_input(e.to_string()))
}

/// `undefined` leaves a column unchanged, `null` clears it
pub(crate) fn nullable_update<T>(value: MaybeUndefined<T>) -> Option<Option<T>> {
    match value {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(v) => Some(Some(v)),
    }
}

pub(crate) fn parse_datetime(value: Option<&str>) -> async_graphql::Result<Option<DateTime<Utc>>> {
    str_to_datetime_opt(value).map_err(|e| bad_input(e.to_string()))
}

/// An assignment's end date must not precede its start date
pub(crate) fn validate_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> async_graphql::Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => {
            Err(bad_input("End date must not be before start date"))
        }
        _ => Ok(()),
    }
}

pub(crate) fn validate_grade(grade: Option<i32>) -> async_graphql::Result<()> {
    match grade {
        Some(g) if !(1..=10).contains(&g) => Err(bad_input("Grade must be between 1 and 10")),
        _ => Ok(()),
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> async_graphql::Result<()> {
    if value.trim().is_empty() {
        Err(bad_input(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_nullable_update() {
        assert_eq!(nullable_update::<String>(MaybeUndefined::Undefined), None);
        assert_eq!(nullable_update::<String>(MaybeUndefined::Null), Some(None));
        assert_eq!(
            nullable_update(MaybeUndefined::Value("x".to_string())),
            Some(Some("x".to_string()))
        );
    }

    #[test]
    fn test_date_range() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert!(validate_date_range(Some(start), Some(end)).is_ok());
        assert!(validate_date_range(Some(start), Some(start)).is_ok());
        assert!(validate_date_range(Some(end), Some(start)).is_err());
        assert!(validate_date_range(None, Some(start)).is_ok());
    }

    #[test]
    fn test_grade_bounds() {
        assert!(validate_grade(None).is_ok());
        assert!(validate_grade(Some(1)).is_ok());
        assert!(validate_grade(Some(10)).is_ok());
        assert!(validate_grade(Some(0)).is_err());
        assert!(validate_grade(Some(11)).is_err());
    }
}
