//! SQLite helper utilities
//!
//! SQLite has no native UUID or timestamp types, so ids are stored as UUID
//! strings and timestamps as RFC 3339 text. These helpers keep the
//! conversions in one place.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use uuid::Uuid;

// ============================================================================
// Id Helpers
// ============================================================================

/// Generate a new primary key
#[inline]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Validate that a string is a UUID (used on ids coming from the API)
pub fn parse_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| anyhow!("Invalid id '{}': {}", s, e))
}

// ============================================================================
// Timestamp Helpers (stored as ISO8601 TEXT in SQLite)
// ============================================================================

/// Get current UTC timestamp as ISO8601 string for SQLite
#[inline]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Parse an ISO8601 string to DateTime
pub fn str_to_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite's datetime() format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
                .map_err(|e| anyhow!("Invalid datetime '{}': {}", s, e))
        })
}

/// Parse an optional datetime string
pub fn str_to_datetime_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(str_to_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Normalize a user supplied datetime to the stored RFC 3339 form
pub fn normalize_datetime_opt(s: Option<&str>) -> Result<Option<String>> {
    Ok(str_to_datetime_opt(s)?.map(|dt| dt.to_rfc3339()))
}

// ============================================================================
// Query Building Helpers
// ============================================================================

/// SQL fragment testing whether a JSON array column contains the bound value
pub fn json_array_contains_sql(column: &str) -> String {
    format!("EXISTS (SELECT 1 FROM json_each({}) WHERE value = ?)", column)
}

/// `?, ?, ?` for an `IN (...)` clause
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
