//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.
//! Enumerations are stored as their string codes.

pub mod activity_log;
pub mod church;
pub mod group;
pub mod new_friend;
pub mod regular_member;
pub mod role;
pub mod user;

/// Parse a stored enum code, falling back to `default` (with a warning)
/// when the column holds a value this build does not know.
pub(crate) fn parse_column<T: std::str::FromStr>(raw: &str, default: T, column: &str) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(column, value = raw, "Unrecognised stored value, using default");
        default
    })
}
