//! Document value model.
//!
//! Documents are flat JSON objects keyed by property name. Nested values are
//! plain JSON and are addressed with dotted paths in partial updates.

use std::collections::BTreeMap;

pub use serde_json::Value;

/// A document body as the store sees it: property name -> value.
pub type DocumentData = serde_json::Map<String, Value>;

/// Values keyed by field name (or by a field-rooted dotted path).
pub type FieldValues = BTreeMap<String, Value>;

/// Separator between segments of a nested document path.
pub const PATH_SEPARATOR: char = '.';

/// Splits `path` on the first `separator`, returning the root segment and the
/// remainder (without the separator) if there was one.
pub fn split_path(path: &str, separator: char) -> (&str, Option<&str>) {
    match path.split_once(separator) {
        Some((root, rest)) => (root, Some(rest)),
        None => (path, None),
    }
}
