//! Identifier grammars for physical table names.
//!
//! Reference tables follow `<logicalName>_<geometrySuffix>` (one physical
//! table per geometry kind of the same logical layer). Current tables
//! follow `<prefix><logicalName>` with a representation prefix.

/// Returns the logical layer name of a reference table.
///
/// Truncates at the first `_`; a name without an underscore is already
/// logical. `"ROADS_Multiline"` → `"ROADS"`, `"ROADS"` → `"ROADS"`.
#[must_use]
pub fn logical_name(table: &str) -> &str {
    match table.find('_') {
        Some(index) => &table[..index],
        None => table,
    }
}

/// Returns the geometry suffix of a reference table, if any.
///
/// The remainder after the first `_`: `"ROADS_Multiline"` → `Some("Multiline")`,
/// `"ROADS"` → `None`. Further underscores stay in the suffix.
#[must_use]
pub fn geometry_suffix(table: &str) -> Option<&str> {
    table.find('_').map(|index| &table[index + 1..])
}

/// Strips a representation prefix from a current table name.
///
/// Returns `None` when the table does not carry the prefix.
#[must_use]
pub fn strip_prefix<'a>(table: &'a str, prefix: &str) -> Option<&'a str> {
    table.strip_prefix(prefix)
}
