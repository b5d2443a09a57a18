//! Serializes a [`Manifest`] back into the document format.

use super::types::Manifest;
use std::fmt::Write;

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value != value.trim()
        || value.contains(':')
        || value.starts_with('#')
        || value.starts_with('"')
        || value.starts_with('\'')
}

fn format_value(value: &str) -> String {
    if !needs_quotes(value) {
        value.to_string()
    } else if value.contains('"') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}

/// Writes the manifest with two-space indentation.
///
/// `parse_manifest(&write_manifest(m)) == m` for every manifest that
/// [`Manifest::new`] accepts.
pub fn write_manifest(manifest: &Manifest) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "latest: {}", format_value(manifest.latest_version()));
    let _ = writeln!(out, "mapversions:");
    for (id, info) in manifest.versions() {
        let _ = writeln!(out, "  {}:", format_value(id));
        let _ = writeln!(out, "    name: {}", format_value(&info.display_name));
        let _ = writeln!(out, "    path: {}", format_value(&info.storage_path));
        let _ = writeln!(out, "    tilecount: {}", info.tile_count);
    }
    out
}
