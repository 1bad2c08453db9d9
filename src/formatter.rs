//! Canonical serialization of parsed bibliographies.
//!
//! This module handles sorting entries by citation key and writing them
//! back out in the normalized textual layout.

use crate::parser::Entry;

/// Sorts entries by citation key, ordinal (byte-wise) ascending.
///
/// The sort is stable: entries with equal keys keep their relative input
/// order.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| a.key.cmp(&b.key));
}

/// Serializes entries back to BibTeX in the order given.
///
/// Each entry is written as
///
/// ```text
/// @type{key,
///   name = {value},
///   name = {value}
/// }
/// ```
///
/// with the entry type and key verbatim, one field per line, two-space
/// indentation and every value brace-delimited. Field order is the entries'
/// own (lexicographic by name, see [`Entry`]); entry order is whatever the
/// caller established. No trailing comma is emitted after the last field,
/// since strict downstream consumers reject one. Entries are separated by a
/// single blank line and the output ends with a single newline.
///
/// # Arguments
///
/// * `entries` - The entries to serialize
///
/// # Returns
///
/// The canonical text, or an empty string for an empty slice.
pub fn format_bibliography(entries: &[Entry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let blocks: Vec<String> = entries.iter().map(format_entry).collect();
    let mut output = blocks.join("\n\n");
    output.push('\n');
    output
}

/// Serializes a single entry.
fn format_entry(entry: &Entry) -> String {
    let mut block = format!("@{}{{{},\n", entry.entry_type, entry.key);

    if !entry.fields.is_empty() {
        let lines: Vec<String> = entry
            .fields
            .iter()
            .map(|(name, value)| format!("  {} = {{{}}}", name, value))
            .collect();
        block.push_str(&lines.join(",\n"));
        block.push('\n');
    }

    block.push('}');
    block
}
