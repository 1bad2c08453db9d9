//! Shared test constants and helpers for integration tests.

/// A messy but valid two-entry bibliography: keys out of order, field names
/// mixed-case, whitespace all over the place.
pub const MESSY_BIB: &str = "@article{zeta, Title = {B Paper}, author = {Smith, J.}}\n@article{alpha, author = {Doe, A.},   title={A Paper}}\n";

/// The canonical form of [`MESSY_BIB`].
pub const TIDY_BIB: &str = "@article{alpha,\n  author = {Doe, A.},\n  title = {A Paper}\n}\n\n@article{zeta,\n  author = {Smith, J.},\n  title = {B Paper}\n}\n";

/// An entry missing its closing brace.
pub const UNBALANCED_BIB: &str = "@article{broken, title = {Never closed}\n";

/// Build a bibliography source from a list of citation keys.
///
/// Each key gets one `@article` entry with an auto-generated title
/// (`Title {key}`), in the order given.
pub fn build_bib(keys: &[&str]) -> String {
    keys.iter()
        .map(|key| format!("@article{{{}, title = {{Title {}}}}}\n", key, key))
        .collect()
}
