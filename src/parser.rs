//! BibTeX bibliography parser.
//!
//! Turns raw BibTeX source into a sequence of [`Entry`] records. The parser
//! is a small cursor-based scanner: entries are located by their `@` marker,
//! bodies are read with balanced-brace counting, and field assignments are
//! split on top-level commas so values containing commas, braces or quotes
//! stay intact.

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors that can occur while parsing a bibliography.
///
/// Every variant names the offending block, either by byte offset into the
/// source or by citation key, together with the reason.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("expected '@' to start an entry at byte {offset}, found '{found}'")]
    ExpectedEntry { found: char, offset: usize },

    #[error("entry starting at byte {offset} has no type between '@' and '{{'")]
    MissingEntryType { offset: usize },

    #[error("unbalanced braces in the entry starting at byte {offset}")]
    UnbalancedBrace { offset: usize },

    #[error("unterminated '\"' quote at byte {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("entry '@{entry_type}' starting at byte {offset} is missing a citation key")]
    MissingCitationKey { entry_type: String, offset: usize },

    #[error("malformed field in entry '{key}': expected 'name = value', got '{text}'")]
    MalformedField { key: String, text: String },

    #[error("unexpected end of input while reading the entry starting at byte {offset}")]
    UnexpectedEof { offset: usize },
}

/// One bibliographic record: an entry type, a citation key and named fields.
///
/// The entry type and citation key keep their source casing. Field names are
/// lower-cased at parse time; storing them in a `BTreeMap` makes field names
/// unique (a repeated name overwrites the earlier value, so the last
/// occurrence wins) and keeps them ordered by name under ordinal comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The entry type (e.g. "article", "inproceedings"), casing preserved
    pub entry_type: String,
    /// The citation key, casing preserved
    pub key: String,
    /// Field name (lower-cased) to field value, ordered by name
    pub fields: BTreeMap<String, String>,
}

/// Parses BibTeX source into a sequence of entries.
///
/// This is a pure function over the input text: entries are returned in
/// source order, with edge whitespace stripped from every token and one
/// layer of enclosing delimiters (`{...}` or `"..."`) removed from each
/// field value. Internal whitespace and internal braces are preserved
/// verbatim.
///
/// # Arguments
///
/// * `source` - The BibTeX source text
///
/// # Returns
///
/// The entries in source order.
///
/// # Errors
///
/// Returns a [`ParseError`] for a malformed block: unbalanced braces, an
/// unterminated quote, a missing entry type, a missing citation key, or a
/// field without a `name = value` shape.
///
/// # Examples
///
/// ```
/// use bibtidy::parse_bibliography;
///
/// let entries = parse_bibliography("@article{doe2021, Title = {A Paper}}").unwrap();
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].key, "doe2021");
/// assert_eq!(entries[0].fields["title"], "A Paper");
/// ```
pub fn parse_bibliography(source: &str) -> Result<Vec<Entry>, ParseError> {
    let mut scanner = Scanner::new(source);
    let mut entries = Vec::new();

    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }
        entries.push(scanner.entry()?);
    }

    Ok(entries)
}

/// Cursor over the source text, tracking the current byte offset.
struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Scanner { source, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    /// Reads one entry: `@type{ body }`.
    fn entry(&mut self) -> Result<Entry, ParseError> {
        let start = self.pos;
        match self.bump() {
            Some('@') => {}
            Some(found) => return Err(ParseError::ExpectedEntry { found, offset: start }),
            None => return Err(ParseError::UnexpectedEof { offset: start }),
        }

        // The entry type runs up to the opening brace.
        let type_start = self.pos;
        loop {
            match self.peek() {
                Some('{') => break,
                Some(_) => {
                    self.bump();
                }
                None => return Err(ParseError::UnexpectedEof { offset: start }),
            }
        }
        let entry_type = self.source[type_start..self.pos].trim();
        if entry_type.is_empty() {
            return Err(ParseError::MissingEntryType { offset: start });
        }

        self.bump(); // consume '{'
        let body_offset = self.pos;
        let body = self.balanced_body(start)?;

        build_entry(entry_type, body, body_offset, start)
    }

    /// Reads the brace-balanced entry body, starting just inside the opening
    /// brace and stopping at its matching closing brace (not included).
    fn balanced_body(&mut self, entry_offset: usize) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let mut depth = 1usize;

        while let Some(ch) = self.bump() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(&self.source[start..self.pos - 1]);
                    }
                }
                _ => {}
            }
        }

        Err(ParseError::UnbalancedBrace { offset: entry_offset })
    }
}

/// Builds an [`Entry`] from the raw body of a block: the citation key
/// followed by comma-separated `name = value` assignments.
fn build_entry(
    entry_type: &str,
    body: &str,
    body_offset: usize,
    entry_offset: usize,
) -> Result<Entry, ParseError> {
    let segments = split_top_level(body, body_offset)?;
    let mut segments = segments.into_iter();

    let key = segments.next().unwrap_or("").trim();
    if key.is_empty() {
        return Err(ParseError::MissingCitationKey {
            entry_type: entry_type.to_string(),
            offset: entry_offset,
        });
    }

    let mut fields = BTreeMap::new();
    for segment in segments {
        // Empty segments come from trailing commas; skip them.
        if segment.trim().is_empty() {
            continue;
        }
        let (name, value) = split_field(segment, key)?;
        fields.insert(name, value);
    }

    Ok(Entry {
        entry_type: entry_type.to_string(),
        key: key.to_string(),
        fields,
    })
}

/// Splits an entry body on top-level commas.
///
/// A comma is top-level when it sits at brace depth zero and outside a
/// double-quoted literal, so `author = "Smith, J."` and `title = {A, B}`
/// are never split apart.
fn split_top_level(body: &str, body_offset: usize) -> Result<Vec<&str>, ParseError> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote_open: Option<usize> = None;
    let mut segment_start = 0usize;

    for (idx, ch) in body.char_indices() {
        match ch {
            '"' if depth == 0 => {
                quote_open = match quote_open {
                    Some(_) => None,
                    None => Some(idx),
                };
            }
            '{' if quote_open.is_none() => depth += 1,
            '}' if quote_open.is_none() => depth = depth.saturating_sub(1),
            ',' if depth == 0 && quote_open.is_none() => {
                segments.push(&body[segment_start..idx]);
                segment_start = idx + ','.len_utf8();
            }
            _ => {}
        }
    }

    if let Some(offset) = quote_open {
        return Err(ParseError::UnterminatedQuote {
            offset: body_offset + offset,
        });
    }

    segments.push(&body[segment_start..]);
    Ok(segments)
}

/// Splits one `name = value` segment at its first top-level `=`.
///
/// The name is lower-cased; the value has edge whitespace and one layer of
/// enclosing delimiters stripped.
fn split_field(segment: &str, key: &str) -> Result<(String, String), ParseError> {
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut split_at = None;

    for (idx, ch) in segment.char_indices() {
        match ch {
            '"' if depth == 0 => in_quote = !in_quote,
            '{' if !in_quote => depth += 1,
            '}' if !in_quote => depth = depth.saturating_sub(1),
            '=' if depth == 0 && !in_quote => {
                split_at = Some(idx);
                break;
            }
            _ => {}
        }
    }

    let eq = match split_at {
        Some(idx) => idx,
        None => {
            return Err(ParseError::MalformedField {
                key: key.to_string(),
                text: segment.trim().to_string(),
            });
        }
    };

    let name = segment[..eq].trim().to_lowercase();
    if name.is_empty() {
        return Err(ParseError::MalformedField {
            key: key.to_string(),
            text: segment.trim().to_string(),
        });
    }

    let value = strip_delimiters(segment[eq + 1..].trim());
    Ok((name, value.to_string()))
}

/// Removes one layer of enclosing value delimiters, if present.
///
/// `{...}` is stripped only when the interior is itself brace-balanced, so
/// a value like `{A} and {B}` is kept verbatim rather than truncated.
/// `"..."` is stripped only when the interior contains no further quote.
fn strip_delimiters(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('{') && raw.ends_with('}') {
        let interior = &raw[1..raw.len() - 1];
        if is_balanced(interior) {
            return interior;
        }
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let interior = &raw[1..raw.len() - 1];
        if !interior.contains('"') {
            return interior;
        }
    }
    raw
}

/// Whether every closing brace in `text` has a matching opening brace.
fn is_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
