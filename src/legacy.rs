//! The line-oriented legacy format.
//!
//! One `key > value` pair per line, keys sorted, with a blank line between
//! entries whose first path segment differs:
//!
//! ```text
//! database,host > localhost
//! database,port > 3306
//!
//! name          > App
//! ```
//!
//! Alignment and blank lines are cosmetic. A reader splits each non-blank line
//! at the first delimiter, trims the key and drops a single space before the
//! value.

use crate::path;
use crate::store::{RecordId, Store};
use crate::{Error, FlatMap, LegacyOptions, Result};
use tracing::debug;

/// Renders flat data in the legacy format.
///
/// # Errors
///
/// Returns a malformed-input error for entries that would not read back: a key
/// containing the legacy delimiter or starting or ending with whitespace, or a
/// line break in a key or value.
///
/// # Examples
///
/// ```rust
/// use protogroup::legacy::to_legacy;
/// use protogroup::{FlatMap, LegacyOptions};
///
/// let map: FlatMap = [("name", "App"), ("db,port", "3306"), ("db,host", "h")]
///     .into_iter()
///     .collect();
/// let text = to_legacy(&map, ',', &LegacyOptions::new()).unwrap();
/// assert_eq!(text, "db,host > h\ndb,port > 3306\n\nname    > App\n");
/// ```
pub fn to_legacy(map: &FlatMap, path_delimiter: char, options: &LegacyOptions) -> Result<String> {
    let entries = map.sorted();
    let width = if options.align {
        entries.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0)
    } else {
        0
    };

    let mut out = String::new();
    let mut group: Option<&str> = None;
    for (key, value) in entries {
        if key.contains(options.delimiter) {
            return Err(Error::malformed(format!(
                "key '{}' contains the legacy delimiter '{}'",
                key, options.delimiter
            )));
        }
        if key.starts_with(char::is_whitespace) || key.ends_with(char::is_whitespace) {
            return Err(Error::malformed(format!(
                "key '{}' starts or ends with whitespace",
                key
            )));
        }
        if key.contains(|c| c == '\n' || c == '\r') || value.contains(|c| c == '\n' || c == '\r') {
            return Err(Error::malformed(format!(
                "entry '{}' spans several lines",
                key
            )));
        }
        let head = path::head(key, path_delimiter);
        if options.group_blank_lines && group.is_some_and(|g| g != head) {
            out.push('\n');
        }
        group = Some(head);
        out.push_str(&format!(
            "{key:<width$} {delim} {value}\n",
            delim = options.delimiter
        ));
    }
    Ok(out)
}

/// Parses legacy text into flat data.
///
/// # Errors
///
/// Returns a syntax error naming the first non-blank line without the
/// delimiter or with an empty key.
pub fn from_legacy(text: &str, options: &LegacyOptions) -> Result<FlatMap> {
    let mut map = FlatMap::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line.split_once(options.delimiter).ok_or_else(|| {
            Error::syntax_with_context(
                index + 1,
                1,
                &format!("Missing delimiter '{}'", options.delimiter),
                line,
                Some(&format!("Write entries as 'key {} value'", options.delimiter)),
            )
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::syntax_with_context(
                index + 1,
                1,
                "Empty key",
                line,
                None,
            ));
        }
        map.insert(key, value.strip_prefix(' ').unwrap_or(value));
    }
    Ok(map)
}

impl Store {
    /// Renders a record using the store's [`LegacyOptions`].
    pub fn to_legacy(&self, name: &str) -> Result<String> {
        let options = self.options().legacy.clone();
        self.to_legacy_with(name, &options)
    }

    pub fn to_legacy_with(&self, name: &str, options: &LegacyOptions) -> Result<String> {
        to_legacy(&self.data(name)?, self.delimiter(), options)
    }

    /// Creates or replaces a record from legacy text.
    pub fn from_legacy(&mut self, name: &str, text: &str) -> Result<RecordId> {
        let options = self.options().legacy.clone();
        self.from_legacy_with(name, text, &options)
    }

    pub fn from_legacy_with(&mut self, name: &str, text: &str, options: &LegacyOptions) -> Result<RecordId> {
        let data = from_legacy(text, options)?;
        let fields = data.len();
        let id = self.create_from_flat(name, data)?;
        debug!(record = name, fields, "loaded legacy text");
        Ok(id)
    }
}
