//! Configuration for stores and text codecs.
//!
//! This module provides the option types that shape record construction and output:
//!
//! - [`GroupOptions`]: Top-level configuration owned by a [`Store`](crate::Store)
//! - [`Sigils`]: Prefix characters recognised in construction values
//! - [`JsonOptions`], [`YamlOptions`], [`LegacyOptions`]: Per-format output settings
//! - [`OrderOptions`]: Matching strictness for [`Store::order_values`](crate::Store::order_values)
//!
//! Every type derives serde traits with `#[serde(default)]`, so a partial
//! configuration document only needs to name the settings it changes.
//!
//! ## Examples
//!
//! ```rust
//! use protogroup::{GroupOptions, JsonOptions, Store};
//!
//! let options = GroupOptions::new()
//!     .with_path_delimiter('.')
//!     .with_json(JsonOptions::new().with_indent(0));
//! let store = Store::with_options(options);
//! assert_eq!(store.options().path_delimiter, '.');
//!
//! let options = GroupOptions::from_json_str(r#"{"max_chain_depth": 8}"#).unwrap();
//! assert_eq!(options.max_chain_depth, 8);
//! assert_eq!(options.parent_key, "proto");
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Prefix characters that give construction values their meaning.
///
/// A value starting with a doubled sigil is a literal with one sigil removed,
/// so `%%off` stores the text `%off`.
///
/// # Examples
///
/// ```rust
/// use protogroup::Sigils;
///
/// let sigils = Sigils::default();
/// assert_eq!(sigils.compose, '%');
/// assert_eq!(sigils.deref, '$');
/// assert_eq!(sigils.by_name, '&');
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sigils {
    /// Flatten the named record or mapping in under the current key.
    pub compose: char,
    /// Substitute the current value of the named variable.
    pub deref: char,
    /// The argument names a variable holding the real key or value list.
    pub by_name: char,
}

impl Default for Sigils {
    fn default() -> Self {
        Sigils {
            compose: '%',
            deref: '$',
            by_name: '&',
        }
    }
}

/// Output settings for JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Spaces per nesting level; `0` produces minified output.
    pub indent: usize,
    /// Render object keys sorted instead of in record order.
    pub sort_keys: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            indent: 2,
            sort_keys: true,
        }
    }
}

impl JsonOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation width. `0` means minified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use protogroup::JsonOptions;
    ///
    /// assert_eq!(JsonOptions::new().with_indent(4).indent, 4);
    /// ```
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }
}

/// Output settings for the YAML-like block format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YamlOptions {
    /// Spaces per nesting level. Values below 1 are treated as 1.
    pub indent: usize,
    pub sort_keys: bool,
}

impl Default for YamlOptions {
    fn default() -> Self {
        YamlOptions {
            indent: 2,
            sort_keys: true,
        }
    }
}

impl YamlOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }
}

/// Settings for the line-oriented legacy format.
///
/// # Examples
///
/// ```rust
/// use protogroup::LegacyOptions;
///
/// let options = LegacyOptions::new().with_delimiter('=').with_align(false);
/// assert_eq!(options.delimiter, '=');
/// assert!(!options.align);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyOptions {
    /// Separator between key and value on each line.
    pub delimiter: char,
    /// Pad keys so the delimiters line up in a column.
    pub align: bool,
    /// Emit a blank line between differing top-level groups.
    pub group_blank_lines: bool,
}

impl Default for LegacyOptions {
    fn default() -> Self {
        LegacyOptions {
            delimiter: '>',
            align: true,
            group_blank_lines: true,
        }
    }
}

impl LegacyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_align(mut self, align: bool) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn with_group_blank_lines(mut self, group_blank_lines: bool) -> Self {
        self.group_blank_lines = group_blank_lines;
        self
    }
}

/// How a suffix selects a key in [`Store::order_values`](crate::Store::order_values).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SuffixMatch {
    /// The first key that contains the suffix anywhere.
    #[default]
    Substring,
    /// The first key whose trailing path segments equal the suffix.
    Segment,
}

/// What happens when no key matches a suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingSuffix {
    #[default]
    Skip,
    Error,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderOptions {
    pub matching: SuffixMatch,
    pub missing: MissingSuffix,
}

impl OrderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact segment matching, failing on any unmatched suffix.
    #[must_use]
    pub fn strict() -> Self {
        OrderOptions {
            matching: SuffixMatch::Segment,
            missing: MissingSuffix::Error,
        }
    }

    #[must_use]
    pub fn with_matching(mut self, matching: SuffixMatch) -> Self {
        self.matching = matching;
        self
    }

    #[must_use]
    pub fn with_missing(mut self, missing: MissingSuffix) -> Self {
        self.missing = missing;
        self
    }
}

/// Top-level configuration of a [`Store`](crate::Store).
///
/// # Examples
///
/// ```rust
/// use protogroup::GroupOptions;
///
/// let options = GroupOptions::new();
/// assert_eq!(options.path_delimiter, ',');
/// assert_eq!(options.parent_key, "proto");
/// assert_eq!(options.max_chain_depth, 100);
/// assert_eq!(options.file_marker, '@');
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOptions {
    /// Joins path segments into flattened keys.
    pub path_delimiter: char,
    /// Reserved key holding a record's parent link.
    pub parent_key: String,
    /// Maximum number of parent hops a dispatch may take.
    pub max_chain_depth: usize,
    pub sigils: Sigils,
    /// Marks a load/save argument as a file path.
    pub file_marker: char,
    pub json: JsonOptions,
    pub yaml: YamlOptions,
    pub legacy: LegacyOptions,
}

impl Default for GroupOptions {
    fn default() -> Self {
        GroupOptions {
            path_delimiter: ',',
            parent_key: "proto".to_string(),
            max_chain_depth: 100,
            sigils: Sigils::default(),
            file_marker: '@',
            json: JsonOptions::default(),
            yaml: YamlOptions::default(),
            legacy: LegacyOptions::default(),
        }
    }
}

impl GroupOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads options from a JSON configuration document. Missing settings keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the document is not valid JSON or a setting
    /// has the wrong type.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::syntax(e.line(), e.column(), &e.to_string()))
    }

    #[must_use]
    pub fn with_path_delimiter(mut self, delimiter: char) -> Self {
        self.path_delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_parent_key(mut self, key: &str) -> Self {
        self.parent_key = key.to_string();
        self
    }

    #[must_use]
    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    #[must_use]
    pub fn with_sigils(mut self, sigils: Sigils) -> Self {
        self.sigils = sigils;
        self
    }

    #[must_use]
    pub fn with_file_marker(mut self, marker: char) -> Self {
        self.file_marker = marker;
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: JsonOptions) -> Self {
        self.json = json;
        self
    }

    #[must_use]
    pub fn with_yaml(mut self, yaml: YamlOptions) -> Self {
        self.yaml = yaml;
        self
    }

    #[must_use]
    pub fn with_legacy(mut self, legacy: LegacyOptions) -> Self {
        self.legacy = legacy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_document() {
        let text = r#"{
            "path_delimiter": "/",
            "legacy": { "delimiter": "=" },
            "sigils": { "compose": "*" }
        }"#;
        let options = GroupOptions::from_json_str(text).unwrap();
        assert_eq!(options.path_delimiter, '/');
        assert_eq!(options.legacy.delimiter, '=');
        assert!(options.legacy.align);
        assert_eq!(options.sigils.compose, '*');
        assert_eq!(options.sigils.deref, '$');
        assert_eq!(options.json, JsonOptions::default());
    }

    #[test]
    fn test_bad_config_document() {
        let err = GroupOptions::from_json_str("{\"max_chain_depth\": \"deep\"}").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedInput);
    }

    #[test]
    fn test_order_options() {
        let strict = OrderOptions::strict();
        assert_eq!(strict.matching, SuffixMatch::Segment);
        assert_eq!(strict.missing, MissingSuffix::Error);
        assert_eq!(OrderOptions::new().matching, SuffixMatch::Substring);
    }
}
