//! YAML-like block output.
//!
//! This module provides [`YamlWriter`], which renders a [`Tree`] as a block
//! mapping: one `key: value` line per scalar and one `key:` line opening each
//! nested branch, with children indented by the configured width.
//!
//! ## Quoting
//!
//! Keys and values are written bare unless they would be misread, in which case
//! they are double-quoted with backslash escapes. Quoting applies to text that:
//!
//! - is empty, or starts or ends with whitespace
//! - contains a space, `:`, `#`, a quote, a backslash or a control character
//! - starts with a YAML indicator such as `-`, `{`, `[`, `&` or `*`
//! - `serde_yaml` would resolve to a different scalar, such as `1.50`, `null`
//!   or `True`
//!
//! ## Usage
//!
//! ```rust
//! use protogroup::{tree, YamlOptions, YamlWriter};
//!
//! let t = tree!({ "name": "My App", "database": { "port": "3306" } });
//! let mut writer = YamlWriter::new(YamlOptions::new());
//! writer.write_tree(&t).unwrap();
//! assert_eq!(writer.into_inner(), "database:\n  port: 3306\nname: \"My App\"\n");
//! ```

use crate::de::reads_back_plain;
use crate::store::Store;
use crate::{Error, Result, Tree, TreeMap, YamlOptions};

/// Writes trees in the YAML-like block format.
pub struct YamlWriter {
    output: String,
    options: YamlOptions,
}

impl YamlWriter {
    pub fn new(options: YamlOptions) -> Self {
        YamlWriter {
            output: String::with_capacity(256),
            options,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    /// Appends `tree`, whose root must be a branch.
    pub fn write_tree(&mut self, tree: &Tree) -> Result<()> {
        match tree {
            Tree::Branch(map) => {
                self.write_branch(map, 0);
                Ok(())
            }
            Tree::Scalar(_) => Err(Error::malformed("YAML document root must be a mapping")),
        }
    }

    fn write_branch(&mut self, map: &TreeMap, level: usize) {
        let mut entries: Vec<(&String, &Tree)> = map.iter().collect();
        if self.options.sort_keys {
            entries.sort_by(|a, b| a.0.cmp(b.0));
        }
        for (key, child) in entries {
            self.write_indent(level);
            self.write_string(key);
            self.output.push(':');
            match child {
                Tree::Scalar(value) => {
                    self.output.push(' ');
                    self.write_string(value);
                    self.output.push('\n');
                }
                Tree::Branch(children) if children.is_empty() => {
                    self.output.push_str(" {}\n");
                }
                Tree::Branch(children) => {
                    self.output.push('\n');
                    self.write_branch(children, level + 1);
                }
            }
        }
    }

    fn write_indent(&mut self, level: usize) {
        let width = self.options.indent.max(1) * level;
        self.output.extend(std::iter::repeat(' ').take(width));
    }

    #[inline]
    pub(crate) fn needs_quotes(s: &str) -> bool {
        const INDICATORS: &[char] = &[
            '-', '?', ',', '[', ']', '{', '}', '&', '*', '!', '|', '>', '\'', '%', '@', '`',
        ];
        s.is_empty()
            || s.starts_with(char::is_whitespace)
            || s.ends_with(char::is_whitespace)
            || s.starts_with(INDICATORS)
            || s.chars().any(|c| matches!(c, ' ' | ':' | '#' | '"' | '\\') || is_escaped(c))
            || !reads_back_plain(s)
    }

    #[inline]
    fn write_string(&mut self, s: &str) {
        if Self::needs_quotes(s) {
            self.output.push('"');
            for ch in s.chars() {
                match ch {
                    '"' => self.output.push_str("\\\""),
                    '\\' => self.output.push_str("\\\\"),
                    '\n' => self.output.push_str("\\n"),
                    '\r' => self.output.push_str("\\r"),
                    '\t' => self.output.push_str("\\t"),
                    '\u{0008}' => self.output.push_str("\\b"),
                    '\u{000C}' => self.output.push_str("\\f"),
                    '\0' => self.output.push_str("\\0"),
                    c if is_escaped(c) => {
                        self.output.push_str(&format!("\\u{:04x}", c as u32));
                    }
                    _ => self.output.push(ch),
                }
            }
            self.output.push('"');
        } else {
            self.output.push_str(s);
        }
    }
}

/// Characters written as `\uXXXX` inside double quotes.
fn is_escaped(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}' | '\u{fffe}' | '\u{ffff}')
}

/// Renders a tree in the YAML-like block format.
pub fn to_yaml(tree: &Tree, options: &YamlOptions) -> Result<String> {
    let mut writer = YamlWriter::new(options.clone());
    writer.write_tree(tree)?;
    Ok(writer.into_inner())
}

impl Store {
    /// Renders a record using the store's [`YamlOptions`].
    pub fn to_yaml(&self, name: &str) -> Result<String> {
        let options = self.options().yaml.clone();
        self.to_yaml_with(name, &options)
    }

    pub fn to_yaml_with(&self, name: &str, options: &YamlOptions) -> Result<String> {
        to_yaml(&self.tree(name)?, options)
    }
}
