//! Text formats and construction syntax
//!
//! This module documents the text forms records take when they enter or leave a
//! [`Store`](crate::Store).
//!
//! # Flattened keys
//!
//! Record data is flat. A key is a non-empty list of path segments joined by
//! the store's path delimiter (`,` by default):
//!
//! ```text
//! name            -> App
//! database,host   -> localhost
//! database,port   -> 3306
//! ```
//!
//! **Rules**:
//! - No segment may be empty or contain the delimiter
//! - A key has at most 128 segments
//! - No key may be a path prefix of another key: `database` and
//!   `database,host` cannot coexist, since one path cannot be both a value
//!   and a branch
//! - Every value is a string
//!
//! Empty branches have no flat form and disappear on the way through a record.
//!
//! # Construction values
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `text` | literal |
//! | `%name` | every field of record `name` (or map variable `name`), re-prefixed with the current key |
//! | `$name` | the current value of scalar variable `name` |
//! | `&name` | as the only item of a key or value list: the list held by variable `name` |
//! | `%%text`, `$$text`, `&&text` | literal with one sigil removed |
//!
//! Composition copies the target's data as it is at that moment. Later
//! changes to the target do not reach the composed record.
//!
//! Block input is one `key value` pair per line. Lines starting with `#` and
//! blank lines are skipped, and a value wrapped in double quotes loses them:
//!
//! ```text
//! # application
//! name     App
//! database %db
//! title    "My App"
//! ```
//!
//! # Parent links
//!
//! The reserved key (`proto` by default) holds the name of the record a clone
//! was made from. It serializes like any other field. Loading a record whose
//! reserved key names a live record links to it again; any other value stays
//! plain data.
//!
//! Operations are not data: they never appear in any text form.
//!
//! # JSON
//!
//! Standard JSON with an object at the root. Output is pretty-printed at two
//! spaces with sorted keys unless configured otherwise; indent `0` gives the
//! compact form.
//!
//! Input scalars become strings:
//!
//! | JSON | Stored as |
//! |------|-----------|
//! | `"text"` | `text` |
//! | `3306`, `1.50`, `1e3` | `3306`, `1.50`, `1e3` |
//! | `true` | `true` |
//! | `null` | empty string |
//! | `[1, "a"]` | `[1,"a"]` |
//!
//! # YAML-like blocks
//!
//! A subset of YAML block mappings:
//!
//! ```text
//! database:
//!   host: localhost
//!   port: 3306
//! name: "My App"
//! ```
//!
//! **Rules**:
//! - Input is read with `serde_yaml`; only mappings and scalars may appear
//! - Plain scalars are resolved by YAML type and stored as their canonical
//!   text: `3306` stays `3306`, `1.50` becomes `1.5`, `true` stays `true`, and
//!   `~`, `null` or nothing become the empty string
//! - `key: {}` is an empty branch
//! - Sequences, tags, keys repeated within one mapping and streams of several
//!   documents are rejected; aliases are expanded
//! - Output indents by the configured width and double-quotes text when it is
//!   empty, has surrounding whitespace, contains a space, `:`, `#`, a quote, a
//!   backslash or a control character, starts with an indicator character, or
//!   would otherwise read back as a different scalar
//!
//! # Legacy lines
//!
//! ```text
//! database,host > localhost
//! database,port > 3306
//!
//! name          > App
//! ```
//!
//! **Rules**:
//! - One `key > value` pair per non-blank line; the delimiter is configurable
//! - Output sorts keys, pads them to a common width and separates groups with
//!   a different first segment by a blank line
//! - Input splits at the first delimiter, trims the key and drops one space
//!   before the value; lines without the delimiter are rejected
//! - Keys may not contain the delimiter or start or end with whitespace, and
//!   entries may not span lines
//!
//! # Load and save arguments
//!
//! | Argument | Load | Save |
//! |----------|------|------|
//! | `@path` | read the file | write the file |
//! | anything else | the text itself | name of the variable receiving the text |
