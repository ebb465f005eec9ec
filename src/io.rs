//! Loading and saving records through text, variables and files.
//!
//! A load or save argument that starts with the store's file marker (`@` by
//! default) is a file path. Otherwise a load argument is the text itself and a
//! save argument names the variable that receives the output.
//!
//! ```rust
//! use protogroup::{Format, Store};
//!
//! let mut store = Store::new();
//! store.load("app", Format::Legacy, "name > App").unwrap();
//! store.save("app", Format::Json, "out").unwrap();
//! assert_eq!(
//!     store.var("out").and_then(|v| v.as_str()),
//!     Some("{\n  \"name\": \"App\"\n}")
//! );
//! ```

use crate::store::{RecordId, Store};
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// A supported text format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
    Legacy,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Legacy => "legacy",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "legacy" | "text" => Ok(Format::Legacy),
            _ => Err(Error::malformed(format!("unknown format '{}'", s))),
        }
    }
}

/// Where a load reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source<'a> {
    Text(&'a str),
    File(PathBuf),
}

impl<'a> Source<'a> {
    #[must_use]
    pub fn parse(arg: &'a str, marker: char) -> Self {
        match arg.strip_prefix(marker) {
            Some(path) => Source::File(PathBuf::from(path)),
            None => Source::Text(arg),
        }
    }
}

/// Where a save writes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sink {
    Variable(String),
    File(PathBuf),
}

impl Sink {
    #[must_use]
    pub fn parse(arg: &str, marker: char) -> Self {
        match arg.strip_prefix(marker) {
            Some(path) => Sink::File(PathBuf::from(path)),
            None => Sink::Variable(arg.to_string()),
        }
    }
}

fn check_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::malformed("file marker without a path"));
    }
    Ok(())
}

impl Store {
    /// Creates or replaces `name` from text or a file in `format`.
    ///
    /// # Errors
    ///
    /// A missing file is `NotFound`, any other read failure is `IoFailure`,
    /// and parse failures are `MalformedInput`. The store is unchanged on
    /// failure.
    pub fn load(&mut self, name: &str, format: Format, arg: &str) -> Result<RecordId> {
        let marker = self.options().file_marker;
        let owned;
        let text = match Source::parse(arg, marker) {
            Source::Text(text) => text,
            Source::File(path) => {
                check_path(&path)?;
                owned = std::fs::read_to_string(&path)
                    .map_err(|e| Error::io(&path.display().to_string(), &e))?;
                debug!(record = name, path = %path.display(), bytes = owned.len(), "read file");
                owned.as_str()
            }
        };
        match format {
            Format::Json => self.from_json(name, text),
            Format::Yaml => self.from_yaml(name, text),
            Format::Legacy => self.from_legacy(name, text),
        }
    }

    /// Renders `name` in `format` and delivers it to a variable or a file.
    ///
    /// Returns the rendered text as well.
    pub fn save(&mut self, name: &str, format: Format, arg: &str) -> Result<String> {
        let text = match format {
            Format::Json => self.to_json(name)?,
            Format::Yaml => self.to_yaml(name)?,
            Format::Legacy => self.to_legacy(name)?,
        };
        match Sink::parse(arg, self.options().file_marker) {
            Sink::Variable(var) => {
                self.set_var(&var, text.as_str());
                debug!(record = name, variable = %var, %format, "saved to variable");
            }
            Sink::File(path) => {
                check_path(&path)?;
                std::fs::write(&path, &text)
                    .map_err(|e| Error::io(&path.display().to_string(), &e))?;
                debug!(record = name, path = %path.display(), %format, "saved to file");
            }
        }
        Ok(text)
    }
}
