use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const FILENAME: &str = "claudescroll.toml";

/// Optional defaults read from `claudescroll.toml`.
///
/// ```toml
/// repo = "owner/repo"
/// output_dir = "site"
/// ```
///
/// Command-line flags override every key.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Repository used to link commit hashes.
    #[serde(default)]
    pub repo: Option<String>,

    /// Where the generated documents go.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `explicit`, or from `claudescroll.toml` in the
    /// working directory.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error. Missing keys in an existing file are left unset.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.unwrap_or(Path::new(FILENAME));
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).with_context(|| format!("parsing {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound && explicit.is_none() => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
