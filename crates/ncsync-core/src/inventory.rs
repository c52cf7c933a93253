// Device inventories: where the list of addresses comes from.

use std::fs;
use std::path::PathBuf;

use crate::error::CoreError;

/// Source of device addresses for a run.
pub trait Inventory {
    /// Addresses in run order, without duplicates.
    fn addresses(&self) -> Result<Vec<String>, CoreError>;
}

/// A fixed list, typically from the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    addresses: Vec<String>,
}

impl StaticInventory {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }
}

impl Inventory for StaticInventory {
    fn addresses(&self) -> Result<Vec<String>, CoreError> {
        Ok(normalize(self.addresses.iter().map(String::as_str)))
    }
}

/// A text file with one address per line. Blank lines and `#` comments are
/// ignored.
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Inventory for FileInventory {
    fn addresses(&self) -> Result<Vec<String>, CoreError> {
        let content = fs::read_to_string(&self.path).map_err(|e| CoreError::Inventory {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let lines = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default());
        Ok(normalize(lines))
    }
}

fn normalize<'a>(entries: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for entry in entries.map(str::trim).filter(|e| !e.is_empty()) {
        if !seen.iter().any(|s| s == entry) {
            seen.push(entry.to_owned());
        }
    }
    seen
}
