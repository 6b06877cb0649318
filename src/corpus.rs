//! Corpus discovery.
//!
//! A corpus root holds one directory per year, each holding `*.json`
//! annotations. Documents are produced lazily, year directories in sorted
//! order and files sorted within each year.

use std::path::{Path, PathBuf};

use glob::{glob, Paths, Pattern};
use log::{info, warn};

use crate::document::Document;
use crate::error::{Error, Result};
use crate::schema::SchemaRegistry;

pub struct Corpus<'r> {
    root: PathBuf,
    registry: &'r SchemaRegistry,
    limit: Option<usize>,
}

impl Corpus<'static> {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Corpus::with_registry(root, SchemaRegistry::global())
    }
}

impl<'r> Corpus<'r> {
    pub fn with_registry(root: impl Into<PathBuf>, registry: &'r SchemaRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            limit: None,
        }
    }

    /// Stops after the first `n` documents. Off unless requested.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pattern(&self) -> String {
        let root = Pattern::escape(&self.root.to_string_lossy());
        format!("{}/*/*.json", root.trim_end_matches('/'))
    }

    /// Lazily loads every document. The first error is yielded and the caller
    /// decides whether to stop.
    pub fn documents(&self) -> Result<Documents<'r>> {
        let pattern = self.pattern();
        info!("Searching for documents matching pattern: {}", pattern);
        if !self.root.is_dir() {
            warn!("Corpus root {} is not a directory", self.root.display());
        }
        Ok(Documents {
            paths: glob(&pattern)?,
            registry: self.registry,
            remaining: self.limit,
        })
    }

    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in glob(&self.pattern())? {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                Error::io(path, e.into())
            })?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if let Some(limit) = self.limit {
            paths.truncate(limit);
        }
        Ok(paths)
    }
}

pub struct Documents<'r> {
    paths: Paths,
    registry: &'r SchemaRegistry,
    remaining: Option<usize>,
}

impl Iterator for Documents<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let path = match self.paths.next()? {
                Ok(path) => path,
                Err(e) => {
                    let path = e.path().to_path_buf();
                    return Some(Err(Error::io(path, e.into())));
                }
            };
            // `*.json` also matches directories with that suffix.
            if !path.is_file() {
                continue;
            }
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= 1;
            }
            return Some(Document::load(&path, self.registry));
        }
    }
}
