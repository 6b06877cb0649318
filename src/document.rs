//! Corpus documents.

use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::{EntityResolver, Metadata};
use crate::error::{Error, Result};
use crate::field::{self, Leaves, Node};
use crate::schema::{PaperSchema, Record, SchemaRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentKey {
    pub year: String,
    pub filename: String,
}

impl DocumentKey {
    pub fn new(year: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            filename: filename.into(),
        }
    }

    /// Builds the key from the last two segments of `path`.
    pub fn from_path(path: &Path) -> Self {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let year = path
            .parent()
            .and_then(Path::file_name)
            .map(|y| y.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { year, filename }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year.is_empty() {
            f.write_str(&self.filename)
        } else {
            write!(f, "{}/{}", self.year, self.filename)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperReference {
    pub title: String,
    pub year: i64,
    pub authors: Vec<String>,
}

impl fmt::Display for PaperReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; {}; {}", self.authors.join(", "), self.title, self.year)
    }
}

/// One parsed annotation file.
///
/// The schema is fixed at construction from the `version` tag. Entity
/// metadata is only resolved when [`Document::metadata`] is first called.
pub struct Document {
    key: DocumentKey,
    path: PathBuf,
    schema: &'static PaperSchema,
    raw: Map<String, Value>,
    metadata: Option<Metadata>,
}

impl Document {
    pub fn load(path: impl AsRef<Path>, registry: &SchemaRegistry) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading document {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let raw: Value = serde_json::from_str(&text).map_err(|e| Error::json(path, e))?;
        Self::from_value(DocumentKey::from_path(path), path, raw, registry)
    }

    pub fn from_value(
        key: DocumentKey,
        path: impl Into<PathBuf>,
        raw: Value,
        registry: &SchemaRegistry,
    ) -> Result<Self> {
        let Value::Object(raw) = raw else {
            return Err(Error::InvalidDocument(key.to_string()));
        };
        let version = raw
            .get("version")
            .and_then(Value::as_str)
            .ok_or(Error::MissingVersion)?;
        let schema = registry.lookup(version)?;
        debug!("{} uses schema {}", key, schema.implementation_id());
        Ok(Self {
            key,
            path: path.into(),
            schema,
            raw,
            metadata: None,
        })
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &'static PaperSchema {
        self.schema
    }

    pub fn schema_version(&self) -> &'static str {
        self.schema.key
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// The paper record; its fields are the document sections.
    pub fn root(&self) -> Record<'_> {
        Record::new(self.schema.root, &self.raw)
    }

    /// One of `reference`, `data`, `preprocessing`, `analysis_method`,
    /// `evaluation` or `result`.
    pub fn section(&self, name: &str) -> Result<Option<Record<'_>>> {
        self.root().record(name)
    }

    pub fn resolve<'p>(&self, path: &'p str) -> Leaves<'_, 'p> {
        field::resolve(Node::object(self.root()), path)
    }

    /// Title, year and author names from the `reference` section.
    pub fn reference(&self) -> Result<PaperReference> {
        let title = self
            .first_leaf("reference.title")?
            .and_then(|t| t.as_str().map(str::to_string))
            .ok_or_else(|| Error::InvalidDocument(format!("{}: no reference.title", self.key)))?;
        let year = self
            .first_leaf("reference.year")?
            .and_then(|y| y.as_i64())
            .ok_or_else(|| Error::InvalidDocument(format!("{}: no reference.year", self.key)))?;
        let authors = self
            .resolve("reference.authors.author")
            .map(|leaf| leaf.map(|a| a.to_string()))
            .collect::<Result<Vec<_>>>()?;
        Ok(PaperReference {
            title,
            year,
            authors,
        })
    }

    fn first_leaf(&self, path: &str) -> Result<Option<field::Scalar>> {
        self.resolve(path).next().transpose()
    }

    /// Entity metadata, resolved on first call and kept for the lifetime of
    /// the document.
    pub fn metadata(&mut self, resolver: &EntityResolver) -> Result<&mut Metadata> {
        let metadata = match self.metadata.take() {
            Some(metadata) => metadata,
            None => Metadata::resolve(&self.reference()?, resolver)?,
        };
        Ok(self.metadata.insert(metadata))
    }

    pub fn cached_metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("key", &self.key)
            .field("schema", &self.schema.key)
            .finish()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Scalar;
    use serde_json::json;

    fn document(version: &str, body: Value) -> Result<Document> {
        let mut raw = body;
        raw["version"] = json!(version);
        Document::from_value(
            DocumentKey::new("2019", "paper.json"),
            "db/2019/paper.json",
            raw,
            SchemaRegistry::global(),
        )
    }

    #[test]
    fn key_uses_last_two_segments() {
        let key = DocumentKey::from_path(Path::new("/data/ntarc/2017/smith.json"));
        assert_eq!(key.to_string(), "2017/smith.json");
        assert_eq!(DocumentKey::from_path(Path::new("lone.json")).to_string(), "lone.json");
    }

    #[test]
    fn display_ignores_content() {
        let a = document("v2", json!({"reference": {"title": "A"}})).unwrap();
        let b = document("2.1.0", json!({"reference": {"title": "B"}})).unwrap();
        assert_eq!(a.to_string(), "2019/paper.json");
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn schema_follows_version_tag() {
        assert_eq!(document("v2", json!({})).unwrap().schema_version(), "2.0");
        assert_eq!(document("3.0.2", json!({})).unwrap().schema_version(), "3.0");
        assert!(matches!(
            document("1.4", json!({})).unwrap_err(),
            Error::UnknownSchemaVersion { .. }
        ));
    }

    #[test]
    fn missing_version_is_rejected() {
        let err = Document::from_value(
            DocumentKey::new("2019", "x.json"),
            "x.json",
            json!({"reference": {}}),
            SchemaRegistry::global(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingVersion));
    }

    #[test]
    fn resolves_paths_through_the_schema() {
        let doc = document(
            "2.0.0",
            json!({
                "reference": {
                    "title": "Detecting Botnets",
                    "year": 2016,
                    "authors": [{"author": "Ada"}, {"author": "Grace", "affiliation": null}]
                },
                "analysis_method": {"supervised_learning": true}
            }),
        )
        .unwrap();
        let authors: Vec<Scalar> = doc.resolve("reference.authors.author").collect::<Result<_>>().unwrap();
        assert_eq!(authors, vec![Scalar::from("Ada"), Scalar::from("Grace")]);
        let affiliations: Vec<Scalar> = doc
            .resolve("reference.authors.affiliation")
            .collect::<Result<_>>()
            .unwrap();
        assert!(affiliations.is_empty());
        let supervised: Vec<Scalar> = doc
            .resolve("analysis_method.supervised_learning")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(supervised, vec![Scalar::Bool(true)]);
        assert!(doc.resolve("reference.pages").next().unwrap().is_err());
    }

    #[test]
    fn reference_reads_title_year_and_authors() {
        let doc = document(
            "3.0",
            json!({
                "reference": {
                    "title": "Flow Features",
                    "year": "2018",
                    "authors": [{"name": "Ada"}]
                }
            }),
        )
        .unwrap();
        let reference = doc.reference().unwrap();
        assert_eq!(reference.title, "Flow Features");
        assert_eq!(reference.year, 2018);
        assert_eq!(reference.authors, vec!["Ada"]);
    }
}
