//! Version-dispatched document schemas.
//!
//! Each annotation names the schema revision it was written against in its
//! `version` field. The revision is reduced to a `MAJOR.MINOR` key and looked up
//! in a [`SchemaRegistry`]. The schema found there describes, record by record,
//! which accessor names exist and under which raw JSON key each is stored, so a
//! field path written against accessor names keeps working when a later
//! revision renames the underlying keys.

pub mod features;
mod v2_0;
mod v2_1;
mod v3_0;

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::field::{FieldSource, Node};

pub use features::FeatureSyntax;

/// Early revisions were tagged `v2` instead of `v2.0`.
const LEGACY_V2_TAG: &str = "v2";

#[derive(Debug, Clone, Copy)]
pub enum FieldShape {
    Value,
    Record(&'static RecordSchema),
    RecordList(&'static RecordSchema),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    /// Key under which the value is stored in the raw JSON.
    pub key: &'static str,
    pub shape: FieldShape,
}

impl FieldDef {
    pub const fn value(name: &'static str) -> Self {
        FieldDef {
            name,
            key: name,
            shape: FieldShape::Value,
        }
    }

    pub const fn record(name: &'static str, schema: &'static RecordSchema) -> Self {
        FieldDef {
            name,
            key: name,
            shape: FieldShape::Record(schema),
        }
    }

    pub const fn records(name: &'static str, schema: &'static RecordSchema) -> Self {
        FieldDef {
            name,
            key: name,
            shape: FieldShape::RecordList(schema),
        }
    }

    /// Stores the field under a different raw key.
    pub const fn stored_as(self, key: &'static str) -> Self {
        FieldDef { key, ..self }
    }
}

#[derive(Debug)]
pub struct RecordSchema {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
}

impl RecordSchema {
    pub fn find(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A raw JSON object read through a [`RecordSchema`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    schema: &'static RecordSchema,
    raw: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    pub fn new(schema: &'static RecordSchema, raw: &'a Map<String, Value>) -> Self {
        Self { schema, raw }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema.name
    }

    fn def(&self, name: &str) -> Result<&'static FieldDef> {
        self.schema.find(name).ok_or_else(|| Error::UnknownField {
            field: name.to_string(),
            owner: self.schema.name.to_string(),
        })
    }

    /// The raw value of a declared field; `None` when missing or null.
    pub fn raw_field(&self, name: &str) -> Result<Option<&'a Value>> {
        let def = self.def(name)?;
        Ok(self.raw.get(def.key).filter(|v| !v.is_null()))
    }

    pub fn record(&self, name: &str) -> Result<Option<Record<'a>>> {
        let def = self.def(name)?;
        let schema = match def.shape {
            FieldShape::Record(schema) | FieldShape::RecordList(schema) => schema,
            FieldShape::Value => {
                return Err(Error::UnknownField {
                    field: name.to_string(),
                    owner: format!("{} (not a record)", self.schema.name),
                })
            }
        };
        Ok(match self.raw.get(def.key) {
            Some(Value::Object(map)) => Some(Record::new(schema, map)),
            _ => None,
        })
    }

    /// A record-list field, in stored order. Non-object elements are skipped.
    pub fn records(&self, name: &str) -> Result<Vec<Record<'a>>> {
        let def = self.def(name)?;
        let schema = match def.shape {
            FieldShape::RecordList(schema) | FieldShape::Record(schema) => schema,
            FieldShape::Value => {
                return Err(Error::UnknownField {
                    field: name.to_string(),
                    owner: format!("{} (not a record list)", self.schema.name),
                })
            }
        };
        let records = match self.raw.get(def.key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(Record::new(schema, map)),
                    other => {
                        debug!("Skipping non-object element in {}.{}: {}", self.schema.name, name, other);
                        None
                    }
                })
                .collect(),
            Some(Value::Object(map)) => vec![Record::new(schema, map)],
            _ => Vec::new(),
        };
        Ok(records)
    }
}

impl<'a> FieldSource<'a> for Record<'a> {
    fn field(&self, name: &str) -> Result<Node<'a>> {
        let def = self.def(name)?;
        let Some(value) = self.raw.get(def.key) else {
            return Ok(Node::Absent);
        };
        let node = match (def.shape, value) {
            (FieldShape::Record(schema) | FieldShape::RecordList(schema), Value::Object(map)) => {
                Node::object(Record::new(schema, map))
            }
            (FieldShape::RecordList(schema) | FieldShape::Record(schema), Value::Array(items)) => {
                Node::List(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::Object(map) => Node::object(Record::new(schema, map)),
                            other => Node::from_json(other),
                        })
                        .collect(),
                )
            }
            (_, other) => Node::from_json(other),
        };
        Ok(node)
    }
}

/// One schema revision: its key, the layout of the paper record and the
/// grammar of its feature expressions.
#[derive(Debug)]
pub struct PaperSchema {
    pub key: &'static str,
    /// The paper record, whose fields are the document sections.
    pub root: &'static RecordSchema,
    pub features: FeatureSyntax,
}

impl PaperSchema {
    /// Implementation id derived from the key, e.g. `v2_0`.
    pub fn implementation_id(&self) -> String {
        format!("v{}", self.key.replace('.', "_"))
    }
}

/// Reduces a version tag to its registry key.
///
/// `v2` is first rewritten to `v2.0`; a leading `v` is dropped and only the
/// first two dot-separated components are kept.
pub fn version_key(version: &str) -> String {
    let version = version.trim();
    let version = if version == LEGACY_V2_TAG { "v2.0" } else { version };
    let version = version.strip_prefix('v').unwrap_or(version);
    version.split('.').take(2).collect::<Vec<_>>().join(".")
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, &'static PaperSchema>,
}

lazy_static! {
    static ref BUILTIN_REGISTRY: SchemaRegistry = SchemaRegistry::builtin();
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(&v2_0::SCHEMA);
        registry.register(&v2_1::SCHEMA);
        registry.register(&v3_0::SCHEMA);
        registry
    }

    pub fn global() -> &'static SchemaRegistry {
        &BUILTIN_REGISTRY
    }

    /// Registers a schema under its key, returning any schema it replaces.
    pub fn register(&mut self, schema: &'static PaperSchema) -> Option<&'static PaperSchema> {
        self.schemas.insert(schema.key.to_string(), schema)
    }

    pub fn lookup(&self, version: &str) -> Result<&'static PaperSchema> {
        let key = version_key(version);
        self.schemas
            .get(&key)
            .copied()
            .ok_or_else(|| Error::UnknownSchemaVersion {
                version: version.to_string(),
                key,
            })
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
