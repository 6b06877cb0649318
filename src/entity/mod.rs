//! Remote-graph entities enriching a document: the paper itself and the
//! authors, affiliations, venue and fields of study it links to.

pub mod api;
pub mod cache;
pub mod resolver;

use std::fmt;
use std::hash::{Hash, Hasher};

use log::debug;
use serde_json::Value;

use crate::document::PaperReference;
use crate::error::Result;

pub use api::{AcademicApi, EvaluateClient};
pub use cache::CacheStore;
pub use resolver::{EntityLookup, EntityResolver};

pub type EntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Paper,
    Author,
    Affiliation,
    Journal,
    ConferenceSeries,
    ConferenceInstance,
    FieldOfStudy,
}

impl EntityKind {
    pub fn cache_dirname(self) -> &'static str {
        match self {
            EntityKind::Paper => "paper_id",
            EntityKind::Author => "author_id",
            EntityKind::Affiliation => "affiliation_id",
            EntityKind::Journal => "journal_id",
            EntityKind::ConferenceSeries => "conferenceseries_id",
            EntityKind::ConferenceInstance => "conferenceinstance_id",
            EntityKind::FieldOfStudy => "fieldofstudy_id",
        }
    }

    pub fn attributes(self) -> &'static str {
        match self {
            EntityKind::Paper => {
                "Id,Ti,L,Y,D,CC,ECC,AA.AuN,AA.AuId,AA.AfN,AA.AfId,F.FN,F.FId,J.JN,J.JId,C.CN,C.CId,RId,W,E"
            }
            EntityKind::Author => "Id,AuN,DAuN,CC,ECC,E,SSD",
            EntityKind::Affiliation => "Id,AfN,DAfN,CC,ECC,SSD",
            EntityKind::Journal => "Id,DJN,JN,CC,ECC,SSD",
            EntityKind::ConferenceSeries => "Id,CN,DCN,CC,ECC,F.FId,F.FN,SSD",
            EntityKind::ConferenceInstance => {
                "Id,CIN,DCN,CIL,CISD,CIED,CIARD,CISDD,CIFVD,CINDD,CD.T,CD.D,PCS.CN,PCS.CId,CC,ECC,SSD"
            }
            EntityKind::FieldOfStudy => "Id,FN,DFN,CC,ECC,FL,FP.FN,FP.FId,SSD",
        }
    }

    pub fn name_attribute(self) -> &'static str {
        match self {
            EntityKind::Paper => "Ti",
            EntityKind::Author => "DAuN",
            EntityKind::Affiliation => "DAfN",
            EntityKind::Journal => "JN",
            EntityKind::ConferenceSeries => "DCN",
            EntityKind::ConferenceInstance => "CIN",
            EntityKind::FieldOfStudy => "DFN",
        }
    }

    /// Attribute holding the normalized name, where the API has one.
    pub fn normalized_name_attribute(self) -> Option<&'static str> {
        match self {
            EntityKind::Journal => Some("DJN"),
            EntityKind::ConferenceSeries => Some("CN"),
            EntityKind::Author => Some("AuN"),
            EntityKind::Affiliation => Some("AfN"),
            EntityKind::FieldOfStudy => Some("FN"),
            EntityKind::Paper | EntityKind::ConferenceInstance => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            EntityKind::Paper => "paper",
            EntityKind::Author => "author",
            EntityKind::Affiliation => "affiliation",
            EntityKind::Journal => "journal",
            EntityKind::ConferenceSeries => "conferenceseries",
            EntityKind::ConferenceInstance => "conferenceinstance",
            EntityKind::FieldOfStudy => "fieldofstudy",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.id)
    }
}

/// A remote-graph node whose attributes are fetched on first use.
#[derive(Debug, Clone)]
pub struct Entity {
    key: EntityKey,
    data: Option<Value>,
}

impl Entity {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self {
            key: EntityKey::new(kind, id),
            data: None,
        }
    }

    pub fn with_data(key: EntityKey, data: Value) -> Self {
        Self {
            key,
            data: Some(data),
        }
    }

    pub fn key(&self) -> EntityKey {
        self.key
    }

    pub fn kind(&self) -> EntityKind {
        self.key.kind
    }

    pub fn id(&self) -> EntityId {
        self.key.id
    }

    /// The remote attribute blob, fetched through `resolver` once.
    pub fn attributes(&mut self, resolver: &EntityResolver) -> Result<&Value> {
        let data = match self.data.take() {
            Some(data) => data,
            None => resolver.fetch_attributes(self.key)?,
        };
        Ok(self.data.insert(data))
    }

    fn string_attribute(&mut self, resolver: &EntityResolver, code: &str) -> Result<Option<String>> {
        Ok(self
            .attributes(resolver)?
            .get(code)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub fn name(&mut self, resolver: &EntityResolver) -> Result<Option<String>> {
        let code = self.kind().name_attribute();
        self.string_attribute(resolver, code)
    }

    pub fn normalized_name(&mut self, resolver: &EntityResolver) -> Result<Option<String>> {
        match self.kind().normalized_name_attribute() {
            Some(code) => self.string_attribute(resolver, code),
            None => Ok(None),
        }
    }

    pub fn citations(&mut self, resolver: &EntityResolver) -> Result<Option<u64>> {
        Ok(self.attributes(resolver)?.get("ECC").and_then(Value::as_u64))
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[derive(Debug, Clone)]
pub struct Metadata {
    pub paper: Entity,
    pub authors: Vec<Entity>,
    /// One slot per author; `None` when the author has no affiliation.
    pub affiliations: Vec<Option<Entity>>,
    pub journal: Option<Entity>,
    pub conference: Option<Entity>,
    pub fields_of_study: Vec<Entity>,
}

impl Metadata {
    /// Finds the paper for `reference` and reads its relational fields.
    pub fn resolve(reference: &PaperReference, resolver: &EntityResolver) -> Result<Self> {
        debug!("Resolving metadata for {}", reference);
        let key = resolver.resolve_id(EntityLookup::PaperTitle {
            title: &reference.title,
            year: reference.year,
        })?;
        let data = resolver.fetch_attributes(key)?;
        Ok(Self::from_paper(key.id, data))
    }

    pub fn from_paper(id: EntityId, data: Value) -> Self {
        let author_links: &[Value] = data
            .get("AA")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let authors = author_links
            .iter()
            .filter_map(|a| id_of(a, "AuId"))
            .map(|id| Entity::new(EntityKind::Author, id))
            .collect();
        let affiliations = author_links
            .iter()
            .filter(|a| id_of(a, "AuId").is_some())
            .map(|a| id_of(a, "AfId").map(|id| Entity::new(EntityKind::Affiliation, id)))
            .collect();
        let journal = data
            .get("J")
            .and_then(|j| id_of(j, "JId"))
            .map(|id| Entity::new(EntityKind::Journal, id));
        let conference = data
            .get("C")
            .and_then(|c| id_of(c, "CId"))
            .map(|id| Entity::new(EntityKind::ConferenceSeries, id));
        let fields_of_study = data
            .get("F")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| id_of(f, "FId"))
                    .map(|id| Entity::new(EntityKind::FieldOfStudy, id))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            paper: Entity::with_data(EntityKey::new(EntityKind::Paper, id), data),
            authors,
            affiliations,
            journal,
            conference,
            fields_of_study,
        }
    }

    /// Conference series name, else journal name.
    pub fn venue_name(&mut self, resolver: &EntityResolver) -> Result<Option<String>> {
        if let Some(conference) = self.conference.as_mut() {
            return conference.name(resolver);
        }
        match self.journal.as_mut() {
            Some(journal) => journal.name(resolver),
            None => Ok(None),
        }
    }

    pub fn citations(&mut self, resolver: &EntityResolver) -> Result<Option<u64>> {
        self.paper.citations(resolver)
    }
}

fn id_of(value: &Value, field: &str) -> Option<EntityId> {
    value.get(field).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn links_are_read_from_paper_blob() {
        let metadata = Metadata::from_paper(
            10,
            json!({
                "Id": 10,
                "ECC": 31,
                "AA": [{"AuId": 1, "AfId": 100}, {"AuId": 2}],
                "J": {"JId": 7},
                "F": [{"FId": 55}, {"FId": 56}]
            }),
        );
        assert_eq!(metadata.paper.key(), EntityKey::new(EntityKind::Paper, 10));
        assert_eq!(
            metadata.authors.iter().map(Entity::id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(metadata.affiliations.len(), 2);
        assert_eq!(metadata.affiliations[0].as_ref().map(Entity::id), Some(100));
        assert!(metadata.affiliations[1].is_none());
        assert_eq!(metadata.journal.as_ref().map(Entity::id), Some(7));
        assert!(metadata.conference.is_none());
        assert_eq!(metadata.fields_of_study.len(), 2);
    }

    #[test]
    fn identity_is_kind_and_id() {
        let a = Entity::new(EntityKind::Author, 5);
        let b = Entity::with_data(EntityKey::new(EntityKind::Author, 5), json!({"DAuN": "x"}));
        let c = Entity::new(EntityKind::Affiliation, 5);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.key().to_string(), "author_5");
    }
}
