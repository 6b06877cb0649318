use std::thread::sleep;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde_json::Value;

use super::api::{AcademicApi, EvaluateClient};
use super::cache::CacheStore;
use super::{EntityId, EntityKey, EntityKind};
use crate::config::{Config, DEFAULT_REQUEST_PAUSE};
use crate::error::{Error, Result};

lazy_static! {
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
}

/// Years on either side of the annotated year accepted by a title search.
const YEAR_TOLERANCE: i64 = 2;

#[derive(Debug, Clone, Copy)]
pub enum EntityLookup<'a> {
    /// Papers are found by title within a window around their year.
    PaperTitle { title: &'a str, year: i64 },
    /// Every other kind arrives with its id from a parent paper.
    Known(EntityKey),
}

/// Resolves entity ids and attributes, consulting the cache before the
/// remote API.
///
/// Every remote call that gets a response is followed by a fixed pause, even
/// when the response holds no entity. Cache writes for that call happen before
/// the pause. Cache hits never pause.
pub struct EntityResolver {
    cache: CacheStore,
    api: Box<dyn AcademicApi>,
    pause: Duration,
}

impl EntityResolver {
    pub fn new(cache: CacheStore, api: Box<dyn AcademicApi>) -> Self {
        Self {
            cache,
            api,
            pause: DEFAULT_REQUEST_PAUSE,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api = EvaluateClient::from_config(config)?;
        Ok(Self::new(CacheStore::new(&config.cache_root), Box::new(api))
            .with_pause(config.request_pause))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn resolve_id(&self, lookup: EntityLookup<'_>) -> Result<EntityKey> {
        match lookup {
            EntityLookup::PaperTitle { title, year } => {
                let id = self.resolve_paper_id(title, year)?;
                Ok(EntityKey::new(EntityKind::Paper, id))
            }
            EntityLookup::Known(key) => Ok(key),
        }
    }

    /// Finds a paper's id by title, remembering the answer in the id map.
    ///
    /// When the search returns several papers the first one is taken, so the
    /// id may belong to a different paper. Both that case and an empty result
    /// are logged as warnings; an empty result is then an error.
    pub fn resolve_paper_id(&self, title: &str, year: i64) -> Result<EntityId> {
        if let Some(id) = self.cache.load_paper_id(year, title)? {
            debug!("Id map hit for '{}' ({}): {}", title, year, id);
            return Ok(id);
        }

        let expr = title_search_expr(title, year);
        let label = format!("'{}' ({})", title, year);
        self.remote(&expr, EntityKind::Paper.attributes(), |entities| {
            match entities.len() {
                1 => {}
                0 => {
                    warn!("Could not find entity for paper: {}", label);
                    debug!("Expression used: {}", expr);
                }
                n => {
                    warn!("Found {} entries for paper: {}; using the first", n, label);
                    debug!("Expression used: {}", expr);
                }
            }
            let first = entities
                .into_iter()
                .next()
                .ok_or_else(|| Error::EntityNotFound(format!("paper {}", label)))?;
            let id = first
                .get("Id")
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::UnexpectedResponse(format!("paper entity without Id: {}", first)))?;
            self.cache
                .store_api_blob(EntityKey::new(EntityKind::Paper, id), first)?;
            self.cache.store_paper_id(year, title, id)?;
            Ok(id)
        })
    }

    pub fn fetch_attributes(&self, key: EntityKey) -> Result<Value> {
        if let Some(blob) = self.cache.api_blob(key)? {
            debug!("Cache hit for {}", key);
            return Ok(blob);
        }
        debug!("Cache miss for {}", key);
        let expr = format!("Id={}", key.id);
        self.remote(&expr, key.kind.attributes(), |entities| {
            let first = entities
                .into_iter()
                .next()
                .ok_or_else(|| Error::EntityNotFound(key.to_string()))?;
            self.cache.store_api_blob(key, first.clone())?;
            Ok(first)
        })
    }

    /// Runs one remote query, hands the entities to `handle`, then pauses.
    fn remote<T>(
        &self,
        expr: &str,
        attributes: &str,
        handle: impl FnOnce(Vec<Value>) -> Result<T>,
    ) -> Result<T> {
        let entities = self.api.evaluate(expr, attributes)?;
        let outcome = handle(entities);
        if !self.pause.is_zero() {
            sleep(self.pause);
        }
        outcome
    }
}

/// Lowercases and keeps only letters and digits, joined by single spaces.
pub fn normalize_title(title: &str) -> String {
    NON_ALNUM_RE
        .replace_all(&title.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Search expression matching a normalized title within the year window.
pub fn title_search_expr(title: &str, year: i64) -> String {
    format!(
        "And(Ti='{}', Y=[{},{}])",
        normalize_title(title),
        year - YEAR_TOLERANCE,
        year + YEAR_TOLERANCE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_normalized() {
        assert_eq!(
            normalize_title("  Deep-Learning:  A Survey (2nd ed.) "),
            "deep learning a survey 2nd ed"
        );
        assert_eq!(normalize_title("Réseaux"), "réseaux");
    }

    #[test]
    fn search_expression_has_year_window() {
        assert_eq!(
            title_search_expr("Botnet Detection", 2016),
            "And(Ti='botnet detection', Y=[2014,2018])"
        );
    }
}
