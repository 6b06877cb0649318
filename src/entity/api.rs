//! Remote academic-graph API.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.labs.cognitive.microsoft.com/academic/v1.0/evaluate";
pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// An evaluate-style search: a boolean expression over indexed fields and the
/// list of attribute codes to return.
pub trait AcademicApi {
    /// Returns the `entities` list of the response.
    fn evaluate(&self, expr: &str, attributes: &str) -> Result<Vec<Value>>;
}

pub struct EvaluateClient {
    http: HttpClient,
    endpoint: String,
    api_key: Option<String>,
}

impl EvaluateClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.endpoint, config.api_key.clone())
    }
}

impl AcademicApi for EvaluateClient {
    fn evaluate(&self, expr: &str, attributes: &str) -> Result<Vec<Value>> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingApiKey)?;
        debug!("Querying {} with expr={}", self.endpoint, expr);
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("expr", expr), ("attributes", attributes)])
            .header(API_KEY_HEADER, api_key)
            .send()?;
        let body: Value = response.json()?;
        entities(body)
    }
}

fn entities(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Object(mut map) => match map.remove("entities") {
            Some(Value::Array(entities)) => Ok(entities),
            _ => Err(Error::UnexpectedResponse(format!(
                "no entities list in {}",
                Value::Object(map)
            ))),
        },
        other => Err(Error::UnexpectedResponse(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_fails_before_any_request() {
        // Port 9 is discard; the request would fail if it were ever sent.
        let client = EvaluateClient::new("http://127.0.0.1:9/evaluate", None).unwrap();
        assert!(matches!(
            client.evaluate("Id=1", "Id").unwrap_err(),
            Error::MissingApiKey
        ));
    }

    #[test]
    fn entities_are_extracted() {
        let list = entities(json!({"expr": "Id=1", "entities": [{"Id": 1}]})).unwrap();
        assert_eq!(list, vec![json!({"Id": 1})]);
        assert!(matches!(
            entities(json!({"error": "quota"})).unwrap_err(),
            Error::UnexpectedResponse(_)
        ));
        assert!(entities(json!([])).is_err());
    }
}
