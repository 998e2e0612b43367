//! Match results and the parameter map handed to handlers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key holding the concrete pattern that matched.
pub const ROUTE_PATTERN_KEY: &str = "route_pattern";
/// Key holding the URL being routed.
pub const ROUTE_URL_KEY: &str = "route_url";
/// Key holding the scheme of the matching route.
pub const ROUTE_SCHEME_KEY: &str = "route_scheme";
/// Key holding the components captured by a trailing wildcard.
pub const ROUTE_WILDCARD_COMPONENTS_KEY: &str = "route_wildcard_components";

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
    Json(serde_json::Value),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        ParamValue::Json(value)
    }
}

/// Parameters delivered to a route handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: HashMap<String, ParamValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Copy every entry of `other` over this map (entries of `other` win).
    pub fn overlay(&mut self, other: &Parameters) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// Concrete pattern that produced the match.
    pub fn pattern(&self) -> Option<&str> {
        self.get_str(ROUTE_PATTERN_KEY)
    }

    /// URL that was routed.
    pub fn url(&self) -> Option<&str> {
        self.get_str(ROUTE_URL_KEY)
    }

    /// Scheme of the matching route.
    pub fn scheme(&self) -> Option<&str> {
        self.get_str(ROUTE_SCHEME_KEY)
    }

    /// Trailing components captured by a wildcard, if any were captured.
    pub fn wildcard_components(&self) -> Option<&[String]> {
        self.get(ROUTE_WILDCARD_COMPONENTS_KEY)
            .and_then(ParamValue::as_list)
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Outcome of matching one pattern against one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    parameters: Option<Parameters>,
}

impl RouteResponse {
    /// The non-matching response.
    pub const fn invalid() -> Self {
        Self { parameters: None }
    }

    pub fn matched(parameters: Parameters) -> Self {
        Self {
            parameters: Some(parameters),
        }
    }

    pub fn is_match(&self) -> bool {
        self.parameters.is_some()
    }

    /// Parameters of a successful match.
    pub fn parameters(&self) -> Option<&Parameters> {
        self.parameters.as_ref()
    }

    pub fn into_parameters(self) -> Option<Parameters> {
        self.parameters
    }
}
